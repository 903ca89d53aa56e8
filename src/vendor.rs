/*! The OUI-to-vendor table used to annotate MAC addresses. */

use crate::mac::MacAddr;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::*;

/// A read-only mapping from OUI prefix (`AA:BB:CC`) to vendor name.
///
/// Loaded once at startup from a text file with one `<prefix> <vendor name>`
/// entry per line; the vendor name is the rest of the line, left-trimmed.
/// Blank lines and lines without a name are skipped.
#[derive(Debug, Default)]
pub struct VendorDb {
    by_oui: HashMap<String, String>,
}

impl VendorDb {
    /// An empty table; every lookup misses.
    pub fn empty() -> VendorDb {
        VendorDb::default()
    }

    pub fn load(path: &Path) -> io::Result<VendorDb> {
        Ok(VendorDb::parse(&std::fs::read_to_string(path)?))
    }

    pub fn parse(text: &str) -> VendorDb {
        let mut by_oui = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once(char::is_whitespace) {
                Some((prefix, name)) => {
                    by_oui.insert(prefix.to_uppercase(), name.trim_start().to_string());
                }
                None => debug!("Vendor entry {line:?} has no name; skipping"),
            }
        }
        VendorDb { by_oui }
    }

    pub fn name(&self, mac: &MacAddr) -> Option<&str> {
        self.by_oui.get(&mac.oui_prefix()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_oui.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_oui.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_and_name() {
        let db = VendorDb::parse(
            "AA:BB:CC Acme Widget Co\n\
             \n\
             dd:ee:ff   Spacey  Vendor \n\
             11:22:33\n",
        );
        assert_eq!(db.len(), 2);
        assert_eq!(db.name(&MacAddr([0xaa, 0xbb, 0xcc, 1, 2, 3])), Some("Acme Widget Co"));
        // Prefixes are case-insensitive; names keep their internal spacing.
        assert_eq!(db.name(&MacAddr([0xdd, 0xee, 0xff, 0, 0, 0])), Some("Spacey  Vendor"));
        assert_eq!(db.name(&MacAddr([0x11, 0x22, 0x33, 0, 0, 0])), None);
    }

    #[test]
    fn empty_table_misses() {
        assert_eq!(VendorDb::empty().name(&MacAddr::ZERO), None);
    }
}
