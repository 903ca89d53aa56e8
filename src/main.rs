use clap::Parser;
use lanscout::capture::CaptureSource;
use lanscout::{Engine, Frame, VendorDb};
use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::*;
use tracing_subscriber::EnvFilter;

/// Passively inventory the hosts on a LAN segment.
///
/// Send SIGUSR1 to dump a snapshot without interrupting capture; SIGINT or
/// SIGTERM writes a final snapshot and exits.
#[derive(Parser)]
#[command(name = "lanscoutd", version)]
struct Opts {
    /// Network interface to listen on
    #[arg(short, long)]
    interface: String,
    /// Capture duration in seconds; -1 captures until interrupted
    #[arg(short, long, default_value_t = -1, allow_hyphen_values = true)]
    duration: i64,
    /// Where snapshots are written
    #[arg(short, long, default_value = "hosts.json")]
    output: PathBuf,
    /// OUI-to-vendor database (one "<prefix> <vendor>" entry per line)
    #[arg(long, default_value = "vendors.txt")]
    vendor_db: PathBuf,
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), lanscout::Error> {
    let opts = Opts::parse();
    let default_level = match opts.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // A missing vendor database isn't fatal; every MAC just renders as
    // "Unknown Vendor".
    let vendors = match VendorDb::load(&opts.vendor_db) {
        Ok(db) => {
            info!("Loaded {} vendor prefixes from {}", db.len(), opts.vendor_db.display());
            db
        }
        Err(e) => {
            error!("Couldn't read vendor database {}: {e}", opts.vendor_db.display());
            VendorDb::empty()
        }
    };

    // Signal handlers only set flags; the capture loop polls them between
    // frames.  Registrations stay armed across deliveries.
    let dump_requested = Arc::new(AtomicBool::new(false));
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGUSR1, Arc::clone(&dump_requested))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&shutdown_requested))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown_requested))?;

    let mut capture = CaptureSource::open(&opts.interface)?;
    let mut engine = Engine::new(vendors);
    info!("Capturing on {}", opts.interface);
    let deadline = if opts.duration >= 0 {
        info!("Stopping after {} seconds", opts.duration);
        Some(Instant::now() + Duration::from_secs(opts.duration as u64))
    } else {
        None
    };

    while !shutdown_requested.load(Ordering::Relaxed) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Capture deadline reached");
            break;
        }
        if dump_requested.swap(false, Ordering::Relaxed) {
            write_snapshot(&engine, &opts.output);
        }
        match capture.next_frame()? {
            Some((ts, data)) => engine.process(&Frame::new(ts, data)),
            None => continue, // read timeout; loop around to re-check flags
        }
    }

    info!("Stopping after {} hosts", engine.registry().len());
    write_snapshot(&engine, &opts.output);
    Ok(())
}

fn write_snapshot(engine: &Engine, path: &Path) {
    match engine.write_snapshot(path) {
        Ok(()) => info!("Wrote inventory snapshot to {}", path.display()),
        Err(e) => error!("Couldn't write snapshot to {}: {e}", path.display()),
    }
}
