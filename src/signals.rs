//! Signal Handling for Graceful Shutdown
//!
//! Spawns a daemon thread that listens for SIGINT/SIGTERM/SIGQUIT and
//! raises a flag the REPL checks between commands.

use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Global flag set once a shutdown signal has been received.
pub static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install signal handlers for graceful shutdown.
///
/// Spawns a daemon thread — it dies with the process, no join is needed.
pub fn install_signal_handlers() -> Result<(), Box<dyn std::error::Error>> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT])?;

    thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGINT => eprintln!("\n[procheat] Received SIGINT, shutting down..."),
                _ => eprintln!("\n[procheat] Received signal, shutting down..."),
            }
            SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
        }
    });

    Ok(())
}

#[inline]
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag() {
        let was_set = SHUTDOWN_REQUESTED.load(Ordering::SeqCst);
        SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
        assert!(shutdown_requested());
        SHUTDOWN_REQUESTED.store(was_set, Ordering::SeqCst);
    }
}
