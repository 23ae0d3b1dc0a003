//! Hangup handling.
//!
//! A `SIGHUP` delivered while the VM is running must not kill the process
//! silently. The handler only records the signal; the next call through the
//! bridge observes it via [`check_hangup`] and fails with
//! [`Error::Hangup`][crate::errors::Error::Hangup].

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{Error, Result};

static HANGUP: AtomicBool = AtomicBool::new(false);

/// Fails with [`Error::Hangup`] if a hangup signal has been received.
///
/// The flag is not reset: once hung up, every later call fails too.
#[inline]
pub fn check_hangup() -> Result<()> {
    if HANGUP.load(Ordering::Relaxed) {
        Err(Error::Hangup)
    } else {
        Ok(())
    }
}

#[cfg(unix)]
extern "C" fn on_hangup(_signal: libc::c_int) {
    HANGUP.store(true, Ordering::Relaxed);
}

/// Install the `SIGHUP` handler. Called once when the VM is created or
/// adopted; a no-op on platforms without `SIGHUP`.
pub(crate) fn install_hangup_handler() {
    #[cfg(unix)]
    {
        let handler = on_hangup as extern "C" fn(libc::c_int);
        // Safety: the handler only touches an atomic.
        let previous = unsafe { libc::signal(libc::SIGHUP, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            log::warn!("Failed to install SIGHUP handler");
        } else {
            log::debug!("Installed SIGHUP handler");
        }
    }
}
