//! Scoped SIGINT suppression for foreground daemons.
//!
//! While a debug daemon runs attached to the terminal, ^C reaches both the
//! daemon and the supervisor. The daemon handles it and exits; the supervisor
//! must survive long enough to reap it.

use super::error::LifecycleError;

/// Ignores SIGINT until dropped, then restores the previous disposition.
#[cfg(unix)]
pub struct InterruptGuard {
    previous: nix::sys::signal::SigAction,
}

#[cfg(unix)]
impl InterruptGuard {
    pub fn ignore() -> Result<Self, LifecycleError> {
        use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        // SAFETY: installing SIG_IGN runs no code in signal context.
        let previous = unsafe { sigaction(Signal::SIGINT, &ignore) }.map_err(|errno| {
            LifecycleError::SignalDisposition {
                source: errno.into(),
            }
        })?;
        Ok(Self { previous })
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        use nix::sys::signal::{Signal, sigaction};

        // SAFETY: restores a disposition previously returned by sigaction.
        let _ = unsafe { sigaction(Signal::SIGINT, &self.previous) };
    }
}

/// No-op guard on hosts without POSIX signals.
#[cfg(not(unix))]
pub struct InterruptGuard;

#[cfg(not(unix))]
impl InterruptGuard {
    pub fn ignore() -> Result<Self, LifecycleError> {
        Ok(Self)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    fn current_handler() -> SigHandler {
        let probe = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        // SAFETY: swaps in the default handler and immediately puts back
        // whatever was installed.
        let current = unsafe { sigaction(Signal::SIGINT, &probe) }.expect("read disposition");
        unsafe { sigaction(Signal::SIGINT, &current) }.expect("restore disposition");
        current.handler()
    }

    #[test]
    fn guard_ignores_then_restores_sigint() {
        let before = current_handler();
        {
            let _guard = InterruptGuard::ignore().expect("install guard");
            assert_eq!(current_handler(), SigHandler::SigIgn);
        }
        assert_eq!(current_handler(), before);
    }
}
