use crate::KeylogResult;
use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// The signals that stop the capture loop.
const SHUTDOWN_SIGNALS: [libc::c_int; 2] = [libc::SIGINT, libc::SIGTERM];

/// The process-wide state, set from the signal handler.
static PROCESS_RUN_STATE: RunState = RunState::new();

/// A running/stopping flag that only ever goes from running to stopping.
#[derive(Debug, Default)]
pub struct RunState {
    stopping: AtomicBool,
}

impl RunState {
    pub const fn new() -> Self {
        Self {
            stopping: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stopping.load(Ordering::SeqCst)
    }

    /// Request shutdown. Safe to call from a signal handler.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }
}

extern "C" fn handle_shutdown_signal(_signal: libc::c_int) {
    PROCESS_RUN_STATE.stop();
}

/// Route SIGINT and SIGTERM to the process-wide [`RunState`] and return it.
///
/// The signals are blocked on the calling thread, which must be the one running the capture
/// loop: they are only let through while it waits for input, so they always interrupt the wait.
pub fn install_shutdown_handlers() -> KeylogResult<&'static RunState> {
    for signal in SHUTDOWN_SIGNALS {
        // No SA_RESTART: the wait has to return EINTR.
        let res = unsafe {
            let mut action: libc::sigaction = mem::zeroed();
            action.sa_sigaction = handle_shutdown_signal as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);

            libc::sigaction(signal, &action, ptr::null_mut())
        };

        if res < 0 {
            return Err(io::Error::last_os_error().into());
        }
    }

    block_shutdown_signals()?;
    debug!("shutdown signal handlers installed");

    Ok(&PROCESS_RUN_STATE)
}

fn shutdown_sigset() -> libc::sigset_t {
    unsafe {
        let mut set: libc::sigset_t = mem::zeroed();
        libc::sigemptyset(&mut set);
        for signal in SHUTDOWN_SIGNALS {
            libc::sigaddset(&mut set, signal);
        }
        set
    }
}

fn block_shutdown_signals() -> io::Result<()> {
    let set = shutdown_sigset();
    let res = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &set, ptr::null_mut()) };

    if res != 0 {
        return Err(io::Error::from_raw_os_error(res));
    }

    Ok(())
}

/// The calling thread's signal mask with the shutdown signals let through.
pub(crate) fn wait_sigmask() -> io::Result<libc::sigset_t> {
    let mut mask: libc::sigset_t = unsafe { mem::zeroed() };
    let res = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, ptr::null(), &mut mask) };

    if res != 0 {
        return Err(io::Error::from_raw_os_error(res));
    }

    for signal in SHUTDOWN_SIGNALS {
        unsafe { libc::sigdelset(&mut mask, signal) };
    }

    Ok(mask)
}
