//! Pseudo-terminal byte channel.
//!
//! The simulator can expose its protocol endpoint as a pseudo-terminal so an
//! external controller attaches like a serial console. Bootstrap sequence:
//! allocate the master, grant and unlock the slave, then open and immediately
//! close the slave once to induce a hang-up condition on the master. The
//! hang-up clears when a real peer opens the slave, so the attach wait polls
//! `POLLHUP` with a short sleep until it vanishes or a deadline passes.
//!
//! Every failure here is recoverable: callers fall back to the stdio channel.

use std::ffi::{CStr, CString};
use std::io::{self, ErrorKind};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::common::error::SimError;

use super::HostChannel;

/// Sleep between attach polls.
const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Byte channel over a pseudo-terminal master.
#[derive(Debug)]
pub struct PtyChannel {
    fd: libc::c_int,
    slave_path: String,
}

impl PtyChannel {
    /// Allocates a pseudo-terminal and waits for a peer to attach.
    ///
    /// Blocks for at most `attach_timeout`; if no peer opens the slave in
    /// time, or the terminal cannot be configured at all, returns
    /// [`SimError::Bootstrap`].
    pub fn open(attach_timeout: Duration) -> Result<Self, SimError> {
        // SAFETY: plain libc calls on a fresh descriptor; failure is checked
        // before the fd is used.
        let fd = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
        if fd < 0 {
            return Err(bootstrap_errno("posix_openpt"));
        }
        // The channel owns the fd from here on; early returns close it.
        let mut channel = Self {
            fd,
            slave_path: String::new(),
        };

        // SAFETY: fd is a valid pty master owned by `channel`.
        if unsafe { libc::grantpt(fd) } != 0 {
            return Err(bootstrap_errno("grantpt"));
        }
        // SAFETY: as above.
        if unsafe { libc::unlockpt(fd) } != 0 {
            return Err(bootstrap_errno("unlockpt"));
        }

        // SAFETY: ptsname's static buffer is only read before the next call;
        // the channel is single-threaded at bootstrap time.
        let slave_path = unsafe {
            let name = libc::ptsname(fd);
            if name.is_null() {
                return Err(bootstrap_errno("ptsname"));
            }
            CStr::from_ptr(name).to_string_lossy().into_owned()
        };
        debug!(pty = %slave_path, "pty allocated");
        channel.slave_path = slave_path;

        channel.induce_hangup()?;
        channel.wait_for_peer(attach_timeout)?;
        Ok(channel)
    }

    /// Path of the slave device a peer must open to attach.
    pub fn slave_path(&self) -> &str {
        &self.slave_path
    }

    /// Opens and immediately closes the slave so the master reports hang-up
    /// until a real peer attaches.
    fn induce_hangup(&self) -> Result<(), SimError> {
        let path = CString::new(self.slave_path.as_str())
            .map_err(|_| SimError::Bootstrap("slave path contains NUL".into()))?;
        // SAFETY: path is a valid NUL-terminated string; the fd is closed on
        // the spot and never reused.
        unsafe {
            let slave = libc::open(path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
            if slave < 0 {
                return Err(bootstrap_errno("open slave"));
            }
            let _ = libc::close(slave);
        }
        Ok(())
    }

    /// Polls the master until the hang-up condition clears or the deadline
    /// passes.
    fn wait_for_peer(&self, timeout: Duration) -> Result<(), SimError> {
        let deadline = Instant::now() + timeout;
        loop {
            let mut fds = libc::pollfd {
                fd: self.fd,
                events: libc::POLLHUP,
                revents: 0,
            };
            // SAFETY: fds points at a single initialized pollfd.
            if unsafe { libc::poll(&mut fds, 1, 0) } < 0 {
                return Err(bootstrap_errno("poll"));
            }
            if fds.revents & libc::POLLHUP == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SimError::Bootstrap(format!(
                    "no peer attached to {} within {timeout:?}",
                    self.slave_path
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl HostChannel for PtyChannel {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut sent = 0;
        while sent < buf.len() {
            // SAFETY: the pointer/length pair stays inside `buf`.
            let n = unsafe {
                libc::write(
                    self.fd,
                    buf[sent..].as_ptr().cast(),
                    buf.len() - sent,
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            sent += n as usize;
        }
        Ok(())
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            // SAFETY: the pointer/length pair stays inside `buf`.
            let n = unsafe {
                libc::read(
                    self.fd,
                    buf[filled..].as_mut_ptr().cast(),
                    buf.len() - filled,
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if n == 0 {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "pty peer closed mid-packet",
                ));
            }
            filled += n as usize;
        }
        Ok(())
    }
}

impl Drop for PtyChannel {
    fn drop(&mut self) {
        // SAFETY: fd was returned by posix_openpt and is closed exactly once.
        unsafe {
            let _ = libc::close(self.fd);
        }
    }
}

fn bootstrap_errno(what: &str) -> SimError {
    SimError::Bootstrap(format!("{what}: {}", io::Error::last_os_error()))
}
