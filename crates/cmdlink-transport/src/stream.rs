use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// A connected Unix socket used as a serial-like byte link.
///
/// `available()` asks the kernel how many bytes are queued (`FIONREAD`), so
/// polling never blocks even though the socket itself stays in blocking mode.
/// Once the peer has hung up and nothing is left to read, `available()`
/// returns [`TransportError::Closed`].
pub struct StreamTransport {
    inner: UnixStream,
}

impl StreamTransport {
    pub fn new(inner: UnixStream) -> Self {
        Self { inner }
    }

    /// Two connected endpoints, handy for tests and demos.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = UnixStream::pair()?;
        Ok((Self::new(left), Self::new(right)))
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self::new(self.inner.try_clone()?))
    }

    pub fn get_ref(&self) -> &UnixStream {
        &self.inner
    }

    pub fn into_inner(self) -> UnixStream {
        self.inner
    }

    // FIONREAD reports 0 both for an idle link and for one the peer has
    // shut down; a non-blocking peek tells them apart.
    fn peer_closed(&self) -> Result<bool> {
        let mut peek = 0u8;
        loop {
            // SAFETY: `peek` is one writable byte and the descriptor is an
            // open socket owned by `self.inner` for the duration of the call.
            let rc = unsafe {
                libc::recv(
                    self.inner.as_raw_fd(),
                    &mut peek as *mut u8 as *mut libc::c_void,
                    1,
                    libc::MSG_PEEK | libc::MSG_DONTWAIT,
                )
            };
            if rc >= 0 {
                return Ok(rc == 0);
            }
            let err = std::io::Error::last_os_error();
            match err.kind() {
                ErrorKind::Interrupted => continue,
                ErrorKind::WouldBlock => return Ok(false),
                _ => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl Transport for StreamTransport {
    fn available(&self) -> Result<usize> {
        let mut count: libc::c_int = 0;
        // SAFETY: `count` is a valid writable c_int and the descriptor is an
        // open socket owned by `self.inner` for the duration of the call.
        let rc = unsafe {
            libc::ioctl(
                self.inner.as_raw_fd(),
                libc::FIONREAD,
                &mut count as *mut libc::c_int,
            )
        };
        if rc < 0 {
            return Err(TransportError::Io(std::io::Error::last_os_error()));
        }
        if count > 0 {
            return Ok(count as usize);
        }
        if self.peer_closed()? {
            return Err(TransportError::Closed);
        }
        Ok(0)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("fd", &self.inner.as_raw_fd())
            .finish()
    }
}
