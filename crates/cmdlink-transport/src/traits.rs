use crate::error::Result;

/// A byte-oriented, half-duplex link to one peer.
///
/// Implementations must never block in [`available`](Transport::available)
/// and should return promptly from [`read`](Transport::read) when fewer
/// bytes are ready than requested. The engine only reads what `available`
/// reported, so a blocking `read` is tolerated but not required.
pub trait Transport {
    /// Number of bytes that can be read right now without blocking.
    ///
    /// Links that can tell a hung-up peer from an idle one report it here
    /// as [`TransportError::Closed`](crate::TransportError::Closed).
    fn available(&self) -> Result<usize>;

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write every byte of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Write `bytes` followed by a CR LF line terminator.
    fn write_line(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        self.write_all(b"\r\n")
    }

    /// Push buffered output to the peer.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn available(&self) -> Result<usize> {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn write_line(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_line(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn available(&self) -> Result<usize> {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn write_line(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_line(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
