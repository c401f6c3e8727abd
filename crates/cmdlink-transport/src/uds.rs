use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::StreamTransport;

/// Filesystem Unix socket endpoint standing in for a serial port.
///
/// One side binds and accepts, the other connects; both end up with a
/// [`StreamTransport`]. The socket file is removed on drop if it is still the
/// one this listener created.
pub struct UnixLink {
    listener: UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

impl UnixLink {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen. A stale socket at `path` is replaced; any other kind
    /// of file is left alone and reported as a bind error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_len = path.as_os_str().len();
        if path_len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_len,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |path: &Path, source: std::io::Error| TransportError::Bind {
            path: path.to_path_buf(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(
                    &path,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                ));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(|e| bind_err(&path, e))?;
        }

        let listener = UnixListener::bind(&path).map_err(|e| bind_err(&path, e))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE))
            .map_err(|e| bind_err(&path, e))?;
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| bind_err(&path, e))?;

        info!(?path, "link listening");

        Ok(Self {
            listener,
            path,
            created_inode: (metadata.dev(), metadata.ino()),
        })
    }

    /// Wait for the peer to connect (blocking).
    pub fn accept(&self) -> Result<StreamTransport> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "peer attached");
        Ok(StreamTransport::new(stream))
    }

    /// Connect to a listening link (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<StreamTransport> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "attached to link");
        Ok(StreamTransport::new(stream))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixLink {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        if metadata.file_type().is_socket()
            && (metadata.dev(), metadata.ino()) == self.created_inode
        {
            debug!(path = ?self.path, "cleaning up socket file");
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Transport;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cmdlink-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_bind_accept_connect() {
        let dir = temp_dir("uds-basic");
        let sock_path = dir.join("link.sock");

        let link = UnixLink::bind(&sock_path).unwrap();
        assert!(sock_path.exists());
        assert_eq!(link.path(), sock_path.as_path());

        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut host = UnixLink::connect(&path_clone).unwrap();
            host.write_all(b"1;").unwrap();
        });

        let mut device = link.accept().unwrap();
        handle.join().unwrap();

        let mut buf = [0u8; 2];
        let mut got = 0;
        while got < 2 {
            got += device.read(&mut buf[got..]).unwrap();
        }
        assert_eq!(&buf, b"1;");

        drop(link);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_path_too_long_rejected() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = UnixLink::bind(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn test_existing_regular_file_is_not_clobbered() {
        let dir = temp_dir("uds-file");
        let sock_path = dir.join("plain.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = UnixLink::bind(&sock_path);
        assert!(matches!(result, Err(TransportError::Bind { .. })));
        assert!(sock_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_connect_to_missing_socket_fails() {
        let dir = temp_dir("uds-missing");
        let result = UnixLink::connect(dir.join("nobody.sock"));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
