use crate::crypto;
use crate::error::KeylogError;
use crate::KeylogResult;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::{Zeroize, Zeroizing};

/// Where a [`LogCache`] is flushed to.
#[derive(Clone)]
pub struct LogTarget {
    path: PathBuf,
    password: Option<Zeroizing<String>>,
}

impl LogTarget {
    /// Write the log as plain text.
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: None,
        }
    }

    /// Write the log as an envelope encrypted with `password`.
    pub fn encrypted(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: Some(Zeroizing::new(password.into())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        self.password.is_some()
    }

    fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }
}

impl fmt::Debug for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogTarget")
            .field("path", &self.path)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

/// A fixed-capacity buffer of newline-terminated key names.
///
/// The capacity is a hard limit: an entry that does not fit is refused with
/// [`KeylogError::CacheOverflow`] rather than truncated or dropped.
pub struct LogCache {
    buf: Vec<u8>,
    capacity: usize,
    entries: usize,
}

impl LogCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            entries: 0,
        }
    }

    /// Append `key_name` followed by a newline.
    pub fn append(&mut self, key_name: &str) -> KeylogResult<()> {
        let needed = self.buf.len() + key_name.len() + 1;

        if needed > self.capacity {
            return Err(KeylogError::CacheOverflow {
                capacity: self.capacity,
                needed,
            });
        }

        self.buf.extend_from_slice(key_name.as_bytes());
        self.buf.push(b'\n');
        self.entries += 1;

        Ok(())
    }

    /// Replace the contents of `target` with the buffered log, then empty the buffer.
    pub fn flush(&mut self, target: &LogTarget) -> KeylogResult<()> {
        let entries = self.entries;
        let flush_err = |source| KeylogError::Flush {
            path: target.path.clone(),
            source,
        };

        let mut file = File::create(&target.path).map_err(flush_err)?;
        self.flush_into(&mut file, target.password())
            .and_then(|()| file.sync_all())
            .map_err(flush_err)?;

        info!(
            path = %target.path.display(),
            entries,
            encrypted = target.is_encrypted(),
            "log flushed"
        );

        Ok(())
    }

    /// Write the buffered log (encrypted if a password is given) to `sink`.
    ///
    /// The buffer is only emptied once the write succeeded.
    pub fn flush_into<W: Write>(
        &mut self,
        sink: &mut W,
        password: Option<&str>,
    ) -> io::Result<()> {
        match password {
            Some(password) => sink.write_all(&crypto::encrypt(&self.buf, password))?,
            None => sink.write_all(&self.buf)?,
        }
        sink.flush()?;

        self.buf.zeroize();
        self.entries = 0;

        Ok(())
    }

    /// The number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of buffered key names.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

// Key names stay out of debug output
impl fmt::Debug for LogCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogCache")
            .field("len", &self.buf.len())
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .finish()
    }
}
