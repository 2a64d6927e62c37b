//! Read-only word-addressed view over a CAMx binary file.
//!
//! CAMx height/pressure files are flat streams of big-endian 32-bit words.
//! `RecordBuffer` exposes the stream word-by-word without copying: on-disk
//! files are memory-mapped, in-memory buffers are wrapped as `Bytes`.

use std::fs::File;
use std::path::Path;

use bytes::Bytes;
use camx_common::{CamxError, CamxResult};
use memmap2::{Mmap, MmapOptions};
use tracing::debug;

enum Storage {
    Mapped(Mmap),
    Owned(Bytes),
}

impl Storage {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Mapped(m) => m,
            Storage::Owned(b) => b,
        }
    }
}

/// Zero-copy sequence of big-endian 32-bit words backing one CAMx file.
pub struct RecordBuffer {
    storage: Storage,
}

impl RecordBuffer {
    /// Memory-map a file read-only.
    ///
    /// Fails with an I/O error if the file cannot be opened or mapped, and
    /// with a format error if its length is not a multiple of 4 bytes.
    pub fn open(path: impl AsRef<Path>) -> CamxResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(CamxError::Format(format!(
                "{} is empty",
                path.display()
            )));
        }

        // SAFETY: the map is read-only and the file is opened read-only;
        // callers must not truncate the file while the buffer is live.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        debug!(path = %path.display(), bytes = size, "memory-mapped CAMx file");

        let buf = Self {
            storage: Storage::Mapped(mmap),
        };
        buf.check_alignment()?;
        Ok(buf)
    }

    /// Wrap an in-memory buffer with the same contract as [`open`].
    ///
    /// [`open`]: RecordBuffer::open
    pub fn from_bytes(data: Bytes) -> CamxResult<Self> {
        let buf = Self {
            storage: Storage::Owned(data),
        };
        buf.check_alignment()?;
        Ok(buf)
    }

    fn check_alignment(&self) -> CamxResult<()> {
        let len = self.storage.bytes().len();
        if len % 4 != 0 {
            return Err(CamxError::Format(format!(
                "byte length {} is not a multiple of the 4-byte word size",
                len
            )));
        }
        Ok(())
    }

    /// Number of 32-bit words in the buffer.
    pub fn len_words(&self) -> usize {
        self.storage.bytes().len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.len_words() == 0
    }

    fn word_bytes(&self, index: usize) -> [u8; 4] {
        let base = index * 4;
        let b = self.storage.bytes();
        [b[base], b[base + 1], b[base + 2], b[base + 3]]
    }

    /// Word at `index` as a big-endian IEEE f32.
    ///
    /// Panics if `index` is out of bounds; callers index within geometry
    /// limits validated at open time.
    pub fn word_f32(&self, index: usize) -> f32 {
        f32::from_be_bytes(self.word_bytes(index))
    }

    /// Word at `index` reinterpreted as a big-endian i32.
    pub fn word_i32(&self, index: usize) -> i32 {
        i32::from_be_bytes(self.word_bytes(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_decoding() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&12i32.to_be_bytes());
        raw.extend_from_slice(&1.5f32.to_be_bytes());
        raw.extend_from_slice(&(-7i32).to_be_bytes());

        let buf = RecordBuffer::from_bytes(Bytes::from(raw)).unwrap();
        assert_eq!(buf.len_words(), 3);
        assert_eq!(buf.word_i32(0), 12);
        assert_eq!(buf.word_f32(1), 1.5);
        assert_eq!(buf.word_i32(2), -7);
    }

    #[test]
    fn test_unaligned_length_rejected() {
        let err = RecordBuffer::from_bytes(Bytes::from(vec![0u8; 7]));
        assert!(matches!(err, Err(CamxError::Format(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let err = RecordBuffer::open("/nonexistent/camx_hp.bin");
        assert!(matches!(err, Err(CamxError::Io(_))));
    }
}
