//! Positioned reads over a dataset.
//!
//! Every access names its absolute offset, so nothing depends on where a previous
//! read left a cursor.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// A read-only, randomly addressable byte store holding a sorted hash dataset.
pub trait RecordSource {
    /// Total size of the dataset in bytes.
    fn byte_len(&self) -> io::Result<u64>;

    /// Reads bytes starting at `offset` until `buf` is full or the end of the data
    /// is reached. Returns the number of bytes read, which is only short at EOF.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl RecordSource for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        // `&File` moves the handle's shared cursor, which is why a handle must not
        // be shared between concurrent searches.
        let mut file = self;
        file.seek(SeekFrom::Start(offset))?;

        // read() is not guaranteed to fill the buffer in a single call.
        let mut total = 0usize;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

impl RecordSource for [u8] {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn byte_len(&self) -> io::Result<u64> {
        (**self).byte_len()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}
