//! Bounded reads from archive files.
//!
//! Both the map pages and the record windows are "read up to N bytes at
//! offset X" operations where hitting end-of-file early is not an error by
//! itself: the caller decides whether a short read is acceptable (a final
//! map page) or a truncation (a record body).

use std::io::{self, Read, Seek, SeekFrom};

/// Read up to `len` bytes starting at `offset`.
///
/// Returns fewer bytes only when end-of-file is reached.
pub fn read_slice<R>(reader: &mut R, offset: u64, len: usize) -> io::Result<Vec<u8>>
where
    R: Read + Seek,
{
    reader.seek(SeekFrom::Start(offset))?;
    read_up_to(reader, len as u64)
}

/// Read up to `len` bytes from the current position.
///
/// Returns fewer bytes only when end-of-file is reached.
pub fn read_up_to<R: Read>(reader: &mut R, len: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(1 << 20) as usize);
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    Ok(buf)
}
