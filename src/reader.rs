use nom::number::{complete, Endianness};

use crate::Error;

/// Random-access, endian-aware reads over an immutable byte buffer.
///
/// All offsets are absolute positions in the underlying buffer. Any read
/// that would cross the end of the buffer yields [`Error::OutOfRange`].
#[derive(Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    endian: Endianness,
}

impl std::fmt::Debug for ByteReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteReader")
            .field("data len", &self.data.len())
            .field("endian", &self.endian)
            .finish()
    }
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], endian: Endianness) -> Self {
        Self { data, endian }
    }

    pub fn bytes_at(&self, offset: usize, len: usize) -> crate::Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(Error::OutOfRange {
                offset,
                len,
                size: self.data.len(),
            })
    }

    pub fn u8_at(&self, offset: usize) -> crate::Result<u8> {
        let bs = self.bytes_at(offset, 1)?;
        let (_, v) = complete::u8::<_, nom::error::Error<_>>(bs)?;
        Ok(v)
    }

    pub fn u16_at(&self, offset: usize) -> crate::Result<u16> {
        let bs = self.bytes_at(offset, 2)?;
        let (_, v) = complete::u16::<_, nom::error::Error<_>>(self.endian)(bs)?;
        Ok(v)
    }

    pub fn u32_at(&self, offset: usize) -> crate::Result<u32> {
        let bs = self.bytes_at(offset, 4)?;
        let (_, v) = complete::u32::<_, nom::error::Error<_>>(self.endian)(bs)?;
        Ok(v)
    }

    pub fn i32_at(&self, offset: usize) -> crate::Result<i32> {
        let bs = self.bytes_at(offset, 4)?;
        let (_, v) = complete::i32::<_, nom::error::Error<_>>(self.endian)(bs)?;
        Ok(v)
    }

    /// Reads a NUL-terminated single-byte string of at most `max_len` bytes.
    ///
    /// Unlike the numeric reads this never fails: a string running off the
    /// end of the buffer is cut at the end, and an offset past the end gives
    /// an empty string.
    pub fn text_at(&self, offset: usize, max_len: usize) -> String {
        let end = offset.saturating_add(max_len).min(self.data.len());
        self.data
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect()
    }
}
