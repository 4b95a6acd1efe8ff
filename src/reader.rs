//! Bounds-checked access to packed little-endian structures.
//!
//! Every header in both container formats is read through [`ByteView`],
//! which never reads past the end of its slice and reports offsets relative
//! to the start of the original input.

use binrw::{io::Cursor, BinRead, Endian};

use crate::error::{Error, Result};

/// A packed structure with a fixed on-disk size.
///
/// `SIZE` must equal the number of bytes the `BinRead` impl consumes.
pub trait FixedSize: for<'a> BinRead<Args<'a> = ()> {
    const SIZE: usize;
}

impl FixedSize for u64 {
    const SIZE: usize = 8;
}

/// Reads `T` from `data` at `offset`.
pub fn read_struct<T: FixedSize>(data: &[u8], offset: usize) -> Result<T> {
    ByteView::new(data).read_at(offset)
}

/// The unconsumed remainder of the input buffer.
///
/// Views only ever shrink: every operation returns a sub-view of `self`.
#[derive(Clone, Copy, Debug)]
pub struct ByteView<'a> {
    data: &'a [u8],
    origin: usize,
}

impl<'a> ByteView<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, origin: 0 }
    }

    /// Absolute offset of the first byte of this view.
    pub fn origin(&self) -> usize {
        self.origin
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Reads `T` from the start of the view.
    pub fn read<T: FixedSize>(&self) -> Result<T> {
        self.read_at(0)
    }

    /// Reads `T` at `offset` bytes into the view.
    pub fn read_at<T: FixedSize>(&self, offset: usize) -> Result<T> {
        let bytes = offset
            .checked_add(T::SIZE)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| self.truncated(offset, T::SIZE))?;
        Ok(T::read_options(&mut Cursor::new(bytes), Endian::Little, ())?)
    }

    /// Drops the first `n` bytes.
    pub fn skip(self, n: usize) -> Result<Self> {
        Ok(self.split(n)?.1)
    }

    /// Keeps only the first `n` bytes.
    pub fn truncate(self, n: usize) -> Result<Self> {
        Ok(self.split(n)?.0)
    }

    /// Splits into the first `n` bytes and the rest.
    pub fn split(self, n: usize) -> Result<(Self, Self)> {
        if n > self.data.len() {
            return Err(self.truncated(0, n));
        }
        let (head, tail) = self.data.split_at(n);
        Ok((
            Self {
                data: head,
                origin: self.origin,
            },
            Self {
                data: tail,
                origin: self.origin + n,
            },
        ))
    }

    fn truncated(&self, offset: usize, needed: usize) -> Error {
        Error::TruncatedBuffer {
            offset: self.origin.saturating_add(offset),
            needed,
            available: self.data.len().saturating_sub(offset),
        }
    }
}

/// Number of bytes `T`'s reader actually consumes.
#[cfg(test)]
pub(crate) fn consumed<T: FixedSize>() -> u64 {
    let zeroes = vec![0u8; T::SIZE + 16];
    let mut cursor = Cursor::new(&zeroes[..]);
    T::read_options(&mut cursor, Endian::Little, ()).unwrap();
    cursor.position()
}
