//! Bounds-checked sequential reader over packet bytes.
//!
//! Decoders never index packet slices directly. Every read goes through a
//! [`Cursor`], which fails with [`DecodeError::UnexpectedEnd`] instead of
//! reading past the end of the bytes it was given.

use crate::error::{DecodeError, DecodeResult};

/// Byte order of multi-byte integers on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Low byte first.
    LittleEndian,
    /// High byte first (network order).
    BigEndian,
}

impl ByteOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "little-endian",
            ByteOrder::BigEndian => "big-endian",
        }
    }
}

/// Sequential reader over a byte slice.
///
/// Invariant: `position() <= len()`.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

macro_rules! read_ordered {
    ($name:ident, $ty:ty, $size:expr) => {
        #[doc = concat!("Read a `", stringify!($ty), "` in the given byte order.")]
        pub fn $name(&mut self, order: ByteOrder) -> DecodeResult<$ty> {
            let bytes = self.take::<$size>()?;
            Ok(match order {
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(bytes),
                ByteOrder::BigEndian => <$ty>::from_be_bytes(bytes),
            })
        }
    };
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current read offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of bytes in view.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// True when every byte has been consumed.
    #[inline]
    pub fn is_fully_read(&self) -> bool {
        self.position == self.data.len()
    }

    /// The unread bytes, without consuming them.
    ///
    /// Used to hand a bounded sub-view to a nested decoder; call
    /// [`advance`](Self::advance) with what it consumed afterwards.
    pub fn unread(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    /// Move forward without reading.
    pub fn advance(&mut self, count: usize) -> DecodeResult<()> {
        self.ensure(count)?;
        self.position += count;
        Ok(())
    }

    fn ensure(&self, needed: usize) -> DecodeResult<()> {
        if needed > self.remaining() {
            return Err(DecodeError::UnexpectedEnd {
                position: self.position,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        Ok(out)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read one byte as a boolean; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_ordered!(read_u16, u16, 2);
    read_ordered!(read_u32, u32, 4);
    read_ordered!(read_u64, u64, 8);
    read_ordered!(read_i16, i16, 2);
    read_ordered!(read_i32, i32, 4);
    read_ordered!(read_i64, i64, 8);
    read_ordered!(read_f32, f32, 4);
    read_ordered!(read_f64, f64, 8);

    /// Borrow the next `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        self.ensure(count)?;
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    /// Borrow everything that has not been read yet.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let slice = &self.data[self.position..];
        self.position = self.data.len();
        slice
    }

    /// Read a NUL-terminated UTF-8 string; the terminator is consumed.
    pub fn read_cstring(&mut self, field: &'static str) -> DecodeResult<&'a str> {
        let rest = &self.data[self.position..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::UnexpectedEnd {
                position: self.position,
                needed: rest.len() + 1,
                available: rest.len(),
            })?;
        let text = std::str::from_utf8(&rest[..end])
            .map_err(|_| DecodeError::InvalidUtf8 { field })?;
        self.position += end + 1;
        Ok(text)
    }

    /// Read a UTF-8 string of exactly `count` bytes.
    pub fn read_str(&mut self, count: usize, field: &'static str) -> DecodeResult<&'a str> {
        let start = self.position;
        let bytes = self.read_bytes(count)?;
        std::str::from_utf8(bytes).map_err(|_| {
            self.position = start;
            DecodeError::InvalidUtf8 { field }
        })
    }
}
