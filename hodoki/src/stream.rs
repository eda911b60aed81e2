use crate::error::HodokiError;
use bytes::{Bytes, BytesMut};
use scroll::{Pread, LE};

/// Seekable in-memory byte buffer with a single cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStream {
    buf: BytesMut,
    pos: usize,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn seek(&mut self, pos: usize) -> Result<&mut Self, HodokiError> {
        if pos > self.buf.len() {
            return Err(HodokiError::OutOfRange {
                position: pos as i64,
                size: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(self)
    }

    pub fn skip(&mut self, delta: isize) -> Result<&mut Self, HodokiError> {
        let position = self.pos as i64 + delta as i64;
        if position < 0 || position > self.buf.len() as i64 {
            return Err(HodokiError::OutOfRange {
                position,
                size: self.buf.len(),
            });
        }
        self.pos = position as usize;
        Ok(self)
    }

    pub fn read(&mut self, count: usize) -> Result<Bytes, HodokiError> {
        self.ensure(count)?;
        let bytes = Bytes::copy_from_slice(&self.buf[self.pos..self.pos + count]);
        self.pos += count;
        Ok(bytes)
    }

    pub fn read_to_end(&mut self) -> Bytes {
        let bytes = Bytes::copy_from_slice(&self.buf[self.pos..]);
        self.pos = self.buf.len();
        bytes
    }

    /// Reads a fixed `count` byte field and returns everything before the
    /// first zero byte.
    pub fn read_to_zero(&mut self, count: usize) -> Result<Bytes, HodokiError> {
        let field = self.read(count)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(count);
        Ok(field.slice(..end))
    }

    pub fn read_u8(&mut self) -> Result<u8, HodokiError> {
        self.ensure(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, HodokiError> {
        self.ensure(2)?;
        Ok(self.buf.gread_with::<u16>(&mut self.pos, LE)?)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, HodokiError> {
        self.ensure(4)?;
        Ok(self.buf.gread_with::<u32>(&mut self.pos, LE)?)
    }

    /// Discards everything past `size`. The cursor is moved back if it
    /// pointed past the new end.
    pub fn truncate(&mut self, size: usize) -> Result<(), HodokiError> {
        if size > self.buf.len() {
            return Err(HodokiError::OutOfRange {
                position: size as i64,
                size: self.buf.len(),
            });
        }
        self.buf.truncate(size);
        self.pos = self.pos.min(size);
        Ok(())
    }

    pub fn write(&mut self, data: &[u8]) -> &mut Self {
        let end = self.pos + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        self
    }

    pub fn write_u16_le(&mut self, value: u16) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u32_le(&mut self, value: u32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    /// Runs `f` and puts the cursor back where it was, whatever `f` returned.
    pub fn peek<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let pos = self.pos;
        let result = f(self);
        self.pos = pos.min(self.buf.len());
        result
    }

    fn ensure(&self, count: usize) -> Result<(), HodokiError> {
        if count > self.remaining() {
            return Err(HodokiError::UnexpectedEof {
                requested: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }
}

impl From<&[u8]> for MemoryStream {
    fn from(buf: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(buf),
            pos: 0,
        }
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(buf: Vec<u8>) -> Self {
        Self::from(buf.as_slice())
    }
}

impl From<Bytes> for MemoryStream {
    fn from(buf: Bytes) -> Self {
        Self::from(buf.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reads_little_endian_integers() {
        let mut stream =
            MemoryStream::from(vec![0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(stream.read_u8().unwrap(), 0x01);
        assert_eq!(stream.read_u16_le().unwrap(), 0x1234);
        assert_eq!(stream.read_u32_le().unwrap(), 0x12345678);
        assert_eq!(stream.tell(), 7);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn short_read_fails_without_moving() {
        let mut stream = MemoryStream::from(vec![1, 2, 3]);
        stream.seek(1).unwrap();
        match stream.read_u32_le() {
            Err(HodokiError::UnexpectedEof {
                requested,
                available,
            }) => {
                assert_eq!(requested, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(stream.tell(), 1);
        assert!(stream.read(3).is_err());
        assert_eq!(&stream.read(2).unwrap()[..], &[2, 3]);
    }

    #[test]
    fn seek_and_skip_bounds() {
        let mut stream = MemoryStream::from(vec![0; 8]);
        assert!(stream.seek(8).is_ok());
        assert!(matches!(
            stream.seek(9),
            Err(HodokiError::OutOfRange { position: 9, size: 8 })
        ));
        stream.seek(4).unwrap();
        assert!(stream.skip(-4).is_ok());
        assert!(stream.skip(-1).is_err());
        assert_eq!(stream.tell(), 0);
        assert!(stream.skip(9).is_err());
        stream.skip(3).unwrap().skip(5).unwrap();
        assert_eq!(stream.tell(), 8);
    }

    #[test]
    fn zero_terminated_field() {
        let mut stream = MemoryStream::from(&b"abc\0\0\0xyz"[..]);
        assert_eq!(&stream.read_to_zero(6).unwrap()[..], b"abc");
        assert_eq!(stream.tell(), 6);
        assert_eq!(&stream.read_to_zero(3).unwrap()[..], b"xyz");
    }

    #[test]
    fn write_extends_and_overwrites() {
        let mut stream = MemoryStream::new();
        stream.write(b"hello").write_u16_le(0x0201);
        assert_eq!(stream.as_bytes(), b"hello\x01\x02");
        stream.seek(1).unwrap();
        stream.write(b"EL");
        assert_eq!(stream.as_bytes(), b"hELlo\x01\x02");
        assert_eq!(stream.tell(), 3);
        stream.seek(6).unwrap();
        stream.write_u32_le(0xAABBCCDD);
        assert_eq!(stream.size(), 10);
        assert_eq!(&stream.as_bytes()[6..], &[0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn truncate_clamps_cursor() {
        let mut stream = MemoryStream::from(vec![0; 10]);
        stream.seek(8).unwrap();
        stream.truncate(4).unwrap();
        assert_eq!(stream.size(), 4);
        assert_eq!(stream.tell(), 4);
        assert!(stream.truncate(5).is_err());
    }

    #[test]
    fn peek_restores_position() {
        let mut stream = MemoryStream::from(vec![1, 2, 3, 4]);
        stream.seek(1).unwrap();
        let value = stream.peek(|s| s.read_u16_le()).unwrap();
        assert_eq!(value, 0x0302);
        assert_eq!(stream.tell(), 1);
        assert!(stream.peek(|s| s.read(10)).is_err());
        assert_eq!(stream.tell(), 1);
    }

    proptest! {
        #[test]
        fn seek_then_read_matches_slice(
            buf in proptest::collection::vec(any::<u8>(), 0..256),
            offset in 0usize..300,
            count in 0usize..300,
        ) {
            let mut stream = MemoryStream::from(buf.clone());
            if offset > buf.len() {
                prop_assert!(stream.seek(offset).is_err());
                return Ok(());
            }
            stream.seek(offset).unwrap();
            if offset + count <= buf.len() {
                let bytes = stream.read(count).unwrap();
                prop_assert_eq!(&bytes[..], &buf[offset..offset + count]);
                prop_assert_eq!(stream.tell(), offset + count);
            } else {
                prop_assert!(stream.read(count).is_err());
                prop_assert_eq!(stream.tell(), offset);
            }
        }
    }
}
