use std::io::Read;

use crate::{error::DbError, types::DbResult};

/// Accumulates the on-disk representation of an object.
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a new `ByteWriter` with an empty buffer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a new `ByteWriter` with a buffer of the given capacity.
    pub fn new_reserved(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write<T: Encodeable + ?Sized>(&mut self, obj: &T) {
        obj.encode(self);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pad the buffer with zeros up to `size` and hand it out. The
    /// writer is left empty.
    pub fn to_padded_bytes(&mut self, size: usize) -> DbResult<Vec<u8>> {
        if self.buf.len() > size {
            return Err(DbError::Database(format!(
                "encoded size {} exceeds the target size {}",
                self.buf.len(),
                size
            )));
        }

        self.buf.resize(size, 0);
        Ok(std::mem::take(&mut self.buf))
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Encodeable {
    fn encode(&self, writer: &mut ByteWriter);

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer);
        writer.buf
    }
}

/// Decoding needs to know the layout up front (a cell needs its type, a
/// tuple needs its schema), that's the `Reference`.
pub trait Decodeable: Sized {
    type Reference: ?Sized;

    fn decode_from<R: Read>(reader: &mut R, reference: &Self::Reference) -> DbResult<Self>;
}

pub fn read_exact<R: Read>(reader: &mut R, bytes_count: usize) -> DbResult<Vec<u8>> {
    let mut buffer = vec![0u8; bytes_count];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

pub fn read_u32<R: Read>(reader: &mut R) -> DbResult<u32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(u32::from_be_bytes(buffer))
}

pub fn read_i32<R: Read>(reader: &mut R) -> DbResult<i32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(i32::from_be_bytes(buffer))
}
