use std::{fmt, io::Read};

use crate::{
    error::DbError,
    io::{read_exact, read_i32, read_u32, ByteWriter, Decodeable, Encodeable},
    storage::schema::{Type, STRING_LEN},
    types::DbResult,
};

/// A single value of a tuple.
///
/// Cells are totally ordered: ints compare as integers, strings
/// lexicographically, and every int sorts before every string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cell {
    Int(i32),
    String(String),
}

impl Cell {
    pub fn get_type(&self) -> Type {
        match self {
            Cell::Int(_) => Type::Int,
            Cell::String(_) => Type::String,
        }
    }

    pub fn get_int(&self) -> DbResult<i32> {
        match self {
            Cell::Int(v) => Ok(*v),
            _ => Err(DbError::Database(format!("expect int cell, got {:?}", self))),
        }
    }

    pub fn get_string(&self) -> DbResult<&str> {
        match self {
            Cell::String(v) => Ok(v),
            _ => Err(DbError::Database(format!("expect string cell, got {:?}", self))),
        }
    }

    /// Cut a string cell down to what its on-disk slot can hold, so the
    /// value in memory is the value read back from disk.
    pub fn fit_to_slot(&mut self) {
        if let Cell::String(v) = self {
            let len = slot_prefix(v).len();
            v.truncate(len);
        }
    }
}

/// Longest prefix of `s` that fits in `STRING_LEN` bytes without splitting
/// a character.
fn slot_prefix(s: &str) -> &str {
    if s.len() <= STRING_LEN {
        return s;
    }
    let mut end = STRING_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl Encodeable for Cell {
    fn encode(&self, writer: &mut ByteWriter) {
        match self {
            Cell::Int(v) => writer.write_bytes(&v.to_be_bytes()),
            Cell::String(v) => {
                let bytes = slot_prefix(v).as_bytes();
                let len = bytes.len();
                writer.write_bytes(&(len as u32).to_be_bytes());
                writer.write_bytes(&bytes[..len]);
                writer.write_bytes(&vec![0; STRING_LEN - len]);
            }
        }
    }
}

impl Decodeable for Cell {
    type Reference = Type;

    fn decode_from<R: Read>(reader: &mut R, t: &Type) -> DbResult<Self> {
        match t {
            Type::Int => Ok(Cell::Int(read_i32(reader)?)),
            Type::String => {
                let len = (read_u32(reader)? as usize).min(STRING_LEN);
                let content = read_exact(reader, STRING_LEN)?;
                let s = String::from_utf8_lossy(&content[..len]).into_owned();
                Ok(Cell::String(s))
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{}", v),
            Cell::String(v) => write!(f, "{}", v),
        }
    }
}
