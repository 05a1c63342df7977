//! Big-endian NBT decoder over an in-memory buffer.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use super::tag::{Compound, List, Tag, TagId};
use crate::error::{SchematicError, SchematicResult};

/// Nesting limit for lists and compounds.
pub const MAX_DEPTH: usize = 512;

/// Reads a named root compound, returning its name and contents.
pub fn read_root(data: &[u8]) -> SchematicResult<(String, Compound)> {
    let mut reader = Reader {
        cursor: Cursor::new(data),
    };
    let id = reader.u8()?;
    if id != TagId::Compound as u8 {
        return Err(SchematicError::nbt(format!(
            "root tag must be a compound, found id {}",
            id
        )));
    }
    let name = reader.string()?;
    let root = reader.compound(0)?;
    Ok((name, root))
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl Reader<'_> {
    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn u8(&mut self) -> SchematicResult<u8> {
        self.cursor.read_u8().map_err(truncated)
    }

    /// Array length, checked against the bytes left so a corrupt header
    /// cannot trigger a huge allocation.
    fn len(&mut self, element_size: usize) -> SchematicResult<usize> {
        let len = self.cursor.read_i32::<BigEndian>().map_err(truncated)?;
        let len = usize::try_from(len)
            .map_err(|_| SchematicError::nbt(format!("negative length {}", len)))?;
        if len.saturating_mul(element_size) > self.remaining() {
            return Err(SchematicError::nbt(format!(
                "length {} overruns the buffer",
                len
            )));
        }
        Ok(len)
    }

    fn string(&mut self) -> SchematicResult<String> {
        let len = usize::from(self.cursor.read_u16::<BigEndian>().map_err(truncated)?);
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf).map_err(truncated)?;
        String::from_utf8(buf).map_err(|e| SchematicError::nbt(format!("invalid string: {}", e)))
    }

    fn payload(&mut self, id: TagId, depth: usize) -> SchematicResult<Tag> {
        if depth > MAX_DEPTH {
            return Err(SchematicError::nbt("nesting too deep"));
        }
        Ok(match id {
            TagId::End => return Err(SchematicError::nbt("unexpected end tag")),
            TagId::Byte => Tag::Byte(self.cursor.read_i8().map_err(truncated)?),
            TagId::Short => Tag::Short(self.cursor.read_i16::<BigEndian>().map_err(truncated)?),
            TagId::Int => Tag::Int(self.cursor.read_i32::<BigEndian>().map_err(truncated)?),
            TagId::Long => Tag::Long(self.cursor.read_i64::<BigEndian>().map_err(truncated)?),
            TagId::Float => Tag::Float(self.cursor.read_f32::<BigEndian>().map_err(truncated)?),
            TagId::Double => Tag::Double(self.cursor.read_f64::<BigEndian>().map_err(truncated)?),
            TagId::ByteArray => {
                let len = self.len(1)?;
                let mut values = vec![0i8; len];
                self.cursor.read_i8_into(&mut values).map_err(truncated)?;
                Tag::ByteArray(values)
            }
            TagId::String => Tag::String(self.string()?),
            TagId::List => {
                let element = self.tag_id()?;
                let len = self.len(0)?;
                let mut items = Vec::new();
                for _ in 0..len {
                    items.push(self.payload(element, depth + 1)?);
                }
                Tag::List(List::from_parts(element, items))
            }
            TagId::Compound => Tag::Compound(self.compound(depth + 1)?),
            TagId::IntArray => {
                let len = self.len(4)?;
                let mut values = vec![0i32; len];
                self.cursor
                    .read_i32_into::<BigEndian>(&mut values)
                    .map_err(truncated)?;
                Tag::IntArray(values)
            }
            TagId::LongArray => {
                let len = self.len(8)?;
                let mut values = vec![0i64; len];
                self.cursor
                    .read_i64_into::<BigEndian>(&mut values)
                    .map_err(truncated)?;
                Tag::LongArray(values)
            }
        })
    }

    fn compound(&mut self, depth: usize) -> SchematicResult<Compound> {
        let mut compound = Compound::new();
        loop {
            let id = self.tag_id()?;
            if id == TagId::End {
                return Ok(compound);
            }
            let name = self.string()?;
            let tag = self.payload(id, depth)?;
            compound.insert(name, tag);
        }
    }

    fn tag_id(&mut self) -> SchematicResult<TagId> {
        let id = self.u8()?;
        TagId::from_u8(id).ok_or_else(|| SchematicError::nbt(format!("unknown tag id {}", id)))
    }
}

fn truncated(_: std::io::Error) -> SchematicError {
    SchematicError::nbt("unexpected end of data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::write::write_root;
    use pretty_assertions::assert_eq;

    fn sample() -> Compound {
        Compound::new()
            .with("byte", Tag::Byte(-3))
            .with("short", Tag::Short(-300))
            .with("long", Tag::Long(i64::MIN))
            .with("double", Tag::Double(0.25))
            .with("bytes", Tag::ByteArray(vec![1, -1, 7]))
            .with("ints", Tag::IntArray(vec![i32::MAX, 0]))
            .with("longs", Tag::LongArray(vec![-1, 42]))
            .with("list", List::from_iter([Compound::new().with("k", "v")]))
            .with("empty", List::empty(TagId::Int))
            .with("nested", Compound::new().with("f", Tag::Float(1.5)))
    }

    #[test]
    fn test_read_back_every_tag() {
        let mut bytes = Vec::new();
        write_root(&mut bytes, "root", &sample()).unwrap();
        let (name, root) = read_root(&bytes).unwrap();
        assert_eq!(name, "root");
        assert_eq!(root, sample());
    }

    #[test]
    fn test_truncated_input() {
        let mut bytes = Vec::new();
        write_root(&mut bytes, "root", &sample()).unwrap();
        for cut in [0, 1, 5, bytes.len() / 2, bytes.len() - 1] {
            assert!(read_root(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn test_unknown_tag_id() {
        // root compound "" containing a tag with id 13
        let bytes = [10, 0, 0, 13, 0, 1, b'x', 0];
        let err = read_root(&bytes).unwrap_err();
        assert!(err.to_string().contains("unknown tag id 13"));
    }

    #[test]
    fn test_oversized_length_rejected() {
        // long array claiming i32::MAX elements
        let bytes = [10, 0, 0, 12, 0, 1, b'x', 0x7f, 0xff, 0xff, 0xff, 0];
        let err = read_root(&bytes).unwrap_err();
        assert!(err.to_string().contains("overruns"));
    }

    #[test]
    fn test_root_must_be_compound() {
        assert!(read_root(&[8, 0, 0, 0, 0]).is_err());
    }
}
