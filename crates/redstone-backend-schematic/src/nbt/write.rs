//! Big-endian NBT encoder.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

use super::tag::{Compound, List, Tag, TagId};

/// Writes a named root compound.
pub fn write_root<W: Write>(writer: &mut W, name: &str, root: &Compound) -> io::Result<()> {
    writer.write_u8(TagId::Compound as u8)?;
    write_string(writer, name)?;
    write_compound(writer, root)
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> io::Result<()> {
    match tag {
        Tag::Byte(v) => writer.write_i8(*v),
        Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
        Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
        Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
        Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
        Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
        Tag::ByteArray(values) => {
            write_len(writer, values.len())?;
            for v in values {
                writer.write_i8(*v)?;
            }
            Ok(())
        }
        Tag::String(s) => write_string(writer, s),
        Tag::List(list) => write_list(writer, list),
        Tag::Compound(c) => write_compound(writer, c),
        Tag::IntArray(values) => {
            write_len(writer, values.len())?;
            for v in values {
                writer.write_i32::<BigEndian>(*v)?;
            }
            Ok(())
        }
        Tag::LongArray(values) => {
            write_len(writer, values.len())?;
            for v in values {
                writer.write_i64::<BigEndian>(*v)?;
            }
            Ok(())
        }
    }
}

fn write_compound<W: Write>(writer: &mut W, compound: &Compound) -> io::Result<()> {
    for (name, tag) in compound.iter() {
        writer.write_u8(tag.id() as u8)?;
        write_string(writer, name)?;
        write_payload(writer, tag)?;
    }
    writer.write_u8(TagId::End as u8)
}

fn write_list<W: Write>(writer: &mut W, list: &List) -> io::Result<()> {
    writer.write_u8(list.element() as u8)?;
    write_len(writer, list.len())?;
    for item in list.items() {
        write_payload(writer, item)?;
    }
    Ok(())
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "NBT string longer than 65535 bytes")
    })?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(s.as_bytes())
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let len = i32::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "NBT array too long"))?;
    writer.write_i32::<BigEndian>(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world() {
        // The canonical "hello world" NBT test file, uncompressed.
        let root = Compound::new().with("name", "Bananrama");
        let mut out = Vec::new();
        write_root(&mut out, "hello world", &root).unwrap();

        let mut expected = vec![0x0a, 0x00, 0x0b];
        expected.extend_from_slice(b"hello world");
        expected.extend_from_slice(&[0x08, 0x00, 0x04]);
        expected.extend_from_slice(b"name");
        expected.extend_from_slice(&[0x00, 0x09]);
        expected.extend_from_slice(b"Bananrama");
        expected.push(0x00);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_big_endian_scalars() {
        let root = Compound::new()
            .with("s", Tag::Short(0x0102))
            .with("l", Tag::LongArray(vec![1]));
        let mut out = Vec::new();
        write_root(&mut out, "", &root).unwrap();
        // root header (3) + short tag header (4) + payload
        assert_eq!(&out[7..9], &[0x01, 0x02]);
        // long array: header (4) + length (4) + value
        assert_eq!(&out[13..17], &[0, 0, 0, 1]);
        assert_eq!(&out[17..25], &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_empty_list_keeps_element_type() {
        let root = Compound::new().with("e", List::compounds());
        let mut out = Vec::new();
        write_root(&mut out, "", &root).unwrap();
        assert_eq!(&out[3..], &[9, 0, 1, b'e', 10, 0, 0, 0, 0, 0]);
    }
}
