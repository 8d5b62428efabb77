//! Numeric leaves: the variable-length integer and real encoding used for
//! offsets, lengths and constant values inside symbol and type records.
//!
//! A leaf value below [`LF_NUMERIC`] is the value itself. At or above it, the
//! 16-bit word is a tag selecting the layout of the bytes that follow. Both
//! the size and the value decoders below read the same tag table, so record
//! length arithmetic and value extraction cannot disagree.

use super::constants::*;
use super::reader::ByteReader;
use crate::error::Result;
use crate::types::Variant;

/// Total size in bytes of the numeric leaf at `offset`, tag included.
///
/// Unknown tags occupy just the tag word.
pub fn numeric_leaf_size(reader: &ByteReader<'_>, offset: usize) -> Result<usize>
{
    let tag = reader.u16_at(offset)?;
    if tag < LF_NUMERIC {
        return Ok(2);
    }

    let payload = match tag {
        LF_CHAR => 1,
        LF_SHORT | LF_USHORT => 2,
        LF_LONG | LF_ULONG | LF_REAL32 => 4,
        LF_REAL48 => 6,
        LF_QUADWORD | LF_UQUADWORD | LF_REAL64 | LF_COMPLEX32 => 8,
        LF_REAL80 => 10,
        LF_REAL128 | LF_COMPLEX64 => 16,
        LF_COMPLEX80 => 20,
        LF_COMPLEX128 => 32,
        LF_VARSTRING => 2 + usize::from(reader.u16_at(offset + 2)?),
        _ => 0,
    };

    Ok(2 + payload)
}

/// Value of the numeric leaf at `offset` as an unsigned 32-bit integer.
///
/// Only the inline, char, short and long encodings carry an integer; every
/// other encoding reads as 0. A char leaf is sign-extended.
pub fn numeric_leaf_uint(reader: &ByteReader<'_>, offset: usize) -> Result<u32>
{
    let tag = reader.u16_at(offset)?;
    if tag < LF_NUMERIC {
        return Ok(u32::from(tag));
    }

    Ok(match tag {
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        LF_CHAR => i32::from(reader.u8_at(offset + 2)? as i8) as u32,
        LF_SHORT | LF_USHORT => u32::from(reader.u16_at(offset + 2)?),
        LF_LONG | LF_ULONG => reader.u32_at(offset + 2)?,
        _ => 0,
    })
}

/// Decode the numeric leaf at `offset` into a typed value.
///
/// Inline values decode as [`Variant::Short`]. Unknown tags decode as
/// [`Variant::UShort`] carrying the tag word itself.
pub fn numeric_leaf_value<'a>(reader: &ByteReader<'a>, offset: usize) -> Result<Variant<'a>>
{
    let tag = reader.u16_at(offset)?;
    let at = offset + 2;

    #[allow(clippy::cast_possible_wrap)]
    let value = match tag {
        _ if tag < LF_NUMERIC => Variant::Short(tag as i16),
        LF_CHAR => Variant::Char(reader.u8_at(at)? as i8),
        LF_SHORT => Variant::Short(reader.i16_at(at)?),
        LF_USHORT => Variant::UShort(reader.u16_at(at)?),
        LF_LONG => Variant::Long(reader.i32_at(at)?),
        LF_ULONG => Variant::ULong(reader.u32_at(at)?),
        LF_QUADWORD => Variant::Quad(reader.u64_at(at)? as i64),
        LF_UQUADWORD => Variant::UQuad(reader.u64_at(at)?),
        LF_REAL32 => Variant::Real32(reader.f32_at(at)?),
        LF_REAL64 => Variant::Real64(reader.f64_at(at)?),
        LF_REAL48 => Variant::Real48(reader.array_at(at)?),
        LF_REAL80 => Variant::Real80(reader.array_at(at)?),
        LF_REAL128 => Variant::Real128(reader.array_at(at)?),
        LF_COMPLEX32 => Variant::Complex32(reader.f32_at(at)?, reader.f32_at(at + 4)?),
        LF_COMPLEX64 => Variant::Complex64(reader.f64_at(at)?, reader.f64_at(at + 8)?),
        LF_COMPLEX80 => Variant::Complex80(reader.array_at(at)?),
        LF_COMPLEX128 => Variant::Complex128(reader.array_at(at)?),
        LF_VARSTRING => {
            let len = reader.u16_at(at)?;
            Variant::VarString(reader.slice_at(at + 2, usize::from(len))?)
        }
        _ => Variant::UShort(tag),
    };

    Ok(value)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_inline_literal()
    {
        let reader = ByteReader::new(&[0x34, 0x12]);
        assert_eq!(numeric_leaf_size(&reader, 0).unwrap(), 2);
        assert_eq!(numeric_leaf_uint(&reader, 0).unwrap(), 0x1234);
        assert_eq!(numeric_leaf_value(&reader, 0).unwrap(), Variant::Short(0x1234));
    }

    #[test]
    fn test_char_is_sign_extended()
    {
        let reader = ByteReader::new(&[0x00, 0x80, 0xfe]);
        assert_eq!(numeric_leaf_size(&reader, 0).unwrap(), 3);
        assert_eq!(numeric_leaf_uint(&reader, 0).unwrap(), 0xffff_fffe);
        assert_eq!(numeric_leaf_value(&reader, 0).unwrap(), Variant::Char(-2));
    }

    #[test]
    fn test_sizes_of_fixed_encodings()
    {
        let cases: [(u16, usize); 14] = [
            (LF_SHORT, 4),
            (LF_USHORT, 4),
            (LF_LONG, 6),
            (LF_ULONG, 6),
            (LF_REAL32, 6),
            (LF_REAL48, 8),
            (LF_QUADWORD, 10),
            (LF_UQUADWORD, 10),
            (LF_REAL64, 10),
            (LF_COMPLEX32, 10),
            (LF_REAL80, 12),
            (LF_REAL128, 18),
            (LF_COMPLEX80, 22),
            (LF_COMPLEX128, 34),
        ];

        for (tag, size) in cases {
            let mut bytes = tag.to_le_bytes().to_vec();
            bytes.resize(40, 0);
            let reader = ByteReader::new(&bytes);
            assert_eq!(numeric_leaf_size(&reader, 0).unwrap(), size, "tag {tag:#x}");
        }
    }

    #[test]
    fn test_varstring()
    {
        let mut bytes = LF_VARSTRING.to_le_bytes().to_vec();
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"abc");
        let reader = ByteReader::new(&bytes);

        assert_eq!(numeric_leaf_size(&reader, 0).unwrap(), 7);
        assert_eq!(numeric_leaf_value(&reader, 0).unwrap(), Variant::VarString(b"abc"));
        assert_eq!(numeric_leaf_uint(&reader, 0).unwrap(), 0);
    }

    #[test]
    fn test_ulong_value()
    {
        let mut bytes = LF_ULONG.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        let reader = ByteReader::new(&bytes);

        assert_eq!(numeric_leaf_uint(&reader, 0).unwrap(), 0x0001_0000);
        assert_eq!(numeric_leaf_value(&reader, 0).unwrap(), Variant::ULong(0x0001_0000));
    }

    #[test]
    fn test_truncated_leaf_fails()
    {
        let bytes = LF_LONG.to_le_bytes();
        let reader = ByteReader::new(&bytes);
        assert!(numeric_leaf_uint(&reader, 0).is_err());
    }
}
