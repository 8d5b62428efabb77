//! Numeric constants of the NB09 CodeView format.
//!
//! Only the values this crate decodes are listed.

/// Signature at the start of an NB09 debug-info blob.
pub const NB09_SIGNATURE: &[u8; 4] = b"NB09";

/// Size of the signature plus the directory file offset that follows it.
pub const SIGNATURE_LEN: usize = 8;

// Subsection kinds of directory entries
pub const SST_MODULE: u16 = 0x120;
pub const SST_ALIGN_SYM: u16 = 0x125;
pub const SST_SRC_MODULE: u16 = 0x127;
pub const SST_GLOBAL_SYM: u16 = 0x129;
pub const SST_GLOBAL_PUB: u16 = 0x12a;
pub const SST_GLOBAL_TYPES: u16 = 0x12b;
pub const SST_STATIC_SYM: u16 = 0x134;

/// Name hash function identifier the store understands.
pub const SYM_HASH_NAME: u16 = 0x0a;
/// Address hash function identifier the store understands.
pub const SYM_HASH_ADDR: u16 = 0x0c;
/// Size of the `OMFSymHash` header preceding a symbol heap.
pub const SYM_HASH_HEADER_LEN: usize = 16;
/// Bucket count marking a hash bucket as unusable.
pub const INVALID_BUCKET_COUNT: u32 = u32::MAX;

// Symbol record ids
pub const S_COMPILE: u16 = 0x0001;
pub const S_REGISTER: u16 = 0x0002;
pub const S_CONSTANT: u16 = 0x0003;
pub const S_UDT: u16 = 0x0004;
pub const S_SSEARCH: u16 = 0x0005;
pub const S_END: u16 = 0x0006;
pub const S_OBJNAME: u16 = 0x0009;
pub const S_ENDARG: u16 = 0x000a;
pub const S_MANYREG: u16 = 0x000c;
pub const S_BPREL32: u16 = 0x0200;
pub const S_LDATA32: u16 = 0x0201;
pub const S_GDATA32: u16 = 0x0202;
pub const S_PUB32: u16 = 0x0203;
pub const S_LPROC32: u16 = 0x0204;
pub const S_GPROC32: u16 = 0x0205;
pub const S_THUNK32: u16 = 0x0206;
pub const S_BLOCK32: u16 = 0x0207;
pub const S_WITH32: u16 = 0x0208;
pub const S_LABEL32: u16 = 0x0209;
pub const S_REGREL32: u16 = 0x020c;
pub const S_LTHREAD32: u16 = 0x020d;
pub const S_GTHREAD32: u16 = 0x020e;
pub const S_PROCREF: u16 = 0x0400;
pub const S_DATAREF: u16 = 0x0401;
pub const S_ALIGN: u16 = 0x0402;

/// Whether a symbol record opens a scope closed by an `S_END` record.
pub const fn is_scope_symbol(id: u16) -> bool
{
    matches!(id, S_LPROC32 | S_GPROC32 | S_THUNK32 | S_BLOCK32 | S_WITH32)
}

/// Whether a symbol record refers to a definition in a compiland heap.
pub const fn is_reference_symbol(id: u16) -> bool
{
    matches!(id, S_PROCREF | S_DATAREF)
}

// Type leaves
pub const LF_MODIFIER: u16 = 0x0001;
pub const LF_POINTER: u16 = 0x0002;
pub const LF_ARRAY: u16 = 0x0003;
pub const LF_CLASS: u16 = 0x0004;
pub const LF_STRUCTURE: u16 = 0x0005;
pub const LF_UNION: u16 = 0x0006;
pub const LF_ENUM: u16 = 0x0007;
pub const LF_PROCEDURE: u16 = 0x0008;
pub const LF_MFUNCTION: u16 = 0x0009;
pub const LF_VTSHAPE: u16 = 0x000a;
pub const LF_OEM: u16 = 0x0015;
pub const LF_ARGLIST: u16 = 0x0201;
pub const LF_FIELDLIST: u16 = 0x0204;
pub const LF_DERIVED: u16 = 0x0205;
pub const LF_METHODLIST: u16 = 0x0207;

// Field list leaves
pub const LF_BCLASS: u16 = 0x0400;
pub const LF_VBCLASS: u16 = 0x0401;
pub const LF_IVBCLASS: u16 = 0x0402;
pub const LF_ENUMERATE: u16 = 0x0403;
pub const LF_FRIENDFCN: u16 = 0x0404;
pub const LF_INDEX: u16 = 0x0405;
pub const LF_MEMBER: u16 = 0x0406;
pub const LF_STMEMBER: u16 = 0x0407;
pub const LF_METHOD: u16 = 0x0408;
pub const LF_NESTTYPE: u16 = 0x0409;
pub const LF_VFUNCTAB: u16 = 0x040a;
pub const LF_FRIENDCLS: u16 = 0x040b;
pub const LF_ONEMETHOD: u16 = 0x040c;
pub const LF_VFUNCOFF: u16 = 0x040d;

/// First leaf id of the field-list range; smaller ids are whole records.
pub const FIRST_FIELD_LEAF: u16 = LF_BCLASS;

/// Synthetic tag for one entry of a method overload list.
pub const LF_METHOD_OVERLOAD: u16 = 0xf001;

/// Smallest padding byte in a field list; `b - LF_PAD0` bytes are skipped.
pub const LF_PAD0: u8 = 0xf0;

// Numeric leaves
pub const LF_NUMERIC: u16 = 0x8000;
pub const LF_CHAR: u16 = 0x8000;
pub const LF_SHORT: u16 = 0x8001;
pub const LF_USHORT: u16 = 0x8002;
pub const LF_LONG: u16 = 0x8003;
pub const LF_ULONG: u16 = 0x8004;
pub const LF_REAL32: u16 = 0x8005;
pub const LF_REAL64: u16 = 0x8006;
pub const LF_REAL80: u16 = 0x8007;
pub const LF_REAL128: u16 = 0x8008;
pub const LF_QUADWORD: u16 = 0x8009;
pub const LF_UQUADWORD: u16 = 0x800a;
pub const LF_REAL48: u16 = 0x800b;
pub const LF_COMPLEX32: u16 = 0x800c;
pub const LF_COMPLEX64: u16 = 0x800d;
pub const LF_COMPLEX80: u16 = 0x800e;
pub const LF_COMPLEX128: u16 = 0x800f;
pub const LF_VARSTRING: u16 = 0x8010;

/// Index used by field and overload handles, which have no global index.
pub const FIELD_TYPE_INDEX: u16 = 0xffff;

// Method properties, bits 2..4 of a member attribute
pub const MPROP_INTRO: u16 = 4;
pub const MPROP_PURE_INTRO: u16 = 6;

/// Method property of a member attribute word.
pub const fn method_property(attr: u16) -> u16
{
    (attr >> 2) & 7
}

/// Whether a method with this attribute carries a vtable offset.
pub const fn is_intro_method(attr: u16) -> bool
{
    matches!(method_property(attr), MPROP_INTRO | MPROP_PURE_INTRO)
}

// Pointer attribute bits mapped onto modifier flags
pub const PTR_ATTR_VOLATILE: u16 = 1 << 9;
pub const PTR_ATTR_CONST: u16 = 1 << 10;
pub const PTR_ATTR_UNALIGNED: u16 = 1 << 11;

pub const MOD_CONST: u16 = 1 << 0;
pub const MOD_VOLATILE: u16 = 1 << 1;
pub const MOD_UNALIGNED: u16 = 1 << 2;
