//! Symbol classification enums and typed constant values.
//!
//! The numeric values of [`SymTag`], [`DataKind`], [`LocationType`],
//! [`UdtKind`] and [`BasicType`] follow the values debuggers conventionally
//! use for these concepts, so they can be passed through to consumers that
//! expect them.

use std::fmt;

/// Index of a type record.
///
/// CodeView indices are 16-bit (`0x1000` and above refer to records, lower
/// values encode primitive types); PDB symbol ids share the same space, so the
/// wider type is used at the API boundary.
pub type TypeIndex = u32;

/// First type index that refers to a record rather than a primitive.
pub const FIRST_RECORD_TYPE_INDEX: TypeIndex = 0x1000;

/// Which hashed symbol table a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolHeapId
{
    /// Global symbols (functions, global data, references into compilands)
    Global,
    /// File-static symbols
    Static,
    /// Linker public symbols
    Public,
}

impl SymbolHeapId
{
    /// All heaps, in the order global lookups try them.
    pub const ALL: [SymbolHeapId; 3] = [SymbolHeapId::Global, SymbolHeapId::Static, SymbolHeapId::Public];

    /// Position of the heap in per-heap tables.
    pub const fn index(self) -> usize
    {
        match self {
            SymbolHeapId::Global => 0,
            SymbolHeapId::Static => 1,
            SymbolHeapId::Public => 2,
        }
    }
}

impl fmt::Display for SymbolHeapId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SymbolHeapId::Global => "global",
            SymbolHeapId::Static => "static",
            SymbolHeapId::Public => "public",
        };
        write!(f, "{label}")
    }
}

/// Kind of a symbol or type record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SymTag
{
    Null = 0,
    Exe = 1,
    Compiland = 2,
    CompilandDetails = 3,
    CompilandEnv = 4,
    Function = 5,
    Block = 6,
    Data = 7,
    Annotation = 8,
    Label = 9,
    PublicSymbol = 10,
    Udt = 11,
    Enum = 12,
    FunctionType = 13,
    PointerType = 14,
    ArrayType = 15,
    BaseType = 16,
    Typedef = 17,
    BaseClass = 18,
    Friend = 19,
    FunctionArgType = 20,
    FuncDebugStart = 21,
    FuncDebugEnd = 22,
    UsingNamespace = 23,
    VTableShape = 24,
    VTable = 25,
    Custom = 26,
    Thunk = 27,
    CustomType = 28,
    ManagedType = 29,
    Dimension = 30,
    /// Member list of an aggregate or enum
    FieldList = 31,
    /// Argument list or derived-class list
    TypeList = 32,
    /// A named group of overloaded methods
    MethodOverloads = 33,
    /// One method, standalone or from an overload list
    Method = 34,
    /// Marker separating parameters from locals in a procedure scope
    EndOfArgs = 35,
    /// Type nested inside an aggregate
    NestedType = 36,
}

impl SymTag
{
    /// Decode a raw tag value, as reported by an external PDB session.
    pub fn from_raw(value: u32) -> Option<Self>
    {
        use SymTag::*;
        const TABLE: [SymTag; 37] = [
            Null,
            Exe,
            Compiland,
            CompilandDetails,
            CompilandEnv,
            Function,
            Block,
            Data,
            Annotation,
            Label,
            PublicSymbol,
            Udt,
            Enum,
            FunctionType,
            PointerType,
            ArrayType,
            BaseType,
            Typedef,
            BaseClass,
            Friend,
            FunctionArgType,
            FuncDebugStart,
            FuncDebugEnd,
            UsingNamespace,
            VTableShape,
            VTable,
            Custom,
            Thunk,
            CustomType,
            ManagedType,
            Dimension,
            FieldList,
            TypeList,
            MethodOverloads,
            Method,
            EndOfArgs,
            NestedType,
        ];
        TABLE.get(value as usize).copied()
    }

    /// Tags whose records describe a type rather than a named entity.
    pub const fn is_type(self) -> bool
    {
        matches!(
            self,
            SymTag::Udt
                | SymTag::Enum
                | SymTag::FunctionType
                | SymTag::PointerType
                | SymTag::ArrayType
                | SymTag::BaseType
                | SymTag::Typedef
                | SymTag::CustomType
                | SymTag::ManagedType
                | SymTag::VTableShape
        )
    }
}

/// Storage class of a data symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataKind
{
    Unknown = 0,
    Local = 1,
    StaticLocal = 2,
    Param = 3,
    ObjectPtr = 4,
    FileStatic = 5,
    Global = 6,
    Member = 7,
    StaticMember = 8,
    Constant = 9,
}

impl DataKind
{
    /// Decode a raw data kind value.
    pub const fn from_raw(value: u32) -> Option<Self>
    {
        Some(match value {
            0 => DataKind::Unknown,
            1 => DataKind::Local,
            2 => DataKind::StaticLocal,
            3 => DataKind::Param,
            4 => DataKind::ObjectPtr,
            5 => DataKind::FileStatic,
            6 => DataKind::Global,
            7 => DataKind::Member,
            8 => DataKind::StaticMember,
            9 => DataKind::Constant,
            _ => return None,
        })
    }
}

/// Where a symbol's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LocationType
{
    Null = 0,
    Static = 1,
    Tls = 2,
    RegRel = 3,
    ThisRel = 4,
    Enregistered = 5,
    BitField = 6,
    Slot = 7,
    IlRel = 8,
    MetaData = 9,
    Constant = 10,
}

impl LocationType
{
    /// Decode a raw location type value.
    pub const fn from_raw(value: u32) -> Option<Self>
    {
        Some(match value {
            0 => LocationType::Null,
            1 => LocationType::Static,
            2 => LocationType::Tls,
            3 => LocationType::RegRel,
            4 => LocationType::ThisRel,
            5 => LocationType::Enregistered,
            6 => LocationType::BitField,
            7 => LocationType::Slot,
            8 => LocationType::IlRel,
            9 => LocationType::MetaData,
            10 => LocationType::Constant,
            _ => return None,
        })
    }
}

/// Flavour of a user-defined aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum UdtKind
{
    Struct = 0,
    Class = 1,
    Union = 2,
}

/// Primitive type family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BasicType
{
    NoType = 0,
    Void = 1,
    Char = 2,
    WChar = 3,
    Int = 6,
    UInt = 7,
    Float = 8,
    Bcd = 9,
    Bool = 10,
    Long = 13,
    ULong = 14,
    Currency = 25,
    Date = 26,
    Variant = 27,
    Complex = 28,
    Bit = 29,
    Bstr = 30,
    HResult = 31,
}

/// A typed constant value decoded from a numeric leaf.
///
/// The discriminants of [`Variant::tag`] are the numeric leaf tags of the
/// CodeView format (`0x8000` and up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant<'a>
{
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Long(i32),
    ULong(u32),
    Quad(i64),
    UQuad(u64),
    Real32(f32),
    Real64(f64),
    /// 80-bit extended precision, kept as raw little-endian bytes
    Real80([u8; 10]),
    Real128([u8; 16]),
    Real48([u8; 6]),
    Complex32(f32, f32),
    Complex64(f64, f64),
    Complex80([u8; 20]),
    Complex128([u8; 32]),
    VarString(&'a [u8]),
}

impl Variant<'_>
{
    /// Numeric leaf tag of this value.
    pub const fn tag(&self) -> u16
    {
        match self {
            Variant::Char(_) => 0x8000,
            Variant::Short(_) => 0x8001,
            Variant::UShort(_) => 0x8002,
            Variant::Long(_) => 0x8003,
            Variant::ULong(_) => 0x8004,
            Variant::Real32(_) => 0x8005,
            Variant::Real64(_) => 0x8006,
            Variant::Real80(_) => 0x8007,
            Variant::Real128(_) => 0x8008,
            Variant::Quad(_) => 0x8009,
            Variant::UQuad(_) => 0x800a,
            Variant::Real48(_) => 0x800b,
            Variant::Complex32(..) => 0x800c,
            Variant::Complex64(..) => 0x800d,
            Variant::Complex80(_) => 0x800e,
            Variant::Complex128(_) => 0x800f,
            Variant::VarString(_) => 0x8010,
            Variant::UChar(_) => 0x8011,
        }
    }

    /// The value as a signed integer, if it is an integer.
    pub const fn as_i64(&self) -> Option<i64>
    {
        Some(match *self {
            Variant::Char(v) => v as i64,
            Variant::UChar(v) => v as i64,
            Variant::Short(v) => v as i64,
            Variant::UShort(v) => v as i64,
            Variant::Long(v) => v as i64,
            Variant::ULong(v) => v as i64,
            Variant::Quad(v) => v,
            #[allow(clippy::cast_possible_wrap)]
            Variant::UQuad(v) => v as i64,
            _ => return None,
        })
    }

    /// The value as an unsigned integer, if it is an integer.
    ///
    /// Signed values are sign-extended and reinterpreted.
    #[allow(clippy::cast_sign_loss)]
    pub const fn as_u64(&self) -> Option<u64>
    {
        match *self {
            Variant::UQuad(v) => Some(v),
            _ => match self.as_i64() {
                Some(v) => Some(v as u64),
                None => None,
            },
        }
    }
}
