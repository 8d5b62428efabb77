//! Address types: virtual addresses and section-relative locations.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed virtual address
///
/// A virtual address is the load address of an image plus an RVA. Keeping it
/// apart from the 32-bit RVA and from section-relative offsets prevents the
/// three address spaces of an image from being mixed up.
///
/// ## Example
///
/// ```rust
/// use symstore_core::types::Address;
///
/// let addr = Address::from(0x40_1000);
/// let next_addr = addr + 0x100;
/// assert_eq!(next_addr.value(), 0x40_1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address, also returned when an RVA cannot be mapped
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// ## Example
    ///
    /// ```rust
    /// use symstore_core::types::Address;
    ///
    /// const IMAGE_BASE: Address = Address::new(0x40_0000);
    /// ```
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address
    pub const fn is_zero(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ## Example
    ///
    /// ```rust
    /// use symstore_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset from this address, checking for underflow
    pub fn checked_sub(self, offset: u64) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }

    /// Distance from `base` to this address as an RVA
    ///
    /// Returns `None` if this address is below `base` or more than 4 GiB past it.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use symstore_core::types::Address;
    ///
    /// let base = Address::new(0x40_0000);
    /// assert_eq!(Address::new(0x40_1010).rva_from(base), Some(0x1010));
    /// assert_eq!(Address::new(0x3f_0000).rva_from(base), None);
    /// ```
    pub fn rva_from(self, base: Address) -> Option<u32>
    {
        self.0.checked_sub(base.0).and_then(|delta| u32::try_from(delta).ok())
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

/// A section-relative location: 1-based section index plus byte offset
///
/// Section index 0 means "no section" and never comes out of a successful
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SegmentOffset
{
    /// 1-based section (segment) index
    pub segment: u16,
    /// Offset from the start of the section
    pub offset: u32,
}

impl SegmentOffset
{
    /// Create a section-relative location
    pub const fn new(segment: u16, offset: u32) -> Self
    {
        Self { segment, offset }
    }

    /// Whether the section index refers to a real section
    pub const fn is_valid(self) -> bool
    {
        self.segment != 0
    }
}

impl fmt::Display for SegmentOffset
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:04x}:{:08x}", self.segment, self.offset)
    }
}
