use std::rc::Rc;

use super::{PdbSession, PdbStore, PdbSymbol};
use crate::info::SymbolInfo;
use crate::types::{BasicType, DataKind, LocationType, SymTag, TypeIndex, UdtKind, Variant};

// Modifier bits reported for PDB records
const MOD_CONST: u16 = 0x01;
const MOD_STATIC: u16 = 0x10;
const MOD_VIRTUAL: u16 = 0x20;

/// [`SymbolInfo`] over one record of a [`PdbSession`].
///
/// Symbols and types share this adapter; a type's field list and parameter
/// list are its own children, so both report the record's own id.
pub struct PdbSymbolInfo<'a, S>
{
    store: &'a PdbStore<S>,
    symbol: Rc<PdbSymbol>,
}

impl<'a, S: PdbSession> PdbSymbolInfo<'a, S>
{
    pub(super) fn new(store: &'a PdbStore<S>, symbol: Rc<PdbSymbol>) -> Self
    {
        Self { store, symbol }
    }

    pub fn id(&self) -> u32
    {
        self.symbol.id
    }

    pub fn record(&self) -> &PdbSymbol
    {
        &self.symbol
    }

    fn children(&self) -> Vec<u32>
    {
        self.store.session().find_children(self.symbol.id, None, None, false)
    }

    /// Argument types found by walking the children, skipping `NoType`
    /// placeholders.
    fn child_types(&self, count: usize) -> Vec<TypeIndex>
    {
        self.children()
            .into_iter()
            .take(count)
            .filter_map(|child| self.store.symbol(child).ok()?.type_id)
            .filter(|&type_id| {
                self.store.symbol(type_id).map_or(true, |ty| ty.basic_type != Some(BasicType::NoType))
            })
            .collect()
    }
}

impl<S> std::fmt::Debug for PdbSymbolInfo<'_, S>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("PdbSymbolInfo").field("symbol", &self.symbol).finish()
    }
}

impl<S: PdbSession> SymbolInfo for PdbSymbolInfo<'_, S>
{
    fn sym_tag(&self) -> SymTag
    {
        self.symbol.tag
    }

    fn name(&self) -> Option<&[u8]>
    {
        self.symbol.name.as_deref()
    }

    fn type_index(&self) -> Option<TypeIndex>
    {
        self.symbol.type_id.or_else(|| {
            matches!(
                self.symbol.tag,
                SymTag::Udt
                    | SymTag::Enum
                    | SymTag::FunctionType
                    | SymTag::PointerType
                    | SymTag::ArrayType
                    | SymTag::BaseType
                    | SymTag::Typedef
                    | SymTag::BaseClass
            )
            .then_some(self.symbol.id)
        })
    }

    fn address_offset(&self) -> Option<u32>
    {
        self.symbol.target_offset.or(self.symbol.address_offset)
    }

    fn address_segment(&self) -> Option<u16>
    {
        self.symbol.target_section.or(self.symbol.address_section)
    }

    fn data_kind(&self) -> Option<DataKind>
    {
        self.symbol.data_kind
    }

    fn length(&self) -> Option<u64>
    {
        self.symbol.length
    }

    fn location(&self) -> Option<LocationType>
    {
        self.symbol.location
    }

    fn offset(&self) -> Option<i32>
    {
        self.symbol.offset
    }

    fn register(&self) -> Option<u16>
    {
        self.symbol.register
    }

    fn udt_kind(&self) -> Option<UdtKind>
    {
        self.symbol.udt_kind
    }

    fn value(&self) -> Option<Variant<'_>>
    {
        self.symbol.value
    }

    fn basic_type(&self) -> Option<BasicType>
    {
        self.symbol.basic_type
    }

    fn count(&self) -> Option<u32>
    {
        self.symbol.count
    }

    fn field_count(&self) -> Option<u16>
    {
        Some(u16::try_from(self.children().len()).unwrap_or(u16::MAX))
    }

    fn field_list(&self) -> Option<TypeIndex>
    {
        Some(self.symbol.id)
    }

    fn vshape(&self) -> Option<TypeIndex>
    {
        self.symbol.vshape
    }

    fn call_conv(&self) -> Option<u8>
    {
        self.symbol.call_conv
    }

    fn param_list(&self) -> Option<TypeIndex>
    {
        Some(self.symbol.id)
    }

    fn class(&self) -> Option<TypeIndex>
    {
        let parent = self.symbol.class_parent?;
        // a class reached through a pointer reports the pointee
        match self.store.symbol(parent) {
            Ok(symbol) if symbol.tag == SymTag::PointerType => symbol.type_id,
            _ => Some(parent),
        }
    }

    fn this(&self) -> Option<TypeIndex>
    {
        self.symbol.object_pointer_type
    }

    fn types(&self) -> Option<Vec<TypeIndex>>
    {
        let count = self.symbol.count?;
        match &self.symbol.type_ids {
            Some(ids) => Some(ids.clone()),
            None => Some(self.child_types(count as usize)),
        }
    }

    fn vbase_offset(&self) -> Option<u32>
    {
        if self.symbol.is_virtual {
            self.symbol.virtual_base_offset
        } else {
            None
        }
    }

    fn modifier(&self) -> Option<u16>
    {
        let mut modifier = 0;
        if self.symbol.is_const {
            modifier |= MOD_CONST;
        }
        if self.symbol.is_static {
            modifier |= MOD_STATIC;
        }
        if self.symbol.is_virtual {
            modifier |= MOD_VIRTUAL;
        }
        Some(modifier)
    }
}
