//! Bounded cache of symbol records keyed by id.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::PdbSymbol;

/// Symbol records recently fetched from the session.
///
/// Navigating a type asks for the same ids over and over (every field of a
/// struct resolves the struct again), so records are kept until `capacity`
/// is reached, then evicted oldest first.
#[derive(Debug)]
pub struct SymbolCache
{
    capacity: usize,
    entries: HashMap<u32, Rc<PdbSymbol>>,
    order: VecDeque<u32>,
}

impl SymbolCache
{
    pub fn new(capacity: usize) -> Self
    {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, id: u32) -> Option<Rc<PdbSymbol>>
    {
        self.entries.get(&id).cloned()
    }

    pub fn insert(&mut self, symbol: Rc<PdbSymbol>)
    {
        let id = symbol.id;
        if self.entries.insert(id, symbol).is_some() {
            return;
        }

        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}
