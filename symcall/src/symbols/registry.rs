///
/// In-memory symbol table.
///
/// The host registers the functions and globals it wants scripts to reach,
/// each tagged as code or data, much like a JIT registers runtime symbols
/// before linking. Useful on targets without a queryable dynamic symbol
/// table and for tests.
///

use std::ptr::NonNull;

use indexmap::IndexMap;

use super::{SymbolEntry, SymbolKind, SymbolTable};

#[derive(Debug, Default, Clone)]
pub struct SymbolRegistry {
    symbols: IndexMap<String, SymbolEntry>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` at `address`. A null address is ignored and an
    /// existing entry with the same name is replaced.
    pub fn define(&mut self, name: &str, address: *const u8, kind: SymbolKind) -> &mut Self {
        if let Some(address) = NonNull::new(address as *mut u8) {
            self.symbols.insert(
                name.to_string(),
                SymbolEntry {
                    address,
                    kind: Some(kind),
                },
            );
        }
        self
    }

    pub fn define_function(&mut self, name: &str, address: *const u8) -> &mut Self {
        self.define(name, address, SymbolKind::Code)
    }

    pub fn define_variable(&mut self, name: &str, address: *const u8) -> &mut Self {
        self.define(name, address, SymbolKind::Data)
    }

    pub fn remove(&mut self, name: &str) -> Option<SymbolEntry> {
        self.symbols.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Registered names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }
}

impl SymbolTable for SymbolRegistry {
    fn find_by_name(&self, name: &str) -> Option<SymbolEntry> {
        self.symbols.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static A: u32 = 1;
    static B: u32 = 2;

    #[test]
    fn test_define_and_find() {
        let mut registry = SymbolRegistry::new();
        registry
            .define_variable("a", &A as *const u32 as *const u8)
            .define_variable("b", &B as *const u32 as *const u8);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["a", "b"]);

        let entry = registry.find_by_name("a").unwrap();
        assert_eq!(entry.kind, Some(SymbolKind::Data));
        assert_eq!(entry.address.as_ptr() as *const u32, &A as *const u32);
    }

    #[test]
    fn test_null_address_ignored() {
        let mut registry = SymbolRegistry::new();
        registry.define_function("null_fn", std::ptr::null());
        assert!(registry.is_empty());
        assert!(registry.find_by_name("null_fn").is_none());
    }

    #[test]
    fn test_redefine_and_remove() {
        let mut registry = SymbolRegistry::new();
        registry.define_variable("x", &A as *const u32 as *const u8);
        registry.define_variable("x", &B as *const u32 as *const u8);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find_by_name("x").unwrap().address.as_ptr() as *const u32,
            &B as *const u32
        );

        assert!(registry.remove("x").is_some());
        assert!(registry.find_by_name("x").is_none());
    }
}
