///
/// Global Variable Access
///
/// A `GlobalCell` is the only way to touch native memory by name: it can
/// only be built from a symbol the resolver classified as data (or could
/// not classify), and it carries the width of the scalar it reads and
/// writes. Nothing else in the crate dereferences a symbol address.
///

use std::ptr::NonNull;

use tracing::debug;

use crate::config::{BridgeConfig, WordWidth};
use crate::errors::BridgeError;
use crate::symbols::{ResolvedSymbol, Resolver, SymbolKind, SymbolName, SymbolTable};
use crate::value::ScriptValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalCell {
    name: String,
    address: NonNull<u8>,
    width: WordWidth,
}

impl GlobalCell {
    fn from_resolved(symbol: ResolvedSymbol, width: WordWidth) -> Self {
        Self {
            name: symbol.name,
            address: symbol.address,
            width,
        }
    }

    /// Spelling the cell was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> WordWidth {
        self.width
    }

    /// Read the scalar. A 32-bit cell is read as unsigned, a native cell
    /// as a signed word.
    ///
    /// # Safety
    ///
    /// The symbol must still name live, readable memory at least as wide
    /// as the cell.
    pub unsafe fn read(&self) -> i64 {
        let address = self.address.as_ptr();
        match self.width {
            WordWidth::Native => unsafe { (address as *const isize).read_unaligned() as i64 },
            WordWidth::Bits32 => unsafe { (address as *const u32).read_unaligned() as i64 },
        }
    }

    /// Overwrite the scalar with `value` truncated to the cell width.
    ///
    /// # Safety
    ///
    /// The symbol must still name live, writable memory at least as wide
    /// as the cell, and no other thread may be accessing it.
    pub unsafe fn write(&self, value: i64) {
        let address = self.address.as_ptr();
        match self.width {
            WordWidth::Native => unsafe { (address as *mut isize).write_unaligned(value as isize) },
            WordWidth::Bits32 => unsafe { (address as *mut u32).write_unaligned(value as u32) },
        }
    }
}

/// Resolve `name` as a data symbol and wrap it in a cell.
pub fn lookup(table: &dyn SymbolTable, config: &BridgeConfig, name: &str) -> Result<GlobalCell, BridgeError> {
    let name = SymbolName::new(name, config.max_name_len)?;
    let resolved = Resolver::new(table, config).resolve(&name, SymbolKind::Data)?;
    Ok(GlobalCell::from_resolved(resolved, config.variable_width))
}

pub fn get_variable(table: &dyn SymbolTable, config: &BridgeConfig, name: &str) -> Result<i64, BridgeError> {
    let cell = lookup(table, config, name)?;
    let value = unsafe { cell.read() };
    debug!(variable = cell.name(), value, "read global");
    Ok(value)
}

pub fn set_variable(
    table: &dyn SymbolTable,
    config: &BridgeConfig,
    name: &str,
    value: &ScriptValue,
) -> Result<(), BridgeError> {
    let cell = lookup(table, config, name)?;
    let scalar = value.to_scalar();
    unsafe { cell.write(scalar) };
    debug!(variable = cell.name(), value = scalar, "wrote global");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolRegistry;
    use std::sync::atomic::{AtomicI32, AtomicIsize, Ordering};

    static WORD_CELL: AtomicIsize = AtomicIsize::new(17);
    static NARROW_CELL: AtomicI32 = AtomicI32::new(-1);
    static DECORATED_CELL: AtomicIsize = AtomicIsize::new(0);

    fn table() -> SymbolRegistry {
        let mut registry = SymbolRegistry::new();
        registry
            .define_variable("word_cell", WORD_CELL.as_ptr() as *const u8)
            .define_variable("narrow_cell", NARROW_CELL.as_ptr() as *const u8)
            .define_variable("_decorated_cell", DECORATED_CELL.as_ptr() as *const u8);
        registry
    }

    #[test]
    fn test_get_then_set_native() {
        let table = table();
        let config = BridgeConfig::default();

        assert_eq!(get_variable(&table, &config, "word_cell").unwrap(), 17);
        set_variable(&table, &config, "word_cell", &ScriptValue::Int(-99)).unwrap();
        assert_eq!(get_variable(&table, &config, "word_cell").unwrap(), -99);
        assert_eq!(WORD_CELL.load(Ordering::SeqCst), -99);
    }

    #[test]
    fn test_bits32_cell_is_unsigned_and_truncates() {
        let table = table();
        let config = BridgeConfig {
            variable_width: WordWidth::Bits32,
            ..BridgeConfig::default()
        };

        assert_eq!(get_variable(&table, &config, "narrow_cell").unwrap(), 0xffff_ffff);
        set_variable(&table, &config, "narrow_cell", &ScriptValue::Int(0x1_0000_0002)).unwrap();
        assert_eq!(NARROW_CELL.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_decorated_fallback() {
        let table = table();
        let config = BridgeConfig::default();
        set_variable(&table, &config, "decorated_cell", &ScriptValue::Float(321.7)).unwrap();
        assert_eq!(DECORATED_CELL.load(Ordering::SeqCst), 321);

        let cell = lookup(&table, &config, "decorated_cell").unwrap();
        assert_eq!(cell.name(), "_decorated_cell");
    }

    #[test]
    fn test_missing_symbol_touches_nothing() {
        let table = table();
        let config = BridgeConfig::default();
        let err = get_variable(&table, &config, "nope").unwrap_err();
        assert_eq!(err.to_string(), "symbol _nope not found");
        assert!(set_variable(&table, &config, "nope", &ScriptValue::Int(1)).is_err());
    }
}
