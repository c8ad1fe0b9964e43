///
/// Symbol Resolution
///
/// Maps a textual name to a native address and its category (code or data)
/// by querying a symbol table at call time. Nothing is cached: the table is
/// the single source of truth and may change between calls.
///
/// Key types:
/// - SymbolTable: anything that can answer "where is this name"
/// - SymbolName: a validated, length-bounded lookup key
/// - Resolver: applies the decoration policy on top of a table
/// - ResolvedSymbol: the address, category and spelling that matched
///
/// Decoration policy: one order for every path. With the default
/// `undecorated-first`, `counter` is looked up before `_counter`; the
/// decorated spelling is only tried when a prefix is configured.
///

mod process;
mod registry;

pub use process::{ProcessSymbols, classify_in_maps};
pub use registry::SymbolRegistry;

use std::fmt;
use std::ptr::NonNull;

use smallvec::SmallVec;
use symcall_std_io::truncate_at_boundary;
use tracing::debug;

use crate::config::{BridgeConfig, LookupOrder};
use crate::errors::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Code,
    Data,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Code => write!(f, "code"),
            SymbolKind::Data => write!(f, "data"),
        }
    }
}

/// What a table knows about one spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    pub address: NonNull<u8>,
    /// `None` when the backend cannot tell code from data.
    pub kind: Option<SymbolKind>,
}

pub trait SymbolTable {
    fn find_by_name(&self, name: &str) -> Option<SymbolEntry>;
}

impl<T: SymbolTable + ?Sized> SymbolTable for Box<T> {
    fn find_by_name(&self, name: &str) -> Option<SymbolEntry> {
        (**self).find_by_name(name)
    }
}

/// Several tables searched in order; the first hit wins.
#[derive(Default)]
pub struct ChainedSymbols {
    tables: Vec<Box<dyn SymbolTable>>,
}

impl ChainedSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, table: impl SymbolTable + 'static) -> Self {
        self.tables.push(Box::new(table));
        self
    }
}

impl SymbolTable for ChainedSymbols {
    fn find_by_name(&self, name: &str) -> Option<SymbolEntry> {
        self.tables.iter().find_map(|t| t.find_by_name(name))
    }
}

/// A lookup key no longer than the configured bound.
///
/// Longer names are cut to `max_len` bytes on a character boundary, and a
/// name containing NUL ends at the first NUL, the same string a C lookup
/// would have seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolName(String);

impl SymbolName {
    pub fn new(raw: &str, max_len: usize) -> Result<Self, BridgeError> {
        let until_nul = raw.split('\0').next().unwrap_or_default();
        let bounded = truncate_at_boundary(until_nul, max_len);
        if bounded.len() < raw.len() {
            debug!(original = raw.len(), kept = bounded.len(), "symbol name truncated");
        }
        if bounded.is_empty() {
            return Err(BridgeError::InvalidName {
                reason: "name is empty".to_string(),
            });
        }
        Ok(SymbolName(bounded.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// The spelling that matched.
    pub name: String,
    pub address: NonNull<u8>,
    pub kind: Option<SymbolKind>,
    pub decorated: bool,
}

pub struct Resolver<'a> {
    table: &'a dyn SymbolTable,
    decoration: Option<char>,
    order: LookupOrder,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a dyn SymbolTable, config: &BridgeConfig) -> Self {
        Self {
            table,
            decoration: config.decoration_prefix(),
            order: config.lookup_order,
        }
    }

    /// Spellings in the order they are tried, tagged with whether they
    /// carry the decoration.
    pub fn spellings(&self, name: &SymbolName) -> SmallVec<[(String, bool); 2]> {
        let plain = (name.as_str().to_string(), false);
        let Some(prefix) = self.decoration else {
            return smallvec::smallvec![plain];
        };
        let decorated = (format!("{}{}", prefix, name), true);
        match self.order {
            LookupOrder::UndecoratedFirst => smallvec::smallvec![plain, decorated],
            LookupOrder::DecoratedFirst => smallvec::smallvec![decorated, plain],
        }
    }

    /// Find `name` as a symbol of category `want`. A spelling whose category
    /// is known and different counts as a miss.
    pub fn resolve(&self, name: &SymbolName, want: SymbolKind) -> Result<ResolvedSymbol, BridgeError> {
        let spellings = self.spellings(name);

        for (spelling, decorated) in &spellings {
            let Some(entry) = self.table.find_by_name(spelling) else {
                debug!(symbol = %spelling, "symbol not in table");
                continue;
            };
            if entry.kind.is_some_and(|kind| kind != want) {
                debug!(symbol = %spelling, want = %want, "symbol has the wrong category, skipping");
                continue;
            }
            debug!(symbol = %spelling, address = ?entry.address, decorated, "symbol resolved");
            return Ok(ResolvedSymbol {
                name: spelling.clone(),
                address: entry.address,
                kind: entry.kind,
                decorated: *decorated,
            });
        }

        let last = spellings.last().map(|(s, _)| s.clone()).unwrap_or_default();
        Err(BridgeError::not_found(last, want))
    }
}
