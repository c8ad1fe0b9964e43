///
/// symcall - Native Call Bridge
///
/// Lets a script call native functions and read or write native globals by
/// their symbol-table name. It includes:
///
/// - symbols: symbol tables and name resolution with decoration fallback
/// - invoke: argument marshalling and the uniform 15-slot invocation
/// - variable: typed access to global scalars
/// - bridge: the context object and the script entry points
/// - script: a small script engine driving the entry points
/// - diagnostic: source-snippet rendering of script errors
///
/// Entry points:
/// - `Bridge::dispatch`: run `call`, `getGlobal`, `setGlobal` or `readLine`
///   on a script-supplied argument list
/// - `Engine::start`: register the entry points and run scripts
///

pub mod bridge;
pub mod config;
pub mod diagnostic;
pub mod errors;
pub mod invoke;
pub mod script;
pub mod symbols;
pub mod value;
pub mod variable;

pub use bridge::{Bridge, EntryPoint};
pub use config::{BridgeConfig, LookupOrder, WordWidth};
pub use diagnostic::DiagnosticReporter;
pub use errors::{BridgeError, ConfigError};
pub use invoke::{MAX_ARGS, ParamKind, ReturnKind, Signature};
pub use script::{Engine, ScriptError};
pub use symbols::{ChainedSymbols, ProcessSymbols, SymbolKind, SymbolRegistry, SymbolTable};
pub use value::ScriptValue;
pub use variable::GlobalCell;
