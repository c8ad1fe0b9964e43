///
/// Script Engine Module
///
/// A small Lua-flavoured language whose only job is to sequence calls into
/// the bridge:
///
/// - ast: statements and expressions with byte spans
/// - parser: nom parser producing the AST
/// - engine: evaluator owning a `Bridge`
/// - error: parse and runtime errors
///

pub mod ast;
pub mod engine;
pub mod error;
pub mod parser;

pub use engine::{Builtin, Engine};
pub use error::ScriptError;
pub use parser::{parse_literal, parse_script};
