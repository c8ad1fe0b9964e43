///
/// Bridge Context and Script Entry Points
///
/// `Bridge` owns everything one embedding needs: the symbol table, the
/// configuration, declared signatures and the line reader. It is passed
/// explicitly to whoever drives it; there is no process-wide instance.
///
/// Two layers:
/// - typed operations (`invoke`, `get_variable`, `set_variable`,
///   `read_line`) returning `Result`
/// - script entry points (`dispatch`) taking the raw argument list a script
///   supplied, reporting failures as a `warn!` diagnostic and "no value"
///
/// Entry points and their script names:
///
/// | entry      | name        | legacy alias  |
/// |------------|-------------|---------------|
/// | Call       | `call`      | `vxDo`        |
/// | GetGlobal  | `getGlobal` | `vxGet`       |
/// | SetGlobal  | `setGlobal` | `vxSet`       |
/// | ReadLine   | `readLine`  | `vxReadLine`  |
///

use symcall_std_io::{LineReader, StdinLineReader, read_line_bounded};
use tracing::warn;

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::invoke::{self, Signature, Signatures};
use crate::symbols::SymbolTable;
use crate::value::ScriptValue;
use crate::variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Call,
    GetGlobal,
    SetGlobal,
    ReadLine,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 4] = [
        EntryPoint::Call,
        EntryPoint::GetGlobal,
        EntryPoint::SetGlobal,
        EntryPoint::ReadLine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::Call => "call",
            EntryPoint::GetGlobal => "getGlobal",
            EntryPoint::SetGlobal => "setGlobal",
            EntryPoint::ReadLine => "readLine",
        }
    }

    pub fn legacy_name(self) -> &'static str {
        match self {
            EntryPoint::Call => "vxDo",
            EntryPoint::GetGlobal => "vxGet",
            EntryPoint::SetGlobal => "vxSet",
            EntryPoint::ReadLine => "vxReadLine",
        }
    }
}

pub struct Bridge {
    symbols: Box<dyn SymbolTable>,
    config: BridgeConfig,
    signatures: Signatures,
    reader: Box<dyn LineReader>,
}

impl Bridge {
    pub fn new(symbols: impl SymbolTable + 'static, config: BridgeConfig) -> Self {
        Self {
            symbols: Box::new(symbols),
            config,
            signatures: Signatures::new(),
            reader: Box::new(StdinLineReader),
        }
    }

    pub fn with_reader(mut self, reader: impl LineReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn symbols(&self) -> &dyn SymbolTable {
        self.symbols.as_ref()
    }

    /// Declare the shape of `name`; later calls to it are checked.
    pub fn declare(&mut self, name: &str, signature: Signature) -> Result<&mut Self, BridgeError> {
        self.signatures.declare(name, signature)?;
        Ok(self)
    }

    pub fn invoke(&self, name: &str, args: &[ScriptValue]) -> Result<i64, BridgeError> {
        invoke::invoke(self.symbols.as_ref(), &self.config, &self.signatures, name, args)
    }

    pub fn get_variable(&self, name: &str) -> Result<i64, BridgeError> {
        variable::get_variable(self.symbols.as_ref(), &self.config, name)
    }

    pub fn set_variable(&self, name: &str, value: &ScriptValue) -> Result<(), BridgeError> {
        variable::set_variable(self.symbols.as_ref(), &self.config, name, value)
    }

    pub fn read_line(&mut self, prompt: &str) -> Result<String, BridgeError> {
        Ok(read_line_bounded(self.reader.as_mut(), prompt, self.config.line_buffer)?)
    }

    /// Run an entry point on a script-supplied argument list. `None` is
    /// "no value": either the entry point returns nothing (`setGlobal`) or
    /// it failed, in which case a diagnostic has been logged.
    pub fn dispatch(&mut self, entry: EntryPoint, args: &[ScriptValue]) -> Option<ScriptValue> {
        match self.try_dispatch(entry, args) {
            Ok(value) => value,
            Err(err) => {
                warn!(entry = entry.name(), "Error: {}", err);
                None
            }
        }
    }

    pub fn try_dispatch(
        &mut self,
        entry: EntryPoint,
        args: &[ScriptValue],
    ) -> Result<Option<ScriptValue>, BridgeError> {
        match entry {
            EntryPoint::Call => {
                let (name, rest) = split_name(args, "function name")?;
                self.invoke(&name, rest).map(|r| Some(ScriptValue::Int(r)))
            }
            EntryPoint::GetGlobal => {
                let (name, _) = split_name(args, "variable name")?;
                self.get_variable(&name).map(|v| Some(ScriptValue::Int(v)))
            }
            EntryPoint::SetGlobal => {
                let (name, rest) = split_name(args, "variable name")?;
                let value = rest.first().ok_or(BridgeError::MissingArgument { what: "value" })?;
                self.set_variable(&name, value).map(|()| None)
            }
            EntryPoint::ReadLine => {
                let (prompt, _) = split_name(args, "prompt")?;
                self.read_line(&prompt).map(|line| Some(ScriptValue::Str(line)))
            }
        }
    }
}

/// First argument as text, plus everything after it.
fn split_name<'a>(
    args: &'a [ScriptValue],
    what: &'static str,
) -> Result<(String, &'a [ScriptValue]), BridgeError> {
    let (first, rest) = args
        .split_first()
        .ok_or(BridgeError::MissingArgument { what })?;
    let text = first.as_text().ok_or(BridgeError::MissingArgument { what })?;
    Ok((text, rest))
}
