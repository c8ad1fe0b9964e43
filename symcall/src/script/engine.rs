//!
//! Script Engine
//!
//! Tree-walking evaluator for parsed scripts. The engine owns the `Bridge`
//! it drives, so starting an engine registers the entry points against one
//! explicit context and stopping it hands that context back.
//!
//! Lifecycle:
//!   let engine = Engine::start(bridge);
//!   engine.run_file(path)?;
//!   let bridge = engine.stop();
//!

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::bridge::{Bridge, EntryPoint};
use crate::value::ScriptValue;

use super::ast::{Call, Expr, Span, Stmt};
use super::error::ScriptError;
use super::parser::parse_script;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Entry(EntryPoint),
}

pub struct Engine {
    bridge: Bridge,
    globals: HashMap<String, ScriptValue>,
    builtins: IndexMap<String, Builtin>,
    out: Box<dyn Write>,
}

impl Engine {
    /// Create an engine around `bridge` and register the builtins under
    /// their script names and legacy aliases.
    pub fn start(bridge: Bridge) -> Self {
        let mut builtins = IndexMap::new();
        builtins.insert("print".to_string(), Builtin::Print);
        for entry in EntryPoint::ALL {
            builtins.insert(entry.name().to_string(), Builtin::Entry(entry));
        }
        for entry in EntryPoint::ALL {
            builtins.insert(entry.legacy_name().to_string(), Builtin::Entry(entry));
        }
        debug!(builtins = builtins.len(), "script engine started");

        Self {
            bridge,
            globals: HashMap::new(),
            builtins,
            out: Box::new(io::stdout()),
        }
    }

    /// Send `print` output somewhere other than stdout.
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Release the engine, returning the bridge it drove.
    pub fn stop(mut self) -> Bridge {
        let _ = self.out.flush();
        debug!("script engine stopped");
        self.bridge
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    pub fn builtin_names(&self) -> impl Iterator<Item = &str> {
        self.builtins.keys().map(String::as_str)
    }

    pub fn get_var(&self, name: &str) -> ScriptValue {
        self.globals.get(name).cloned().unwrap_or(ScriptValue::Nil)
    }

    /// Assigning nil removes the variable.
    pub fn set_var(&mut self, name: &str, value: ScriptValue) {
        if value.is_nil() {
            self.globals.remove(name);
        } else {
            self.globals.insert(name.to_string(), value);
        }
    }

    pub fn run_file(&mut self, path: &Path) -> Result<(), ScriptError> {
        let src = std::fs::read_to_string(path).map_err(|e| ScriptError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.run_str(&path.display().to_string(), &src)
    }

    /// Parse and run `src`. `name` only labels log output.
    pub fn run_str(&mut self, name: &str, src: &str) -> Result<(), ScriptError> {
        let statements = parse_script(src)?;
        debug!(script = name, statements = statements.len(), "running script");

        for stmt in &statements {
            self.exec(stmt)?;
        }
        self.out
            .flush()
            .map_err(|e| ScriptError::runtime(format!("cannot write output: {}", e), Span::default()))
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        match stmt {
            Stmt::Assign { name, value, .. } => {
                let value = self.eval(value)?;
                self.set_var(name, value);
            }
            Stmt::Call(call) => {
                self.call(call)?;
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<ScriptValue, ScriptError> {
        Ok(match expr {
            Expr::Nil => ScriptValue::Nil,
            Expr::Bool(b) => ScriptValue::Bool(*b),
            Expr::Int(n) => ScriptValue::Int(*n),
            Expr::Float(f) => ScriptValue::Float(*f),
            Expr::Str(s) => ScriptValue::Str(s.clone()),
            Expr::Table(items) => ScriptValue::Table(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Var { name, .. } => match self.globals.get(name) {
                Some(value) => value.clone(),
                None if self.builtins.contains_key(name) => ScriptValue::Function(name.clone()),
                None => ScriptValue::Nil,
            },
            Expr::Call(call) => self.call(call)?.unwrap_or(ScriptValue::Nil),
            Expr::Concat { left, right, span } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ScriptValue::Str(format!("{}{}", concat_operand(&left, *span)?, concat_operand(&right, *span)?))
            }
        })
    }

    /// A variable holding a function reference is called through; otherwise
    /// the callee names a builtin directly.
    fn lookup_builtin(&self, call: &Call) -> Result<Builtin, ScriptError> {
        let name = match self.globals.get(&call.callee) {
            Some(ScriptValue::Function(target)) => target,
            Some(other) => {
                return Err(ScriptError::runtime(
                    format!("attempt to call a {} value ('{}')", other.type_name(), call.callee),
                    call.span,
                ));
            }
            None => &call.callee,
        };
        self.builtins.get(name).copied().ok_or_else(|| {
            ScriptError::runtime(format!("attempt to call unknown function '{}'", name), call.span)
        })
    }

    fn call(&mut self, call: &Call) -> Result<Option<ScriptValue>, ScriptError> {
        let builtin = self.lookup_builtin(call)?;
        let args = call
            .args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match builtin {
            Builtin::Print => {
                let line = args.iter().map(ToString::to_string).collect::<Vec<_>>().join("\t");
                writeln!(self.out, "{}", line)
                    .map_err(|e| ScriptError::runtime(format!("cannot write output: {}", e), call.span))?;
                Ok(None)
            }
            Builtin::Entry(entry) => Ok(self.bridge.dispatch(entry, &args)),
        }
    }
}

fn concat_operand(value: &ScriptValue, span: Span) -> Result<String, ScriptError> {
    match value {
        ScriptValue::Str(_) | ScriptValue::Int(_) | ScriptValue::Float(_) => Ok(value.to_string()),
        other => Err(ScriptError::runtime(
            format!("attempt to concatenate a {} value", other.type_name()),
            span,
        )),
    }
}
