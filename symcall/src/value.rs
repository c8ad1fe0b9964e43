//!
//! Script Value Representation
//!
//! Every value crossing from a script into the bridge is a `ScriptValue`.
//! Only scalars have a native meaning:
//!
//! - `Nil` -> zero word
//! - `Bool` -> 0 or 1
//! - `Int` / `Float` -> number truncated to a word
//! - `Str` -> address of a NUL-terminated copy, valid for one call
//!
//! `Table`, `Function` and `Handle` have no scalar form and degrade to the
//! zero word when marshalled.
//!

use std::fmt;

/// One native machine word.
pub type Word = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Table(Vec<ScriptValue>),
    /// Reference to a builtin by name.
    Function(String),
    /// Opaque host value.
    Handle(usize),
}

impl ScriptValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Int(_) | ScriptValue::Float(_) => "number",
            ScriptValue::Str(_) => "string",
            ScriptValue::Table(_) => "table",
            ScriptValue::Function(_) => "function",
            ScriptValue::Handle(_) => "userdata",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Integer view of a number. Floats truncate toward zero; numeric
    /// strings are converted the way a script `tonumber` would.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ScriptValue::Int(n) => Some(*n),
            ScriptValue::Float(f) => Some(*f as i64),
            ScriptValue::Str(s) => parse_number(s.trim()).and_then(|v| v.as_integer()),
            _ => None,
        }
    }

    /// String view used for names and prompts. Numbers convert, as they do
    /// when a script passes `42` where a string is expected.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ScriptValue::Str(s) => Some(s.clone()),
            ScriptValue::Int(_) | ScriptValue::Float(_) => Some(self.to_string()),
            _ => None,
        }
    }

    /// Word stored for a numeric value when it must be written somewhere
    /// that has no notion of strings (a global variable cell).
    pub fn to_scalar(&self) -> i64 {
        match self {
            ScriptValue::Bool(b) => *b as i64,
            other => other.as_integer().unwrap_or(0),
        }
    }
}

/// Parse a script number literal: decimal or `0x` hex integers, floats.
pub fn parse_number(text: &str) -> Option<ScriptValue> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let magnitude = u64::from_str_radix(hex, 16).ok()? as i64;
        return Some(ScriptValue::Int(if negative { magnitude.wrapping_neg() } else { magnitude }));
    }

    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(ScriptValue::Int(n));
    }
    text.parse::<f64>().ok().map(ScriptValue::Float)
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "nil"),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Int(n) => write!(f, "{}", n),
            ScriptValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            ScriptValue::Float(x) => write!(f, "{}", x),
            ScriptValue::Str(s) => write!(f, "{}", s),
            ScriptValue::Table(items) => write!(f, "table[{}]", items.len()),
            ScriptValue::Function(name) => write!(f, "function: {}", name),
            ScriptValue::Handle(h) => write!(f, "userdata: {:#x}", h),
        }
    }
}
