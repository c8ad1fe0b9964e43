///
/// Dynamic Invocation
///
/// Turns a script-side argument list into a fixed vector of native words and
/// calls a resolved code address with it.
///
/// Pipeline:
/// 1. Check the values against a registered `Signature`, if any, including
///    that they fit the configured slot count
/// 2. Clip the argument list to the configured slot count (extras dropped)
/// 3. Marshal each value into a word (see `marshal_value`)
/// 4. Resolve the name as a code symbol
/// 5. Call the address with all `MAX_ARGS` slots through `invoke_raw`
///
/// The call in step 5 treats every callee as taking exactly `MAX_ARGS`
/// word-sized integer arguments. Under the C calling conventions this
/// targets (caller cleans the stack, integer arguments in registers first)
/// a callee taking fewer words simply ignores the rest. A callee taking
/// floats, structs or more than `MAX_ARGS` words is not supported and the
/// call is undefined behaviour; nothing here can detect that.
///

use std::collections::HashMap;
use std::ffi::CString;

use tracing::debug;

use crate::config::{BridgeConfig, WordWidth};
use crate::errors::BridgeError;
use crate::symbols::{Resolver, SymbolKind, SymbolName, SymbolTable};
use crate::value::{ScriptValue, Word};

/// Slots passed to every native call.
pub const MAX_ARGS: usize = 15;

/// Every callee is called through this type.
pub type UniformFn = unsafe extern "C" fn(
    Word, Word, Word, Word, Word, Word, Word, Word,
    Word, Word, Word, Word, Word, Word, Word,
) -> Word;

/// Native words for one call, plus the string storage they point into.
///
/// Strings are copied into `CString`s owned by the vector. Their heap
/// buffers do not move when `strings` grows, so the addresses placed in
/// `slots` stay valid until the vector is dropped.
#[derive(Debug)]
pub struct ArgumentVector {
    slots: [Word; MAX_ARGS],
    len: usize,
    strings: Vec<CString>,
}

impl ArgumentVector {
    pub fn slots(&self) -> &[Word; MAX_ARGS] {
        &self.slots
    }

    /// Slots filled from script arguments; the rest are zero.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Narrow an integer to the configured number width, then widen it back to
/// a full word with sign extension.
pub fn truncate_number(value: i64, width: WordWidth) -> Word {
    match width {
        WordWidth::Native => value as isize as Word,
        WordWidth::Bits32 => value as i32 as isize as Word,
    }
}

/// Marshal one script value. Strings are pushed into `strings` and the
/// slot receives the address of their first byte.
pub fn marshal_value(value: &ScriptValue, width: WordWidth, strings: &mut Vec<CString>) -> Word {
    match value {
        ScriptValue::Nil => 0,
        ScriptValue::Bool(b) => *b as Word,
        ScriptValue::Int(n) => truncate_number(*n, width),
        ScriptValue::Float(f) => truncate_number(*f as i64, width),
        ScriptValue::Str(s) => {
            // Native code sees the string up to its first NUL.
            let until_nul = s.split('\0').next().unwrap_or_default();
            let c_string = CString::new(until_nul).unwrap_or_default();
            let address = c_string.as_ptr() as Word;
            strings.push(c_string);
            address
        }
        ScriptValue::Table(_) | ScriptValue::Function(_) | ScriptValue::Handle(_) => {
            debug!(kind = value.type_name(), "unsupported argument type, passing 0");
            0
        }
    }
}

/// Build the argument vector for `args`, honouring at most `limit` slots.
pub fn marshal_args(args: &[ScriptValue], limit: usize, width: WordWidth) -> ArgumentVector {
    let limit = limit.min(MAX_ARGS);
    if args.len() > limit {
        debug!(supplied = args.len(), kept = limit, "too many arguments, extra ones ignored");
    }

    let mut vector = ArgumentVector {
        slots: [0; MAX_ARGS],
        len: 0,
        strings: Vec::new(),
    };
    for (slot, value) in args.iter().take(limit).enumerate() {
        vector.slots[slot] = marshal_value(value, width, &mut vector.strings);
        debug!(slot, kind = value.type_name(), word = vector.slots[slot], "argument");
        vector.len = slot + 1;
    }
    vector
}

/// Call `address` as a `UniformFn` with all slots.
///
/// # Safety
///
/// `address` must be the entry point of a function using the C calling
/// convention whose parameters are all integer or pointer sized and number
/// at most `MAX_ARGS`, and whose return value fits in a register. Any
/// pointer among the arguments must be valid for what the callee does
/// with it.
pub unsafe fn invoke_raw(address: *const u8, slots: &[Word; MAX_ARGS]) -> Word {
    let function: UniformFn = unsafe { std::mem::transmute::<*const u8, UniformFn>(address) };
    let s = slots;
    unsafe {
        function(
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
            s[8], s[9], s[10], s[11], s[12], s[13], s[14],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Integer; accepts numbers, booleans and nil.
    Int,
    Bool,
    /// `const char *`; accepts strings and nil (NULL).
    Str,
    /// Any address; accepts numbers, strings and nil.
    Pointer,
    /// Anything, unchecked.
    Any,
}

impl ParamKind {
    fn accepts(self, value: &ScriptValue) -> bool {
        use ScriptValue as V;
        match self {
            ParamKind::Any => true,
            ParamKind::Int => matches!(value, V::Nil | V::Bool(_) | V::Int(_) | V::Float(_)),
            ParamKind::Bool => matches!(value, V::Nil | V::Bool(_)),
            ParamKind::Str => matches!(value, V::Nil | V::Str(_)),
            ParamKind::Pointer => matches!(value, V::Nil | V::Int(_) | V::Float(_) | V::Str(_)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnKind {
    /// Full word, reported as a signed integer.
    #[default]
    Word,
    /// 32-bit C `int`; the upper half of the register is ignored.
    Int32,
    /// No meaningful result; always 0.
    Void,
}

impl ReturnKind {
    pub fn interpret(self, raw: Word) -> i64 {
        match self {
            ReturnKind::Word => raw as isize as i64,
            ReturnKind::Int32 => raw as u32 as i32 as i64,
            ReturnKind::Void => 0,
        }
    }
}

/// Declared shape of one native function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamKind>,
    pub returns: ReturnKind,
}

impl Signature {
    pub fn new(params: impl Into<Vec<ParamKind>>, returns: ReturnKind) -> Self {
        Self {
            params: params.into(),
            returns,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Fewer arguments than parameters is fine (missing ones are zero);
    /// more, or a value a parameter cannot take, is a mismatch.
    pub fn check(&self, name: &str, args: &[ScriptValue]) -> Result<(), BridgeError> {
        if args.len() > self.arity() {
            return Err(BridgeError::SignatureMismatch {
                name: name.to_string(),
                reason: format!("expects at most {} arguments, got {}", self.arity(), args.len()),
            });
        }
        for (index, (value, kind)) in args.iter().zip(&self.params).enumerate() {
            if !kind.accepts(value) {
                return Err(BridgeError::SignatureMismatch {
                    name: name.to_string(),
                    reason: format!(
                        "argument {} is a {}, expected {:?}",
                        index + 1,
                        value.type_name(),
                        kind
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Per-name signatures, keyed by the undecorated script-side name.
#[derive(Debug, Default, Clone)]
pub struct Signatures {
    by_name: HashMap<String, Signature>,
}

impl Signatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signature wider than the slot vector can never be honoured.
    pub fn declare(&mut self, name: &str, signature: Signature) -> Result<&mut Self, BridgeError> {
        if signature.arity() > MAX_ARGS {
            return Err(BridgeError::SignatureMismatch {
                name: name.to_string(),
                reason: format!("declares {} parameters, at most {} are supported", signature.arity(), MAX_ARGS),
            });
        }
        self.by_name.insert(name.to_string(), signature);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.by_name.get(name)
    }
}

/// Resolve `name` as code and call it with `args`.
///
/// The argument storage lives until the native call returns and is
/// released before this function does.
pub fn invoke(
    table: &dyn SymbolTable,
    config: &BridgeConfig,
    signatures: &Signatures,
    name: &str,
    args: &[ScriptValue],
) -> Result<i64, BridgeError> {
    let name = SymbolName::new(name, config.max_name_len)?;
    let signature = signatures.get(name.as_str());

    if let Some(signature) = signature {
        signature.check(name.as_str(), args)?;
        let slots = config.max_args.min(MAX_ARGS);
        if args.len() > slots {
            return Err(BridgeError::SignatureMismatch {
                name: name.to_string(),
                reason: format!("{} arguments do not fit in {} argument slots", args.len(), slots),
            });
        }
    }

    let arguments = marshal_args(args, config.max_args, config.number_width);
    let resolved = Resolver::new(table, config).resolve(&name, SymbolKind::Code)?;

    debug!(function = %resolved.name, args = arguments.len(), "invoking");
    let raw = unsafe { invoke_raw(resolved.address.as_ptr(), arguments.slots()) };
    drop(arguments);

    let returns = signature.map(|s| s.returns).unwrap_or_default();
    Ok(returns.interpret(raw))
}
