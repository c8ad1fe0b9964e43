///
/// # Bridge Configuration
///
/// Tunables for name resolution, argument marshalling and variable access.
/// Every field has a default matching the classic target-shell behaviour, so
/// an empty file (or no file) is a valid configuration.
///
/// ## Example symcall.toml
///
/// ```toml
/// max_name_len = 127
/// max_args = 15
/// decoration = "_"
/// lookup_order = "undecorated-first"
/// number_width = "native"
/// variable_width = "native"
/// line_buffer = 128
/// ```
///
/// `number_width = "bits32"` reproduces the historic truncation of numbers
/// to 32 bits before they are placed in a 64-bit slot. Pointers above 4 GiB
/// do not survive that, so it is only useful on 32-bit targets.
///

use std::path::Path;

use serde::{Deserialize, Serialize};
use symcall_std_io::DEFAULT_LINE_BUFFER;

use crate::errors::ConfigError;
use crate::invoke::MAX_ARGS;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Bytes of a symbol name that take part in lookup.
    pub max_name_len: usize,
    /// Argument slots honoured per call, at most `MAX_ARGS`.
    pub max_args: usize,
    /// Fallback decoration prefix. Empty disables the second lookup.
    pub decoration: String,
    pub lookup_order: LookupOrder,
    /// Width numbers are truncated to when marshalled into a slot.
    pub number_width: WordWidth,
    /// Width of the scalar read and written by getGlobal/setGlobal.
    pub variable_width: WordWidth,
    /// readLine prompt/result buffer size, terminator included.
    pub line_buffer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupOrder {
    #[default]
    UndecoratedFirst,
    DecoratedFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordWidth {
    #[default]
    Native,
    Bits32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_name_len: 127,
            max_args: MAX_ARGS,
            decoration: "_".to_string(),
            lookup_order: LookupOrder::UndecoratedFirst,
            number_width: WordWidth::Native,
            variable_width: WordWidth::Native,
            line_buffer: DEFAULT_LINE_BUFFER,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_name_len == 0 {
            return Err(ConfigError::Invalid(
                "max_name_len must be at least 1".to_string(),
            ));
        }
        if self.max_args > MAX_ARGS {
            return Err(ConfigError::Invalid(format!(
                "max_args must be between 0 and {}, got {}",
                MAX_ARGS, self.max_args
            )));
        }
        if self.decoration.chars().count() > 1 {
            return Err(ConfigError::Invalid(format!(
                "decoration must be a single character, got '{}'",
                self.decoration
            )));
        }
        if self.line_buffer < 2 {
            return Err(ConfigError::Invalid(
                "line_buffer must be at least 2 bytes".to_string(),
            ));
        }
        Ok(())
    }

    pub fn decoration_prefix(&self) -> Option<char> {
        self.decoration.chars().next()
    }
}
