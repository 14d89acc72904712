//! Reader configuration.
//!
//! Options can be built in code or loaded from YAML:
//!
//! ```rust
//! use ulog_reader::ReaderOptions;
//!
//! let options = ReaderOptions::from_yaml_str("max_recorded_errors: 64\n").unwrap();
//! assert_eq!(options.max_recorded_errors, 64);
//! assert!(!options.include_private_formats);
//! ```

use serde::{Deserialize, Serialize};

use crate::Result;

/// Default cap on the recorded decode error log.
pub const DEFAULT_MAX_RECORDED_ERRORS: usize = 10_000;

/// Tunables for [`UlogReader`](crate::UlogReader).
///
/// Defaults match the plain reader behaviour: private (`_`-prefixed) formats
/// stay out of the field catalog and the error log keeps its first 10 000 entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderOptions {
    /// Errors past this count are dropped from the log and only counted
    pub max_recorded_errors: usize,
    /// Catalog `_`-prefixed formats as well
    pub include_private_formats: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { max_recorded_errors: DEFAULT_MAX_RECORDED_ERRORS, include_private_formats: false }
    }
}

impl ReaderOptions {
    /// Parse options from a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    pub fn with_max_recorded_errors(mut self, max: usize) -> Self {
        self.max_recorded_errors = max;
        self
    }

    pub fn with_private_formats(mut self, include: bool) -> Self {
        self.include_private_formats = include;
        self
    }
}
