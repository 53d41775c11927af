//! Error types for fastener-core

use thiserror::Error;

/// Errors raised while building a standard equivalence table.
///
/// Classification and ranking never fail on user data; only loading
/// additional equivalence groups can.
#[derive(Error, Debug)]
pub enum TableError {
    /// A group lists a code that does not normalize
    #[error("invalid standard code '{code}' in group '{group}'")]
    InvalidCode { group: String, code: String },

    /// A group has fewer than one code
    #[error("equivalence group '{0}' has no codes")]
    EmptyGroup(String),

    /// Equivalence table document failed to parse
    #[error("failed to parse equivalence table: {0}")]
    Parse(#[from] toml::de::Error),
}

impl TableError {
    /// Create an InvalidCode error.
    pub fn invalid_code(group: impl Into<String>, code: impl Into<String>) -> Self {
        Self::InvalidCode {
            group: group.into(),
            code: code.into(),
        }
    }
}

/// Result type for fastener-core table operations
pub type Result<T> = std::result::Result<T, TableError>;
