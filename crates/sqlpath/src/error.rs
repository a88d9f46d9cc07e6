//! Error types for sqlpath

use std::fmt;

use thiserror::Error;

/// The result type for sqlpath operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which structural precondition an edit violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralReason {
    /// The handle is the document root and has no parent slot to write into
    RootNode,
    /// The handle does not occupy a list-valued field, so it cannot be removed
    /// or have siblings inserted next to it
    NotInList,
    /// The handle was removed, or sits below a replaced or removed ancestor
    Detached,
    /// The parent's kind has no child field with the handle's field name
    UnknownField,
}

impl fmt::Display for StructuralReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StructuralReason::RootNode => "the root node has no parent",
            StructuralReason::NotInList => "the node is not positioned in a list field",
            StructuralReason::Detached => "the node is no longer attached to the tree",
            StructuralReason::UnknownField => "the parent has no such child field",
        };
        f.write_str(text)
    }
}

/// Errors that can occur while editing or rendering a syntax tree
#[derive(Debug, Error)]
pub enum Error {
    /// An edit violated a structural precondition
    #[error("Structural error at {path}: {reason}")]
    Structural {
        reason: StructuralReason,
        path: String,
    },

    /// Error during SQL generation
    #[error("Generation error: {0}")]
    Generate(String),

    /// Invalid serializer configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A supplied tree is not well-formed (dangling handles, missing root)
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// JSON interchange failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a structural error for the node at `path`
    pub fn structural(reason: StructuralReason, path: impl Into<String>) -> Self {
        Error::Structural {
            reason,
            path: path.into(),
        }
    }

    /// Create a generation error
    pub fn generate(message: impl Into<String>) -> Self {
        Error::Generate(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create an invalid tree error
    pub fn invalid_tree(message: impl Into<String>) -> Self {
        Error::InvalidTree(message.into())
    }

    /// The structural reason, if this is a structural error
    pub fn structural_reason(&self) -> Option<StructuralReason> {
        match self {
            Error::Structural { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_message_names_path() {
        let err = Error::structural(StructuralReason::NotInList, "where_clause.condition");
        assert_eq!(
            err.to_string(),
            "Structural error at where_clause.condition: the node is not positioned in a list field"
        );
        assert_eq!(err.structural_reason(), Some(StructuralReason::NotInList));
    }

    #[test]
    fn test_non_structural_has_no_reason() {
        assert_eq!(Error::generate("boom").structural_reason(), None);
    }
}
