use thiserror::Error;

use crate::graph::DataType;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal compilation errors. The workflow either compiles into a valid graph
/// or compilation stops at the first of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("malformed reference `{reference}`: {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("`{scope}` declares nothing named `{name}`")]
    MissingDeclaration { scope: String, name: String },

    #[error("source `{reference}` is not present in the graph")]
    MissingSource { reference: String },

    #[error("`{function}` depends on itself through `{reference}`")]
    CyclicReference { function: String, reference: String },

    #[error("invalid construct `{node}`: {reason}")]
    ArgumentError { node: String, reason: String },

    #[error("malformed collection constraint `{constraint}`: {reason}")]
    MalformedConstraint { constraint: String, reason: String },

    #[error("unsupported {what} `{value}` at `{node}`")]
    UnsupportedConstruct {
        node: String,
        what: &'static str,
        value: String,
    },

    #[error("data node `{node}` is {found} but {expected} was requested")]
    TypeMismatch {
        node: String,
        expected: DataType,
        found: DataType,
    },

    #[error("node `{node}` already exists")]
    DuplicateNode { node: String },

    #[error("graph integrity violated at `{node}`: {reason}")]
    GraphIntegrity { node: String, reason: String },
}

impl CompileError {
    /// Stable identifier of the error family.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::MalformedReference { .. } => "MALFORMED_REFERENCE",
            CompileError::MissingDeclaration { .. } => "MISSING_DECLARATION",
            CompileError::MissingSource { .. } => "MISSING_SOURCE",
            CompileError::CyclicReference { .. } => "CYCLIC_REFERENCE",
            CompileError::ArgumentError { .. } => "ARGUMENT_ERROR",
            CompileError::MalformedConstraint { .. } => "MALFORMED_CONSTRAINT",
            CompileError::UnsupportedConstruct { .. } => "UNSUPPORTED_CONSTRUCT",
            CompileError::TypeMismatch { .. } => "TYPE_MISMATCH",
            CompileError::DuplicateNode { .. } => "DUPLICATE_NODE",
            CompileError::GraphIntegrity { .. } => "GRAPH_INTEGRITY",
        }
    }

    pub(crate) fn missing(scope: &str, name: &str) -> Self {
        CompileError::MissingDeclaration {
            scope: scope.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn argument(node: &str, reason: impl Into<String>) -> Self {
        CompileError::ArgumentError {
            node: node.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(node: &str, what: &'static str, value: &str) -> Self {
        CompileError::UnsupportedConstruct {
            node: node.to_string(),
            what,
            value: value.to_string(),
        }
    }
}
