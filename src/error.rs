//! Error types for generation time (bad declarations, unreadable input) and
//! for the call-time conditions the generated glue raises.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("failed to load {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },
}

/// A declaration model the generator refuses to synthesize from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("'{function}': required argument '{argument}' follows an optional argument")]
    RequiredAfterOptional { function: String, argument: String },

    #[error("module '{module}' declares {count} classes, at most one is supported")]
    MultipleClasses { module: String, count: usize },

    #[error("duplicate name '{name}' in {scope}")]
    DuplicateName { scope: String, name: String },

    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier { name: String },

    #[error("'{function}': argument '{argument}' cannot have type void")]
    VoidArgument { function: String, argument: String },

    #[error("property '{property}' cannot have type void")]
    VoidProperty { property: String },
}

/// Raised by a call body at call time. Mirrors the exceptions the emitted
/// glue throws into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("Failed to execute '{name}' : {required} argument required, but {actual} present.")]
    Arity { name: String, required: usize, actual: usize },

    #[error("argument '{argument}' could not be converted to {target}")]
    Conversion { argument: String, target: String },
}
