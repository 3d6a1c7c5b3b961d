use crate::value::ResultType;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Internal contract violations. These abort a compile outright and never end up
/// in the per-node diagnostic list.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("cannot cast {0:?} to {1} components")]
    NotCastable(ResultType, usize),

    #[error("cast target must be between 1 and 4 components, got {0}")]
    CastTarget(usize),

    #[error("no shader type name for {0:?}")]
    UnsupportedType(ResultType),

    #[error("unsupported literal value: {0}")]
    UnsupportedValue(String),

    #[error("function body has no recognisable name: {0}")]
    FunctionName(String),

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },
}
