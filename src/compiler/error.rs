use thiserror::Error;

/// The one error kind the compiler produces. The first syntax error aborts
/// the whole parse; no partial program is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SyntaxError: {0}")]
pub struct SyntaxError(pub String);

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        SyntaxError(message.into())
    }
}
