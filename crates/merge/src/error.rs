use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad key names, empty priority list, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Input is not a sequence of mapping-like records.
    #[error("{}", invalid_input_message(.index, .reason))]
    InvalidInput { index: Option<usize>, reason: String },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl MergeError {
    pub(crate) fn invalid(index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            index,
            reason: reason.into(),
        }
    }
}

fn invalid_input_message(index: &Option<usize>, reason: &str) -> String {
    match index {
        Some(i) => format!("invalid input: record {i}: {reason}"),
        None => format!("invalid input: {reason}"),
    }
}
