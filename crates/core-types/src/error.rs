use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Please enter at least one ticker symbol")]
    EmptyInput,

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
