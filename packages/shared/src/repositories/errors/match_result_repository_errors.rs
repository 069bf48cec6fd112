#[derive(Debug, PartialEq)]
pub enum MatchResultRepositoryError {
    Storage(String),
}

impl std::fmt::Display for MatchResultRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResultRepositoryError::Storage(msg) => {
                write!(f, "Match result storage error: {}", msg)
            }
        }
    }
}

impl std::error::Error for MatchResultRepositoryError {}
