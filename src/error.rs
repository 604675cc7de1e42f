use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidData(String),
    InvalidConfig(String),
    InvalidShape(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Dimension-mismatch error for a named operand.
    pub(crate) fn shape_mismatch(what: &str, expected: &[usize], actual: &[usize]) -> Self {
        Error::InvalidShape(format!(
            "{what} has shape {actual:?}, expected {expected:?}"
        ))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_names_operand_and_shapes() {
        let err = Error::shape_mismatch("labels", &[4, 3], &[4, 2]);
        let msg = format!("{err}");
        assert!(msg.starts_with("invalid shape: labels"));
        assert!(msg.contains("[4, 2]"));
        assert!(msg.contains("[4, 3]"));
    }
}
