//! Error taxonomy for the board fix-up.
//! I/O, JSON parse, structure and configuration failures are kept apart so the
//! driver can report which stage failed. None of them are recovered from.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FixError {
    /// File missing, unreadable or unwritable
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input text is not valid JSON
    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed JSON does not have the board-file shape
    #[error("unexpected structure at {path}: {message}")]
    Structure { path: String, message: String },

    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FixError {
    pub fn structure(path: impl Into<String>, message: impl Into<String>) -> Self {
        FixError::Structure {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_error_names_path() {
        let err = FixError::structure("[0].board[2]", "expected an object");
        assert_eq!(
            err.to_string(),
            "unexpected structure at [0].board[2]: expected an object"
        );
    }

    #[test]
    fn test_io_error_names_file() {
        let err = FixError::Io {
            path: PathBuf::from("board-2.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("I/O error on board-2.json"));
    }
}
