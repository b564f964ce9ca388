use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("missing required connection parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to connect to {store} database: {message}")]
    Connection { store: String, message: String },

    #[error("query failed: {0}")]
    Query(String),

    #[error("sequence region not found: {0}")]
    UnknownSeqRegion(String),

    #[error("invalid strand {strand} for transcript {stable_id}")]
    InvalidStrand { stable_id: String, strand: i64 },

    #[error("transcript {0} has no strand and --unstranded=error was requested")]
    Unstranded(String),

    #[error("sequence request failed: {0}")]
    RestHttp(String),

    #[error("sequence service returned status {status}: {message}")]
    RestStatus { status: u16, message: String },

    #[error("non-nucleotide character {found:?} in sequence for {stable_id}")]
    InvalidSequence { stable_id: String, found: char },

    #[error("output error: {0}")]
    Output(String),
}

impl From<sqlx::Error> for ExportError {
    fn from(err: sqlx::Error) -> Self {
        ExportError::Query(err.to_string())
    }
}

impl ExportError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExportError::MissingParameter(_)
                | ExportError::InvalidConfig(_)
                | ExportError::ConfigRead(_)
                | ExportError::ConfigParse(_)
        )
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            err if err.is_configuration() => 2,
            ExportError::Connection { .. }
            | ExportError::RestHttp(_)
            | ExportError::RestStatus { .. } => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_class() {
        assert_eq!(ExportError::MissingParameter("host").exit_code(), 2);
        assert_eq!(ExportError::InvalidConfig("x".to_string()).exit_code(), 2);
        assert_eq!(ExportError::ConfigRead(Utf8PathBuf::from("a.json")).exit_code(), 2);
        assert_eq!(ExportError::ConfigParse("x".to_string()).exit_code(), 2);

        let connection = ExportError::Connection {
            store: "core".to_string(),
            message: "refused".to_string(),
        };
        assert_eq!(connection.exit_code(), 3);
        assert_eq!(ExportError::RestHttp("timeout".to_string()).exit_code(), 3);
        let status = ExportError::RestStatus {
            status: 400,
            message: "bad region".to_string(),
        };
        assert_eq!(status.exit_code(), 3);

        assert_eq!(ExportError::Query("x".to_string()).exit_code(), 1);
        assert_eq!(ExportError::Unstranded("ENST1.1".to_string()).exit_code(), 1);
        assert_eq!(ExportError::Output("broken pipe".to_string()).exit_code(), 1);
        let invalid = ExportError::InvalidSequence {
            stable_id: "ENST1.1".to_string(),
            found: 'é',
        };
        assert_eq!(invalid.exit_code(), 1);
    }
}
