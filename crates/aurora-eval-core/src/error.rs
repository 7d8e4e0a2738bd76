use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Failed to parse {source_name}: {message}")]
    ConfigParse { source_name: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}: {body}")]
    EndpointStatus { url: String, status: u16, body: String },

    #[error("Evaluator '{evaluator}' failed: {message}")]
    Evaluator { evaluator: String, message: String },

    #[error("Cannot build evaluator '{name}': {reason}")]
    UnknownEvaluator { name: String, reason: String },

    /// A `testing` helper found the run below its bar.
    #[error("Assertion failed: {message}")]
    Assertion { message: String },
}

impl EvalError {
    pub fn config(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigParse { source_name: source_name.into(), message: message.into() }
    }

    pub fn evaluator(evaluator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluator { evaluator: evaluator.into(), message: message.into() }
    }

    /// Classify a transport failure against the environment endpoint.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { url: url.to_string() }
        } else {
            Self::Connection { url: url.to_string(), message: err.to_string() }
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
