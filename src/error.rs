use reqwest::StatusCode;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestionaleError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Operation rejected: {0}")]
    Rejected(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GestionaleResult<T> = Result<T, GestionaleError>;

const OPERATION_FAILED: &str = "Operazione non riuscita";

impl GestionaleError {
    /// Text shown to the user. Only validation messages keep their own wording;
    /// every other failure is reported as a failed operation, with the backend
    /// detail appended when one was returned.
    pub fn user_message(&self) -> String {
        match self {
            GestionaleError::Validation(msg) => msg.clone(),
            GestionaleError::Status {
                detail: Some(detail),
                ..
            } => format!("{}: {}", OPERATION_FAILED, detail),
            GestionaleError::Rejected(msg) if !msg.is_empty() => {
                format!("{}: {}", OPERATION_FAILED, msg)
            }
            GestionaleError::Auth(_) => format!("{}: effettua il login", OPERATION_FAILED),
            _ => OPERATION_FAILED.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GestionaleError::Validation(_))
    }
}

// Errors travel as plain strings when printed as JSON by the CLI.
impl Serialize for GestionaleError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.user_message().as_ref())
    }
}
