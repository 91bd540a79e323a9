//! Error handling for pantry-chef

use thiserror::Error;

/// Main error type for pantry-chef
#[derive(Error, Debug, Clone)]
pub enum PantryChefError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        url: Option<String>,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Timeout error: {operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        content: Option<String>,
    },

    #[error("Every one of {attempts} generation attempts produced a duplicate recipe")]
    DuplicateExhausted { attempts: u32 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Recipe store error: {message}")]
    Store {
        message: String,
        status_code: Option<u16>,
    },

    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse error classes, one per user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Credential,
    Network,
    Parse,
    Duplicate,
    Input,
    Storage,
    Internal,
}

impl PantryChefError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(
        message: impl Into<String>,
        status_code: Option<u16>,
        url: Option<String>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            status_code,
            url,
        }
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, content: Option<String>) -> Self {
        Self::Parse {
            message: message.into(),
            content,
        }
    }

    /// Create a duplicate exhaustion error
    pub fn duplicate_exhausted(attempts: u32) -> Self {
        Self::DuplicateExhausted { attempts }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a recipe store error
    pub fn store(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Store {
            message: message.into(),
            status_code,
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Io {
            message: message.into(),
            path,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify a failed HTTP call made by a client with a `timeout_secs` timeout
    pub fn request_failed(err: reqwest::Error, operation: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::timeout(operation, timeout_secs)
        } else {
            Self::from(err)
        }
    }

    /// Classify the error for presentation
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::Authentication { .. } => ErrorKind::Credential,
            Self::Network { .. } | Self::RateLimit { .. } | Self::Timeout { .. } => {
                ErrorKind::Network
            }
            Self::Parse { .. } => ErrorKind::Parse,
            Self::DuplicateExhausted { .. } => ErrorKind::Duplicate,
            Self::Validation { .. } => ErrorKind::Input,
            Self::Store { .. } | Self::Io { .. } => ErrorKind::Storage,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Credential problems are never retried
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Credential
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message } => {
                format!("❌ Configuration problem: {}\n💡 Check your .env file or environment variables", message)
            }
            Self::Authentication { message } => {
                format!("❌ Authentication failed: {}\n💡 Verify your API key is correct and active", message)
            }
            Self::Network { message, status_code, .. } => {
                let status = status_code.map_or(String::new(), |c| format!(" ({})", c));
                format!("❌ Network error{}: {}\n💡 Check your internet connection and try again", status, message)
            }
            Self::RateLimit { message, retry_after } => {
                let retry = retry_after.map_or(String::new(), |s| format!(" Retry in {}s.", s));
                format!("⏱️  Rate limit exceeded: {}{}\n💡 Wait a moment before generating again", message, retry)
            }
            Self::Timeout { operation, timeout_secs } => {
                format!("⏱️  Operation '{}' timed out after {}s\n💡 The AI service may be busy, try again", operation, timeout_secs)
            }
            Self::Parse { message, .. } => {
                format!("❌ The AI response could not be read: {}\n💡 This is usually temporary, try again", message)
            }
            Self::DuplicateExhausted { attempts } => {
                format!("🔁 Only recipes you already have came back after {} attempts\n💡 Try different ingredients", attempts)
            }
            Self::Validation { message } => {
                format!("❌ Validation error: {}\n💡 Check your input", message)
            }
            Self::Store { message, status_code } => {
                let status = status_code.map_or(String::new(), |c| format!(" ({})", c));
                format!("❌ Recipe store error{}: {}\n💡 Check SUPABASE_URL / SUPABASE_ANON_KEY or the local store path", status, message)
            }
            Self::Io { message, path } => {
                let path_info = path.as_ref().map_or(String::new(), |p| format!(" ({})", p));
                format!("❌ File error{}: {}\n💡 Check file permissions and paths", path_info, message)
            }
            Self::Internal { message } => {
                format!("❌ Internal error: {}\n💡 This is a bug, please report it", message)
            }
        }
    }
}

/// Convert from common error types
impl From<reqwest::Error> for PantryChefError {
    fn from(err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let url = err.url().map(|u| u.to_string());

        // The timeout length is unknown here; see `request_failed`
        if err.is_timeout() {
            Self::network("Request timed out", status_code, url)
        } else if err.is_connect() {
            Self::network("Connection failed", status_code, url)
        } else if err.is_decode() {
            Self::parse(format!("Malformed response body: {}", err), None)
        } else {
            Self::network(err.to_string(), status_code, url)
        }
    }
}

impl From<serde_json::Error> for PantryChefError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string(), None)
    }
}

impl From<std::io::Error> for PantryChefError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), None)
    }
}

impl From<crate::recipe::normalize::RepairError> for PantryChefError {
    fn from(err: crate::recipe::normalize::RepairError) -> Self {
        use crate::recipe::normalize::RepairError;

        match err {
            RepairError::NoCandidateFound => {
                Self::parse("AI response contained no JSON object", None)
            }
            RepairError::Unrecoverable { stages_tried, last_error, candidate } => Self::parse(
                format!("AI response stayed invalid after {} repair stages: {}", stages_tried, last_error),
                Some(candidate),
            ),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PantryChefError>;

/// Helper macros for common error patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::PantryChefError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::PantryChefError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::PantryChefError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::PantryChefError::validation(format!($fmt, $($arg)*))
    };
}
