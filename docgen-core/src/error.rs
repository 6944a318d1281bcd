//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type DocgenResult<T> = Result<T, DocgenError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for repository analysis
#[derive(Error, Debug)]
pub enum DocgenError {
    /// Malformed input detected before any network call
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    /// Network failure or a non-2xx host response other than 404
    #[error("Host access error: {message}")]
    HostAccess {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u64>,
        context: ErrorContext,
    },

    #[error("Resource limit exceeded: {limit} (value {value})")]
    ResourceLimitExceeded {
        limit: String,
        value: usize,
        context: ErrorContext,
    },

    /// A directory listing failed and the walk was aborted
    #[error("Repository access error at '{path}': {message}")]
    RepositoryAccess {
        path: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Documentation generation error: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl DocgenError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DocgenError::Validation { context, .. } => Some(context),
            DocgenError::NotFound { context, .. } => Some(context),
            DocgenError::HostAccess { context, .. } => Some(context),
            DocgenError::Authentication { context, .. } => Some(context),
            DocgenError::RateLimit { context, .. } => Some(context),
            DocgenError::ResourceLimitExceeded { context, .. } => Some(context),
            DocgenError::RepositoryAccess { context, .. } => Some(context),
            DocgenError::Timeout { context, .. } => Some(context),
            DocgenError::Generation { context, .. } => Some(context),
            DocgenError::Config { context, .. } => Some(context),
            DocgenError::Internal { context, .. } => Some(context),
            DocgenError::Io(_) | DocgenError::Serialization(_) => None,
        }
    }

    /// Check if error is recoverable
    ///
    /// Recoverable errors may succeed when the caller retries with backoff.
    /// Nothing in the crawl itself retries.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DocgenError::HostAccess { .. } => true,
            DocgenError::Timeout { .. } => true,
            DocgenError::RateLimit { .. } => true,
            DocgenError::RepositoryAccess { source, .. } => source
                .as_ref()
                .and_then(|s| s.downcast_ref::<DocgenError>())
                .map(DocgenError::is_recoverable)
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            DocgenError::HostAccess { .. } => Some(1000),
            DocgenError::Timeout { .. } => Some(2000),
            DocgenError::RateLimit { retry_after_ms, .. } => *retry_after_ms,
            DocgenError::RepositoryAccess { .. } if self.is_recoverable() => Some(1000),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| &c.error_id);
        match self {
            DocgenError::Internal { .. } => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            DocgenError::Config { .. } | DocgenError::Validation { .. } => {
                error!(
                    error_id = ?error_id,
                    error = %self,
                    "Configuration or validation error"
                );
            }
            DocgenError::HostAccess { .. }
            | DocgenError::Timeout { .. }
            | DocgenError::RateLimit { .. } => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Host, timeout or rate limit error (may be recoverable)"
                );
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! host_error {
    ($msg:expr, $component:expr) => {
        $crate::DocgenError::HostAccess {
            message: $msg.to_string(),
            status: None,
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::DocgenError::HostAccess {
            message: $msg.to_string(),
            status: None,
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::DocgenError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::DocgenError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::DocgenError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the repository URL, branch and path")
                .with_suggestion("Check that the access token can read the repository"),
        }
    };
}
