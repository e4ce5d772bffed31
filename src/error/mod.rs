use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Client not found: {client_id}")]
    ClientNotFound { client_id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Client not found: {client_id}")]
    ClientNotFound { client_id: String },

    #[error("Duplicate username: {username}")]
    DuplicateUsername { username: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

impl AppError {
    /// Shorthand for a validation failure on a named input field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "bad backend".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: bad backend");

        let err = AppError::validation("username", "is required");
        assert_eq!(err.to_string(), "Validation failed: username - is required");

        let err = AppError::ClientNotFound {
            client_id: "c-1".to_string(),
        };
        assert_eq!(err.to_string(), "Client not found: c-1");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::DuplicateUsername {
            username: "@sarah".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate username: @sarah");

        let err = StorageError::Migration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: version mismatch");
    }

    #[test]
    fn test_mcp_error_display() {
        let err = McpError::UnknownTool {
            tool_name: "nonexistent".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: nonexistent");

        let err = McpError::InvalidParameters {
            tool_name: "sales_analyze_message".to_string(),
            message: "missing message".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameters for sales_analyze_message: missing message"
        );
    }

    // Exhaustive: every variant listed has a constructor in the crate.
    fn mcp_error_kind(err: &McpError) -> &'static str {
        match err {
            McpError::UnknownTool { .. } => "unknown_tool",
            McpError::InvalidParameters { .. } => "invalid_parameters",
            McpError::ExecutionFailed { .. } => "execution_failed",
            McpError::Json(_) => "json",
        }
    }

    fn app_error_kind(err: &AppError) -> &'static str {
        match err {
            AppError::Config { .. } => "config",
            AppError::Validation { .. } => "validation",
            AppError::ClientNotFound { .. } => "client_not_found",
            AppError::Storage(_) => "storage",
        }
    }

    #[test]
    fn test_error_kinds() {
        let err: McpError = AppError::validation("stage", "unknown").into();
        assert_eq!(mcp_error_kind(&err), "execution_failed");

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(mcp_error_kind(&McpError::Json(json_err)), "json");

        let err: AppError = StorageError::Query {
            message: "bad row".to_string(),
        }
        .into();
        assert_eq!(app_error_kind(&err), "storage");
    }

    #[test]
    fn test_app_error_conversion_to_mcp_error() {
        let app_err = AppError::validation("message", "is required");
        let mcp_err: McpError = app_err.into();
        assert!(matches!(mcp_err, McpError::ExecutionFailed { .. }));
        assert!(mcp_err.to_string().contains("Validation failed"));
    }

    #[test]
    fn test_storage_error_conversion_to_app_error() {
        let storage_err = StorageError::ClientNotFound {
            client_id: "test-123".to_string(),
        };
        let app_err: AppError = storage_err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }
}
