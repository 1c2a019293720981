//! Centralized Error Handling Module
//!
//! Every failure in the query path carries a unique error code so logs can be
//! grepped and responses classified without string matching.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - CHAIN_xxx / REGISTRY_xxx: chain client registry
//! - RANGE_xxx / REQ_xxx: request validation
//! - RPC_xxx: upstream provider errors
//! - CACHE_xxx: cache store errors (recovered locally, never surfaced)
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Configured limit that was exceeded (range guard rejections)
    pub limit: Option<u64>,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            limit: None,
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            limit: None,
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Registry Errors
    // ============================================
    /// Registry used before startup registration completed (lifecycle bug)
    RegistryUninitialized,
    /// No chain client could be established at startup
    RegistryNoClients,
    /// Chain id already has a registered client
    RegistryDuplicateChain,
    /// Chain id has no registered client
    ChainNotSupported,

    // ============================================
    // Request Validation Errors
    // ============================================
    /// Block range wider than the configured maximum
    RangeTooLarge,
    /// to_block lower than from_block
    InvalidRange,
    /// Malformed address
    InvalidAddress,
    /// Any other malformed request field
    ApiValidation,

    // ============================================
    // Upstream RPC Errors
    // ============================================
    /// Provider returned a JSON-RPC error object
    UpstreamRpc,
    /// RPC connection failed (or client already closed)
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429)
    RpcRateLimited,
    /// Invalid RPC response
    RpcInvalidResponse,

    // ============================================
    // Cache Errors
    // ============================================
    /// Cache store read/write failed
    CacheUnavailable,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistryUninitialized => "REGISTRY_UNINITIALIZED",
            Self::RegistryNoClients => "REGISTRY_NO_CLIENTS",
            Self::RegistryDuplicateChain => "REGISTRY_DUPLICATE_CHAIN",
            Self::ChainNotSupported => "CHAIN_NOT_SUPPORTED",

            Self::RangeTooLarge => "RANGE_TOO_LARGE",
            Self::InvalidRange => "REQ_INVALID_RANGE",
            Self::InvalidAddress => "REQ_INVALID_ADDRESS",
            Self::ApiValidation => "REQ_VALIDATION",

            Self::UpstreamRpc => "RPC_UPSTREAM_ERROR",
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::CacheUnavailable => "CACHE_UNAVAILABLE",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RangeTooLarge => 400,
            Self::ChainNotSupported => 404,
            Self::InvalidRange | Self::InvalidAddress | Self::ApiValidation => 422,
            code if code.is_upstream() => 502,
            _ => 500,
        }
    }

    /// Errors raised by the upstream provider or its transport
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamRpc
                | Self::RpcConnectionFailed
                | Self::RpcTimeout
                | Self::RpcRateLimited
                | Self::RpcInvalidResponse
        )
    }

    /// Transport failures worth another attempt at the transport layer.
    /// JSON-RPC error objects are deterministic and never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcTimeout | Self::RpcRateLimited | Self::RpcConnectionFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Registry resolved before initialization
    pub fn uninitialized() -> Self {
        Self::new(
            ErrorCode::RegistryUninitialized,
            "Chain clients not initialized",
        )
    }

    /// Startup produced zero chain clients
    pub fn no_clients() -> Self {
        Self::new(ErrorCode::RegistryNoClients, "No clients to initialize")
    }

    /// Unsupported chain
    pub fn chain_not_supported(chain_id: u64) -> Self {
        Self::new(
            ErrorCode::ChainNotSupported,
            format!("Chain ID {} is not supported", chain_id),
        )
    }

    /// Range guard rejection; carries the configured maximum
    pub fn range_too_large(max_range: u64) -> Self {
        Self {
            limit: Some(max_range),
            ..Self::new(
                ErrorCode::RangeTooLarge,
                format!("Max block range limit is {}", max_range),
            )
        }
    }

    /// to_block < from_block
    pub fn invalid_range(from_block: u64, to_block: u64) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!(
                "to_block ({}) must be greater than or equal to from_block ({})",
                to_block, from_block
            ),
        )
    }

    /// Invalid address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    /// Request validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiValidation, msg)
    }

    /// Provider returned a JSON-RPC error; message is the provider's own
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamRpc, msg)
    }

    /// RPC connection failed
    pub fn rpc_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcConnectionFailed, msg)
    }

    /// RPC timeout
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    /// RPC rate limited
    pub fn rpc_rate_limited() -> Self {
        Self::new(ErrorCode::RpcRateLimited, "Rate limited (HTTP 429)")
    }

    /// Malformed upstream response
    pub fn rpc_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcInvalidResponse, msg)
    }

    /// Cache store failure
    pub fn cache_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheUnavailable, msg)
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, msg: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {}", key, msg),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::rpc_timeout("Request timeout")
        } else if err.is_connect() {
            Self::rpc_connection_failed("Connection failed")
        } else if err.is_decode() {
            Self::with_source(ErrorCode::RpcInvalidResponse, "Failed to decode response", err)
        } else {
            Self::with_source(ErrorCode::RpcConnectionFailed, "Request failed", err)
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        Self::with_source(ErrorCode::CacheUnavailable, "Redis error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::chain_not_supported(99999);
        assert_eq!(err.code, ErrorCode::ChainNotSupported);
        assert_eq!(err.code_str(), "CHAIN_NOT_SUPPORTED");
        assert_eq!(err.message, "Chain ID 99999 is not supported");
    }

    #[test]
    fn test_range_too_large_carries_limit() {
        let err = AppError::range_too_large(3000);
        assert_eq!(err.limit, Some(3000));
        assert_eq!(err.message, "Max block range limit is 3000");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RpcTimeout.is_retryable());
        assert!(ErrorCode::RpcRateLimited.is_retryable());
        assert!(!ErrorCode::UpstreamRpc.is_retryable());
        assert!(!ErrorCode::RangeTooLarge.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::RangeTooLarge.http_status(), 400);
        assert_eq!(ErrorCode::ChainNotSupported.http_status(), 404);
        assert_eq!(ErrorCode::InvalidRange.http_status(), 422);
        assert_eq!(ErrorCode::UpstreamRpc.http_status(), 502);
        assert_eq!(ErrorCode::RpcTimeout.http_status(), 502);
        assert_eq!(ErrorCode::RegistryUninitialized.http_status(), 500);
        assert_eq!(ErrorCode::CacheUnavailable.http_status(), 500);
    }
}
