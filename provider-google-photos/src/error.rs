//! Error types for the Google Photos provider

use thiserror::Error;

/// Google Photos provider errors
#[derive(Error, Debug)]
pub enum GooglePhotosError {
    /// Authentication failed or token could not be obtained
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Photos API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Google Photos operations
pub type Result<T> = std::result::Result<T, GooglePhotosError>;

impl From<GooglePhotosError> for bridge_traits::error::BridgeError {
    fn from(error: GooglePhotosError) -> Self {
        match error {
            GooglePhotosError::AuthenticationFailed(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "Authentication failed: {}",
                    msg
                ))
            }
            GooglePhotosError::ApiError {
                status_code,
                message,
            } => bridge_traits::error::BridgeError::Api {
                status_code,
                message,
            },
            GooglePhotosError::ParseError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            GooglePhotosError::NetworkError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "Network error: {}",
                    msg
                ))
            }
            GooglePhotosError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GooglePhotosError::ApiError {
            status_code: 404,
            message: "Item not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Google Photos API error (status 404): Item not found"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error = GooglePhotosError::AuthenticationFailed("Token expired".to_string());
        let bridge_error: bridge_traits::error::BridgeError = error.into();

        assert!(matches!(
            bridge_error,
            bridge_traits::error::BridgeError::OperationFailed(_)
        ));
    }
}
