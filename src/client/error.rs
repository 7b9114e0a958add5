//! Client-side error taxonomy

use serde::Serialize;
use thiserror::Error;

use crate::error::ErrorResponse;
use crate::models::{AadhaarStatus, SellerStatus};

/// Message shown for any connectivity failure
pub const NETWORK_ERROR_MESSAGE: &str = "Error connecting to server";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The server refused the request: invalid input, illegal transition,
    /// missing permission. The message is shown verbatim.
    #[error("{message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    /// Identity or seller gate not passed
    #[error("{message}")]
    Ineligible {
        message: String,
        verification_status: Option<AadhaarStatus>,
        seller_status: Option<SellerStatus>,
    },

    #[error("Error connecting to server")]
    Network(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Build the error for a non-2xx response body
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorResponse>(body) {
            Ok(ErrorResponse { error }) => {
                if error.verification_status.is_some() || error.seller_status.is_some() {
                    ClientError::Ineligible {
                        message: error.message,
                        verification_status: error.verification_status,
                        seller_status: error.seller_status,
                    }
                } else {
                    ClientError::Rejected {
                        status,
                        code: error.code,
                        message: error.message,
                    }
                }
            }
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                ClientError::Rejected {
                    status,
                    code: "HTTP_ERROR".to_string(),
                    message: if text.is_empty() {
                        format!("Request failed with status {}", status)
                    } else {
                        text
                    },
                }
            }
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Uniform result of a user action: `{ success, data | error }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<AadhaarStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_status: Option<SellerStatus>,
}

impl<T> From<Result<T, ClientError>> for ActionOutcome<T> {
    fn from(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(data) => ActionOutcome {
                success: true,
                data: Some(data),
                error: None,
                verification_status: None,
                seller_status: None,
            },
            Err(err) => {
                let (verification_status, seller_status) = match &err {
                    ClientError::Ineligible {
                        verification_status,
                        seller_status,
                        ..
                    } => (*verification_status, *seller_status),
                    _ => (None, None),
                };
                ActionOutcome {
                    success: false,
                    data: None,
                    error: Some(err.to_string()),
                    verification_status,
                    seller_status,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_is_verbatim() {
        let body = br#"{"error":{"code":"CONFLICT","message":"Invalid delivery step from assigned to picked_from_buyer"}}"#;
        let err = ClientError::from_response(409, body);
        assert_eq!(
            err.to_string(),
            "Invalid delivery step from assigned to picked_from_buyer"
        );
        assert!(matches!(err, ClientError::Rejected { status: 409, .. }));
    }

    #[test]
    fn test_eligibility_fields_are_kept() {
        let body = br#"{"error":{"code":"NOT_ELIGIBLE","message":"Aadhaar verification is required","verification_status":"pending"}}"#;
        match ClientError::from_response(403, body) {
            ClientError::Ineligible {
                verification_status,
                seller_status,
                ..
            } => {
                assert_eq!(verification_status, Some(AadhaarStatus::Pending));
                assert_eq!(seller_status, None);
            }
            other => panic!("expected eligibility error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body() {
        let err = ClientError::from_response(429, b"Too many requests. Please try again later.");
        assert_eq!(err.to_string(), "Too many requests. Please try again later.");

        let err = ClientError::from_response(502, b"");
        assert_eq!(err.to_string(), "Request failed with status 502");
    }

    #[test]
    fn test_outcome_shape() {
        let ok: ActionOutcome<u32> = Ok(7).into();
        assert!(ok.success);
        assert_eq!(ok.data, Some(7));

        let failed: ActionOutcome<u32> =
            Err(ClientError::Network("connection refused".to_string())).into();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some(NETWORK_ERROR_MESSAGE));
    }
}
