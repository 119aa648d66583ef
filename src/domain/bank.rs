use crate::domain::session::Amount;
use crate::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the orchestrator hands to the acquiring bank for authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentData {
    pub amount: Amount,
    pub currency: String,
}

/// Error half of a failed bank response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct BankError {
    pub code: ErrorCode,
    pub message: String,
}

impl BankError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BankStatus {
    Authorized,
    Declined,
    Captured,
    CaptureFailed,
    Voided,
}

/// Outcome of an authorize() call. The transaction id is present even on a
/// decline so every attempt stays traceable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResult {
    pub success: bool,
    pub transaction_id: String,
    pub status: BankStatus,
    pub auth_code: Option<String>,
    pub amount: Option<Amount>,
    pub currency: Option<String>,
    pub error: Option<BankError>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub success: bool,
    pub transaction_id: String,
    pub status: BankStatus,
    pub amount: Option<Amount>,
    pub error: Option<BankError>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoidResult {
    pub success: bool,
    pub transaction_id: String,
    pub status: BankStatus,
    pub timestamp: DateTime<Utc>,
}
