//! Wire events exchanged with terminals, as JSON objects with a `type`
//! discriminator. Both directions are closed unions so dispatch is
//! exhaustive at compile time; unknown inbound types are caught at the
//! json layer before deserialization and answered with an `error` event.

use crate::domain::session::{Amount, PaymentMethod};
use crate::error::{ErrorCode, ErrorReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal metadata echoed back in the registration ack.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TerminalProfile {
    pub name: String,
    pub operator: String,
    pub status: String,
    pub location: String,
}

impl TerminalProfile {
    /// Fallback profile for terminals that hand-shake before any metadata
    /// has been provisioned for them.
    pub fn placeholder(terminal_id: &str) -> Self {
        Self {
            name: terminal_id.to_string(),
            operator: "unassigned".to_string(),
            status: "active".to_string(),
            location: String::new(),
        }
    }
}

/// Success payload of a final `payment_status` push.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub amount: Amount,
    pub transaction_id: String,
    pub auth_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ExternalStatus {
    Completed,
    Failed,
}

/// Final outcome supplied by an external confirmer (wallet/QR webhook).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResult {
    pub status: ExternalStatus,
    #[serde(default)]
    pub bank_transaction_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<ErrorCode>,
}

/// Orchestrator -> terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    TerminalConfig {
        terminal_id: String,
        #[serde(flatten)]
        profile: TerminalProfile,
    },
    PaymentRequest {
        payment_id: String,
        amount: Amount,
        currency: String,
        method: Option<PaymentMethod>,
        timestamp: DateTime<Utc>,
    },
    PaymentStatus {
        payment_id: String,
        status: String,
        message: String,
        result: Option<PaymentOutcome>,
        error: Option<ErrorReport>,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        received_type: Option<String>,
    },
}

/// Terminal -> orchestrator.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TerminalEvent {
    TerminalReady {
        terminal_id: String,
    },
    NfcDetected {
        terminal_id: String,
        #[serde(default)]
        payment_id: Option<String>,
        #[serde(default)]
        amount: Option<u64>,
        #[serde(default)]
        currency: Option<String>,
    },
    QrScanned {
        terminal_id: String,
        #[serde(default)]
        payment_id: Option<String>,
        #[serde(default)]
        amount: Option<u64>,
        #[serde(default)]
        currency: Option<String>,
    },
    PaymentCompleted {
        terminal_id: String,
        payment_id: String,
        result: ExternalResult,
    },
}
