use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long a terminal display holds an error screen before auto-returning.
pub const DISPLAY_TIMEOUT_MS: u64 = 5000;

pub type Result<T> = std::result::Result<T, PaytermError>;

#[derive(Error, Debug)]
pub enum PaytermError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("no live connection for terminal {0}")]
    TerminalNotConnected(String),
    #[error("session {0} not found")]
    SessionNotFound(String),
    #[error("session {session_id}: cannot apply {event} in state {state}")]
    InvalidTransition {
        session_id: String,
        state: &'static str,
        event: &'static str,
    },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("unrecognized event type: {0}")]
    UnrecognizedEvent(String),
}

/// Where a client-visible error originated. The display layer keys retry
/// affordances and copy off this, never off the individual code.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ErrorOrigin {
    Bank,
    Method,
    System,
    Timeout,
}

/// Closed taxonomy of codes surfaced to terminals and clients.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Bank-origin declines
    InsufficientFunds,
    CardBlocked,
    NetworkError,
    InvalidCard,
    ExpiredCard,
    TransactionDeclined,
    CaptureFailed,
    // Method-origin (nfc/qr)
    MethodUnsupported,
    ReadFailure,
    MethodTimeout,
    GenerationFailure,
    GenerationNetworkError,
    MethodPaymentFailure,
    MethodExpired,
    // System-origin
    ConnectionLost,
    StorageFailure,
    InternalError,
    // Generic display timeout
    Timeout,
}

/// The six codes an authorize() decline is drawn from.
pub const BANK_DECLINE_CODES: [ErrorCode; 6] = [
    ErrorCode::InsufficientFunds,
    ErrorCode::CardBlocked,
    ErrorCode::NetworkError,
    ErrorCode::InvalidCard,
    ErrorCode::ExpiredCard,
    ErrorCode::TransactionDeclined,
];

impl ErrorCode {
    pub fn origin(&self) -> ErrorOrigin {
        match self {
            Self::InsufficientFunds
            | Self::CardBlocked
            | Self::NetworkError
            | Self::InvalidCard
            | Self::ExpiredCard
            | Self::TransactionDeclined
            | Self::CaptureFailed => ErrorOrigin::Bank,
            Self::MethodUnsupported
            | Self::ReadFailure
            | Self::MethodTimeout
            | Self::GenerationFailure
            | Self::GenerationNetworkError
            | Self::MethodPaymentFailure
            | Self::MethodExpired => ErrorOrigin::Method,
            Self::ConnectionLost | Self::StorageFailure | Self::InternalError => {
                ErrorOrigin::System
            }
            Self::Timeout => ErrorOrigin::Timeout,
        }
    }

    /// Whether the terminal should offer a retry affordance.
    pub fn retryable(&self) -> bool {
        self.origin() != ErrorOrigin::System
    }

    /// Canned human-readable message for the terminal display.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InsufficientFunds => "Insufficient funds on card",
            Self::CardBlocked => "Card is blocked",
            Self::NetworkError => "Bank network error, try again",
            Self::InvalidCard => "Invalid card",
            Self::ExpiredCard => "Card has expired",
            Self::TransactionDeclined => "Transaction declined by bank",
            Self::CaptureFailed => "Capture failed: authorization expired",
            Self::MethodUnsupported => "Payment method not supported",
            Self::ReadFailure => "Could not read card, try again",
            Self::MethodTimeout => "Payment method timed out",
            Self::GenerationFailure => "Could not generate payment code",
            Self::GenerationNetworkError => "Network error while generating payment code",
            Self::MethodPaymentFailure => "Payment was not completed",
            Self::MethodExpired => "Payment code expired",
            Self::ConnectionLost => "Terminal connection lost",
            Self::StorageFailure => "Internal storage failure",
            Self::InternalError => "Internal error",
            Self::Timeout => "Operation timed out",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: *self,
            message: self.message().to_string(),
            origin: self.origin(),
            retryable: self.retryable(),
            display_timeout_ms: DISPLAY_TIMEOUT_MS,
            timestamp: Utc::now(),
        }
    }
}

/// Uniform client-visible error shape. Every failure, regardless of origin,
/// reaches the terminal in this form so the display layer needs no
/// origin-specific logic.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    pub origin: ErrorOrigin,
    pub retryable: bool,
    pub display_timeout_ms: u64,
    pub timestamp: DateTime<Utc>,
}
