use crate::error::{ErrorCode, PaytermError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currencies the terminal fleet accepts. Single-valued in practice.
pub const SUPPORTED_CURRENCIES: [&str; 1] = ["RUB"];

/// A positive payment amount in minor currency units (kopecks).
///
/// Amounts are integral by contract; fractional minor units do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: u64) -> Result<Self, PaytermError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(PaytermError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Amount {
    type Error = PaytermError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Nfc,
    Qr,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Processing,
    Authorized,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Terminal in the state-machine sense: no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Authorized => "authorized",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One payment attempt's full record, from request to terminal outcome.
///
/// Mutated only through the transition methods below, which enforce the
/// pending -> processing -> authorized -> completed machine and keep
/// `completed_at` in lockstep with terminal states. All transitions out of
/// `Completed`/`Failed` are rejected without touching state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub id: String,
    pub terminal_id: String,
    pub amount: Amount,
    pub currency: String,
    pub method: Option<PaymentMethod>,
    pub status: SessionStatus,
    pub bank_transaction_id: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PaymentSession {
    pub fn new(terminal_id: &str, amount: Amount, currency: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            terminal_id: terminal_id.to_string(),
            amount,
            currency: currency.to_string(),
            method: None,
            status: SessionStatus::Pending,
            bank_transaction_id: None,
            error_code: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn reject(&self, event: &'static str) -> PaytermError {
        PaytermError::InvalidTransition {
            session_id: self.id.clone(),
            state: self.status.as_str(),
            event,
        }
    }

    /// pending -> processing, recording the detected method.
    pub fn begin_processing(&mut self, method: PaymentMethod) -> Result<(), PaytermError> {
        if self.status != SessionStatus::Pending {
            return Err(self.reject("method detection"));
        }
        self.method = Some(method);
        self.status = SessionStatus::Processing;
        Ok(())
    }

    /// processing -> authorized, recording the bank transaction reference.
    pub fn record_authorization(&mut self, bank_transaction_id: &str) -> Result<(), PaytermError> {
        if self.status != SessionStatus::Processing {
            return Err(self.reject("authorization"));
        }
        self.bank_transaction_id = Some(bank_transaction_id.to_string());
        self.status = SessionStatus::Authorized;
        Ok(())
    }

    /// authorized -> completed. Also accepts pending/processing -> completed
    /// for externally confirmed outcomes, which bypass the simulator.
    pub fn complete(&mut self) -> Result<(), PaytermError> {
        if self.status.is_terminal() {
            return Err(self.reject("completion"));
        }
        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Any non-terminal state -> failed, recording the error code.
    pub fn fail(&mut self, code: ErrorCode) -> Result<(), PaytermError> {
        if self.status.is_terminal() {
            return Err(self.reject("failure"));
        }
        self.status = SessionStatus::Failed;
        self.error_code = Some(code);
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PaymentSession {
        PaymentSession::new("T1", Amount::new(10000).unwrap(), "RUB")
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(1).is_ok());
        assert!(matches!(Amount::new(0), Err(PaytermError::Validation(_))));
    }

    #[test]
    fn test_new_session_is_pending() {
        let s = session();
        assert_eq!(s.status, SessionStatus::Pending);
        assert_eq!(s.amount.value(), 10000);
        assert!(s.method.is_none());
        assert!(s.bank_transaction_id.is_none());
        assert!(s.completed_at.is_none());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut s = session();
        s.begin_processing(PaymentMethod::Nfc).unwrap();
        assert_eq!(s.status, SessionStatus::Processing);
        assert_eq!(s.method, Some(PaymentMethod::Nfc));

        s.record_authorization("tx-1").unwrap();
        assert_eq!(s.status, SessionStatus::Authorized);
        assert_eq!(s.bank_transaction_id.as_deref(), Some("tx-1"));

        s.complete().unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert!(s.completed_at.is_some());
    }

    fn assert_fails(mut s: PaymentSession) {
        s.fail(ErrorCode::TransactionDeclined).unwrap();
        assert_eq!(s.status, SessionStatus::Failed);
        assert_eq!(s.error_code, Some(ErrorCode::TransactionDeclined));
        assert!(s.completed_at.is_some());
    }

    #[test]
    fn test_failure_from_each_live_state() {
        assert_fails(session());

        let mut processing = session();
        processing.begin_processing(PaymentMethod::Qr).unwrap();
        assert_fails(processing);

        let mut authorized = session();
        authorized.begin_processing(PaymentMethod::Qr).unwrap();
        authorized.record_authorization("tx").unwrap();
        assert_fails(authorized);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut s = session();
        s.begin_processing(PaymentMethod::Nfc).unwrap();
        s.record_authorization("tx").unwrap();
        s.complete().unwrap();

        assert!(matches!(
            s.begin_processing(PaymentMethod::Nfc),
            Err(PaytermError::InvalidTransition { .. })
        ));
        assert!(s.fail(ErrorCode::NetworkError).is_err());
        assert!(s.complete().is_err());
        assert_eq!(s.status, SessionStatus::Completed);
        assert!(s.error_code.is_none());
    }

    #[test]
    fn test_authorize_requires_processing() {
        let mut s = session();
        assert!(s.record_authorization("tx").is_err());
        assert_eq!(s.status, SessionStatus::Pending);
        assert!(s.bank_transaction_id.is_none());
    }

    #[test]
    fn test_external_completion_from_processing() {
        let mut s = session();
        s.begin_processing(PaymentMethod::Qr).unwrap();
        s.complete().unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
    }
}
