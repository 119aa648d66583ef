use crate::domain::bank::{
    AuthorizationResult, BankError, BankStatus, CaptureResult, PaymentData, VoidResult,
};
use crate::domain::ports::AcquirerBank;
use crate::domain::session::Amount;
use crate::error::{BANK_DECLINE_CODES, ErrorCode, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Capture succeeds at this rate regardless of the configured
/// authorization success rate; the two steps are independent injection
/// points for decline testing.
const CAPTURE_SUCCESS_RATE: f64 = 0.99;

#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Probability in [0, 1] that authorize() approves.
    pub success_rate: f64,
    /// Injected latency before an authorize() response.
    pub response_delay: Duration,
    /// Injected latency before a capture()/void() response.
    pub capture_delay: Duration,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.9,
            response_delay: Duration::from_millis(500),
            capture_delay: Duration::from_millis(200),
        }
    }
}

/// Stateless acquiring-bank stand-in with configurable unpredictability.
///
/// Every outcome is an independent Bernoulli draw; the simulator keeps no
/// memory of prior outcomes for the same payment. Config is shared behind a
/// lock so tests and admin tooling can retune a running simulator.
#[derive(Clone, Default)]
pub struct BankSimulator {
    config: Arc<RwLock<BankConfig>>,
}

impl BankSimulator {
    pub fn new(config: BankConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn set_success_rate(&self, rate: f64) {
        self.config.write().await.success_rate = rate.clamp(0.0, 1.0);
    }

    pub async fn set_response_delay(&self, delay: Duration) {
        self.config.write().await.response_delay = delay;
    }

    pub async fn set_capture_delay(&self, delay: Duration) {
        self.config.write().await.capture_delay = delay;
    }

    pub async fn config(&self) -> BankConfig {
        self.config.read().await.clone()
    }

    fn transaction_id() -> String {
        format!("txn_{}", Uuid::new_v4().simple())
    }

    fn auth_code() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect()
    }

    fn random_decline() -> ErrorCode {
        BANK_DECLINE_CODES[thread_rng().gen_range(0..BANK_DECLINE_CODES.len())]
    }
}

#[async_trait]
impl AcquirerBank for BankSimulator {
    async fn authorize(&self, payment: PaymentData) -> Result<AuthorizationResult> {
        let config = self.config.read().await.clone();
        tokio::time::sleep(config.response_delay).await;

        let transaction_id = Self::transaction_id();
        let approved = thread_rng().gen_bool(config.success_rate);
        debug!(%transaction_id, approved, amount = payment.amount.value(), "authorize");

        if approved {
            Ok(AuthorizationResult {
                success: true,
                transaction_id,
                status: BankStatus::Authorized,
                auth_code: Some(Self::auth_code()),
                amount: Some(payment.amount),
                currency: Some(payment.currency),
                error: None,
                timestamp: Utc::now(),
            })
        } else {
            Ok(AuthorizationResult {
                success: false,
                transaction_id,
                status: BankStatus::Declined,
                auth_code: None,
                amount: None,
                currency: None,
                error: Some(BankError::new(Self::random_decline())),
                timestamp: Utc::now(),
            })
        }
    }

    async fn capture(&self, transaction_id: &str, amount: Amount) -> Result<CaptureResult> {
        let config = self.config.read().await.clone();
        tokio::time::sleep(config.capture_delay).await;

        let captured = thread_rng().gen_bool(CAPTURE_SUCCESS_RATE);
        debug!(%transaction_id, captured, "capture");

        if captured {
            Ok(CaptureResult {
                success: true,
                transaction_id: transaction_id.to_string(),
                status: BankStatus::Captured,
                amount: Some(amount),
                error: None,
                timestamp: Utc::now(),
            })
        } else {
            Ok(CaptureResult {
                success: false,
                transaction_id: transaction_id.to_string(),
                status: BankStatus::CaptureFailed,
                amount: None,
                error: Some(BankError::new(ErrorCode::CaptureFailed)),
                timestamp: Utc::now(),
            })
        }
    }

    async fn void(&self, transaction_id: &str) -> Result<VoidResult> {
        let config = self.config.read().await.clone();
        tokio::time::sleep(config.capture_delay).await;

        debug!(%transaction_id, "void");
        Ok(VoidResult {
            success: true,
            transaction_id: transaction_id.to_string(),
            status: BankStatus::Voided,
            timestamp: Utc::now(),
        })
    }
}
