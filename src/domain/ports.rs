use super::bank::{AuthorizationResult, CaptureResult, PaymentData, VoidResult};
use super::session::{Amount, PaymentSession};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn store(&self, session: PaymentSession) -> Result<()>;
    async fn get(&self, session_id: &str) -> Result<Option<PaymentSession>>;
    async fn all(&self) -> Result<Vec<PaymentSession>>;
}

/// Acquiring-bank port. Implementations answer asynchronously and never
/// resolve a capture before its authorize has resolved; the orchestrator
/// relies on that by awaiting each step in turn.
#[async_trait]
pub trait AcquirerBank: Send + Sync {
    async fn authorize(&self, payment: PaymentData) -> Result<AuthorizationResult>;
    async fn capture(&self, transaction_id: &str, amount: Amount) -> Result<CaptureResult>;
    async fn void(&self, transaction_id: &str) -> Result<VoidResult>;
}

pub type SessionStoreBox = Box<dyn SessionStore>;
pub type BankBox = Box<dyn AcquirerBank>;
