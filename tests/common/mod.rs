#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use payterm::application::orchestrator::Orchestrator;
use payterm::domain::bank::{
    AuthorizationResult, BankError, BankStatus, CaptureResult, PaymentData, VoidResult,
};
use payterm::domain::ports::{AcquirerBank, BankBox, SessionStoreBox};
use payterm::domain::session::Amount;
use payterm::error::{ErrorCode, Result};
use payterm::infrastructure::bank_sim::{BankConfig, BankSimulator};
use payterm::infrastructure::channel::{TerminalChannel, TerminalConnection};
use payterm::infrastructure::in_memory::InMemorySessionStore;
use payterm::interfaces::events::{ServerEvent, TerminalProfile};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn profile() -> TerminalProfile {
    TerminalProfile {
        name: "Kiosk 1".to_string(),
        operator: "Acme Retail".to_string(),
        status: "active".to_string(),
        location: "Hall A".to_string(),
    }
}

/// Orchestrator backed by the real simulator with 1 ms delays.
pub fn simulator_rig(success_rate: f64) -> (Orchestrator, BankSimulator) {
    let bank = BankSimulator::new(BankConfig {
        success_rate,
        response_delay: Duration::from_millis(1),
        capture_delay: Duration::from_millis(1),
    });
    let store: SessionStoreBox = Box::new(InMemorySessionStore::new());
    let boxed: BankBox = Box::new(bank.clone());
    (
        Orchestrator::new(store, boxed, TerminalChannel::new()),
        bank,
    )
}

/// Orchestrator backed by a deterministic scripted bank.
pub fn scripted_rig(bank: ScriptedBank) -> Orchestrator {
    let store: SessionStoreBox = Box::new(InMemorySessionStore::new());
    Orchestrator::new(store, Box::new(bank), TerminalChannel::new())
}

/// Registers a terminal and swallows the `terminal_config` ack.
pub async fn connect(
    orchestrator: &Orchestrator,
    terminal_id: &str,
) -> (TerminalConnection, UnboundedReceiver<ServerEvent>) {
    let (connection, mut rx) = TerminalConnection::new();
    orchestrator
        .register_terminal(terminal_id, profile(), connection.clone())
        .await;
    let ack = rx.recv().await.expect("registration ack");
    assert!(matches!(ack, ServerEvent::TerminalConfig { .. }));
    (connection, rx)
}

/// Collects everything currently queued on the receiver.
pub fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Deterministic bank double with scripted authorize/capture outcomes.
#[derive(Clone)]
pub struct ScriptedBank {
    pub authorize_ok: bool,
    pub capture_ok: bool,
    pub decline_code: ErrorCode,
    /// When set, every call sleeps this long before answering.
    pub stall: Option<Duration>,
}

impl ScriptedBank {
    pub fn approving() -> Self {
        Self {
            authorize_ok: true,
            capture_ok: true,
            decline_code: ErrorCode::TransactionDeclined,
            stall: None,
        }
    }

    pub fn declining(code: ErrorCode) -> Self {
        Self {
            authorize_ok: false,
            capture_ok: true,
            decline_code: code,
            stall: None,
        }
    }

    pub fn capture_failing() -> Self {
        Self {
            authorize_ok: true,
            capture_ok: false,
            decline_code: ErrorCode::CaptureFailed,
            stall: None,
        }
    }

    pub fn stalling(delay: Duration) -> Self {
        Self {
            stall: Some(delay),
            ..Self::approving()
        }
    }
}

#[async_trait]
impl AcquirerBank for ScriptedBank {
    async fn authorize(&self, payment: PaymentData) -> Result<AuthorizationResult> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        if self.authorize_ok {
            Ok(AuthorizationResult {
                success: true,
                transaction_id: "txn_scripted".to_string(),
                status: BankStatus::Authorized,
                auth_code: Some("AUTH1234".to_string()),
                amount: Some(payment.amount),
                currency: Some(payment.currency),
                error: None,
                timestamp: Utc::now(),
            })
        } else {
            Ok(AuthorizationResult {
                success: false,
                transaction_id: "txn_scripted".to_string(),
                status: BankStatus::Declined,
                auth_code: None,
                amount: None,
                currency: None,
                error: Some(BankError::new(self.decline_code)),
                timestamp: Utc::now(),
            })
        }
    }

    async fn capture(&self, transaction_id: &str, amount: Amount) -> Result<CaptureResult> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        if self.capture_ok {
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
        Ok(VoidResult {
            success: true,
            transaction_id: transaction_id.to_string(),
            status: BankStatus::Voided,
            timestamp: Utc::now(),
        })
    }
}
