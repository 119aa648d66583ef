use crate::domain::bank::PaymentData;
use crate::domain::ports::{BankBox, SessionStoreBox};
use crate::domain::session::{
    Amount, PaymentMethod, PaymentSession, SUPPORTED_CURRENCIES, SessionStatus,
};
use crate::error::{ErrorCode, PaytermError, Result};
use crate::infrastructure::channel::{TerminalChannel, TerminalConnection};
use crate::interfaces::events::{
    ExternalResult, ExternalStatus, PaymentOutcome, ServerEvent, TerminalEvent, TerminalProfile,
};
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on a single bank call. The simulator's own delay is bounded,
/// but a stuck authorize must still resolve to a failed session.
const DEFAULT_BANK_CALL_CAP: Duration = Duration::from_secs(10);

/// Payload of a method-detection event (nfc tap / QR scan).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDetection {
    pub method: PaymentMethod,
    /// Required when no session id accompanies the detection.
    pub amount: Option<u64>,
    pub currency: Option<String>,
}

/// Drives every payment session from creation to terminal outcome.
///
/// Owns the store and bank ports and an injected [`TerminalChannel`]; all
/// session mutation goes through here. Per-session ordering comes from
/// awaiting each bank step before the next; sessions for different
/// terminals interleave freely.
pub struct Orchestrator {
    store: SessionStoreBox,
    bank: BankBox,
    channel: TerminalChannel,
    bank_call_cap: Duration,
}

impl Orchestrator {
    pub fn new(store: SessionStoreBox, bank: BankBox, channel: TerminalChannel) -> Self {
        Self {
            store,
            bank,
            channel,
            bank_call_cap: DEFAULT_BANK_CALL_CAP,
        }
    }

    pub fn with_bank_call_cap(mut self, cap: Duration) -> Self {
        self.bank_call_cap = cap;
        self
    }

    pub fn channel(&self) -> &TerminalChannel {
        &self.channel
    }

    pub async fn is_connected(&self, terminal_id: &str) -> bool {
        self.channel.is_connected(terminal_id).await
    }

    pub async fn connected_terminals(&self) -> Vec<String> {
        self.channel.connected_terminals().await
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<PaymentSession>> {
        self.store.get(session_id).await
    }

    pub async fn sessions(&self) -> Result<Vec<PaymentSession>> {
        self.store.all().await
    }

    /// Starts a payment for a terminal.
    ///
    /// Validation failures reject before any session exists. A disconnected
    /// terminal still leaves a durable `Failed` record carrying
    /// `ConnectionLost`, then surfaces `TerminalNotConnected` to the caller.
    pub async fn request_payment(
        &self,
        terminal_id: &str,
        amount: u64,
        currency: &str,
        method: Option<PaymentMethod>,
    ) -> Result<PaymentSession> {
        if terminal_id.trim().is_empty() {
            return Err(PaytermError::Validation(
                "terminal id must not be blank".to_string(),
            ));
        }
        if !SUPPORTED_CURRENCIES.contains(&currency) {
            return Err(PaytermError::Validation(format!(
                "unsupported currency: {currency}"
            )));
        }
        let amount = Amount::new(amount)?;

        let mut session = PaymentSession::new(terminal_id, amount, currency);
        session.method = method;

        if !self.channel.is_connected(terminal_id).await {
            session.fail(ErrorCode::ConnectionLost)?;
            self.store.store(session).await?;
            warn!(terminal_id, "payment requested for offline terminal");
            return Err(PaytermError::TerminalNotConnected(terminal_id.to_string()));
        }

        self.store.store(session.clone()).await?;
        self.channel
            .send(
                terminal_id,
                ServerEvent::PaymentRequest {
                    payment_id: session.id.clone(),
                    amount: session.amount,
                    currency: session.currency.clone(),
                    method,
                    timestamp: Utc::now(),
                },
            )
            .await;
        info!(terminal_id, session_id = %session.id, amount = amount.value(), "payment requested");
        Ok(session)
    }

    /// Reacts to a method-detection event and drives the session end to end.
    ///
    /// With a session id the session must be `Pending`; without one an
    /// ad-hoc session is created from the payload (terminal-initiated
    /// flows). Pushes exactly one `processing` status and exactly one
    /// terminal status. A bank outage or timeout lands the session in
    /// `Failed` rather than escaping or leaving it stuck.
    pub async fn handle_method_detected(
        &self,
        terminal_id: &str,
        session_id: Option<&str>,
        detection: MethodDetection,
    ) -> Result<PaymentSession> {
        let mut session = match session_id {
            Some(id) => {
                let session = self
                    .store
                    .get(id)
                    .await?
                    .ok_or_else(|| PaytermError::SessionNotFound(id.to_string()))?;
                if session.terminal_id != terminal_id {
                    return Err(PaytermError::Validation(format!(
                        "session {id} does not belong to terminal {terminal_id}"
                    )));
                }
                session
            }
            None => {
                let amount = detection.amount.ok_or_else(|| {
                    PaytermError::Validation(
                        "detection without session id must carry an amount".to_string(),
                    )
                })?;
                let currency = detection.currency.as_deref().unwrap_or("RUB");
                self.request_payment(terminal_id, amount, currency, Some(detection.method))
                    .await?
            }
        };

        session.begin_processing(detection.method)?;
        self.store.store(session.clone()).await?;
        self.push_status(&session, "Processing payment", None, None)
            .await;

        let payment = PaymentData {
            amount: session.amount,
            currency: session.currency.clone(),
        };
        let auth = match tokio::time::timeout(self.bank_call_cap, self.bank.authorize(payment))
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(session_id = %session.id, %err, "authorize transport error");
                return self.fail_session(session, ErrorCode::NetworkError).await;
            }
            Err(_) => {
                warn!(session_id = %session.id, "authorize timed out");
                return self.fail_session(session, ErrorCode::NetworkError).await;
            }
        };

        if !auth.success {
            let code = auth
                .error
                .map(|e| e.code)
                .unwrap_or(ErrorCode::TransactionDeclined);
            return self.fail_session(session, code).await;
        }

        session.record_authorization(&auth.transaction_id)?;
        self.store.store(session.clone()).await?;

        let capture = match tokio::time::timeout(
            self.bank_call_cap,
            self.bank.capture(&auth.transaction_id, session.amount),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(session_id = %session.id, %err, "capture transport error");
                return self.fail_session(session, ErrorCode::NetworkError).await;
            }
            Err(_) => {
                warn!(session_id = %session.id, "capture timed out");
                return self.fail_session(session, ErrorCode::NetworkError).await;
            }
        };

        if !capture.success {
            let code = capture
                .error
                .map(|e| e.code)
                .unwrap_or(ErrorCode::CaptureFailed);
            return self.fail_session(session, code).await;
        }

        session.complete()?;
        self.store.store(session.clone()).await?;
        let outcome = PaymentOutcome {
            amount: session.amount,
            transaction_id: auth.transaction_id,
            auth_code: auth.auth_code,
        };
        self.push_status(&session, "Payment completed", Some(outcome), None)
            .await;
        info!(session_id = %session.id, "payment completed");
        Ok(session)
    }

    /// Applies a final outcome supplied by an external confirmer (e.g. a
    /// wallet webhook), bypassing the simulator. A failure's error code is
    /// preserved verbatim, never reclassified.
    pub async fn handle_external_completion(
        &self,
        terminal_id: &str,
        session_id: &str,
        result: ExternalResult,
    ) -> Result<PaymentSession> {
        let mut session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| PaytermError::SessionNotFound(session_id.to_string()))?;
        if session.terminal_id != terminal_id {
            return Err(PaytermError::Validation(format!(
                "session {session_id} does not belong to terminal {terminal_id}"
            )));
        }

        match result.status {
            ExternalStatus::Completed => {
                session.complete()?;
                if session.bank_transaction_id.is_none() {
                    session.bank_transaction_id = result.bank_transaction_id.clone();
                }
                self.store.store(session.clone()).await?;
                let outcome = PaymentOutcome {
                    amount: session.amount,
                    transaction_id: session.bank_transaction_id.clone().unwrap_or_default(),
                    auth_code: None,
                };
                self.push_status(&session, "Payment completed", Some(outcome), None)
                    .await;
                info!(session_id = %session.id, "payment completed externally");
                Ok(session)
            }
            ExternalStatus::Failed => {
                let code = result
                    .error_code
                    .unwrap_or(ErrorCode::MethodPaymentFailure);
                self.fail_session(session, code).await
            }
        }
    }

    /// Registers a terminal connection from a `terminal_ready` handshake.
    pub async fn register_terminal(
        &self,
        terminal_id: &str,
        profile: TerminalProfile,
        connection: TerminalConnection,
    ) {
        self.channel.register(terminal_id, profile, connection).await;
        info!(terminal_id, "terminal registered");
    }

    pub async fn unregister(&self, connection: &TerminalConnection) {
        self.channel.unregister(connection).await;
    }

    /// Dispatches one raw terminal-origin JSON event.
    ///
    /// An unrecognized `type` is answered with an `error` event echoing it
    /// back on the sending connection; the connection itself stays up.
    /// Handler rejections are likewise echoed, so a bad event never kills
    /// the orchestrator or the channel.
    pub async fn handle_raw_event(
        &self,
        connection: &TerminalConnection,
        raw: Value,
    ) -> Result<()> {
        let event: TerminalEvent = match serde_json::from_value(raw.clone()) {
            Ok(event) => event,
            Err(_) => {
                let received = raw
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                connection.push(ServerEvent::Error {
                    message: format!("unrecognized event type: {received}"),
                    received_type: Some(received.clone()),
                });
                return Err(PaytermError::UnrecognizedEvent(received));
            }
        };

        let outcome = match event {
            TerminalEvent::TerminalReady { terminal_id } => {
                let profile = TerminalProfile::placeholder(&terminal_id);
                self.register_terminal(&terminal_id, profile, connection.clone())
                    .await;
                Ok(())
            }
            TerminalEvent::NfcDetected {
                terminal_id,
                payment_id,
                amount,
                currency,
            } => self
                .handle_method_detected(
                    &terminal_id,
                    payment_id.as_deref(),
                    MethodDetection {
                        method: PaymentMethod::Nfc,
                        amount,
                        currency,
                    },
                )
                .await
                .map(|_| ()),
            TerminalEvent::QrScanned {
                terminal_id,
                payment_id,
                amount,
                currency,
            } => self
                .handle_method_detected(
                    &terminal_id,
                    payment_id.as_deref(),
                    MethodDetection {
                        method: PaymentMethod::Qr,
                        amount,
                        currency,
                    },
                )
                .await
                .map(|_| ()),
            TerminalEvent::PaymentCompleted {
                terminal_id,
                payment_id,
                result,
            } => self
                .handle_external_completion(&terminal_id, &payment_id, result)
                .await
                .map(|_| ()),
        };

        if let Err(err) = &outcome {
            warn!(%err, "terminal event rejected");
            connection.push(ServerEvent::Error {
                message: err.to_string(),
                received_type: None,
            });
        }
        outcome
    }

    async fn fail_session(
        &self,
        mut session: PaymentSession,
        code: ErrorCode,
    ) -> Result<PaymentSession> {
        session.fail(code)?;
        self.store.store(session.clone()).await?;
        self.push_status(&session, code.message(), None, Some(code))
            .await;
        info!(session_id = %session.id, ?code, "payment failed");
        Ok(session)
    }

    async fn push_status(
        &self,
        session: &PaymentSession,
        message: &str,
        result: Option<PaymentOutcome>,
        error: Option<ErrorCode>,
    ) -> bool {
        debug_assert!(matches!(
            session.status,
            SessionStatus::Processing | SessionStatus::Completed | SessionStatus::Failed
        ));
        self.channel
            .send(
                &session.terminal_id,
                ServerEvent::PaymentStatus {
                    payment_id: session.id.clone(),
                    status: session.status.as_str().to_string(),
                    message: message.to_string(),
                    result,
                    error: error.map(|code| code.report()),
                    timestamp: Utc::now(),
                },
            )
            .await
    }
}
