mod common;

use common::{ScriptedBank, drain, scripted_rig};
use payterm::domain::session::SessionStatus;
use payterm::error::PaytermError;
use payterm::infrastructure::channel::TerminalConnection;
use payterm::interfaces::events::ServerEvent;
use serde_json::json;

#[tokio::test]
async fn test_terminal_ready_registers_and_acks() {
    let orchestrator = scripted_rig(ScriptedBank::approving());
    let (conn, mut rx) = TerminalConnection::new();

    orchestrator
        .handle_raw_event(&conn, json!({ "type": "terminal_ready", "terminalId": "T1" }))
        .await
        .unwrap();

    assert!(orchestrator.is_connected("T1").await);
    let ack = rx.recv().await.unwrap();
    assert!(matches!(ack, ServerEvent::TerminalConfig { terminal_id, .. } if terminal_id == "T1"));
}

#[tokio::test]
async fn test_nfc_detected_event_runs_full_flow() {
    let orchestrator = scripted_rig(ScriptedBank::approving());
    let (conn, mut rx) = TerminalConnection::new();
    orchestrator
        .handle_raw_event(&conn, json!({ "type": "terminal_ready", "terminalId": "T1" }))
        .await
        .unwrap();

    orchestrator
        .handle_raw_event(
            &conn,
            json!({ "type": "nfc_detected", "terminalId": "T1", "amount": 10000 }),
        )
        .await
        .unwrap();

    let sessions = orchestrator.sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Completed);

    let statuses: Vec<String> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            ServerEvent::PaymentStatus { status, .. } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, ["processing", "completed"]);
}

#[tokio::test]
async fn test_payment_completed_event_applies_external_result() {
    let orchestrator = scripted_rig(ScriptedBank::approving());
    let (conn, _rx) = TerminalConnection::new();
    orchestrator
        .handle_raw_event(&conn, json!({ "type": "terminal_ready", "terminalId": "T1" }))
        .await
        .unwrap();

    let session = orchestrator
        .request_payment("T1", 3000, "RUB", None)
        .await
        .unwrap();
    orchestrator
        .handle_raw_event(
            &conn,
            json!({
                "type": "payment_completed",
                "terminalId": "T1",
                "paymentId": session.id,
                "result": { "status": "completed", "bankTransactionId": "txn_ext" },
            }),
        )
        .await
        .unwrap();

    let stored = orchestrator.session(&session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.bank_transaction_id.as_deref(), Some("txn_ext"));
}

#[tokio::test]
async fn test_unrecognized_type_echoes_error_event() {
    let orchestrator = scripted_rig(ScriptedBank::approving());
    let (conn, mut rx) = TerminalConnection::new();

    let err = orchestrator
        .handle_raw_event(&conn, json!({ "type": "reboot", "terminalId": "T1" }))
        .await
        .unwrap_err();
    assert!(matches!(err, PaytermError::UnrecognizedEvent(t) if t == "reboot"));

    let reply = rx.recv().await.unwrap();
    match reply {
        ServerEvent::Error {
            message,
            received_type,
        } => {
            assert!(message.contains("reboot"));
            assert_eq!(received_type.as_deref(), Some("reboot"));
        }
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_event_replies_without_killing_the_channel() {
    let orchestrator = scripted_rig(ScriptedBank::approving());
    let (conn, mut rx) = TerminalConnection::new();
    orchestrator
        .handle_raw_event(&conn, json!({ "type": "terminal_ready", "terminalId": "T1" }))
        .await
        .unwrap();
    let _ack = rx.recv().await.unwrap();

    // Detection for a session that does not exist.
    let err = orchestrator
        .handle_raw_event(
            &conn,
            json!({ "type": "nfc_detected", "terminalId": "T1", "paymentId": "missing" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PaytermError::SessionNotFound(_)));

    let reply = rx.recv().await.unwrap();
    assert!(matches!(reply, ServerEvent::Error { .. }));

    // The channel survived and the next event still works.
    assert!(orchestrator.is_connected("T1").await);
    orchestrator
        .handle_raw_event(
            &conn,
            json!({ "type": "qr_scanned", "terminalId": "T1", "amount": 500 }),
        )
        .await
        .unwrap();
}
