use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use payterm::application::orchestrator::{MethodDetection, Orchestrator};
use payterm::domain::ports::{BankBox, SessionStoreBox};
use payterm::domain::session::PaymentMethod;
use payterm::infrastructure::bank_sim::{BankConfig, BankSimulator};
use payterm::infrastructure::channel::{TerminalChannel, TerminalConnection};
use payterm::infrastructure::in_memory::InMemorySessionStore;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Nfc,
    Qr,
}

impl From<Method> for PaymentMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Nfc => PaymentMethod::Nfc,
            Method::Qr => PaymentMethod::Qr,
        }
    }
}

/// Runs one simulated terminal payment end to end and prints every event
/// the terminal display would receive.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Amount in minor currency units (kopecks)
    #[arg(default_value_t = 10000)]
    amount: u64,

    /// Payment method the terminal reports
    #[arg(long, value_enum, default_value_t = Method::Nfc)]
    method: Method,

    /// Bank authorization success rate in [0, 1]
    #[arg(long, default_value_t = 0.9)]
    success_rate: f64,

    /// Injected authorize() latency in milliseconds
    #[arg(long, default_value_t = 500)]
    auth_delay_ms: u64,

    /// Injected capture() latency in milliseconds
    #[arg(long, default_value_t = 200)]
    capture_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let bank = BankSimulator::new(BankConfig {
        success_rate: cli.success_rate.clamp(0.0, 1.0),
        response_delay: Duration::from_millis(cli.auth_delay_ms),
        capture_delay: Duration::from_millis(cli.capture_delay_ms),
    });
    let store: SessionStoreBox = Box::new(InMemorySessionStore::new());
    let bank: BankBox = Box::new(bank);
    let orchestrator = Orchestrator::new(store, bank, TerminalChannel::new());

    // One in-process terminal, registered through the same handshake a
    // remote terminal would use.
    let (connection, mut events) = TerminalConnection::new();
    orchestrator
        .handle_raw_event(
            &connection,
            serde_json::json!({ "type": "terminal_ready", "terminalId": "T1" }),
        )
        .await
        .into_diagnostic()?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string_pretty(&event) {
                Ok(json) => println!("<- {json}"),
                Err(e) => eprintln!("event render error: {e}"),
            }
        }
    });

    let session = orchestrator
        .request_payment("T1", cli.amount, "RUB", Some(cli.method.into()))
        .await
        .into_diagnostic()?;

    let detection = MethodDetection {
        method: cli.method.into(),
        amount: None,
        currency: None,
    };
    let final_session = orchestrator
        .handle_method_detected("T1", Some(&session.id), detection)
        .await
        .into_diagnostic()?;

    // Let the printer drain before reporting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    printer.abort();

    println!(
        "session {}: {} (bank tx: {}, error: {})",
        final_session.id,
        final_session.status.as_str(),
        final_session.bank_transaction_id.as_deref().unwrap_or("-"),
        final_session
            .error_code
            .map(|c| format!("{c:?}"))
            .unwrap_or_else(|| "-".to_string()),
    );

    Ok(())
}
