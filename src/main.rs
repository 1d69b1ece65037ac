use std::sync::Arc;

use intake_assist::channels::{WhatsAppChannel, WhatsAppConfig};
use intake_assist::config::EngineConfig;
use intake_assist::engine::{medical_intake_script, ConversationEngine, MemoryStore};
use intake_assist::http::{app_routes, AppState};
use intake_assist::llm::{create_provider, LlmBackend, LlmConfig};
use intake_assist::report::FileReportRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ── LLM provider ─────────────────────────────────────────────────────
    let (backend, api_key) = match std::env::var("ANTHROPIC_API_KEY") {
        Ok(key) => (LlmBackend::Anthropic, key),
        Err(_) => match std::env::var("OPENAI_API_KEY") {
            Ok(key) => (LlmBackend::OpenAi, key),
            Err(_) => {
                eprintln!("Error: neither ANTHROPIC_API_KEY nor OPENAI_API_KEY is set");
                eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
                std::process::exit(1);
            }
        },
    };

    let model = std::env::var("INTAKE_ASSIST_MODEL")
        .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

    let llm_config = LlmConfig {
        backend,
        api_key: secrecy::SecretString::from(api_key),
        model: model.clone(),
    };
    let oracle = create_provider(&llm_config)?;

    // ── WhatsApp channel ─────────────────────────────────────────────────
    let whatsapp_config = WhatsAppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export WHATSAPP_API_TOKEN=... WHATSAPP_CLOUD_NUMBER_ID=...");
        std::process::exit(1);
    });
    let channel = Arc::new(WhatsAppChannel::new(whatsapp_config));

    if let Err(e) = channel.health_check().await {
        eprintln!("   Warning: WhatsApp health check failed: {e}");
    }

    // ── Report renderer ──────────────────────────────────────────────────
    let reports_dir = std::env::var("INTAKE_ASSIST_REPORTS_DIR")
        .unwrap_or_else(|_| "./data/reports".to_string());
    let renderer = Arc::new(FileReportRenderer::new(&reports_dir));
    if let Err(e) = renderer.ensure_dirs().await {
        eprintln!("   Warning: Could not create reports dir: {e}");
    }

    // ── Engine ───────────────────────────────────────────────────────────
    let engine_config = EngineConfig::from_env();
    let port: u16 = std::env::var("INTAKE_ASSIST_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    eprintln!("🏥 Intake Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model);
    eprintln!("   Webhook: http://0.0.0.0:{}/msgrcvd", port);
    eprintln!("   Reports: {}", reports_dir);
    eprintln!(
        "   History cap: {} messages\n",
        engine_config.history_max_messages
    );

    let engine = Arc::new(ConversationEngine::new(
        medical_intake_script(),
        Arc::new(MemoryStore::new()),
        channel,
        oracle,
        renderer,
        engine_config,
    ));

    let app = app_routes(AppState { engine });
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(port, "Intake webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
