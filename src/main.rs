use anyhow::Result;
use mdtables::{
    config::AppConfig,
    serve::{self, AppState},
    store::RecordStore,
};
use std::{
    fs,
    sync::{Arc, Mutex},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) resolve config & dirs ────────────────────────────────────
    let config = AppConfig::from_env();
    fs::create_dir_all(&config.upload_dir)?;
    info!(
        upload_dir = %config.upload_dir.display(),
        db = %config.db_path.display(),
        port = config.port,
        "configured"
    );

    // ─── 3) open the record store ────────────────────────────────────
    let store = RecordStore::open(&config.db_path)?;

    // ─── 4) serve ────────────────────────────────────────────────────
    let state = Arc::new(AppState {
        config,
        store: Mutex::new(store),
    });
    serve::serve(state).await;

    Ok(())
}
