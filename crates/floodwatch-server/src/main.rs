use anyhow::Result;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use floodwatch_alert::AlertEngine;
use floodwatch_risk::ScoreCalculator;
use floodwatch_storage::{AlertRuleRow, SurveillanceStore};

use floodwatch_server::app;
use floodwatch_server::config::{self, ServerConfig};
use floodwatch_server::orchestrator::RecomputeOrchestrator;
use floodwatch_server::region_seed;
use floodwatch_server::rule_builder;
use floodwatch_server::rule_seed;
use floodwatch_server::scheduler::RecomputeScheduler;
use floodwatch_server::state::AppState;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  floodwatch-server [config.toml]                          Start the server");
    eprintln!("  floodwatch-server init-regions <config.toml> <seed.json>  Initialize regions from seed file");
    eprintln!("  floodwatch-server init-rules <config.toml> <seed.json>    Initialize alert rules from seed file");
}

#[tokio::main]
async fn main() -> Result<()> {
    floodwatch_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("floodwatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("init-regions") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-regions requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-regions requires <seed.json> argument")
            })?;
            run_init_regions(config_path, seed_path).await
        }
        Some("init-rules") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-rules requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-rules requires <seed.json> argument")
            })?;
            run_init_rules(config_path, seed_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

/// Initialize regions from a JSON seed file.
async fn run_init_regions(config_path: &str, seed_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = SurveillanceStore::new(&config.database.connection_url()).await?;
    region_seed::init_regions_from_file(&store, seed_path).await?;
    Ok(())
}

/// Initialize alert rules from a JSON seed file.
async fn run_init_rules(config_path: &str, seed_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = SurveillanceStore::new(&config.database.connection_url()).await?;

    let seed_content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: config::RulesSeedFile = serde_json::from_str(&seed_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    // List existing rule names for dedup
    let existing = store.list_alert_rules(None, None, 10000, 0).await?;
    let existing_names: std::collections::HashSet<String> =
        existing.iter().map(|r| r.name.clone()).collect();

    let mut created = 0u32;
    let mut skipped = 0u32;

    for r in &seed.rules {
        if existing_names.contains(&r.name) {
            tracing::warn!(name = %r.name, "Alert rule already exists, skipping");
            skipped += 1;
            continue;
        }

        let row = AlertRuleRow {
            id: floodwatch_common::id::next_id(),
            name: r.name.clone(),
            alert_type: r.alert_type.clone(),
            region_pattern: r.region_pattern.clone(),
            severity: r.severity.clone(),
            enabled: r.enabled,
            auto_resolve: r.auto_resolve,
            conditions_json: r.conditions.to_string(),
            source: "seed".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // Reject rows the engine would skip at load time
        if let Err(e) = rule_builder::build_rule_from_row(&row) {
            tracing::error!(name = %r.name, error = %e, "Invalid alert rule in seed file");
            continue;
        }

        match store.insert_alert_rule(&row).await {
            Ok(inserted) => {
                tracing::info!(name = %r.name, id = %inserted.id, "Alert rule created");
                created += 1;
            }
            Err(e) => {
                tracing::error!(name = %r.name, error = %e, "Failed to create alert rule");
            }
        }
    }

    tracing::info!(created, skipped, "init-rules completed");
    Ok(())
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;

    tracing::info!(
        http_port = config.http_port,
        data_dir = %config.database.data_dir,
        "floodwatch-server starting"
    );

    // Build components
    let store = Arc::new(SurveillanceStore::new(&config.database.connection_url()).await?);
    let calculator = Arc::new(ScoreCalculator::new(config.risk.clone())?);

    // Seed default alert rules (only when DB has none)
    if let Err(e) = rule_seed::init_default_rules(&store).await {
        tracing::error!(error = %e, "Failed to initialize default alert rules");
    }

    // Load alert engine from DB
    let alert_engine = Arc::new(Mutex::new(AlertEngine::new(vec![])));
    if let Err(e) = rule_builder::reload_alert_engine(&store, &alert_engine).await {
        tracing::error!(error = %e, "Failed to load alert rules from DB");
    }

    let orchestrator = Arc::new(RecomputeOrchestrator::new(
        store.clone(),
        calculator.clone(),
        alert_engine.clone(),
        config.recompute.clone(),
    ));

    let state = AppState {
        store: store.clone(),
        calculator,
        alert_engine,
        orchestrator: orchestrator.clone(),
        start_time: Utc::now(),
        config: Arc::new(config.clone()),
    };

    // HTTP/REST server
    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let app = app::build_http_app(state.clone());
    let http_listener = tokio::net::TcpListener::bind(http_addr).await?;
    let http_server = axum::serve(
        http_listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    // Scheduled recompute (on-demand only when no interval configured)
    let scheduler_handle = match config.recompute.interval_secs {
        Some(interval_secs) => {
            let scheduler = RecomputeScheduler::new(orchestrator, interval_secs);
            Some(tokio::spawn(async move {
                scheduler.run().await;
            }))
        }
        None => {
            tracing::info!("Recompute scheduler disabled, on-demand only");
            None
        }
    };

    tracing::info!(http = %http_addr, "Server started");

    tokio::select! {
        result = http_server.with_graceful_shutdown(async { signal::ctrl_c().await.ok(); }) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("Shutting down gracefully");
        }
    }

    if let Some(h) = scheduler_handle {
        h.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}
