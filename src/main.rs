mod cli;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use spacesaver::config::Config;
use spacesaver::driver::EncoderDriver;
use spacesaver::server::{self, AppContext};
use spacesaver::{prober, scanner};
use spacesaver_av::tools;
use spacesaver_db::{pool, Store};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "spacesaver=trace,tower_http=debug".to_string()
        } else {
            "spacesaver=info,tower_http=info".to_string()
        }
    });
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(env_filter)).init();

    let config = Config::load_or_default(cli.config.as_deref());
    for warning in config.validate() {
        tracing::warn!(event = "config_warning", warning, "configuration warning");
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(config))
        }
        Commands::Scan => run_scan(&config),
        Commands::Probe { path } => run_probe(&path, &config),
        Commands::CheckTools => run_check_tools(&config),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let pool = pool::init_pool(&db_path.to_string_lossy())?;
    Ok(Store::new(pool))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config)?;

    tracing::info!(event = "startup_scan_begin", "running startup scan");
    let summary = scanner::scan(&store, &config);
    tracing::info!(
        event = "startup_scan_complete",
        added = summary.added,
        skipped = summary.skipped,
        errors = summary.errors,
        "startup scan complete"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let config = Arc::new(config);

    let driver = EncoderDriver::new(store.clone(), (*config).clone(), Arc::clone(&stop));
    let driver_state = driver.state_handle();
    let driver_thread = std::thread::spawn(move || driver.run());

    let ctx = AppContext { store, config: Arc::clone(&config), driver_state };
    let app = server::build_router(ctx);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(event = "server_listening", addr = %addr, "control surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(event = "server_shutdown", "shutdown signal received, stopping encoder driver");
    stop.store(true, Ordering::Relaxed);
    let _ = driver_thread.join();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn run_scan(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let summary = scanner::scan(&store, config);
    println!(
        "{}",
        serde_json::json!({ "added": summary.added, "skipped": summary.skipped, "errors": summary.errors })
    );
    Ok(())
}

fn run_probe(path: &std::path::Path, config: &Config) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }
    let metadata = prober::probe_actual(spacesaver_common::EntryId::new(), path, config);
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

fn run_check_tools(config: &Config) -> anyhow::Result<()> {
    let ffmpeg = tools::check_tool_with_arg(&config.ffmpeg_path, "-version");
    let ffprobe = tools::check_tool_with_arg(&config.ffprobe_path, "-version");

    let mut all_ok = true;
    for tool in [&ffmpeg, &ffprobe] {
        let status = if tool.available { "OK" } else { all_ok = false; "MISSING" };
        print!("[{status:>7}] {}", tool.name);
        if let Some(version) = &tool.version {
            print!(" ({version})");
        }
        if let Some(path) = &tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    if !all_ok {
        anyhow::bail!("one or more required tools are missing");
    }
    Ok(())
}
