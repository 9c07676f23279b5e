use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ldtest_caching::ResultCache;
use ldtest_config::{ConfigLoader, LdtestConfig};
use ldtest_core::{ConfigOverrides, HttpMethod, LoadTestConfig, Target};
use ldtest_engine::{rollup_by_host, Engine, RunObserver};
use ldtest_http::HttpExecutorFactory;
use ldtest_logging::{init_logging_from_config, init_simple_tracing};
use ldtest_rest_api::{create_rest_app, AppConfig, LoadContext};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod cli;
mod ingest;
mod progress;
mod report;

use cli::{Cli, Commands, ConfigCommands, LoadArgs};
use progress::ProgressObserver;

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<LdtestConfig> {
    ConfigLoader::new().load(config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load configuration from {:?}", path),
        None => "Failed to load configuration from environment".to_string(),
    })
}

/// Run a batch load test and print the report
async fn load_command(config: &LdtestConfig, args: LoadArgs) -> Result<()> {
    let targets = match (&args.url, &args.csv) {
        (Some(url), _) => ingest::target_from_arg(url)?,
        (None, Some(path)) => ingest::targets_from_csv(path)?,
        (None, None) => anyhow::bail!("Either --url or --csv is required"),
    };
    let targets: Vec<Target> = targets
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let base = LoadTestConfig::try_from(&config.load_test)
        .context("Invalid load_test configuration")?;
    let method = args
        .method
        .as_deref()
        .map(str::parse::<HttpMethod>)
        .transpose()
        .context("Invalid --method")?;
    let load_config = ConfigOverrides {
        method,
        ..Default::default()
    }
    .apply(&base);

    let observer = Arc::new(if args.no_progress {
        ProgressObserver::hidden(&targets)
    } else {
        ProgressObserver::new(&targets)
    });

    let cancel = CancellationToken::new();
    let budget = args.duration.map(Duration::from_secs);
    let stop_conditions = spawn_stop_conditions(cancel.clone(), budget);

    let engine = Engine::new(load_config, Arc::new(HttpExecutorFactory))
        .with_observer(observer.clone() as Arc<dyn RunObserver>);
    info!(
        "Load testing {} targets with {} (timeout {:?})",
        targets.len(),
        engine.config().method,
        engine.config().timeout
    );
    let run = engine.run(&targets, &cancel).await;

    // Release the signal and deadline watchers
    cancel.cancel();
    if let Err(e) = stop_conditions.await {
        debug!("Stop condition watcher ended abnormally: {}", e);
    }

    let report = run.context("Load run failed")?;
    if report.was_cancelled() {
        warn!("Run was cancelled; the report holds partial results");
    }

    let rendered = if args.group_by_host {
        report::render_hosts(&rollup_by_host(&report.stats))
    } else {
        report::render_targets(&report.stats)
    };
    observer.suspend(|| print!("{}", rendered));

    Ok(())
}

/// Cancel `cancel` on Ctrl-C or once `budget` elapses
fn spawn_stop_conditions(cancel: CancellationToken, budget: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interrupted() => warn!("Interrupted, stopping the run"),
            _ = deadline(budget) => info!("Run duration of {:?} elapsed", budget),
        }
        cancel.cancel();
    })
}

async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn deadline(budget: Option<Duration>) {
    match budget {
        Some(budget) => tokio::time::sleep(budget).await,
        None => std::future::pending().await,
    }
}

/// Start the load test service
async fn serve_command(config: LdtestConfig) -> Result<()> {
    let cache = Arc::new(ResultCache::new());
    let sweeper = cache
        .spawn_sweeper(config.cache.sweep_interval)
        .context("Failed to start the cache sweeper")?;

    let shutdown = CancellationToken::new();
    let context = LoadContext::from_config(&config, cache.clone(), Arc::new(HttpExecutorFactory))
        .context("Invalid load_test configuration")?
        .with_shutdown(shutdown.clone());
    let app = create_rest_app(context, AppConfig::from_config(&config));

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on: {}", addr);

    let signal_token = shutdown.clone();
    let shutdown_signal = async move {
        interrupted().await;
        info!("Shutdown requested, cancelling running load tests");
        signal_token.cancel();
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await;

    shutdown.cancel();
    cache.close();
    if let Err(e) = sweeper.await {
        warn!("Cache sweeper ended abnormally: {}", e);
    }

    match served {
        Ok(()) => {
            info!("Server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e).context("Server error")
        }
    }
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        anyhow::bail!("Configuration file not found: {:?}", config_file);
    }

    match load_config(Some(config_file)) {
        Ok(_) => {
            println!("Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, LdtestConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("Configuration generated at: {:?}", output);
    println!("Validate with: ldtest config validate --config-file {:?}", output);
    Ok(())
}

/// Handle configuration display
fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;

    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml = serde_yaml::to_string(&config).context("Failed to serialize to YAML")?;
            println!("{}", yaml);
        }
        "json" => {
            let json =
                serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        _ => anyhow::bail!("Unknown output format: {}. Valid formats: yaml, json", format),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when the configuration itself is broken
    if let Some(Commands::Config { config_cmd }) = &cli.command {
        init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
        return match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => handle_config_generate(output, *force),
            ConfigCommands::Show { format } => handle_config_show(cli.config.as_ref(), format),
        };
    }

    let config = load_config(cli.config.as_ref())?;
    init_logging_from_config(&config.logging, cli.log_level.as_deref())
        .context("Failed to initialize logging")?;

    match cli.command {
        Some(Commands::Load(args)) => load_command(&config, args).await,
        Some(Commands::Serve) => serve_command(config).await,
        Some(Commands::Config { .. }) => Ok(()),
        None => {
            Cli::command().print_help().context("Failed to print help")?;
            Ok(())
        }
    }
}
