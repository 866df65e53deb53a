mod cli;
mod db;
mod output;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use drill_core::model::LearningScope;
use services::catalog::Catalog;
use services::oracle::{ChatOracle, OracleConfig};
use services::pacing::{Pacing, Shutdown, ShutdownHandle};
use services::platform::{PlatformClient, PlatformConfig};
use services::session::{SessionDriver, SessionOptions, StopReason};

use crate::cli::{ArgsError, Cli, LogFormat};

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(false)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .init(),
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let platform_config = PlatformConfig::new(cli.platform_token.clone())
        .with_base_url(cli.platform_url.clone())
        .with_culture(cli.culture.clone())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let platform = Arc::new(PlatformClient::new(platform_config)?);

    if cli.info {
        let catalog = Catalog::fetch(platform.as_ref()).await?;
        print!("{}", output::render_catalog(&catalog.rows(), true));
        if let Some(raw) = &cli.db {
            let storage = db::open(raw).await?;
            catalog.persist(storage.catalog.as_ref()).await?;
            info!(db = %raw, "catalog stored");
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Validate everything before touching the network or the database.
    let (Some(subject), Some(course), Some(module)) = (cli.subject, cli.course, cli.module) else {
        return Err(ArgsError::MissingScope.into());
    };
    let scope = LearningScope::new(subject, course, module);
    let oracle = if cli.no_llm {
        None
    } else {
        let token = cli
            .llm_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ArgsError::MissingLlmToken)?;
        let config = OracleConfig::new(token, cli.model).with_base_url(cli.llm_url.clone());
        Some(ChatOracle::new(config)?)
    };
    let options = SessionOptions::default()
        .with_cache(cli.db.is_some())
        .with_llm(!cli.no_llm)
        .with_mastery_cap(cli.till_mastery)
        .with_pacing(Pacing::new(cli.min_delay, cli.max_delay)?);

    let mut driver = SessionDriver::new(platform, scope, options);
    if let Some(oracle) = oracle {
        info!(model = %oracle.model(), "answers come from the completion model");
        driver = driver.with_oracle(Arc::new(oracle));
    } else {
        info!("answers are picked at random");
    }
    if let Some(raw) = &cli.db {
        let storage = db::open(raw).await?;
        driver = driver.with_cache(Arc::clone(&storage.answers));
        driver.prepare(Some(storage.catalog.as_ref())).await?;
    }

    let (handle, shutdown) = Shutdown::channel();
    tokio::spawn(forward_signals(handle));

    let report = driver.run(&shutdown).await;
    info!(
        correct = report.stats.correct,
        wrong = report.stats.wrong,
        lessons = report.stats.lessons_completed,
        cache_hits = report.stats.cache_hits,
        "final stats"
    );
    eprintln!("{}", output::render_stats(&report.stats));

    match report.stop {
        StopReason::Failed(err) => {
            error!(error = %err, "session failed");
            Ok(ExitCode::FAILURE)
        }
        StopReason::MasteryReached(mastery) => {
            info!(%mastery, "mastery cap reached");
            Ok(ExitCode::SUCCESS)
        }
        StopReason::NoMoreActivity => {
            warn!("platform has no more activity for this module");
            Ok(ExitCode::SUCCESS)
        }
        StopReason::Cancelled => {
            info!("stopped by signal");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn forward_signals(handle: ShutdownHandle) {
    wait_for_signal().await;
    warn!("shutdown requested, finishing the current question");
    handle.trigger();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "cannot listen for SIGTERM, only Ctrl-C will stop the session");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            // At this layer (binary glue), reporting once is fine.
            error!("{err}");
            ExitCode::from(2)
        }
    }
}
