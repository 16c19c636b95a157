//! complyscan command-line entry point
//!
//! Exit status: 0 on a completed scan, 1 when a blocking CI run leaves
//! unfixed critical issues, 2 on configuration errors.

use anyhow::Context;
use clap::Parser;
use complyscan::cache::{ContentAddressedCache, HttpBlobStore, LocalCacheFile, RemoteStore};
use complyscan::config::{self, ConfigError, ScannerConfig};
use complyscan::context::{HttpKnowledgeBase, KnowledgeBase, RuleContextProvider, StaticKnowledgeBase};
use complyscan::{Cli, OracleClient, OsvFeed, ScanOptions, ScanOrchestrator, ScanReport};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    config::load_env();
    init_tracing();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    match run(&cli, &config).await {
        Ok(code) => code,
        Err(e) if e.downcast_ref::<ConfigError>().is_some() => {
            error!(error = %e, "invalid configuration");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("scan failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ScannerConfig, ConfigError> {
    let mut config = ScannerConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn context_provider(config: &ScannerConfig) -> Option<RuleContextProvider> {
    let knowledge: Box<dyn KnowledgeBase> = match &config.knowledge_endpoint {
        Some(endpoint) => Box::new(HttpKnowledgeBase::new(endpoint)),
        None if config.builtin_context => Box::new(StaticKnowledgeBase::new()),
        None => return None,
    };
    Some(
        RuleContextProvider::new(knowledge)
            .with_limits(config.context_ceiling, config.max_context_chunks),
    )
}

async fn run(cli: &Cli, config: &ScannerConfig) -> anyhow::Result<ExitCode> {
    let oracle = OracleClient::from_config(config)?;

    let remote: Option<Box<dyn RemoteStore>> = config
        .remote_cache_url
        .as_deref()
        .map(|url| Box::new(HttpBlobStore::new(url)) as Box<dyn RemoteStore>);
    let retention = config.retention_days.map(chrono::Duration::days);
    let cache = ContentAddressedCache::load(
        Some(LocalCacheFile::new(&config.cache_path)),
        remote,
        retention,
    )
    .await;

    let mut orchestrator = ScanOrchestrator::new(ScanOptions::from(config), cache, Box::new(oracle));
    if let Some(provider) = context_provider(config) {
        orchestrator = orchestrator.with_context(provider);
    }
    if let Some(endpoint) = &config.advisory_endpoint {
        orchestrator = orchestrator.with_advisory(Box::new(OsvFeed::new(endpoint)));
    }

    let report = orchestrator.run(&cli.root).await?;
    report
        .write_to(&config.report_path)
        .context("Failed to save compliance report")?;
    info!(path = %config.report_path.display(), "report written");

    print_summary(&report);
    let code = report.exit_code(config.ci_blocking, config.auto_fix);
    Ok(ExitCode::from(code as u8))
}

fn print_summary(report: &ScanReport) {
    println!("Files scanned:   {} ({} from cache)", report.files_scanned, report.cache_hits);
    println!(
        "Issues:          {} (critical {}, high {}, medium {}, low {})",
        report.total_issues,
        report.by_severity.critical,
        report.by_severity.high,
        report.by_severity.medium,
        report.by_severity.low
    );
    if report.fixed > 0 {
        println!("Files fixed:     {}", report.fixed);
    }
    if report.vulnerability_summary.total > 0 {
        println!("Vulnerabilities: {}", report.vulnerability_summary.total);
    }
    println!("AI calls:        {} (${:.4})", report.ai_calls, report.cost);
}
