use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing::{info, warn};

use rsapplyzer::cli::Cli;
use rsapplyzer::report::console::{self, ConfigEcho};
use rsapplyzer::report::{write_results, ConsoleReporter, ScanSummary};
use rsapplyzer::{Fetcher, ReqwestTransport, ScanOrchestrator, SystemResolver, TechDetector};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = rsapplyzer::logging::initialize_logging(cli.verbose) {
        eprintln!("logging disabled: {}", e);
    }

    if !cli.no_banner {
        console::print_banner();
    }

    let targets = match cli.load_targets() {
        None => {
            let _ = Cli::command().print_help();
            return ExitCode::FAILURE;
        }
        Some(Err(e)) => {
            println!("{} {}", "Error:".purple(), e);
            return ExitCode::FAILURE;
        }
        Some(Ok(targets)) if targets.is_empty() => {
            println!("{} No domains to analyze.", "Error:".purple());
            return ExitCode::FAILURE;
        }
        Some(Ok(targets)) => targets,
    };

    match run(&cli, targets).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{} {:#}", "Error:".purple(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, targets: Vec<String>) -> anyhow::Result<()> {
    let scan_config = cli.scan_config();

    console::print_config(&ConfigEcho {
        targets: targets.len(),
        threads: scan_config.concurrency,
        user_agent: scan_config.user_agent,
        timeout_secs: cli.timeout,
        output: cli.output.as_deref().map(|path| (path, cli.format)),
    });

    let detector = TechDetector::new(&cli.rule_config())
        .await
        .context("failed to load technology rules")?;
    info!("{} technologies ready", detector.technology_count());

    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    let fetcher = Fetcher::new(Arc::new(transport), Arc::new(SystemResolver), scan_config.backoff_base);
    let reporter = ConsoleReporter::new(scan_config.suppress_errors);
    let orchestrator = ScanOrchestrator::new(fetcher, Arc::new(detector), scan_config);

    let report = orchestrator.run(&targets, &reporter).await;

    if let Some(path) = &cli.output {
        if report.results.is_empty() {
            warn!("no successful results, {} not written", path.display());
        } else {
            write_results(&report.results, path, cli.format)
                .with_context(|| format!("failed to write {}", path.display()))?;
            console::print_saved(path);
        }
    }

    console::print_summary(&ScanSummary::from_report(&report));
    Ok(())
}
