//! ACI fabric documentation CLI
//!
//! Logs in to an APIC, harvests every selected tenant and writes the JSON
//! snapshot plus the Markdown report.
//!
//! ## Usage
//!
//! ```bash
//! aci_docgen --apic https://apic.example.net --user admin --password '...'
//! APIC_URL=... APIC_USER=... APIC_PASSWORD=... aci_docgen --out docs
//! aci_docgen --sections sections.yml --timeout-secs 60 --debug
//! ```

use aci_docgen::apic::ApicClient;
use aci_docgen::config::{ApicConfig, SectionsConfig};
use aci_docgen::pipeline::Harvester;
use aci_docgen::render::{write_snapshot, MarkdownRenderer};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "aci_docgen")]
#[command(version)]
#[command(about = "Document ACI tenant configuration from an APIC")]
struct Args {
    /// APIC base URL, e.g. https://apic.example.net
    #[arg(long, env = "APIC_URL")]
    apic: String,

    /// APIC user
    #[arg(long, env = "APIC_USER")]
    user: String,

    /// APIC password
    #[arg(long, env = "APIC_PASSWORD", hide_env_values = true)]
    password: String,

    /// Output directory
    #[arg(long, short = 'o', default_value = "out")]
    out: PathBuf,

    /// Section toggles (YAML)
    #[arg(long, short = 's', default_value = "sections.yml")]
    sections: PathBuf,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// HTTP and per-fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Debug logging
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("harvest interrupted; partial output written");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `false` when the harvest was interrupted.
async fn run(args: Args) -> Result<bool> {
    let sections = SectionsConfig::load(&args.sections)
        .with_context(|| format!("Failed to load sections from {}", args.sections.display()))?;
    if sections.enabled().is_empty() {
        tracing::warn!(path = %args.sections.display(), "No sections enabled");
    }

    let config = ApicConfig::new(&args.apic, args.user, args.password)
        .context("Invalid APIC settings")?
        .with_insecure(args.insecure)
        .with_timeout_secs(args.timeout_secs);
    let fetch_timeout = config.timeout();

    let client = ApicClient::connect(config)
        .await
        .context("Failed to log in to APIC")?;

    let cancel = CancellationToken::new();
    let harvester = Harvester::new(client, sections)
        .with_fetch_timeout(fetch_timeout)
        .with_cancellation(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current fetch");
            cancel.cancel();
        }
    });

    let document = harvester.run().await.context("Harvest failed")?;

    let snapshot = write_snapshot(&document, &args.out).context("Failed to write snapshot")?;
    let renderer = MarkdownRenderer::new().context("Failed to load report templates")?;
    let pages = renderer
        .write(&document, &args.out)
        .context("Failed to write Markdown report")?;

    for tenant in document.failed_tenants() {
        for (section, error) in &tenant.diagnostics.failed_sections {
            tracing::warn!(tenant = %tenant.name, section = %section, error = %error, "Section not harvested");
        }
        for (domain, error) in &tenant.diagnostics.failed_domains {
            tracing::warn!(tenant = %tenant.name, domain = %domain, error = %error, "VMM domain not enriched");
        }
    }
    println!(
        "{} tenants -> {} ({} pages)",
        document.tenants.len(),
        snapshot.display(),
        pages.len()
    );
    Ok(!document.interrupted)
}
