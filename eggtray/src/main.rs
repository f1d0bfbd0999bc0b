//! eggtray - profile aggregation and validation
//!
//! Commands:
//! - `build`: load descriptors, enrich from GitHub, validate, write the
//!   listing and optionally reconcile "not ready" reports
//! - `report`: reconcile reports from an existing listing
//! - `check`: answer a check request filed as an issue
//!
//! Per-profile problems never fail a command; only systemic failures
//! (authentication, configuration, tracker unavailable, I/O) exit non-zero.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use eggtray::artifact::{build_listing, read_listing, write_listing};
use eggtray::check::{issue_number_from_event, run_url, CheckOutcome, CheckRequest, Checker};
use eggtray::config::resolve_github_auth;
use eggtray::enrichment::{CachedSource, EnrichmentSource, GitHubClient};
use eggtray::github::GitHubHttp;
use eggtray::issues::{GitHubTracker, IssueState, ReportSubject, Reporter};
use eggtray::loader::load_descriptors;
use eggtray::{Pipeline, Validator};
use eggtray_common::config::{load_config, parse_owner_repo, TomlConfig};
use eggtray_common::Identity;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "eggtray")]
#[command(about = "Aggregate, validate and publish member profiles")]
#[command(version)]
struct Args {
    /// Configuration file (overrides EGGTRAY_CONFIG and default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the profile listing
    Build {
        /// Directory of <handle>.yml descriptors
        #[arg(default_value = "profiles")]
        profiles_dir: PathBuf,

        /// Directory the listing is written to
        #[arg(default_value = "output")]
        output_dir: PathBuf,

        /// Reconcile "not ready" reports in the issue tracker
        #[arg(long)]
        report: bool,

        /// Ignore the enrichment cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Reconcile reports from an existing listing
    Report {
        #[arg(default_value = "output/profiles.json")]
        artifact: PathBuf,
    },

    /// Check the profile named in a check issue
    Check {
        /// Issue number
        issue: Option<u64>,

        /// GitHub Actions event payload to take the issue number from
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event: Option<PathBuf>,

        /// Issue states that may be checked
        #[arg(long = "state", value_enum, default_values_t = [StateArg::Open])]
        states: Vec<StateArg>,

        /// CI run to link in comments
        #[arg(long, env = "GITHUB_RUN_ID")]
        run_id: Option<u64>,

        /// Directory of <handle>.yml descriptors
        #[arg(long, default_value = "profiles")]
        profiles_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StateArg {
    Open,
    Closed,
}

impl From<StateArg> for IssueState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Open => IssueState::Open,
            StateArg::Closed => IssueState::Closed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the default log level
    let config = load_config(args.config.as_deref());

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        let level = config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting eggtray v{}", env!("CARGO_PKG_VERSION"));

    let config = config.context("Failed to load configuration")?;
    info!(environment = ?config.environment, "Configuration loaded");

    let result = match args.command {
        Command::Build {
            profiles_dir,
            output_dir,
            report,
            no_cache,
        } => build(&config, &profiles_dir, &output_dir, report, no_cache).await,
        Command::Report { artifact } => report(&config, &artifact).await,
        Command::Check {
            issue,
            event,
            states,
            run_id,
            profiles_dir,
        } => {
            check(
                &config,
                issue,
                event.as_deref(),
                states.into_iter().map(IssueState::from).collect(),
                run_id,
                &profiles_dir,
            )
            .await
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn github_http(config: &TomlConfig) -> Result<Arc<GitHubHttp>> {
    let auth = resolve_github_auth(config)?;
    let http = GitHubHttp::new(&config.github, auth).context("Failed to create GitHub client")?;
    Ok(Arc::new(http))
}

/// Repository holding reports and check issues
///
/// `reports.repository` wins; in CI the current repository is used otherwise.
fn tracker_repository(config: &TomlConfig) -> Result<(String, String)> {
    if config.reports.repository.is_some() {
        return Ok(config.reports.owner_repo()?);
    }
    match std::env::var("GITHUB_REPOSITORY") {
        Ok(slug) => Ok(parse_owner_repo(&slug)?),
        Err(_) => Ok(config.reports.owner_repo()?),
    }
}

fn reporter(config: &TomlConfig, http: Arc<GitHubHttp>) -> Result<Reporter> {
    let (owner, repo) = tracker_repository(config)?;
    info!(repository = %format!("{}/{}", owner, repo), label = %config.reports.label, "Reporting to issue tracker");
    let tracker = Arc::new(GitHubTracker::new(http, owner, repo));
    Ok(Reporter::new(tracker, config.reports.label.clone(), config.reports.concurrency))
}

async fn reconcile(reporter: &Reporter, subjects: &[ReportSubject]) -> Result<BTreeMap<Identity, String>> {
    let outcome = reporter
        .reconcile_all(subjects)
        .await
        .context("Failed to list open reports")?;
    for (identity, err) in &outcome.failures {
        warn!(identity = %identity, error = %err, "Report not reconciled");
    }
    info!(
        operations = outcome.operations,
        failures = outcome.failures.len(),
        "Reports reconciled"
    );
    Ok(outcome.report_urls)
}

async fn build(
    config: &TomlConfig,
    profiles_dir: &Path,
    output_dir: &Path,
    report: bool,
    no_cache: bool,
) -> Result<()> {
    let as_of = Utc::now();
    let http = github_http(config)?;

    let client = GitHubClient::new(http.clone());
    let source: Arc<dyn EnrichmentSource> = if config.cache.enabled && !no_cache {
        info!(dir = %config.cache.dir.display(), hours = config.cache.hours, "Enrichment cache enabled");
        Arc::new(CachedSource::new(client, config.cache.dir.clone(), config.cache.hours))
    } else {
        Arc::new(client)
    };

    let loaded = load_descriptors(profiles_dir)?;
    if !loaded.errors.is_empty() {
        warn!(
            errors = loaded.errors.len(),
            "Some descriptor files were skipped"
        );
    }

    let pipeline = Pipeline::new(source, Validator::standard(config.validation.clone()))
        .with_concurrency(config.github.concurrency)
        .with_max_projects(config.artifact.max_projects);
    let batch = pipeline.run(&loaded.descriptors, as_of).await?;

    // The listing lands before any tracker write
    let mut listing = build_listing(&batch.profiles, &BTreeMap::new(), config.artifact.include);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(&config.artifact.file_name);
    write_listing(&listing, &path).with_context(|| format!("Failed to write {}", path.display()))?;

    if report {
        let subjects: Vec<ReportSubject> = batch.profiles.iter().map(ReportSubject::from).collect();
        let report_urls = reconcile(&reporter(config, http)?, &subjects).await?;
        listing.apply_report_urls(&report_urls);
        write_listing(&listing, &path).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(
        path = %path.display(),
        listed = listing.count,
        ready = batch.ready_count(),
        degraded = batch.degraded.len(),
        load_errors = loaded.errors.len(),
        "Listing written"
    );
    Ok(())
}

async fn report(config: &TomlConfig, artifact: &Path) -> Result<()> {
    let mut listing = read_listing(artifact).with_context(|| format!("Failed to read {}", artifact.display()))?;
    info!(path = %artifact.display(), entries = listing.count, "Listing loaded");

    let http = github_http(config)?;
    let subjects: Vec<ReportSubject> = listing.items.iter().map(ReportSubject::from).collect();
    let report_urls = reconcile(&reporter(config, http)?, &subjects).await?;

    listing.apply_report_urls(&report_urls);
    write_listing(&listing, artifact).with_context(|| format!("Failed to write {}", artifact.display()))?;
    info!(path = %artifact.display(), reports = report_urls.len(), "Report links written");
    Ok(())
}

async fn check(
    config: &TomlConfig,
    issue: Option<u64>,
    event: Option<&Path>,
    states: Vec<IssueState>,
    run_id: Option<u64>,
    profiles_dir: &Path,
) -> Result<()> {
    let issue = match (issue, event) {
        (Some(number), _) => number,
        (None, Some(path)) => issue_number_from_event(path)?,
        (None, None) => anyhow::bail!("Either an issue number or --event is required"),
    };

    let http = github_http(config)?;
    let (owner, repo) = tracker_repository(config)?;
    let run_link = run_id.map(|id| run_url(&format!("{}/{}", owner, repo), id));

    let tracker = Arc::new(GitHubTracker::new(http.clone(), owner, repo));
    let checker = Checker::new(
        tracker,
        Arc::new(GitHubClient::new(http)),
        config.validation.clone(),
        config.reports.check_label.clone(),
    )
    .with_profiles_dir(profiles_dir)
    .with_max_projects(config.artifact.max_projects);

    let request = CheckRequest {
        issue,
        states,
        run_url: run_link,
    };
    match checker.run(&request, Utc::now()).await? {
        CheckOutcome::Skipped { reason } => info!(reason = %reason, "Check skipped"),
        CheckOutcome::AccountMissing { identity } => {
            info!(identity = %identity, "Check finished: account does not exist")
        }
        CheckOutcome::Checked { identity, state, findings } => info!(
            identity = %identity,
            state = %state,
            findings = findings.len(),
            "Check finished"
        ),
    }
    Ok(())
}
