//! CLI entry point for the analytics importer.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use serde::Serialize;
use tracing::{debug, info};
use x_insights::metrics::TOP_POSTS_LIMIT;
use x_insights::utils::{format_count, truncate_text};
use x_insights::{
    AnalyticsState, BatchReport, Dashboard, HeatmapMetric, IngestConfig, IngestStage, Ingestor,
    JsonFileStore, UploadFile, export_snapshot,
};

/// CLI-compatible heatmap metric enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliHeatmapMetric {
    /// New follows per 1,000 impressions
    FollowsPer1k,
    /// Engagements per impression
    EngagementRate,
    /// Number of posts
    Frequency,
}

impl From<CliHeatmapMetric> for HeatmapMetric {
    fn from(cli: CliHeatmapMetric) -> Self {
        match cli {
            CliHeatmapMetric::FollowsPer1k => HeatmapMetric::FollowsPer1k,
            CliHeatmapMetric::EngagementRate => HeatmapMetric::EngagementRate,
            CliHeatmapMetric::Frequency => HeatmapMetric::Frequency,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Social-media analytics CSV importer",
    long_about = "Imports content and overview analytics exports, reconciles their headers \
                  and prints the derived insights.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  X_INSIGHTS_MAX_FILE_SIZE_MB   Override --max-file-size-mb\n  \
                  X_INSIGHTS_MAX_ROWS           Override --max-rows\n  \
                  X_INSIGHTS_MAX_FILES          Override --max-files\n  \
                  X_INSIGHTS_STATE_FILE         Override --state-file\n\n\
                  EXAMPLES:\n  \
                  # Import both exports\n  \
                  x-insights -i content.csv -i overview.csv\n\n  \
                  # Explore the demo dataset as JSON\n  \
                  x-insights --demo --json\n\n  \
                  # Keep the loaded rows between runs\n  \
                  x-insights -i content.csv --state-file state.json"
)]
struct Args {
    /// CSV file to import (repeatable)
    #[arg(short, long = "input", required_unless_present_any = ["demo", "state_file"])]
    inputs: Vec<PathBuf>,

    /// Maximum accepted file size in megabytes
    #[arg(long, env = "X_INSIGHTS_MAX_FILE_SIZE_MB", default_value = "12")]
    max_file_size_mb: u64,

    /// Maximum data rows kept per file
    #[arg(long, env = "X_INSIGHTS_MAX_ROWS", default_value = "120000")]
    max_rows: usize,

    /// Maximum files processed per run
    #[arg(long, env = "X_INSIGHTS_MAX_FILES", default_value = "6")]
    max_files: usize,

    /// Metric for the posting-time heatmap
    ///
    /// Defaults to follows per 1k when the content file has a follows
    /// column, then engagement rate, then posting volume.
    #[arg(long, value_enum)]
    heatmap_metric: Option<CliHeatmapMetric>,

    /// Load the built-in demo dataset instead of files
    #[arg(long, conflicts_with = "inputs")]
    demo: bool,

    /// Persist the loaded state as JSON at this path
    ///
    /// The stored state is loaded first; inputs replace only the record
    /// kind they contain. Without inputs or --demo, the stored state is
    /// reported on as-is.
    #[arg(long, env = "X_INSIGHTS_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Write normalized content.csv / overview.csv to this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON document.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: Option<&'a BatchReport>,
    content_file_name: &'a str,
    overview_file_name: &'a str,
    dashboard: &'a Dashboard,
    exported: Vec<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env first so clap's env fallbacks can see it
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = IngestConfig::builder()
        .max_file_size_mb(args.max_file_size_mb)
        .max_rows_per_file(args.max_rows)
        .max_files_per_batch(args.max_files)
        .build()?;

    // A stored snapshot is the starting point; inputs replace one kind at a time
    let state = match &args.state_file {
        Some(path) => AnalyticsState::open(JsonFileStore::new(path))?,
        None => AnalyticsState::new(),
    };

    let report = if args.demo {
        state.load_demo();
        None
    } else if !args.inputs.is_empty() {
        Some(run_ingest(config, &args.inputs, &state))
    } else {
        if !state.is_empty() {
            info!("Using stored analytics state");
        }
        None
    };

    if state.is_empty() {
        if let Some(report) = &report
            && !args.json
        {
            print_diagnostics(report);
        }
        bail!("No analytics data could be loaded");
    }

    let snapshot = state.snapshot();
    let dashboard = Dashboard::compute(&snapshot, args.heatmap_metric.map(Into::into));

    let exported = match &args.export_dir {
        Some(dir) => export_snapshot(&snapshot, dir)?,
        None => Vec::new(),
    };

    if args.json {
        let output = JsonOutput {
            report: report.as_ref(),
            content_file_name: &snapshot.content_file_name,
            overview_file_name: &snapshot.overview_file_name,
            dashboard: &dashboard,
            exported,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(report) = &report {
        print_diagnostics(report);
    }
    print_human_readable_summary(&snapshot, &dashboard, &exported);
    Ok(())
}

fn run_ingest(config: IngestConfig, inputs: &[PathBuf], state: &AnalyticsState) -> BatchReport {
    let files: Vec<UploadFile> = inputs.iter().cloned().map(UploadFile::from_path).collect();
    Ingestor::new(config)
        .on_progress(|update| match update.stage {
            IngestStage::Parsing => info!("{}", update.message),
            _ => debug!("[{}] {}", update.stage.display_name(), update.message),
        })
        .ingest(files, state)
}

/// Print every diagnostic in display order, then the status line.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn print_diagnostics(report: &BatchReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("IMPORT");
    println!("{}", "=".repeat(80));
    for message in report.diagnostics() {
        println!("  [{:<7}] {}", message.severity.as_str(), message.text);
    }
    println!();
    println!("{}", report.status);
}

/// Print a human-readable summary of the loaded analytics.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(
    snapshot: &x_insights::AnalyticsSnapshot,
    dashboard: &Dashboard,
    exported: &[PathBuf],
) {
    println!();
    println!("{}", "=".repeat(80));
    println!("INSIGHTS");
    println!("{}", "=".repeat(80));
    println!();

    let content_name = if snapshot.content_file_name.is_empty() {
        "not loaded"
    } else {
        &snapshot.content_file_name
    };
    let overview_name = if snapshot.overview_file_name.is_empty() {
        "not loaded"
    } else {
        &snapshot.overview_file_name
    };
    println!(
        "Content:  {} ({} rows)",
        content_name,
        format_count(snapshot.content_rows.len())
    );
    println!(
        "Overview: {} ({} rows)",
        overview_name,
        format_count(snapshot.overview_rows.len())
    );
    println!();

    let totals = &dashboard.totals;
    println!("Headline:");
    println!("  Total impressions: {}", totals.impressions.round());
    println!("  Total follows: {}", totals.follows.round());
    println!(
        "  Best engagement rate: {:.1}%",
        totals.best_engagement_rate * 100.0
    );
    println!("  Best follows / 1k: {:.2}", totals.best_follows_per_1k);
    println!();

    println!("Takeaways:");
    for (card, takeaway) in &dashboard.takeaways {
        println!("  {:<24} {}", card.title(), takeaway);
    }
    println!();

    if !dashboard.top_posts.is_empty() {
        println!("Top posts by follows / 1k:");
        for post in dashboard.top_posts.iter().take(TOP_POSTS_LIMIT) {
            println!(
                "  {:>7.2}  {}",
                post.follows_per_1k,
                truncate_text(&post.text, 60)
            );
        }
        println!();
    }

    if let Some(slot) = dashboard.heatmap.best_slot() {
        println!(
            "Best posting slot ({}): {} {:02}:00 = {}",
            dashboard.heatmap.metric.label(),
            slot.day_label(),
            slot.hour,
            dashboard.heatmap.metric.format_value(slot.value)
        );
        println!();
    }

    if !snapshot.overview_rows.is_empty() {
        let streaks = &dashboard.streaks;
        println!("Consistency:");
        println!(
            "  Current streak: {} days, longest: {} days",
            streaks.current_streak, streaks.longest_streak
        );
        println!(
            "  Active days: {}/{} ({}%)",
            streaks.active_days, streaks.total_days, streaks.consistency
        );
        println!();

        println!("Viral days (>= 5x median of {}):", dashboard.viral.median.round());
        if dashboard.viral.days.is_empty() {
            println!("  none");
        }
        for day in &dashboard.viral.days {
            println!(
                "  {}  {} impressions ({}x)",
                day.row.date,
                day.row.impressions.round(),
                day.multiplier
            );
        }
        println!();

        if let Some(funnel) = &dashboard.funnel {
            println!("Funnel:");
            println!(
                "  Impressions -> visits: {:.2}% ({:.1} per 1k)",
                funnel.impression_to_visit_rate, funnel.visits_per_1k
            );
            println!(
                "  Visits -> follows: {:.2}% ({:.2} per 1k impressions)",
                funnel.visit_to_follow_rate, funnel.follows_per_1k
            );
            println!();
        }

        if let Some(efficiency) = &dashboard.efficiency {
            println!(
                "Engagement efficiency: {:.2}% average, {}",
                efficiency.overall_average,
                efficiency.direction.label()
            );
        }
        if dashboard.follower_growth.has_data {
            println!(
                "Net follower growth: {} ({} gained, {} lost)",
                dashboard.follower_growth.net_growth.round(),
                dashboard.follower_growth.total_gained.round(),
                dashboard.follower_growth.total_lost.round()
            );
        }
        if let Some(frequency) = &dashboard.post_frequency {
            println!("Posting frequency: {}", frequency.insight);
        }
        if let Some(dominant) = &dashboard.engagement_mix.dominant {
            println!(
                "Dominant engagement: {} ({:.1}%)",
                dominant.label, dominant.share
            );
        }
        println!();
    }

    for path in exported {
        println!("Exported: {}", path.display());
    }
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
