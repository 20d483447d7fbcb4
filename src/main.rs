use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod analysis;
mod db;
mod grading;
mod models;
mod progress;
mod remarks;
mod report;

use models::{RawResults, ResultsBySessionAndTerm, StudentProfile};
use remarks::RemarkPickers;

#[derive(Parser)]
#[command(name = "result-analysis")]
#[command(about = "Term result analysis for the school result portal", long_about = None)]
struct Cli {
    /// Give up on the results database after this many seconds
    #[arg(long, global = true, default_value_t = 30)]
    fetch_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample student with three terms of results
    Seed,
    /// Import result rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compare the two most recent terms
    #[command(group(
        ArgGroup::new("source")
            .args(["student", "input"])
            .required(true)
            .multiple(false)
    ))]
    Analyze {
        /// Admission number of a student in the results database
        #[arg(long)]
        student: Option<String>,
        /// Results JSON exported from the portal API
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show term averages and subject history
    #[command(group(
        ArgGroup::new("source")
            .args(["student", "input"])
            .required(true)
            .multiple(false)
    ))]
    Progress {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown report card with analysis
    #[command(group(
        ArgGroup::new("source")
            .args(["student", "input"])
            .required(true)
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        input: Option<PathBuf>,
        /// Seed for remark selection; remarks rotate in order when omitted
        #[arg(long)]
        remark_seed: Option<u64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

struct StudentResults {
    profile: Option<StudentProfile>,
    results: ResultsBySessionAndTerm,
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the results Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    log::info!("connected to results database");
    Ok(pool)
}

fn load_input(path: &Path) -> anyhow::Result<ResultsBySessionAndTerm> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: RawResults = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a results document", path.display()))?;
    Ok(grading::normalize_results(&raw))
}

async fn load_results(
    student: Option<&str>,
    input: Option<&Path>,
    timeout_secs: u64,
) -> anyhow::Result<StudentResults> {
    if let Some(path) = input {
        return Ok(StudentResults {
            profile: None,
            results: load_input(path)?,
        });
    }

    let admission_number = student.context("either --student or --input is required")?;
    let fetch = async {
        let pool = connect().await?;
        let profile = db::fetch_student(&pool, admission_number).await?;
        let results = db::fetch_results(&pool, admission_number).await?;
        anyhow::Ok(StudentResults {
            profile: Some(profile),
            results,
        })
    };

    with_fetch_timeout(timeout_secs, fetch).await
}

async fn with_fetch_timeout<F, T>(timeout_secs: u64, fetch: F) -> anyhow::Result<T>
where
    F: std::future::Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(Duration::from_secs(timeout_secs), fetch)
        .await
        .with_context(|| format!("results fetch timed out after {timeout_secs}s"))?
}

fn print_analysis(loaded: &StudentResults) {
    let analysis = analysis::analyze_results(&loaded.results);
    let overall = &analysis.overall;

    if let Some(profile) = &loaded.profile {
        println!("{} ({})", profile.full_name, profile.admission_number);
    }
    match (&analysis.current_term, &analysis.previous_term) {
        (Some(current), Some(previous)) => println!("{current} compared with {previous}"),
        (Some(current), None) => println!("{current} (no earlier term to compare)"),
        _ => {
            println!("No results found for this student.");
            return;
        }
    }
    println!("Overall trend: {}", overall.overall_trend.label());

    for (name, subject) in &analysis.subjects {
        let Some(current) = &subject.current_term else {
            continue;
        };
        match (&subject.previous_term, subject.improvement) {
            (Some(previous), Some(delta)) => println!(
                "- {name}: {} ({}) from {} ({}), {delta:+}",
                current.total, current.grade, previous.total, previous.grade
            ),
            _ => println!("- {name}: {} ({}) new this term", current.total, current.grade),
        }
    }

    println!("Strengths: {}", overall.strengths.join(", "));
    println!("Needs work: {}", overall.weaknesses.join(", "));
    println!("Concerns: {}", overall.concerns.join(", "));
}

fn print_progress(loaded: &StudentResults) {
    let timeline = progress::progress_timeline(&loaded.results);
    if timeline.is_empty() {
        println!("No results found for this student.");
        return;
    }

    println!("Term averages:");
    for point in &timeline {
        match point.change {
            Some(change) => println!("- {}: {:.2} ({change:+.2})", point.term, point.average),
            None => println!("- {}: {:.2}", point.term, point.average),
        }
    }

    println!("Subjects:");
    for (name, latest) in progress::latest_subjects(&loaded.results) {
        println!("- {name}: {} ({}) in {}", latest.total, latest.grade, latest.term);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} results from {}.", csv.display());
        }
        Commands::Analyze {
            student,
            input,
            format,
        } => {
            let loaded =
                load_results(student.as_deref(), input.as_deref(), cli.fetch_timeout_secs).await?;
            match format {
                OutputFormat::Text => print_analysis(&loaded),
                OutputFormat::Json => {
                    let analysis = analysis::analyze_results(&loaded.results);
                    println!("{}", serde_json::to_string_pretty(&analysis)?);
                }
            }
        }
        Commands::Progress {
            student,
            input,
            format,
        } => {
            let loaded =
                load_results(student.as_deref(), input.as_deref(), cli.fetch_timeout_secs).await?;
            match format {
                OutputFormat::Text => print_progress(&loaded),
                OutputFormat::Json => {
                    let body = serde_json::json!({
                        "terms": progress::term_summaries(&loaded.results),
                        "timeline": progress::progress_timeline(&loaded.results),
                        "subjects": progress::subject_history(&loaded.results),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
        }
        Commands::Report {
            student,
            input,
            remark_seed,
            out,
        } => {
            let loaded =
                load_results(student.as_deref(), input.as_deref(), cli.fetch_timeout_secs).await?;
            let mut pickers = match remark_seed {
                Some(seed) => RemarkPickers::seeded(seed),
                None => RemarkPickers::round_robin(),
            };
            let report = report::build_report(
                loaded.profile.as_ref(),
                &loaded.results,
                &mut pickers,
                chrono::Local::now().date_naive(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
