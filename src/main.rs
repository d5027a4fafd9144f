use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod exam;
mod models;
mod report;
mod stats;
mod store;

use exam::ExamRecord;
use models::{ExtraBonuses, StatsReport};
use store::{JsonFileStore, RecordStore};

#[derive(Parser)]
#[command(name = "graduation-score")]
#[command(about = "LM-32 graduation score calculator", long_about = None)]
struct Cli {
    /// JSON file holding the exam list
    #[arg(
        long,
        global = true,
        env = "GRADUATION_STORE",
        default_value = "exams.json"
    )]
    store: PathBuf,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScoreArgs {
    /// Thesis points, 0 to 11 in steps of 0.5
    #[arg(long, default_value_t = 0.0, value_parser = parse_thesis_points)]
    thesis_points: f64,
    /// Erasmus bonus (+1)
    #[arg(long)]
    erasmus: bool,
    /// Graduating in course (+2)
    #[arg(long)]
    in_course: bool,
}

impl ScoreArgs {
    fn bonuses(&self) -> ExtraBonuses {
        ExtraBonuses {
            erasmus: self.erasmus,
            in_course: self.in_course,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record a passed exam
    #[command(group(
        ArgGroup::new("outcome")
            .args(["grade", "recognition"])
            .required(true)
            .multiple(false)
    ))]
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        credits: String,
        /// 30 cum laude
        #[arg(long)]
        honors: bool,
        /// Recognized exam without a grade
        #[arg(long)]
        recognition: bool,
    },
    /// Remove an exam by identifier
    Remove { id: Uuid },
    /// List recorded exams
    List,
    /// Show averages and eligibility
    Stats,
    /// Show how one more exam would change the averages
    Simulate {
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        credits: Option<String>,
        #[arg(long)]
        honors: bool,
    },
    /// Compute the projected graduation score
    Score {
        #[command(flatten)]
        score: ScoreArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        score: ScoreArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Import exams from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
}

fn parse_thesis_points(raw: &str) -> Result<f64, String> {
    let points: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !(0.0..=11.0).contains(&points) || (points * 2.0).fract() != 0.0 {
        return Err("thesis points must be between 0 and 11 in steps of 0.5".to_string());
    }
    Ok(points)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read-only commands carry on with an empty list when the store is unreadable.
fn load_or_empty(store: &JsonFileStore) -> Vec<ExamRecord> {
    match store.load() {
        Ok(exams) => exams,
        Err(err) => {
            warn!("could not read exam store, continuing with no exams: {err:#}");
            Vec::new()
        }
    }
}

fn save(store: &JsonFileStore, exams: &[ExamRecord]) -> anyhow::Result<()> {
    if let Err(err) = store.save(exams) {
        error!("could not save exam store: {err:#}");
        return Err(err);
    }
    Ok(())
}

fn print_stats(report: &StatsReport) {
    println!("Graded exams: {}", report.graded_count);
    println!(
        "Weighted average (LM-32): {:.2}",
        report.weighted_average_discounted
    );
    println!(
        "Weighted average (standard): {:.2}",
        report.weighted_average_standard
    );
    println!("Arithmetic average: {:.2}", report.arithmetic_average);
    println!("Graduation base: {:.2}", report.graduation_base);
    println!(
        "Honors bonus: {:.1} ({} honors)",
        report.honors_bonus, report.honors_count
    );
    println!("Initial base: {:.2}", report.initial_base);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = JsonFileStore::new(&cli.store);
    info!(path = %store.path().display(), "using exam store");

    match cli.command {
        Commands::Add {
            name,
            grade,
            credits,
            honors,
            recognition,
        } => {
            let exam = ExamRecord::from_input(&name, grade.as_deref(), &credits, honors, recognition)
                .context("invalid exam")?;
            let mut exams = store
                .load()
                .context("refusing to modify an exam store that could not be read")?;
            let added = format!("Added {} ({}) as {}.", exam.name(), exam.badge(), exam.id());
            exams.push(exam);
            save(&store, &exams)?;
            println!("{added}");
        }
        Commands::Remove { id } => {
            let mut exams = store
                .load()
                .context("refusing to modify an exam store that could not be read")?;
            let before = exams.len();
            exams.retain(|exam| exam.id() != id);

            if exams.len() == before {
                anyhow::bail!("no exam with id {id}");
            }
            save(&store, &exams)?;
            println!("Removed exam {id}.");
        }
        Commands::List => {
            let exams = load_or_empty(&store);

            if exams.is_empty() {
                println!("No exams recorded yet.");
                return Ok(());
            }

            println!("{} exams:", exams.len());
            for exam in exams.iter() {
                println!(
                    "- {} [{}] {} ({} credits{})",
                    exam.id(),
                    exam.badge(),
                    exam.name(),
                    exam.credits(),
                    if exam.is_recognition() {
                        ", recognized"
                    } else {
                        ""
                    }
                );
            }
        }
        Commands::Stats => {
            let exams = load_or_empty(&store);
            let report = stats::compute_stats(&exams);

            print_stats(&report);
            println!(
                "Credits: {}/{} ({:.0}%)",
                report.total_credits,
                stats::DEGREE_CREDITS,
                stats::degree_progress(&report) * 100.0
            );
            println!(
                "Honors eligible: {}",
                if report.honors_eligible { "yes" } else { "no" }
            );
            println!(
                "Distinction eligible: {}",
                if report.distinction_eligible { "yes" } else { "no" }
            );
        }
        Commands::Simulate {
            grade,
            credits,
            honors,
        } => {
            let exams = load_or_empty(&store);

            match stats::compute_simulated_stats(
                &exams,
                grade.as_deref(),
                credits.as_deref(),
                honors,
            ) {
                Some(report) => {
                    println!("With the simulated exam:");
                    print_stats(&report);
                }
                None => {
                    println!("Enter a valid grade and credits to simulate the next exam.");
                }
            }
        }
        Commands::Score { score } => {
            let exams = load_or_empty(&store);
            let report = stats::compute_stats(&exams);
            let final_score =
                stats::compute_final_score(&report, score.thesis_points, score.bonuses());

            println!(
                "Projected graduation score: {}/{}",
                final_score,
                stats::FULL_MARKS
            );
            if stats::laude_awardable(&report, final_score) {
                println!("Cum laude can be awarded.");
            }
        }
        Commands::Report { score, out } => {
            let exams = load_or_empty(&store);
            let report = report::build_report(
                chrono::Local::now().date_naive(),
                &exams,
                score.thesis_points,
                score.bonuses(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let outcome = store::import_csv(&store, &csv)?;
            println!(
                "Imported {} exams from {} ({} skipped).",
                outcome.inserted,
                csv.display(),
                outcome.skipped
            );
        }
    }

    Ok(())
}
