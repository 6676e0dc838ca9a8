use clap::{Parser, Subcommand};
use lift_core::*;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Strength progression analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the user whose data is read and written
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a workout log (JSON) to the journal
    Log {
        /// Path to a JSON workout log, or '-' for stdin
        #[arg(long)]
        file: PathBuf,
    },

    /// Record a daily adherence score (0..1)
    Adherence {
        /// Day of the record (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        #[arg(long, allow_negative_numbers = true)]
        score: f64,
    },

    /// Recompute progression snapshots from the full history and store them
    Snapshot {
        /// Show the snapshots without saving them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print progression analytics as JSON
    Analytics {
        /// Trailing window in days (defaults to analytics.period_days)
        #[arg(long)]
        days: Option<u32>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Estimate a one-rep max from a single set
    Estimate {
        #[arg(long, allow_negative_numbers = true)]
        weight: f64,

        #[arg(long, allow_negative_numbers = true)]
        reps: f64,
    },
}

fn main() -> Result<()> {
    lift_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user_id = cli.user.unwrap_or_else(|| config.data.user_id.clone());

    let layout = || DataLayout::new(&data_dir, &user_id);

    match cli.command {
        Commands::Log { file } => cmd_log(&layout()?, &file),
        Commands::Adherence { date, score } => cmd_adherence(&layout()?, date, score),
        Commands::Snapshot { dry_run } => cmd_snapshot(&layout()?, &user_id, dry_run),
        Commands::Analytics { days, pretty } => {
            let days = days.unwrap_or(config.analytics.period_days);
            cmd_analytics(&layout()?, &user_id, days, pretty)
        }
        Commands::Estimate { weight, reps } => {
            cmd_estimate(weight, reps);
            Ok(())
        }
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

fn cmd_log(layout: &DataLayout, file: &Path) -> Result<()> {
    let contents = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    let log: WorkoutLog = serde_json::from_str(&contents)?;
    if history::parse_log_date(&log.date).is_none() {
        return Err(Error::InvalidInput(format!(
            "workout date {:?} is not YYYY-MM-DD",
            log.date
        )));
    }

    let usable = log
        .exercises
        .iter()
        .filter(|entry| !entry.validated_sets().is_empty())
        .count();
    if usable < log.exercises.len() {
        tracing::warn!(
            "{} of {} exercises have no usable sets and will not count toward progression",
            log.exercises.len() - usable,
            log.exercises.len()
        );
    }

    let mut journal = JsonlJournal::new(&layout.journal_path);
    journal.append(&log)?;

    println!(
        "✓ Logged workout {} ({}, {} exercises)",
        log.id,
        log.date,
        log.exercises.len()
    );
    Ok(())
}

fn cmd_adherence(layout: &DataLayout, date: String, score: f64) -> Result<()> {
    if history::parse_log_date(&date).is_none() {
        return Err(Error::InvalidInput(format!(
            "adherence date {:?} is not YYYY-MM-DD",
            date
        )));
    }
    if !score.is_finite() {
        return Err(Error::InvalidInput("adherence score must be a number".into()));
    }
    if !(0.0..=1.0).contains(&score) {
        tracing::warn!("Adherence score {} is outside 0..1 and will be clamped", score);
    }

    let row = AdherenceRow {
        date,
        total_score: Some(score),
    };
    adherence::append_adherence(&layout.adherence_path, &row)?;

    println!("✓ Recorded adherence {:.2} for {}", score, row.date);
    Ok(())
}

fn cmd_snapshot(layout: &DataLayout, user_id: &str, dry_run: bool) -> Result<()> {
    let logs = load_workout_history(&layout.journal_path)?;
    let snapshots = aggregate_snapshots(&logs);

    if snapshots.is_empty() {
        println!("No usable sets logged - nothing to snapshot.");
        return Ok(());
    }

    display_snapshots(&snapshots);

    if dry_run {
        println!("\n[Dry run - snapshots not saved]");
        return Ok(());
    }

    let count = upsert_snapshots(
        &layout.snapshots_path,
        user_id,
        &snapshots,
        chrono::Utc::now(),
    )?;

    println!("\n✓ Saved {} snapshots", count);
    println!("  Table: {}", layout.snapshots_path.display());
    Ok(())
}

fn cmd_analytics(layout: &DataLayout, user_id: &str, days: u32, pretty: bool) -> Result<()> {
    if days == 0 {
        return Err(Error::InvalidInput("--days must be at least 1".into()));
    }

    let today = today();
    let logs = load_recent_workouts(&layout.journal_path, days, today)?;
    let stored = load_snapshots(&layout.snapshots_path, user_id)?;
    let adherence = load_recent_adherence(&layout.adherence_path, days, today)?;

    let analytics = build_progression_analytics(days, &logs, &stored, &adherence);

    let json = if pretty {
        serde_json::to_string_pretty(&analytics)?
    } else {
        serde_json::to_string(&analytics)?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_estimate(weight: f64, reps: f64) {
    println!("{:.2}", estimate_e1rm(weight, reps));
}

fn display_snapshots(snapshots: &[ProgressionSnapshot]) {
    println!(
        "{:<28} {:>9} {:>9} {:>8} {:>5}  {}",
        "EXERCISE", "E1RM", "VOLUME", "TREND", "N", "LAST"
    );
    for snapshot in snapshots {
        let e1rm = snapshot
            .e1rm
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<28} {:>9} {:>9.2} {:>7.1}% {:>5}  {}",
            snapshot.exercise_name,
            e1rm,
            snapshot.total_volume,
            snapshot.trend_score * 100.0,
            snapshot.sample_size,
            snapshot.last_performed_date.as_deref().unwrap_or("-")
        );
    }
}
