use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_admin::config::{
    RiskThresholds, DEFAULT_MIN_ATTENDANCE, DEFAULT_MIN_PERFORMANCE, DEFAULT_WINDOW_DAYS,
};
use school_admin::{db, import, metrics, report, risk, seed, session, Store};

#[derive(Parser)]
#[command(name = "school-admin")]
#[command(about = "Admin store, metrics and risk alerts for a school", long_about = None)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
    #[arg(long, env = "SCHOOL_ADMIN_MIN_ATTENDANCE", default_value_t = DEFAULT_MIN_ATTENDANCE, global = true)]
    min_attendance: f64,
    #[arg(long, env = "SCHOOL_ADMIN_MIN_PERFORMANCE", default_value_t = DEFAULT_MIN_PERFORMANCE, global = true)]
    min_performance: f64,
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, global = true)]
    window_days: i64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SessionArgs {
    /// Start from the snapshot stored in Postgres instead of seed data
    #[arg(long)]
    from_db: bool,
    /// Enroll students from a CSV file
    #[arg(long)]
    students_csv: Option<PathBuf>,
    /// Replay a JSON-lines action script
    #[arg(long)]
    actions: Option<PathBuf>,
    /// Write the final snapshot back to Postgres
    #[arg(long)]
    save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Print headline metrics for the session
    Summary {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, default_value_t = 3)]
        alerts: usize,
    },
    /// Raise risk alerts for students and classes below the thresholds
    Scan {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, default_value_t = 5)]
        alerts: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<PgPool> {
    let url = database_url.context("DATABASE_URL must be set for database access")?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

async fn open_session(args: &SessionArgs, pool: Option<&PgPool>) -> anyhow::Result<Store> {
    let initial = match pool {
        Some(pool) if args.from_db => db::load_state(pool).await?,
        _ => seed::seed_state()?,
    };
    let mut store = Store::new(initial);

    if let Some(path) = &args.students_csv {
        let actions = import::read_students_csv(path)?;
        session::replay(&mut store, actions, &path.display().to_string())?;
    }
    if let Some(path) = &args.actions {
        let actions = import::read_action_script(path)?;
        session::replay(&mut store, actions, &path.display().to_string())?;
    }
    Ok(store)
}

async fn close_session(store: Store, args: &SessionArgs, pool: Option<&PgPool>) -> anyhow::Result<()> {
    let state = store.into_state();
    if args.save {
        let pool = pool.context("--save needs a database connection")?;
        db::save_state(pool, &state).await?;
        println!("Snapshot saved.");
    }
    Ok(())
}

async fn session_pool(cli_url: Option<&str>, args: &SessionArgs) -> anyhow::Result<Option<PgPool>> {
    if args.from_db || args.save {
        Ok(Some(connect(cli_url).await?))
    } else {
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_admin=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let thresholds = RiskThresholds::new(cli.min_attendance, cli.min_performance, cli.window_days)?;
    let database_url = cli.database_url.as_deref();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(database_url).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Summary {
            session: args,
            alerts,
        } => {
            let pool = session_pool(database_url, &args).await?;
            let store = open_session(&args, pool.as_ref()).await?;
            let state = store.state();
            let statuses = metrics::status_counts(&state.students);

            println!(
                "{} students ({} at risk), {} teachers, {} classes",
                state.students.len(),
                statuses.at_risk,
                state.teachers.len(),
                state.classes.len()
            );
            println!(
                "Average attendance {:.1}%, average performance {:.1}",
                metrics::average_attendance(&state.students),
                metrics::average_performance(&state.students)
            );

            let distribution = metrics::class_distribution(&state.classes, &state.students);
            for bucket in distribution.buckets.iter() {
                println!(
                    "- Grade {}: {} students in {} classes",
                    bucket.grade,
                    bucket.student_count,
                    bucket.classes.len()
                );
            }

            let open = metrics::unresolved_alerts(&state.risk_alerts, Some(alerts));
            if open.is_empty() {
                println!("No open risk alerts.");
            } else {
                println!("Most recent open alerts:");
                for alert in open {
                    println!(
                        "- {} {} {}: {}",
                        alert.alert_type.as_str(),
                        alert.entity_type.as_str(),
                        alert.entity_id,
                        alert.reason
                    );
                }
            }
            close_session(store, &args, pool.as_ref()).await?;
        }
        Commands::Scan { session: args } => {
            let pool = session_pool(database_url, &args).await?;
            let mut store = open_session(&args, pool.as_ref()).await?;
            let actions = risk::scan(store.state(), &thresholds, chrono::Utc::now());

            if actions.is_empty() {
                println!("No new risks found.");
            } else {
                for action in actions.iter() {
                    if let school_admin::Action::AddRiskAlert(alert) = action {
                        println!("- {}", alert.reason);
                    }
                }
                let summary = session::replay(&mut store, actions, "risk scan")?;
                info!(applied = summary.applied, "risk scan dispatched");
            }
            close_session(store, &args, pool.as_ref()).await?;
        }
        Commands::Report {
            session: args,
            alerts,
            out,
        } => {
            let pool = session_pool(database_url, &args).await?;
            let store = open_session(&args, pool.as_ref()).await?;
            let output = report::build_report(store.state(), chrono::Utc::now(), alerts);
            std::fs::write(&out, output)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
            close_session(store, &args, pool.as_ref()).await?;
        }
    }

    Ok(())
}
