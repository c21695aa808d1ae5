use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use exam_core::model::{MAX_SCORE, SeriesId};
use services::{AppServices, Clock, ExamRunService, HttpExamApi, ResultsService};
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeriesId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeriesId { raw } => write!(f, "invalid --series-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    default_series_id: Option<SeriesId>,
    exam_run: Arc<ExamRunService>,
    results: Arc<ResultsService>,
}

impl UiApp for DesktopApp {
    fn default_series_id(&self) -> Option<SeriesId> {
        self.default_series_id
    }

    fn exam_run(&self) -> Arc<ExamRunService> {
        Arc::clone(&self.exam_run)
    }

    fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}

struct Args {
    db_url: String,
    series_id: Option<SeriesId>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui   [--db <sqlite_url>] [--series-id <id>]");
    eprintln!("  cargo run -p app -- last [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:exam.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_SERIES_ID, EXAM_API_URL, EXAM_API_TOKEN, EXAM_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Last,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

fn parse_series_id(raw: String) -> Result<SeriesId, ArgsError> {
    raw.parse::<SeriesId>()
        .map_err(|_| ArgsError::InvalidSeriesId { raw })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("exam.sqlite3".into()), normalize_sqlite_url);
        let mut series_id = std::env::var("EXAM_SERIES_ID")
            .ok()
            .and_then(|value| value.parse::<SeriesId>().ok());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--series-id" => {
                    let value = require_value(args, "--series-id")?;
                    series_id = Some(parse_series_id(value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, series_id })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("EXAM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| format!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: launching UI when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let api = HttpExamApi::from_env();
    if !api.enabled() {
        tracing::warn!("EXAM_API_URL is not set; exams cannot be fetched or submitted");
    }
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), Arc::new(api)).await?;
    tracing::info!(db = %parsed.db_url, command = ?cmd, "services ready");

    match cmd {
        Command::Ui => {
            let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
                default_series_id: parsed.series_id,
                exam_run: services.exam_run(),
                results: services.results(),
            });
            let context = build_app_context(&app);

            // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
            // Explicitly disable it so the app doesn't behave like a modal window.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Exam Practice")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Last => print_last_result(&services.results()).await,
    }
}

async fn print_last_result(results: &ResultsService) -> Result<(), Box<dyn std::error::Error>> {
    let Some(overview) = results.latest().await? else {
        println!("No cached result.");
        return Ok(());
    };
    let result = &overview.result;

    println!(
        "Series {} ({})",
        result.series_id(),
        result.module_kind().as_str()
    );
    println!(
        "Score: {} / {MAX_SCORE} ({})",
        result.score(),
        result.level()
    );
    if !result.module_kind().is_free_response() {
        println!(
            "Correct: {} / {}",
            result.correct_count(),
            result.total_questions()
        );
    }
    println!(
        "Time: {}s of {}s",
        result.elapsed_seconds(),
        result.allotted_seconds()
    );
    println!(
        "Accuracy: {} ({})",
        overview.accuracy.quality, overview.accuracy.score
    );
    println!(
        "Time management: {} ({})",
        overview.time.quality, overview.time.score
    );
    match &overview.attempt_id {
        Some(attempt_id) => println!("Submitted as attempt {attempt_id}"),
        None => println!("Not submitted"),
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommands_parse() {
        assert_eq!(Command::from_arg("ui"), Some(Command::Ui));
        assert_eq!(Command::from_arg("last"), Some(Command::Last));
        assert_eq!(Command::from_arg("seed"), None);
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/exam.sqlite3".into()),
            "sqlite:///tmp/exam.sqlite3"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/exam.sqlite3".into()),
            "sqlite:///var/exam.sqlite3"
        );
    }

    #[test]
    fn series_id_and_db_flags_are_parsed() {
        let mut args = ["--series-id", "42", "--db", "sqlite::memory:"]
            .into_iter()
            .map(String::from);
        let parsed = Args::parse(&mut args).unwrap();
        assert_eq!(parsed.series_id, Some(SeriesId::new(42)));
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn bad_series_id_is_rejected() {
        let err = parse_series_id("abc".into()).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidSeriesId { .. }));
    }
}
