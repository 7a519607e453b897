use std::fmt;

use quiz_core::model::{QuizId, UserId, UserRole};
use storage::sqlite::SqliteRepository;

/// Built-in quiz written when no `--file` is given.
const SAMPLE_QUIZ: &str = r#"{
    "title": "Quantitative Aptitude Warm-up",
    "type": "calculation",
    "timeLimit": 10,
    "questions": [
        { "id": "q1", "text": "12 x 12 = ?", "correctAnswer": 144 },
        { "id": "q2", "text": "15% of 240 = ?", "correctAnswer": "36" },
        { "id": "q3", "text": "Square root of 169?", "correctAnswer": 13 },
        { "id": "q4", "text": "Next prime after 31?", "correctAnswer": 37, "points": 2 },
        { "id": "q5", "text": "3/4 as a decimal?", "correctAnswer": "0.75", "negativePoints": 0.5 }
    ]
}"#;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    quiz_id: QuizId,
    file: Option<String>,
    admin: Option<UserId>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw:?}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --admin value: {raw:?}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut quiz_id = std::env::var("QUIZ_ID")
            .ok()
            .and_then(|value| value.parse::<QuizId>().ok())
            .unwrap_or_else(|| QuizId::new("sample-aptitude"));
        let mut file = None;
        let mut admin = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--quiz-id" => {
                    let value = require_value(&mut args, "--quiz-id")?;
                    quiz_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                }
                "--file" => {
                    file = Some(require_value(&mut args, "--file")?);
                }
                "--admin" => {
                    let value = require_value(&mut args, "--admin")?;
                    admin = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            quiz_id,
            file,
            admin,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --quiz-id <id>        Document id to write (default: sample-aptitude)");
    eprintln!("  --file <path>         Quiz JSON document (default: built-in sample)");
    eprintln!("  --admin <uid>         Also grant the admin role to this user");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_ID");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        print_usage();
        e
    })?;

    let raw = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_QUIZ.to_owned(),
    };

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;
    let quiz = repo.import_quiz_json(&args.quiz_id, &raw).await?;

    if let Some(uid) = &args.admin {
        use storage::UserRepository;
        repo.set_role(uid, UserRole::Admin).await?;
    }

    println!(
        "Seeded quiz {} ({} questions, {}) into {}",
        quiz.id(),
        quiz.total_questions(),
        quiz.quiz_type(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
