//! Command-line and environment configuration for the terminal front end.

use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::model::{AuthUser, DEFAULT_TIME_LIMIT_MINUTES, QuizId, UserId};

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_QUIZ_ID: &str = "sample-aptitude";
pub const DEFAULT_RESULTS_LIMIT: u32 = 10;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidMinutes { raw: String },
    InvalidLimit { raw: String },
    InvalidQuizId { raw: String },
    InvalidDbUrl { raw: String },
    UserRequired,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidMinutes { raw } => write!(f, "invalid --minutes value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UserRequired => {
                write!(f, "this command needs a user (--user-id or QUIZ_USER_ID)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Take,
    Results,
    WhoAmI,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "results" => Some(Self::Results),
            "whoami" => Some(Self::WhoAmI),
            _ => None,
        }
    }
}

/// Everything the binary needs, resolved from flags first and environment second.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub command: Command,
    pub db_url: String,
    pub quiz_id: QuizId,
    /// `None` means "use the quiz's declared limit".
    pub time_limit_minutes: Option<u32>,
    pub user: Option<AuthUser>,
    pub results_limit: u32,
    pub show_help: bool,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_minutes(raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidMinutes { raw })
}

impl Config {
    /// Parse `args` (without the program name), reading fallbacks through `env`.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown flags, missing values or values that do not parse.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut args = args.into_iter().peekable();

        // No subcommand means `take`.
        let command = match args.peek().map(String::as_str) {
            Some(first) if !first.starts_with('-') => {
                let command = Command::from_arg(first)
                    .ok_or_else(|| ArgsError::UnknownCommand(first.to_owned()))?;
                args.next();
                command
            }
            _ => Command::Take,
        };

        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let mut db_url = lookup("QUIZ_DB_URL")
            .map_or_else(|| DEFAULT_DB_URL.to_owned(), normalize_sqlite_url);
        let mut quiz_id = lookup("QUIZ_ID").unwrap_or_else(|| DEFAULT_QUIZ_ID.to_owned());
        let mut time_limit_minutes = lookup("QUIZ_TIME_LIMIT").map(parse_minutes).transpose()?;
        let mut user_id = lookup("QUIZ_USER_ID");
        let mut user_name = lookup("QUIZ_USER_NAME");
        let mut email = lookup("QUIZ_USER_EMAIL");
        let mut results_limit = DEFAULT_RESULTS_LIMIT;
        let mut show_help = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--quiz-id" => quiz_id = require_value(&mut args, "--quiz-id")?,
                "--minutes" => {
                    let value = require_value(&mut args, "--minutes")?;
                    time_limit_minutes = Some(parse_minutes(value)?);
                }
                "--user-id" => user_id = Some(require_value(&mut args, "--user-id")?),
                "--user-name" => user_name = Some(require_value(&mut args, "--user-name")?),
                "--email" => email = Some(require_value(&mut args, "--email")?),
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    results_limit = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--help" | "-h" => show_help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if quiz_id.trim().is_empty() {
            return Err(ArgsError::InvalidQuizId { raw: quiz_id });
        }

        let user = user_id
            .filter(|id| !id.trim().is_empty())
            .map(|id| {
                let mut user = AuthUser::new(UserId::new(id.trim()));
                user.display_name = user_name;
                user.email = email;
                user
            });

        Ok(Self {
            command,
            db_url,
            quiz_id: QuizId::new(quiz_id.trim()),
            time_limit_minutes,
            user,
            results_limit,
            show_help,
        })
    }

    /// Minutes to run the countdown for, given the quiz's own declared limit.
    #[must_use]
    pub fn effective_minutes(&self, declared: u32) -> u32 {
        self.time_limit_minutes.unwrap_or(declared)
    }

    /// # Errors
    ///
    /// Returns `ArgsError::UserRequired` when no user was configured.
    pub fn require_user(&self) -> Result<&AuthUser, ArgsError> {
        self.user.as_ref().ok_or(ArgsError::UserRequired)
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [take]  [--db <sqlite_url>] [--quiz-id <id>] [--minutes <n>]");
    eprintln!("                              [--user-id <uid>] [--user-name <name>] [--email <addr>]");
    eprintln!("  cargo run -p app -- results [--db <sqlite_url>] --user-id <uid> [--limit <n>]");
    eprintln!("  cargo run -p app -- whoami  [--db <sqlite_url>] [--user-id <uid>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --quiz-id {DEFAULT_QUIZ_ID}");
    eprintln!("  --minutes <quiz timeLimit, else {DEFAULT_TIME_LIMIT_MINUTES}>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_ID, QUIZ_TIME_LIMIT, QUIZ_USER_ID, QUIZ_USER_NAME, QUIZ_USER_EMAIL");
    eprintln!("  RUST_LOG (default: warn)");
}

/// Turn relative `sqlite:` paths into absolute `sqlite://` URLs.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so `SQLite` can open it.
///
/// # Errors
///
/// Returns an error for URLs without a usable path or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

    let path = Path::new(path);
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
