use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use quiz_core::model::{DEFAULT_TIME_LIMIT_MINUTES, QuestionKey};
use services::telemetry::{self, DEFAULT_FILTER};
use services::{AppServices, Clock, IdentityProvider, LocalIdentity, SessionDriver, SessionState};
use storage::repository::QuizRepository;

mod config;
mod input;
mod presenter;
mod terminal;

use config::{Command, Config};
use input::{LineParser, spawn_stdin_reader};
use presenter::Presenter;
use terminal::TerminalObserver;

/// How long to wait for the result save once the analysis is shown.
const SAVE_WAIT: Duration = Duration::from_secs(10);

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            config::print_usage();
            e
        })?;
    if config.show_help {
        config::print_usage();
        return Ok(());
    }

    telemetry::init_tracing(DEFAULT_FILTER);

    let identity = Arc::new(LocalIdentity::new());
    if let Some(user) = config.user.clone() {
        identity.sign_in(user);
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    config::prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(
        &config.db_url,
        Clock::system(),
        Arc::clone(&identity) as Arc<dyn IdentityProvider>,
    )
    .await?;

    match config.command {
        Command::Take => take(&config, &services).await,
        Command::Results => {
            let user = config.require_user()?;
            let items = services
                .history()
                .recent_for_user(&user.uid, config.results_limit)
                .await?;
            println!("{}", terminal::history_table(user, &items));
            Ok(())
        }
        Command::WhoAmI => {
            let snapshot = services.auth().snapshot().await;
            println!("{}", terminal::whoami(&snapshot));
            Ok(())
        }
    }
}

async fn take(config: &Config, services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    if config.user.is_none() {
        eprintln!("Not signed in: your result will not be saved.");
    }

    // Without --minutes the quiz's own limit applies. A failed lookup here is
    // reported by `start` below.
    let declared = services
        .storage()
        .quizzes
        .get_quiz(&config.quiz_id)
        .await
        .map_or(DEFAULT_TIME_LIMIT_MINUTES, |quiz| quiz.time_limit_minutes());
    let minutes = config.effective_minutes(declared);

    let mut session = services.new_session(Arc::new(TerminalObserver));
    session.start(&config.quiz_id, minutes).await?;

    if session.state() == SessionState::Active {
        let Some(quiz) = session.quiz() else {
            return Ok(());
        };
        let presenter = Presenter::for_type(quiz.quiz_type());
        println!("{}", presenter.render(quiz, minutes));

        let keys: Vec<QuestionKey> = quiz.keyed_questions().map(|(key, _)| key).collect();
        let (tx, rx) = mpsc::channel(32);
        spawn_stdin_reader(LineParser::new(keys, config.quiz_id.clone(), minutes), tx);

        let mut driver = SessionDriver::new(session, rx);
        driver.run().await?;
        session = driver.into_session();
    }

    if session.state() != SessionState::Completed {
        println!("Attempt abandoned.");
        return Ok(());
    }
    // The results panel was already printed when the attempt was scored.
    println!("{}", terminal::analysis_table(&session.detailed_analysis()?));

    // Give the background save a bounded chance to finish before exiting.
    match tokio::time::timeout(SAVE_WAIT, session.wait_for_save()).await {
        Ok(Ok(Some(id))) => debug!(result_id = %id, "result saved"),
        Ok(Ok(None)) => {}
        // Already reported by the observer.
        Ok(Err(_)) => {}
        Err(_) => eprintln!("Saving your result is taking too long; giving up."),
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
