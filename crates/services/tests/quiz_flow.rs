use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{AnswerStatus, AuthUser, QuestionKey, QuizId, QuizType, UserId, UserRole};
use quiz_core::time::fixed_clock;
use services::{
    AppServices, LocalIdentity, ObserverEvent, RecordingObserver, SessionCommand, SessionDriver,
    SessionState,
};
use storage::repository::{QuizDocument, QuizRepository, UserRepository};
use tokio::sync::mpsc;

const CALC: &str = r#"{
    "title": "Speed Maths",
    "type": "calculation",
    "timeLimit": 2,
    "questions": [
        { "id": "m1", "text": "12 x 12", "correctAnswer": 144 },
        { "id": "m2", "text": "0.5 + 0.25", "correctAnswer": "0.75", "points": 2, "negativePoints": 0.5 },
        { "text": "7 squared", "correctAnswer": 49 }
    ]
}"#;

async fn seeded(identity: Arc<LocalIdentity>) -> AppServices {
    let services = AppServices::in_memory(fixed_clock(), identity);
    let quiz = QuizDocument::from_json(CALC)
        .unwrap()
        .into_quiz(QuizId::new("calc-1"))
        .unwrap();
    services.storage().quizzes.upsert_quiz(&quiz).await.unwrap();
    services
}

#[tokio::test(start_paused = true)]
async fn driven_attempt_is_scored_saved_and_listed() {
    services::telemetry::init_test_tracing();
    let identity = Arc::new(LocalIdentity::signed_in(
        AuthUser::new(UserId::new("student-1")).with_email("s1@example.com"),
    ));
    let services = seeded(Arc::clone(&identity)).await;
    let observer = Arc::new(RecordingObserver::new());

    let mut session = services.new_session(observer.clone());
    session.start(&QuizId::new("calc-1"), 2).await.unwrap();
    assert_eq!(session.quiz_type(), Some(QuizType::Calculation));

    let (tx, rx) = mpsc::channel(8);
    let mut driver = SessionDriver::new(session, rx);
    let handle = tokio::spawn(async move {
        let outcome = driver.run().await;
        (driver, outcome)
    });

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    tx.send(SessionCommand::Answer {
        key: QuestionKey::new("m1"),
        value: "144".into(),
    })
    .await
    .unwrap();
    tx.send(SessionCommand::Answer {
        key: QuestionKey::new("m2"),
        value: 0.5.into(),
    })
    .await
    .unwrap();
    tx.send(SessionCommand::Answer {
        key: QuestionKey::new("2"),
        value: "49".into(),
    })
    .await
    .unwrap();
    tx.send(SessionCommand::Clear {
        key: QuestionKey::new("2"),
    })
    .await
    .unwrap();
    tx.send(SessionCommand::End).await.unwrap();

    let (driver, outcome) = handle.await.unwrap();
    outcome.unwrap();
    let mut session = driver.into_session();
    assert_eq!(session.state(), SessionState::Completed);

    let summary = *session.summary().unwrap();
    assert_eq!(summary.score().correct, 1);
    assert_eq!(summary.score().wrong, 1);
    assert_eq!(summary.score().score, 3.5);
    assert_eq!(summary.time_spent_secs(), 10);
    assert_eq!(summary.not_attempted(), 1);
    assert_eq!(observer.ticks().len(), 10);
    assert!(matches!(
        observer.events().last(),
        Some(ObserverEvent::Scored(s)) if *s == summary
    ));

    let analysis = session.detailed_analysis().unwrap();
    assert_eq!(analysis.rows[2].label, "7 squared");
    let saved = session.wait_for_save().await.unwrap();
    assert_eq!(analysis.rows[2].status, AnswerStatus::NotAttempted);

    let history = services
        .history()
        .recent_for_user(&UserId::new("student-1"), 5)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(Some(history[0].id), saved);
    assert_eq!(history[0].quiz_title, "Speed Maths");

    let stored = services.history().get(history[0].id).await.unwrap();
    assert_eq!(stored.record.user_name.as_deref(), Some("s1@example.com"));
}

#[tokio::test]
async fn admin_gate_follows_the_signed_in_user() {
    let identity = Arc::new(LocalIdentity::new());
    let services = seeded(Arc::clone(&identity)).await;
    services
        .storage()
        .users
        .set_role(&UserId::new("admin-1"), UserRole::Admin)
        .await
        .unwrap();

    let auth = services.auth();
    assert!(!auth.snapshot().await.is_admin);

    identity.sign_in(AuthUser::new(UserId::new("admin-1")));
    assert!(auth.snapshot().await.is_admin);

    identity.sign_in(AuthUser::new(UserId::new("member-1")));
    assert!(!auth.snapshot().await.is_admin);
}

#[tokio::test]
async fn sqlite_backend_persists_results() {
    let identity = Arc::new(LocalIdentity::signed_in(AuthUser::new(UserId::new("u-9"))));
    let services = AppServices::new_sqlite(
        "sqlite:file:services_flow?mode=memory&cache=shared",
        fixed_clock(),
        identity,
    )
    .await
    .unwrap();
    let quiz = QuizDocument::from_json(CALC)
        .unwrap()
        .into_quiz(QuizId::new("calc-1"))
        .unwrap();
    services.storage().quizzes.upsert_quiz(&quiz).await.unwrap();

    let mut session = services.new_session(Arc::new(RecordingObserver::new()));
    session.start(&QuizId::new("calc-1"), 2).await.unwrap();
    session
        .record_answer(QuestionKey::new("m2"), "0.75".into())
        .unwrap();
    session.end().await.unwrap();

    let id = session
        .wait_for_save()
        .await
        .unwrap()
        .expect("saved to sqlite");
    let stored = services.history().get(id).await.unwrap();
    assert_eq!(stored.record.score, 2.0);
    assert_eq!(stored.record.quiz_type, QuizType::Calculation);
    assert_eq!(stored.recorded_at, quiz_core::time::fixed_now());
}
