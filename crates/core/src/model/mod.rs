mod answer;
mod ids;
mod quiz;
mod score;
mod summary;
mod user;

pub use answer::{AnswerSheet, AnswerValue};
pub use ids::{ParseIdError, QuestionKey, QuizId, ResultId, UserId};
pub use quiz::{
    DEFAULT_NEGATIVE_POINTS, DEFAULT_POINTS, DEFAULT_TIME_LIMIT_MINUTES, Question, Quiz,
    QuizError, QuizType,
};
pub use score::{AnswerStatus, ScoreResult};
pub use summary::{DetailedAnalysis, QuestionReview, ResultSummary, accuracy};
pub use user::{AuthUser, UserRole};
