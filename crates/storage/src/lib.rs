#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuizDocument, QuizRepository, QuizResultRecord, QuizResultRepository,
    Storage, StorageError, StoredQuizResult, UserRepository,
};
