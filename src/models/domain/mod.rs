pub mod attempt;
pub mod outcome;
pub mod quiz;
pub mod quiz_question;
pub use attempt::{Advance, AttemptSession, AttemptStatus, Transition};
pub use outcome::{AbandonedAttempt, AttemptOutcome, Score};
pub use quiz::{Professor, Quiz};
pub use quiz_question::{Question, QuestionOption};
