pub mod attempt_service;
pub mod clock;
pub mod poller;
pub mod quiz_catalog_service;
pub mod result_presenter;
pub mod submission_service;

pub use attempt_service::{AttemptRunner, AttemptService, AttemptTimings, Progress};
pub use quiz_catalog_service::{QuizCatalogService, QuizFilter};
pub use result_presenter::ResultSummary;
pub use submission_service::{FinalizationPath, SubmissionCoordinator};
