// Library surface for headless/integration tests and reuse.
// Rendering and the App type live in the binary.
pub mod api;
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod controller;
pub mod history;
pub mod logging;
pub mod outbox;
pub mod question;
pub mod quiz;
pub mod runtime;
pub mod submit;

pub use api::{ApiError, HttpQuizApi, QuestionQuery, QuizApi};
pub use controller::QuizController;
pub use question::{MalformedQuestionError, OptionTag, Question};
pub use quiz::{Effect, QuizState, QuizSummary};
