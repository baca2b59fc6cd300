use tracing::{error, info, warn};

use crate::api::{QuestionQuery, QuizApi};
use crate::question::{validate_all, MalformedQuestionError, OptionTag, Question, QuestionRecord};
use crate::quiz::{reduce, Effect, QuizAction, QuizState, QuizSummary};

/// Drives one user through one category's question set.
///
/// Holds the immutable question list and the current state value; every
/// operation is a reducer dispatch. Effects are returned to the caller, which
/// decides how to fetch, celebrate and submit.
#[derive(Debug)]
pub struct QuizController {
    query: QuestionQuery,
    questions: Vec<Question>,
    rejected: Vec<MalformedQuestionError>,
    state: QuizState,
    load_error: Option<String>,
}

impl QuizController {
    pub fn new(query: QuestionQuery) -> Self {
        Self {
            query,
            questions: Vec::new(),
            rejected: Vec::new(),
            state: QuizState::Loading,
            load_error: None,
        }
    }

    pub fn query(&self) -> QuestionQuery {
        self.query
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Records dropped from the last load because they could not be validated
    pub fn rejected(&self) -> &[MalformedQuestionError] {
        &self.rejected
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn score(&self) -> u32 {
        self.state.score()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.state.index().and_then(|i| self.questions.get(i))
    }

    pub fn is_last_question(&self) -> bool {
        self.state
            .index()
            .is_some_and(|i| i + 1 == self.questions.len())
    }

    pub fn summary(&self) -> Option<QuizSummary> {
        match self.state {
            QuizState::Completed { score } => Some(QuizSummary::new(score, self.questions.len())),
            _ => None,
        }
    }

    fn dispatch(&mut self, action: QuizAction) -> Vec<Effect> {
        let transition = reduce(&self.state, &self.questions, action);
        if transition.state != self.state {
            tracing::trace!(?action, from = ?self.state, to = ?transition.state, "quiz transition");
        }
        self.state = transition.state;
        transition.effects
    }

    /// Fetch and install the question set synchronously
    pub fn load_questions<A: QuizApi + ?Sized>(&mut self, api: &A) -> Vec<Effect> {
        match api.questions(&self.query) {
            Ok(records) => self.on_questions_loaded(records),
            Err(e) => self.on_load_failed(&e),
        }
    }

    pub fn on_questions_loaded(&mut self, records: Vec<QuestionRecord>) -> Vec<Effect> {
        if !matches!(self.state, QuizState::Loading) {
            return Vec::new();
        }
        let (questions, rejected) = validate_all(records);
        for err in &rejected {
            warn!(category = self.query.category, "skipping malformed question: {err}");
        }
        info!(
            category = self.query.category,
            questions = questions.len(),
            rejected = rejected.len(),
            "question set loaded"
        );
        self.questions = questions;
        self.rejected = rejected;
        self.load_error = None;
        self.dispatch(QuizAction::Loaded)
    }

    /// The controller stays in `Loading`; the error is kept for display only
    pub fn on_load_failed(&mut self, err: &dyn std::fmt::Display) -> Vec<Effect> {
        error!(category = self.query.category, "failed to fetch questions: {err}");
        self.load_error = Some(err.to_string());
        self.dispatch(QuizAction::LoadFailed)
    }

    pub fn select_option(&mut self, tag: OptionTag) -> Vec<Effect> {
        self.dispatch(QuizAction::Select(tag))
    }

    pub fn check_answer(&mut self) -> Vec<Effect> {
        self.dispatch(QuizAction::Check)
    }

    pub fn advance(&mut self) -> Vec<Effect> {
        self.dispatch(QuizAction::Advance)
    }

    /// Drop the session and go back to `Loading`; the caller re-fetches
    pub fn restart(&mut self) -> Vec<Effect> {
        self.questions.clear();
        self.rejected.clear();
        self.load_error = None;
        self.dispatch(QuizAction::Restart)
    }
}
