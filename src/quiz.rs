//! Quiz session state machine.
//!
//! `reduce` is a pure function over an explicit state value: the controller
//! feeds it actions and interprets the effects it returns. Actions that are not
//! valid in the current state leave the state untouched and emit nothing.

use crate::question::{OptionTag, Question};

/// Fixed award for a correct answer, independent of difficulty
pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    /// Waiting for the question set (initial, and after a failed fetch)
    Loading,
    /// The category has no usable questions
    Empty,
    Unanswered {
        index: usize,
        score: u32,
        selected: Option<OptionTag>,
    },
    Answered {
        index: usize,
        score: u32,
        selected: OptionTag,
        correct: bool,
    },
    Completed {
        score: u32,
    },
}

impl QuizState {
    pub fn score(&self) -> u32 {
        match self {
            QuizState::Unanswered { score, .. }
            | QuizState::Answered { score, .. }
            | QuizState::Completed { score } => *score,
            QuizState::Loading | QuizState::Empty => 0,
        }
    }

    /// Index of the active question, if one is active
    pub fn index(&self) -> Option<usize> {
        match self {
            QuizState::Unanswered { index, .. } | QuizState::Answered { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<OptionTag> {
        match self {
            QuizState::Unanswered { selected, .. } => *selected,
            QuizState::Answered { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            QuizState::Unanswered { .. } | QuizState::Answered { .. }
        )
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, QuizState::Answered { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, QuizState::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAction {
    /// The question set arrived (possibly empty)
    Loaded,
    LoadFailed,
    Select(OptionTag),
    Check,
    Advance,
    Restart,
}

/// Side effects requested by a transition, executed by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FetchQuestions,
    /// Last question answered correctly
    Celebrate,
    SubmitResult { score: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: QuizState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: QuizState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: QuizState, effect: Effect) -> Self {
        Self {
            state,
            effects: vec![effect],
        }
    }
}

pub fn reduce(state: &QuizState, questions: &[Question], action: QuizAction) -> Transition {
    use QuizAction as A;
    use QuizState as S;

    match (state, action) {
        (_, A::Restart) => Transition::with(S::Loading, Effect::FetchQuestions),

        (S::Loading, A::Loaded) if questions.is_empty() => Transition::to(S::Empty),
        (S::Loading, A::Loaded) => Transition::to(S::Unanswered {
            index: 0,
            score: 0,
            selected: None,
        }),
        (S::Loading, A::LoadFailed) => Transition::to(S::Loading),

        (S::Unanswered { index, score, .. }, A::Select(tag))
            if questions
                .get(*index)
                .and_then(|q| q.option(tag))
                .is_some() =>
        {
            Transition::to(S::Unanswered {
                index: *index,
                score: *score,
                selected: Some(tag),
            })
        }

        (
            S::Unanswered {
                index,
                score,
                selected: Some(tag),
            },
            A::Check,
        ) => match questions.get(*index) {
            Some(question) => {
                let correct = question.is_correct(*tag);
                let score = if correct {
                    score + POINTS_PER_CORRECT
                } else {
                    *score
                };
                let next = S::Answered {
                    index: *index,
                    score,
                    selected: *tag,
                    correct,
                };
                if correct && index + 1 == questions.len() {
                    Transition::with(next, Effect::Celebrate)
                } else {
                    Transition::to(next)
                }
            }
            None => Transition::to(state.clone()),
        },

        (S::Answered { index, score, .. }, A::Advance) => {
            if index + 1 < questions.len() {
                Transition::to(S::Unanswered {
                    index: index + 1,
                    score: *score,
                    selected: None,
                })
            } else {
                Transition::with(
                    S::Completed { score: *score },
                    Effect::SubmitResult { score: *score },
                )
            }
        }

        _ => Transition::to(state.clone()),
    }
}

/// Percentage of the maximum possible score, rounded to the nearest integer.
///
/// Assumes every question is worth `POINTS_PER_CORRECT`.
pub fn accuracy(score: u32, question_count: usize) -> Option<u32> {
    if question_count == 0 {
        return None;
    }
    let max = question_count as f64 * POINTS_PER_CORRECT as f64;
    Some(((score as f64 / max) * 100.0).round() as u32)
}

/// Result shown on the completion screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSummary {
    pub score: u32,
    pub question_count: usize,
    pub correct_count: usize,
    pub accuracy: u32,
}

impl QuizSummary {
    pub fn new(score: u32, question_count: usize) -> Self {
        Self {
            score,
            question_count,
            correct_count: (score / POINTS_PER_CORRECT) as usize,
            accuracy: accuracy(score, question_count).unwrap_or(0),
        }
    }
}
