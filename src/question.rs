use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type QuestionId = i64;
pub type CategoryId = i64;

/// A grouping of questions by subject, as listed by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Dashboard totals for the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    pub user_email: Option<String>,
    pub quizzes_attempted: u32,
    pub problems_solved: u32,
    pub total_score: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Question exactly as served by `GET /quiz/questions/{categoryId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub question: String,
    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display)]
pub enum OptionTag {
    A,
    B,
    C,
    D,
}

impl OptionTag {
    pub const ALL: [OptionTag; 4] = [OptionTag::A, OptionTag::B, OptionTag::C, OptionTag::D];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a letter-coded answer such as `"Option B"` or `"b"`.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        let letter = if code.len() == 1 {
            code
        } else {
            match (code.get(..7), code.get(7..)) {
                (Some(prefix), Some(rest)) if prefix.eq_ignore_ascii_case("option ") => rest,
                _ => return None,
            }
        };
        match letter.to_ascii_uppercase().as_str() {
            "A" => Some(OptionTag::A),
            "B" => Some(OptionTag::B),
            "C" => Some(OptionTag::C),
            "D" => Some(OptionTag::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedQuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },
    #[error("question {id} has {present} usable option(s), at least 2 are required")]
    TooFewOptions { id: QuestionId, present: usize },
    #[error("question {id} has unrecognised answer code {code:?}")]
    UnknownAnswerCode { id: QuestionId, code: String },
    #[error("question {id} marks option {tag} as correct but that option is empty")]
    MissingCorrectOption { id: QuestionId, tag: OptionTag },
}

impl MalformedQuestionError {
    pub fn question_id(&self) -> QuestionId {
        match self {
            Self::EmptyPrompt { id }
            | Self::TooFewOptions { id, .. }
            | Self::UnknownAnswerCode { id, .. }
            | Self::MissingCorrectOption { id, .. } => *id,
        }
    }
}

/// A validated multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    slots: [Option<String>; 4],
    correct: OptionTag,
    difficulty: String,
    category: Option<Category>,
}

impl Question {
    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    pub fn correct_tag(&self) -> OptionTag {
        self.correct
    }

    /// Literal text of the correct option
    pub fn correct_text(&self) -> &str {
        // validated at construction
        self.slots[self.correct.index()].as_deref().unwrap_or_default()
    }

    pub fn option(&self, tag: OptionTag) -> Option<&str> {
        self.slots[tag.index()].as_deref()
    }

    /// Present options in A..D order
    pub fn options(&self) -> impl Iterator<Item = (OptionTag, &str)> + '_ {
        OptionTag::ALL
            .into_iter()
            .filter_map(|tag| self.option(tag).map(|text| (tag, text)))
    }

    pub fn option_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Exact text comparison against the correct option
    pub fn is_correct(&self, tag: OptionTag) -> bool {
        self.option(tag) == Some(self.correct_text())
    }
}

fn normalize_option(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

impl TryFrom<QuestionRecord> for Question {
    type Error = MalformedQuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        if record.question.trim().is_empty() {
            return Err(MalformedQuestionError::EmptyPrompt { id });
        }

        let slots = [
            normalize_option(record.option_a),
            normalize_option(record.option_b),
            normalize_option(record.option_c),
            normalize_option(record.option_d),
        ];
        let present = slots.iter().flatten().count();
        if present < 2 {
            return Err(MalformedQuestionError::TooFewOptions { id, present });
        }

        let correct = OptionTag::from_code(&record.correct_answer).ok_or_else(|| {
            MalformedQuestionError::UnknownAnswerCode {
                id,
                code: record.correct_answer.clone(),
            }
        })?;
        if slots[correct.index()].is_none() {
            return Err(MalformedQuestionError::MissingCorrectOption { id, tag: correct });
        }

        Ok(Self {
            id,
            prompt: record.question,
            slots,
            correct,
            difficulty: record.difficulty,
            category: record.category,
        })
    }
}

/// Validate a fetched batch, keeping server order. Malformed records are returned separately.
pub fn validate_all(
    records: Vec<QuestionRecord>,
) -> (Vec<Question>, Vec<MalformedQuestionError>) {
    let (questions, rejected): (Vec<_>, Vec<_>) = records
        .into_iter()
        .map(Question::try_from)
        .partition_result();
    (questions, rejected)
}

#[cfg(test)]
pub(crate) fn record(id: QuestionId, options: [&str; 4], code: &str) -> QuestionRecord {
    let opt = |s: &str| Some(s.to_string());
    QuestionRecord {
        id,
        question: format!("Question {id}?"),
        option_a: opt(options[0]),
        option_b: opt(options[1]),
        option_c: opt(options[2]),
        option_d: opt(options[3]),
        correct_answer: code.to_string(),
        difficulty: "Easy".to_string(),
        category: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_option_tag_from_code() {
        assert_eq!(OptionTag::from_code("Option A"), Some(OptionTag::A));
        assert_eq!(OptionTag::from_code("option d"), Some(OptionTag::D));
        assert_eq!(OptionTag::from_code(" Option C "), Some(OptionTag::C));
        assert_eq!(OptionTag::from_code("B"), Some(OptionTag::B));
        assert_eq!(OptionTag::from_code("b"), Some(OptionTag::B));
        assert_eq!(OptionTag::from_code("Option E"), None);
        assert_eq!(OptionTag::from_code("E"), None);
        assert_eq!(OptionTag::from_code(""), None);
        assert_eq!(OptionTag::from_code("Hyper Text Markup Language"), None);
        assert_eq!(OptionTag::from_code("Option ä"), None);
        assert_eq!(OptionTag::from_code("Optioné"), None);
    }

    #[test]
    fn test_option_tag_index_matches_slot_order() {
        for (i, tag) in OptionTag::ALL.iter().enumerate() {
            assert_eq!(tag.index(), i);
        }
    }

    #[test]
    fn test_resolves_correct_text() {
        let q = Question::try_from(record(1, ["int", "float", "String", "boolean"], "Option C"))
            .unwrap();
        assert_eq!(q.correct_tag(), OptionTag::C);
        assert_eq!(q.correct_text(), "String");
        assert!(q.is_correct(OptionTag::C));
        assert!(!q.is_correct(OptionTag::A));
    }

    #[test]
    fn test_empty_options_are_filtered() {
        let q = Question::try_from(record(2, ["True", "", "False", "  "], "Option C")).unwrap();
        let options: Vec<_> = q.options().collect();
        assert_eq!(options, vec![(OptionTag::A, "True"), (OptionTag::C, "False")]);
        assert_eq!(q.option_count(), 2);
        assert_eq!(q.option(OptionTag::B), None);
    }

    #[test]
    fn test_absent_options_are_filtered() {
        let mut rec = record(3, ["yes", "no", "x", "y"], "A");
        rec.option_c = None;
        rec.option_d = None;
        let q = Question::try_from(rec).unwrap();
        assert_eq!(q.option_count(), 2);
    }

    #[test]
    fn test_unresolvable_code_is_flagged() {
        let err = Question::try_from(record(4, ["a", "b", "c", "d"], "Option E")).unwrap_err();
        assert_matches!(
            err,
            MalformedQuestionError::UnknownAnswerCode { id: 4, ref code } if code == "Option E"
        );
        assert_eq!(err.question_id(), 4);
    }

    #[test]
    fn test_literal_answer_text_is_not_a_code() {
        // the raw text would never equal a rendered option letter
        let err = Question::try_from(record(5, ["a", "b", "c", "d"], "b text")).unwrap_err();
        assert_matches!(err, MalformedQuestionError::UnknownAnswerCode { .. });
    }

    #[test]
    fn test_correct_tag_pointing_at_empty_slot() {
        let err = Question::try_from(record(6, ["a", "b", "c", ""], "Option D")).unwrap_err();
        assert_eq!(
            err,
            MalformedQuestionError::MissingCorrectOption {
                id: 6,
                tag: OptionTag::D
            }
        );
    }

    #[test]
    fn test_too_few_options() {
        let err = Question::try_from(record(7, ["only", "", "", ""], "A")).unwrap_err();
        assert_eq!(err, MalformedQuestionError::TooFewOptions { id: 7, present: 1 });
    }

    #[test]
    fn test_empty_prompt() {
        let mut rec = record(8, ["a", "b", "c", "d"], "A");
        rec.question = "   ".into();
        assert_matches!(
            Question::try_from(rec),
            Err(MalformedQuestionError::EmptyPrompt { id: 8 })
        );
    }

    #[test]
    fn test_duplicate_option_text_matches_by_text() {
        let q = Question::try_from(record(9, ["same", "same", "other", "x"], "Option A")).unwrap();
        assert!(q.is_correct(OptionTag::A));
        assert!(q.is_correct(OptionTag::B));
        assert!(!q.is_correct(OptionTag::C));
    }

    #[test]
    fn test_validate_all_keeps_order_and_rejects() {
        let records = vec![
            record(1, ["a", "b", "c", "d"], "A"),
            record(2, ["a", "b", "c", "d"], "Z"),
            record(3, ["a", "b", "c", "d"], "Option D"),
        ];
        let (questions, rejected) = validate_all(records);
        assert_eq!(questions.iter().map(Question::id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].question_id(), 2);
    }

    #[test]
    fn test_record_deserializes_backend_json() {
        let json = r#"{
            "id": 11,
            "question": "What does HTML stand for?",
            "optionA": "Hyper Text Markup Language",
            "optionB": "High Text Markup Language",
            "optionC": null,
            "optionD": "",
            "correctAnswer": "Option A",
            "difficulty": "Easy",
            "category": {"id": 1, "name": "HTML", "description": "HyperText Markup Language"}
        }"#;
        let rec: QuestionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.option_c, None);
        let q = Question::try_from(rec).unwrap();
        assert_eq!(q.option_count(), 2);
        assert_eq!(q.correct_text(), "Hyper Text Markup Language");
        assert_eq!(q.category().map(|c| c.name.as_str()), Some("HTML"));
    }

    #[test]
    fn test_user_progress_defaults_missing_fields() {
        let progress: UserProgress = serde_json::from_str(r#"{"totalScore": 40}"#).unwrap();
        assert_eq!(progress.total_score, 40);
        assert_eq!(progress.quizzes_attempted, 0);
        assert_eq!(progress.user_email, None);
    }

    #[test]
    fn test_difficulty_display() {
        assert_eq!(Difficulty::Easy.to_string(), "Easy");
        assert_eq!(Difficulty::Hard.to_string(), "Hard");
    }
}
