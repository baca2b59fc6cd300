use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::api::QuizApi;
use crate::outbox::{Outbox, PendingSubmission};
use crate::question::CategoryId;

/// What happened to a best-effort score submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SubmitOutcome {
    #[strum(to_string = "score saved")]
    Delivered,
    #[strum(to_string = "server unreachable, score queued for later")]
    Queued,
    #[strum(to_string = "score could not be saved")]
    Lost,
}

/// Post a finished session's score. Never fails: errors are logged and the
/// submission is handed to the outbox when one is available.
pub fn submit_result<A: QuizApi + ?Sized>(
    api: &A,
    outbox: Option<&Outbox>,
    score: u32,
    category: Option<CategoryId>,
) -> SubmitOutcome {
    let err = match api.submit_progress(score, false) {
        Ok(()) => {
            tracing::info!(score, "score submitted");
            return SubmitOutcome::Delivered;
        }
        Err(e) => e,
    };
    tracing::warn!(score, "failed to submit score: {err}");

    let Some(outbox) = outbox else {
        return SubmitOutcome::Lost;
    };
    match outbox.enqueue(&PendingSubmission::quiz_score(score, category)) {
        Ok(id) => {
            tracing::info!(id, score, "score queued in outbox");
            SubmitOutcome::Queued
        }
        Err(e) => {
            tracing::error!(score, "failed to queue score: {e}");
            SubmitOutcome::Lost
        }
    }
}

/// Run `submit_result` on a background thread and report the outcome.
///
/// The outbox is opened inside the worker since the connection is not `Sync`.
pub fn spawn_submit<F>(
    api: Arc<dyn QuizApi>,
    outbox_path: Option<PathBuf>,
    score: u32,
    category: Option<CategoryId>,
    on_done: F,
) -> JoinHandle<()>
where
    F: FnOnce(SubmitOutcome) + Send + 'static,
{
    thread::spawn(move || {
        let outbox = outbox_path.and_then(|path| match Outbox::open(&path) {
            Ok(outbox) => Some(outbox),
            Err(e) => {
                tracing::error!(path = %path.display(), "cannot open outbox: {e}");
                None
            }
        });
        on_done(submit_result(api.as_ref(), outbox.as_ref(), score, category));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, QuestionQuery};
    use crate::question::{Category, QuestionRecord, UserProgress};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct RecordingApi {
        accept: bool,
        calls: Mutex<Vec<(u32, bool)>>,
    }

    impl RecordingApi {
        fn new(accept: bool) -> Self {
            Self {
                accept,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl QuizApi for RecordingApi {
        fn categories(&self) -> Result<Vec<Category>, ApiError> {
            Ok(Vec::new())
        }

        fn questions(&self, _query: &QuestionQuery) -> Result<Vec<QuestionRecord>, ApiError> {
            Ok(Vec::new())
        }

        fn submit_progress(&self, score: u32, problem_solved: bool) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push((score, problem_solved));
            if self.accept {
                Ok(())
            } else {
                Err(ApiError::Status(reqwest::StatusCode::BAD_GATEWAY))
            }
        }

        fn dashboard(&self) -> Result<UserProgress, ApiError> {
            Ok(UserProgress::default())
        }
    }

    #[test]
    fn test_delivered_posts_quiz_score() {
        let api = RecordingApi::new(true);
        let outbox = Outbox::in_memory().unwrap();
        let outcome = submit_result(&api, Some(&outbox), 30, Some(1));
        assert_eq!(outcome, SubmitOutcome::Delivered);
        assert_eq!(*api.calls.lock().unwrap(), vec![(30, false)]);
        assert!(outbox.is_empty().unwrap());
    }

    #[test]
    fn test_failure_is_queued() {
        let api = RecordingApi::new(false);
        let outbox = Outbox::in_memory().unwrap();
        let outcome = submit_result(&api, Some(&outbox), 20, Some(4));
        assert_eq!(outcome, SubmitOutcome::Queued);
        let pending = outbox.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].submission.score, 20);
        assert_eq!(pending[0].submission.category_id, Some(4));
    }

    #[test]
    fn test_failure_without_outbox_is_lost() {
        let api = RecordingApi::new(false);
        assert_eq!(submit_result(&api, None, 20, None), SubmitOutcome::Lost);
    }

    #[test]
    fn test_spawn_submit_reports_outcome() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outbox.db");
        let api: Arc<dyn QuizApi> = Arc::new(RecordingApi::new(false));
        let (tx, rx) = mpsc::channel();

        spawn_submit(api, Some(path.clone()), 10, None, move |outcome| {
            tx.send(outcome).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(rx.recv().unwrap(), SubmitOutcome::Queued);
        assert_eq!(Outbox::open(&path).unwrap().len().unwrap(), 1);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(SubmitOutcome::Delivered.to_string(), "score saved");
        assert!(SubmitOutcome::Queued.to_string().contains("queued"));
    }
}
