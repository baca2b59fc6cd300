mod common;

use assert_matches::assert_matches;
use common::{platform_routes, Route, StubServer};
use kwiz::api::{ApiError, HttpQuizApi, QuestionQuery, QuizApi};
use kwiz::question::{validate_all, Difficulty};
use reqwest::StatusCode;

#[test]
fn fetches_and_parses_categories() {
    let server = StubServer::start(platform_routes());
    let api = HttpQuizApi::new(server.base_url.clone(), None, None).unwrap();

    let categories = api.categories().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].name, "HTML");
    assert_eq!(categories[1].description, None);
}

#[test]
fn questions_keep_server_order_and_validate() {
    let server = StubServer::start(platform_routes());
    let api = HttpQuizApi::new(server.base_url.clone(), None, None).unwrap();

    let records = api.questions(&QuestionQuery::new(1)).unwrap();
    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(records[2].option_d, None);

    let (questions, rejected) = validate_all(records);
    assert!(rejected.is_empty());
    assert_eq!(questions[1].correct_text(), "<br>");
    assert_eq!(questions[2].option_count(), 3);
}

#[test]
fn difficulty_is_part_of_the_path() {
    let server = StubServer::start(platform_routes());
    let api = HttpQuizApi::new(server.base_url.clone(), None, None).unwrap();

    let query = QuestionQuery::new(1).with_difficulty(Some(Difficulty::Hard));
    assert!(api.questions(&query).unwrap().is_empty());
    assert_eq!(server.requests()[0].target, "/api/quiz/questions/1/Hard");
}

#[test]
fn non_success_status_is_an_error() {
    let server = StubServer::start(vec![Route::status("GET", "quiz/questions/7", 500)]);
    let api = HttpQuizApi::new(server.base_url.clone(), None, None).unwrap();

    let err = api.questions(&QuestionQuery::new(7)).unwrap_err();
    assert_matches!(err, ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR));

    // unknown routes answer 404
    let err = api.categories().unwrap_err();
    assert_matches!(err, ApiError::Status(StatusCode::NOT_FOUND));
}

#[test]
fn submission_posts_score_as_query_parameters() {
    let server = StubServer::start(platform_routes());
    let api = HttpQuizApi::new(server.base_url.clone(), Some("t0ken".into()), None).unwrap();

    api.submit_progress(20, false).unwrap();

    let seen = server.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].target, "/api/user/progress?score=20&problemSolved=false");
    assert_eq!(seen[0].header("authorization"), Some("Bearer t0ken"));
}

#[test]
fn requests_without_token_carry_no_authorization() {
    let server = StubServer::start(platform_routes());
    let api = HttpQuizApi::new(server.base_url.clone(), None, None).unwrap();

    let progress = api.dashboard().unwrap();
    assert_eq!(progress.total_score, 140);
    assert_eq!(progress.user_email.as_deref(), Some("learner@example.com"));
    assert_eq!(server.requests()[0].header("authorization"), None);
}

#[test]
fn invalid_json_is_an_http_error() {
    let server = StubServer::start(vec![Route::json("GET", "quiz/categories", "not json")]);
    let api = HttpQuizApi::new(server.base_url.clone(), None, None).unwrap();

    assert_matches!(api.categories(), Err(ApiError::Http(_)));
}
