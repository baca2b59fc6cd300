// Minimal HTTP/1.1 stub for exercising the API client without a backend.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn json(method: &'static str, path: &'static str, body: impl Into<String>) -> Self {
        Self {
            method,
            path,
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(method: &'static str, path: &'static str, status: u16) -> Self {
        Self {
            method,
            path,
            status,
            body: String::new(),
        }
    }
}

/// A request as seen by the stub: request target plus lower-cased headers
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl Seen {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub struct StubServer {
    pub base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl StubServer {
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub address");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let routes = routes.clone();
                let log = log.clone();
                thread::spawn(move || handle(stream, &routes, &log));
            }
        });

        Self {
            base_url: format!("http://{addr}/api"),
            seen,
        }
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn handle(stream: TcpStream, routes: &[Route], log: &Mutex<Vec<Seen>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim().to_ascii_lowercase();
            let v = v.trim().to_string();
            if k == "content-length" {
                content_length = v.parse().unwrap_or(0);
            }
            headers.push((k, v));
        }
    }
    let mut body = vec![0u8; content_length];
    let _ = reader.read_exact(&mut body);

    let path = target.split('?').next().unwrap_or_default();
    let route = routes
        .iter()
        .find(|r| r.method == method && format!("/api/{}", r.path) == path);

    log.lock().unwrap().push(Seen {
        method,
        target: target.clone(),
        headers,
    });

    let (status, body) = match route {
        Some(r) => (r.status, r.body.clone()),
        None => (404, String::new()),
    };
    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

pub const CATEGORIES_JSON: &str = r#"[
    {"id": 1, "name": "HTML", "description": "Structure of the web"},
    {"id": 4, "name": "Java", "description": null}
]"#;

/// Three questions in the shapes the backend serves: full codes, a bare
/// letter and a question with only three options.
pub const QUESTIONS_JSON: &str = r#"[
    {"id": 1, "question": "What does HTML stand for?",
     "optionA": "HyperText Markup Language", "optionB": "HighText Machine Language",
     "optionC": "Hyperlink Text Mark Language", "optionD": "Home Tool Markup Language",
     "correctAnswer": "Option A", "difficulty": "Easy",
     "category": {"id": 1, "name": "HTML", "description": "Structure of the web"}},
    {"id": 2, "question": "Which tag makes a line break?",
     "optionA": "<lb>", "optionB": "<br>", "optionC": "<break>", "optionD": "<newline>",
     "correctAnswer": "B", "difficulty": "Easy"},
    {"id": 3, "question": "Which attribute gives an image alternative text?",
     "optionA": "title", "optionB": "src", "optionC": "alt", "optionD": null,
     "correctAnswer": "Option C", "difficulty": "Medium"}
]"#;

pub const DASHBOARD_JSON: &str = r#"{
    "userEmail": "learner@example.com",
    "quizzesAttempted": 5,
    "problemsSolved": 2,
    "totalScore": 140
}"#;

pub fn platform_routes() -> Vec<Route> {
    vec![
        Route::json("GET", "quiz/categories", CATEGORIES_JSON),
        Route::json("GET", "quiz/questions/1", QUESTIONS_JSON),
        Route::json("GET", "quiz/questions/1/Hard", "[]"),
        Route::json("GET", "user/dashboard", DASHBOARD_JSON),
        Route::json("POST", "user/progress", DASHBOARD_JSON),
    ]
}
