use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::quiz::QuizSummary;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One completed session as written to `history.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: DateTime<Local>,
    pub category: String,
    pub questions: usize,
    pub score: u32,
    pub accuracy: u32,
}

impl SessionRecord {
    pub fn from_summary(category: impl Into<String>, summary: &QuizSummary) -> Self {
        Self {
            date: Local::now(),
            category: category.into(),
            questions: summary.question_count,
            score: summary.score,
            accuracy: summary.accuracy,
        }
    }
}

/// Append-only local log of finished sessions
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            path: AppDirs::history_path().unwrap_or_else(|| PathBuf::from("kwiz_history.csv")),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, record: &SessionRecord) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // emit a header only for a fresh file
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<SessionRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<SessionRecord>, csv::Error>>()?;
        Ok(records)
    }

    /// The `n` most recent sessions, newest first
    pub fn recent(&self, n: usize) -> Result<Vec<SessionRecord>, HistoryError> {
        let mut records = self.read_all()?;
        records.reverse();
        records.truncate(n);
        Ok(records)
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
