//! In-memory driver shared by the integration tests.
//!
//! Placeholders are `$1, $2, ...` and identifiers are wrapped in backticks,
//! so tests can tell driver output apart from literal template text.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use sqltag::{Driver, Record, SqlTag, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// SQL containing this marker fails.
pub const BAD_SQL: &str = "bad syntax";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mock error: {}", self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInfo {
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockCursorOptions {
    pub batch_size: usize,
}

impl Default for MockCursorOptions {
    fn default() -> Self {
        Self { batch_size: 1 }
    }
}

/// Everything the driver was asked to do.
#[derive(Debug, Default)]
pub struct MockLog {
    pub queries: Mutex<Vec<(String, Vec<Value>)>>,
    pub cursors: Mutex<Vec<(String, Vec<Value>, MockCursorOptions)>>,
    /// Cursors whose stream was actually polled.
    pub cursors_started: AtomicUsize,
    /// Rows handed out by cursor streams.
    pub cursor_rows: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    pub log: Arc<MockLog>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_count(&self) -> usize {
        self.log.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<(String, Vec<Value>)> {
        self.log.queries.lock().unwrap().last().cloned()
    }

    pub fn cursor_count(&self) -> usize {
        self.log.cursors.lock().unwrap().len()
    }

    pub fn cursors_started(&self) -> usize {
        self.log.cursors_started.load(Ordering::SeqCst)
    }

    pub fn cursor_rows(&self) -> usize {
        self.log.cursor_rows.load(Ordering::SeqCst)
    }
}

pub fn users() -> Vec<Record> {
    vec![
        Record::new().with("id", 1).with("name", "alice"),
        Record::new().with("id", 2).with("name", "bob"),
        Record::new().with("id", 3).with("name", "carol"),
    ]
}

pub fn tag() -> SqlTag<MockDriver> {
    SqlTag::new(MockDriver::new())
}

#[async_trait]
impl Driver for MockDriver {
    type Row = Record;
    type Info = MockInfo;
    type Error = MockError;
    type CursorOptions = MockCursorOptions;

    fn parameterize_value(&self, _value: &Value, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn escape_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<(Vec<Record>, MockInfo), MockError> {
        self.log
            .queries
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        if sql.contains(BAD_SQL) {
            return Err(MockError(format!("syntax error in '{}'", sql)));
        }

        let command = sql.split_whitespace().next().unwrap_or_default().to_uppercase();
        Ok((users(), MockInfo { command }))
    }

    fn cursor(
        &self,
        sql: String,
        params: Vec<Value>,
        options: MockCursorOptions,
    ) -> BoxStream<'static, Result<Record, MockError>> {
        self.log
            .cursors
            .lock()
            .unwrap()
            .push((sql.clone(), params, options));

        let log = Arc::clone(&self.log);
        let failing = sql.contains(BAD_SQL);
        let started = stream::once(async move {
            log.cursors_started.fetch_add(1, Ordering::SeqCst);
            log
        });

        started
            .flat_map(move |log| {
                let items: Vec<Result<Record, MockError>> = if failing {
                    vec![
                        Ok(users().remove(0)),
                        Err(MockError("connection reset".to_string())),
                        Ok(users().remove(1)),
                    ]
                } else {
                    users().into_iter().map(Ok).collect()
                };
                stream::iter(items).inspect(move |item| {
                    if item.is_ok() {
                        log.cursor_rows.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .boxed()
    }
}
