//! Database-style cursor over an executor
//!
//! A cursor sends one query at a time and buffers the returned rows until
//! they are fetched. It is not shared between threads; each cursor owns
//! its buffer exclusively.

use crate::client::executor::{Executor, Row};
use crate::query::{render, QueryResult, Value, PLACEHOLDER};
use std::collections::VecDeque;
use std::sync::Arc;

/// Cursor returned by [`crate::client::Connection::cursor`].
///
/// Dropping the cursor closes it.
pub struct Cursor {
    executor: Arc<dyn Executor>,
    last_query: Option<String>,
    rows: VecDeque<Row>,
    closed: bool,
}

impl Cursor {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            last_query: None,
            rows: VecDeque::new(),
            closed: false,
        }
    }

    /// Run a query, substituting `%s` placeholders with `params` in order.
    ///
    /// The row buffer is replaced, not appended to. On failure it is left
    /// empty.
    pub fn execute(&mut self, query: &str, params: &[Value]) -> QueryResult<&mut Self> {
        let rendered = self.mogrify(query, params);
        self.rows.clear();
        self.last_query = Some(rendered.clone());

        tracing::debug!(executor = self.executor.name(), "executing flux:\n{}", rendered);
        let rows = self.executor.query(&rendered)?;
        self.rows = rows.into();
        Ok(self)
    }

    /// Render a query with its placeholders filled in, without running it.
    ///
    /// Surplus values are ignored; missing values leave the remaining
    /// placeholders untouched.
    pub fn mogrify(&self, query: &str, params: &[Value]) -> String {
        // Only the caller's text is scanned; rendered values are never re-read
        let mut pieces = query.split(PLACEHOLDER);
        let mut rendered = String::with_capacity(query.len());
        rendered.push_str(pieces.next().unwrap_or_default());

        let mut values = params.iter();
        for piece in pieces {
            match values.next() {
                Some(value) => rendered.push_str(&render(value)),
                None => rendered.push_str(PLACEHOLDER),
            }
            rendered.push_str(piece);
        }
        rendered
    }

    /// The last query sent, after placeholder substitution
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Number of rows still buffered
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Take the next row
    pub fn fetchone(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Take up to `size` rows; `None` or `0` takes one
    pub fn fetchmany(&mut self, size: Option<usize>) -> Vec<Row> {
        let size = size.filter(|&n| n > 0).unwrap_or(1).min(self.rows.len());
        self.rows.drain(..size).collect()
    }

    /// Take every remaining row
    pub fn fetchall(&mut self) -> Vec<Row> {
        self.rows.drain(..).collect()
    }

    /// Close the cursor and the executor handle behind it
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.executor.close();
        }
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.fetchone()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}
