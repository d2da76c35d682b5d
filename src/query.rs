//! Deferred queries.
//!
//! A [`Query`] is a template bound to a tag. Building one is free: nothing is
//! compiled and no driver is called until the query is consumed, either as a
//! batch with [`Query::fetch`] or as a stream with [`Query::cursor`]. Each
//! consumption compiles and executes on its own; nothing is cached, so
//! fetching the same query twice runs it twice.
//!
//! ```text
//! Constructed ──fetch()/cursor()──▶ Compiling ──▶ Executing ──▶ Settled(rows | error)
//! ```

use futures::stream::{BoxStream, FusedStream, Stream, StreamExt};
use std::fmt;
use std::ops::Deref;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::compiler::{self, CompiledQuery};
use crate::driver::Driver;
use crate::tag::SqlTag;
use crate::template::Template;
use crate::value::Value;

/// A query that will run once it is consumed.
pub struct Query<D: Driver> {
    tag: SqlTag<D>,
    template: Arc<Template<D>>,
}

impl<D: Driver> Query<D> {
    pub(crate) fn new(tag: SqlTag<D>, template: Template<D>) -> Self {
        Self {
            tag,
            template: Arc::new(template),
        }
    }

    /// The tag (and driver) this query is bound to.
    pub fn tag(&self) -> &SqlTag<D> {
        &self.tag
    }

    pub fn template(&self) -> &Template<D> {
        &self.template
    }

    /// Compile to SQL text and parameters without executing anything.
    pub fn compile(&self) -> CompiledQuery {
        compiler::compile(self.tag.driver(), &self.template)
    }

    /// Compile, appending parameters to an existing list. Used when this
    /// query is spliced into a larger one by hand.
    pub fn compile_into(&self, params: &mut Vec<Value>) -> String {
        compiler::compile_into(self.tag.driver(), &self.template, params)
    }

    /// Compile and execute as a batch.
    ///
    /// Driver failures are returned exactly as the driver produced them.
    pub async fn fetch(&self) -> Result<QueryResult<D>, D::Error> {
        let started = Instant::now();
        let CompiledQuery { sql, params } = self.compile();
        let listeners = self.tag.listeners();
        listeners.before_query(&sql, &params);

        match self.tag.driver().query(&sql, &params).await {
            Ok((rows, info)) => {
                listeners.after_query(&sql, &params, &rows, &info, started.elapsed());
                Ok(QueryResult {
                    rows,
                    info,
                    sql,
                    params,
                })
            }
            Err(e) => {
                tracing::warn!(target: "sqltag", sql = %sql, error = %e, "query failed");
                Err(e)
            }
        }
    }

    /// Compile and execute as a stream, with default cursor options.
    pub fn cursor(&self) -> Cursor<D> {
        self.cursor_with(D::CursorOptions::default())
    }

    /// Compile and execute as a stream.
    pub fn cursor_with(&self, options: D::CursorOptions) -> Cursor<D> {
        let CompiledQuery { sql, params } = self.compile();
        self.tag.listeners().before_query(&sql, &params);
        Cursor::new(self.tag.driver().cursor(sql, params, options))
    }
}

impl<D: Driver> Clone for Query<D> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            template: Arc::clone(&self.template),
        }
    }
}

impl<D: Driver> fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("fragments", &self.template.fragments())
            .field("args", &self.template.args())
            .finish()
    }
}

/// Rows returned by a batch query, with the driver's metadata and the SQL
/// that produced them.
pub struct QueryResult<D: Driver> {
    rows: Vec<D::Row>,
    info: D::Info,
    sql: String,
    params: Vec<Value>,
}

impl<D: Driver> QueryResult<D> {
    pub fn rows(&self) -> &[D::Row] {
        &self.rows
    }

    /// Driver-specific metadata (column descriptors, affected rows, ...).
    pub fn info(&self) -> &D::Info {
        &self.info
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<D::Row> {
        self.rows
    }

    pub fn into_parts(self) -> (Vec<D::Row>, D::Info) {
        (self.rows, self.info)
    }
}

impl<D: Driver> Deref for QueryResult<D> {
    type Target = [D::Row];

    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

impl<D: Driver> IntoIterator for QueryResult<D> {
    type Item = D::Row;
    type IntoIter = std::vec::IntoIter<D::Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, D: Driver> IntoIterator for &'a QueryResult<D> {
    type Item = &'a D::Row;
    type IntoIter = std::slice::Iter<'a, D::Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<D: Driver> fmt::Debug for QueryResult<D>
where
    D::Row: fmt::Debug,
    D::Info: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("rows", &self.rows)
            .field("info", &self.info)
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish()
    }
}

/// A stream of rows from one execution.
///
/// Rows are pulled from the driver one at a time. The first error ends the
/// stream: it is yielded once and every later poll returns `None`. Dropping
/// the cursor early stops pulling; releasing server-side resources is up to
/// the driver's stream.
pub struct Cursor<D: Driver> {
    rows: Option<BoxStream<'static, Result<D::Row, D::Error>>>,
    yielded: u64,
}

impl<D: Driver> Cursor<D> {
    fn new(rows: BoxStream<'static, Result<D::Row, D::Error>>) -> Self {
        Self {
            rows: Some(rows),
            yielded: 0,
        }
    }

    /// Number of rows handed out so far.
    pub fn rows_yielded(&self) -> u64 {
        self.yielded
    }
}

impl<D: Driver> Stream for Cursor<D> {
    type Item = Result<D::Row, D::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(rows) = this.rows.as_mut() else {
            return Poll::Ready(None);
        };

        match rows.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(row))) => {
                this.yielded += 1;
                Poll::Ready(Some(Ok(row)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(target: "sqltag", rows = this.yielded, error = %e, "cursor failed");
                this.rows = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                tracing::debug!(target: "sqltag", rows = this.yielded, "cursor exhausted");
                this.rows = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<D: Driver> FusedStream for Cursor<D> {
    fn is_terminated(&self) -> bool {
        self.rows.is_none()
    }
}

impl<D: Driver> fmt::Debug for Cursor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("yielded", &self.yielded)
            .field("finished", &self.rows.is_none())
            .finish()
    }
}
