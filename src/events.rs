//! Query lifecycle notifications.
//!
//! Every execution is announced twice: right before the driver is called
//! (batch and cursor alike) and, for batch queries, once the rows are back.
//! Listeners are advisory; they cannot alter or veto a query. Each
//! notification is also emitted as a `tracing` event under the `sqltag`
//! target.

use std::fmt;
use std::time::Duration;

use crate::driver::Driver;
use crate::value::Value;

/// Sent before a query is handed to the driver.
#[derive(Debug, Clone, Copy)]
pub struct BeforeQuery<'a> {
    pub sql: &'a str,
    pub params: &'a [Value],
}

/// Sent after a batch query completed successfully.
pub struct AfterQuery<'a, D: Driver> {
    pub sql: &'a str,
    pub params: &'a [Value],
    pub rows: &'a [D::Row],
    pub info: &'a D::Info,
    pub elapsed: Duration,
}

/// Observer of query executions.
pub trait QueryListener<D: Driver>: Send + Sync {
    fn before_query(&self, _event: &BeforeQuery<'_>) {}

    fn after_query(&self, _event: &AfterQuery<'_, D>) {}
}

/// Adapts a closure into a `before_query` listener.
pub(crate) struct BeforeFn<F>(pub(crate) F);

impl<D, F> QueryListener<D> for BeforeFn<F>
where
    D: Driver,
    F: Fn(&BeforeQuery<'_>) + Send + Sync,
{
    fn before_query(&self, event: &BeforeQuery<'_>) {
        (self.0)(event)
    }
}

/// Adapts a closure into an `after_query` listener.
pub(crate) struct AfterFn<F>(pub(crate) F);

impl<D, F> QueryListener<D> for AfterFn<F>
where
    D: Driver,
    F: Fn(&AfterQuery<'_, D>) + Send + Sync,
{
    fn after_query(&self, event: &AfterQuery<'_, D>) {
        (self.0)(event)
    }
}

/// The listeners registered on one tag.
pub(crate) struct Listeners<D: Driver> {
    listeners: Vec<Box<dyn QueryListener<D>>>,
}

impl<D: Driver> Listeners<D> {
    pub(crate) fn new(listeners: Vec<Box<dyn QueryListener<D>>>) -> Self {
        Self { listeners }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn before_query(&self, sql: &str, params: &[Value]) {
        tracing::debug!(target: "sqltag", sql, params = params.len(), "executing query");

        let event = BeforeQuery { sql, params };
        for listener in &self.listeners {
            listener.before_query(&event);
        }
    }

    pub(crate) fn after_query(
        &self,
        sql: &str,
        params: &[Value],
        rows: &[D::Row],
        info: &D::Info,
        elapsed: Duration,
    ) {
        tracing::debug!(
            target: "sqltag",
            sql,
            rows = rows.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "query complete"
        );

        let event = AfterQuery {
            sql,
            params,
            rows,
            info,
            elapsed,
        };
        for listener in &self.listeners {
            listener.after_query(&event);
        }
    }
}

impl<D: Driver> fmt::Debug for Listeners<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.listeners.len())
    }
}
