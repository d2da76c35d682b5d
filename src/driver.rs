//! The capability interface every database backend implements.
//!
//! The core only ever talks to a database through this trait: it asks the
//! driver how to spell placeholders and identifiers while compiling, and hands
//! it the finished `(sql, params)` pair when a query is consumed.
//!
//! # Example
//!
//! ```rust,ignore
//! struct MyDriver { /* connection handle */ }
//!
//! #[async_trait]
//! impl Driver for MyDriver {
//!     type Row = serde_json::Value;
//!     type Info = u64;
//!     type Error = MyError;
//!     type CursorOptions = ();
//!
//!     fn parameterize_value(&self, _value: &Value, index: usize) -> String {
//!         format!("${}", index + 1)
//!     }
//!
//!     fn escape_identifier(&self, name: &str) -> String {
//!         format!("\"{}\"", name.replace('"', "\"\""))
//!     }
//!
//!     async fn query(&self, sql: &str, params: &[Value]) -> Result<(Vec<Self::Row>, u64), MyError> {
//!         /* run it */
//!     }
//!
//!     fn cursor(&self, sql: String, params: Vec<Value>, _: ()) -> BoxStream<'static, Result<Self::Row, MyError>> {
//!         /* stream it */
//!     }
//! }
//! ```

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::value::Value;

/// A database backend.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// One result row.
    type Row: Send + 'static;
    /// Backend-specific metadata returned next to the rows (column
    /// descriptors, affected-row counts, ...). Opaque to the core.
    type Info: Send + 'static;
    /// The backend's own failure type; passed through to callers untouched.
    type Error: std::error::Error + Send + Sync + 'static;
    /// Extra knobs accepted by [`Driver::cursor`].
    type CursorOptions: Default + Send + 'static;

    /// Placeholder text for the parameter at zero-based `index`
    /// (`?` for every parameter, `$1`-style positions, ...).
    fn parameterize_value(&self, value: &Value, index: usize) -> String;

    /// Transform a value before it is bound. Defaults to
    /// [`Value::serialize_default`].
    fn serialize_value(&self, value: Value) -> Value {
        value.serialize_default()
    }

    /// Quote an identifier (table or column name).
    fn escape_identifier(&self, name: &str) -> String;

    /// Execute a parameterized query and return every row at once.
    async fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<(Vec<Self::Row>, Self::Info), Self::Error>;

    /// Execute a parameterized query and stream the rows one at a time.
    ///
    /// The stream should not touch the database before it is first polled,
    /// and must release whatever it holds when dropped early.
    fn cursor(
        &self,
        sql: String,
        params: Vec<Value>,
        options: Self::CursorOptions,
    ) -> BoxStream<'static, Result<Self::Row, Self::Error>>;
}
