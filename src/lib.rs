//! # sqltag
//!
//! > **Write SQL. Nest it. Run it when you need it.**
//!
//! sqltag builds parameterized SQL from templates: literal fragments with
//! values and sub-queries interpolated between them. Nested templates are
//! flattened into a single `(sql, params)` pair with placeholders numbered
//! across the whole tree, and nothing touches the database until the query
//! is consumed.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sqltag::prelude::*;
//!
//! let sql = SqlTag::new(SqlxDriver::connect("postgres://localhost/app").await?);
//!
//! let filter = sql.and([
//!     sql!(sql; "age > " {18}),
//!     sql!(sql; "name = " {"bob"}),
//! ]);
//! let users = sql!(sql; "SELECT * FROM " {sql.id("users")} " WHERE " {filter});
//!
//! assert_eq!(
//!     users.compile().sql,
//!     r#"SELECT * FROM "users" WHERE (age > $1 AND name = $2)"#,
//! );
//!
//! let rows = users.fetch().await?;            // batch
//! let mut cursor = users.cursor();            // stream
//! while let Some(row) = cursor.next().await { /* ... */ }
//! ```
//!
//! ## Interpolation
//!
//! | Argument            | Compiles to                         |
//! |---------------------|-------------------------------------|
//! | value               | driver placeholder, value in params |
//! | `Query`             | its own SQL, inlined                |
//! | `None` / `Omitted`  | nothing                             |
//! | `sql.id("t")`       | escaped identifier                  |
//! | `sql.raw("NOW()")`  | the text as-is                      |

pub mod compiler;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod parser;
pub mod query;
pub mod tag;
pub mod template;
pub mod value;

pub use compiler::CompiledQuery;
pub use config::Config;
pub use dialect::Dialect;
pub use driver::Driver;
pub use engine::{SqlxCursorOptions, SqlxDriver, SqlxRow};
pub use error::{SqlTagError, SqlTagResult};
pub use query::{Cursor, Query, QueryResult};
pub use tag::{SqlTag, SqlTagBuilder};
pub use template::{Arg, Template};
pub use value::{Record, Value};

pub mod prelude {
    pub use crate::compiler::CompiledQuery;
    pub use crate::config::Config;
    pub use crate::dialect::Dialect;
    pub use crate::driver::Driver;
    pub use crate::engine::{ColumnInfo, SqlxCursorOptions, SqlxDriver, SqlxQueryInfo, SqlxRow};
    pub use crate::error::*;
    pub use crate::events::{AfterQuery, BeforeQuery, QueryListener};
    pub use crate::query::{Cursor, Query, QueryResult};
    pub use crate::sql;
    pub use crate::tag::{SqlTag, SqlTagBuilder};
    pub use crate::template::{Arg, Template};
    pub use crate::value::{Record, Value};
    pub use futures::StreamExt;
}
