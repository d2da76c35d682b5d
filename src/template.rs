//! Template fragment sequences and the values interpolated between them.
//!
//! A template is `N + 1` literal fragments interleaved with `N` arguments:
//!
//! ```text
//! "SELECT * FROM users WHERE id = " {1} " AND name = " {"bob"} ""
//!  └──────────── fragment 0 ──────┘  │  └─ fragment 1 ─┘   │    └ fragment 2
//!                                  arg 0                 arg 1
//! ```
//!
//! The [`Template`] builder keeps that invariant by construction; the
//! [`sql!`](crate::sql) macro is the usual way to write one.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

use crate::driver::Driver;
use crate::error::{SqlTagError, SqlTagResult};
use crate::parser;
use crate::query::Query;
use crate::tag::SqlTag;
use crate::value::Value;

/// One interpolated slot of a template.
pub enum Arg<D: Driver> {
    /// Skip this slot: no text, no parameter.
    Omitted,
    /// A sub-expression, inlined at compile time.
    Nested(Query<D>),
    /// A plain value, bound as a parameter.
    Value(Value),
}

impl<D: Driver> Arg<D> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Arg::Omitted)
    }
}

impl<D: Driver> Clone for Arg<D> {
    fn clone(&self) -> Self {
        match self {
            Arg::Omitted => Arg::Omitted,
            Arg::Nested(query) => Arg::Nested(query.clone()),
            Arg::Value(value) => Arg::Value(value.clone()),
        }
    }
}

impl<D: Driver> fmt::Debug for Arg<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Omitted => f.write_str("Omitted"),
            Arg::Nested(query) => f.debug_tuple("Nested").field(query).finish(),
            Arg::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

// Implement From traits for Arg
macro_rules! impl_arg_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl<D: Driver> From<$t> for Arg<D> {
                fn from(v: $t) -> Self {
                    Arg::Value(v.into())
                }
            }
        )*
    };
}

impl_arg_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    &str,
    String,
    &String,
    &[u8],
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate,
    serde_json::Value,
    Value,
);

impl<D: Driver, T: Into<Value>> From<Vec<T>> for Arg<D> {
    fn from(v: Vec<T>) -> Self {
        Arg::Value(v.into())
    }
}

impl<D: Driver> From<Query<D>> for Arg<D> {
    fn from(query: Query<D>) -> Self {
        Arg::Nested(query)
    }
}

impl<D: Driver> From<&Query<D>> for Arg<D> {
    fn from(query: &Query<D>) -> Self {
        Arg::Nested(query.clone())
    }
}

/// `None` omits the slot entirely; use `Value::Null` to bind SQL `NULL`.
impl<D: Driver, T: Into<Arg<D>>> From<Option<T>> for Arg<D> {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Arg::Omitted)
    }
}

/// Literal fragments interleaved with interpolated arguments.
pub struct Template<D: Driver> {
    fragments: Vec<String>,
    args: Vec<Arg<D>>,
}

impl<D: Driver> Template<D> {
    /// An empty template: one empty fragment, no arguments.
    pub fn new() -> Self {
        Self {
            fragments: vec![String::new()],
            args: Vec::new(),
        }
    }

    /// An empty template for the driver `tag` is bound to.
    pub fn for_tag(_tag: &SqlTag<D>) -> Self {
        Self::new()
    }

    /// Build from explicit parts. There must be exactly one more fragment
    /// than there are arguments.
    pub fn from_parts(fragments: Vec<String>, args: Vec<Arg<D>>) -> SqlTagResult<Self> {
        if fragments.len() != args.len() + 1 {
            return Err(SqlTagError::FragmentCount {
                fragments: fragments.len(),
                args: args.len(),
                expected: args.len() + 1,
            });
        }
        Ok(Self { fragments, args })
    }

    /// Build from parts the caller already knows to be well formed.
    pub(crate) fn from_parts_unchecked(fragments: Vec<String>, args: Vec<Arg<D>>) -> Self {
        debug_assert_eq!(fragments.len(), args.len() + 1);
        Self { fragments, args }
    }

    /// Build from a text template with `{}` slots (see [`crate::parser`]).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let template = Template::parse("SELECT * FROM users WHERE id = {}", [Arg::from(7)])?;
    /// ```
    pub fn parse<I>(text: &str, args: I) -> SqlTagResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        let fragments = parser::parse_fragments(text)?;
        Self::from_parts(fragments, args.into_iter().map(Into::into).collect())
    }

    /// Append literal text to the current fragment.
    pub fn push_text(&mut self, text: &str) -> &mut Self {
        if let Some(last) = self.fragments.last_mut() {
            last.push_str(text);
        }
        self
    }

    /// Append an argument and open the next fragment.
    pub fn push_arg(&mut self, arg: impl Into<Arg<D>>) -> &mut Self {
        self.args.push(arg.into());
        self.fragments.push(String::new());
        self
    }

    /// Builder-style [`push_text`](Self::push_text).
    pub fn text(mut self, text: &str) -> Self {
        self.push_text(text);
        self
    }

    /// Builder-style [`push_arg`](Self::push_arg).
    pub fn arg(mut self, arg: impl Into<Arg<D>>) -> Self {
        self.push_arg(arg);
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn args(&self) -> &[Arg<D>] {
        &self.args
    }

    /// Fragments paired with the argument that follows each of them (the
    /// last fragment has none).
    pub(crate) fn slots(&self) -> impl Iterator<Item = (&str, Option<&Arg<D>>)> {
        self.fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| (fragment.as_str(), self.args.get(i)))
    }
}

impl<D: Driver> Default for Template<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Driver> Clone for Template<D> {
    fn clone(&self) -> Self {
        Self {
            fragments: self.fragments.clone(),
            args: self.args.clone(),
        }
    }
}

impl<D: Driver> fmt::Debug for Template<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("fragments", &self.fragments)
            .field("args", &self.args)
            .finish()
    }
}

impl<D: Driver> From<&str> for Template<D> {
    fn from(text: &str) -> Self {
        Self {
            fragments: vec![text.to_string()],
            args: Vec::new(),
        }
    }
}

impl<D: Driver> From<String> for Template<D> {
    fn from(text: String) -> Self {
        Self {
            fragments: vec![text],
            args: Vec::new(),
        }
    }
}

/// Write a template inline and turn it into a [`Query`] on the given tag.
///
/// String literals are fragments; `{ expr }` blocks are interpolated
/// arguments (values, nested queries, `Option`s, `Arg::Omitted`).
///
/// ```rust,ignore
/// let user = sql!(tag; "SELECT * FROM users WHERE id = " {1} " AND name = " {"bob"});
/// let filter = sql!(tag; "WHERE id = " {1});
/// let outer = sql!(tag; "SELECT * FROM users " {filter});
/// ```
#[macro_export]
macro_rules! sql {
    ($tag:expr; $($part:tt)*) => {{
        let tag = &$tag;
        #[allow(unused_mut)]
        let mut template = $crate::Template::for_tag(tag);
        $( $crate::__sql_part!(template, $part); )*
        tag.query(template)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sql_part {
    ($template:ident, { $arg:expr }) => {
        $template.push_arg($arg);
    };
    ($template:ident, $text:literal) => {
        $template.push_text($text);
    };
}
