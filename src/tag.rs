//! The expression-builder facade.
//!
//! A [`SqlTag`] binds a driver. Its [`query`](SqlTag::query) method is the
//! entry point that turns a template into a deferred [`Query`]; the other
//! methods build sub-expressions meant to be interpolated into a larger
//! template rather than executed on their own.

use std::fmt;
use std::iter;
use std::sync::Arc;

use crate::compiler::CompiledQuery;
use crate::driver::Driver;
use crate::events::{AfterFn, AfterQuery, BeforeFn, BeforeQuery, Listeners, QueryListener};
use crate::query::Query;
use crate::template::{Arg, Template};
use crate::value::{Record, Value};

/// A driver plus the helpers for composing queries against it.
///
/// Cloning is cheap; clones share the driver and listeners.
pub struct SqlTag<D: Driver> {
    inner: Arc<TagInner<D>>,
}

struct TagInner<D: Driver> {
    driver: D,
    listeners: Listeners<D>,
}

impl<D: Driver> SqlTag<D> {
    /// A tag with no listeners.
    pub fn new(driver: D) -> Self {
        Self::builder(driver).build()
    }

    pub fn builder(driver: D) -> SqlTagBuilder<D> {
        SqlTagBuilder {
            driver,
            listeners: Vec::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.inner.driver
    }

    pub(crate) fn listeners(&self) -> &Listeners<D> {
        &self.inner.listeners
    }

    /// Wrap a template as a deferred query. Nothing runs until the query is
    /// fetched or opened as a cursor.
    pub fn query(&self, template: impl Into<Template<D>>) -> Query<D> {
        Query::new(self.clone(), template.into())
    }

    /// Compile a template without executing it.
    pub fn compile(&self, template: impl Into<Template<D>>) -> CompiledQuery {
        self.query(template).compile()
    }

    /// Join items with `", "`, skipping omitted ones.
    pub fn join<I>(&self, items: I) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        self.join_with(items, ", ")
    }

    /// Join items with `separator`, skipping omitted ones. No items yields an
    /// empty expression; one item yields that item.
    pub fn join_with<I>(&self, items: I, separator: &str) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        let args = present(items);
        let fragments = match args.len() {
            0 => vec![String::new()],
            n => iter::once(String::new())
                .chain(iter::repeat(separator.to_string()).take(n - 1))
                .chain(iter::once(String::new()))
                .collect(),
        };
        self.query(Template::from_parts_unchecked(fragments, args))
    }

    /// An escaped identifier (table or column name). Never a parameter.
    pub fn id(&self, name: &str) -> Query<D> {
        self.query(self.driver().escape_identifier(name))
    }

    /// Literal SQL, inserted as-is. Never a parameter.
    pub fn raw(&self, text: impl Into<String>) -> Query<D> {
        let text: String = text.into();
        self.query(text)
    }

    /// `(a AND b AND ...)`
    pub fn and<I>(&self, items: I) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        self.group(items, " AND ")
    }

    /// `(a OR b OR ...)`
    pub fn or<I>(&self, items: I) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        self.group(items, " OR ")
    }

    fn group<I>(&self, items: I, separator: &str) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        self.query(
            Template::<D>::new()
                .text("(")
                .arg(self.join_with(items, separator))
                .text(")"),
        )
    }

    /// `column IN (v1, v2, ...)`, or a bare `0` parameter when no values
    /// remain after dropping omitted ones.
    pub fn in_list<I>(&self, column: &str, values: I) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        self.in_list_or(column, values, 0)
    }

    /// Like [`in_list`](Self::in_list), with `if_empty` bound as the lone
    /// parameter when the list is empty (`1` for an always-true filter).
    pub fn in_list_or<I>(&self, column: &str, values: I, if_empty: impl Into<Value>) -> Query<D>
    where
        I: IntoIterator,
        I::Item: Into<Arg<D>>,
    {
        let values = present(values);
        if values.is_empty() {
            let if_empty: Value = if_empty.into();
            return self.query(Template::<D>::new().arg(if_empty));
        }

        self.query(
            Template::<D>::new()
                .arg(self.id(column))
                .text(" IN (")
                .arg(self.join(values))
                .text(")"),
        )
    }

    /// `key1 = v1, key2 = v2, ...` for an `UPDATE ... SET` clause. Uses
    /// `keys` when given, every record key otherwise.
    pub fn set_values(&self, record: &Record, keys: &[&str]) -> Query<D> {
        let keys = pick_keys(Some(record), keys);
        self.join(keys.iter().map(|key| {
            self.query(
                Template::<D>::new()
                    .arg(self.id(key))
                    .text(" = ")
                    .arg(field::<D>(record, key)),
            )
        }))
    }

    /// `(col1, col2) VALUES (v1, v2), (v3, v4), ...` for an `INSERT`. Uses
    /// `keys` when given, the first record's keys otherwise.
    pub fn insert_values(&self, records: &[Record], keys: &[&str]) -> Query<D> {
        let keys = pick_keys(records.first(), keys);
        let columns = self.join(keys.iter().map(|key| self.id(key)));
        let rows = self.join(records.iter().map(|record| {
            let values = self.join(keys.iter().map(|key| field::<D>(record, key)));
            self.query(Template::<D>::new().text("(").arg(values).text(")"))
        }));

        self.query(
            Template::<D>::new()
                .text("(")
                .arg(columns)
                .text(") VALUES ")
                .arg(rows),
        )
    }

    /// Single-row form of [`insert_values`](Self::insert_values).
    pub fn insert_row(&self, record: &Record, keys: &[&str]) -> Query<D> {
        self.insert_values(std::slice::from_ref(record), keys)
    }
}

fn present<D, I>(items: I) -> Vec<Arg<D>>
where
    D: Driver,
    I: IntoIterator,
    I::Item: Into<Arg<D>>,
{
    items
        .into_iter()
        .map(Into::into)
        .filter(|arg: &Arg<D>| !arg.is_omitted())
        .collect()
}

fn pick_keys(record: Option<&Record>, keys: &[&str]) -> Vec<String> {
    if !keys.is_empty() {
        return keys.iter().map(|k| k.to_string()).collect();
    }
    record
        .map(|r| r.keys().map(String::from).collect())
        .unwrap_or_default()
}

fn field<D: Driver>(record: &Record, key: &str) -> Arg<D> {
    record
        .get(key)
        .cloned()
        .map(Arg::Value)
        .unwrap_or(Arg::Omitted)
}

impl<D: Driver> Clone for SqlTag<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Driver + fmt::Debug> fmt::Debug for SqlTag<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlTag")
            .field("driver", &self.inner.driver)
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

/// Builder for [`SqlTag`].
pub struct SqlTagBuilder<D: Driver> {
    driver: D,
    listeners: Vec<Box<dyn QueryListener<D>>>,
}

impl<D: Driver> SqlTagBuilder<D> {
    /// Register a listener.
    pub fn listener(mut self, listener: impl QueryListener<D> + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Register a closure called before each execution.
    pub fn on_before_query<F>(self, f: F) -> Self
    where
        F: Fn(&BeforeQuery<'_>) + Send + Sync + 'static,
    {
        self.listener(BeforeFn(f))
    }

    /// Register a closure called after each successful batch execution.
    pub fn on_after_query<F>(self, f: F) -> Self
    where
        F: Fn(&AfterQuery<'_, D>) + Send + Sync + 'static,
    {
        self.listener(AfterFn(f))
    }

    pub fn build(self) -> SqlTag<D> {
        SqlTag {
            inner: Arc::new(TagInner {
                driver: self.driver,
                listeners: Listeners::new(self.listeners),
            }),
        }
    }
}
