//! Expression compiler: flattens a tree of templates into SQL text plus an
//! ordered parameter list.
//!
//! The walk is depth-first and left-to-right, and every level of the tree
//! appends into the same parameter list. A placeholder is generated from the
//! list's length at the moment the value is pushed, so `$1, $2, ...` number
//! correctly however deep the nesting goes, and inlined text such as escaped
//! identifiers never takes a slot.
//!
//! A nested query spells its placeholders and identifiers with the driver of
//! the tag it was built on. Nesting queries from tags over different backends
//! is not supported and produces mixed SQL.

use crate::driver::Driver;
use crate::template::{Arg, Template};
use crate::value::Value;

/// A flattened query, ready for the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Compile a template with a fresh parameter list.
pub fn compile<D: Driver>(driver: &D, template: &Template<D>) -> CompiledQuery {
    let mut params = Vec::new();
    let sql = compile_into(driver, template, &mut params);
    tracing::trace!(target: "sqltag", params = params.len(), "compiled query");
    CompiledQuery { sql, params }
}

/// Compile a template, appending its parameters to `params`, and return the
/// SQL text.
pub fn compile_into<D: Driver>(driver: &D, template: &Template<D>, params: &mut Vec<Value>) -> String {
    let mut sql = String::new();
    write_template(driver, template, &mut sql, params);
    sql
}

fn write_template<D: Driver>(
    driver: &D,
    template: &Template<D>,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    for (fragment, arg) in template.slots() {
        sql.push_str(fragment);

        match arg {
            None | Some(Arg::Omitted) => {}
            // Nested queries compile with the driver they were built on.
            Some(Arg::Nested(query)) => {
                write_template(query.tag().driver(), query.template(), sql, params);
            }
            Some(Arg::Value(value)) => {
                let serialized = driver.serialize_value(value.clone());
                sql.push_str(&driver.parameterize_value(&serialized, params.len()));
                params.push(serialized);
            }
        }
    }
}
