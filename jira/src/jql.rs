//! Small JQL query builder.
//!
//! Every value placed into a query passes through [`quote`], so account ids, issue keys and
//! free text containing `"` or `\` cannot alter the structure of the query.
//!
//! ```rust,ignore
//! let jql = JqlBuilder::new()
//!     .eq(JqlField::named("assignee"), account_id)
//!     .is_empty(JqlField::named("resolution"))
//!     .order_by(JqlField::named("updated"), Direction::Descending)
//!     .build();
//! ```
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Quotes a JQL string literal, escaping backslashes and double quotes
#[must_use]
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// A reference to a field on the left hand side of a JQL clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JqlField(String);

impl JqlField {
    /// A field referenced by name. Names which are not plain identifiers, like `Epic Link`,
    /// are quoted.
    #[must_use]
    pub fn named(name: &str) -> Self {
        let plain = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if plain {
            JqlField(name.to_string())
        } else {
            JqlField(quote(name))
        }
    }

    /// A custom field referenced by its numeric id, `cf[10014]`. This form does not depend on
    /// the language of the Jira user.
    #[must_use]
    pub fn custom_id(id: u64) -> Self {
        JqlField(format!("cf[{id}]"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JqlField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A complete query, ready to be sent to `POST /search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Jql(String);

impl Jql {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Jql {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a conjunction of clauses with an optional ordering
#[derive(Debug, Default, Clone)]
pub struct JqlBuilder {
    clauses: Vec<String>,
    order_by: Option<(JqlField, Direction)>,
}

impl JqlBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(self, field: JqlField, value: &str) -> Self {
        self.clause(&field, "=", value)
    }

    #[must_use]
    pub fn ge(self, field: JqlField, value: &str) -> Self {
        self.clause(&field, ">=", value)
    }

    #[must_use]
    pub fn le(self, field: JqlField, value: &str) -> Self {
        self.clause(&field, "<=", value)
    }

    /// `field = EMPTY`, e.g. unresolved issues
    #[must_use]
    pub fn is_empty(mut self, field: JqlField) -> Self {
        self.clauses.push(format!("{field} = EMPTY"));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: JqlField, direction: Direction) -> Self {
        self.order_by = Some((field, direction));
        self
    }

    #[must_use]
    pub fn build(self) -> Jql {
        let mut jql = self.clauses.join(" AND ");
        if let Some((field, direction)) = self.order_by {
            if !jql.is_empty() {
                jql.push(' ');
            }
            let direction = match direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            jql.push_str(&format!("ORDER BY {field} {direction}"));
        }
        Jql(jql)
    }

    fn clause(mut self, field: &JqlField, operator: &str, value: &str) -> Self {
        self.clauses
            .push(format!("{field} {operator} {}", quote(value)));
        self
    }
}
