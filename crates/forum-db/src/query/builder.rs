//! Fluent query specification
//!
//! A [`Query`] is an immutable value assembled by chained calls and consumed by
//! execution, so clauses from one logical query can never leak into the next.
//!
//! ```rust,ignore
//! let statement = Query::select("posts")
//!     .fields(["COUNT(*)"])
//!     .where_bound("ll_messageid < ?", post_id)
//!     .filter("ll_topicid", topic_id)
//!     .render()?;
//! ```

use std::fmt::Write as _;

use forum_core::{DomainError, DomainResult};

use super::value::{Param, Value};

/// Default row cap of a SELECT
pub const DEFAULT_LIMIT: u64 = 50;

/// Statement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Join flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    kind: JoinKind,
    /// `table [alias] ON predicate`, kept as literal SQL
    clause: String,
}

/// A WHERE/HAVING predicate: literal SQL or a template with bound values
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Raw(String),
    Bound { template: String, params: Vec<Value> },
}

#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    Bound { field: String, value: Value },
    Raw(String),
}

/// A rendered statement and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// A literal statement that bypasses the builder (DDL, maintenance)
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Accumulated clauses of one query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: Kind,
    table: String,
    fields: Vec<String>,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    assignments: Vec<Assignment>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    group: Vec<String>,
    having: Option<Predicate>,
    order: Option<String>,
    start: u64,
    limit: Option<u64>,
}

impl Query {
    fn new(kind: Kind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            fields: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
            assignments: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            group: Vec::new(),
            having: None,
            order: None,
            start: 0,
            limit: Some(DEFAULT_LIMIT),
        }
    }

    pub fn select(table: impl Into<String>) -> Self {
        Self::new(Kind::Select, table)
    }

    pub fn insert(table: impl Into<String>) -> Self {
        Self::new(Kind::Insert, table)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::new(Kind::Update, table)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(Kind::Delete, table)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Replace the target table
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Add selected fields; with none, `*` is selected
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn join(mut self, kind: JoinKind, clause: impl Into<String>) -> Self {
        self.joins.push(Join {
            kind,
            clause: clause.into(),
        });
        self
    }

    pub fn inner_join(self, clause: impl Into<String>) -> Self {
        self.join(JoinKind::Inner, clause)
    }

    pub fn left_join(self, clause: impl Into<String>) -> Self {
        self.join(JoinKind::LeftOuter, clause)
    }

    /// Keyword filter: a scalar becomes `field = ?`, a sequence `field IN (?, ...)`
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Param>) -> Self {
        let field = field.into();
        let predicate = match value.into() {
            Param::Scalar(value) => Predicate::Bound {
                template: format!("{field} = ?"),
                params: vec![value],
            },
            // An empty set matches nothing rather than rendering `IN ()`.
            Param::List(values) if values.is_empty() => Predicate::Raw("1 = 0".to_string()),
            Param::List(values) => Predicate::Bound {
                template: format!("{field} IN ({})", placeholders(values.len())),
                params: values,
            },
        };
        self.predicates.push(predicate);
        self
    }

    /// Literal predicate text
    pub fn where_raw(mut self, sql: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Raw(sql.into()));
        self
    }

    /// Predicate template whose `?` placeholders bind `values` positionally
    pub fn where_bound(mut self, template: impl Into<String>, values: impl Into<Param>) -> Self {
        self.predicates.push(Predicate::Bound {
            template: template.into(),
            params: values.into().into_values(),
        });
        self
    }

    /// Boolean-mode full-text match of `query` against the concatenated fields
    pub fn matches<I, S>(self, fields: I, query: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
        let query: String = query.into();
        self.where_bound(
            format!("MATCH({}) AGAINST(? IN BOOLEAN MODE)", fields.join(", ")),
            query,
        )
    }

    /// `field = ?` assignment for an UPDATE
    ///
    /// Only a scalar fits a single bound parameter; a sequence is a usage error.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Param>) -> DomainResult<Self> {
        let field = field.into();
        match value.into() {
            Param::Scalar(value) => {
                self.assignments.push(Assignment::Bound { field, value });
                Ok(self)
            }
            Param::List(_) => Err(DomainError::usage(format!(
                "cannot assign a sequence to `{field}`"
            ))),
        }
    }

    /// Literal assignment, e.g. `postCount = postCount + 1`
    pub fn set_raw(mut self, sql: impl Into<String>) -> Self {
        self.assignments.push(Assignment::Raw(sql.into()));
        self
    }

    /// Column list of an INSERT
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// One value tuple of an INSERT
    pub fn values<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn group<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn having(mut self, template: impl Into<String>, values: impl Into<Param>) -> Self {
        self.having = Some(Predicate::Bound {
            template: template.into(),
            params: values.into().into_values(),
        });
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Drop pagination entirely (relation fetches that must see every row)
    pub fn unbounded(mut self) -> Self {
        self.start = 0;
        self.limit = None;
        self
    }

    /// Assemble the statement in clause order:
    /// kind, target/fields/joins, set/values, where, group, having, order, pagination.
    pub fn render(&self) -> DomainResult<Statement> {
        if self.table.trim().is_empty() {
            return Err(DomainError::usage("query has no target table"));
        }

        let mut sql = String::new();
        let mut params = Vec::new();

        match self.kind {
            Kind::Select => {
                let fields = if self.fields.is_empty() {
                    "*".to_string()
                } else {
                    self.fields.join(", ")
                };
                let _ = write!(sql, "SELECT {fields} FROM {}", self.table);
                self.render_joins(&mut sql);
            }
            Kind::Insert => {
                self.render_insert(&mut sql, &mut params)?;
            }
            Kind::Update => {
                if self.assignments.is_empty() {
                    return Err(DomainError::usage("UPDATE without set clauses"));
                }
                let _ = write!(sql, "UPDATE {}", self.table);
                self.render_joins(&mut sql);
                sql.push_str(" SET ");
                let rendered: Vec<String> = self
                    .assignments
                    .iter()
                    .map(|assignment| match assignment {
                        Assignment::Bound { field, value } => {
                            params.push(value.clone());
                            format!("{field} = ?")
                        }
                        Assignment::Raw(raw) => raw.clone(),
                    })
                    .collect();
                sql.push_str(&rendered.join(", "));
            }
            Kind::Delete => {
                let _ = write!(sql, "DELETE FROM {}", self.table);
            }
        }

        if !self.predicates.is_empty() {
            let mut rendered = Vec::with_capacity(self.predicates.len());
            for predicate in &self.predicates {
                rendered.push(render_predicate(predicate, &mut params)?);
            }
            let _ = write!(sql, " WHERE {}", rendered.join(" AND "));
        }

        if !self.group.is_empty() {
            let _ = write!(sql, " GROUP BY {}", self.group.join(", "));
        }

        if let Some(having) = &self.having {
            let rendered = render_predicate(having, &mut params)?;
            let _ = write!(sql, " HAVING {rendered}");
        }

        if let Some(order) = &self.order {
            let _ = write!(sql, " ORDER BY {order}");
        }

        if self.kind == Kind::Select {
            if let Some(limit) = self.limit {
                sql.push_str(" LIMIT ?, ?");
                params.push(Value::from(self.start));
                params.push(Value::from(limit));
            }
        }

        Ok(Statement { sql, params })
    }

    fn render_joins(&self, sql: &mut String) {
        for join in &self.joins {
            let _ = write!(sql, " {} {}", join.kind.keyword(), join.clause);
        }
    }

    fn render_insert(&self, sql: &mut String, params: &mut Vec<Value>) -> DomainResult<()> {
        if self.columns.is_empty() || self.rows.is_empty() {
            return Err(DomainError::usage("INSERT needs columns and at least one value tuple"));
        }
        let mut tuples = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.len() != self.columns.len() {
                return Err(DomainError::usage(format!(
                    "INSERT tuple has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                )));
            }
            tuples.push(format!("({})", placeholders(row.len())));
            params.extend(row.iter().cloned());
        }
        let _ = write!(
            sql,
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            tuples.join(", ")
        );
        Ok(())
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn render_predicate(predicate: &Predicate, params: &mut Vec<Value>) -> DomainResult<String> {
    match predicate {
        Predicate::Raw(sql) => Ok(sql.clone()),
        Predicate::Bound {
            template,
            params: bound,
        } => {
            let slots = template.matches('?').count();
            if slots != bound.len() {
                return Err(DomainError::usage(format!(
                    "predicate `{template}` has {slots} placeholders but {} values",
                    bound.len()
                )));
            }
            params.extend(bound.iter().cloned());
            Ok(template.clone())
        }
    }
}
