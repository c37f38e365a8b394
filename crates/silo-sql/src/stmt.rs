//! SQL statements.

use crate::expr::Expr;

/// A SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectStmt {
    pub distinct: bool,
    pub columns: Vec<SelectColumn>,
    pub from: Option<FromClause>,
    pub joins: Vec<Join>,
    pub where_: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<Expr>,
}

/// A column in a SELECT clause.
#[derive(Debug, Clone)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn expr(expr: Expr) -> Self {
        SelectColumn { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        SelectColumn {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// A FROM clause.
#[derive(Debug, Clone)]
pub struct FromClause {
    pub table: String,
    pub alias: Option<String>,
}

impl FromClause {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            alias: Some(alias.into()),
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub source: JoinSource,
    pub alias: Option<String>,
    pub on: Expr,
}

/// What a JOIN brings in: a table or a derived table.
#[derive(Debug, Clone)]
pub enum JoinSource {
    Table(String),
    /// A parenthesized subquery, e.g. the per-customer first-purchase
    /// aggregate joined back onto the fact table.
    Select(Box<SelectStmt>),
}

impl Join {
    /// INNER JOIN a table under an alias.
    pub fn inner(table: impl Into<String>, alias: impl Into<String>, on: Expr) -> Self {
        Self {
            kind: JoinKind::Inner,
            source: JoinSource::Table(table.into()),
            alias: Some(alias.into()),
            on,
        }
    }

    /// INNER JOIN a derived table under an alias.
    pub fn derived(stmt: SelectStmt, alias: impl Into<String>, on: Expr) -> Self {
        Self {
            kind: JoinKind::Inner,
            source: JoinSource::Select(Box::new(stmt)),
            alias: Some(alias.into()),
            on,
        }
    }
}

/// Type of JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// ORDER BY clause.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expr: Expr,
    pub desc: bool,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, desc: false }
    }

    pub fn desc(expr: Expr) -> Self {
        Self { expr, desc: true }
    }
}

// ============================================================================
// Builder-style constructors
// ============================================================================

impl SelectStmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn column(mut self, col: SelectColumn) -> Self {
        self.columns.push(col);
        self
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.columns.extend(cols);
        self
    }

    pub fn from(mut self, from: FromClause) -> Self {
        self.from = Some(from);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_ = Some(match self.where_ {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn group_by_all(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, expr: Expr) -> Self {
        self.limit = Some(expr);
        self
    }
}
