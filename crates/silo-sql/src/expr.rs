//! SQL expressions.

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A parameter placeholder (e.g., $year -> $1)
    Param(String),
    /// A column reference
    Column(ColumnRef),
    /// A string literal
    String(String),
    /// An integer literal
    Int(i64),
    /// NULL
    Null,
    /// Binary operation (comparison, boolean, arithmetic)
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },
    /// Function call (SUM, AVG, MIN, to_char, date_trunc, ...)
    FnCall { name: String, args: Vec<Expr> },
    /// COUNT(*)
    CountStar,
    /// COUNT(DISTINCT a) or, over a composite key, COUNT(DISTINCT (a, b))
    CountDistinct(Vec<Expr>),
    /// Searched CASE expression. A missing ELSE yields NULL, which
    /// aggregate functions skip.
    Case {
        whens: Vec<(Expr, Expr)>,
        else_: Option<Box<Expr>>,
    },
    /// EXTRACT(field FROM expr)
    Extract { field: DateField, expr: Box<Expr> },
    /// CAST(expr AS type)
    Cast { expr: Box<Expr>, ty: String },
    /// Raw SQL (escape hatch)
    Raw(String),
}

/// A column reference, optionally qualified with table/alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "AND",
            BinOp::Or => "OR",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
        }
    }
}

/// Fields accepted by EXTRACT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    /// ISO week number.
    Week,
    /// ISO day of week: 1 = Monday .. 7 = Sunday.
    IsoDow,
}

impl DateField {
    pub fn as_str(self) -> &'static str {
        match self {
            DateField::Year => "YEAR",
            DateField::Month => "MONTH",
            DateField::Week => "WEEK",
            DateField::IsoDow => "ISODOW",
        }
    }
}

// Convenience constructors
impl Expr {
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Param(name.into())
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    pub fn qualified_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::qualified(table, column))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::String(s.into())
    }

    pub fn int(n: i64) -> Self {
        Expr::Int(n)
    }

    /// SUM(expr)
    pub fn sum(expr: Expr) -> Self {
        Expr::FnCall {
            name: "SUM".into(),
            args: vec![expr],
        }
    }

    /// AVG(expr)
    pub fn avg(expr: Expr) -> Self {
        Expr::FnCall {
            name: "AVG".into(),
            args: vec![expr],
        }
    }

    /// MIN(expr)
    pub fn min(expr: Expr) -> Self {
        Expr::FnCall {
            name: "MIN".into(),
            args: vec![expr],
        }
    }

    /// COUNT(*)
    pub fn count_star() -> Self {
        Expr::CountStar
    }

    /// COUNT(DISTINCT ...) over one or more key expressions.
    pub fn count_distinct(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::CountDistinct(exprs.into_iter().collect())
    }

    /// to_char(expr, 'fmt')
    pub fn to_char(expr: Expr, fmt: impl Into<String>) -> Self {
        Expr::FnCall {
            name: "to_char".into(),
            args: vec![expr, Expr::String(fmt.into())],
        }
    }

    /// date_trunc('month', expr): the first calendar day of expr's month.
    pub fn month_floor(expr: Expr) -> Self {
        Expr::FnCall {
            name: "date_trunc".into(),
            args: vec![Expr::string("month"), expr],
        }
    }

    /// EXTRACT(field FROM expr)
    pub fn extract(field: DateField, expr: Expr) -> Self {
        Expr::Extract {
            field,
            expr: Box::new(expr),
        }
    }

    /// CAST(expr AS INTEGER)
    pub fn as_integer(self) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            ty: "INTEGER".into(),
        }
    }

    /// Searched CASE with a single arm and no ELSE.
    pub fn case_when(cond: Expr, then: Expr) -> Self {
        Expr::Case {
            whens: vec![(cond, then)],
            else_: None,
        }
    }

    /// Searched CASE with a single arm and an ELSE.
    pub fn case_when_else(cond: Expr, then: Expr, else_: Expr) -> Self {
        Expr::Case {
            whens: vec![(cond, then)],
            else_: Some(Box::new(else_)),
        }
    }

    fn binop(self, op: BinOp, other: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// self = other
    pub fn eq(self, other: Expr) -> Self {
        self.binop(BinOp::Eq, other)
    }

    /// self < other
    pub fn lt(self, other: Expr) -> Self {
        self.binop(BinOp::Lt, other)
    }

    /// self > other
    pub fn gt(self, other: Expr) -> Self {
        self.binop(BinOp::Gt, other)
    }

    /// self >= other
    pub fn ge(self, other: Expr) -> Self {
        self.binop(BinOp::Ge, other)
    }

    /// self AND other
    pub fn and(self, other: Expr) -> Self {
        self.binop(BinOp::And, other)
    }

    /// self OR other
    pub fn or(self, other: Expr) -> Self {
        self.binop(BinOp::Or, other)
    }

    /// self - other
    pub fn sub(self, other: Expr) -> Self {
        self.binop(BinOp::Sub, other)
    }

    /// self * other
    pub fn mul(self, other: Expr) -> Self {
        self.binop(BinOp::Mul, other)
    }

    /// self IS NULL
    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// self IS NOT NULL
    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }
}
