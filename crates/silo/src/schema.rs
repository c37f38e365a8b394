//! Star-schema catalog for the warehouse.
//!
//! The warehouse is an external contract: two fact tables of additive
//! measures surrounded by dimension tables, loaded elsewhere and read-only
//! from here. The catalog is declared statically and used by the executor
//! to reject statements against unknown tables.
//!
//! Referential integrity (every fact foreign key resolving to exactly one
//! dimension row) is a precondition of the warehouse load, not something
//! this crate enforces.

/// Postgres column types used by the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgType {
    /// BIGINT (surrogate keys)
    BigInt,
    /// INTEGER (quantities, calendar parts)
    Integer,
    /// NUMERIC (money and discount measures)
    Numeric,
    /// TEXT
    Text,
    /// DATE
    Date,
}

impl std::fmt::Display for PgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PgType::BigInt => write!(f, "BIGINT"),
            PgType::Integer => write!(f, "INTEGER"),
            PgType::Numeric => write!(f, "NUMERIC"),
            PgType::Text => write!(f, "TEXT"),
            PgType::Date => write!(f, "DATE"),
        }
    }
}

/// A warehouse column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub pg_type: PgType,
    pub nullable: bool,
}

/// A warehouse table.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn col(name: &'static str, pg_type: PgType) -> Column {
    Column {
        name,
        pg_type,
        nullable: false,
    }
}

const fn nullable_col(name: &'static str, pg_type: PgType) -> Column {
    Column {
        name,
        pg_type,
        nullable: true,
    }
}

/// One row per sales order line. Grain: (order, line).
pub const FACT_SALES: Table = Table {
    name: "fact_sales",
    columns: &[
        col("customer_id", PgType::BigInt),
        col("product_id", PgType::BigInt),
        col("employee_id", PgType::BigInt),
        col("date_id", PgType::BigInt),
        col("OrderDate", PgType::Date),
        col("OrderQty", PgType::Integer),
        col("UnitPriceDiscount", PgType::Numeric),
        col("LineTotal", PgType::Numeric),
    ],
};

/// One row per purchase-order line.
pub const FACT_PURCHASING: Table = Table {
    name: "fact_purchasing",
    columns: &[
        col("supplier_id", PgType::BigInt),
        col("product_id", PgType::BigInt),
        col("date_id", PgType::BigInt),
        col("OrderQty", PgType::Integer),
        col("RejectedQty", PgType::Integer),
        col("LineTotal", PgType::Numeric),
    ],
};

/// Product dimension. A NULL StandardCost means cost-basis profit cannot
/// be computed for that product; such rows are excluded from profit KPIs.
pub const DIM_PRODUCT: Table = Table {
    name: "dim_product",
    columns: &[
        col("product_id", PgType::BigInt),
        col("product_name", PgType::Text),
        col("category", PgType::Text),
        col("subcategory", PgType::Text),
        nullable_col("StandardCost", PgType::Numeric),
    ],
};

pub const DIM_CUSTOMER: Table = Table {
    name: "dim_customer",
    columns: &[
        col("customer_id", PgType::BigInt),
        col("full_name", PgType::Text),
        col("person_type", PgType::Text),
    ],
};

pub const DIM_EMPLOYEE: Table = Table {
    name: "dim_employee",
    columns: &[
        col("employee_id", PgType::BigInt),
        col("full_name", PgType::Text),
    ],
};

pub const DIM_SUPPLIER: Table = Table {
    name: "dim_supplier",
    columns: &[
        col("supplier_id", PgType::BigInt),
        col("supplier_name", PgType::Text),
    ],
};

/// One row per calendar day; the canonical year/month vocabulary for
/// drill-down queries.
pub const DIM_DATE: Table = Table {
    name: "dim_date",
    columns: &[
        col("date_id", PgType::BigInt),
        col("full_date", PgType::Date),
        col("year", PgType::Integer),
        col("month", PgType::Integer),
        col("month_name", PgType::Text),
    ],
};

/// All warehouse tables.
pub const TABLES: &[Table] = &[
    FACT_SALES,
    FACT_PURCHASING,
    DIM_PRODUCT,
    DIM_CUSTOMER,
    DIM_EMPLOYEE,
    DIM_SUPPLIER,
    DIM_DATE,
];

/// Look up a table by name.
pub fn table(name: &str) -> Option<&'static Table> {
    TABLES.iter().find(|t| t.name == name)
}
