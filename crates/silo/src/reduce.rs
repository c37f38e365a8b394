//! Post-query reduction for per-key leaderboards.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::reports::employees::EmployeeProductSales;

/// Collapse a quantity-descending (employee × product) aggregate into one
/// winning product per employee.
///
/// Single left-to-right pass over rows already ordered by the
/// tie-break-relevant key: the current best is replaced only on strict
/// improvement, so the first row seen wins ties. Output preserves
/// first-seen employee order.
pub fn top_product_per_employee(rows: Vec<EmployeeProductSales>) -> Vec<EmployeeProductSales> {
    let mut best: IndexMap<i64, EmployeeProductSales> = IndexMap::with_capacity(rows.len());

    for row in rows {
        match best.entry(row.employee_id) {
            Entry::Occupied(mut entry) => {
                if row.total_sold > entry.get().total_sold {
                    entry.insert(row);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(row);
            }
        }
    }

    best.into_values().collect()
}
