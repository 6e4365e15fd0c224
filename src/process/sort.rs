use crate::process::Table;
use std::cmp::Ordering;

/// Highest income first, missing last. Stable: equal incomes keep fetch order.
pub fn sort_by_income_desc(table: &mut Table) {
    table.rows_mut().sort_by(|a, b| {
        compare_desc_missing_last(a.median_household_income, b.median_household_income)
    });
}

fn compare_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
