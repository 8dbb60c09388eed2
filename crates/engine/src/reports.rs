//! Aggregations over active expenses.

use std::collections::{BTreeMap, HashMap};

use crate::ExpenseDetail;

pub const BY_CATEGORY: &str = "Expenses by category";
pub const BY_PAY_METHOD: &str = "Expenses by pay method";
pub const MONTHLY: &str = "Monthly expenses";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Table,
    Bar,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub name: String,
    pub kind: ChartKind,
    pub rows: Vec<(String, f64)>,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Totals per label name, largest first; ties are ordered by name.
fn totals_by<F>(expenses: &[ExpenseDetail], label: F) -> Vec<(String, f64)>
where
    F: Fn(&ExpenseDetail) -> &str,
{
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for detail in expenses {
        *totals.entry(label(detail)).or_default() += detail.expense.amount;
    }

    let mut rows: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_string(), round_cents(total)))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// Totals per `YYYY-MM`, oldest first.
fn totals_by_month(expenses: &[ExpenseDetail]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for detail in expenses {
        let month = detail.expense.timestamp.format("%Y-%m").to_string();
        *totals.entry(month).or_default() += detail.expense.amount;
    }
    totals
        .into_iter()
        .map(|(month, total)| (month, round_cents(total)))
        .collect()
}

/// Builds every chart. Inactive expenses are skipped; no expenses, no charts.
pub fn build_charts(expenses: &[ExpenseDetail]) -> Vec<Chart> {
    let active: Vec<ExpenseDetail> = expenses
        .iter()
        .filter(|d| d.expense.active)
        .cloned()
        .collect();
    if active.is_empty() {
        return Vec::new();
    }

    vec![
        Chart {
            name: BY_CATEGORY.to_string(),
            kind: ChartKind::Table,
            rows: totals_by(&active, |d| d.category.name.as_str()),
        },
        Chart {
            name: BY_PAY_METHOD.to_string(),
            kind: ChartKind::Table,
            rows: totals_by(&active, |d| d.pay_method.name.as_str()),
        },
        Chart {
            name: MONTHLY.to_string(),
            kind: ChartKind::Bar,
            rows: totals_by_month(&active),
        },
    ]
}

/// Text body of a table chart, one `label: value` line per row.
pub fn table_message(chart: &Chart) -> String {
    chart
        .rows
        .iter()
        .map(|(label, value)| format!("{label}: {value}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{Expense, Label, LabelKind, ObjectId};

    fn detail(amount: f64, pay_method: &Label, category: &Label, month: u32) -> ExpenseDetail {
        ExpenseDetail {
            expense: Expense {
                id: ObjectId::new(),
                amount,
                description: None,
                pay_method: pay_method.id,
                category: category.id,
                timestamp: Utc.with_ymd_and_hms(2018, month, 5, 10, 0, 0).unwrap(),
                active: true,
                one_time: false,
            },
            pay_method: pay_method.clone(),
            category: category.clone(),
        }
    }

    fn fixtures() -> Vec<ExpenseDetail> {
        let visa = Label::new(LabelKind::PayMethod, "Visa".to_string(), true);
        let cash = Label::new(LabelKind::PayMethod, "Cash".to_string(), true);
        let food = Label::new(LabelKind::Category, "Food".to_string(), true);
        let home = Label::new(LabelKind::Category, "Home".to_string(), true);

        let mut deleted = detail(1000.0, &cash, &home, 9);
        deleted.expense.active = false;

        vec![
            detail(10.0, &visa, &food, 8),
            detail(33.333333333333336, &visa, &home, 8),
            detail(33.333333333333336, &cash, &home, 9),
            detail(5.5, &cash, &food, 9),
            deleted,
        ]
    }

    #[test]
    fn empty_input_has_no_charts() {
        assert!(build_charts(&[]).is_empty());
    }

    #[test]
    fn totals_by_category_sorted_desc() {
        let charts = build_charts(&fixtures());
        let by_category = charts.iter().find(|c| c.name == BY_CATEGORY).unwrap();

        assert_eq!(by_category.kind, ChartKind::Table);
        assert_eq!(
            by_category.rows,
            vec![("Home".to_string(), 66.67), ("Food".to_string(), 15.5)]
        );
    }

    #[test]
    fn totals_by_pay_method_skip_inactive() {
        let charts = build_charts(&fixtures());
        let by_pay_method = charts.iter().find(|c| c.name == BY_PAY_METHOD).unwrap();

        assert_eq!(
            by_pay_method.rows,
            vec![("Visa".to_string(), 43.33), ("Cash".to_string(), 38.83)]
        );
    }

    #[test]
    fn monthly_totals_are_chronological() {
        let charts = build_charts(&fixtures());
        let monthly = charts.iter().find(|c| c.name == MONTHLY).unwrap();

        assert_eq!(monthly.kind, ChartKind::Bar);
        assert_eq!(
            monthly.rows,
            vec![("2018-08".to_string(), 43.33), ("2018-09".to_string(), 38.83)]
        );
    }

    #[test]
    fn table_message_lists_rows() {
        let chart = Chart {
            name: BY_CATEGORY.to_string(),
            kind: ChartKind::Table,
            rows: vec![("Home".to_string(), 66.67), ("Food".to_string(), 15.5)],
        };
        assert_eq!(table_message(&chart), "Home: 66.67\nFood: 15.5\n");
    }
}
