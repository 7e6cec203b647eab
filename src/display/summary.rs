//! Summary display formatting

use chrono::Month;

use crate::summary::{CategorySummary, MonthlySummary};

use super::format_amount;

/// Format monthly totals, newest first
pub fn format_monthly(monthly: &[&MonthlySummary], symbol: &str) -> String {
    if monthly.is_empty() {
        return "No monthly totals yet.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<14}  {:>12}  {:>12}  {:>12}  {:>6}\n",
        "Month", "Income", "Expense", "Net", "Count"
    ));
    output.push_str(&format!(
        "{:-<14}  {:->12}  {:->12}  {:->12}  {:->6}\n",
        "", "", "", "", ""
    ));

    for m in monthly {
        output.push_str(&format!(
            "{:<14}  {:>12}  {:>12}  {:>12}  {:>6}\n",
            month_label(m.year, m.month),
            format_amount(m.income, symbol),
            format_amount(m.expense, symbol),
            format_amount(m.net, symbol),
            m.transaction_count,
        ));
    }

    output
}

/// Format category totals, largest first
pub fn format_categories(categories: &[CategorySummary], symbol: &str) -> String {
    if categories.is_empty() {
        return "No category totals yet.".to_string();
    }

    let width = categories
        .iter()
        .map(|c| c.category.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:<7}  {:>12}  {:>6}\n",
        "Category",
        "Type",
        "Total",
        "Count",
        width = width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:-<7}  {:->12}  {:->6}\n",
        "",
        "",
        "",
        "",
        width = width
    ));

    for c in categories {
        output.push_str(&format!(
            "{:<width$}  {:<7}  {:>12}  {:>6}\n",
            c.category,
            c.kind.to_string(),
            format_amount(c.total, symbol),
            c.transaction_count,
            width = width
        ));
    }

    output
}

fn month_label(year: i32, month: u32) -> String {
    match u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok()) {
        Some(m) => format!("{} {}", m.name(), year),
        None => format!("{}-{:02}", year, month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transaction, TransactionType};
    use crate::summary::SummariesData;

    fn summaries() -> SummariesData {
        SummariesData::recompute_all(&[
            Transaction::new("1", TransactionType::Expense, 50.0, "Food", "Cash", "2024-01-15"),
            Transaction::new("2", TransactionType::Income, 1000.0, "Salary", "Bank", "2024-01-20"),
        ])
    }

    #[test]
    fn test_monthly_table() {
        let data = summaries();
        let rows: Vec<&MonthlySummary> = data.monthly.iter().collect();
        let output = format_monthly(&rows, "$");
        assert!(output.contains("January 2024"));
        assert!(output.contains("$950.00"));
    }

    #[test]
    fn test_category_table() {
        let output = format_categories(&summaries().categories, "$");
        let salary = output.find("Salary").unwrap();
        let food = output.find("Food").unwrap();
        assert!(salary < food);
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(format_monthly(&[], "$"), "No monthly totals yet.");
        assert_eq!(format_categories(&[], "$"), "No category totals yet.");
    }
}
