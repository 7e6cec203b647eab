//! Transaction display formatting
//!
//! Formats transactions for terminal output in table and detail views.

use crate::models::Transaction;

use super::format_amount;

/// Format a list of transactions as a table
pub fn format_transaction_list(transactions: &[Transaction], symbol: &str) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let category_width = column_width(transactions.iter().map(|t| t.category.as_str()), 8);
    let account_width = column_width(transactions.iter().map(|t| t.account.as_str()), 7);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<10}  {:<category_width$}  {:<account_width$}  {:>12}  {:<8}  {}\n",
        "Date",
        "Category",
        "Account",
        "Amount",
        "ID",
        "Note",
        category_width = category_width,
        account_width = account_width,
    ));
    output.push_str(&format!(
        "{:-<10}  {:-<category_width$}  {:-<account_width$}  {:->12}  {:-<8}  {:-<4}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        category_width = category_width,
        account_width = account_width,
    ));

    for txn in transactions {
        output.push_str(&format!(
            "{:<10}  {:<category_width$}  {:<account_width$}  {:>12}  {:<8}  {}\n",
            short_date(&txn.date),
            txn.category,
            txn.account,
            signed_amount(txn, symbol),
            short_id(&txn.id),
            txn.note.as_deref().unwrap_or(""),
            category_width = category_width,
            account_width = account_width,
        ));
    }

    output
}

/// Format one transaction in detail
pub fn format_transaction_details(txn: &Transaction, symbol: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("ID:       {}\n", txn.id));
    output.push_str(&format!("Type:     {}\n", txn.kind));
    output.push_str(&format!("Amount:   {}\n", format_amount(txn.amount, symbol)));
    output.push_str(&format!("Category: {}\n", txn.category));
    output.push_str(&format!("Account:  {}\n", txn.account));
    output.push_str(&format!("Date:     {}\n", txn.date));
    if let Some(note) = &txn.note {
        output.push_str(&format!("Note:     {}\n", note));
    }
    output
}

fn signed_amount(txn: &Transaction, symbol: &str) -> String {
    let sign = if txn.is_income() { "+" } else { "-" };
    format!("{}{}", sign, format_amount(txn.amount, symbol))
}

fn short_date(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, min: usize) -> usize {
    values.map(|v| v.chars().count()).max().unwrap_or(min).max(min)
}
