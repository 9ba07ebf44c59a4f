// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Finance views: the unified ledger and the monthly budget projection.
//!
//! Both are single passes over the month's payments and expenses.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Budget, Expense, Payment};
use crate::time_utils::YearMonth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

/// One row of the unified ledger.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LedgerEntry {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub category: String,
    pub description: String,
    /// Positive for income, negative for expenses
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub amount_cents: i64,
    /// Running balance after this entry
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Ledger {
    pub entries: Vec<LedgerEntry>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_income_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_expense_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub net_cents: i64,
}

/// Merge payments and expenses into one date-ordered ledger with a running
/// balance. On the same date income sorts before expenses, then by id.
pub fn build_ledger(payments: &[Payment], expenses: &[Expense]) -> Ledger {
    let mut entries: Vec<LedgerEntry> = payments
        .iter()
        .map(|p| LedgerEntry {
            id: p.id.clone(),
            date: p.date,
            kind: EntryKind::Income,
            category: p.kind.as_str().to_string(),
            description: p.description.clone(),
            amount_cents: p.amount_cents,
            balance_cents: 0,
        })
        .chain(expenses.iter().map(|e| LedgerEntry {
            id: e.id.clone(),
            date: e.date,
            kind: EntryKind::Expense,
            category: e.category.clone(),
            description: e.description.clone(),
            amount_cents: -e.amount_cents,
            balance_cents: 0,
        }))
        .collect();

    entries.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.id.cmp(&b.id))
    });

    // Amounts are bounded on input; saturation only guards stored outliers
    let mut balance = 0i64;
    let mut total_income_cents = 0i64;
    let mut total_expense_cents = 0i64;
    for entry in &mut entries {
        balance = balance.saturating_add(entry.amount_cents);
        entry.balance_cents = balance;
        match entry.kind {
            EntryKind::Income => {
                total_income_cents = total_income_cents.saturating_add(entry.amount_cents)
            }
            EntryKind::Expense => {
                total_expense_cents = total_expense_cents.saturating_sub(entry.amount_cents)
            }
        }
    }

    Ledger {
        entries,
        total_income_cents,
        total_expense_cents,
        net_cents: total_income_cents.saturating_sub(total_expense_cents),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    AtRisk,
    Over,
}

/// Projection for one budget category.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoryProjection {
    pub category: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub limit_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub spent_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub remaining_cents: i64,
    pub daily_average_cents: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub projected_cents: i64,
    pub utilization_percent: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BudgetReport {
    pub month: String,
    pub days_in_month: u32,
    pub days_elapsed: u32,
    pub categories: Vec<CategoryProjection>,
    /// Spending in categories that have no budget
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub unbudgeted_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_limit_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_spent_cents: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_projected_cents: i64,
}

/// Days of `month` that have passed as of `today` (today included).
pub fn days_elapsed(month: YearMonth, today: NaiveDate) -> u32 {
    if today < month.first_day() {
        0
    } else if month.contains(today) {
        today.day()
    } else {
        month.days_in_month()
    }
}

/// Project each budget's month-end spending from the daily average so far.
///
/// `expenses` may cover any dates; only those inside `month` count.
pub fn project_budgets(
    month: YearMonth,
    today: NaiveDate,
    budgets: &[Budget],
    expenses: &[Expense],
) -> BudgetReport {
    let days_in_month = month.days_in_month();
    let elapsed = days_elapsed(month, today);

    let mut spent_by_category: BTreeMap<&str, i64> = BTreeMap::new();
    for expense in expenses.iter().filter(|e| month.contains(e.date)) {
        let spent = spent_by_category.entry(expense.category.as_str()).or_insert(0);
        *spent = spent.saturating_add(expense.amount_cents);
    }

    let mut categories: Vec<CategoryProjection> = budgets
        .iter()
        .map(|budget| {
            let spent = spent_by_category
                .remove(budget.category.as_str())
                .unwrap_or(0);
            project_category(budget, spent, elapsed, days_in_month)
        })
        .collect();
    categories.sort_by(|a, b| a.category.cmp(&b.category));

    let unbudgeted_cents = saturating_sum(spent_by_category.values().copied());

    BudgetReport {
        month: month.to_string(),
        days_in_month,
        days_elapsed: elapsed,
        unbudgeted_cents,
        total_limit_cents: saturating_sum(categories.iter().map(|c| c.limit_cents)),
        total_spent_cents: saturating_sum(categories.iter().map(|c| c.spent_cents)),
        total_projected_cents: saturating_sum(categories.iter().map(|c| c.projected_cents)),
        categories,
    }
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

fn project_category(
    budget: &Budget,
    spent: i64,
    days_elapsed: u32,
    days_in_month: u32,
) -> CategoryProjection {
    let limit = budget.monthly_limit_cents;

    let daily_average = if days_elapsed == 0 {
        0.0
    } else {
        spent as f64 / f64::from(days_elapsed)
    };
    let projected = if days_elapsed >= days_in_month {
        spent
    } else {
        (daily_average * f64::from(days_in_month)).round() as i64
    };

    let utilization_percent = if limit > 0 {
        spent as f64 / limit as f64 * 100.0
    } else {
        0.0
    };

    let status = if spent > limit {
        BudgetStatus::Over
    } else if projected > limit {
        BudgetStatus::AtRisk
    } else {
        BudgetStatus::OnTrack
    };

    CategoryProjection {
        category: budget.category.clone(),
        limit_cents: limit,
        spent_cents: spent,
        remaining_cents: limit.saturating_sub(spent),
        daily_average_cents: daily_average,
        projected_cents: projected,
        utilization_percent,
        status,
    }
}
