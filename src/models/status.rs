//! Monthly goal classification.
//!
//! Every payment is labelled from the total paid in its calendar month:
//! months that are not yet over are `pending`; finished months are `met`
//! when their total reaches the goal and `missed` otherwise. Labels are
//! derived on read and never stored.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::payment::{Payment, DATE_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Met,
    Missed,
}

/// Year-month bucket, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(date: &str) -> Option<Self> {
        NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .ok()
            .map(Self::of)
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: f64,
}

/// Sum of amounts per month. Payments with unparseable dates are skipped.
pub fn month_totals(payments: &[Payment]) -> BTreeMap<MonthKey, f64> {
    let mut totals = BTreeMap::new();
    for p in payments {
        if let Some(key) = MonthKey::parse(&p.date) {
            *totals.entry(key).or_insert(0.0) += p.amount;
        }
    }
    totals
}

/// Label every payment relative to `today`'s month.
pub fn classify_at(
    payments: &[Payment],
    goal: f64,
    today: NaiveDate,
) -> HashMap<i64, PaymentStatus> {
    let totals = month_totals(payments);
    let current = MonthKey::of(today);

    payments
        .iter()
        .map(|p| {
            let status = match MonthKey::parse(&p.date) {
                Some(key) if key < current => {
                    if totals.get(&key).copied().unwrap_or(0.0) >= goal {
                        PaymentStatus::Met
                    } else {
                        PaymentStatus::Missed
                    }
                }
                Some(_) => PaymentStatus::Pending,
                None => {
                    tracing::debug!(payment_id = p.id, date = %p.date, "unparseable payment date, labelling pending");
                    PaymentStatus::Pending
                }
            };
            (p.id, status)
        })
        .collect()
}

/// [`classify_at`] against the current UTC date.
pub fn classify(payments: &[Payment], goal: f64) -> HashMap<i64, PaymentStatus> {
    classify_at(payments, goal, Utc::now().date_naive())
}
