use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored payment. `owner_id` is only `None` for rows written before ownership existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub date: String,
    pub amount: f64,
    pub owner_id: Option<Uuid>,
    pub owner_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST and PUT.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub date: String,
    pub amount: f64,
}

/// Validated date/amount pair. Only constructible through [`PaymentPatch::new`], so anything
/// holding one has already passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPatch {
    date: String,
    amount: f64,
}

impl PaymentPatch {
    pub fn new(date: &str, amount: f64) -> Result<Self, AppError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::InvalidInput(
                "amount must be a positive number".into(),
            ));
        }
        let date = date.trim();
        let invalid = || {
            AppError::InvalidInput(format!("date must be a calendar date (YYYY-MM-DD), got '{}'", date))
        };
        let parsed = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())?;
        // chrono tolerates signs and unpadded fields; only the canonical rendering is stored.
        let canonical = parsed.format(DATE_FORMAT).to_string();
        if canonical != date {
            return Err(invalid());
        }
        Ok(Self {
            date: canonical,
            amount,
        })
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl TryFrom<PaymentInput> for PaymentPatch {
    type Error = AppError;

    fn try_from(input: PaymentInput) -> Result<Self, Self::Error> {
        PaymentPatch::new(&input.date, input.amount)
    }
}

/// Loan-level totals for the summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub loan_total: f64,
    pub total_paid: f64,
    pub remaining_balance: f64,
    pub payment_count: usize,
}

pub fn summarize(payments: &[Payment], loan_total: f64) -> LoanSummary {
    let total_paid: f64 = payments.iter().map(|p| p.amount).sum();
    LoanSummary {
        loan_total,
        total_paid,
        remaining_balance: loan_total - total_paid,
        payment_count: payments.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(id: i64, amount: f64) -> Payment {
        Payment {
            id,
            date: "2026-01-15".into(),
            amount,
            owner_id: None,
            owner_username: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_accepts_valid_input() {
        let patch = PaymentPatch::new("2026-03-01", 250.5).unwrap();
        assert_eq!(patch.date(), "2026-03-01");
        assert_eq!(patch.amount(), 250.5);
    }

    #[test]
    fn test_patch_trims_date() {
        let patch = PaymentPatch::new(" 2026-03-01 ", 1.0).unwrap();
        assert_eq!(patch.date(), "2026-03-01");
    }

    #[test]
    fn test_patch_rejects_non_positive_amounts() {
        assert!(matches!(
            PaymentPatch::new("2026-03-01", -5.0),
            Err(AppError::InvalidInput(_))
        ));
        assert!(PaymentPatch::new("2026-03-01", 0.0).is_err());
        assert!(PaymentPatch::new("2026-03-01", f64::NAN).is_err());
        assert!(PaymentPatch::new("2026-03-01", f64::INFINITY).is_err());
    }

    #[test]
    fn test_patch_rejects_bad_dates() {
        assert!(PaymentPatch::new("", 10.0).is_err());
        assert!(PaymentPatch::new("yesterday", 10.0).is_err());
        assert!(PaymentPatch::new("2026-02-30", 10.0).is_err());
        assert!(PaymentPatch::new("2026-13-01", 10.0).is_err());
        assert!(PaymentPatch::new("2026-3-1", 10.0).is_err());
        assert!(PaymentPatch::new("2026-03-01T00:00:00Z", 10.0).is_err());
        assert!(PaymentPatch::new("+2026-3-01", 10.0).is_err());
        assert!(PaymentPatch::new("02026-3-01", 10.0).is_err());
        assert!(PaymentPatch::new("2026-3-011", 10.0).is_err());
    }

    #[test]
    fn test_payment_serializes_camel_case() {
        let v = serde_json::to_value(payment(7, 12.5)).unwrap();
        assert_eq!(v["id"], 7);
        assert!(v.get("ownerId").is_some());
        assert!(v.get("ownerUsername").is_some());
        assert!(v.get("createdAt").is_some());
        assert!(v.get("owner_id").is_none());
    }

    #[test]
    fn test_summary_totals() {
        let s = summarize(&[payment(1, 100.0), payment(2, 50.25)], 7500.0);
        assert_eq!(s.total_paid, 150.25);
        assert_eq!(s.remaining_balance, 7349.75);
        assert_eq!(s.payment_count, 2);
    }

    #[test]
    fn test_summary_can_overpay() {
        let s = summarize(&[payment(1, 80.0)], 50.0);
        assert_eq!(s.remaining_balance, -30.0);
    }

    #[test]
    fn test_summary_empty() {
        let s = summarize(&[], 1000.0);
        assert_eq!(s.total_paid, 0.0);
        assert_eq!(s.remaining_balance, 1000.0);
        assert_eq!(s.payment_count, 0);
    }
}
