//! Command structs for engine operations.
//!
//! These types group parameters for expense writes and listing, keeping call
//! sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::ObjectId;

/// Create an expense, optionally split into monthly installments.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub amount: f64,
    pub description: Option<String>,
    pub pay_method: ObjectId,
    pub category: ObjectId,
    pub timestamp: DateTime<Utc>,
    pub active: bool,
    pub one_time: bool,
    /// Number of monthly installments; `1` writes a single expense.
    pub payments: u32,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        amount: f64,
        pay_method: ObjectId,
        category: ObjectId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            description: None,
            pay_method,
            category,
            timestamp,
            active: true,
            one_time: false,
            payments: 1,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn one_time(mut self, one_time: bool) -> Self {
        self.one_time = one_time;
        self
    }

    #[must_use]
    pub fn payments(mut self, payments: u32) -> Self {
        self.payments = payments;
        self
    }
}

/// Partial update of an expense; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdateCmd {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub pay_method: Option<ObjectId>,
    pub category: Option<ObjectId>,
    pub timestamp: Option<DateTime<Utc>>,
    pub active: Option<bool>,
    pub one_time: Option<bool>,
}

impl ExpenseUpdateCmd {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.description.is_none()
            && self.pay_method.is_none()
            && self.category.is_none()
            && self.timestamp.is_none()
            && self.active.is_none()
            && self.one_time.is_none()
    }
}

/// Equality filters for expense listing. Only active expenses are listed.
#[derive(Clone, Debug, Default)]
pub struct ExpenseFilter {
    pub amount: Option<f64>,
    pub pay_method: Option<ObjectId>,
    pub category: Option<ObjectId>,
    pub limit: Option<u64>,
}
