//! The module contains `Expense` and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, ExpenseRefs, Label, ObjectId, ResultEngine};

const MAX_DESCRIPTION_LEN: usize = 200;

/// A single expense.
///
/// Installment plans are stored as independent sibling expenses, one per
/// month, each with its own id.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: ObjectId,
    pub amount: f64,
    pub description: Option<String>,
    pub pay_method: ObjectId,
    pub category: ObjectId,
    pub timestamp: DateTime<Utc>,
    pub active: bool,
    pub one_time: bool,
}

impl Expense {
    pub fn refs(&self) -> ExpenseRefs {
        ExpenseRefs {
            pay_method: self.pay_method,
            category: self.category,
        }
    }

    /// References this expense is counted against, `None` once soft-deleted.
    pub fn counted_refs(&self) -> Option<ExpenseRefs> {
        self.active.then(|| self.refs())
    }
}

/// An expense together with the documents it references.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDetail {
    pub expense: Expense,
    pub pay_method: Label,
    pub category: Label,
}

pub(crate) fn validate_amount(amount: f64) -> ResultEngine<f64> {
    if !amount.is_finite() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    Ok(amount)
}

pub(crate) fn normalize_description(value: Option<&str>) -> ResultEngine<Option<String>> {
    let value = value.map(str::trim).filter(|s| !s.is_empty());
    if let Some(description) = value
        && description.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(EngineError::InvalidField(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(value.map(ToString::to_string))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub amount: f64,
    pub description: Option<String>,
    pub pay_method_id: String,
    pub category_id: String,
    pub timestamp: DateTime<Utc>,
    pub active: bool,
    pub one_time: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::labels::Entity",
        from = "Column::PayMethodId",
        to = "super::labels::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    PayMethod,
    #[sea_orm(
        belongs_to = "super::labels::Entity",
        from = "Column::CategoryId",
        to = "super::labels::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(value: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            amount: ActiveValue::Set(value.amount),
            description: ActiveValue::Set(value.description.clone()),
            pay_method_id: ActiveValue::Set(value.pay_method.to_string()),
            category_id: ActiveValue::Set(value.category.to_string()),
            timestamp: ActiveValue::Set(value.timestamp),
            active: ActiveValue::Set(value.active),
            one_time: ActiveValue::Set(value.one_time),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ObjectId::parse_labeled(&model.id, "expense")?,
            amount: model.amount,
            description: model.description,
            pay_method: ObjectId::parse_labeled(&model.pay_method_id, "pay_method")?,
            category: ObjectId::parse_labeled(&model.category_id, "category")?,
            timestamp: model.timestamp,
            active: model.active,
            one_time: model.one_time,
        })
    }
}
