//! Expenses API endpoints

use api_types::{
    common::{DateJson, Oid, Reference, TimestampInput},
    expense::{ExpenseCreateQuery, ExpenseNew, ExpenseQuery, ExpenseUpdate, ExpenseView},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use engine::{ExpenseCmd, ExpenseDetail, ExpenseFilter, ExpenseUpdateCmd, ObjectId};

use crate::{ServerError, labels::label_view, path_id, server::ServerState};

fn expense_view(detail: ExpenseDetail) -> ExpenseView {
    let ExpenseDetail {
        expense,
        pay_method,
        category,
    } = detail;
    ExpenseView {
        id: Oid::new(expense.id.to_string()),
        amount: expense.amount,
        description: expense.description,
        pay_method: label_view(pay_method),
        category: label_view(category),
        timestamp: DateJson::from_utc(expense.timestamp),
        active: expense.active,
        one_time: expense.one_time,
    }
}

fn reference(value: &Reference, field: &str) -> Result<ObjectId, ServerError> {
    Ok(ObjectId::parse_labeled(value.oid(), field)?)
}

fn filter_id(value: Option<&str>, field: &str) -> Result<Option<ObjectId>, ServerError> {
    value
        .map(|value| ObjectId::parse_labeled(value, field).map_err(ServerError::from))
        .transpose()
}

fn timestamp(value: &TimestampInput) -> Result<DateTime<Utc>, ServerError> {
    value
        .to_utc()
        .ok_or_else(|| ServerError::Generic("timestamp out of range".to_string()))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ExpenseQuery>, QueryRejection>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let Query(query) = query?;
    let filter = ExpenseFilter {
        amount: query.amount,
        pay_method: filter_id(query.pay_method.as_deref(), "pay_method")?,
        category: filter_id(query.category.as_deref(), "category")?,
        limit: query.limit,
    };

    let expenses = state
        .engine
        .list_expenses(&filter)
        .await?
        .into_iter()
        .map(expense_view)
        .collect();
    Ok(Json(expenses))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ExpenseView>, ServerError> {
    let id = path_id(&id, "expense")?;
    let detail = state.engine.expense(id).await?;
    Ok(Json(expense_view(detail)))
}

/// Creates the expense, one record per installment when `?payments=N`.
pub async fn create(
    State(state): State<ServerState>,
    query: Result<Query<ExpenseCreateQuery>, QueryRejection>,
    payload: Result<Json<ExpenseNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<ExpenseView>>), ServerError> {
    let Query(query) = query?;
    let Json(payload) = payload?;

    let mut cmd = ExpenseCmd::new(
        payload.amount,
        reference(&payload.pay_method, "pay_method")?,
        reference(&payload.category, "category")?,
        timestamp(&payload.timestamp)?,
    )
    .active(payload.active.unwrap_or(true))
    .one_time(payload.one_time.unwrap_or(false))
    .payments(query.payments.unwrap_or(1));
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let created = state
        .engine
        .create_expense(cmd)
        .await?
        .into_iter()
        .map(expense_view)
        .collect();
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<ExpenseUpdate>, JsonRejection>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let id = path_id(&id, "expense")?;
    let Json(payload) = payload?;

    let cmd = ExpenseUpdateCmd {
        amount: payload.amount,
        description: payload.description,
        pay_method: payload
            .pay_method
            .as_ref()
            .map(|value| reference(value, "pay_method"))
            .transpose()?,
        category: payload
            .category
            .as_ref()
            .map(|value| reference(value, "category"))
            .transpose()?,
        timestamp: payload.timestamp.as_ref().map(timestamp).transpose()?,
        active: payload.active,
        one_time: payload.one_time,
    };

    let detail = state.engine.update_expense(id, cmd).await?;
    Ok(Json(vec![expense_view(detail)]))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = path_id(&id, "expense")?;
    state.engine.delete_expense(id).await?;
    Ok(StatusCode::OK)
}
