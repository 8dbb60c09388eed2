//! Charts and the monthly summary push.

use api_types::chart::{Chart, ChartKind, MonthlyUpdate};
use axum::{Json, extract::State};

use crate::{Notification, ServerError, server::ServerState};

const MONTHLY_TITLE: &str = "Monthly update";

fn chart_view(chart: engine::Chart) -> Chart {
    Chart {
        name: chart.name,
        kind: match chart.kind {
            engine::ChartKind::Table => ChartKind::Table,
            engine::ChartKind::Bar => ChartKind::Bar,
        },
        data: chart.rows,
    }
}

pub async fn charts(State(state): State<ServerState>) -> Result<Json<Vec<Chart>>, ServerError> {
    let charts = state
        .engine
        .charts()
        .await?
        .into_iter()
        .map(chart_view)
        .collect();
    Ok(Json(charts))
}

/// Pushes every table chart as a `label: value` message.
pub async fn monthly_update(
    State(state): State<ServerState>,
) -> Result<Json<MonthlyUpdate>, ServerError> {
    let charts = state.engine.charts().await?;
    if charts.is_empty() {
        return Ok(Json(MonthlyUpdate {
            message: "Empty DB, no monthly update".to_string(),
            errors: Vec::new(),
        }));
    }

    let mut errors = Vec::new();
    for chart in charts
        .iter()
        .filter(|chart| chart.kind == engine::ChartKind::Table && !chart.rows.is_empty())
    {
        let notification = Notification {
            title: MONTHLY_TITLE.to_string(),
            message: engine::table_message(chart),
            collection: state.notifications.collection.clone(),
            dry_run: state.notifications.dry_run,
        };
        errors.extend(state.notifier.send(&notification).await);
    }

    let message = if errors.is_empty() {
        "Message sent".to_string()
    } else {
        tracing::error!(failed = errors.len(), "monthly update not delivered everywhere");
        format!("Error occurred, {} deliveries failed", errors.len())
    };

    Ok(Json(MonthlyUpdate {
        message,
        errors: errors.iter().map(ToString::to_string).collect(),
    }))
}
