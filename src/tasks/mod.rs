use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::errors::{ApiError, ValidationErrors};
use crate::shared::schema::tasks;
use crate::shared::state::AppState;

/// A task attached to a campaign or lead through the polymorphic asset
/// columns. Tasks are cascade soft-deleted with their asset.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub name: String,
    pub asset_type: Option<String>,
    pub asset_id: Option<Uuid>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: Option<String>,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

pub async fn create_asset_task(
    State(state): State<Arc<AppState>>,
    Path((asset_type, asset_id)): Path<(String, Uuid)>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut conn = state.conn.get()?;
    let name = req.name.unwrap_or_default();
    if name.trim().is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "missing_task_name");
        return Err(ApiError::Validation(errors));
    }

    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        assigned_to: req.assigned_to,
        name,
        asset_type: Some(asset_type),
        asset_id: Some(asset_id),
        priority: req.priority,
        category: req.category,
        due_at: req.due_at,
        completed_at: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(tasks::table)
        .values(&task)
        .execute(&mut conn)?;
    Ok(Json(task))
}

/// Live tasks for one asset, newest first.
pub async fn list_asset_tasks(
    State(state): State<Arc<AppState>>,
    Path((asset_type, asset_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let mut conn = state.conn.get()?;
    let rows: Vec<Task> = tasks::table
        .filter(tasks::asset_type.eq(asset_type))
        .filter(tasks::asset_id.eq(asset_id))
        .filter(tasks::deleted_at.is_null())
        .order(tasks::created_at.desc())
        .load(&mut conn)?;
    Ok(Json(rows))
}

pub fn configure_task_api_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/crm/tasks/:asset_type/:asset_id",
        get(list_asset_tasks).post(create_asset_task),
    )
}
