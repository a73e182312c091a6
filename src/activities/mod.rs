use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::errors::ApiError;
use crate::shared::schema::activities;
use crate::shared::state::AppState;

/// One line of the polymorphic audit trail: who did what to which record.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = activities)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub subject_type: String,
    pub subject_id: Uuid,
    pub action: String,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record an action against a subject. Called from inside the subject's
/// save/destroy transaction so the log row lives or dies with the change.
pub fn log(
    conn: &mut PgConnection,
    user_id: Option<Uuid>,
    subject_type: &str,
    subject_id: Uuid,
    action: &str,
) -> QueryResult<()> {
    let activity = Activity {
        id: Uuid::new_v4(),
        user_id,
        subject_type: subject_type.to_string(),
        subject_id,
        action: action.to_string(),
        info: None,
        created_at: Utc::now(),
    };
    diesel::insert_into(activities::table)
        .values(&activity)
        .execute(conn)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    pub limit: Option<i64>,
}

pub async fn list_subject_activities(
    State(state): State<Arc<AppState>>,
    Path((subject_type, subject_id)): Path<(String, Uuid)>,
    Query(query): Query<ListActivitiesQuery>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let mut conn = state.conn.get()?;
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let rows: Vec<Activity> = activities::table
        .filter(activities::subject_type.eq(subject_type))
        .filter(activities::subject_id.eq(subject_id))
        .order(activities::created_at.desc())
        .limit(limit)
        .load(&mut conn)?;
    Ok(Json(rows))
}

pub fn configure_activity_api_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/crm/activities/:subject_type/:subject_id",
        get(list_subject_activities),
    )
}
