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
use crate::shared::schema::comments;
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub commentable_type: String,
    pub commentable_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: Option<String>,
    pub user_id: Option<Uuid>,
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path((commentable_type, commentable_id)): Path<(String, Uuid)>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let mut conn = state.conn.get()?;
    let body = req.comment.unwrap_or_default();
    if body.trim().is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("comment", "missing_comment");
        return Err(ApiError::Validation(errors));
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        commentable_type,
        commentable_id,
        comment: body,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(comments::table)
        .values(&comment)
        .execute(&mut conn)?;
    Ok(Json(comment))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path((commentable_type, commentable_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let mut conn = state.conn.get()?;
    let rows: Vec<Comment> = comments::table
        .filter(comments::commentable_type.eq(commentable_type))
        .filter(comments::commentable_id.eq(commentable_id))
        .order(comments::created_at.asc())
        .load(&mut conn)?;
    Ok(Json(rows))
}

pub fn configure_comment_api_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/crm/comments/:commentable_type/:commentable_id",
        get(list_comments).post(create_comment),
    )
}
