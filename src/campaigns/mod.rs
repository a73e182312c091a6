use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::access::{self, GrantAction, ACCESS_PRIVATE, ACCESS_SHARED};
use crate::activities;
use crate::leads;
use crate::shared::errors::{ApiError, ValidationErrors};
use crate::shared::schema::{campaigns, opportunities, tasks};
use crate::shared::state::AppState;
use crate::shared::utils::{paginate, sanitize_search};
use crate::users;

/// Allowed sort orders for campaign listings; the first component is the
/// query-string value, the default is `created_at DESC`.
pub const CAMPAIGN_SORT_KEYS: &[&str] = &[
    "name ASC",
    "target_leads DESC",
    "target_revenue DESC",
    "leads_count DESC",
    "revenue DESC",
    "starts_on DESC",
    "ends_on DESC",
    "created_at DESC",
    "updated_at DESC",
];
pub const CAMPAIGN_DEFAULT_SORT: &str = "created_at DESC";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = campaigns)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub name: String,
    pub access: String,
    pub status: Option<String>,
    pub budget: Option<BigDecimal>,
    pub target_leads: Option<i32>,
    pub target_conversion: Option<f64>,
    pub target_revenue: Option<BigDecimal>,
    pub leads_count: i32,
    pub opportunities_count: i32,
    pub revenue: Option<BigDecimal>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub objectives: Option<String>,
    pub background_info: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SaveCampaignRequest {
    pub name: Option<String>,
    pub access: Option<String>,
    pub status: Option<String>,
    pub budget: Option<BigDecimal>,
    pub target_leads: Option<i32>,
    pub target_conversion: Option<f64>,
    pub target_revenue: Option<BigDecimal>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub objectives: Option<String>,
    pub background_info: Option<String>,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    /// Grant list applied when `access == "Shared"`.
    #[serde(default)]
    pub users: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    pub search: Option<String>,
    /// Comma-separated status filter.
    pub status: Option<String>,
    /// Include rows whose status is NULL alongside the `status` filter.
    pub other: Option<bool>,
    pub created_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Acting user; their saved sort/per-page preferences fill in whatever
    /// the query string leaves unset.
    pub current_user: Option<Uuid>,
}

/// Field-keyed validation for a campaign save. Pure: the uniqueness check
/// and grant count are queried by the caller and passed in.
pub fn validate_campaign(
    name: &str,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
    access: &str,
    name_taken: bool,
    grant_count: usize,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if name.trim().is_empty() {
        errors.add("name", "missing_campaign_name");
    } else if name_taken {
        errors.add("name", "duplicate_name");
    }
    if let (Some(starts), Some(ends)) = (starts_on, ends_on) {
        if starts > ends {
            errors.add("ends_on", "dates_not_in_sequence");
        }
    }
    if let Some(code) = access::shared_access_error(access, "Campaign", grant_count) {
        errors.add("access", code);
    }
    errors
}

/// Look up a campaign sort key against the whitelist; anything unknown
/// falls back to the default order.
pub fn campaign_sort(key: Option<&str>) -> &'static str {
    key.and_then(|k| CAMPAIGN_SORT_KEYS.iter().find(|s| **s == k))
        .copied()
        .unwrap_or(CAMPAIGN_DEFAULT_SORT)
}

/// Name must be unique within the owning user's campaigns, ignoring
/// soft-deleted rows and the record being updated.
fn name_taken(
    conn: &mut PgConnection,
    name: &str,
    user_id: Option<Uuid>,
    exclude: Option<Uuid>,
) -> QueryResult<bool> {
    let mut q = campaigns::table
        .filter(campaigns::name.eq(name))
        .filter(campaigns::deleted_at.is_null())
        .into_boxed();
    q = match user_id {
        Some(uid) => q.filter(campaigns::user_id.eq(uid)),
        None => q.filter(campaigns::user_id.is_null()),
    };
    if let Some(id) = exclude {
        q = q.filter(campaigns::id.ne(id));
    }
    let count: i64 = q.count().get_result(conn)?;
    Ok(count > 0)
}

pub fn find_campaign(conn: &mut PgConnection, id: Uuid) -> Result<Campaign, ApiError> {
    campaigns::table
        .filter(campaigns::id.eq(id))
        .filter(campaigns::deleted_at.is_null())
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound("Campaign"))
}

pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let mut conn = state.conn.get()?;
    let name = req.name.clone().unwrap_or_default();
    let access = req.access.clone().unwrap_or_else(|| ACCESS_PRIVATE.to_string());

    let taken = name_taken(&mut conn, &name, req.user_id, None)?;
    validate_campaign(
        &name,
        req.starts_on,
        req.ends_on,
        &access,
        taken,
        req.users.len(),
    )
    .into_result()?;

    let now = Utc::now();
    let campaign = Campaign {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        assigned_to: req.assigned_to,
        name,
        access,
        status: req.status,
        budget: req.budget,
        target_leads: req.target_leads,
        target_conversion: req.target_conversion,
        target_revenue: req.target_revenue,
        leads_count: 0,
        opportunities_count: 0,
        revenue: None,
        starts_on: req.starts_on,
        ends_on: req.ends_on,
        objectives: req.objectives,
        background_info: req.background_info,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::insert_into(campaigns::table)
            .values(&campaign)
            .execute(conn)?;
        if campaign.access == ACCESS_SHARED {
            access::replace_permissions(conn, "Campaign", campaign.id, &req.users)?;
        }
        activities::log(conn, campaign.user_id, "Campaign", campaign.id, "created")?;
        Ok(())
    })?;

    log::info!("campaign {} created", campaign.id);
    Ok(Json(campaign))
}

pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let mut conn = state.conn.get()?;

    let prefs = match query.current_user {
        Some(uid) => users::find_user(&mut conn, uid).optional()?,
        None => None,
    };
    let default_per_page = prefs
        .as_ref()
        .and_then(|u| u.campaigns_per_page)
        .unwrap_or(state.config.crm.per_page);
    let sort_key = query
        .sort_by
        .clone()
        .or_else(|| prefs.as_ref().and_then(|u| u.campaigns_sort_by.clone()));
    let (per_page, offset) = paginate(query.page, query.per_page, default_per_page);

    let mut q = campaigns::table
        .filter(campaigns::deleted_at.is_null())
        .into_boxed();

    if let Some(status) = &query.status {
        let statuses: Vec<String> = status
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !statuses.is_empty() {
            if query.other.unwrap_or(false) {
                q = q.filter(
                    campaigns::status
                        .eq_any(statuses)
                        .or(campaigns::status.is_null()),
                );
            } else {
                q = q.filter(campaigns::status.eq_any(statuses));
            }
        }
    }
    if let Some(user_id) = query.created_by {
        q = q.filter(campaigns::user_id.eq(user_id));
    }
    if let Some(assignee) = query.assigned_to {
        q = q.filter(campaigns::assigned_to.eq(assignee));
    }
    if let Some(search) = &query.search {
        let cleaned = sanitize_search(search);
        if !cleaned.is_empty() {
            q = q.filter(campaigns::name.ilike(format!("%{cleaned}%")));
        }
    }

    q = match campaign_sort(sort_key.as_deref()) {
        "name ASC" => q.order(campaigns::name.asc()),
        "target_leads DESC" => q.order(campaigns::target_leads.desc()),
        "target_revenue DESC" => q.order(campaigns::target_revenue.desc()),
        "leads_count DESC" => q.order(campaigns::leads_count.desc()),
        "revenue DESC" => q.order(campaigns::revenue.desc()),
        "starts_on DESC" => q.order(campaigns::starts_on.desc()),
        "ends_on DESC" => q.order(campaigns::ends_on.desc()),
        "updated_at DESC" => q.order(campaigns::updated_at.desc()),
        _ => q.order(campaigns::created_at.desc()),
    };

    let rows: Vec<Campaign> = q.limit(per_page).offset(offset).load(&mut conn)?;
    Ok(Json(rows))
}

pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(find_campaign(&mut conn, id)?))
}

pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let mut conn = state.conn.get()?;
    let existing = find_campaign(&mut conn, id)?;

    let name = req.name.clone().unwrap_or(existing.name.clone());
    let access = req.access.clone().unwrap_or(existing.access.clone());
    let user_id = req.user_id.or(existing.user_id);
    let starts_on = req.starts_on.or(existing.starts_on);
    let ends_on = req.ends_on.or(existing.ends_on);

    let taken = name_taken(&mut conn, &name, user_id, Some(id))?;
    let grant_count = if access == ACCESS_SHARED {
        if req.users.is_empty() {
            access::permissions_for(&mut conn, "Campaign", id)?.len()
        } else {
            req.users.len()
        }
    } else {
        0
    };
    validate_campaign(&name, starts_on, ends_on, &access, taken, grant_count).into_result()?;

    let now = Utc::now();
    let updated = Campaign {
        id,
        user_id,
        assigned_to: req.assigned_to.or(existing.assigned_to),
        name,
        access,
        status: req.status.or(existing.status),
        budget: req.budget.or(existing.budget),
        target_leads: req.target_leads.or(existing.target_leads),
        target_conversion: req.target_conversion.or(existing.target_conversion),
        target_revenue: req.target_revenue.or(existing.target_revenue),
        leads_count: existing.leads_count,
        opportunities_count: existing.opportunities_count,
        revenue: existing.revenue,
        starts_on,
        ends_on,
        objectives: req.objectives.or(existing.objectives),
        background_info: req.background_info.or(existing.background_info),
        deleted_at: None,
        created_at: existing.created_at,
        updated_at: now,
    };

    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::update(campaigns::table.filter(campaigns::id.eq(id)))
            .set(&updated)
            .execute(conn)?;
        match access::grant_action(&updated.access, !req.users.is_empty()) {
            GrantAction::Replace => access::replace_permissions(conn, "Campaign", id, &req.users)?,
            GrantAction::Keep => {}
            GrantAction::Clear => access::replace_permissions(conn, "Campaign", id, &[])?,
        }
        activities::log(conn, updated.user_id, "Campaign", id, "updated")?;
        Ok(())
    })?;

    Ok(Json(updated))
}

/// Soft delete: the campaign and its dependents keep their rows, only
/// `deleted_at` is set. Leads go through the lead destroy path so their
/// contacts, addresses and tasks are cleaned up consistently.
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    let campaign = find_campaign(&mut conn, id)?;
    let now = Utc::now();

    conn.transaction::<_, ApiError, _>(|conn| {
        let campaign_leads: Vec<leads::Lead> = leads::for_campaign(conn, id)?;
        for lead in &campaign_leads {
            leads::destroy_lead_in_tx(conn, lead, now)?;
        }
        diesel::update(
            opportunities::table
                .filter(opportunities::campaign_id.eq(id))
                .filter(opportunities::deleted_at.is_null()),
        )
        .set(opportunities::deleted_at.eq(Some(now)))
        .execute(conn)?;
        diesel::update(
            tasks::table
                .filter(tasks::asset_type.eq("Campaign"))
                .filter(tasks::asset_id.eq(id))
                .filter(tasks::deleted_at.is_null()),
        )
        .set(tasks::deleted_at.eq(Some(now)))
        .execute(conn)?;
        diesel::update(campaigns::table.filter(campaigns::id.eq(id)))
            .set((
                campaigns::deleted_at.eq(Some(now)),
                campaigns::updated_at.eq(now),
            ))
            .execute(conn)?;
        activities::log(conn, campaign.user_id, "Campaign", id, "deleted")?;
        Ok(())
    })?;

    log::info!("campaign {id} soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_campaign_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/crm/campaigns",
            get(list_campaigns).post(create_campaign),
        )
        .route(
            "/api/crm/campaigns/:id",
            get(get_campaign)
                .put(update_campaign)
                .delete(delete_campaign),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_missing() {
        let errors = validate_campaign("", None, None, ACCESS_PRIVATE, false, 0);
        assert_eq!(errors.on("name").map(|e| e.code), Some("missing_campaign_name"));
    }

    #[test]
    fn taken_name_is_duplicate() {
        let errors = validate_campaign("Q3 Push", None, None, ACCESS_PRIVATE, true, 0);
        assert_eq!(errors.on("name").map(|e| e.code), Some("duplicate_name"));
    }

    #[test]
    fn start_after_end_fails_on_ends_on() {
        let starts = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let ends = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let errors =
            validate_campaign("Q3 Push", Some(starts), Some(ends), ACCESS_PRIVATE, false, 0);
        assert_eq!(errors.on("ends_on").map(|e| e.code), Some("dates_not_in_sequence"));
    }

    #[test]
    fn ordered_dates_pass() {
        let starts = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let ends = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let errors =
            validate_campaign("Q3 Push", Some(starts), Some(ends), ACCESS_PRIVATE, false, 0);
        assert!(errors.is_empty());
    }

    #[test]
    fn one_missing_date_passes() {
        let starts = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let errors = validate_campaign("Q3 Push", Some(starts), None, ACCESS_PRIVATE, false, 0);
        assert!(errors.is_empty());
    }

    #[test]
    fn shared_without_users_fails_on_access() {
        let errors = validate_campaign("Q3 Push", None, None, ACCESS_SHARED, false, 0);
        assert_eq!(errors.on("access").map(|e| e.code), Some("share_campaign"));
    }

    #[test]
    fn multiple_failures_reported_together() {
        let starts = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let ends = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let errors = validate_campaign("", Some(starts), Some(ends), ACCESS_SHARED, false, 0);
        assert_eq!(errors.errors.len(), 3);
    }

    #[test]
    fn save_request_parses_form_payload() {
        let req: SaveCampaignRequest = serde_json::from_value(serde_json::json!({
            "name": "Fall Launch",
            "access": "Shared",
            "budget": "15000.00",
            "starts_on": "2024-09-01",
            "ends_on": "2024-11-30",
            "users": [Uuid::new_v4()],
        }))
        .unwrap();
        assert_eq!(req.name.as_deref(), Some("Fall Launch"));
        assert_eq!(req.users.len(), 1);
        assert!(req.status.is_none());
    }

    #[test]
    fn sort_key_whitelist() {
        assert_eq!(campaign_sort(Some("leads_count DESC")), "leads_count DESC");
        assert_eq!(campaign_sort(Some("budget ASC")), CAMPAIGN_DEFAULT_SORT);
        assert_eq!(campaign_sort(None), CAMPAIGN_DEFAULT_SORT);
        assert_eq!(
            campaign_sort(Some("name ASC; DROP TABLE campaigns")),
            CAMPAIGN_DEFAULT_SORT
        );
    }
}
