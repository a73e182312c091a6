pub mod promote;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::access::{self, GrantAction, ACCESS_CAMPAIGN, ACCESS_PRIVATE, ACCESS_SHARED};
use crate::activities;
use crate::campaigns;
use crate::shared::errors::{ApiError, ValidationErrors};
use crate::shared::schema::{addresses, campaigns as campaigns_table, contacts, leads, tasks};
use crate::shared::state::AppState;
use crate::shared::utils::{paginate, sanitize_search};
use crate::users;

pub const LEAD_SORT_KEYS: &[&str] = &[
    "first_name ASC",
    "last_name ASC",
    "company ASC",
    "rating DESC",
    "created_at DESC",
    "updated_at DESC",
];
pub const LEAD_DEFAULT_SORT: &str = "created_at DESC";

pub const STATUS_CONVERTED: &str = "converted";
pub const STATUS_REJECTED: &str = "rejected";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub access: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub referred_by: Option<String>,
    pub email: Option<String>,
    pub alt_email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub blog: Option<String>,
    pub linkedin: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub rating: i32,
    pub do_not_call: bool,
    pub background_info: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// "First Last" when `format` is unset or "before", "Last, First"
    /// otherwise.
    pub fn full_name(&self, format: Option<&str>) -> String {
        full_name(&self.first_name, &self.last_name, format)
    }
}

pub fn full_name(first: &str, last: &str, format: Option<&str>) -> String {
    match format {
        None | Some("before") => format!("{first} {last}"),
        Some(_) => format!("{last}, {first}"),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessAddressParams {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub full_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub access: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub referred_by: Option<String>,
    pub email: Option<String>,
    pub alt_email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub blog: Option<String>,
    pub linkedin: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub rating: Option<i32>,
    pub do_not_call: Option<bool>,
    pub background_info: Option<String>,
    pub user_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub business_address: Option<BusinessAddressParams>,
    /// Grant list applied when `access == "Shared"`.
    #[serde(default)]
    pub users: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    pub search: Option<String>,
    /// Comma-separated status filter.
    pub status: Option<String>,
    /// Include rows whose status is NULL alongside the `status` filter.
    pub other: Option<bool>,
    pub converted: Option<bool>,
    pub campaign_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub source: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Acting user; their saved sort/per-page preferences fill in whatever
    /// the query string leaves unset.
    pub current_user: Option<Uuid>,
}

pub fn validate_lead(
    first_name: &str,
    last_name: &str,
    access: &str,
    grant_count: usize,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if first_name.trim().is_empty() {
        errors.add("first_name", "missing_first_name");
    }
    if last_name.trim().is_empty() {
        errors.add("last_name", "missing_last_name");
    }
    if let Some(code) = access::shared_access_error(access, "Lead", grant_count) {
        errors.add("access", code);
    }
    errors
}

pub fn lead_sort(key: Option<&str>) -> &'static str {
    key.and_then(|k| LEAD_SORT_KEYS.iter().find(|s| **s == k))
        .copied()
        .unwrap_or(LEAD_DEFAULT_SORT)
}

/// Counter adjustments needed when a lead moves between campaigns. Empty
/// when the association is unchanged; otherwise -1 for the old campaign
/// and +1 for the new one, so the total across campaigns is preserved.
pub fn campaign_counter_deltas(old: Option<Uuid>, new: Option<Uuid>) -> Vec<(Uuid, i32)> {
    if old == new {
        return Vec::new();
    }
    let mut deltas = Vec::new();
    if let Some(old_id) = old {
        deltas.push((old_id, -1));
    }
    if let Some(new_id) = new {
        deltas.push((new_id, 1));
    }
    deltas
}

/// Atomic column arithmetic; safe under concurrent requests without a
/// read-modify-write cycle.
pub fn adjust_leads_count(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    delta: i32,
) -> QueryResult<()> {
    diesel::update(campaigns_table::table.filter(campaigns_table::id.eq(campaign_id)))
        .set(campaigns_table::leads_count.eq(campaigns_table::leads_count + delta))
        .execute(conn)?;
    Ok(())
}

pub fn find_lead(conn: &mut PgConnection, id: Uuid) -> Result<Lead, ApiError> {
    leads::table
        .filter(leads::id.eq(id))
        .filter(leads::deleted_at.is_null())
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound("Lead"))
}

/// Live leads belonging to a campaign.
pub fn for_campaign(conn: &mut PgConnection, campaign_id: Uuid) -> QueryResult<Vec<Lead>> {
    leads::table
        .filter(leads::campaign_id.eq(campaign_id))
        .filter(leads::deleted_at.is_null())
        .order(leads::id.desc())
        .load(conn)
}

/// Apply the lead's permission semantics inside its save transaction:
/// `Shared` takes the explicit grant list, `Campaign` inherits the linked
/// campaign's grants, and anything else sheds whatever grants were left
/// over from a previous access mode.
fn save_permissions(
    conn: &mut PgConnection,
    lead_id: Uuid,
    lead_access: &str,
    campaign_id: Option<Uuid>,
    users: &[Uuid],
) -> QueryResult<()> {
    if lead_access == ACCESS_CAMPAIGN {
        return match campaign_id {
            Some(cid) => access::copy_permissions(conn, ("Campaign", cid), ("Lead", lead_id)),
            None => Ok(()),
        };
    }
    match access::grant_action(lead_access, !users.is_empty()) {
        GrantAction::Replace => access::replace_permissions(conn, "Lead", lead_id, users),
        GrantAction::Keep => Ok(()),
        GrantAction::Clear => access::replace_permissions(conn, "Lead", lead_id, &[]),
    }
}

fn replace_business_address(
    conn: &mut PgConnection,
    lead_id: Uuid,
    params: &BusinessAddressParams,
) -> QueryResult<()> {
    let now = Utc::now();
    diesel::update(
        addresses::table
            .filter(addresses::addressable_type.eq("Lead"))
            .filter(addresses::addressable_id.eq(lead_id))
            .filter(addresses::address_type.eq("Business"))
            .filter(addresses::deleted_at.is_null()),
    )
    .set(addresses::deleted_at.eq(Some(now)))
    .execute(conn)?;

    diesel::insert_into(addresses::table)
        .values((
            addresses::id.eq(Uuid::new_v4()),
            addresses::addressable_type.eq("Lead"),
            addresses::addressable_id.eq(lead_id),
            addresses::street1.eq(&params.street1),
            addresses::street2.eq(&params.street2),
            addresses::city.eq(&params.city),
            addresses::state.eq(&params.state),
            addresses::zipcode.eq(&params.zipcode),
            addresses::country.eq(&params.country),
            addresses::full_address.eq(&params.full_address),
            addresses::address_type.eq("Business"),
            addresses::created_at.eq(now),
            addresses::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    let first_name = req.first_name.clone().unwrap_or_default();
    let last_name = req.last_name.clone().unwrap_or_default();
    let access = req.access.clone().unwrap_or_else(|| ACCESS_PRIVATE.to_string());

    validate_lead(&first_name, &last_name, &access, req.users.len()).into_result()?;

    // A dangling campaign reference is a lookup fault, not a validation error.
    if let Some(cid) = req.campaign_id {
        campaigns::find_campaign(&mut conn, cid)?;
    }

    let now = Utc::now();
    let lead = Lead {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        campaign_id: req.campaign_id,
        assigned_to: req.assigned_to,
        first_name,
        last_name,
        access,
        title: req.title,
        company: req.company,
        source: req.source,
        status: req.status,
        referred_by: req.referred_by,
        email: req.email,
        alt_email: req.alt_email,
        phone: req.phone,
        mobile: req.mobile,
        blog: req.blog,
        linkedin: req.linkedin,
        facebook: req.facebook,
        twitter: req.twitter,
        rating: req.rating.unwrap_or(0),
        do_not_call: req.do_not_call.unwrap_or(false),
        background_info: req.background_info,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::insert_into(leads::table).values(&lead).execute(conn)?;
        if let Some(cid) = lead.campaign_id {
            adjust_leads_count(conn, cid, 1)?;
        }
        save_permissions(conn, lead.id, &lead.access, lead.campaign_id, &req.users)?;
        if let Some(address) = &req.business_address {
            replace_business_address(conn, lead.id, address)?;
        }
        activities::log(conn, lead.user_id, "Lead", lead.id, "created")?;
        Ok(())
    })?;

    log::info!("lead {} created", lead.id);
    Ok(Json(lead))
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let mut conn = state.conn.get()?;

    let prefs = match query.current_user {
        Some(uid) => users::find_user(&mut conn, uid).optional()?,
        None => None,
    };
    let default_per_page = prefs
        .as_ref()
        .and_then(|u| u.leads_per_page)
        .unwrap_or(state.config.crm.per_page);
    let sort_key = query
        .sort_by
        .clone()
        .or_else(|| prefs.as_ref().and_then(|u| u.leads_sort_by.clone()));
    let (per_page, offset) = paginate(query.page, query.per_page, default_per_page);

    let mut q = leads::table.filter(leads::deleted_at.is_null()).into_boxed();

    if query.converted.unwrap_or(false) {
        q = q.filter(leads::status.eq(STATUS_CONVERTED));
    } else if let Some(status) = &query.status {
        let statuses: Vec<String> = status
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !statuses.is_empty() {
            if query.other.unwrap_or(false) {
                q = q.filter(leads::status.eq_any(statuses).or(leads::status.is_null()));
            } else {
                q = q.filter(leads::status.eq_any(statuses));
            }
        }
    }
    if let Some(cid) = query.campaign_id {
        q = q.filter(leads::campaign_id.eq(cid));
    }
    if let Some(user_id) = query.created_by {
        q = q.filter(leads::user_id.eq(user_id));
    }
    if let Some(assignee) = query.assigned_to {
        q = q.filter(leads::assigned_to.eq(assignee));
    }
    if let Some(source) = &query.source {
        q = q.filter(leads::source.eq(source));
    }
    if let Some(search) = &query.search {
        let cleaned = sanitize_search(search);
        if !cleaned.is_empty() {
            let pattern = format!("%{cleaned}%");
            q = q.filter(
                leads::first_name
                    .ilike(pattern.clone())
                    .or(leads::last_name.ilike(pattern.clone()))
                    .or(leads::company.ilike(pattern)),
            );
        }
    }

    q = match lead_sort(sort_key.as_deref()) {
        "first_name ASC" => q.order(leads::first_name.asc()),
        "last_name ASC" => q.order(leads::last_name.asc()),
        "company ASC" => q.order(leads::company.asc()),
        "rating DESC" => q.order(leads::rating.desc()),
        "updated_at DESC" => q.order(leads::updated_at.desc()),
        _ => q.order(leads::created_at.desc()),
    };

    let rows: Vec<Lead> = q.limit(per_page).offset(offset).load(&mut conn)?;
    Ok(Json(rows))
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(find_lead(&mut conn, id)?))
}

pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    let existing = find_lead(&mut conn, id)?;

    let first_name = req.first_name.clone().unwrap_or(existing.first_name.clone());
    let last_name = req.last_name.clone().unwrap_or(existing.last_name.clone());
    let access = req.access.clone().unwrap_or(existing.access.clone());
    let new_campaign = req.campaign_id.or(existing.campaign_id);

    let grant_count = if access == ACCESS_SHARED {
        if req.users.is_empty() {
            access::permissions_for(&mut conn, "Lead", id)?.len()
        } else {
            req.users.len()
        }
    } else {
        0
    };
    validate_lead(&first_name, &last_name, &access, grant_count).into_result()?;

    if let Some(cid) = new_campaign {
        if Some(cid) != existing.campaign_id {
            campaigns::find_campaign(&mut conn, cid)?;
        }
    }

    let now = Utc::now();
    let updated = Lead {
        id,
        user_id: req.user_id.or(existing.user_id),
        campaign_id: new_campaign,
        assigned_to: req.assigned_to.or(existing.assigned_to),
        first_name,
        last_name,
        access,
        title: req.title.or(existing.title),
        company: req.company.or(existing.company),
        source: req.source.or(existing.source),
        status: req.status.or(existing.status),
        referred_by: req.referred_by.or(existing.referred_by),
        email: req.email.or(existing.email),
        alt_email: req.alt_email.or(existing.alt_email),
        phone: req.phone.or(existing.phone),
        mobile: req.mobile.or(existing.mobile),
        blog: req.blog.or(existing.blog),
        linkedin: req.linkedin.or(existing.linkedin),
        facebook: req.facebook.or(existing.facebook),
        twitter: req.twitter.or(existing.twitter),
        rating: req.rating.unwrap_or(existing.rating),
        do_not_call: req.do_not_call.unwrap_or(existing.do_not_call),
        background_info: req.background_info.or(existing.background_info),
        deleted_at: None,
        created_at: existing.created_at,
        updated_at: now,
    };

    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::update(leads::table.filter(leads::id.eq(id)))
            .set(&updated)
            .execute(conn)?;
        // Both counter adjustments happen inside this one transaction.
        for (campaign_id, delta) in
            campaign_counter_deltas(existing.campaign_id, updated.campaign_id)
        {
            adjust_leads_count(conn, campaign_id, delta)?;
        }
        save_permissions(conn, id, &updated.access, updated.campaign_id, &req.users)?;
        if let Some(address) = &req.business_address {
            replace_business_address(conn, id, address)?;
        }
        activities::log(conn, updated.user_id, "Lead", id, "updated")?;
        Ok(())
    })?;

    Ok(Json(updated))
}

/// Soft-destroy a lead inside an existing transaction: set `deleted_at`,
/// restore the campaign counter, keep the derived contact but sever its
/// lead link, and take the business address and tasks down with the lead.
pub fn destroy_lead_in_tx(
    conn: &mut PgConnection,
    lead: &Lead,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    diesel::update(leads::table.filter(leads::id.eq(lead.id)))
        .set((leads::deleted_at.eq(Some(now)), leads::updated_at.eq(now)))
        .execute(conn)?;
    if let Some(cid) = lead.campaign_id {
        adjust_leads_count(conn, cid, -1)?;
    }
    diesel::update(contacts::table.filter(contacts::lead_id.eq(lead.id)))
        .set(contacts::lead_id.eq(None::<Uuid>))
        .execute(conn)?;
    diesel::update(
        addresses::table
            .filter(addresses::addressable_type.eq("Lead"))
            .filter(addresses::addressable_id.eq(lead.id))
            .filter(addresses::deleted_at.is_null()),
    )
    .set(addresses::deleted_at.eq(Some(now)))
    .execute(conn)?;
    diesel::update(
        tasks::table
            .filter(tasks::asset_type.eq("Lead"))
            .filter(tasks::asset_id.eq(lead.id))
            .filter(tasks::deleted_at.is_null()),
    )
    .set(tasks::deleted_at.eq(Some(now)))
    .execute(conn)?;
    Ok(())
}

pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    let lead = find_lead(&mut conn, id)?;
    let now = Utc::now();

    conn.transaction::<_, ApiError, _>(|conn| {
        destroy_lead_in_tx(conn, &lead, now)?;
        activities::log(conn, lead.user_id, "Lead", id, "deleted")?;
        Ok(())
    })?;

    log::info!("lead {id} soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Write a status value unconditionally; no transition rules apply. The
/// status write and its activity row commit or roll back together.
fn set_status(conn: &mut PgConnection, id: Uuid, status: &str) -> Result<Lead, ApiError> {
    let lead = find_lead(conn, id)?;
    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::update(leads::table.filter(leads::id.eq(id)))
            .set((
                leads::status.eq(Some(status.to_string())),
                leads::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        activities::log(conn, lead.user_id, "Lead", id, status)?;
        Ok(())
    })?;
    find_lead(conn, id)
}

pub async fn convert_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(set_status(&mut conn, id, STATUS_CONVERTED)?))
}

pub async fn reject_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(set_status(&mut conn, id, STATUS_REJECTED)?))
}

pub fn configure_lead_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/crm/leads", get(list_leads).post(create_lead))
        .route(
            "/api/crm/leads/:id",
            get(get_lead).put(update_lead).delete(delete_lead),
        )
        .route("/api/crm/leads/:id/convert", post(convert_lead))
        .route("/api/crm/leads/:id/reject", post(reject_lead))
        .route("/api/crm/leads/:id/promote", post(promote::promote_lead))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_default_and_before() {
        assert_eq!(full_name("Jane", "Doe", None), "Jane Doe");
        assert_eq!(full_name("Jane", "Doe", Some("before")), "Jane Doe");
    }

    #[test]
    fn full_name_after() {
        assert_eq!(full_name("Jane", "Doe", Some("after")), "Doe, Jane");
    }

    #[test]
    fn missing_names_fail_separately() {
        let errors = validate_lead("", "", ACCESS_PRIVATE, 0);
        assert_eq!(errors.on("first_name").map(|e| e.code), Some("missing_first_name"));
        assert_eq!(errors.on("last_name").map(|e| e.code), Some("missing_last_name"));
        assert_eq!(errors.errors.len(), 2);
    }

    #[test]
    fn shared_lead_without_grants_fails() {
        let errors = validate_lead("Jane", "Doe", ACCESS_SHARED, 0);
        assert_eq!(errors.on("access").map(|e| e.code), Some("share_lead"));
    }

    #[test]
    fn shared_update_without_users_preserves_grants() {
        // A shared lead with one existing grant validates cleanly, and a
        // save that supplies no user list must leave that grant in place
        // rather than replacing it with nothing.
        assert!(validate_lead("Jane", "Doe", ACCESS_SHARED, 1).is_empty());
        assert_eq!(access::grant_action(ACCESS_SHARED, false), GrantAction::Keep);
    }

    #[test]
    fn campaign_access_needs_no_grants() {
        assert!(validate_lead("Jane", "Doe", ACCESS_CAMPAIGN, 0).is_empty());
    }

    #[test]
    fn no_delta_when_campaign_unchanged() {
        let id = Uuid::new_v4();
        assert!(campaign_counter_deltas(Some(id), Some(id)).is_empty());
        assert!(campaign_counter_deltas(None, None).is_empty());
    }

    #[test]
    fn create_and_destroy_deltas() {
        let id = Uuid::new_v4();
        assert_eq!(campaign_counter_deltas(None, Some(id)), vec![(id, 1)]);
        assert_eq!(campaign_counter_deltas(Some(id), None), vec![(id, -1)]);
    }

    #[test]
    fn reassignment_preserves_total() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let deltas = campaign_counter_deltas(Some(a), Some(b));
        assert_eq!(deltas, vec![(a, -1), (b, 1)]);
        assert_eq!(deltas.iter().map(|(_, d)| d).sum::<i32>(), 0);
    }

    #[test]
    fn status_setters_write_exact_values() {
        assert_eq!(STATUS_CONVERTED, "converted");
        assert_eq!(STATUS_REJECTED, "rejected");
    }

    #[test]
    fn lead_sort_whitelist() {
        assert_eq!(lead_sort(Some("rating DESC")), "rating DESC");
        assert_eq!(lead_sort(Some("email ASC")), LEAD_DEFAULT_SORT);
        assert_eq!(lead_sort(None), LEAD_DEFAULT_SORT);
    }
}
