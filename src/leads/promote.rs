use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::accounts::{self, Account, AccountParams};
use crate::activities;
use crate::contacts::{self, Contact};
use crate::leads::{self, Lead, STATUS_CONVERTED};
use crate::opportunities::{self, Opportunity, OpportunityParams};
use crate::shared::errors::ApiError;
use crate::shared::schema::leads as leads_table;
use crate::shared::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PromoteLeadRequest {
    #[serde(default)]
    pub account: AccountParams,
    /// When absent, no opportunity is created.
    pub opportunity: Option<OpportunityParams>,
    #[serde(default)]
    pub users: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub account: Account,
    pub opportunity: Option<Opportunity>,
    pub contact: Contact,
    pub lead: Lead,
}

/// Promote a lead into an account, an optional opportunity, and a contact.
/// The three creations and the status flip run in one transaction, so a
/// failure in a later step leaves no orphaned records behind.
pub async fn promote_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PromoteLeadRequest>,
) -> Result<Json<PromotionResponse>, ApiError> {
    let mut conn = state.conn.get()?;
    let lead = leads::find_lead(&mut conn, id)?;

    let response = conn.transaction::<_, ApiError, _>(|conn| {
        let account = accounts::create_or_select_for(conn, &lead, &req.account, &req.users)?;
        let mut opportunity = match &req.opportunity {
            Some(params) => Some(opportunities::create_for(
                conn, &lead, &account, params, &req.users,
            )?),
            None => None,
        };
        let contact = contacts::create_for(conn, &lead, &account)?;
        if let Some(opportunity) = opportunity.as_mut() {
            opportunities::link_contact(conn, opportunity.id, contact.id)?;
            opportunity.contact_id = Some(contact.id);
        }

        diesel::update(leads_table::table.filter(leads_table::id.eq(lead.id)))
            .set((
                leads_table::status.eq(Some(STATUS_CONVERTED.to_string())),
                leads_table::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        activities::log(conn, lead.user_id, "Lead", lead.id, "promoted")?;

        let lead = leads::find_lead(conn, lead.id)?;
        Ok(PromotionResponse {
            account,
            opportunity,
            contact,
            lead,
        })
    })?;

    log::info!("lead {id} promoted to account {}", response.account.id);
    Ok(Json(response))
}
