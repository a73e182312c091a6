use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{self, ACCESS_PRIVATE, ACCESS_SHARED};
use crate::accounts::Account;
use crate::leads::Lead;
use crate::shared::errors::{ApiError, ValidationErrors};
use crate::shared::schema::opportunities;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = opportunities)]
pub struct Opportunity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub name: String,
    pub access: String,
    pub source: Option<String>,
    pub stage: Option<String>,
    pub probability: Option<i32>,
    pub amount: Option<BigDecimal>,
    pub discount: Option<BigDecimal>,
    pub closes_on: Option<NaiveDate>,
    pub background_info: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityParams {
    pub name: Option<String>,
    pub access: Option<String>,
    pub stage: Option<String>,
    pub probability: Option<i32>,
    pub amount: Option<BigDecimal>,
    pub discount: Option<BigDecimal>,
    pub closes_on: Option<NaiveDate>,
}

/// Promotion step 2: create the opportunity for the lead/account pair. The
/// opportunity inherits the lead's campaign and source; the name falls back
/// to the lead's full name when the form left it blank.
pub fn create_for(
    conn: &mut PgConnection,
    lead: &Lead,
    account: &Account,
    params: &OpportunityParams,
    users: &[Uuid],
) -> Result<Opportunity, ApiError> {
    let name = params
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| lead.full_name(None));

    let access = params.access.clone().unwrap_or_else(|| ACCESS_PRIVATE.to_string());
    if let Some(code) = access::shared_access_error(&access, "Opportunity", users.len()) {
        let mut errors = ValidationErrors::new();
        errors.add("access", code);
        return Err(ApiError::Validation(errors));
    }

    let now = Utc::now();
    let opportunity = Opportunity {
        id: Uuid::new_v4(),
        user_id: lead.user_id,
        campaign_id: lead.campaign_id,
        assigned_to: lead.assigned_to,
        account_id: Some(account.id),
        contact_id: None,
        name,
        access,
        source: lead.source.clone(),
        stage: params.stage.clone(),
        probability: params.probability,
        amount: params.amount.clone(),
        discount: params.discount.clone(),
        closes_on: params.closes_on,
        background_info: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(opportunities::table)
        .values(&opportunity)
        .execute(conn)?;
    if opportunity.access == ACCESS_SHARED {
        access::replace_permissions(conn, "Opportunity", opportunity.id, users)?;
    }
    Ok(opportunity)
}

pub fn link_contact(
    conn: &mut PgConnection,
    opportunity_id: Uuid,
    contact_id: Uuid,
) -> QueryResult<()> {
    diesel::update(opportunities::table.filter(opportunities::id.eq(opportunity_id)))
        .set(opportunities::contact_id.eq(Some(contact_id)))
        .execute(conn)?;
    Ok(())
}
