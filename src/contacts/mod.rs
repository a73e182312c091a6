use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::Account;
use crate::leads::Lead;
use crate::shared::errors::ApiError;
use crate::shared::schema::contacts;

/// A person record derived from a lead at promotion time. Keeps its row
/// when the lead is later destroyed; only the `lead_id` link is severed.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = contacts)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub access: String,
    pub title: Option<String>,
    pub source: Option<String>,
    pub email: Option<String>,
    pub alt_email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub blog: Option<String>,
    pub linkedin: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub do_not_call: bool,
    pub background_info: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Promotion step 3: materialize the lead's person and contact-channel
/// fields as a contact tied to the lead and its account.
pub fn create_for(
    conn: &mut PgConnection,
    lead: &Lead,
    account: &Account,
) -> Result<Contact, ApiError> {
    let now = Utc::now();
    let contact = Contact {
        id: Uuid::new_v4(),
        user_id: lead.user_id,
        lead_id: Some(lead.id),
        account_id: Some(account.id),
        assigned_to: lead.assigned_to,
        first_name: lead.first_name.clone(),
        last_name: lead.last_name.clone(),
        access: lead.access.clone(),
        title: lead.title.clone(),
        source: lead.source.clone(),
        email: lead.email.clone(),
        alt_email: lead.alt_email.clone(),
        phone: lead.phone.clone(),
        mobile: lead.mobile.clone(),
        blog: lead.blog.clone(),
        linkedin: lead.linkedin.clone(),
        facebook: lead.facebook.clone(),
        twitter: lead.twitter.clone(),
        do_not_call: lead.do_not_call,
        background_info: lead.background_info.clone(),
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(contacts::table)
        .values(&contact)
        .execute(conn)?;
    Ok(contact)
}
