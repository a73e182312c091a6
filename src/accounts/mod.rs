use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{self, ACCESS_PRIVATE, ACCESS_SHARED};
use crate::leads::Lead;
use crate::shared::errors::{ApiError, ValidationErrors};
use crate::shared::schema::accounts;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = accounts)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub name: String,
    pub access: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub background_info: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountParams {
    /// Select an existing account instead of creating one.
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub access: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

/// Promotion step 1: pick the account the lead converts into. An explicit
/// id selects that account; otherwise the account is matched by name
/// (falling back to the lead's company) among live accounts, and created
/// when no match exists.
pub fn create_or_select_for(
    conn: &mut PgConnection,
    lead: &Lead,
    params: &AccountParams,
    users: &[Uuid],
) -> Result<Account, ApiError> {
    if let Some(id) = params.id {
        return accounts::table
            .filter(accounts::id.eq(id))
            .filter(accounts::deleted_at.is_null())
            .first(conn)
            .optional()?
            .ok_or(ApiError::NotFound("Account"));
    }

    let name = params
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| lead.company.clone().filter(|c| !c.trim().is_empty()))
        .unwrap_or_default();
    if name.trim().is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "missing_account_name");
        return Err(ApiError::Validation(errors));
    }

    let existing: Option<Account> = accounts::table
        .filter(accounts::name.eq(&name))
        .filter(accounts::deleted_at.is_null())
        .first(conn)
        .optional()?;
    if let Some(account) = existing {
        return Ok(account);
    }

    let access = params.access.clone().unwrap_or_else(|| ACCESS_PRIVATE.to_string());
    if let Some(code) = access::shared_access_error(&access, "Account", users.len()) {
        let mut errors = ValidationErrors::new();
        errors.add("access", code);
        return Err(ApiError::Validation(errors));
    }

    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4(),
        user_id: lead.user_id,
        assigned_to: lead.assigned_to,
        name,
        access,
        website: params.website.clone(),
        phone: params.phone.clone(),
        background_info: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(accounts::table)
        .values(&account)
        .execute(conn)?;
    if account.access == ACCESS_SHARED {
        access::replace_permissions(conn, "Account", account.id, users)?;
    }
    Ok(account)
}
