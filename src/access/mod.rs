use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::schema::permissions;

pub const ACCESS_PRIVATE: &str = "Private";
pub const ACCESS_PUBLIC: &str = "Public";
pub const ACCESS_SHARED: &str = "Shared";
/// Lead-only: inherit the permission set of the linked campaign.
pub const ACCESS_CAMPAIGN: &str = "Campaign";

/// Explicit per-record access grant. A record saved with `Shared` access
/// must carry at least one of these rows.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = permissions)]
pub struct Permission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_type: String,
    pub asset_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Shared access requires at least one grant. Returns the field-error code
/// to report, keyed by asset type, or `None` when the record is valid.
pub fn shared_access_error(
    access: &str,
    asset_type: &str,
    grant_count: usize,
) -> Option<&'static str> {
    if access != ACCESS_SHARED || grant_count > 0 {
        return None;
    }
    match asset_type {
        "Campaign" => Some("share_campaign"),
        "Lead" => Some("share_lead"),
        _ => Some("share_record"),
    }
}

/// What a save does to a record's grant rows. A `Shared` save that
/// supplies no user list keeps the existing grants untouched: replacing
/// them with nothing would leave a shared record nobody is granted, the
/// exact state the save-time validation exists to prevent. Any other
/// access mode sheds grants left over from a previous `Shared` save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantAction {
    Replace,
    Keep,
    Clear,
}

pub fn grant_action(access: &str, users_supplied: bool) -> GrantAction {
    if access == ACCESS_SHARED {
        if users_supplied {
            GrantAction::Replace
        } else {
            GrantAction::Keep
        }
    } else {
        GrantAction::Clear
    }
}

pub fn permissions_for(
    conn: &mut PgConnection,
    asset_type: &str,
    asset_id: Uuid,
) -> QueryResult<Vec<Permission>> {
    permissions::table
        .filter(permissions::asset_type.eq(asset_type))
        .filter(permissions::asset_id.eq(asset_id))
        .load(conn)
}

/// Replace a record's grants with the given user list. Runs inside the
/// caller's save transaction.
pub fn replace_permissions(
    conn: &mut PgConnection,
    asset_type: &str,
    asset_id: Uuid,
    user_ids: &[Uuid],
) -> QueryResult<()> {
    diesel::delete(
        permissions::table
            .filter(permissions::asset_type.eq(asset_type))
            .filter(permissions::asset_id.eq(asset_id)),
    )
    .execute(conn)?;

    let now = Utc::now();
    let rows: Vec<Permission> = user_ids
        .iter()
        .map(|&user_id| Permission {
            id: Uuid::new_v4(),
            user_id,
            asset_type: asset_type.to_string(),
            asset_id,
            created_at: now,
        })
        .collect();
    diesel::insert_into(permissions::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

/// Copy the source record's grants onto the target, replacing whatever the
/// target had. Used when a lead with `Campaign` access inherits its
/// campaign's permission set.
pub fn copy_permissions(
    conn: &mut PgConnection,
    from: (&str, Uuid),
    to: (&str, Uuid),
) -> QueryResult<()> {
    let source = permissions_for(conn, from.0, from.1)?;
    let user_ids: Vec<Uuid> = source.iter().map(|p| p.user_id).collect();
    replace_permissions(conn, to.0, to.1, &user_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_without_grants_fails() {
        assert_eq!(
            shared_access_error(ACCESS_SHARED, "Campaign", 0),
            Some("share_campaign")
        );
        assert_eq!(
            shared_access_error(ACCESS_SHARED, "Lead", 0),
            Some("share_lead")
        );
    }

    #[test]
    fn shared_with_grants_passes() {
        assert_eq!(shared_access_error(ACCESS_SHARED, "Campaign", 1), None);
        assert_eq!(shared_access_error(ACCESS_SHARED, "Lead", 3), None);
    }

    #[test]
    fn non_shared_access_never_requires_grants() {
        assert_eq!(shared_access_error(ACCESS_PRIVATE, "Campaign", 0), None);
        assert_eq!(shared_access_error(ACCESS_PUBLIC, "Lead", 0), None);
        assert_eq!(shared_access_error(ACCESS_CAMPAIGN, "Lead", 0), None);
    }

    #[test]
    fn shared_save_without_users_keeps_existing_grants() {
        // A shared record with one grant passes validation; re-saving it
        // without a user list must not wipe that grant.
        assert_eq!(shared_access_error(ACCESS_SHARED, "Lead", 1), None);
        assert_eq!(grant_action(ACCESS_SHARED, false), GrantAction::Keep);
    }

    #[test]
    fn shared_save_with_users_replaces_grants() {
        assert_eq!(grant_action(ACCESS_SHARED, true), GrantAction::Replace);
    }

    #[test]
    fn access_downgrade_clears_grants() {
        assert_eq!(grant_action(ACCESS_PRIVATE, false), GrantAction::Clear);
        assert_eq!(grant_action(ACCESS_PUBLIC, true), GrantAction::Clear);
    }
}
