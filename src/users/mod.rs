use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::schema::users;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub first_name_position: String,
    pub campaigns_per_page: Option<i64>,
    pub campaigns_sort_by: Option<String>,
    pub leads_per_page: Option<i64>,
    pub leads_sort_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last" when the position preference is unset or "before",
    /// otherwise "Last, First". Falls back to the username when both name
    /// parts are blank.
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        if first.is_empty() && last.is_empty() {
            return self.username.clone();
        }
        if self.first_name_position == "after" {
            format!("{last}, {first}")
        } else {
            format!("{first} {last}")
        }
    }
}

pub fn find_user(conn: &mut PgConnection, id: Uuid) -> QueryResult<User> {
    users::table.filter(users::id.eq(id)).first(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str, position: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            first_name_position: position.to_string(),
            campaigns_per_page: None,
            campaigns_sort_by: None,
            leads_per_page: None,
            leads_sort_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_name_first_before() {
        assert_eq!(user("Jane", "Doe", "before").full_name(), "Jane Doe");
    }

    #[test]
    fn full_name_first_after() {
        assert_eq!(user("Jane", "Doe", "after").full_name(), "Doe, Jane");
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let mut u = user("", "", "before");
        u.first_name = None;
        u.last_name = None;
        assert_eq!(u.full_name(), "jdoe");
    }
}
