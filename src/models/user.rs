use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const UNKNOWN_USER: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub is_admin: bool,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            Some(self.name.as_str()),
        )
    }
}

/// Public view of a user, as embedded in events and listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub email: String,
    pub image: Option<String>,
    pub is_admin: bool,
    pub is_confirmed: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
            is_admin: user.is_admin,
            is_confirmed: user.is_confirmed,
        }
    }
}

/// "first last" when both parts exist, else whichever part exists, else the
/// account name.
pub fn display_name(first: Option<&str>, last: Option<&str>, name: Option<&str>) -> String {
    fn non_blank(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    match (non_blank(first), non_blank(last)) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(part), None) | (None, Some(part)) => part.to_string(),
        (None, None) => non_blank(name).unwrap_or(UNKNOWN_USER).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(Some("Ada"), Some("Lovelace"), Some("ada")), "Ada Lovelace");
        assert_eq!(display_name(Some("Ada"), None, Some("ada")), "Ada");
        assert_eq!(display_name(None, Some("Lovelace"), None), "Lovelace");
        assert_eq!(display_name(Some(" "), None, Some("ada.l")), "ada.l");
        assert_eq!(display_name(None, None, None), "Unknown");
        assert_eq!(display_name(None, None, Some("")), "Unknown");
    }
}
