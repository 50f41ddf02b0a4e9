//! Session identity derived from the authenticated user.

use serde::{Deserialize, Serialize};

use sandpiper_core::{Email, Role, UserId};

/// A normalized account profile.
///
/// The wire format is irregular: the backend may deliver `_id` instead of
/// `id`, and `firstName`/`lastName` instead of a display `name`.
/// Deserialization resolves both so the rest of the runtime only ever sees
/// the normalized shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UserWire")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserWire {
    #[serde(alias = "_id")]
    id: UserId,
    email: Email,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

impl From<UserWire> for User {
    fn from(wire: UserWire) -> Self {
        let name = wire
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                let first = wire.first_name.as_deref().unwrap_or_default();
                let last = wire.last_name.as_deref().unwrap_or_default();
                format!("{first} {last}").trim().to_string()
            });

        Self {
            id: wire.id,
            email: wire.email,
            name,
            role: wire.role,
            avatar: wire.avatar,
            phone: wire.phone,
        }
    }
}

/// Derived authentication state for the UI layer.
///
/// Holds nothing beyond the current user; everything else is recomputed on
/// read so it can never drift from the user object.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// An unauthenticated session.
    #[must_use]
    pub const fn new() -> Self {
        Self { user: None }
    }

    /// The current user, if authenticated.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Replace the current user.
    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    /// Drop the current user.
    pub fn clear(&mut self) {
        self.user = None;
    }

    /// Whether a user is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The current user's role; unauthenticated sessions read as [`Role::Customer`].
    #[must_use]
    pub fn role(&self) -> Role {
        self.user.as_ref().map(|user| user.role).unwrap_or_default()
    }

    /// Whether the current user may enter the admin surface.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.role.is_staff())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: UserId::new("u1"),
            email: Email::parse("shopper@example.com").expect("email"),
            name: "Shopper".to_string(),
            role,
            avatar: None,
            phone: None,
        }
    }

    #[test]
    fn test_normalizes_mongo_id_alias() {
        let wire = r#"{"_id":"64af","email":"a@b.com","name":"Ada","role":"user"}"#;
        let user: User = serde_json::from_str(wire).expect("parse");
        assert_eq!(user.id, UserId::new("64af"));
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn test_name_falls_back_to_first_and_last() {
        let wire = r#"{"id":"u2","email":"a@b.com","firstName":"Ada","lastName":"Lovelace","role":"admin"}"#;
        let user: User = serde_json::from_str(wire).expect("parse");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_name_fallback_handles_missing_parts() {
        let wire = r#"{"id":"u3","email":"a@b.com","firstName":"Ada"}"#;
        let user: User = serde_json::from_str(wire).expect("parse");
        assert_eq!(user.name, "Ada");
        assert_eq!(user.role, Role::Customer);
    }

    #[test]
    fn test_session_derives_authentication_from_user_presence() {
        let mut session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.role(), Role::Customer);

        session.set_user(Some(user(Role::Staff)));
        assert!(session.is_authenticated());
        assert!(session.is_admin());
        assert_eq!(session.role(), Role::Staff);

        session.clear();
        assert!(!session.is_authenticated());
        assert!(!session.is_admin());
    }
}
