//! User role classification.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated user.
///
/// The remote API delivers roles as the lowercase strings `user`, `staff`,
/// and `admin`. Unknown values deserialize as [`Role::Customer`] so that new
/// backend roles degrade to the least-privileged behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    /// Regular shopper account (wire value `user`).
    #[default]
    #[serde(rename = "user")]
    Customer,
    /// Store staff with access to the admin surface.
    Staff,
    /// Full administrator.
    Admin,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Self::Admin,
            "staff" => Self::Staff,
            _ => Self::Customer,
        }
    }
}

impl Role {
    /// Whether this role grants access to the admin surface.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_values() {
        assert_eq!(serde_json::from_str::<Role>("\"user\"").expect("parse"), Role::Customer);
        assert_eq!(serde_json::from_str::<Role>("\"staff\"").expect("parse"), Role::Staff);
        assert_eq!(serde_json::from_str::<Role>("\"admin\"").expect("parse"), Role::Admin);
    }

    #[test]
    fn test_unknown_role_degrades_to_customer() {
        let role: Role = serde_json::from_str("\"superuser\"").expect("parse");
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn test_is_staff() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Staff.is_staff());
        assert!(!Role::Customer.is_staff());
    }
}
