//! Role-based access checks.
use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use tracing::warn;

use crate::services::auth::error::SecurityError;
use crate::services::auth::user_info::UserInfo;

/// Maps token roles to application roles.
///
/// An empty mapping is the identity: token roles are used as-is. A non-empty
/// mapping replaces the role set with the union of the mapped targets, so
/// unmapped token roles disappear.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct RoleMapping(HashMap<String, BTreeSet<String>>);

impl RoleMapping {
    pub fn new(mapping: HashMap<String, BTreeSet<String>>) -> Self {
        Self(mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The application roles the user effectively holds.
    pub fn effective_roles(&self, user_info: &UserInfo) -> BTreeSet<String> {
        if self.0.is_empty() {
            return user_info.roles().clone();
        }
        user_info
            .roles()
            .iter()
            .filter_map(|role| self.0.get(role))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Check that the caller holds `required_role`.
///
/// An empty role string only requires authentication. Anonymous callers are
/// always rejected with `Unauthenticated`.
pub fn authorize(
    required_role: &str,
    user_info: &UserInfo,
    role_mapping: &RoleMapping,
) -> Result<(), SecurityError> {
    if user_info.is_anonymous() {
        warn!(role = required_role, "access denied for anonymous caller");
        return Err(SecurityError::Unauthenticated);
    }
    if required_role.is_empty() {
        return Ok(());
    }
    if role_mapping.effective_roles(user_info).contains(required_role) {
        return Ok(());
    }
    warn!(
        user = user_info.login(),
        role = required_role,
        "access denied, required role not held"
    );
    Err(SecurityError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> UserInfo {
        UserInfo::identity("USER-01")
            .unwrap()
            .roles(roles.iter().copied())
            .build()
    }

    fn mapping(pairs: &[(&str, &[&str])]) -> RoleMapping {
        RoleMapping::new(
            pairs
                .iter()
                .map(|(from, to)| {
                    (
                        from.to_string(),
                        to.iter().map(|r| r.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn anonymous_is_unauthenticated() {
        assert!(matches!(
            authorize("reader", UserInfo::anonymous(), &RoleMapping::default()),
            Err(SecurityError::Unauthenticated)
        ));
        // even when no particular role is required
        assert!(matches!(
            authorize("", UserInfo::anonymous(), &RoleMapping::default()),
            Err(SecurityError::Unauthenticated)
        ));
    }

    #[test]
    fn empty_role_requires_only_authentication() {
        assert!(authorize("", &user(&[]), &RoleMapping::default()).is_ok());
    }

    #[test]
    fn held_role_is_granted() {
        assert!(authorize("reader", &user(&["reader", "writer"]), &RoleMapping::default()).is_ok());
    }

    #[test]
    fn missing_role_is_unauthorized() {
        assert!(matches!(
            authorize("admin", &user(&["reader"]), &RoleMapping::default()),
            Err(SecurityError::Unauthorized)
        ));
    }

    #[test]
    fn mapping_translates_token_roles() {
        let mapping = mapping(&[("grp-editors", &["reader", "writer"])]);
        let user = user(&["grp-editors"]);
        assert!(authorize("writer", &user, &mapping).is_ok());
        // raw token role is no longer visible once a mapping exists
        assert!(matches!(
            authorize("grp-editors", &user, &mapping),
            Err(SecurityError::Unauthorized)
        ));
    }

    #[test]
    fn mapping_unions_targets() {
        let mapping = mapping(&[
            ("grp-a", &["reader"]),
            ("grp-b", &["reader", "auditor"]),
        ]);
        let roles = mapping.effective_roles(&user(&["grp-a", "grp-b", "grp-unknown"]));
        let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
        assert_eq!(roles, ["auditor", "reader"]);
    }
}
