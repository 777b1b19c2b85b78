//! User identity value object.
//!
//! A `UserInfo` carries the `login` (mandatory) plus optional `tenant`,
//! `roles` and `additionalClaims` of an anonymous or authenticated caller.
//! Instances are immutable; they are created once per authentication attempt
//! (or signing request) and discarded at the end of the request.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distinguished login of the anonymous user.
pub const ANONYMOUS_LOGIN: &str = "anonymous";

static ANONYMOUS: OnceLock<UserInfo> = OnceLock::new();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("login is required")]
    LoginRequired,
    #[error("login must not have leading/trailing whitespace")]
    LoginNotTrimmed,
}

/// Identity of the current caller.
///
/// Equality and hashing are deliberately restricted to `(login, tenant)`:
/// two `UserInfo` describe the same principal even when their roles or
/// claims differ (e.g. a token refreshed with a different device-id claim).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    roles: BTreeSet<String>,
    #[serde(
        rename = "additionalClaims",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    additional_claims: BTreeMap<String, String>,
}

impl UserInfo {
    /// The shared anonymous user (no tenant, no roles, no claims).
    pub fn anonymous() -> &'static UserInfo {
        ANONYMOUS.get_or_init(|| UserInfo {
            login: ANONYMOUS_LOGIN.to_string(),
            tenant: None,
            roles: BTreeSet::new(),
            additional_claims: BTreeMap::new(),
        })
    }

    /// Start building an identity for the given login.
    ///
    /// The login is validated eagerly: it must be non-empty and must not
    /// carry leading/trailing whitespace.
    pub fn identity(login: impl Into<String>) -> Result<UserInfoBuilder, IdentityError> {
        let login = login.into();
        if login.trim().is_empty() {
            return Err(IdentityError::LoginRequired);
        }
        if login.len() != login.trim().len() {
            return Err(IdentityError::LoginNotTrimmed);
        }
        Ok(UserInfoBuilder {
            inner: UserInfo {
                login,
                tenant: None,
                roles: BTreeSet::new(),
                additional_claims: BTreeMap::new(),
            },
        })
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn additional_claims(&self) -> &BTreeMap<String, String> {
        &self.additional_claims
    }

    pub fn is_anonymous(&self) -> bool {
        self == Self::anonymous()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.is_anonymous()
    }
}

// Identity of a principal is (login, tenant); roles and claims are excluded.
impl PartialEq for UserInfo {
    fn eq(&self, other: &Self) -> bool {
        self.login == other.login && self.tenant == other.tenant
    }
}

impl Eq for UserInfo {}

impl Hash for UserInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.login.hash(state);
        self.tenant.hash(state);
    }
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserInfo{{login={}", self.login)?;
        if let Some(tenant) = &self.tenant {
            write!(f, ", tenant={tenant}")?;
        }
        if !self.roles.is_empty() {
            let roles: Vec<&str> = self.roles.iter().map(String::as_str).collect();
            write!(f, ", roles={}", roles.join("/"))?;
        }
        write!(f, "}}")
    }
}

/// Builder for `UserInfo`.
///
/// `build()` consumes the builder, so a built identity can never be mutated
/// afterwards (the borrow checker enforces the single-use contract).
#[derive(Debug)]
pub struct UserInfoBuilder {
    inner: UserInfo,
}

impl UserInfoBuilder {
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        let tenant = tenant.into();
        self.inner.tenant = (!tenant.trim().is_empty()).then_some(tenant);
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.inner.roles.insert(role.into());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.additional_claims.insert(key.into(), value.into());
        self
    }

    pub fn claims<I, K, V>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner
            .additional_claims
            .extend(claims.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> UserInfo {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_identity_with_login() {
        let user_info = UserInfo::identity("USER-01").unwrap().build();
        assert_eq!(user_info.login(), "USER-01");
        assert_eq!(user_info.tenant(), None);
        assert!(user_info.roles().is_empty());
        assert!(user_info.additional_claims().is_empty());
        assert!(user_info.is_authenticated());
    }

    #[test]
    fn rejects_missing_or_blank_login() {
        assert_eq!(UserInfo::identity("").unwrap_err(), IdentityError::LoginRequired);
        assert_eq!(UserInfo::identity("   ").unwrap_err(), IdentityError::LoginRequired);
    }

    #[test]
    fn rejects_untrimmed_login() {
        assert_eq!(
            UserInfo::identity(" user").unwrap_err(),
            IdentityError::LoginNotTrimmed
        );
        assert_eq!(
            UserInfo::identity("user ").unwrap_err(),
            IdentityError::LoginNotTrimmed
        );
    }

    #[test]
    fn anonymous_is_not_authenticated() {
        assert!(UserInfo::anonymous().is_anonymous());
        assert!(!UserInfo::anonymous().is_authenticated());
        // an identity that happens to use the anonymous login is the same principal
        let lookalike = UserInfo::identity(ANONYMOUS_LOGIN).unwrap().build();
        assert!(lookalike.is_anonymous());
    }

    #[test]
    fn equality_ignores_roles_and_claims() {
        let a = UserInfo::identity("U").unwrap().tenant("T").build();
        let b = UserInfo::identity("U")
            .unwrap()
            .tenant("T")
            .role("x")
            .claim("device", "d-1")
            .build();
        assert_eq!(a, b);

        let c = UserInfo::identity("U").unwrap().tenant("A").build();
        let d = UserInfo::identity("U").unwrap().tenant("B").build();
        assert_ne!(c, d);
        assert_ne!(a, *UserInfo::anonymous());
    }

    #[test]
    fn roles_are_deduplicated_and_sorted() {
        let user_info = UserInfo::identity("U")
            .unwrap()
            .roles(["b", "a", "b"])
            .role("a")
            .build();
        let roles: Vec<&str> = user_info.roles().iter().map(String::as_str).collect();
        assert_eq!(roles, ["a", "b"]);
    }

    #[test]
    fn serializes_omitting_absent_fields() {
        let anonymous = serde_json::to_value(UserInfo::anonymous()).unwrap();
        assert_eq!(anonymous, serde_json::json!({"login": "anonymous"}));

        let user_info = UserInfo::identity("USER-01")
            .unwrap()
            .tenant("test-tenant")
            .roles(["author", "publisher"])
            .claim("login-channel", "mobile")
            .build();
        let json = serde_json::to_value(&user_info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "login": "USER-01",
                "tenant": "test-tenant",
                "roles": ["author", "publisher"],
                "additionalClaims": {"login-channel": "mobile"}
            })
        );

        let roundtrip: UserInfo = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip.login(), user_info.login());
        assert_eq!(roundtrip.tenant(), user_info.tenant());
        assert_eq!(roundtrip.roles(), user_info.roles());
        assert_eq!(roundtrip.additional_claims(), user_info.additional_claims());
    }

    #[test]
    fn deserializes_absent_fields_as_empty() {
        let user_info: UserInfo = serde_json::from_str(r#"{"login":"USER-01"}"#).unwrap();
        assert_eq!(user_info.login(), "USER-01");
        assert_eq!(user_info.tenant(), None);
        assert!(user_info.roles().is_empty());
        assert!(user_info.additional_claims().is_empty());
    }

    #[test]
    fn display_lists_login_tenant_and_roles() {
        let user_info = UserInfo::identity("USER-01")
            .unwrap()
            .tenant("test-tenant")
            .roles(["author", "publisher"])
            .build();
        assert_eq!(
            user_info.to_string(),
            "UserInfo{login=USER-01, tenant=test-tenant, roles=author/publisher}"
        );
    }
}
