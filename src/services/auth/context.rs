//! Request-scoped identity storage.
//!
//! The middleware opens one scope per request; everything running inside the
//! request's task tree (including `spawn`-free awaits) sees the same
//! identity. Tasks outside a scope observe "inactive" and resolve to the
//! anonymous user via `try_current`.
use std::cell::RefCell;
use std::future::Future;

use tracing::Span;

use crate::services::auth::user_info::UserInfo;

tokio::task_local! {
    static CURRENT_IDENTITY: RefCell<Option<UserInfo>>;
}

pub struct SecurityContext;

impl SecurityContext {
    /// Whether the current task runs inside an identity scope.
    pub fn is_active() -> bool {
        CURRENT_IDENTITY.try_with(|_| ()).is_ok()
    }

    /// Run `fut` inside a fresh identity scope.
    ///
    /// Panics when called from inside an existing scope; nesting is only
    /// allowed through `run_as`, which restores the outer identity.
    pub async fn scope<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        assert!(
            !Self::is_active(),
            "identity scope is already active on this task"
        );
        CURRENT_IDENTITY.scope(RefCell::new(None), fut).await
    }

    /// Synchronous counterpart of [`scope`](Self::scope), for tests and
    /// non-async entry points.
    pub fn sync_scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        assert!(
            !Self::is_active(),
            "identity scope is already active on this task"
        );
        CURRENT_IDENTITY.sync_scope(RefCell::new(None), f)
    }

    /// Bind the identity for the remainder of the current scope and tag the
    /// current tracing span with the user and tenant.
    ///
    /// Panics when no scope is active.
    pub fn set(user_info: UserInfo) {
        let span = Span::current();
        span.record("user", user_info.login());
        if let Some(tenant) = user_info.tenant() {
            span.record("tenant", tenant);
        }
        CURRENT_IDENTITY.with(|cell| *cell.borrow_mut() = Some(user_info));
    }

    /// Drop the bound identity; `try_current` falls back to anonymous.
    ///
    /// Span fields cannot be unset, so the `user`/`tenant` tags are blanked
    /// instead to stop correlating later log lines with the cleared identity.
    pub fn clear() {
        let span = Span::current();
        span.record("user", "");
        span.record("tenant", "");
        CURRENT_IDENTITY.with(|cell| *cell.borrow_mut() = None);
    }

    /// The identity bound to the current scope.
    ///
    /// Panics when no scope is active; use [`try_current`](Self::try_current)
    /// in code that may run outside a request.
    pub fn current() -> UserInfo {
        CURRENT_IDENTITY.with(|cell| {
            cell.borrow()
                .clone()
                .unwrap_or_else(|| UserInfo::anonymous().clone())
        })
    }

    /// The identity bound to the current scope, or anonymous when no scope
    /// is active or no identity was set.
    pub fn try_current() -> Option<UserInfo> {
        CURRENT_IDENTITY
            .try_with(|cell| {
                cell.borrow()
                    .clone()
                    .unwrap_or_else(|| UserInfo::anonymous().clone())
            })
            .ok()
    }

    /// Run `fut` as `user_info`, restoring the previous identity afterwards.
    ///
    /// The impersonated identity lives in a nested scope, so the restore is
    /// automatic even when `fut` panics.
    pub async fn run_as<F>(user_info: UserInfo, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_IDENTITY
            .scope(RefCell::new(Some(user_info)), fut)
            .await
    }

    /// Synchronous counterpart of [`run_as`](Self::run_as).
    pub fn sync_run_as<F, R>(user_info: UserInfo, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_IDENTITY.sync_scope(RefCell::new(Some(user_info)), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(login: &str) -> UserInfo {
        UserInfo::identity(login).unwrap().tenant("test-tenant").build()
    }

    #[tokio::test]
    async fn identity_is_visible_within_scope() {
        use tracing::{Instrument, field, info_span};

        // run under a span carrying the fields set()/clear() record
        let span = info_span!("auth", user = field::Empty, tenant = field::Empty);
        SecurityContext::scope(async {
            assert!(SecurityContext::is_active());
            assert!(SecurityContext::current().is_anonymous());

            SecurityContext::set(user("USER-01"));
            assert_eq!(SecurityContext::current().login(), "USER-01");

            SecurityContext::clear();
            assert!(SecurityContext::current().is_anonymous());
        })
        .instrument(span)
        .await;
    }

    #[tokio::test]
    async fn outside_scope_resolves_to_anonymous() {
        assert!(!SecurityContext::is_active());
        assert_eq!(SecurityContext::try_current(), None);
    }

    #[tokio::test]
    async fn scopes_are_isolated_across_tasks() {
        let a = tokio::spawn(SecurityContext::scope(async {
            SecurityContext::set(user("USER-A"));
            tokio::task::yield_now().await;
            SecurityContext::current().login().to_string()
        }));
        let b = tokio::spawn(SecurityContext::scope(async {
            SecurityContext::set(user("USER-B"));
            tokio::task::yield_now().await;
            SecurityContext::current().login().to_string()
        }));
        assert_eq!(a.await.unwrap(), "USER-A");
        assert_eq!(b.await.unwrap(), "USER-B");
    }

    #[tokio::test]
    async fn run_as_restores_previous_identity() {
        SecurityContext::scope(async {
            SecurityContext::set(user("USER-01"));

            let impersonated = SecurityContext::run_as(user("USER-02"), async {
                SecurityContext::current().login().to_string()
            })
            .await;
            assert_eq!(impersonated, "USER-02");
            assert_eq!(SecurityContext::current().login(), "USER-01");
        })
        .await;
    }

    #[tokio::test]
    async fn run_as_nests() {
        SecurityContext::scope(async {
            SecurityContext::run_as(user("OUTER"), async {
                SecurityContext::run_as(user("INNER"), async {
                    assert_eq!(SecurityContext::current().login(), "INNER");
                })
                .await;
                assert_eq!(SecurityContext::current().login(), "OUTER");
            })
            .await;
            assert!(SecurityContext::current().is_anonymous());
        })
        .await;
    }

    #[test]
    fn sync_scope_and_run_as() {
        SecurityContext::sync_scope(|| {
            SecurityContext::set(user("USER-01"));
            let login = SecurityContext::sync_run_as(user("USER-02"), || {
                SecurityContext::current().login().to_string()
            });
            assert_eq!(login, "USER-02");
            assert_eq!(SecurityContext::current().login(), "USER-01");
        });
    }

    #[tokio::test]
    #[should_panic(expected = "identity scope is already active")]
    async fn nested_scope_panics() {
        SecurityContext::scope(async {
            SecurityContext::scope(async {}).await;
        })
        .await;
    }
}
