//! Navigation gate for protected views.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::debug;

use crate::manager::AuthSessionManager;
use crate::navigation::{NavSender, NavSignal};

const LOGIN_REQUIRED: &str = "Please log in to continue.";
const CHECK_FAILED: &str = "Authorization check failed.";

/// Result of a navigation check. Never an error: every failure mode
/// resolves to a denial with a display reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Deny { message: String },
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Gates entry to protected views on
/// [`check_auth`](AuthSessionManager::check_auth). Denials emit a
/// [`NavSignal::Login`] carrying the reason.
pub struct RouteGuard {
    manager: AuthSessionManager,
    nav: NavSender,
}

impl RouteGuard {
    pub fn new(manager: AuthSessionManager, nav: NavSender) -> Self {
        Self { manager, nav }
    }

    pub async fn can_activate(&self) -> GuardOutcome {
        let manager = self.manager.clone();
        let checked = AssertUnwindSafe(async move { manager.check_auth().await })
            .catch_unwind()
            .await;
        match checked {
            Ok(true) => GuardOutcome::Allow,
            Ok(false) => self.deny(LOGIN_REQUIRED),
            Err(_) => {
                debug!("auth check panicked; denying navigation");
                self.deny(CHECK_FAILED)
            }
        }
    }

    fn deny(&self, message: &str) -> GuardOutcome {
        self.nav.send(NavSignal::login_with(message));
        GuardOutcome::Deny {
            message: message.to_string(),
        }
    }
}
