//! The editor seam: everything the linter needs from its host.

use std::future::Future;
use std::pin::Pin;

use jsonlint_types::{DocumentUri, LintDiagnostic};

use crate::error::HostError;

pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A titled notification with named actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    id: String,
    title: String,
    body: String,
    actions: Vec<String>,
}

impl NotificationRequest {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        actions: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            actions,
        }
    }

    /// Stable identifier, so hosts can coalesce repeats.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }
}

/// The user's answer to a [`NotificationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationResponse {
    action_index: Option<usize>,
}

impl NotificationResponse {
    /// `None` when the notification was dismissed without picking an action.
    #[must_use]
    pub fn new(action_index: Option<usize>) -> Self {
        Self { action_index }
    }

    #[must_use]
    pub fn action_index(&self) -> Option<usize> {
        self.action_index
    }
}

/// Editor-side capabilities.
///
/// `publish_issues` and `clear_issues` are called with the reporter's lock
/// held and must not call back into the linter.
pub trait EditorHost: Send + Sync + 'static {
    /// Replace the issues shown for `uri` with `issues` (possibly empty).
    fn publish_issues(&self, uri: &DocumentUri, issues: &[LintDiagnostic]);

    /// Forget every issue shown for `uri`.
    fn clear_issues(&self, uri: &DocumentUri);

    /// Show a notification and wait for the user's choice.
    fn show_notification(
        &self,
        request: NotificationRequest,
    ) -> BoxFut<'_, Result<NotificationResponse, HostError>>;

    /// Bring up the configuration UI.
    fn open_config(&self) -> Result<(), HostError>;
}
