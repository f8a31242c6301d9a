//! Best-effort desktop notifications.
//!
//! The gateway asks the platform for permission once per session start and
//! then fires notifications at phase boundaries. Both calls are detached:
//! inside a tokio runtime they run on the blocking pool, outside one they
//! run inline. Failures are logged at debug level and otherwise ignored. A
//! notifier that reports the service gone turns the gateway into a no-op for
//! the rest of the session.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not requested yet.
    Default,
    Granted,
    Denied,
    /// No notification service on this host.
    Unavailable,
}

impl Permission {
    fn to_u8(self) -> u8 {
        match self {
            Permission::Default => 0,
            Permission::Granted => 1,
            Permission::Denied => 2,
            Permission::Unavailable => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Permission::Granted,
            2 => Permission::Denied,
            3 => Permission::Unavailable,
            _ => Permission::Default,
        }
    }
}

/// Platform notification backend.
pub trait Notifier: Send + Sync {
    fn request_permission(&self) -> Permission;
    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier backed by the desktop notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn request_permission(&self) -> Permission {
        if server_available() {
            Permission::Granted
        } else {
            Permission::Unavailable
        }
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if !server_available() {
            return Err(NotifyError::Unavailable);
        }
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }
}

// The XDG service is the only backend that can be queried up front.
#[cfg(all(unix, not(target_os = "macos")))]
fn server_available() -> bool {
    match notify_rust::get_server_information() {
        Ok(info) => {
            debug!(server = %info.name, "notification server found");
            true
        }
        Err(e) => {
            debug!(error = %e, "no notification server");
            false
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn server_available() -> bool {
    true
}

pub struct NotificationGateway {
    notifier: Arc<dyn Notifier>,
    title: String,
    permission: Arc<AtomicU8>,
}

impl NotificationGateway {
    pub fn new(notifier: Arc<dyn Notifier>, title: impl Into<String>) -> Self {
        Self {
            notifier,
            title: title.into(),
            permission: Arc::new(AtomicU8::new(Permission::Default.to_u8())),
        }
    }

    pub fn desktop(title: impl Into<String>) -> Self {
        Self::new(Arc::new(DesktopNotifier), title)
    }

    pub fn permission(&self) -> Permission {
        Permission::from_u8(self.permission.load(Ordering::Acquire))
    }

    /// Ask for permission if the user opted in. The answer lands later;
    /// until it does, notifications are skipped.
    pub fn request_permission(&self, opted_in: bool) {
        if !opted_in {
            return;
        }
        let notifier = Arc::clone(&self.notifier);
        let permission = Arc::clone(&self.permission);
        dispatch(move || {
            let answer = notifier.request_permission();
            debug!(?answer, "notification permission");
            permission.store(answer.to_u8(), Ordering::Release);
        });
    }

    /// Show `body` if permission was granted. Never fails.
    pub fn notify(&self, body: &str) {
        let permission = self.permission();
        if permission != Permission::Granted {
            debug!(?permission, "notification skipped");
            return;
        }
        let notifier = Arc::clone(&self.notifier);
        let permission = Arc::clone(&self.permission);
        let title = self.title.clone();
        let body = body.to_string();
        dispatch(move || match notifier.show(&title, &body) {
            Ok(()) => {}
            Err(NotifyError::Unavailable) => {
                debug!("notification service went away");
                permission.store(Permission::Unavailable.to_u8(), Ordering::Release);
            }
            Err(e) => debug!(error = %e, "notification failed"),
        });
    }
}

fn dispatch<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => job(),
    }
}
