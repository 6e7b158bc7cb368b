use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use appveil_core::error::Result;

use super::{spawn_enumeration, AppInfo, PackageSource};

/// One open picker. Dismissing it does not stop enumeration; results that
/// arrive afterwards are discarded.
#[derive(Debug, Clone)]
pub struct PickerSession {
    dismissed: Arc<AtomicBool>,
}

impl PickerSession {
    /// Start enumerating for a new picker. `on_ready` runs at most once, and
    /// only if the picker is still open when results arrive.
    pub fn open<F>(
        source: Arc<dyn PackageSource>,
        self_package: Option<String>,
        on_ready: F,
    ) -> (Self, tokio::task::JoinHandle<()>)
    where
        F: FnOnce(Result<Vec<AppInfo>>) + Send + 'static,
    {
        let dismissed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dismissed);

        let handle = spawn_enumeration(source, self_package, move |res| {
            if flag.load(Ordering::Acquire) {
                tracing::debug!("picker dismissed, discarding enumeration result");
                return;
            }
            on_ready(res);
        });

        (Self { dismissed }, handle)
    }

    pub fn dismiss(&self) {
        self.dismissed.store(true, Ordering::Release);
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::Acquire)
    }
}

/// Case-insensitive substring match on label or package id.
pub fn filter_apps(apps: &[AppInfo], query: &str) -> Vec<AppInfo> {
    let q = query.to_lowercase();
    apps.iter()
        .filter(|a| a.label.to_lowercase().contains(&q) || a.package.to_lowercase().contains(&q))
        .cloned()
        .collect()
}
