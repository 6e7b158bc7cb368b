//! Installed-application enumeration for pickers.
//!
//! Enumeration itself is an external collaborator ([`PackageSource`]). This
//! module owns the worker contract: enumerate off the caller's task, deliver
//! to exactly one completion callback, and drop results for pickers that were
//! dismissed in the meantime.

pub mod picker;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use appveil_core::error::Result;
use appveil_core::Subject;

pub use picker::{filter_apps, PickerSession};

/// One installed application as shown in a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub package: Subject,
    pub label: String,
    pub is_system: bool,
}

/// Source of installed applications.
#[async_trait]
pub trait PackageSource: Send + Sync {
    async fn installed(&self) -> Result<Vec<AppInfo>>;
}

/// Fixed list, for tooling and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPackageSource {
    apps: Vec<AppInfo>,
}

impl StaticPackageSource {
    pub fn new(apps: Vec<AppInfo>) -> Self {
        Self { apps }
    }
}

#[async_trait]
impl PackageSource for StaticPackageSource {
    async fn installed(&self) -> Result<Vec<AppInfo>> {
        Ok(self.apps.clone())
    }
}

/// Enumerate on a tokio task and hand the result to `on_complete`.
///
/// `self_package` is left out of the list. Results are sorted by label,
/// case-insensitively. There is no cancellation: the callback always runs
/// once the source returns.
pub fn spawn_enumeration<F>(
    source: Arc<dyn PackageSource>,
    self_package: Option<String>,
    on_complete: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(Result<Vec<AppInfo>>) + Send + 'static,
{
    tokio::spawn(async move {
        let res = source.installed().await.map(|mut apps| {
            if let Some(own) = &self_package {
                apps.retain(|a| &a.package != own);
            }
            apps.sort_by_cached_key(|a| a.label.to_lowercase());
            apps
        });

        match &res {
            Ok(apps) => tracing::debug!(count = apps.len(), "installed apps enumerated"),
            Err(e) => tracing::warn!(error = %e, "installed app enumeration failed"),
        }
        on_complete(res);
    })
}

/// Package ids of an enumeration result, for [`crate::policy::PolicyStore::prune_uninstalled`].
pub fn installed_ids(apps: &[AppInfo]) -> BTreeSet<Subject> {
    apps.iter().map(|a| a.package.clone()).collect()
}
