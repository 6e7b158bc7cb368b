#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use appveil_bridge::app_state::AppState;
use appveil_bridge::catalog::{
    installed_ids, spawn_enumeration, AppInfo, PackageSource, PickerSession, StaticPackageSource,
};
use appveil_bridge::config;
use appveil_core::Result;

fn app(package: &str, label: &str) -> AppInfo {
    AppInfo {
        package: package.into(),
        label: label.into(),
        is_system: false,
    }
}

#[tokio::test]
async fn enumeration_skips_self_and_sorts_by_label() {
    let source = Arc::new(StaticPackageSource::new(vec![
        app("com.z", "zebra"),
        app("org.appveil", "AppVeil"),
        app("com.a", "Alpha"),
        app("com.m", "mango"),
    ]));

    let (tx, rx) = oneshot::channel();
    spawn_enumeration(source, Some("org.appveil".into()), move |res| {
        let _ = tx.send(res);
    })
    .await
    .unwrap();

    let apps = rx.await.unwrap().unwrap();
    let labels: Vec<_> = apps.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec!["Alpha", "mango", "zebra"]);
    assert!(!installed_ids(&apps).contains("org.appveil"));
}

/// Source that blocks until released, to dismiss a picker mid-enumeration.
struct GatedSource {
    gate: Arc<Notify>,
}

#[async_trait]
impl PackageSource for GatedSource {
    async fn installed(&self) -> Result<Vec<AppInfo>> {
        self.gate.notified().await;
        Ok(vec![app("com.a", "A")])
    }
}

#[tokio::test]
async fn dismissed_picker_discards_results() {
    let gate = Arc::new(Notify::new());
    let source = Arc::new(GatedSource { gate: Arc::clone(&gate) });

    let (tx, mut rx) = oneshot::channel::<()>();
    let (session, handle) = PickerSession::open(source, None, move |_| {
        let _ = tx.send(());
    });

    session.dismiss();
    gate.notify_one();
    handle.await.unwrap();

    assert!(session.is_dismissed());
    // callback dropped without firing
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn open_picker_receives_results() {
    let source = Arc::new(StaticPackageSource::new(vec![app("com.a", "A")]));
    let (tx, rx) = oneshot::channel();
    let (_session, handle) = PickerSession::open(source, None, move |res| {
        let _ = tx.send(res);
    });
    handle.await.unwrap();
    assert_eq!(rx.await.unwrap().unwrap().len(), 1);
}

#[tokio::test]
async fn app_state_picker_skips_configured_self_package() {
    let local = tempfile::tempdir().unwrap();
    let yaml = format!(
        "version: 1\nself_package: \"org.appveil\"\nstorage:\n  local_dir: {:?}\n",
        local.path()
    );
    let state = AppState::new(config::load_from_str(&yaml).unwrap()).unwrap();

    let source = Arc::new(StaticPackageSource::new(vec![
        app("org.appveil", "AppVeil"),
        app("com.a", "A"),
    ]));
    let (tx, rx) = oneshot::channel();
    let (_session, handle) = state.open_picker(source, move |res| {
        let _ = tx.send(res);
    });
    handle.await.unwrap();

    let ids = installed_ids(&rx.await.unwrap().unwrap());
    assert!(ids.contains("com.a"));
    assert!(!ids.contains("org.appveil"));
}
