// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use davsync_core::{
    ConcurrencyGate, GateKey, RawBodyBuilder, RecordType, SyncConfig, SyncError,
    SyncOrchestrator, SyncState, SyncStatus,
};
use davsync_dav::DavError;
use tokio_util::sync::CancellationToken;

use crate::common::{Call, FakeRemote, MemoryStore, Op, event, vcard};

type Orchestrator = SyncOrchestrator<FakeRemote, MemoryStore, RawBodyBuilder>;

fn orchestrator(remote: &FakeRemote, store: &MemoryStore, record_type: RecordType) -> Orchestrator {
    SyncOrchestrator::new(
        remote.clone(),
        store.clone(),
        RawBodyBuilder::new(record_type),
        record_type,
        GateKey::new("alice", record_type.to_string()),
    )
}

#[tokio::test]
async fn orchestrator_second_run_is_up_to_date() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    let sync = orchestrator(&remote, &store, RecordType::Events);

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(outcome.inserted, 1);
    assert_eq!(store.sync_state(), Some(SyncState::ctag("c1")));

    remote.clear_calls();
    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::UpToDate);
    assert!(outcome.is_success());
    assert_eq!(remote.calls(), vec![Call::Query]);
}

#[tokio::test]
async fn orchestrator_force_pull_lists_unchanged_collection() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    store.set_sync_state(SyncState::ctag("c1"));

    let sync = orchestrator(&remote, &store, RecordType::Events).with_config(SyncConfig {
        force_pull: true,
        ..Default::default()
    });
    let outcome = sync.run().await;

    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(remote.count(Op::ListAll), 1);
    assert_eq!(store.names(), vec!["a.ics".to_string()]);
}

#[tokio::test]
async fn orchestrator_does_not_download_own_upload() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    store.insert_local_named(&event("n"), "n.ics");
    let sync = orchestrator(&remote, &store, RecordType::Events);

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(outcome.pushed_dirty, 1);
    // Queried again after the upload, so the stored version includes it.
    assert_eq!(remote.count(Op::Query), 2);
    assert_eq!(remote.count(Op::FetchBatch), 0);
    assert_eq!(store.sync_state(), Some(SyncState::ctag("c1")));

    remote.clear_calls();
    assert_eq!(sync.run().await.status, SyncStatus::UpToDate);
    assert_eq!(remote.calls(), vec![Call::Query]);
}

#[tokio::test]
async fn orchestrator_selects_incremental_when_supported() {
    let remote = FakeRemote::incremental("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    let sync = orchestrator(&remote, &store, RecordType::Events);

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(remote.count(Op::ListAll), 0);
    assert_eq!(remote.count(Op::ListChanges), 1);
    assert_eq!(store.sync_state(), Some(SyncState::sync_token("v1", false)));

    remote.clear_calls();
    assert_eq!(sync.run().await.status, SyncStatus::UpToDate);
    assert_eq!(remote.calls(), vec![Call::Query]);
}

#[tokio::test]
async fn orchestrator_time_window_forces_full_listing() {
    let remote = FakeRemote::incremental("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    let sync = orchestrator(&remote, &store, RecordType::Events).with_config(SyncConfig {
        time_window_days: Some(30),
        ..Default::default()
    });

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(remote.count(Op::ListChanges), 0);
    assert!(
        remote
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ListAll(Some(_))))
    );
    // A windowed listing never seeds incremental state.
    assert_eq!(
        store.sync_state(),
        Some(SyncState::ctag("c1").with_window(Some(30)))
    );
}

#[tokio::test]
async fn orchestrator_widened_window_lists_again() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    let windowed = |days| {
        orchestrator(&remote, &store, RecordType::Events).with_config(SyncConfig {
            time_window_days: Some(days),
            ..Default::default()
        })
    };

    assert_eq!(windowed(30).run().await.status, SyncStatus::Completed);
    assert_eq!(windowed(30).run().await.status, SyncStatus::UpToDate);

    remote.clear_calls();
    let outcome = windowed(90).run().await;
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(remote.count(Op::ListAll), 1);
    assert_eq!(
        store.sync_state(),
        Some(SyncState::ctag("c1").with_window(Some(90)))
    );

    remote.clear_calls();
    let outcome = orchestrator(&remote, &store, RecordType::Events).run().await;
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert!(remote.calls().contains(&Call::ListAll(None)));
    assert_eq!(store.sync_state(), Some(SyncState::ctag("c1")));
}

#[tokio::test]
async fn orchestrator_time_window_ignored_for_contacts() {
    let remote = FakeRemote::new("/card/");
    let store = MemoryStore::new(RecordType::Contacts);
    remote.insert("a.vcf", &vcard("a"));
    let sync = orchestrator(&remote, &store, RecordType::Contacts).with_config(SyncConfig {
        time_window_days: Some(30),
        ..Default::default()
    });

    sync.run().await;
    assert!(remote.calls().contains(&Call::ListAll(None)));
}

#[tokio::test]
async fn orchestrator_held_key_is_busy() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    let gate = Arc::new(ConcurrencyGate::new());
    let sync = orchestrator(&remote, &store, RecordType::Events).with_gate(gate.clone());

    let guard = gate.try_acquire(GateKey::new("alice", "events")).unwrap();
    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Busy);
    assert!(remote.calls().is_empty());

    drop(guard);
    assert_eq!(sync.run().await.status, SyncStatus::Completed);
}

#[tokio::test]
async fn orchestrator_cancelled_before_start_makes_no_requests() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sync = orchestrator(&remote, &store, RecordType::Events).with_cancellation(cancel);

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Failed);
    assert!(matches!(outcome.error, Some(SyncError::Cancelled)));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn orchestrator_cancelled_mid_download_keeps_old_state() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    for i in 0..25 {
        remote.insert(&format!("{i:02}.ics"), &event(&i.to_string()));
    }
    let cancel = CancellationToken::new();
    remote.cancel_on(Op::FetchBatch, cancel.clone());
    let sync = orchestrator(&remote, &store, RecordType::Events)
        .with_config(SyncConfig {
            max_parallelism: 1,
            ..Default::default()
        })
        .with_cancellation(cancel);

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Failed);
    assert!(matches!(outcome.error, Some(SyncError::Cancelled)));
    assert_eq!(remote.count(Op::FetchBatch), 1);
    assert_eq!(store.sync_state(), None);
}

#[tokio::test]
async fn orchestrator_auth_failure_is_reported() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.fail_next(Op::Query, DavError::Auth("401 Unauthorized".to_string()));

    let outcome = orchestrator(&remote, &store, RecordType::Events).run().await;
    assert_eq!(outcome.status, SyncStatus::Failed);
    assert!(outcome.error.as_ref().is_some_and(SyncError::is_auth));
}

#[tokio::test]
async fn orchestrator_unavailable_server_is_transient() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.fail_next(
        Op::Query,
        DavError::ServiceUnavailable {
            retry_after: Some(Duration::from_secs(60)),
        },
    );

    let outcome = orchestrator(&remote, &store, RecordType::Events).run().await;
    assert!(matches!(
        outcome.error,
        Some(SyncError::Transient {
            retry_after: Some(d),
            ..
        }) if d == Duration::from_secs(60)
    ));
}

#[tokio::test]
async fn orchestrator_rejected_token_restarts_listing() {
    let remote = FakeRemote::incremental("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    remote.insert("b.ics", &event("b"));
    store.set_sync_state(SyncState::sync_token("v1", false));
    remote.invalidate_tokens();

    let outcome = orchestrator(&remote, &store, RecordType::Events).run().await;
    assert_eq!(outcome.status, SyncStatus::Completed, "{:?}", outcome.error);
    assert!(remote.calls().contains(&Call::ListChanges(None)));
    assert_eq!(store.names(), remote.names());
    assert_eq!(store.sync_state(), Some(SyncState::sync_token("v2", false)));
}

#[tokio::test]
async fn orchestrator_post_processes_contacts_only() {
    let remote = FakeRemote::new("/card/");
    let store = MemoryStore::new(RecordType::Contacts);
    remote.insert("a.vcf", &vcard("a"));
    orchestrator(&remote, &store, RecordType::Contacts).run().await;
    assert_eq!(store.post_processed(), vec![RecordType::Contacts]);

    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    orchestrator(&remote, &store, RecordType::Events).run().await;
    assert!(store.post_processed().is_empty());
}

fn forbidden(url: &str) -> DavError {
    DavError::Forbidden {
        url: url.to_string(),
        need_privileges: true,
    }
}

#[tokio::test]
async fn orchestrator_refetches_refused_upload() {
    let remote = FakeRemote::new("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    let sync = orchestrator(&remote, &store, RecordType::Events);
    assert_eq!(sync.run().await.status, SyncStatus::Completed);

    let id = store.by_name("a.ics").unwrap().id;
    store.modify(id, &event("a-local"));
    remote.fail_next(Op::Put, forbidden("/cal/a.ics"));
    remote.clear_calls();

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Completed, "{:?}", outcome.error);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.updated, 1);
    assert_eq!(remote.fetch_batches(), vec![vec!["a.ics".to_string()]]);
    assert_eq!(store.data("a.ics"), remote.data("a.ics"));
    assert_eq!(store.record(id).unwrap().etag, remote.etag("a.ics"));

    remote.clear_calls();
    assert_eq!(sync.run().await.status, SyncStatus::UpToDate);
    assert_eq!(remote.calls(), vec![Call::Query]);
}

#[tokio::test]
async fn orchestrator_refused_upload_relists_incremental_collection() {
    let remote = FakeRemote::incremental("/cal/");
    let store = MemoryStore::new(RecordType::Events);
    remote.insert("a.ics", &event("a"));
    let sync = orchestrator(&remote, &store, RecordType::Events);
    sync.run().await;
    assert_eq!(store.sync_state(), Some(SyncState::sync_token("v1", false)));

    let id = store.by_name("a.ics").unwrap().id;
    store.modify(id, &event("a-local"));
    remote.fail_next(Op::Put, forbidden("/cal/a.ics"));
    remote.clear_calls();

    let outcome = sync.run().await;
    assert_eq!(outcome.status, SyncStatus::Completed, "{:?}", outcome.error);
    // The change list since v1 is empty, only a fresh listing reports a.ics.
    assert!(remote.calls().contains(&Call::ListChanges(None)));
    assert_eq!(store.data("a.ics"), remote.data("a.ics"));
    assert_eq!(store.sync_state(), Some(SyncState::sync_token("v1", false)));
}
