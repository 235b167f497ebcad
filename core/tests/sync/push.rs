// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davsync_core::{FullListingSync, LocalChangePusher, SyncError};
use davsync_dav::{DavError, ETag, Precondition};

use crate::common::{FakeRemote, Harness, Op, event};

#[tokio::test]
async fn push_without_records_makes_no_requests() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let ctx = h.context();
    let pusher = LocalChangePusher::new(&ctx);

    assert_eq!(pusher.push_deleted().await.unwrap(), 0);
    assert_eq!(pusher.push_dirty().await.unwrap(), 0);
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn push_new_record_uploads_with_if_none_match() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let id = h.store.insert_local_named(&event("b"), "B.ics");

    let ctx = h.context();
    let pushed = LocalChangePusher::new(&ctx).push_dirty().await.unwrap();
    assert_eq!(pushed, 1);

    assert_eq!(
        h.remote.puts(),
        vec![("B.ics".to_string(), Precondition::IfNoneMatchAny)]
    );
    let etag = h.remote.etag("B.ics").unwrap();
    assert_eq!(h.store.cleared(), vec![(id, (Some(etag.clone()), None))]);

    let record = h.store.record(id).unwrap();
    assert!(!record.dirty);
    assert_eq!(record.remote_name.as_deref(), Some("B.ics"));
    assert_eq!(record.etag, Some(etag));
    assert_eq!(h.remote.data("B.ics"), Some(event("b")));
    assert_eq!(ctx.counters().pushed_dirty(), 1);
}

#[tokio::test]
async fn push_update_conditions_on_etag_or_schedule_tag() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let e1 = h.remote.insert("a.ics", &event("a"));
    let e2 = h.remote.insert_scheduled("s.ics", &event("s"), "\"s1\"");
    let a = h.store.insert_synced("a.ics", &e1, &event("a"));
    let s = h.store.insert_synced("s.ics", &e2, &event("s"));
    h.store.set_schedule_tag(s, "\"s1\"");
    h.store.modify(a, &event("a2"));
    h.store.modify(s, &event("s2"));

    let ctx = h.context();
    assert_eq!(LocalChangePusher::new(&ctx).push_dirty().await.unwrap(), 2);

    let mut puts = h.remote.puts();
    puts.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(
        puts,
        vec![
            ("a.ics".to_string(), Precondition::IfMatch(e1)),
            (
                "s.ics".to_string(),
                Precondition::IfScheduleTagMatch(ETag::from("\"s1\""))
            ),
        ]
    );
    assert_eq!(h.remote.data("a.ics"), Some(event("a2")));
    assert_eq!(
        h.store.record(s).unwrap().schedule_tag,
        Some(ETag::from("\"s1\""))
    );
}

#[tokio::test]
async fn push_conflict_clears_dirty_and_refetches_later() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let e1 = h.remote.insert("a.ics", &event("a"));
    let id = h.store.insert_synced("a.ics", &e1, &event("a"));
    // Another client changed it meanwhile.
    h.remote.insert("a.ics", &event("a-theirs"));
    h.store.modify(id, &event("a-mine"));

    let ctx = h.context();
    assert_eq!(LocalChangePusher::new(&ctx).push_dirty().await.unwrap(), 1);

    let record = h.store.record(id).unwrap();
    assert!(!record.dirty);
    assert_eq!(record.etag, None);
    assert_eq!(h.remote.data("a.ics"), Some(event("a-theirs")));
    assert_eq!(ctx.counters().skipped(), 1);

    FullListingSync::new(&ctx, None).pull().await.unwrap();
    assert_eq!(h.remote.fetch_batches(), vec![vec!["a.ics".to_string()]]);
    assert_eq!(h.store.data("a.ics"), Some(event("a-theirs")));
    assert_eq!(h.store.record(id).unwrap().etag, h.remote.etag("a.ics"));
}

#[tokio::test]
async fn push_missing_etag_after_upload_is_stored_as_unknown() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    h.remote.set_omit_put_etag(true);
    let id = h.store.insert_local_named(&event("b"), "b.ics");

    let ctx = h.context();
    LocalChangePusher::new(&ctx).push_dirty().await.unwrap();

    let record = h.store.record(id).unwrap();
    assert!(!record.dirty);
    assert_eq!(record.etag, None);
    assert_eq!(h.store.cleared(), vec![(id, (None, None))]);
}

#[tokio::test]
async fn push_forbidden_without_privileges_is_absorbed() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let e1 = h.remote.insert("a.ics", &event("a"));
    let id = h.store.insert_synced("a.ics", &e1, &event("a"));
    h.store.modify(id, &event("a2"));
    h.remote.fail_next(
        Op::Put,
        DavError::Forbidden {
            url: "/cal/a.ics".to_string(),
            need_privileges: true,
        },
    );

    let ctx = h.context();
    LocalChangePusher::new(&ctx).push_dirty().await.unwrap();

    let record = h.store.record(id).unwrap();
    assert!(!record.dirty);
    assert_eq!(record.etag, None);
}

#[tokio::test]
async fn push_update_of_vanished_resource_uploads_as_new() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let id = h
        .store
        .insert_synced("gone.ics", &ETag::from("\"e1\""), &event("g"));
    h.store.modify(id, &event("g2"));
    h.remote
        .fail_next(Op::Put, DavError::NotFound("/cal/gone.ics".to_string()));

    let ctx = h.context();
    LocalChangePusher::new(&ctx).push_dirty().await.unwrap();

    assert_eq!(
        h.remote.puts(),
        vec![
            (
                "gone.ics".to_string(),
                Precondition::IfMatch(ETag::from("\"e1\""))
            ),
            ("gone.ics".to_string(), Precondition::IfNoneMatchAny),
        ]
    );
    assert_eq!(h.store.record(id).unwrap().etag, h.remote.etag("gone.ics"));
    assert_eq!(h.remote.data("gone.ics"), Some(event("g2")));
}

#[tokio::test]
async fn push_auth_failure_aborts_and_keeps_dirty() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let id = h.store.insert_local(&event("n"));
    h.remote
        .fail_next(Op::Put, DavError::Auth("401 Unauthorized".to_string()));

    let ctx = h.context();
    let err = LocalChangePusher::new(&ctx).push_dirty().await.unwrap_err();

    assert!(err.is_auth(), "{err}");
    assert_eq!(err.context().and_then(|c| c.record), Some(id));
    assert!(h.store.record(id).unwrap().dirty);
}

#[tokio::test]
async fn push_deleted_sends_conditional_delete_and_purges() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let e1 = h.remote.insert("a.ics", &event("a"));
    let id = h.store.insert_synced("a.ics", &e1, &event("a"));
    h.store.tombstone(id);

    let ctx = h.context();
    assert_eq!(LocalChangePusher::new(&ctx).push_deleted().await.unwrap(), 1);

    assert_eq!(
        h.remote.calls(),
        vec![crate::common::Call::Delete(
            "a.ics".to_string(),
            Precondition::IfMatch(e1)
        )]
    );
    assert!(h.remote.names().is_empty());
    assert_eq!(h.store.len(), 0);
    assert_eq!(ctx.counters().pushed_deleted(), 1);
}

#[tokio::test]
async fn push_deleted_never_uploaded_record_needs_no_request() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let id = h.store.insert_local(&event("n"));
    h.store.tombstone(id);

    let ctx = h.context();
    assert_eq!(LocalChangePusher::new(&ctx).push_deleted().await.unwrap(), 1);
    assert!(h.remote.calls().is_empty());
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn push_deleted_ignores_missing_and_conflicting_resources() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let e1 = h.remote.insert("changed.ics", &event("c"));
    h.remote.insert("changed.ics", &event("c2"));
    let gone = h
        .store
        .insert_synced("gone.ics", &ETag::from("\"e0\""), &event("g"));
    let changed = h.store.insert_synced("changed.ics", &e1, &event("c"));
    h.store.tombstone(gone);
    h.store.tombstone(changed);

    let ctx = h.context();
    assert_eq!(LocalChangePusher::new(&ctx).push_deleted().await.unwrap(), 2);
    assert_eq!(h.store.len(), 0);
    // The delete lost against a newer version; the server copy stays.
    assert!(h.remote.data("changed.ics").is_some());
}

#[tokio::test]
async fn push_deleted_transient_failure_keeps_tombstone() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let e1 = h.remote.insert("a.ics", &event("a"));
    let id = h.store.insert_synced("a.ics", &e1, &event("a"));
    h.store.tombstone(id);
    h.remote
        .fail_next(Op::Delete, DavError::Server { status: 502 });

    let ctx = h.context();
    let err = LocalChangePusher::new(&ctx).push_deleted().await.unwrap_err();

    assert!(matches!(err, SyncError::Transient { .. }), "{err}");
    assert!(h.store.record(id).unwrap().deleted);
}
