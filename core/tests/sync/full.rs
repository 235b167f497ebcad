// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davsync_core::{DOWNLOAD_BATCH_SIZE, FullListingSync, RecordType, SyncError};
use davsync_dav::{DavError, ETag};

use crate::common::{FakeRemote, Harness, Op, event, vcard};

#[tokio::test]
async fn full_listing_downloads_changed_contact() {
    let h = Harness::new(FakeRemote::new("/card/"), RecordType::Contacts);
    let e1 = h.remote.insert("A.vcf", &vcard("a"));
    let e2 = h.remote.insert("A.vcf", &vcard("a-v2"));
    assert_ne!(e1, e2);
    let id = h.store.insert_synced("A.vcf", &e1, &vcard("a"));

    let ctx = h.context();
    FullListingSync::new(&ctx, None).pull().await.unwrap();

    assert_eq!(h.remote.fetch_batches(), vec![vec!["A.vcf".to_string()]]);
    assert_eq!(h.store.applied(), vec![("A.vcf".to_string(), (Some(e2), None))]);
    let record = h.store.record(id).unwrap();
    assert!(record.present);
    assert_eq!(h.store.data("A.vcf"), Some(vcard("a-v2")));
    assert_eq!(ctx.counters().updated(), 1);
}

#[tokio::test]
async fn full_listing_reconciles_presence() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    let same = h.remote.insert("same.ics", &event("same"));
    h.remote.insert("new.ics", &event("new"));
    h.store.insert_synced("same.ics", &same, &event("same"));
    h.store
        .insert_synced("gone.ics", &ETag::from("\"e0\""), &event("gone"));
    let edited = h
        .store
        .insert_synced("edited.ics", &ETag::from("\"e0\""), &event("edited"));
    h.store.modify(edited, &event("edited-locally"));

    let ctx = h.context();
    FullListingSync::new(&ctx, None).pull().await.unwrap();

    // Only the unknown member is downloaded.
    assert_eq!(h.remote.fetch_batches(), vec![vec!["new.ics".to_string()]]);
    assert_eq!(
        h.store.names(),
        vec![
            "edited.ics".to_string(),
            "new.ics".to_string(),
            "same.ics".to_string()
        ]
    );
    assert!(h.store.by_name("same.ics").unwrap().present);
    assert!(h.store.by_name("edited.ics").unwrap().dirty);
    assert_eq!(ctx.counters().inserted(), 1);
    assert_eq!(ctx.counters().deleted(), 1);
    assert_eq!(ctx.counters().updated(), 0);
}

#[tokio::test]
async fn full_listing_downloads_in_batches() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    for i in 0..25 {
        h.remote.insert(&format!("{i:02}.ics"), &event(&i.to_string()));
    }

    let ctx = h.context();
    FullListingSync::new(&ctx, None).pull().await.unwrap();

    let mut sizes: Vec<_> = h.remote.fetch_batches().iter().map(Vec::len).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![5, DOWNLOAD_BATCH_SIZE, DOWNLOAD_BATCH_SIZE]);
    assert_eq!(h.store.len(), 25);
    assert_eq!(ctx.counters().inserted(), 25);
}

#[tokio::test]
async fn full_listing_skips_unparseable_bodies() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    h.remote.insert("bad.ics", "not a calendar");
    h.remote.insert("good.ics", &event("good"));

    let ctx = h.context();
    FullListingSync::new(&ctx, None).pull().await.unwrap();

    assert_eq!(h.store.names(), vec!["good.ics".to_string()]);
    assert_eq!(ctx.counters().skipped(), 1);
    assert_eq!(ctx.counters().inserted(), 1);
}

#[tokio::test]
async fn full_listing_member_vanishing_before_download_is_skipped() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    h.remote.insert("a.ics", &event("a"));
    h.remote.insert("b.ics", &event("b"));
    // Deleted by another client between listing and download.
    h.remote.remove_on_fetch("b.ics");

    let ctx = h.context();
    FullListingSync::new(&ctx, None).pull().await.unwrap();
    assert_eq!(h.store.names(), vec!["a.ics".to_string()]);
}

#[tokio::test]
async fn full_listing_transient_fetch_failure_aborts() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    h.remote.insert("a.ics", &event("a"));
    h.remote
        .fail_next(Op::FetchBatch, DavError::Network("connection reset".to_string()));

    let ctx = h.context();
    let err = FullListingSync::new(&ctx, None).pull().await.unwrap_err();

    assert!(err.is_transient(), "{err}");
    assert_eq!(
        err.context().and_then(|c| c.remote.as_deref()),
        Some("/cal/")
    );
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn full_listing_protocol_error_is_fatal() {
    let h = Harness::events(FakeRemote::new("/cal/"));
    h.remote.fail_next(
        Op::ListAll,
        DavError::Status {
            status: 400,
            message: "bad request".to_string(),
        },
    );

    let ctx = h.context();
    let err = FullListingSync::new(&ctx, None).pull().await.unwrap_err();
    assert!(matches!(err, SyncError::Remote { .. }), "{err}");
}
