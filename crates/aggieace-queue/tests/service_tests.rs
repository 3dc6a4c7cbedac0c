// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request path: fingerprint, cache lookup, queue admission.

use std::time::Duration;

use aggieace_core::{AggieError, JobStatus};
use aggieace_queue::{Submission, fingerprint_bytes};
use aggieace_test_utils::{SAMPLE_CALENDAR, TestHarness};

const WAIT: Duration = Duration::from_secs(5);
const SYLLABUS: &[u8] = b"%PDF-1.7\nCSCE 311 Section 546\nMidterm Exam: October 15\n";

#[tokio::test]
async fn cache_hit_bypasses_queue_and_limiter() {
    let harness = TestHarness::builder().build().await.unwrap();
    let path = harness.write_document("syllabus.pdf", SYLLABUS).await;
    harness
        .cache
        .insert(fingerprint_bytes(SYLLABUS), "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n")
        .await;

    let before = harness.limiter.snapshot();
    let submission = harness
        .service
        .request(&path, harness.metadata())
        .await
        .unwrap();

    match submission {
        Submission::Cached(entry) => {
            assert_eq!(entry.fingerprint, fingerprint_bytes(SYLLABUS));
            assert!(entry.calendar_text.starts_with("BEGIN:VCALENDAR"));
        }
        Submission::Queued(receipt) => panic!("expected cache hit, got {receipt:?}"),
    }

    let stats = harness.service.stats();
    assert_eq!(stats.queue_length, 0);
    assert_eq!(stats.total_jobs, 0);
    assert_eq!(harness.limiter.snapshot().daily.count, before.daily.count);
    assert_eq!(harness.limiter.snapshot().minute.count, before.minute.count);
    assert_eq!(harness.converter.call_count().await, 0);
}

#[tokio::test]
async fn miss_is_converted_cached_and_then_hit() {
    let harness = TestHarness::builder().build().await.unwrap();
    let path = harness.write_document("syllabus.pdf", SYLLABUS).await;

    let Submission::Queued(receipt) = harness
        .service
        .request(&path, harness.metadata())
        .await
        .unwrap()
    else {
        panic!("first request must miss the cache");
    };
    let done = harness
        .wait_for_status(&receipt.job_id, JobStatus::Completed, WAIT)
        .await;
    assert_eq!(done.result.unwrap().calendar_text, SAMPLE_CALENDAR);

    let cached = harness.cache.get(&fingerprint_bytes(SYLLABUS)).await.unwrap();
    assert_eq!(cached.calendar_text, SAMPLE_CALENDAR);

    // Same bytes under a different name hit the cache.
    let copy = harness.write_document("renamed.pdf", SYLLABUS).await;
    let second = harness
        .service
        .request(&copy, harness.metadata())
        .await
        .unwrap();
    assert!(matches!(second, Submission::Cached(_)));
    assert_eq!(harness.converter.call_count().await, 1);
}

#[tokio::test]
async fn cache_store_failure_does_not_fail_the_job() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.cache.fail_stores(true);
    let path = harness.write_document("syllabus.pdf", SYLLABUS).await;

    let Submission::Queued(receipt) = harness
        .service
        .request(&path, harness.metadata())
        .await
        .unwrap()
    else {
        panic!("expected a queued job");
    };
    let done = harness
        .wait_for_status(&receipt.job_id, JobStatus::Completed, WAIT)
        .await;
    assert!(done.error.is_none());
    assert_eq!(harness.cache.store_count(), 1);
    assert!(harness.cache.is_empty().await);
}

#[tokio::test]
async fn cache_lookup_failure_falls_through_to_queue() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.cache.fail_lookups(true);
    let path = harness.write_document("syllabus.pdf", SYLLABUS).await;

    let submission = harness
        .service
        .request(&path, harness.metadata())
        .await
        .unwrap();
    let Submission::Queued(receipt) = submission else {
        panic!("lookup failure must be treated as a miss");
    };
    harness
        .wait_for_status(&receipt.job_id, JobStatus::Completed, WAIT)
        .await;
    assert_eq!(harness.converter.call_count().await, 1);
}

#[tokio::test]
async fn unreadable_document_admits_no_job() {
    let harness = TestHarness::builder().build().await.unwrap();
    let missing = std::env::temp_dir().join("aggieace-definitely-missing.pdf");

    let err = harness
        .service
        .request(&missing, harness.metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, AggieError::Hashing { .. }), "got {err:?}");
    assert_eq!(harness.service.stats().total_jobs, 0);
    assert_eq!(harness.cache.lookup_count(), 0);
}

#[tokio::test]
async fn status_and_cancel_pass_through() {
    let harness = TestHarness::builder()
        .with_rate_limits(1, 1)
        .build()
        .await
        .unwrap();
    // Exhaust the daily budget so the job stays queued.
    harness.limiter.record_dispatch();
    let path = harness.write_document("syllabus.pdf", SYLLABUS).await;

    let Submission::Queued(receipt) = harness
        .service
        .request(&path, harness.metadata())
        .await
        .unwrap()
    else {
        panic!("expected a queued job");
    };
    assert_eq!(receipt.rate_limit.daily.remaining, 0);

    let snap = harness.service.status(&receipt.job_id).unwrap();
    assert_eq!(snap.status, JobStatus::Queued);
    assert!(harness.service.cancel(&receipt.job_id));
    assert_eq!(
        harness.service.status(&receipt.job_id).unwrap().status,
        JobStatus::Failed
    );
}
