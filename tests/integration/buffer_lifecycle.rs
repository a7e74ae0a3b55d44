use crate::integration::support::{dust_host, listed_session, AWAKE};
use norns_edit::transport::MemoryTransport;
use norns_edit::{ApiError, Category};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn read_installs_clean_buffer_once() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let buffer = session.buffer_read(AWAKE).await.unwrap();
    assert_eq!(buffer.content, "-- awake");
    assert!(!buffer.modified);

    let again = session.buffer_read(AWAKE).await.unwrap();
    assert_eq!(again, buffer);
    assert_eq!(host.call_count("read_resource"), 1);
}

#[tokio::test]
async fn read_of_missing_resource_is_not_found() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let err = session.buffer_read("/scripts/none.lua").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(session.buffer("/scripts/none.lua").is_none());
}

#[tokio::test]
async fn read_does_not_clobber_local_edits() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_change(AWAKE, "-- local");
    let buffer = session.buffer_read(AWAKE).await.unwrap();
    assert_eq!(buffer.content, "-- local");
    assert!(buffer.modified);
    assert_eq!(host.call_count("read_resource"), 0);
}

#[tokio::test]
async fn change_marks_modified() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_read(AWAKE).await.unwrap();
    session.buffer_change(AWAKE, "print(2)");
    let buffer = session.buffer(AWAKE).unwrap();
    assert_eq!(buffer.content, "print(2)");
    assert!(buffer.modified);

    // change of a key that was never read still creates a dirty buffer
    session.buffer_change("/scripts/scratch.lua", "x");
    assert!(session.buffer("/scripts/scratch.lua").unwrap().modified);
}

#[tokio::test]
async fn successful_save_clears_modified() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_change(AWAKE, "print(2)");
    session.save(AWAKE, "print(2)".to_string()).await.unwrap();

    let buffer = session.buffer(AWAKE).unwrap();
    assert_eq!(buffer.content, "print(2)");
    assert!(!buffer.modified);
    assert_eq!(host.file(AWAKE).as_deref(), Some("print(2)"));
}

#[tokio::test]
async fn failed_save_keeps_modified() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    host.fail_on("write_resource");

    session.buffer_change(AWAKE, "print(3)");
    let err = session.save(AWAKE, "print(3)".to_string()).await.unwrap_err();
    assert!(matches!(err, ApiError::RemoteFailure(_)));

    let buffer = session.buffer(AWAKE).unwrap();
    assert_eq!(buffer.content, "print(3)");
    assert!(buffer.modified);
    assert_eq!(host.file(AWAKE).as_deref(), Some("-- awake"));

    host.succeed_on("write_resource");
    session.save(AWAKE, "print(3)".to_string()).await.unwrap();
    assert!(!session.buffer(AWAKE).unwrap().modified);
}

#[tokio::test]
async fn buffer_save_reports_outcome_once() {
    let host = Arc::new(MemoryTransport::new().with_file("/scripts/a.lua", ""));
    let (session, _rx) = crate::integration::support::session_on(&host);
    session.list(Category::Scripts).await.unwrap();

    session.buffer_change("/scripts/a.lua", "print(1)");
    let calls = Arc::new(AtomicUsize::new(0));
    let outcome = Arc::new(Mutex::new(None));
    {
        let calls = Arc::clone(&calls);
        let outcome = Arc::clone(&outcome);
        session
            .buffer_save("/scripts/a.lua", "print(1)".to_string(), move |result| {
                calls.fetch_add(1, Ordering::SeqCst);
                *outcome.lock() = Some(result);
            })
            .await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*outcome.lock(), Some(Ok(())));
    let buffer = session.buffer("/scripts/a.lua").unwrap();
    assert!(!buffer.modified);
    assert_eq!(buffer.content, "print(1)");
}

#[tokio::test]
async fn buffer_save_reports_failure() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    host.fail_on("write_resource");

    let outcome = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&outcome);
    session
        .buffer_save(AWAKE, "x".to_string(), move |result| {
            *slot.lock() = Some(result);
        })
        .await;

    assert!(matches!(
        *outcome.lock(),
        Some(Err(ApiError::RemoteFailure(_)))
    ));
    assert!(session.buffer(AWAKE).unwrap().modified);
}
