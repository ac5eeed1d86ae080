//! Tests for client operations
//!
//! These tests verify:
//! - Optimistic set/del guarded by revision
//! - Stat sentinels surfaced as FileRev
//! - Pagination termination for getdir and walk
//! - Per-entry degradation in getdirinfo
//! - Wait for existing and future changes
//! - Access with a secret

#[path = "../common/mod.rs"]
mod common;

use std::io::BufReader;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::{next_request, scripted_server, send_response, FakeServer};
use revtree::protocol::{ErrorCode, Response, Verb, REV_CLOBBER};
use revtree::{Conn, FileInfo, FileRev, RevtreeError, FLAG_DEL, FLAG_SET};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (FakeServer, Conn) {
    let server = FakeServer::start();
    let conn = Conn::dial(&server.addr()).unwrap();
    (server, conn)
}

fn setup_with_dir() -> (FakeServer, Conn) {
    let (server, conn) = setup();
    server.put("/d/a", b"alpha");
    server.put("/d/b", b"bravo");
    server.put("/d/c/nested", b"charlie");
    (server, conn)
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_set_then_get_round_trip() {
    let (_server, conn) = setup();

    let rev = conn.set("/a", 0, b"hello").unwrap();
    let (body, file_rev) = conn.get("/a", None).unwrap();

    assert_eq!(body, b"hello");
    assert!(file_rev >= rev);
}

#[test]
fn test_get_at_revision() {
    let (_server, conn) = setup();

    let rev = conn.set("/a", 0, b"v1").unwrap();
    let (body, file_rev) = conn.get("/a", Some(rev)).unwrap();
    assert_eq!(body, b"v1");
    assert_eq!(file_rev, rev);
}

#[test]
fn test_set_with_stale_rev_is_rejected() {
    let (_server, conn) = setup();

    let first = conn.set("/a", 0, b"one").unwrap();
    let err = conn.set("/a", 0, b"two").unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::RevMismatch));
    match &err {
        RevtreeError::Server(e) => {
            assert_eq!(e.verb, Verb::Set);
            assert_eq!(e.path.as_deref(), Some("/a"));
        }
        other => panic!("expected server error, got {other:?}"),
    }

    let second = conn.set("/a", first, b"two").unwrap();
    assert!(second > first);
}

#[test]
fn test_clobber_ignores_revision() {
    let (_server, conn) = setup();

    conn.set("/a", 0, b"one").unwrap();
    conn.set("/a", REV_CLOBBER, b"two").unwrap();
    assert_eq!(conn.get("/a", None).unwrap().0, b"two");
}

#[test]
fn test_del_guarded_by_revision() {
    let (_server, conn) = setup();

    let rev = conn.set("/a", 0, b"x").unwrap();
    assert_eq!(
        conn.del("/a", rev - 1).unwrap_err().code(),
        Some(ErrorCode::RevMismatch)
    );

    conn.del("/a", rev).unwrap();
    assert_eq!(conn.stat("/a", None).unwrap().1, FileRev::Missing);
}

#[test]
fn test_rev_advances_with_writes() {
    let (_server, conn) = setup();

    let before = conn.rev().unwrap();
    let written = conn.set("/a", 0, b"x").unwrap();
    let after = conn.rev().unwrap();

    assert!(written > before);
    assert_eq!(after, written);
    conn.nop().unwrap();
}

// =============================================================================
// Stat
// =============================================================================

#[test]
fn test_stat_file_dir_and_missing() {
    let (server, conn) = setup_with_dir();
    let rev = server.put("/d/a", b"alpha!");

    assert_eq!(conn.stat("/d/a", None).unwrap(), (6, FileRev::Rev(rev)));
    assert_eq!(conn.stat("/d", None).unwrap(), (3, FileRev::Dir));
    assert_eq!(conn.stat("/nowhere", None).unwrap().1, FileRev::Missing);
}

#[test]
fn test_statinfo_file() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let info = conn.statinfo(rev, "/d/b").unwrap();
    assert_eq!(info.name, "b");
    assert_eq!(info.len, 5);
    assert!(info.rev > 0);
    assert!(info.is_set);
    assert!(!info.is_dir);
}

#[test]
fn test_statinfo_dir() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let info = conn.statinfo(rev, "/d/c").unwrap();
    assert_eq!(info.name, "c");
    assert!(info.is_set);
    assert!(info.is_dir);
}

#[test]
fn test_statinfo_missing_is_not_found() {
    let (_server, conn) = setup();
    let rev = conn.rev().unwrap();

    let err = conn.statinfo(rev, "/missing").unwrap_err();
    assert!(matches!(err, RevtreeError::NotFound(ref path) if path == "/missing"));
    assert!(err.is_not_found());
}

// =============================================================================
// Getdir
// =============================================================================

#[test]
fn test_getdir_unbounded_stops_at_range() {
    let (server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let before = server.requests();
    let names = conn.getdir("/d", rev, 0, -1).unwrap();

    assert_eq!(names, vec!["a", "b", "c"]);
    // One request per entry plus the one answered with RANGE
    assert_eq!(server.requests() - before, 4);
}

#[test]
fn test_getdir_offset_and_limit() {
    let (server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    assert_eq!(conn.getdir("/d", rev, 1, 1).unwrap(), vec!["b"]);
    assert_eq!(conn.getdir("/d", rev, 1, 5).unwrap(), vec!["b", "c"]);
    assert!(conn.getdir("/d", rev, 10, -1).unwrap().is_empty());

    let before = server.requests();
    assert!(conn.getdir("/d", rev, 0, 0).unwrap().is_empty());
    assert_eq!(server.requests(), before);
}

#[test]
fn test_getdir_root() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    assert_eq!(conn.getdir("/", rev, 0, -1).unwrap(), vec!["d"]);
}

#[test]
fn test_getdir_missing_dir_is_error() {
    let (_server, conn) = setup();
    let rev = conn.rev().unwrap();

    let err = conn.getdir("/nowhere", rev, 0, -1).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_getdir_on_file_is_error() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let err = conn.getdir("/d/a", rev, 0, -1).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotDir));
}

#[test]
fn test_getdir_stops_at_largest_offset() {
    let (offsets_tx, offsets_rx) = mpsc::channel();
    // Never reports the end of the listing
    let addr = scripted_server(move |stream| {
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        while let Some(request) = next_request(&mut reader) {
            offsets_tx.send(request.offset).unwrap();
            send_response(
                &mut writer,
                &Response {
                    path: Some("entry".to_string()),
                    ..Response::ok(request.tag.unwrap())
                },
            );
        }
    });

    let conn = Conn::dial(&addr).unwrap();
    let names = conn.getdir("/d", 1, i32::MAX - 1, -1).unwrap();
    assert_eq!(names, vec!["entry", "entry"]);

    let offsets: Vec<Option<i32>> = offsets_rx.try_iter().collect();
    assert_eq!(offsets, vec![Some(i32::MAX - 1), Some(i32::MAX)]);
}

// =============================================================================
// Getdirinfo
// =============================================================================

#[test]
fn test_getdirinfo_resolves_each_entry() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let infos = conn.getdirinfo("/d", rev, 0, -1).unwrap();
    assert_eq!(infos.len(), 3);

    assert_eq!(infos[0].name, "a");
    assert_eq!(infos[0].len, 5);
    assert!(infos[0].is_set && !infos[0].is_dir);

    assert_eq!(infos[2].name, "c");
    assert!(infos[2].is_set && infos[2].is_dir);
}

#[test]
fn test_getdirinfo_degrades_failed_entry() {
    let (server, conn) = setup_with_dir();
    server.add_ghost("/d/zz");
    let rev = conn.rev().unwrap();

    let infos = conn.getdirinfo("/d", rev, 0, -1).unwrap();
    assert_eq!(infos.len(), 4);
    assert_eq!(
        infos[3],
        FileInfo {
            name: "zz".to_string(),
            ..FileInfo::default()
        }
    );
    assert!(infos[..3].iter().all(|info| info.is_set));
}

#[test]
fn test_getdirinfo_root_paths() {
    let (server, conn) = setup();
    server.put("/top", b"1234");
    let rev = conn.rev().unwrap();

    let infos = conn.getdirinfo("/", rev, 0, -1).unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].name, "top");
    assert_eq!(infos[0].len, 4);
    assert!(infos[0].is_set);
}

// =============================================================================
// Walk
// =============================================================================

#[test]
fn test_walk_matches_glob() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let events = conn.walk("/d/**", rev, 0, -1).unwrap();
    let paths: Vec<&str> = events.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/d/a", "/d/b", "/d/c/nested"]);
    assert_eq!(events[2].body, b"charlie");
    assert!(events.iter().all(|e| e.is_set()));

    let events = conn.walk("/d/*", rev, 0, -1).unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_walk_limit() {
    let (_server, conn) = setup_with_dir();
    let rev = conn.rev().unwrap();

    let events = conn.walk("/**", rev, 1, 2).unwrap();
    let paths: Vec<&str> = events.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/d/b", "/d/c/nested"]);

    assert!(conn.walk("/nothing/**", rev, 0, -1).unwrap().is_empty());
}

// =============================================================================
// Wait
// =============================================================================

#[test]
fn test_wait_returns_past_change() {
    let (_server, conn) = setup();

    let rev = conn.set("/w", 0, b"body").unwrap();
    let event = conn.wait("/w", rev).unwrap();

    assert_eq!(event.rev, rev);
    assert_eq!(event.path, "/w");
    assert_eq!(event.body, b"body");
    assert_eq!(event.flag, FLAG_SET);
}

#[test]
fn test_wait_blocks_until_change() {
    let (server, conn) = setup();
    let rev = conn.rev().unwrap();

    thread::scope(|s| {
        let waiter = s.spawn(|| conn.wait("/later/*", rev + 1));

        thread::sleep(Duration::from_millis(100));
        server.put("/unrelated", b"noise");
        server.put("/later/one", b"1");

        let event = waiter.join().unwrap().unwrap();
        assert_eq!(event.path, "/later/one");
        assert_eq!(event.rev, rev + 2);
        assert!(event.is_set());
    });
}

#[test]
fn test_wait_reports_delete() {
    let (_server, conn) = setup();

    let rev = conn.set("/gone", 0, b"x").unwrap();
    conn.del("/gone", rev).unwrap();

    let event = conn.wait("/gone", rev + 1).unwrap();
    assert_eq!(event.flag, FLAG_DEL);
    assert!(event.is_del());
    assert!(!event.is_set());
}

// =============================================================================
// Access
// =============================================================================

#[test]
fn test_access_with_secret() {
    let server = FakeServer::start_with_secret(Some("s3cret"));
    let conn = Conn::dial(&server.addr()).unwrap();

    let err = conn.access("wrong").unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::Other));
    assert!(!err.is_terminal());

    conn.access("s3cret").unwrap();
    conn.nop().unwrap();
}
