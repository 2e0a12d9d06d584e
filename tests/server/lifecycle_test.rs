/*!
 * Lifecycle Tests
 * Open, release and expiry interplay
 */

use file_proxy::resolver::{MemResolver, MemSource};
use file_proxy::{
    ManualClock, ProxyConfig, ProxyContext, ProxyError, ResourceRef, StreamingServer,
};
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (StreamingServer, ResourceRef, ManualClock) {
    let mem = MemResolver::new();
    let src = ResourceRef::parse("content://guest/item").unwrap();
    mem.insert(src.clone(), MemSource::new((0..64u8).collect::<Vec<_>>()));
    let clock = ManualClock::new();
    let ctx = ProxyContext::with_clock(
        ProxyConfig::new("com.example"),
        Arc::new(mem),
        Arc::new(clock.clone()),
    )
    .unwrap();
    let proxy_ref = ctx.registry().register(&src, None).unwrap();
    (StreamingServer::start(ctx).unwrap(), proxy_ref, clock)
}

#[test]
fn test_release_is_idempotent_and_final() {
    let (server, proxy_ref, _) = setup();
    let file = server.open_file(&proxy_ref, "r").unwrap();
    let handle = file.as_handle().unwrap();

    handle.release();
    handle.release();
    assert!(handle.is_released());
    assert!(matches!(
        handle.read_at(0, &mut [0u8; 1]),
        Err(ProxyError::Released)
    ));
}

#[test]
fn test_dropping_handles_releases_them() {
    let (server, proxy_ref, _) = setup();
    for _ in 0..50 {
        let file = server.open_file(&proxy_ref, "r").unwrap();
        drop(file);
    }
    let file = server.open_file(&proxy_ref, "r").unwrap();
    let mut buf = [0u8; 2];
    assert_eq!(file.as_handle().unwrap().read_at(62, &mut buf).unwrap(), 2);
}

#[test]
fn test_expired_reference_cannot_be_opened() {
    let (server, proxy_ref, clock) = setup();
    clock.advance(Duration::from_secs(301));

    assert!(matches!(
        server.open_file(&proxy_ref, "r"),
        Err(ProxyError::NotFound(_))
    ));
    assert!(server.query(&proxy_ref, &[]).is_empty());
    assert_eq!(server.get_type(&proxy_ref), None);
}

#[test]
fn test_open_handle_outlives_token_expiry() {
    let (server, proxy_ref, clock) = setup();
    let file = server.open_file(&proxy_ref, "r").unwrap();

    clock.advance(Duration::from_secs(301));
    let mut buf = [0u8; 4];
    assert_eq!(file.as_handle().unwrap().read_at(0, &mut buf).unwrap(), 4);
    assert_eq!(buf, [0, 1, 2, 3]);
}

#[test]
fn test_reads_from_many_threads() {
    let (server, proxy_ref, _) = setup();
    let server = Arc::new(server);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let server = Arc::clone(&server);
            let proxy_ref = proxy_ref.clone();
            std::thread::spawn(move || {
                let file = server.open_file(&proxy_ref, "r").unwrap();
                let handle = file.as_handle().unwrap();
                (0..16u64).all(|i| {
                    let offset = (t * 16 + i) % 64;
                    let mut byte = [0u8; 1];
                    handle.read_at(offset, &mut byte).unwrap() == 1 && byte[0] as u64 == offset
                })
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
