/*!
 * Fallback Tests
 * Channel, sequential and local-file serving under resolver failures
 */

use file_proxy::resolver::{columns, LocalResolver, MemResolver, MemSource};
use file_proxy::{ProxyConfig, ProxyContext, ProxyError, ResourceRef, StreamingServer};
use pretty_assertions::assert_eq;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use tempfile::TempDir;

fn serve(mem: &MemResolver, source: MemSource) -> (StreamingServer, ResourceRef) {
    let src = ResourceRef::parse("content://guest/item").unwrap();
    mem.insert(src.clone(), source);
    let ctx = ProxyContext::new(ProxyConfig::new("com.example"), Arc::new(mem.clone())).unwrap();
    let proxy_ref = ctx.registry().register(&src, None).unwrap();
    (StreamingServer::start(ctx).unwrap(), proxy_ref)
}

#[test]
fn test_channel_failure_reopens_sequential_stream_per_read() {
    let mem = MemResolver::new();
    let data: Vec<u8> = (0..100u8).collect();
    let (server, proxy_ref) = serve(&mem, MemSource::new(data).failing_channel_reads());

    let file = server.open_file(&proxy_ref, "r").unwrap();
    let handle = file.as_handle().unwrap();
    let mut buf = [0u8; 3];
    handle.read_at(50, &mut buf).unwrap();
    assert_eq!(buf, [50, 51, 52]);
    handle.read_at(10, &mut buf).unwrap();
    assert_eq!(buf, [10, 11, 12]);
    assert_eq!(mem.sequential_opens(), 2);
}

#[test]
fn test_asset_failure_uses_recorded_size() {
    let mem = MemResolver::new();
    let (server, proxy_ref) = serve(&mem, MemSource::new(vec![9u8; 64]).failing_asset());

    let file = server.open_file(&proxy_ref, "r").unwrap();
    assert_eq!(file.size(), Some(64));
    let mut buf = [0u8; 8];
    assert_eq!(file.as_handle().unwrap().read_at(60, &mut buf).unwrap(), 4);
}

#[test]
fn test_unknown_size_reports_zero_but_still_streams() {
    let mem = MemResolver::new();
    let (server, proxy_ref) = serve(
        &mem,
        MemSource::new(b"abc".to_vec())
            .without_size_column()
            .without_asset_length()
            .sequential_only(),
    );

    assert_eq!(
        server.query(&proxy_ref, &[columns::SIZE])[0].get(columns::SIZE),
        Some(&file_proxy::MetadataValue::Null)
    );
    let mut file = server.open_file(&proxy_ref, "r").unwrap();
    assert_eq!(file.size(), Some(0));
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    assert_eq!(out, "abc");
}

#[test]
fn test_fallback_failure_surfaces_io_error() {
    let mem = MemResolver::new();
    let (server, proxy_ref) = serve(
        &mem,
        MemSource::new(vec![1u8; 16])
            .failing_channel_reads()
            .failing_stream_reads(),
    );

    let file = server.open_file(&proxy_ref, "r").unwrap();
    let err = file.as_handle().unwrap().read_at(0, &mut [0u8; 4]).unwrap_err();
    assert!(matches!(err, ProxyError::Io(_)));
}

#[test]
fn test_source_removed_after_registration() {
    let mem = MemResolver::new();
    let (server, proxy_ref) = serve(&mem, MemSource::new(vec![1u8; 16]).sequential_only());
    mem.remove(&ResourceRef::parse("content://guest/item").unwrap());

    let file = server.open_file(&proxy_ref, "r").unwrap();
    assert!(matches!(
        file.as_handle().unwrap().read_at(0, &mut [0u8; 4]),
        Err(ProxyError::Io(_))
    ));
}

#[test]
fn test_local_file_served_with_seek() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"alpha beta gamma").unwrap();

    let local = LocalResolver::new();
    local.mount("com.guest.local", dir.path());
    let src = local.reference_for("com.guest.local", "notes.txt").unwrap();

    let ctx = ProxyContext::new(ProxyConfig::new("com.example"), Arc::new(local)).unwrap();
    let proxy_ref = ctx.registry().register(&src, None).unwrap();
    let server = StreamingServer::start(ctx).unwrap();

    assert_eq!(server.get_type(&proxy_ref).as_deref(), Some("text/plain"));
    let rows = server.query(&proxy_ref, &[]);
    assert_eq!(rows[0].text(columns::DISPLAY_NAME), Some("notes.txt"));
    assert_eq!(rows[0].integer(columns::SIZE), Some(16));

    let file = server.open_file(&proxy_ref, "r").unwrap();
    let file_proxy::ProxyFile::Seekable(mut handle) = file else {
        panic!("expected seekable handle");
    };
    handle.seek(SeekFrom::Start(6)).unwrap();
    let mut word = [0u8; 4];
    handle.read_exact(&mut word).unwrap();
    assert_eq!(&word, b"beta");
}

#[test]
fn test_local_file_name_with_reserved_characters() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("report#2.pdf"), b"%PDF-1.7 second").unwrap();
    std::fs::write(dir.path().join("report"), b"wrong file").unwrap();

    let local = LocalResolver::new();
    local.mount("com.guest.local", dir.path());
    let src = local.reference_for("com.guest.local", "report#2.pdf").unwrap();

    let ctx = ProxyContext::new(ProxyConfig::new("com.example"), Arc::new(local)).unwrap();
    let proxy_ref = ctx.registry().register(&src, None).unwrap();
    let server = StreamingServer::start(ctx).unwrap();

    assert_eq!(server.get_type(&proxy_ref).as_deref(), Some("application/pdf"));
    let rows = server.query(&proxy_ref, &[]);
    assert_eq!(rows[0].text(columns::DISPLAY_NAME), Some("report#2.pdf"));
    assert_eq!(rows[0].integer(columns::SIZE), Some(15));

    let mut body = Vec::new();
    server
        .open_file(&proxy_ref, "r")
        .unwrap()
        .read_to_end(&mut body)
        .unwrap();
    assert_eq!(body, b"%PDF-1.7 second");
}
