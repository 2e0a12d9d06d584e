/*!
 * Read Tests
 * Byte-exact positional reads across every serving path
 */

use file_proxy::resolver::{MemResolver, MemSource};
use file_proxy::{ProxyConfig, ProxyContext, ProxyFile, ResourceRef, StreamingServer};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Read;
use std::sync::Arc;

fn serve(source: MemSource) -> (StreamingServer, ResourceRef) {
    let mem = MemResolver::new();
    let src = ResourceRef::parse("content://guest/blob.bin").unwrap();
    mem.insert(src.clone(), source);
    let ctx = ProxyContext::new(ProxyConfig::new("com.example"), Arc::new(mem)).unwrap();
    let proxy_ref = ctx.registry().register(&src, None).unwrap();
    (StreamingServer::start(ctx).unwrap(), proxy_ref)
}

fn expected(data: &[u8], offset: u64, count: usize) -> Vec<u8> {
    let start = (offset as usize).min(data.len());
    let end = start.saturating_add(count).min(data.len());
    data[start..end].to_vec()
}

#[derive(Debug, Clone, Copy)]
enum ServePath {
    Channel,
    BrokenChannel,
    SequentialSkip,
    StalledSkip,
}

fn source_for(data: Vec<u8>, path: ServePath) -> MemSource {
    let source = MemSource::new(data);
    match path {
        ServePath::Channel => source,
        ServePath::BrokenChannel => source.failing_channel_reads(),
        ServePath::SequentialSkip => source.sequential_only().with_skip_limit(100),
        ServePath::StalledSkip => source.sequential_only().with_skip_limit(0),
    }
}

fn any_path() -> impl Strategy<Value = ServePath> {
    prop_oneof![
        Just(ServePath::Channel),
        Just(ServePath::BrokenChannel),
        Just(ServePath::SequentialSkip),
        Just(ServePath::StalledSkip),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_positional_read_matches_source(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        offset in 0u64..5000,
        count in 0usize..2048,
        path in any_path(),
    ) {
        let (server, proxy_ref) = serve(source_for(data.clone(), path));
        let file = server.open_file(&proxy_ref, "r").unwrap();
        let handle = file.as_handle().unwrap();

        let mut buf = vec![0u8; count];
        let read = handle.read_at(offset, &mut buf).unwrap();
        let want = expected(&data, offset, count);
        prop_assert_eq!(&buf[..read], &want[..]);
    }
}

#[test]
fn test_sequential_reads_through_handle() {
    let data: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
    let (server, proxy_ref) = serve(MemSource::new(data.clone()));

    let mut file = server.open_file(&proxy_ref, "r").unwrap();
    assert_eq!(file.size(), Some(100_000));
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    assert_eq!(out.len(), data.len());
    assert!(out == data);
}

#[test]
fn test_reads_at_and_past_end() {
    let data = b"0123456789".to_vec();
    let (server, proxy_ref) = serve(MemSource::new(data));
    let file = server.open_file(&proxy_ref, "r").unwrap();
    let handle = file.as_handle().unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(handle.read_at(8, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"89");
    assert_eq!(handle.read_at(10, &mut buf).unwrap(), 0);
    assert_eq!(handle.read_at(u64::MAX, &mut buf).unwrap(), 0);
}

#[test]
fn test_pipe_mode_matches_source() {
    let data: Vec<u8> = (0..=255u8).rev().cycle().take(200_000).collect();
    let mem = MemResolver::new();
    let src = ResourceRef::parse("content://guest/big.bin").unwrap();
    mem.insert(src.clone(), MemSource::new(data.clone()));
    let ctx = ProxyContext::new(
        ProxyConfig::new("com.example")
            .with_random_access(false)
            .with_pipe_capacity(1024)
            .with_copy_buffer_size(333),
        Arc::new(mem),
    )
    .unwrap();
    let proxy_ref = ctx.registry().register(&src, None).unwrap();
    let server = StreamingServer::start(ctx).unwrap();

    let file = server.open_file(&proxy_ref, "rwt").unwrap();
    let ProxyFile::Pipe(mut reader) = file else {
        panic!("expected pipe");
    };
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert!(out == data);
}
