/*!
 * Rewriter Tests
 * Reference substitution, type recomputation and grants
 */

use file_proxy::resolver::{MemResolver, MemSource};
use file_proxy::rewrite::actions;
use file_proxy::{
    FileProviderRule, GrantFlags, OutgoingRequest, ProxyConfig, ProxyContext, RequestItem,
    ResourceRef, Rewriter, StreamingServer,
};
use pretty_assertions::assert_eq;
use std::io::Read;
use std::sync::Arc;

fn setup() -> (Arc<ProxyContext>, Rewriter, MemResolver) {
    let mem = MemResolver::new();
    let ctx = ProxyContext::new(ProxyConfig::new("com.example"), Arc::new(mem.clone())).unwrap();
    let rewriter = Rewriter::new(Arc::clone(ctx.registry()));
    (ctx, rewriter, mem)
}

fn r(s: &str) -> ResourceRef {
    ResourceRef::parse(s).unwrap()
}

#[test]
fn test_send_with_foreign_primary_and_no_type() {
    let (ctx, rewriter, mem) = setup();
    let src = r("content://com.guest.provider/media/3");
    mem.insert(src.clone(), MemSource::new(vec![0u8; 2048]).with_name("clip.mp4"));

    let mut request = OutgoingRequest::new("send").with_primary(src.clone());
    rewriter.rewrite(&mut request);

    let primary = request.primary_ref.clone().unwrap();
    assert!(rewriter.is_proxy_reference(&primary));
    assert_eq!(request.mime_type.as_deref(), Some("video/mp4"));
    assert!(request.grant_flags.contains(GrantFlags::all()));
    assert_eq!(request.items, Some(vec![RequestItem::reference(primary.clone())]));

    let record = ctx.registry().lookup(&primary).unwrap();
    assert_eq!(record.source, src);
}

#[test]
fn test_send_without_any_metadata_falls_back_to_octet_stream() {
    let (_, rewriter, mem) = setup();
    let src = r("content://com.guest.provider/opaque");
    mem.insert(src.clone(), MemSource::new(vec![1u8; 8]).failing_everything());

    let mut request = OutgoingRequest::new(actions::SEND).with_primary(src);
    rewriter.rewrite(&mut request);
    assert_eq!(request.mime_type.as_deref(), Some("application/octet-stream"));
}

#[test]
fn test_good_type_is_preserved() {
    let (_, rewriter, mem) = setup();
    let src = r("content://com.guest.provider/a.pdf");
    mem.insert(src.clone(), MemSource::new(vec![1u8; 8]).with_type("application/pdf"));

    let mut request = OutgoingRequest::new(actions::VIEW)
        .with_primary(src)
        .with_type("image/png");
    rewriter.rewrite(&mut request);
    assert_eq!(request.mime_type.as_deref(), Some("image/png"));
}

#[test]
fn test_proxy_reference_is_not_wrapped_twice() {
    let (_, rewriter, _) = setup();
    let mut request = OutgoingRequest::new("send").with_primary(r("content://guest/a.txt"));
    rewriter.rewrite(&mut request);
    let first_pass = request.clone();

    rewriter.rewrite(&mut request);
    assert_eq!(request, first_pass);
}

#[test]
fn test_items_keep_order_and_only_foreign_change() {
    let (_, rewriter, _) = setup();
    let own = r("content://com.example.blackbox.FileProvider/own/1");
    let web = r("https://example.org/x.png");
    let foreign_a = r("content://guest/a.png");
    let foreign_b = r("content://guest/b.png");

    let mut request = OutgoingRequest::new(actions::SEND_MULTIPLE)
        .with_item(RequestItem::reference(foreign_a.clone()))
        .with_item(RequestItem::reference(own.clone()))
        .with_item(RequestItem::text("caption"))
        .with_item(RequestItem::reference(web.clone()))
        .with_item(RequestItem::reference(foreign_b.clone()));
    rewriter.rewrite(&mut request);

    let items = request.items.clone().unwrap();
    assert_eq!(items.len(), 5);
    assert!(rewriter.is_proxy_reference(items[0].reference.as_ref().unwrap()));
    assert_eq!(items[1].reference.as_ref(), Some(&own));
    assert_eq!(items[2], RequestItem::text("caption"));
    assert_eq!(items[3].reference.as_ref(), Some(&web));
    assert!(rewriter.is_proxy_reference(items[4].reference.as_ref().unwrap()));
    assert_ne!(items[0].reference, items[4].reference);
    assert!(request.grant_flags.contains(GrantFlags::all()));
}

#[test]
fn test_missing_type_inherited_from_first_substituted_item() {
    let (_, rewriter, mem) = setup();
    let first = r("content://guest/photo");
    mem.insert(first.clone(), MemSource::new(vec![0u8; 4]).with_type("image/jpeg"));

    let mut request = OutgoingRequest::new(actions::SEND_MULTIPLE)
        .with_item(RequestItem::text("no reference"))
        .with_item(RequestItem::reference(first));
    rewriter.rewrite(&mut request);
    assert_eq!(request.mime_type.as_deref(), Some("image/jpeg"));
}

#[test]
fn test_no_substitution_leaves_grants_alone() {
    let (_, rewriter, _) = setup();
    let mut request = OutgoingRequest::new("send")
        .with_item(RequestItem::reference(r("file:///sdcard/a.txt")));
    rewriter.rewrite(&mut request);
    assert!(request.grant_flags.is_empty());
}

#[test]
fn test_rule_converts_without_registration() {
    let (ctx, _, _) = setup();
    let rewriter = Rewriter::new(Arc::clone(ctx.registry())).with_rule(FileProviderRule::new(
        "com.guest.fileprovider",
        "external",
        "com.example.blackbox.FileProvider",
        "guest/external",
    ));

    let mut request = OutgoingRequest::new(actions::VIEW)
        .with_primary(r("content://com.guest.fileprovider/external/DCIM/a.jpg"));
    rewriter.rewrite(&mut request);

    assert_eq!(
        request.primary_ref.as_ref().map(ResourceRef::as_str),
        Some("content://com.example.blackbox.FileProvider/guest/external/DCIM/a.jpg")
    );
    assert_eq!(request.mime_type.as_deref(), Some("image/jpeg"));
    assert_eq!(ctx.registry().stats().size, 0);
}

#[test]
fn test_rewritten_reference_streams_source_bytes() {
    let (ctx, rewriter, mem) = setup();
    let src = r("content://guest/song.ogg");
    mem.insert(src.clone(), MemSource::new(b"OggS....".to_vec()));
    let server = StreamingServer::start(Arc::clone(&ctx)).unwrap();

    let mut request = OutgoingRequest::new(actions::VIEW).with_primary(src);
    rewriter.rewrite(&mut request);
    let proxy_ref = request.primary_ref.unwrap();

    let mut out = Vec::new();
    server
        .open_file(&proxy_ref, "r")
        .unwrap()
        .read_to_end(&mut out)
        .unwrap();
    assert_eq!(out, b"OggS....");
    assert_eq!(server.get_type(&proxy_ref).as_deref(), Some("audio/ogg"));
}
