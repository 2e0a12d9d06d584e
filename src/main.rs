/*!
 * File Proxy - Service Entry Point
 *
 * Registers the files given on the command line behind proxy references,
 * streams each one back through the server to check it, then keeps
 * sweeping expired tokens until interrupted.
 *
 * Usage: file-proxy [--json] <file>...
 */

use clap::Parser;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use file_proxy::core::config::ProxyConfig;
use file_proxy::monitoring::{init_tracing, init_tracing_with};
use file_proxy::resolver::columns;
use file_proxy::{
    LocalResolver, OutgoingRequest, ProxyContext, RequestItem, ResourceRef, Rewriter,
    StreamingServer,
};

#[derive(Parser, Debug)]
#[command(name = "file-proxy")]
#[command(about = "Serve local files through expiring proxy references", long_about = None)]
#[command(version)]
struct Args {
    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Files to register behind proxy references
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// Mount each file's directory under its own guest authority
fn mount_files(resolver: &LocalResolver, files: &[PathBuf]) -> Vec<ResourceRef> {
    let mut references = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let authority = format!("local.files{index}");
        let parent = file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let Some(name) = file.file_name() else {
            warn!(path = %file.display(), "skipping path without a file name");
            continue;
        };
        resolver.mount(&authority, parent);
        match resolver.reference_for(&authority, name) {
            Ok(reference) => references.push(reference),
            Err(e) => warn!(path = %file.display(), error = %e, "skipping file"),
        }
    }
    references
}

/// Stream every proxy reference back and compare against its reported size
fn verify(server: &StreamingServer, references: &[ResourceRef]) {
    for reference in references {
        let expected = server
            .query(reference, &[columns::SIZE])
            .first()
            .and_then(|row| row.integer(columns::SIZE));

        match server.open_file(reference, "r") {
            Ok(mut file) => match io::copy(&mut file, &mut io::sink()) {
                Ok(streamed) => info!(
                    reference = %reference,
                    mime = ?server.get_type(reference),
                    streamed,
                    expected = ?expected,
                    seekable = file.is_seekable(),
                    "Streamed proxy reference"
                ),
                Err(e) => error!(reference = %reference, error = %e, "Stream failed"),
            },
            Err(e) => error!(reference = %reference, error = %e, "Open failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if args.json {
        init_tracing_with(true);
    } else {
        init_tracing();
    }

    info!("File proxy starting...");

    let config = ProxyConfig::from_env()?;
    info!(
        host = %config.host_identity,
        ttl_secs = config.ttl.as_secs(),
        random_access = config.random_access_supported,
        "Configuration loaded"
    );
    let sweep_interval = config.sweep_interval;

    let resolver = LocalResolver::new();
    let sources = mount_files(&resolver, &args.files);

    let context = ProxyContext::new(config, Arc::new(resolver))?;
    let server = Arc::new(StreamingServer::start(Arc::clone(&context))?);
    let rewriter = Rewriter::new(Arc::clone(context.registry()));

    let mut request = OutgoingRequest::new("send");
    for source in sources {
        request = request.with_item(RequestItem::reference(source));
    }
    rewriter.rewrite(&mut request);
    info!(
        request = %serde_json::to_string(&request)?,
        proxied = rewriter.is_proxy_carrying_request(&request),
        "Outgoing request rewritten"
    );

    let proxy_refs: Vec<ResourceRef> = request.item_references().cloned().collect();
    let verifier = Arc::clone(&server);
    tokio::task::spawn_blocking(move || verify(&verifier, &proxy_refs)).await?;

    let sweeper_registry = Arc::clone(context.registry());
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let purged = sweeper_registry.purge_expired();
            let stats = sweeper_registry.stats();
            info!(
                purged,
                live = stats.size,
                hits = stats.hits,
                misses = stats.misses,
                "Token sweep"
            );
        }
    });

    info!("Proxy running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    sweeper.abort();

    info!("File proxy stopped");
    Ok(())
}
