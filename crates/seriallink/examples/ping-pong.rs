//! Request/response against an emulated device.
//!
//! The device answers `ping` with `pong` and ignores every other command, so
//! the second request times out.
//!
//! Run with: `cargo run -p seriallink --example ping-pong`

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use seriallink::frame::{LineReader, LineWriter, Message};
use seriallink::link::{Link, LinkConfig, LinkError};
use seriallink::transport::{LinkTransport, MemoryTransport};

/// Plays the device on the far end of the transport.
async fn emulated_device(transport: MemoryTransport) {
    let (read, write) = transport.into_split();
    let mut reader = LineReader::new(read);
    let mut writer = LineWriter::new(write);

    while let Some(item) = reader.next().await {
        let Ok(message) = item else { continue };
        if !message.is_request() || message.command != "ping" {
            continue;
        }
        if writer.send(Message::response(message.id, "pong")).await.is_err() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let (host_end, device_end) = MemoryTransport::pair();
    tokio::spawn(emulated_device(device_end));

    let link = Arc::new(Link::with_config(LinkConfig {
        request_timeout: Duration::from_secs(1),
        ..LinkConfig::default()
    }));
    let serving = tokio::spawn({
        let link = link.clone();
        async move { link.serve(host_end).await }
    });

    let response = link.request("ping").await?;
    println!("ping -> {} (id {})", response.command, response.id);

    match link.request("unknown").await {
        Err(LinkError::Timeout(after)) => println!("unknown -> no answer after {after:?}"),
        other => println!("unknown -> unexpected {other:?}"),
    }

    link.shutdown();
    serving.await??;
    Ok(())
}
