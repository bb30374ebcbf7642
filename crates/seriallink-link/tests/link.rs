use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use seriallink_frame::{FrameError, LineReader, LineWriter, Message};
use seriallink_link::{Link, LinkConfig, LinkError, WRITER_CHANNEL_SIZE};
use seriallink_transport::{LinkTransport, MemoryTransport};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type PeerReader = LineReader<DuplexStream>;
type PeerWriter = LineWriter<DuplexStream>;

/// Serve `link` on one end of an in-memory pair and return the other end
/// framed for the test to play the device.
fn start(link: &Arc<Link>) -> (JoinHandle<seriallink_link::Result<()>>, PeerReader, PeerWriter) {
    let (local, remote) = MemoryTransport::pair();
    let serving = tokio::spawn({
        let link = link.clone();
        async move { link.serve(local).await }
    });
    let (read, write) = remote.into_split();
    (serving, LineReader::new(read), LineWriter::new(write))
}

async fn next_message(reader: &mut PeerReader) -> Message {
    reader
        .next()
        .await
        .expect("peer stream ended")
        .expect("peer received malformed line")
}

#[tokio::test]
async fn request_returns_matching_response() {
    let link = Arc::new(Link::new());
    let (serving, mut peer_rx, mut peer_tx) = start(&link);

    let device = tokio::spawn(async move {
        let request = next_message(&mut peer_rx).await;
        assert!(request.is_request());
        assert_eq!(request.command, "ping");
        peer_tx
            .send(Message::response(request.id, "pong"))
            .await
            .unwrap();
    });

    let response = link.request("ping").await.unwrap();
    assert_eq!(response, Message::response(1, "pong"));
    device.await.unwrap();

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn concurrent_requests_receive_only_their_own_response() {
    let link = Arc::new(Link::new());
    let (serving, mut peer_rx, mut peer_tx) = start(&link);

    let device = tokio::spawn(async move {
        let first = next_message(&mut peer_rx).await;
        let second = next_message(&mut peer_rx).await;
        assert_ne!(first.id, second.id);

        // Unrelated traffic and answers in reverse order.
        peer_tx.send(Message::notification("noise")).await.unwrap();
        for request in [second, first] {
            peer_tx
                .send(Message::response(
                    request.id,
                    format!("re-{}", request.command),
                ))
                .await
                .unwrap();
        }
    });

    let (a, b) = tokio::join!(link.request("a"), link.request("b"));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.command, "re-a");
    assert_eq!(b.command, "re-b");
    assert_ne!(a.id, b.id);
    device.await.unwrap();

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn silent_peer_times_out_and_listener_is_removed() {
    let link = Arc::new(Link::new());
    let (serving, _peer_rx, _peer_tx) = start(&link);
    let (_standing, _standing_rx) = link.register();
    let baseline = link.listener_count();

    let started = Instant::now();
    let err = link.request("unknown").await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, LinkError::Timeout(d) if d == Duration::from_secs(5)));
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_millis(5100));
    assert_eq!(link.listener_count(), baseline);

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn request_timeout_follows_config() {
    let link = Arc::new(Link::with_config(LinkConfig {
        request_timeout: Duration::from_millis(250),
        ..LinkConfig::default()
    }));
    let (serving, _peer_rx, _peer_tx) = start(&link);

    let err = link.request("slow").await.unwrap_err();
    assert!(matches!(err, LinkError::Timeout(d) if d == Duration::from_millis(250)));

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn listener_replies_to_peer_request() {
    let link = Arc::new(Link::new());
    let (id, mut incoming) = link.register();
    let (serving, mut peer_rx, mut peer_tx) = start(&link);

    let handler = tokio::spawn({
        let link = link.clone();
        async move {
            while let Some(message) = incoming.recv().await {
                if message.is_request() && message.command == "ping" {
                    link.reply(&message, "pong").unwrap();
                    return;
                }
            }
        }
    });

    peer_tx.send(Message::request(1, "ping")).await.unwrap();
    assert_eq!(next_message(&mut peer_rx).await, Message::response(1, "pong"));
    handler.await.unwrap();

    link.unregister(&id);
    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_lines_do_not_stop_the_reader() {
    let link = Arc::new(Link::new());
    let (_id, mut incoming) = link.register();
    let (local, remote) = MemoryTransport::pair();
    let serving = tokio::spawn({
        let link = link.clone();
        async move { link.serve(local).await }
    });

    let (_read, mut write) = remote.into_split();
    tokio::io::AsyncWriteExt::write_all(
        &mut write,
        b"hello there\nrequest nope x\n\nnotify still alive\n",
    )
    .await
    .unwrap();

    assert_eq!(
        incoming.recv().await.unwrap(),
        Message::notification("still alive")
    );

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn notifications_reach_the_wire_in_order() {
    let link = Arc::new(Link::new());
    let (serving, mut peer_rx, _peer_tx) = start(&link);

    for n in 0..5 {
        link.notify(format!("tick {n}")).unwrap();
    }
    for n in 0..5 {
        assert_eq!(
            next_message(&mut peer_rx).await,
            Message::notification(format!("tick {n}"))
        );
    }

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn write_overflow_without_writer_reports_queue_full() {
    let link = Link::new();
    for n in 0..WRITER_CHANNEL_SIZE {
        link.notify(format!("n{n}")).unwrap();
    }
    assert!(matches!(
        link.notify("overflow"),
        Err(LinkError::QueueFull { capacity }) if capacity == WRITER_CHANNEL_SIZE
    ));
}

#[tokio::test]
async fn shutdown_fails_pending_request_and_stops_serve() {
    let link = Arc::new(Link::new());
    let (serving, mut peer_rx, _peer_tx) = start(&link);

    let pending = tokio::spawn({
        let link = link.clone();
        async move { link.request("never answered").await }
    });

    // Wait for the request to reach the peer before shutting down.
    next_message(&mut peer_rx).await;
    link.shutdown();

    assert!(matches!(pending.await.unwrap(), Err(LinkError::Shutdown)));
    serving.await.unwrap().unwrap();
    assert!(link.is_shutdown());
    assert_eq!(link.listener_count(), 0);
}

#[tokio::test]
async fn second_serve_is_rejected_while_first_runs() {
    let link = Arc::new(Link::new());
    let (serving, mut peer_rx, _peer_tx) = start(&link);

    // A round trip proves the first serve holds the outgoing queue.
    link.notify("hello").unwrap();
    next_message(&mut peer_rx).await;

    let (other, _other_remote) = MemoryTransport::pair();
    assert!(matches!(
        link.serve(other).await,
        Err(LinkError::AlreadyServing)
    ));

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn peer_hangup_keeps_link_alive_until_shutdown() {
    let link = Arc::new(Link::new());
    let (serving, peer_rx, peer_tx) = start(&link);
    drop((peer_rx, peer_tx));

    tokio::task::yield_now().await;
    assert!(!serving.is_finished());

    link.shutdown();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn write_failure_is_returned_from_serve_after_shutdown() {
    let link = Arc::new(Link::new());
    let (serving, peer_rx, _peer_tx) = start(&link);
    drop(peer_rx);

    link.notify("into the void").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    // The reader is still attached, so serve keeps running.
    assert!(!serving.is_finished());

    link.shutdown();
    let result = serving.await.unwrap();
    assert!(
        matches!(result, Err(LinkError::Frame(FrameError::Io(_)))),
        "{result:?}"
    );
}

#[tokio::test]
async fn dropped_request_removes_its_listener() {
    let link = Arc::new(Link::new());
    let (serving, mut peer_rx, _peer_tx) = start(&link);
    let baseline = link.listener_count();

    let pending = tokio::spawn({
        let link = link.clone();
        async move { link.request("abandoned").await }
    });
    next_message(&mut peer_rx).await;
    assert_eq!(link.listener_count(), baseline + 1);

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert_eq!(link.listener_count(), baseline);

    let timed_out = tokio::time::timeout(Duration::from_millis(20), link.request("short")).await;
    assert!(timed_out.is_err());
    assert_eq!(link.listener_count(), baseline);

    link.shutdown();
    serving.await.unwrap().unwrap();
}
