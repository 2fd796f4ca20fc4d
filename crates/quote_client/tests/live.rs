use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use quote_client::{ClientSettings, EventSink, LiveClient, LiveError};
use quote_core::{EventError, LinkStatus, LiveEvent, ReconnectPolicy};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

const STARTED: &str = r#"{"type":"item.started","jobId":"J1","itemId":"I1","data":{"userAgent":"UA/1"}}"#;
const COMPLETED: &str =
    r#"{"type":"item.completed","jobId":"J1","itemId":"I1","data":{"productName":"Drill","unitPrice":10}}"#;

#[derive(Default)]
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    statuses: Mutex<Vec<LinkStatus>>,
}

impl Recorder {
    fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            log,
            statuses: Mutex::new(Vec::new()),
        })
    }

    fn statuses(&self) -> Vec<LinkStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

impl EventSink for Recorder {
    fn deliver(&self, event: &LiveEvent) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, event.type_name()));
    }

    fn rejected(&self, _error: &EventError) {
        self.log.lock().unwrap().push(format!("{}:rejected", self.name));
    }

    fn status_changed(&self, status: LinkStatus) {
        self.statuses.lock().unwrap().push(status);
    }
}

fn settings(addr: SocketAddr, policy: ReconnectPolicy) -> ClientSettings {
    ClientSettings {
        ws_url_template: format!("ws://{addr}/ws/jobs/{{jobId}}"),
        reconnect: policy,
        ..ClientSettings::default()
    }
}

fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        max_attempts,
        base_delay: Duration::from_millis(20),
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

/// Accepts one socket, sends `frames`, then holds the connection open.
async fn serve_frames(frames: Vec<&'static str>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.to_string().into())).await.unwrap();
        }
        while let Some(Ok(_)) = ws.next().await {}
    });
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_reach_subscribers_in_order_and_bad_frames_are_skipped() {
    let addr = serve_frames(vec![STARTED, "not json at all", COMPLETED]).await;
    let client = LiveClient::new(&settings(addr, fast_policy(1)), Handle::current());
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = Recorder::new("A", log.clone());
    let second = Recorder::new("B", log.clone());
    client.subscribe(first.clone());
    client.subscribe(second);

    client.connect("J1").unwrap();
    wait_for(|| log.lock().unwrap().len() == 6).await;

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "A:item.started",
            "B:item.started",
            "A:rejected",
            "B:rejected",
            "A:item.completed",
            "B:item.completed",
        ]
    );
    assert_eq!(client.state(), LinkStatus::Open);
    assert_eq!(
        first.statuses(),
        vec![LinkStatus::Connecting, LinkStatus::Open]
    );
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsubscribed_sink_stops_receiving() {
    let addr = serve_frames(vec![STARTED]).await;
    let client = LiveClient::new(&settings(addr, fast_policy(1)), Handle::current());
    let log = Arc::new(Mutex::new(Vec::new()));
    let dropped = client.subscribe(Recorder::new("A", log.clone()));
    client.subscribe(Recorder::new("B", log.clone()));

    assert!(client.unsubscribe(dropped));
    assert!(!client.unsubscribe(dropped));
    client.connect("J1").unwrap();
    wait_for(|| !log.lock().unwrap().is_empty()).await;

    assert_eq!(*log.lock().unwrap(), vec!["B:item.started"]);
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn gives_up_after_the_reconnect_budget() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });

    let client = LiveClient::new(&settings(addr, fast_policy(2)), Handle::current());
    let recorder = Recorder::new("A", Arc::default());
    client.subscribe(recorder.clone());
    client.connect("J1").unwrap();

    wait_for(|| client.state() == LinkStatus::Failed).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(accepted.load(Ordering::SeqCst), 3);
    assert_eq!(client.state(), LinkStatus::Failed);
    assert_eq!(
        recorder.statuses(),
        vec![
            LinkStatus::Connecting,
            LinkStatus::Reconnecting { attempt: 1 },
            LinkStatus::Connecting,
            LinkStatus::Reconnecting { attempt: 2 },
            LinkStatus::Connecting,
            LinkStatus::Failed,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reconnects_after_server_close_and_resets_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(STARTED.to_string().into())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = LiveClient::new(&settings(addr, fast_policy(3)), Handle::current());
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder::new("A", log.clone());
    client.subscribe(recorder.clone());
    client.connect("J1").unwrap();

    wait_for(|| !log.lock().unwrap().is_empty()).await;
    assert_eq!(*log.lock().unwrap(), vec!["A:item.started"]);
    assert_eq!(client.state(), LinkStatus::Open);
    assert_eq!(client.attempts(), 0);
    assert!(recorder
        .statuses()
        .contains(&LinkStatus::Reconnecting { attempt: 1 }));
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_is_terminal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });

    let client = LiveClient::new(&settings(addr, fast_policy(5)), Handle::current());
    let recorder = Recorder::new("A", Arc::default());
    client.subscribe(recorder.clone());
    client.connect("J1").unwrap();
    wait_for(|| client.state() == LinkStatus::Open).await;

    client.disconnect();
    assert_eq!(client.state(), LinkStatus::Disconnected);
    assert_eq!(client.job_id(), None);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(client.state(), LinkStatus::Disconnected);
    assert_eq!(recorder.statuses().last(), Some(&LinkStatus::Disconnected));
    // Subscribers are dropped with the connection.
    assert!(!client.unsubscribe(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn send_only_goes_out_while_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                let _ = received_tx.send(text.to_string());
            }
        }
    });

    let client = LiveClient::new(&settings(addr, fast_policy(1)), Handle::current());
    assert!(!client.send(&json!({ "type": "ping" })));

    client.connect("J1").unwrap();
    wait_for(|| client.state() == LinkStatus::Open).await;
    assert!(client.send(&json!({ "type": "ping" })));

    let received = tokio::time::timeout(Duration::from_secs(5), received_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, r#"{"type":"ping"}"#);
    client.disconnect();
    assert!(!client.send(&json!({ "type": "ping" })));
}

#[tokio::test]
async fn invalid_template_is_reported() {
    let settings = ClientSettings {
        ws_url_template: "not a url {jobId}".to_string(),
        ..ClientSettings::default()
    };
    let client = LiveClient::new(&settings, Handle::current());
    assert!(matches!(
        client.connect("J1").unwrap_err(),
        LiveError::InvalidUrl(_)
    ));
    assert_eq!(client.state(), LinkStatus::Disconnected);
}
