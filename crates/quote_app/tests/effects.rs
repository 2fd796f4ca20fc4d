use std::path::PathBuf;

use pretty_assertions::assert_eq;
use quote_app::platform::effects::event_to_msg;
use quote_client::{ApiError, ArtifactError, ClientEvent};
use quote_core::{EventError, LinkStatus, LiveEvent, Msg};

fn never() -> String {
    panic!("timestamp not needed")
}

#[test]
fn api_errors_become_their_display_text() {
    let msg = event_to_msg(
        ClientEvent::JobsLoaded(Err(ApiError::Server {
            status: 500,
            message: "Database unavailable".to_string(),
        })),
        never,
    );
    assert_eq!(msg, Msg::JobsLoaded(Err("Database unavailable".to_string())));
}

#[test]
fn single_item_retry_keeps_its_item() {
    let msg = event_to_msg(
        ClientEvent::RetryFinished {
            job_id: "J1".to_string(),
            item_ids: Some(vec!["I4".to_string()]),
            result: Err(ApiError::Timeout),
        },
        never,
    );
    assert_eq!(
        msg,
        Msg::RetryFinished {
            item_id: Some("I4".to_string()),
            result: Err("request timed out".to_string()),
        }
    );
}

#[test]
fn saved_artifacts_report_their_path() {
    let msg = event_to_msg(
        ClientEvent::PdfSaved(Ok(PathBuf::from("out").join("BOM-J1.pdf"))),
        never,
    );
    let Msg::PdfSaved(Ok(path)) = msg else {
        panic!("expected saved path");
    };
    assert!(path.ends_with("BOM-J1.pdf"));

    let msg = event_to_msg(
        ClientEvent::CsvExported(Err(ArtifactError::Api(ApiError::TooLarge { max_bytes: 10 }))),
        never,
    );
    assert_eq!(
        msg,
        Msg::CsvExported(Err("response too large (max 10 bytes)".to_string()))
    );
}

#[test]
fn live_traffic_is_timestamped_on_arrival() {
    let event = LiveEvent::parse(r#"{"type":"job.progress","jobId":"J1","data":{"progress":40}}"#)
        .unwrap();
    let msg = event_to_msg(ClientEvent::Live(event.clone()), || {
        "2026-06-01T12:00:00+00:00".to_string()
    });
    assert_eq!(
        msg,
        Msg::LiveEventReceived {
            event,
            received_at: "2026-06-01T12:00:00+00:00".to_string(),
        }
    );

    let msg = event_to_msg(
        ClientEvent::LiveRejected(EventError::UnknownType("job.deleted".to_string())),
        never,
    );
    assert_eq!(
        msg,
        Msg::LiveFrameRejected {
            reason: "unknown event type `job.deleted`".to_string()
        }
    );
    assert_eq!(
        event_to_msg(ClientEvent::Link(LinkStatus::Open), never),
        Msg::ConnectionChanged(LinkStatus::Open)
    );
}
