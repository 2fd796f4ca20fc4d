use pretty_assertions::assert_eq;
use quote_core::{
    update, AppState, Effect, ItemStatus, Job, JobOptions, JobStatus, LinkStatus, LiveEvent, Msg,
    ProductItem, Tone,
};

fn watched_job() -> Job {
    let mut first = ProductItem::new("I1", "https://example.com/a", 1);
    first.status = ItemStatus::Scraping;
    let mut second = ProductItem::new("I2", "https://example.com/b", 4);
    second.status = ItemStatus::Success;
    second.total_price = Some(40.0);
    Job {
        id: "J1".to_string(),
        name: "Office chairs".to_string(),
        created_at: "2026-04-02T08:30:00Z".to_string(),
        status: JobStatus::Running,
        progress: 50.0,
        items_processed: 1,
        total_items: 2,
        grand_total: None,
        items: vec![first, second],
        options: JobOptions::default(),
    }
}

fn watching() -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::JobOpened {
            job_id: "J1".to_string(),
        },
    );
    assert!(effects.contains(&Effect::ConnectLive {
        job_id: "J1".to_string()
    }));
    let (state, _) = update(state, Msg::JobsLoaded(Ok(vec![watched_job()])));
    let (state, _) = update(state, Msg::JobLoaded(Ok(watched_job())));
    state
}

fn receive(state: AppState, frame: &str) -> AppState {
    let event = LiveEvent::parse(frame).expect("frame parses");
    let (state, effects) = update(
        state,
        Msg::LiveEventReceived {
            event,
            received_at: "2026-04-02T08:31:00Z".to_string(),
        },
    );
    assert!(effects.is_empty());
    state
}

#[test]
fn item_failed_touches_only_that_item() {
    let before = watching();
    let state = receive(
        before.clone(),
        r#"{"type":"item.failed","jobId":"J1","itemId":"I1"}"#,
    );

    let mut expected = watched_job();
    expected.items[0].status = ItemStatus::Failed;
    assert_eq!(state.store().current_job, Some(expected.clone()));
    assert_eq!(state.store().jobs, vec![expected]);

    let view = state.view();
    assert_eq!(view.timeline.entries.len(), 1);
    let entry = &view.timeline.entries[0];
    assert_eq!(entry.event_type, "item.failed");
    assert_eq!(entry.item_id.as_deref(), Some("I1"));
    assert_eq!(entry.tone, Tone::Destructive);
    assert_eq!(view.timeline.scroll_to, Some(0));
}

#[test]
fn events_are_applied_in_arrival_order() {
    let state = watching();
    let state = receive(state, r#"{"type":"item.started","jobId":"J1","itemId":"I1"}"#);
    let state = receive(
        state,
        r#"{"type":"item.progress","jobId":"J1","itemId":"I1","data":{"stage":"price"}}"#,
    );
    let state = receive(
        state,
        r#"{"type":"item.completed","jobId":"J1","itemId":"I1","data":{"productName":"Chair","unitPrice":80.0,"totalPrice":80.0}}"#,
    );
    let state = receive(
        state,
        r#"{"type":"job.progress","jobId":"J1","data":{"progress":100,"itemsProcessed":2,"grandTotal":120.0,"status":"complete"}}"#,
    );

    let view = state.view();
    let tones: Vec<Tone> = view.timeline.entries.iter().map(|e| e.tone).collect();
    assert_eq!(tones, vec![Tone::Default, Tone::Default, Tone::Success, Tone::Default]);
    assert_eq!(view.timeline.scroll_to, Some(3));

    let job = state.store().current_job.clone().unwrap();
    assert_eq!(job.items[0].status, ItemStatus::Success);
    assert_eq!(job.items[0].product_name.as_deref(), Some("Chair"));
    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(job.grand_total, Some(120.0));
    assert_eq!(job.items_processed, 2);
    assert_eq!(state.store().jobs[0], job);
}

#[test]
fn anti_bot_entry_is_a_warning() {
    let state = receive(
        watching(),
        r#"{"type":"anti-bot.detected","jobId":"J1","itemId":"I1","data":{"httpCode":429}}"#,
    );
    let view = state.view();
    assert_eq!(view.timeline.entries[0].tone, Tone::Warning);
    let card = &view.current.as_ref().unwrap().cards[0];
    assert!(card.anti_bot_hint);
    assert!(card.actions.retry);
    assert_eq!(view.current.as_ref().unwrap().retryable, 1);
}

#[test]
fn events_for_another_job_are_dropped() {
    let before = watching();
    let state = receive(
        before.clone(),
        r#"{"type":"item.failed","jobId":"J2","itemId":"I1"}"#,
    );
    assert_eq!(state.store(), before.store());
    assert!(state.view().timeline.entries.is_empty());
}

#[test]
fn closing_the_job_disconnects_and_ignores_late_frames() {
    let (state, effects) = update(watching(), Msg::JobClosed);
    assert_eq!(effects, vec![Effect::DisconnectLive]);
    assert_eq!(state.live_job(), None);

    let after = receive(
        state.clone(),
        r#"{"type":"item.failed","jobId":"J1","itemId":"I1"}"#,
    );
    assert_eq!(after.store(), state.store());

    let (_, effects) = update(after, Msg::JobClosed);
    assert!(effects.is_empty());
}

#[test]
fn rejected_frames_are_counted_not_applied() {
    let before = watching();
    let (state, effects) = update(
        before.clone(),
        Msg::LiveFrameRejected {
            reason: "unknown event type `x`".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.store(), before.store());
    assert_eq!(state.view().rejected_frames, 1);
}

#[test]
fn exhausted_reconnects_warn_but_keep_state() {
    let before = watching();
    let (state, _) = update(before.clone(), Msg::ConnectionChanged(LinkStatus::Open));
    assert_eq!(state.view().link, LinkStatus::Open);

    let (state, effects) = update(state, Msg::ConnectionChanged(LinkStatus::Failed));
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.link, LinkStatus::Failed);
    assert_eq!(view.notifications[0].tone, Tone::Warning);
    assert_eq!(state.store(), before.store());

    // REST still works.
    let (_, effects) = update(
        state,
        Msg::JobOpened {
            job_id: "J1".to_string(),
        },
    );
    assert!(effects.contains(&Effect::FetchJob {
        job_id: "J1".to_string()
    }));
}
