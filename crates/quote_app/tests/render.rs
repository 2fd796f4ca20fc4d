use quote_app::platform::render;
use quote_core::{
    job_detail, parse_input, InputView, ItemMetadata, ItemStatus, Job, JobOptions, JobStatus,
    LinkStatus, Notification, ProductItem, Tone,
};

fn priced(id: &str, status: ItemStatus, total: Option<f64>) -> ProductItem {
    let mut item = ProductItem::new(id, format!("https://shop.example/{id}"), 2);
    item.status = status;
    item.total_price = total;
    item.unit_price = total.map(|t| t / 2.0);
    item.product_name = total.map(|_| format!("Part {id}"));
    item
}

fn sample_job() -> Job {
    let mut blocked = priced("I3", ItemStatus::AntiBot, None);
    blocked.metadata = Some(ItemMetadata {
        error_message: Some("HTTP 403".to_string()),
        ..ItemMetadata::default()
    });
    let mut excluded = priced("I2", ItemStatus::Success, Some(5.0));
    excluded.include_in_pdf = Some(false);
    Job {
        id: "J9".to_string(),
        name: "Workshop".to_string(),
        created_at: "2026-06-01T12:00:00Z".to_string(),
        status: JobStatus::Partial,
        progress: 100.0,
        items_processed: 3,
        total_items: 3,
        grand_total: Some(24.0),
        items: vec![priced("I1", ItemStatus::Success, Some(24.0)), excluded, blocked],
        options: JobOptions::default(),
    }
}

#[test]
fn input_lists_each_row_and_the_counts() {
    let rows = parse_input("https://a.example/x 2\nnot-a-url\n");
    let text = render::input(&InputView::new(&rows));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("✔ https://a.example/x  x2"));
    assert!(lines[1].contains("✖ not-a-url"));
    assert!(lines[1].contains("Invalid URL"));
    assert_eq!(lines[2], "1 valid, 1 invalid");
}

#[test]
fn job_view_shows_cards_summary_and_retry_count() {
    let text = render::job(&job_detail(&sample_job()));
    assert!(text.starts_with("Workshop (J9)\n"));
    assert!(text.contains("⚠ Anti-Bot"));
    assert!(text.contains("error: HTTP 403"));
    assert!(text.contains("anti-bot protection"));
    assert!(text.contains("Grand total $24.00 (1 items included)"));
    assert!(text.contains("Retry failed (1)"));
}

#[test]
fn empty_job_list_says_so() {
    assert_eq!(render::jobs(&[]), "No jobs found\n");
}

#[test]
fn small_pieces() {
    assert_eq!(render::money(1234.5), "$1234.50");
    assert_eq!(render::link(LinkStatus::Reconnecting { attempt: 2 }), "[live: reconnecting (2)]");
    let note = Notification {
        id: 1,
        title: "Export failed".to_string(),
        description: "Job still running".to_string(),
        tone: Tone::Destructive,
    };
    assert_eq!(render::notification(&note), "x Export failed: Job still running");
}
