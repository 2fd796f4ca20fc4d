//! Plain-text rendering of view models.
use std::fmt::Write;

use quote_core::{
    InputView, JobDetailView, JobRowView, LinkStatus, Notification, SummaryView, TimelineEntry,
    Tone,
};

pub fn money(value: f64) -> String {
    format!("${value:.2}")
}

fn optional_money(value: Option<f64>) -> String {
    value.map(money).unwrap_or_else(|| "-".to_string())
}

fn tone_mark(tone: Tone) -> &'static str {
    match tone {
        Tone::Default => " ",
        Tone::Muted => "·",
        Tone::Success => "+",
        Tone::Warning => "!",
        Tone::Destructive => "x",
    }
}

pub fn input(view: &InputView) -> String {
    let mut out = String::new();
    for row in &view.rows {
        let mark = if row.error.is_some() { "✖" } else { "✔" };
        let _ = write!(out, "{:>4} {mark} {}  x{}", row.line, row.url, row.quantity);
        if let Some(error) = &row.error {
            let _ = write!(out, "  ({error})");
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} valid, {} invalid",
        view.summary.valid, view.summary.invalid
    );
    out
}

pub fn jobs(rows: &[JobRowView]) -> String {
    if rows.is_empty() {
        return "No jobs found\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<28} {:<9} {:>8} {:>9} {:>12}",
        "ID", "NAME", "STATUS", "PROGRESS", "ITEMS", "TOTAL"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<12} {:<28} {:<9} {:>7.0}% {:>9} {:>12}",
            row.job_id,
            truncate(&row.name, 28),
            row.status.as_str(),
            row.progress,
            format!("{}/{}", row.items_processed, row.total_items),
            optional_money(row.grand_total),
        );
    }
    out
}

pub fn job(view: &JobDetailView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", view.name, view.job_id);
    let _ = writeln!(
        out,
        "{} {}  {:.0}%  {}/{} items  created {}",
        tone_mark(view.status_tone),
        view.status.as_str(),
        view.progress,
        view.items_processed,
        view.total_items,
        view.created_at
    );
    out.push('\n');

    for card in &view.cards {
        let _ = writeln!(
            out,
            "{} {:<10} {}  [{}]",
            card.badge.glyph, card.badge.label, card.title, card.item_id
        );
        let _ = writeln!(out, "    {}", card.url);
        let _ = writeln!(
            out,
            "    qty {}  unit {}  total {}",
            card.quantity,
            optional_money(card.unit_price),
            optional_money(card.total_price)
        );
        if let Some(alternative) = &card.alternative_url {
            let _ = writeln!(out, "    duplicate of {alternative}");
        }
        if let Some(error) = &card.error_message {
            let _ = writeln!(out, "    error: {error}");
        }
        if card.anti_bot_hint {
            let _ = writeln!(out, "    blocked by anti-bot protection; retry or enter the price manually");
        }
    }

    out.push('\n');
    out.push_str(&summary(&view.summary));
    if view.retryable > 0 {
        let _ = writeln!(out, "Retry failed ({})", view.retryable);
    }
    out
}

pub fn summary(view: &SummaryView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<32} {:>10} {:>4} {:>12}  PDF",
        "#", "PRODUCT", "UNIT", "QTY", "TOTAL"
    );
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:>3}  {:<32} {:>10} {:>4} {:>12}  {}",
            row.serial,
            truncate(&row.name, 32),
            optional_money(row.unit_price),
            row.quantity,
            optional_money(row.total_price),
            if row.included { "yes" } else { "no" }
        );
    }
    let _ = writeln!(
        out,
        "Grand total {} ({} items included)",
        money(view.grand_total),
        view.included_count
    );
    out
}

pub fn timeline_entry(entry: &TimelineEntry) -> String {
    format!(
        "{} {} {}",
        tone_mark(entry.tone),
        entry.received_at,
        entry.message
    )
}

pub fn notification(note: &Notification) -> String {
    if note.description.is_empty() {
        format!("{} {}", tone_mark(note.tone), note.title)
    } else {
        format!("{} {}: {}", tone_mark(note.tone), note.title, note.description)
    }
}

pub fn link(status: LinkStatus) -> String {
    format!("[live: {}]", status.label())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
