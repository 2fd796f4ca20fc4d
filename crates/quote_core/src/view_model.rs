//! Display-ready projections of the store. Nothing here mutates state.
use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};

use crate::parse::{summarize, ParseSummary, ParsedInput};
use crate::timeline::{Notification, TimelineEntry, Tone};
use crate::{ItemId, ItemStatus, Job, JobId, JobOptions, JobStatus, LinkStatus, PdfExportOptions, ProductItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Recency,
    Progress,
    Total,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub input: InputView,
    pub options: JobOptions,
    pub jobs: Vec<JobRowView>,
    pub search: String,
    pub sort: SortOrder,
    pub current: Option<JobDetailView>,
    pub timeline: TimelineView,
    pub notifications: Vec<Notification>,
    pub link: LinkStatus,
    pub rejected_frames: u64,
    pub is_loading: bool,
    pub exporting: bool,
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputView {
    pub rows: Vec<InputRowView>,
    pub summary: ParseSummary,
    pub can_submit: bool,
}

impl InputView {
    pub fn new(parsed: &[ParsedInput]) -> Self {
        let summary = summarize(parsed);
        Self {
            rows: parsed
                .iter()
                .enumerate()
                .map(|(index, row)| InputRowView {
                    line: index + 1,
                    url: row.url.clone(),
                    quantity: row.quantity,
                    error: row.error.as_ref().map(ToString::to_string),
                })
                .collect(),
            summary,
            can_submit: summary.valid > 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRowView {
    pub line: usize,
    pub url: String,
    pub quantity: u32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub name: String,
    pub created_at: String,
    pub status: JobStatus,
    pub status_tone: Tone,
    pub progress: f64,
    pub items_processed: u32,
    pub total_items: u32,
    pub grand_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDetailView {
    pub job_id: JobId,
    pub name: String,
    pub created_at: String,
    pub status: JobStatus,
    pub status_tone: Tone,
    pub progress: f64,
    pub items_processed: u32,
    pub total_items: u32,
    pub cards: Vec<ItemCardView>,
    pub summary: SummaryView,
    pub retryable: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub glyph: &'static str,
    pub label: &'static str,
    pub tone: Tone,
    pub spinning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemActions {
    pub retry: bool,
    pub edit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemCardView {
    pub item_id: ItemId,
    pub title: String,
    pub url: String,
    pub badge: StatusBadge,
    pub quantity: u32,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
    pub thumbnail: Option<String>,
    pub alternative_url: Option<String>,
    pub anti_bot_hint: bool,
    pub error_message: Option<String>,
    pub actions: ItemActions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub serial: usize,
    pub item_id: ItemId,
    pub name: String,
    pub unit_price: Option<f64>,
    pub quantity: u32,
    pub total_price: Option<f64>,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryView {
    pub rows: Vec<SummaryRow>,
    pub grand_total: f64,
    pub included_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimelineView {
    pub entries: Vec<TimelineEntry>,
    /// Index of the newest entry; the list stays pinned to it.
    pub scroll_to: Option<usize>,
}

pub fn job_status_tone(status: JobStatus) -> Tone {
    match status {
        JobStatus::Queued => Tone::Muted,
        JobStatus::Running => Tone::Default,
        JobStatus::Partial => Tone::Warning,
        JobStatus::Complete => Tone::Success,
        JobStatus::Failed => Tone::Destructive,
    }
}

pub fn status_badge(status: ItemStatus) -> StatusBadge {
    let (glyph, label, tone) = match status {
        ItemStatus::Pending => ("…", "Pending", Tone::Muted),
        ItemStatus::Scraping => ("↻", "Scraping", Tone::Default),
        ItemStatus::Success => ("✔", "Success", Tone::Success),
        ItemStatus::Failed => ("✖", "Failed", Tone::Destructive),
        ItemStatus::AntiBot => ("⚠", "Anti-Bot", Tone::Warning),
        ItemStatus::Duplicate => ("⚠", "Duplicate", Tone::Muted),
    };
    StatusBadge {
        glyph,
        label,
        tone,
        spinning: status == ItemStatus::Scraping,
    }
}

/// Case-insensitive name filter followed by the selected ordering.
pub fn jobs_list(jobs: &[Job], search: &str, sort: SortOrder) -> Vec<JobRowView> {
    let needle = search.to_lowercase();
    let mut rows: Vec<&Job> = jobs
        .iter()
        .filter(|job| job.name.to_lowercase().contains(&needle))
        .collect();

    rows.sort_by(|a, b| match sort {
        SortOrder::Recency => newest_first(created_at(a), created_at(b)),
        SortOrder::Progress => b.progress.partial_cmp(&a.progress).unwrap_or(Ordering::Equal),
        SortOrder::Total => b
            .grand_total
            .unwrap_or(0.0)
            .partial_cmp(&a.grand_total.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
    });

    rows.into_iter()
        .map(|job| JobRowView {
            job_id: job.id.clone(),
            name: job.name.clone(),
            created_at: job.created_at.clone(),
            status: job.status,
            status_tone: job_status_tone(job.status),
            progress: job.progress,
            items_processed: job.items_processed,
            total_items: job.total_items,
            grand_total: job.grand_total,
        })
        .collect()
}

fn created_at(job: &Job) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&job.created_at).ok()
}

/// Compares instants, not text; unparseable timestamps go last.
fn newest_first(a: Option<DateTime<FixedOffset>>, b: Option<DateTime<FixedOffset>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn job_detail(job: &Job) -> JobDetailView {
    JobDetailView {
        job_id: job.id.clone(),
        name: job.name.clone(),
        created_at: job.created_at.clone(),
        status: job.status,
        status_tone: job_status_tone(job.status),
        progress: job.progress,
        items_processed: job.items_processed,
        total_items: job.total_items,
        cards: job.items.iter().map(item_card).collect(),
        summary: summary_table(&job.items),
        retryable: retryable_count(job),
    }
}

pub fn item_card(item: &ProductItem) -> ItemCardView {
    let troubled = item.status.is_retryable();
    ItemCardView {
        item_id: item.id.clone(),
        title: item
            .product_name
            .clone()
            .unwrap_or_else(|| "Loading...".to_string()),
        url: item.url.clone(),
        badge: status_badge(item.status),
        quantity: item.quantity,
        unit_price: item.unit_price,
        total_price: item.total_price,
        thumbnail: item.thumbnail.clone(),
        alternative_url: item.alternative_url.clone(),
        anti_bot_hint: item.status == ItemStatus::AntiBot,
        error_message: item
            .metadata
            .as_ref()
            .and_then(|meta| meta.error_message.clone())
            .filter(|_| troubled),
        actions: ItemActions {
            retry: troubled,
            edit: troubled,
        },
    }
}

/// Successful items only; the total covers rows still included in the export.
pub fn summary_table(items: &[ProductItem]) -> SummaryView {
    let rows: Vec<SummaryRow> = items
        .iter()
        .filter(|item| item.status == ItemStatus::Success)
        .enumerate()
        .map(|(index, item)| SummaryRow {
            serial: index + 1,
            item_id: item.id.clone(),
            name: item.product_name.clone().unwrap_or_default(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            total_price: item.total_price,
            included: item.is_included(),
        })
        .collect();
    SummaryView {
        included_count: rows.iter().filter(|row| row.included).count(),
        grand_total: grand_total(items),
        rows,
    }
}

pub fn grand_total(items: &[ProductItem]) -> f64 {
    items
        .iter()
        .filter(|item| item.status == ItemStatus::Success && item.is_included())
        .map(|item| item.total_price.unwrap_or(0.0))
        .sum()
}

pub fn retryable_count(job: &Job) -> usize {
    job.items
        .iter()
        .filter(|item| item.status.is_retryable())
        .count()
}

/// One summary page plus one verification page per exported item when the appendix is on.
pub fn estimated_pdf_pages(items: &[ProductItem], options: &PdfExportOptions) -> usize {
    let exported = items
        .iter()
        .filter(|item| item.status == ItemStatus::Success && item.is_included())
        .count();
    1 + if options.include_appendix { exported } else { 0 }
}

pub fn timeline(entries: &[TimelineEntry]) -> TimelineView {
    TimelineView {
        entries: entries.to_vec(),
        scroll_to: entries.len().checked_sub(1),
    }
}
