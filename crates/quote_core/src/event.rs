//! Typed live events.
//!
//! Frames arrive as `{type, jobId, itemId?, data?}` JSON objects. They are
//! validated here and turned into a closed set of variants; anything the
//! dashboard does not understand is rejected at this boundary.
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{ItemId, ItemMetadata, ItemPatch, ItemStatus, JobId, JobPatch, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown event type `{0}`")]
    UnknownType(String),
    #[error("event `{0}` is missing itemId")]
    MissingItemId(&'static str),
    #[error("invalid `{kind}` payload: {message}")]
    Payload { kind: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStartedData {
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemProgressData {
    pub stage: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemResult {
    pub product_name: Option<String>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
    pub screenshot: Option<String>,
    pub thumbnail: Option<String>,
    pub timestamp: Option<String>,
    pub metadata: Option<ItemMetadata>,
    pub is_duplicate: Option<bool>,
    pub alternative_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemFailure {
    pub error_message: Option<String>,
    pub http_code: Option<u16>,
    pub retry_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AntiBotData {
    pub http_code: Option<u16>,
    pub user_agent: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobProgressData {
    pub status: Option<JobStatus>,
    pub progress: Option<f64>,
    pub items_processed: Option<u32>,
    pub total_items: Option<u32>,
    pub grand_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveEventKind {
    ItemStarted {
        item_id: ItemId,
        data: ItemStartedData,
    },
    ItemProgress {
        item_id: ItemId,
        data: ItemProgressData,
    },
    ItemCompleted {
        item_id: ItemId,
        data: ItemResult,
    },
    ItemFailed {
        item_id: ItemId,
        data: ItemFailure,
    },
    AntiBotDetected {
        item_id: ItemId,
        data: AntiBotData,
    },
    JobProgress {
        data: JobProgressData,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveEvent {
    pub job_id: JobId,
    pub kind: LiveEventKind,
    /// Untouched `data` value, kept for the activity timeline.
    pub raw_data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    job_id: JobId,
    #[serde(default)]
    item_id: Option<ItemId>,
    #[serde(default)]
    data: Value,
}

impl LiveEvent {
    pub fn parse(text: &str) -> Result<Self, EventError> {
        let frame: Frame =
            serde_json::from_str(text).map_err(|err| EventError::Malformed(err.to_string()))?;
        Self::from_frame(frame)
    }

    fn from_frame(frame: Frame) -> Result<Self, EventError> {
        let Frame {
            kind,
            job_id,
            item_id,
            data,
        } = frame;

        let item = |name: &'static str| item_id.clone().ok_or(EventError::MissingItemId(name));

        let kind = match kind.as_str() {
            "item.started" => LiveEventKind::ItemStarted {
                item_id: item("item.started")?,
                data: payload("item.started", &data)?,
            },
            "item.progress" => LiveEventKind::ItemProgress {
                item_id: item("item.progress")?,
                data: payload("item.progress", &data)?,
            },
            "item.completed" => LiveEventKind::ItemCompleted {
                item_id: item("item.completed")?,
                data: payload("item.completed", &data)?,
            },
            "item.failed" => LiveEventKind::ItemFailed {
                item_id: item("item.failed")?,
                data: payload("item.failed", &data)?,
            },
            "anti-bot.detected" => LiveEventKind::AntiBotDetected {
                item_id: item("anti-bot.detected")?,
                data: payload("anti-bot.detected", &data)?,
            },
            "job.progress" => LiveEventKind::JobProgress {
                data: payload("job.progress", &data)?,
            },
            _ => return Err(EventError::UnknownType(kind)),
        };

        Ok(Self {
            job_id,
            kind,
            raw_data: data,
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            LiveEventKind::ItemStarted { .. } => "item.started",
            LiveEventKind::ItemProgress { .. } => "item.progress",
            LiveEventKind::ItemCompleted { .. } => "item.completed",
            LiveEventKind::ItemFailed { .. } => "item.failed",
            LiveEventKind::AntiBotDetected { .. } => "anti-bot.detected",
            LiveEventKind::JobProgress { .. } => "job.progress",
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        match &self.kind {
            LiveEventKind::ItemStarted { item_id, .. }
            | LiveEventKind::ItemProgress { item_id, .. }
            | LiveEventKind::ItemCompleted { item_id, .. }
            | LiveEventKind::ItemFailed { item_id, .. }
            | LiveEventKind::AntiBotDetected { item_id, .. } => Some(item_id),
            LiveEventKind::JobProgress { .. } => None,
        }
    }

    /// The store change this event implies, if any.
    pub fn store_change(&self) -> Option<EventChange> {
        match &self.kind {
            LiveEventKind::ItemStarted { item_id, data } => {
                let mut patch = ItemPatch::status(ItemStatus::Scraping);
                if data.user_agent.is_some() {
                    patch.metadata = Some(ItemMetadata {
                        user_agent: data.user_agent.clone(),
                        ..ItemMetadata::default()
                    });
                }
                Some(EventChange::Item(item_id.clone(), patch))
            }
            LiveEventKind::ItemProgress { .. } => None,
            LiveEventKind::ItemCompleted { item_id, data } => {
                let status = if data.is_duplicate == Some(true) {
                    ItemStatus::Duplicate
                } else {
                    ItemStatus::Success
                };
                let patch = ItemPatch {
                    status: Some(status),
                    product_name: data.product_name.clone(),
                    unit_price: data.unit_price,
                    total_price: data.total_price,
                    screenshot: data.screenshot.clone(),
                    thumbnail: data.thumbnail.clone(),
                    timestamp: data.timestamp.clone(),
                    metadata: data.metadata.clone(),
                    is_duplicate: data.is_duplicate,
                    alternative_url: data.alternative_url.clone(),
                    ..ItemPatch::default()
                };
                Some(EventChange::Item(item_id.clone(), patch))
            }
            LiveEventKind::ItemFailed { item_id, data } => {
                let mut patch = ItemPatch::status(ItemStatus::Failed);
                let metadata = ItemMetadata {
                    http_code: data.http_code,
                    retry_count: data.retry_count,
                    error_message: data.error_message.clone(),
                    ..ItemMetadata::default()
                };
                if metadata != ItemMetadata::default() {
                    patch.metadata = Some(metadata);
                }
                Some(EventChange::Item(item_id.clone(), patch))
            }
            LiveEventKind::AntiBotDetected { item_id, data } => {
                let mut patch = ItemPatch::status(ItemStatus::AntiBot);
                let metadata = ItemMetadata {
                    http_code: data.http_code,
                    user_agent: data.user_agent.clone(),
                    error_message: data.message.clone(),
                    ..ItemMetadata::default()
                };
                if metadata != ItemMetadata::default() {
                    patch.metadata = Some(metadata);
                }
                Some(EventChange::Item(item_id.clone(), patch))
            }
            LiveEventKind::JobProgress { data } => Some(EventChange::Job(JobPatch {
                status: data.status,
                progress: data.progress,
                items_processed: data.items_processed,
                total_items: data.total_items,
                grand_total: data.grand_total,
                ..JobPatch::default()
            })),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventChange {
    Item(ItemId, ItemPatch),
    Job(JobPatch),
}

fn payload<T: DeserializeOwned + Default>(kind: &'static str, data: &Value) -> Result<T, EventError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data.clone()).map_err(|err| EventError::Payload {
        kind,
        message: err.to_string(),
    })
}
