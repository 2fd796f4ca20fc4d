use serde::{Deserialize, Serialize};

pub type JobId = String;
pub type ItemId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Partial,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Partial => "partial",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Scraping,
    Success,
    Failed,
    AntiBot,
    Duplicate,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Scraping => "scraping",
            ItemStatus::Success => "success",
            ItemStatus::Failed => "failed",
            ItemStatus::AntiBot => "anti-bot",
            ItemStatus::Duplicate => "duplicate",
        }
    }

    /// Items the backend may be asked to scrape again.
    pub fn is_retryable(self) -> bool {
        matches!(self, ItemStatus::Failed | ItemStatus::AntiBot)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ItemMetadata {
    /// Field-wise merge: only fields set on `other` replace ours.
    pub fn merge(&mut self, other: &ItemMetadata) {
        if other.http_code.is_some() {
            self.http_code = other.http_code;
        }
        if other.user_agent.is_some() {
            self.user_agent = other.user_agent.clone();
        }
        if other.retry_count.is_some() {
            self.retry_count = other.retry_count;
        }
        if other.error_message.is_some() {
            self.error_message = other.error_message.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub id: ItemId,
    pub url: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_pdf: Option<bool>,
}

impl ProductItem {
    pub fn new(id: impl Into<ItemId>, url: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            quantity,
            product_name: None,
            unit_price: None,
            total_price: None,
            status: ItemStatus::Pending,
            screenshot: None,
            thumbnail: None,
            timestamp: None,
            metadata: None,
            is_duplicate: None,
            alternative_url: None,
            include_in_pdf: None,
        }
    }

    /// Absent means included.
    pub fn is_included(&self) -> bool {
        self.include_in_pdf != Some(false)
    }

    /// Merges a partial update, leaving every unset field untouched.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(name) = &patch.product_name {
            self.product_name = Some(name.clone());
        }
        if let Some(price) = patch.unit_price {
            self.unit_price = Some(price);
        }
        if let Some(total) = patch.total_price {
            self.total_price = Some(total);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(screenshot) = &patch.screenshot {
            self.screenshot = Some(screenshot.clone());
        }
        if let Some(thumbnail) = &patch.thumbnail {
            self.thumbnail = Some(thumbnail.clone());
        }
        if let Some(timestamp) = &patch.timestamp {
            self.timestamp = Some(timestamp.clone());
        }
        if let Some(metadata) = &patch.metadata {
            self.metadata
                .get_or_insert_with(ItemMetadata::default)
                .merge(metadata);
        }
        if let Some(duplicate) = patch.is_duplicate {
            self.is_duplicate = Some(duplicate);
        }
        if let Some(alternative) = &patch.alternative_url {
            self.alternative_url = Some(alternative.clone());
        }
        if let Some(include) = patch.include_in_pdf {
            self.include_in_pdf = Some(include);
        }
    }
}

/// Partial `ProductItem`, also the body of the item PATCH request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_pdf: Option<bool>,
}

impl ItemPatch {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    pub vendor_dedupe: bool,
    pub lowest_price: bool,
    pub concurrent_jobs: u32,
    pub delay_ms: u64,
    pub user_agent_rotation: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            vendor_dedupe: false,
            lowest_price: true,
            concurrent_jobs: 3,
            delay_ms: 1000,
            user_agent_rotation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub created_at: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub items_processed: u32,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<f64>,
    #[serde(default)]
    pub items: Vec<ProductItem>,
    #[serde(default)]
    pub options: JobOptions,
}

impl Job {
    pub fn item(&self, item_id: &str) -> Option<&ProductItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Merges a job-level partial update. Items are replaced wholesale when present.
    pub fn apply(&mut self, patch: &JobPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(processed) = patch.items_processed {
            self.items_processed = processed;
        }
        if let Some(total) = patch.total_items {
            self.total_items = total;
        }
        if let Some(grand_total) = patch.grand_total {
            self.grand_total = Some(grand_total);
        }
        if let Some(items) = &patch.items {
            self.items = items.clone();
        }
    }

    /// Merges an item update into the matching item; returns false when no item matched.
    pub fn apply_item(&mut self, item_id: &str, patch: &ItemPatch) -> bool {
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.apply(patch);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ProductItem>>,
}

/// One `(url, quantity)` row as sent in the job creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub url: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub items: Vec<NewItem>,
    pub options: JobOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_ids: Option<Vec<ItemId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfExportOptions {
    pub job_id: JobId,
    pub include_appendix: bool,
    pub watermark: bool,
    pub include_audit_log: bool,
}

impl PdfExportOptions {
    pub fn for_job(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            include_appendix: true,
            watermark: true,
            include_audit_log: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTicket {
    pub export_id: String,
}
