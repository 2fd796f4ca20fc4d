use crate::{
    ExportTicket, ItemId, ItemPatch, Job, JobId, JobOptions, LinkStatus, LiveEvent,
    PdfExportOptions, ProductItem, SortOrder,
};

/// Failures arrive as the message carried by the client error.
pub type Outcome<T> = Result<T, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the pasted or uploaded list.
    InputChanged(String),
    /// User changed the scraping options for the next job.
    OptionsChanged(JobOptions),
    /// User asked to create a job from the valid rows.
    SubmitClicked,
    JobCreated(Outcome<Job>),
    /// User opened the job list.
    JobsRequested,
    JobsLoaded(Outcome<Vec<Job>>),
    /// User navigated to one job.
    JobOpened { job_id: JobId },
    JobLoaded(Outcome<Job>),
    /// User left the job detail view.
    JobClosed,
    /// `None` retries every failed item of the current job.
    RetryClicked { item_id: Option<ItemId> },
    RetryFinished {
        item_id: Option<ItemId>,
        result: Outcome<Job>,
    },
    /// Manual name/price correction from the summary table.
    ItemEdited {
        item_id: ItemId,
        name: String,
        unit_price: f64,
    },
    InclusionToggled { item_id: ItemId, include: bool },
    ItemPatched {
        job_id: JobId,
        item_id: ItemId,
        patch: ItemPatch,
        result: Outcome<ProductItem>,
    },
    PdfExportClicked(PdfExportOptions),
    PdfExportReady {
        job_id: JobId,
        result: Outcome<ExportTicket>,
    },
    /// The PDF artifact was stored at the given path.
    PdfSaved(Outcome<String>),
    CsvExportClicked,
    /// The CSV artifact was stored at the given path.
    CsvExported(Outcome<String>),
    /// Live event for the job being watched.
    LiveEventReceived {
        event: LiveEvent,
        received_at: String,
    },
    /// A frame that failed validation; it is counted and dropped.
    LiveFrameRejected { reason: String },
    ConnectionChanged(LinkStatus),
    SearchChanged(String),
    SortChanged(SortOrder),
    NotificationDismissed(u64),
    /// Render tick to coalesce redraws.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
