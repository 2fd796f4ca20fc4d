//! StealthQuote core: data model, input parsing, live events and the pure
//! update loop that keeps the client-side job store in sync.
mod effect;
mod event;
mod link;
mod msg;
mod parse;
mod state;
mod store;
mod timeline;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use event::{
    AntiBotData, EventChange, EventError, ItemFailure, ItemProgressData, ItemResult,
    ItemStartedData, JobProgressData, LiveEvent, LiveEventKind,
};
pub use link::{CloseOutcome, LinkMachine, LinkStatus, ReconnectPolicy};
pub use msg::{Msg, Outcome};
pub use parse::{
    is_http_url, parse_input, submittable_items, summarize, ParseSummary, ParsedInput, RowError,
    INPUT_TEMPLATE,
};
pub use state::AppState;
pub use store::{reduce, StoreAction, StoreState};
pub use timeline::{tone_for_event_type, Notification, TimelineEntry, Tone};
pub use types::{
    CreateJobRequest, ExportTicket, ItemId, ItemMetadata, ItemPatch, ItemStatus, Job, JobId,
    JobOptions, JobPatch, JobStatus, NewItem, PdfExportOptions, ProductItem, RetryRequest,
};
pub use update::update;
pub use view_model::{
    estimated_pdf_pages, grand_total, item_card, job_detail, jobs_list, retryable_count,
    status_badge, summary_table, timeline, AppViewModel, InputRowView, InputView, ItemActions,
    ItemCardView, JobDetailView, JobRowView, SortOrder, StatusBadge, SummaryRow, SummaryView,
    TimelineView,
};
