use crate::{CreateJobRequest, ItemId, ItemPatch, JobId, PdfExportOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreateJob(CreateJobRequest),
    FetchJobs,
    FetchJob {
        job_id: JobId,
    },
    RetryJob {
        job_id: JobId,
        item_ids: Option<Vec<ItemId>>,
    },
    PatchItem {
        job_id: JobId,
        item_id: ItemId,
        patch: ItemPatch,
    },
    RequestPdfExport(PdfExportOptions),
    DownloadPdf {
        job_id: JobId,
        export_id: String,
    },
    ExportCsv {
        job_id: JobId,
    },
    ConnectLive {
        job_id: JobId,
    },
    DisconnectLive,
}
