use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use quote_core::{
    EventError, ExportTicket, ItemId, ItemPatch, Job, JobId, JobOptions, LinkStatus, LiveEvent,
    NewItem, PdfExportOptions, ProductItem,
};
use quote_logging::quote_error;

use crate::filename::{csv_filename, pdf_filename};
use crate::live::{EventSink, LiveClient, LiveError};
use crate::{ApiError, ArtifactError, ArtifactWriter, BomApi, ClientError, ClientSettings, ReqwestApi};

/// Results coming back from the background client, in completion order.
#[derive(Debug)]
pub enum ClientEvent {
    JobCreated(Result<Job, ApiError>),
    JobsLoaded(Result<Vec<Job>, ApiError>),
    JobLoaded(Result<Job, ApiError>),
    RetryFinished {
        job_id: JobId,
        item_ids: Option<Vec<ItemId>>,
        result: Result<Job, ApiError>,
    },
    ItemPatched {
        job_id: JobId,
        item_id: ItemId,
        patch: ItemPatch,
        result: Result<ProductItem, ApiError>,
    },
    PdfExportReady {
        job_id: JobId,
        result: Result<ExportTicket, ApiError>,
    },
    PdfSaved(Result<PathBuf, ArtifactError>),
    CsvExported(Result<PathBuf, ArtifactError>),
    Live(LiveEvent),
    LiveRejected(EventError),
    Link(LinkStatus),
}

enum ClientCommand {
    CreateJob {
        items: Vec<NewItem>,
        options: JobOptions,
    },
    ListJobs,
    GetJob {
        job_id: JobId,
    },
    RetryJob {
        job_id: JobId,
        item_ids: Option<Vec<ItemId>>,
    },
    UpdateItem {
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
        out: Option<PathBuf>,
    },
}

/// Runs REST calls and the live connection on a background tokio runtime.
///
/// Calls return immediately; results arrive as [`ClientEvent`]s.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: mpsc::Receiver<ClientEvent>,
    event_tx: mpsc::Sender<ClientEvent>,
    live: LiveClient,
}

impl ClientHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let api = Arc::new(ReqwestApi::new(&settings)?);
        Self::with_api(settings, api)
    }

    /// Uses a caller-supplied REST client, e.g. a test double.
    pub fn with_api(settings: ClientSettings, api: Arc<dyn BomApi>) -> Result<Self, ClientError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("stealthquote-client")
            .build()?;
        let live = LiveClient::new(&settings, runtime.handle().clone());
        let writer = ArtifactWriter::new(settings.output_dir.clone());

        let worker_tx = event_tx.clone();
        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let writer = writer.clone();
                let event_tx = worker_tx.clone();
                runtime.spawn(async move {
                    let event = handle_command(api.as_ref(), &writer, command).await;
                    let _ = event_tx.send(event);
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            event_tx,
            live,
        })
    }

    fn submit(&self, command: ClientCommand) {
        if self.cmd_tx.send(command).is_err() {
            quote_error!("Client worker is gone; request dropped");
        }
    }

    pub fn create_job(&self, items: Vec<NewItem>, options: JobOptions) {
        self.submit(ClientCommand::CreateJob { items, options });
    }

    pub fn list_jobs(&self) {
        self.submit(ClientCommand::ListJobs);
    }

    pub fn get_job(&self, job_id: impl Into<JobId>) {
        self.submit(ClientCommand::GetJob {
            job_id: job_id.into(),
        });
    }

    pub fn retry_job(&self, job_id: impl Into<JobId>, item_ids: Option<Vec<ItemId>>) {
        self.submit(ClientCommand::RetryJob {
            job_id: job_id.into(),
            item_ids,
        });
    }

    pub fn update_item(&self, job_id: impl Into<JobId>, item_id: impl Into<ItemId>, patch: ItemPatch) {
        self.submit(ClientCommand::UpdateItem {
            job_id: job_id.into(),
            item_id: item_id.into(),
            patch,
        });
    }

    pub fn request_pdf_export(&self, options: PdfExportOptions) {
        self.submit(ClientCommand::RequestPdfExport(options));
    }

    /// Downloads a finished export into the output directory.
    pub fn download_pdf(&self, job_id: impl Into<JobId>, export_id: impl Into<String>) {
        self.submit(ClientCommand::DownloadPdf {
            job_id: job_id.into(),
            export_id: export_id.into(),
        });
    }

    /// `out` overrides the default `bom-{job}.csv` in the output directory.
    pub fn export_csv(&self, job_id: impl Into<JobId>, out: Option<PathBuf>) {
        self.submit(ClientCommand::ExportCsv {
            job_id: job_id.into(),
            out,
        });
    }

    /// Watches one job; live events and link changes arrive as client events.
    pub fn connect_live(&self, job_id: impl Into<JobId>) -> Result<(), LiveError> {
        // Dropping the old subscription keeps exactly one forwarding sink.
        self.live.disconnect();
        self.live.subscribe(Arc::new(ChannelSink {
            tx: self.event_tx.clone(),
        }));
        self.live.connect(job_id)
    }

    pub fn disconnect_live(&self) {
        self.live.disconnect();
    }

    pub fn live(&self) -> &LiveClient {
        &self.live
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct ChannelSink {
    tx: mpsc::Sender<ClientEvent>,
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: &LiveEvent) {
        let _ = self.tx.send(ClientEvent::Live(event.clone()));
    }

    fn rejected(&self, error: &EventError) {
        let _ = self.tx.send(ClientEvent::LiveRejected(error.clone()));
    }

    fn status_changed(&self, status: LinkStatus) {
        let _ = self.tx.send(ClientEvent::Link(status));
    }
}

async fn handle_command(api: &dyn BomApi, writer: &ArtifactWriter, command: ClientCommand) -> ClientEvent {
    match command {
        ClientCommand::CreateJob { items, options } => {
            ClientEvent::JobCreated(api.create_job(&items, &options).await)
        }
        ClientCommand::ListJobs => ClientEvent::JobsLoaded(api.list_jobs().await),
        ClientCommand::GetJob { job_id } => ClientEvent::JobLoaded(api.get_job(&job_id).await),
        ClientCommand::RetryJob { job_id, item_ids } => {
            let result = api.retry_job(&job_id, item_ids.as_deref()).await;
            ClientEvent::RetryFinished {
                job_id,
                item_ids,
                result,
            }
        }
        ClientCommand::UpdateItem {
            job_id,
            item_id,
            patch,
        } => {
            let result = api.update_item(&job_id, &item_id, &patch).await;
            ClientEvent::ItemPatched {
                job_id,
                item_id,
                patch,
                result,
            }
        }
        ClientCommand::RequestPdfExport(options) => {
            let result = api.request_pdf_export(&options).await;
            ClientEvent::PdfExportReady {
                job_id: options.job_id,
                result,
            }
        }
        ClientCommand::DownloadPdf { job_id, export_id } => {
            ClientEvent::PdfSaved(download_pdf(api, writer, &job_id, &export_id).await)
        }
        ClientCommand::ExportCsv { job_id, out } => {
            ClientEvent::CsvExported(export_csv(api, writer, &job_id, out).await)
        }
    }
}

async fn download_pdf(
    api: &dyn BomApi,
    writer: &ArtifactWriter,
    job_id: &str,
    export_id: &str,
) -> Result<PathBuf, ArtifactError> {
    let url = api.pdf_download_url(job_id, export_id)?;
    let bytes = api.download(&url).await?;
    Ok(writer.write(&pdf_filename(job_id), &bytes)?)
}

async fn export_csv(
    api: &dyn BomApi,
    writer: &ArtifactWriter,
    job_id: &str,
    out: Option<PathBuf>,
) -> Result<PathBuf, ArtifactError> {
    let bytes = api.export_csv(job_id).await?;
    let path = match out {
        Some(path) => ArtifactWriter::write_to(&path, &bytes)?,
        None => writer.write(&csv_filename(job_id), &bytes)?,
    };
    Ok(path)
}
