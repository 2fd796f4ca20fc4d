use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use quote_client::{ClientEvent, ClientHandle};
use quote_core::{Effect, LinkStatus, Msg};
use quote_logging::{quote_debug, quote_info, quote_warn};

/// Executes effects against the client and turns its results back into messages.
pub struct EffectRunner {
    client: ClientHandle,
    live_enabled: bool,
    csv_out: Option<PathBuf>,
    pending: usize,
    queued: VecDeque<Msg>,
}

impl EffectRunner {
    pub fn new(client: ClientHandle, live_enabled: bool) -> Self {
        Self {
            client,
            live_enabled,
            csv_out: None,
            pending: 0,
            queued: VecDeque::new(),
        }
    }

    /// Destination for the next CSV export instead of the output directory.
    pub fn set_csv_out(&mut self, out: Option<PathBuf>) {
        self.csv_out = out;
    }

    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.queued.is_empty()
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::CreateJob(request) => {
                quote_info!("CreateJob items={}", request.items.len());
                self.pending += 1;
                self.client.create_job(request.items, request.options);
            }
            Effect::FetchJobs => {
                self.pending += 1;
                self.client.list_jobs();
            }
            Effect::FetchJob { job_id } => {
                self.pending += 1;
                self.client.get_job(job_id);
            }
            Effect::RetryJob { job_id, item_ids } => {
                quote_info!("RetryJob job_id={} items={:?}", job_id, item_ids);
                self.pending += 1;
                self.client.retry_job(job_id, item_ids);
            }
            Effect::PatchItem {
                job_id,
                item_id,
                patch,
            } => {
                self.pending += 1;
                self.client.update_item(job_id, item_id, patch);
            }
            Effect::RequestPdfExport(options) => {
                self.pending += 1;
                self.client.request_pdf_export(options);
            }
            Effect::DownloadPdf { job_id, export_id } => {
                self.pending += 1;
                self.client.download_pdf(job_id, export_id);
            }
            Effect::ExportCsv { job_id } => {
                self.pending += 1;
                self.client.export_csv(job_id, self.csv_out.take());
            }
            Effect::ConnectLive { job_id } => {
                if !self.live_enabled {
                    quote_debug!("Live updates disabled; not watching {}", job_id);
                    return;
                }
                if let Err(err) = self.client.connect_live(job_id) {
                    quote_warn!("Cannot open live connection: {}", err);
                    self.queued.push_back(Msg::ConnectionChanged(LinkStatus::Failed));
                }
            }
            Effect::DisconnectLive => self.client.disconnect_live(),
        }
    }

    /// Next message for the update loop, waiting up to `timeout` for the client.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        if let Some(msg) = self.queued.pop_front() {
            return Some(msg);
        }
        let event = self.client.recv_timeout(timeout)?;
        if completes_request(&event) {
            self.pending = self.pending.saturating_sub(1);
        }
        Some(event_to_msg(event, || Utc::now().to_rfc3339()))
    }
}

fn completes_request(event: &ClientEvent) -> bool {
    !matches!(
        event,
        ClientEvent::Live(_) | ClientEvent::LiveRejected(_) | ClientEvent::Link(_)
    )
}

/// Maps a client result to the message the update loop expects.
///
/// Errors travel as their display text, which is what the user sees.
pub fn event_to_msg(event: ClientEvent, now: impl FnOnce() -> String) -> Msg {
    match event {
        ClientEvent::JobCreated(result) => Msg::JobCreated(result.map_err(|err| err.to_string())),
        ClientEvent::JobsLoaded(result) => Msg::JobsLoaded(result.map_err(|err| err.to_string())),
        ClientEvent::JobLoaded(result) => Msg::JobLoaded(result.map_err(|err| err.to_string())),
        ClientEvent::RetryFinished {
            item_ids, result, ..
        } => Msg::RetryFinished {
            item_id: item_ids.and_then(|ids| ids.into_iter().next()),
            result: result.map_err(|err| err.to_string()),
        },
        ClientEvent::ItemPatched {
            job_id,
            item_id,
            patch,
            result,
        } => Msg::ItemPatched {
            job_id,
            item_id,
            patch,
            result: result.map_err(|err| err.to_string()),
        },
        ClientEvent::PdfExportReady { job_id, result } => Msg::PdfExportReady {
            job_id,
            result: result.map_err(|err| err.to_string()),
        },
        ClientEvent::PdfSaved(result) => Msg::PdfSaved(
            result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        ),
        ClientEvent::CsvExported(result) => Msg::CsvExported(
            result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        ),
        ClientEvent::Live(event) => Msg::LiveEventReceived {
            event,
            received_at: now(),
        },
        ClientEvent::LiveRejected(err) => Msg::LiveFrameRejected {
            reason: err.to_string(),
        },
        ClientEvent::Link(status) => Msg::ConnectionChanged(status),
    }
}
