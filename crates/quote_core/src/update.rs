use crate::event::EventChange;
use crate::parse::submittable_items;
use crate::store::StoreAction;
use crate::timeline::Tone;
use crate::{AppState, CreateJobRequest, Effect, ItemPatch, LinkStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::OptionsChanged(options) => {
            state.set_options(options);
            Vec::new()
        }
        Msg::SubmitClicked => {
            let items = submittable_items(state.parsed());
            if items.is_empty() {
                state.notify(
                    "Invalid input",
                    "Please provide at least one valid product URL",
                    Tone::Destructive,
                );
                return (state, Vec::new());
            }
            state.dispatch(StoreAction::SetLoading(true));
            vec![Effect::CreateJob(CreateJobRequest {
                items,
                options: state.options(),
            })]
        }
        Msg::JobCreated(result) => {
            state.dispatch(StoreAction::SetLoading(false));
            match result {
                Ok(job) => {
                    let count = if job.total_items > 0 {
                        job.total_items as usize
                    } else {
                        job.items.len()
                    };
                    state.notify(
                        "Job created successfully",
                        format!("Processing {count} items"),
                        Tone::Success,
                    );
                    let job_id = job.id.clone();
                    state.dispatch(StoreAction::AddJob(job));
                    open_job(&mut state, job_id)
                }
                Err(message) => {
                    state.notify("Failed to create job", message, Tone::Destructive);
                    Vec::new()
                }
            }
        }
        Msg::JobsRequested => {
            state.dispatch(StoreAction::SetLoading(true));
            vec![Effect::FetchJobs]
        }
        Msg::JobsLoaded(result) => {
            state.dispatch(StoreAction::SetLoading(false));
            match result {
                Ok(jobs) => {
                    state.dispatch(StoreAction::ClearError);
                    state.dispatch(StoreAction::SetJobs(jobs));
                }
                Err(message) => {
                    state.dispatch(StoreAction::SetError(Some(message.clone())));
                    state.notify("Failed to load jobs", message, Tone::Destructive);
                }
            }
            Vec::new()
        }
        Msg::JobOpened { job_id } => open_job(&mut state, job_id),
        Msg::JobLoaded(result) => {
            state.dispatch(StoreAction::SetLoading(false));
            match result {
                Ok(job) => {
                    state.dispatch(StoreAction::ClearError);
                    state.dispatch(StoreAction::SetCurrentJob(Some(job)));
                }
                Err(message) => {
                    state.dispatch(StoreAction::SetError(Some(message.clone())));
                    state.notify("Failed to load job", message, Tone::Destructive);
                }
            }
            Vec::new()
        }
        Msg::JobClosed => {
            if state.live_job().is_none() {
                return (state, Vec::new());
            }
            state.close_live();
            vec![Effect::DisconnectLive]
        }
        Msg::RetryClicked { item_id } => match current_job_id(&state) {
            Some(job_id) => vec![Effect::RetryJob {
                job_id,
                item_ids: item_id.map(|id| vec![id]),
            }],
            None => Vec::new(),
        },
        Msg::RetryFinished { item_id, result } => {
            match result {
                Ok(job) => {
                    state.dispatch(StoreAction::SetCurrentJob(Some(job)));
                    let description = if item_id.is_some() {
                        "Retrying item"
                    } else {
                        "Retrying failed items"
                    };
                    state.notify("Retry initiated", description, Tone::Default);
                }
                Err(message) => state.notify("Retry failed", message, Tone::Destructive),
            }
            Vec::new()
        }
        Msg::ItemEdited {
            item_id,
            name,
            unit_price,
        } => {
            if !unit_price.is_finite() || unit_price < 0.0 {
                state.notify(
                    "Invalid price",
                    "Unit price must be a non-negative number",
                    Tone::Destructive,
                );
                return (state, Vec::new());
            }
            let Some(job) = state.store().current_job.as_ref() else {
                return (state, Vec::new());
            };
            let quantity = job
                .item(&item_id)
                .map(|item| item.quantity)
                .filter(|quantity| *quantity > 0)
                .unwrap_or(1);
            let patch = ItemPatch {
                product_name: Some(name),
                unit_price: Some(unit_price),
                total_price: Some(unit_price * f64::from(quantity)),
                ..ItemPatch::default()
            };
            vec![Effect::PatchItem {
                job_id: job.id.clone(),
                item_id,
                patch,
            }]
        }
        Msg::InclusionToggled { item_id, include } => match current_job_id(&state) {
            Some(job_id) => vec![Effect::PatchItem {
                job_id,
                item_id,
                patch: ItemPatch {
                    include_in_pdf: Some(include),
                    ..ItemPatch::default()
                },
            }],
            None => Vec::new(),
        },
        Msg::ItemPatched {
            job_id,
            item_id,
            patch,
            result,
        } => {
            match result {
                Ok(_) => {
                    state.dispatch(StoreAction::UpdateItem {
                        job_id,
                        item_id,
                        patch,
                    });
                    state.notify("Item updated", "Changes saved successfully", Tone::Success);
                }
                Err(message) => state.notify("Update failed", message, Tone::Destructive),
            }
            Vec::new()
        }
        Msg::PdfExportClicked(options) => {
            state.set_exporting(true);
            vec![Effect::RequestPdfExport(options)]
        }
        Msg::PdfExportReady { job_id, result } => match result {
            Ok(ticket) => vec![Effect::DownloadPdf {
                job_id,
                export_id: ticket.export_id,
            }],
            Err(message) => {
                state.set_exporting(false);
                state.notify("Export failed", message, Tone::Destructive);
                Vec::new()
            }
        },
        Msg::PdfSaved(result) => {
            state.set_exporting(false);
            match result {
                Ok(path) => state.notify(
                    "PDF generated successfully",
                    format!("Saved to {path}"),
                    Tone::Success,
                ),
                Err(message) => state.notify("Export failed", message, Tone::Destructive),
            }
            Vec::new()
        }
        Msg::CsvExportClicked => match current_job_id(&state) {
            Some(job_id) => vec![Effect::ExportCsv { job_id }],
            None => Vec::new(),
        },
        Msg::CsvExported(result) => {
            match result {
                Ok(path) => state.notify("CSV exported", format!("Saved to {path}"), Tone::Success),
                Err(message) => state.notify("Export failed", message, Tone::Destructive),
            }
            Vec::new()
        }
        Msg::LiveEventReceived { event, received_at } => {
            // Frames from a connection we already left are stale.
            if state.live_job() != Some(event.job_id.as_str()) {
                return (state, Vec::new());
            }
            state.push_timeline(&event, received_at);
            match event.store_change() {
                Some(EventChange::Item(item_id, patch)) => state.dispatch(StoreAction::UpdateItem {
                    job_id: event.job_id,
                    item_id,
                    patch,
                }),
                Some(EventChange::Job(patch)) => state.dispatch(StoreAction::UpdateJob {
                    job_id: event.job_id,
                    patch,
                }),
                None => {}
            }
            Vec::new()
        }
        Msg::LiveFrameRejected { reason: _ } => {
            state.count_rejected_frame();
            Vec::new()
        }
        Msg::ConnectionChanged(status) => {
            if status == LinkStatus::Failed && state.live_job().is_some() {
                state.notify(
                    "Live updates unavailable",
                    "Connection lost; refresh the job to see the latest state",
                    Tone::Warning,
                );
            }
            state.set_link(status);
            Vec::new()
        }
        Msg::SearchChanged(search) => {
            state.set_search(search);
            Vec::new()
        }
        Msg::SortChanged(sort) => {
            state.set_sort(sort);
            Vec::new()
        }
        Msg::NotificationDismissed(id) => {
            state.dismiss(id);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn open_job(state: &mut AppState, job_id: String) -> Vec<Effect> {
    state.dispatch(StoreAction::SetLoading(true));
    state.open_live(job_id.clone());
    vec![
        Effect::FetchJob {
            job_id: job_id.clone(),
        },
        Effect::ConnectLive { job_id },
    ]
}

fn current_job_id(state: &AppState) -> Option<String> {
    state.store().current_job.as_ref().map(|job| job.id.clone())
}
