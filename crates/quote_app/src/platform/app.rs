use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use quote_core::{
    update, AppState, AppViewModel, JobStatus, LinkStatus, Msg, Tone, INPUT_TEMPLATE,
};
use quote_logging::quote_debug;

use super::effects::EffectRunner;
use super::render;
use crate::cli::{pdf_options, Command};

const REQUEST_WAIT: Duration = Duration::from_secs(120);
const POLL: Duration = Duration::from_millis(100);

/// Drives the update loop for one command and prints what changed.
pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    shown_notification: u64,
    shown_timeline: u64,
    shown_link: LinkStatus,
}

impl<W: Write> App<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            out,
            shown_notification: 0,
            shown_timeline: 0,
            shown_link: LinkStatus::Disconnected,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        if dirty {
            let view = self.state.view();
            self.render_changes(&view)?;
        }
        Ok(())
    }

    /// Pumps messages until every issued request has answered.
    pub fn settle(&mut self) -> Result<()> {
        let deadline = Instant::now() + REQUEST_WAIT;
        while !self.runner.is_idle() {
            if Instant::now() >= deadline {
                bail!("timed out waiting for the server");
            }
            if let Some(msg) = self.runner.next_msg(POLL) {
                self.dispatch(msg)?;
            }
        }
        Ok(())
    }

    /// Prints notifications, timeline entries and link changes not shown yet.
    fn render_changes(&mut self, view: &AppViewModel) -> Result<()> {
        for note in &view.notifications {
            if note.id > self.shown_notification {
                writeln!(self.out, "{}", render::notification(note))?;
                self.shown_notification = note.id;
            }
        }
        for entry in &view.timeline.entries {
            if entry.id > self.shown_timeline {
                writeln!(self.out, "{}", render::timeline_entry(entry))?;
                self.shown_timeline = entry.id;
            }
        }
        if view.link != self.shown_link {
            writeln!(self.out, "{}", render::link(view.link))?;
            self.shown_link = view.link;
        }
        Ok(())
    }

    /// Fails with the first destructive notification raised after `since`.
    fn check_failures(&self, since: u64) -> Result<()> {
        let view = self.state.view();
        match view
            .notifications
            .iter()
            .find(|note| note.id > since && note.tone == Tone::Destructive)
        {
            Some(note) => Err(anyhow!("{}: {}", note.title, note.description)),
            None => Ok(()),
        }
    }

    fn mark(&self) -> u64 {
        self.shown_notification
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Template => {
                write!(self.out, "{INPUT_TEMPLATE}")?;
                Ok(())
            }
            Command::Submit {
                file,
                options,
                watch,
            } => {
                let text = match file {
                    Some(path) => read_input_file(&path)?,
                    None => {
                        let mut text = String::new();
                        io::stdin()
                            .read_to_string(&mut text)
                            .context("reading URL list from stdin")?;
                        text
                    }
                };
                self.submit(text, options.into(), watch)
            }
            Command::Jobs { search, sort } => {
                let mark = self.mark();
                self.dispatch(Msg::SearchChanged(search))?;
                self.dispatch(Msg::SortChanged(sort.into()))?;
                self.dispatch(Msg::JobsRequested)?;
                self.settle()?;
                self.check_failures(mark)?;
                let view = self.state.view();
                write!(self.out, "{}", render::jobs(&view.jobs))?;
                Ok(())
            }
            Command::Show { job } => {
                self.open(&job)?;
                self.print_current()
            }
            Command::Watch { job } => {
                self.open(&job)?;
                self.print_current()?;
                self.watch()
            }
            Command::Retry { job, items } => {
                self.open(&job)?;
                let mark = self.mark();
                if items.is_empty() {
                    self.dispatch(Msg::RetryClicked { item_id: None })?;
                } else {
                    for item_id in items {
                        self.dispatch(Msg::RetryClicked {
                            item_id: Some(item_id),
                        })?;
                    }
                }
                self.settle()?;
                self.check_failures(mark)
            }
            Command::Edit {
                job,
                item,
                name,
                price,
            } => {
                self.open(&job)?;
                let mark = self.mark();
                self.dispatch(Msg::ItemEdited {
                    item_id: item,
                    name,
                    unit_price: price,
                })?;
                self.settle()?;
                self.check_failures(mark)?;
                self.print_summary()
            }
            Command::Include { job, item, exclude } => {
                self.open(&job)?;
                let mark = self.mark();
                self.dispatch(Msg::InclusionToggled {
                    item_id: item,
                    include: !exclude,
                })?;
                self.settle()?;
                self.check_failures(mark)?;
                self.print_summary()
            }
            Command::ExportPdf {
                job,
                no_appendix,
                no_watermark,
                audit_log,
            } => {
                self.open(&job)?;
                let options = pdf_options(&job, no_appendix, no_watermark, audit_log);
                if let Some(current) = &self.state.store().current_job {
                    writeln!(
                        self.out,
                        "Estimated pages: {}",
                        quote_core::estimated_pdf_pages(&current.items, &options)
                    )?;
                }
                let mark = self.mark();
                self.dispatch(Msg::PdfExportClicked(options))?;
                self.settle()?;
                self.check_failures(mark)
            }
            Command::ExportCsv { job, out } => {
                self.open(&job)?;
                let mark = self.mark();
                self.runner.set_csv_out(out);
                self.dispatch(Msg::CsvExportClicked)?;
                self.settle()?;
                self.check_failures(mark)
            }
        }
    }

    pub fn submit(&mut self, text: String, options: quote_core::JobOptions, watch: bool) -> Result<()> {
        self.dispatch(Msg::InputChanged(text))?;
        self.dispatch(Msg::OptionsChanged(options))?;
        let view = self.state.view();
        write!(self.out, "{}", render::input(&view.input))?;

        let mark = self.mark();
        self.dispatch(Msg::SubmitClicked)?;
        self.settle()?;
        self.check_failures(mark)?;

        let job_id = self
            .state
            .live_job()
            .map(ToOwned::to_owned)
            .ok_or_else(|| anyhow!("no job was created"))?;
        writeln!(self.out, "Job {job_id}")?;
        if watch {
            self.print_current()?;
            self.watch()?;
        }
        Ok(())
    }

    fn open(&mut self, job_id: &str) -> Result<()> {
        let mark = self.mark();
        self.dispatch(Msg::JobOpened {
            job_id: job_id.to_string(),
        })?;
        self.settle()?;
        self.check_failures(mark)?;
        if self.state.store().current_job.is_none() {
            bail!("job {job_id} not found");
        }
        Ok(())
    }

    fn print_current(&mut self) -> Result<()> {
        let view = self.state.view();
        if let Some(current) = &view.current {
            write!(self.out, "{}", render::job(current))?;
        }
        Ok(())
    }

    fn print_summary(&mut self) -> Result<()> {
        let view = self.state.view();
        if let Some(current) = &view.current {
            write!(self.out, "{}", render::summary(&current.summary))?;
        }
        Ok(())
    }

    /// Follows live events until the job settles or the connection gives up.
    fn watch(&mut self) -> Result<()> {
        loop {
            if let Some(msg) = self.runner.next_msg(POLL) {
                self.dispatch(msg)?;
            }
            let finished = self
                .state
                .store()
                .current_job
                .as_ref()
                .is_some_and(|job| is_settled(job.status));
            let link = self.state.view().link;
            if finished || link == LinkStatus::Failed {
                quote_debug!("Watch ends: finished={} link={}", finished, link.label());
                break;
            }
        }
        self.dispatch(Msg::JobClosed)?;
        writeln!(self.out)?;
        self.print_current()
    }
}

fn is_settled(status: JobStatus) -> bool {
    matches!(
        status,
        JobStatus::Complete | JobStatus::Partial | JobStatus::Failed
    )
}

fn read_input_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
