use crate::parse::{parse_input, ParsedInput};
use crate::store::{reduce, StoreAction, StoreState};
use crate::timeline::{Notification, TimelineEntry, Tone};
use crate::view_model::{self, AppViewModel, InputView, SortOrder};
use crate::{JobId, JobOptions, LinkStatus, LiveEvent};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    store: StoreState,
    input_text: String,
    parsed: Vec<ParsedInput>,
    options: JobOptions,
    live_job: Option<JobId>,
    link: LinkStatus,
    timeline: Vec<TimelineEntry>,
    next_timeline_id: u64,
    rejected_frames: u64,
    notifications: Vec<Notification>,
    next_notification_id: u64,
    search: String,
    sort: SortOrder,
    exporting: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            input: InputView::new(&self.parsed),
            options: self.options,
            jobs: view_model::jobs_list(&self.store.jobs, &self.search, self.sort),
            search: self.search.clone(),
            sort: self.sort,
            current: self.store.current_job.as_ref().map(view_model::job_detail),
            timeline: view_model::timeline(&self.timeline),
            notifications: self.notifications.clone(),
            link: self.link,
            rejected_frames: self.rejected_frames,
            is_loading: self.store.is_loading,
            exporting: self.exporting,
            error: self.store.error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn store(&self) -> &StoreState {
        &self.store
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn parsed(&self) -> &[ParsedInput] {
        &self.parsed
    }

    pub fn options(&self) -> JobOptions {
        self.options
    }

    pub fn live_job(&self) -> Option<&str> {
        self.live_job.as_deref()
    }

    /// Returns whether a redraw is pending and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn dispatch(&mut self, action: StoreAction) {
        let store = std::mem::take(&mut self.store);
        self.store = reduce(store, action);
        self.mark_dirty();
    }

    pub(crate) fn set_input(&mut self, text: String) {
        self.parsed = if text.trim().is_empty() {
            Vec::new()
        } else {
            parse_input(&text)
        };
        self.input_text = text;
        self.mark_dirty();
    }

    pub(crate) fn set_options(&mut self, options: JobOptions) {
        self.options = options;
        self.mark_dirty();
    }

    pub(crate) fn open_live(&mut self, job_id: JobId) {
        self.live_job = Some(job_id);
        self.timeline.clear();
        self.rejected_frames = 0;
        self.mark_dirty();
    }

    pub(crate) fn close_live(&mut self) {
        self.live_job = None;
        self.link = LinkStatus::Disconnected;
        self.timeline.clear();
        self.mark_dirty();
    }

    pub(crate) fn set_link(&mut self, status: LinkStatus) {
        self.link = status;
        self.mark_dirty();
    }

    pub(crate) fn push_timeline(&mut self, event: &LiveEvent, received_at: String) {
        self.next_timeline_id += 1;
        self.timeline.push(TimelineEntry::from_event(
            self.next_timeline_id,
            event,
            received_at,
        ));
        self.mark_dirty();
    }

    pub(crate) fn count_rejected_frame(&mut self) {
        self.rejected_frames += 1;
        self.mark_dirty();
    }

    pub(crate) fn notify(&mut self, title: impl Into<String>, description: impl Into<String>, tone: Tone) {
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id: self.next_notification_id,
            title: title.into(),
            description: description.into(),
            tone,
        });
        self.mark_dirty();
    }

    pub(crate) fn dismiss(&mut self, id: u64) {
        let before = self.notifications.len();
        self.notifications.retain(|note| note.id != id);
        if self.notifications.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_search(&mut self, search: String) {
        self.search = search;
        self.mark_dirty();
    }

    pub(crate) fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.mark_dirty();
    }

    pub(crate) fn set_exporting(&mut self, exporting: bool) {
        self.exporting = exporting;
        self.mark_dirty();
    }
}
