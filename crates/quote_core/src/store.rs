use crate::{ItemId, ItemPatch, Job, JobId, JobPatch};

/// Client-side cache of jobs. Views read it; only `reduce` writes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreState {
    pub jobs: Vec<Job>,
    pub current_job: Option<Job>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    SetJobs(Vec<Job>),
    AddJob(Job),
    UpdateJob {
        job_id: JobId,
        patch: JobPatch,
    },
    SetCurrentJob(Option<Job>),
    UpdateItem {
        job_id: JobId,
        item_id: ItemId,
        patch: ItemPatch,
    },
    SetLoading(bool),
    SetError(Option<String>),
    ClearError,
}

/// Applies one action. Every merge touches only the fields the action names,
/// and the list entry and current job for the same id receive the same merge.
/// Job aggregates are never recomputed here; they come from the backend.
pub fn reduce(mut state: StoreState, action: StoreAction) -> StoreState {
    match action {
        StoreAction::SetJobs(jobs) => state.jobs = jobs,
        StoreAction::AddJob(job) => state.jobs.insert(0, job),
        StoreAction::UpdateJob { job_id, patch } => {
            for job in state.jobs.iter_mut().filter(|job| job.id == job_id) {
                job.apply(&patch);
            }
            if let Some(current) = state.current_job.as_mut().filter(|job| job.id == job_id) {
                current.apply(&patch);
            }
        }
        StoreAction::SetCurrentJob(job) => state.current_job = job,
        StoreAction::UpdateItem {
            job_id,
            item_id,
            patch,
        } => {
            for job in state.jobs.iter_mut().filter(|job| job.id == job_id) {
                job.apply_item(&item_id, &patch);
            }
            if let Some(current) = state.current_job.as_mut().filter(|job| job.id == job_id) {
                current.apply_item(&item_id, &patch);
            }
        }
        StoreAction::SetLoading(loading) => state.is_loading = loading,
        StoreAction::SetError(error) => state.error = error,
        StoreAction::ClearError => state.error = None,
    }
    state
}

impl StoreState {
    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.current_job
            .as_ref()
            .filter(|job| job.id == job_id)
            .or_else(|| self.jobs.iter().find(|job| job.id == job_id))
    }
}
