use std::time::Duration;

use crate::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Reconnecting {
        attempt: u32,
    },
    /// Retry budget exhausted; only an explicit `connect` leaves this state.
    Failed,
}

impl LinkStatus {
    pub fn label(self) -> String {
        match self {
            LinkStatus::Disconnected => "disconnected".to_string(),
            LinkStatus::Connecting => "connecting".to_string(),
            LinkStatus::Open => "live".to_string(),
            LinkStatus::Reconnecting { attempt } => format!("reconnecting ({attempt})"),
            LinkStatus::Failed => "offline".to_string(),
        }
    }
}

/// Linear backoff: attempt `n` waits `n * base_delay`, up to `max_attempts` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once the budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay * attempt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Reconnect { attempt: u32, delay: Duration },
    GiveUp,
    /// No job targeted; the close was expected.
    Idle,
}

/// Connection lifecycle for one targeted job, independent of any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMachine {
    policy: ReconnectPolicy,
    status: LinkStatus,
    job_id: Option<JobId>,
    attempts: u32,
}

impl LinkMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            status: LinkStatus::Disconnected,
            job_id: None,
            attempts: 0,
        }
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub fn connect(&mut self, job_id: impl Into<JobId>) {
        self.job_id = Some(job_id.into());
        self.attempts = 0;
        self.status = LinkStatus::Connecting;
    }

    pub fn opened(&mut self) {
        if self.job_id.is_some() {
            self.attempts = 0;
            self.status = LinkStatus::Open;
        }
    }

    /// Handles any close, including a failed connection attempt.
    pub fn closed(&mut self) -> CloseOutcome {
        if self.job_id.is_none() {
            self.status = LinkStatus::Disconnected;
            return CloseOutcome::Idle;
        }
        let attempt = self.attempts + 1;
        match self.policy.delay_for(attempt) {
            Some(delay) => {
                self.attempts = attempt;
                self.status = LinkStatus::Reconnecting { attempt };
                CloseOutcome::Reconnect { attempt, delay }
            }
            None => {
                self.status = LinkStatus::Failed;
                CloseOutcome::GiveUp
            }
        }
    }

    /// Called when a reconnect timer fires. Returns the job to dial, if still wanted.
    pub fn reconnect_due(&mut self) -> Option<JobId> {
        match (self.status, &self.job_id) {
            (LinkStatus::Reconnecting { .. }, Some(job_id)) => {
                self.status = LinkStatus::Connecting;
                Some(job_id.clone())
            }
            _ => None,
        }
    }

    pub fn disconnect(&mut self) {
        self.job_id = None;
        self.attempts = 0;
        self.status = LinkStatus::Disconnected;
    }
}

impl Default for LinkMachine {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
