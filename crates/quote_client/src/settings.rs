use std::path::PathBuf;
use std::time::Duration;

use quote_core::ReconnectPolicy;
use url::Url;

/// Placeholder replaced by the job id in the live-update URL template.
pub const JOB_ID_PLACEHOLDER: &str = "{jobId}";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub ws_url_template: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_artifact_bytes: u64,
    pub output_dir: PathBuf,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            ws_url_template: format!("ws://localhost:3000/ws/jobs/{JOB_ID_PLACEHOLDER}"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_artifact_bytes: 50 * 1024 * 1024,
            output_dir: PathBuf::from("."),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Resolves the live-update URL for one job.
///
/// The job id is always one escaped path segment, matching the REST paths. Templates
/// without the placeholder get it appended as a final segment.
pub fn live_url(template: &str, job_id: &str) -> Result<Url, url::ParseError> {
    if template.contains(JOB_ID_PLACEHOLDER) {
        let segment = urlencoding::encode(job_id);
        return Url::parse(&template.replace(JOB_ID_PLACEHOLDER, &segment));
    }
    let mut url = Url::parse(template)?;
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(job_id);
    }
    Ok(url)
}
