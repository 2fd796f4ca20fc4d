use bytes::Bytes;
use futures_util::StreamExt;
use quote_core::{
    CreateJobRequest, ExportTicket, ItemId, ItemPatch, Job, JobOptions, NewItem,
    PdfExportOptions, ProductItem, RetryRequest,
};
use quote_logging::quote_debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::map_reqwest_error;
use crate::{ApiError, ClientSettings};

/// One method per backend capability. Calls never retry on their own.
#[async_trait::async_trait]
pub trait BomApi: Send + Sync {
    async fn create_job(&self, items: &[NewItem], options: &JobOptions) -> Result<Job, ApiError>;

    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;

    async fn get_job(&self, job_id: &str) -> Result<Job, ApiError>;

    /// `None` asks the backend to retry every failed item.
    async fn retry_job(&self, job_id: &str, item_ids: Option<&[ItemId]>) -> Result<Job, ApiError>;

    async fn update_item(
        &self,
        job_id: &str,
        item_id: &str,
        patch: &ItemPatch,
    ) -> Result<ProductItem, ApiError>;

    async fn request_pdf_export(&self, options: &PdfExportOptions) -> Result<ExportTicket, ApiError>;

    /// Builds the download address for a finished export; performs no request.
    fn pdf_download_url(&self, job_id: &str, export_id: &str) -> Result<Url, ApiError>;

    async fn export_csv(&self, job_id: &str) -> Result<Bytes, ApiError>;

    /// Fetches a binary artifact such as a rendered PDF.
    async fn download(&self, url: &Url) -> Result<Bytes, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    base: Url,
    client: reqwest::Client,
    max_artifact_bytes: u64,
}

impl ReqwestApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.api_base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", settings.api_base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.api_base_url.clone()));
        }

        // The session lives in a cookie, so every request goes through one cookie store.
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            base,
            client,
            max_artifact_bytes: settings.max_artifact_bytes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        quote_debug!("POST {}", url);
        self.send_json(self.request(Method::POST, url).json(body)).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        quote_debug!("GET {}", url);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn fetch_bytes(&self, url: Url) -> Result<Bytes, ApiError> {
        quote_debug!("GET {} (binary)", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;

        let max_bytes = self.max_artifact_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ApiError::TooLarge { max_bytes });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::TooLarge { max_bytes });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }
}

#[async_trait::async_trait]
impl BomApi for ReqwestApi {
    async fn create_job(&self, items: &[NewItem], options: &JobOptions) -> Result<Job, ApiError> {
        let body = CreateJobRequest {
            items: items.to_vec(),
            options: *options,
        };
        self.post_json(&["jobs"], &body).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.get_json(&["jobs"]).await
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ApiError> {
        self.get_json(&["jobs", job_id]).await
    }

    async fn retry_job(&self, job_id: &str, item_ids: Option<&[ItemId]>) -> Result<Job, ApiError> {
        let body = RetryRequest {
            item_ids: item_ids.map(<[ItemId]>::to_vec),
        };
        self.post_json(&["jobs", job_id, "retry"], &body).await
    }

    async fn update_item(
        &self,
        job_id: &str,
        item_id: &str,
        patch: &ItemPatch,
    ) -> Result<ProductItem, ApiError> {
        let url = self.endpoint(&["jobs", job_id, "items", item_id])?;
        quote_debug!("PATCH {}", url);
        self.send_json(self.request(Method::PATCH, url).json(patch))
            .await
    }

    async fn request_pdf_export(&self, options: &PdfExportOptions) -> Result<ExportTicket, ApiError> {
        self.post_json(&["jobs", options.job_id.as_str(), "export"], options)
            .await
    }

    fn pdf_download_url(&self, job_id: &str, export_id: &str) -> Result<Url, ApiError> {
        self.endpoint(&["jobs", job_id, "pdf", export_id])
    }

    async fn export_csv(&self, job_id: &str) -> Result<Bytes, ApiError> {
        let url = self.endpoint(&["jobs", job_id, "export", "csv"])?;
        self.fetch_bytes(url).await
    }

    async fn download(&self, url: &Url) -> Result<Bytes, ApiError> {
        self.fetch_bytes(url.clone()).await
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Turns a non-2xx response into `ApiError::Server`, preferring the server's message.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = status
        .canonical_reason()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| status.to_string());
    let body = response.bytes().await.unwrap_or_default();
    let message = match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(ErrorBody {
            message: Some(message),
        }) if !message.is_empty() => message,
        Ok(_) => "API request failed".to_string(),
        Err(_) => reason,
    };

    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}
