//! Dubbing job submission, status and download

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::multipart::Form;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::model::{DubbingConfig, DubbingJob, DubbingStatus};
use crate::domain::rules::SubmissionRules;
use crate::dubbing::models::{map_error_response, CreateDubbingResponse, DubbingResource};
use crate::dubbing::upload::{self, UploadCompletion};
use crate::dubbing::{API_KEY_HEADER, DEFAULT_BASE_URL};
use crate::engine::TwoPassCompressor;
use crate::error::{DubForgeError, DubForgeResult};
use crate::utils::{cancellable, file_size, Utils};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const SUBMIT_CONTEXT: &str = "POST /v1/dubbing";

/// Client for the remote dubbing API.
///
/// Holds only the immutable submission settings and an HTTP transport, so one
/// instance can serve concurrent calls for distinct jobs. Jobs are never cached.
#[derive(Clone)]
pub struct DubbingClient {
    http: Client,
    api_key: String,
    base_url: Url,
    config: DubbingConfig,
    compressor: TwoPassCompressor,
}

impl DubbingClient {
    /// Create a client talking to the production endpoint
    pub fn new(
        api_key: impl Into<String>,
        config: DubbingConfig,
        compressor: TwoPassCompressor,
    ) -> DubForgeResult<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("dubforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DubForgeError::http("build HTTP client", e))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            config,
            compressor,
        })
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: &str) -> DubForgeResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn config(&self) -> &DubbingConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit a job for a video the remote side fetches from `video_url`.
    ///
    /// The returned job is always in the `Dubbing` state.
    pub async fn create_dub_from_url(
        &self,
        video_url: &str,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> DubForgeResult<DubbingJob> {
        info!("Submitting dubbing job for {} -> {}", video_url, target_lang);
        let form = self
            .submission_form(source_lang, target_lang)
            .text("source_url", video_url.to_string());
        self.submit(form, None, target_lang, cancel).await
    }

    /// Submit a job for a local file, compressing it first when it is over the
    /// upload ceiling.
    ///
    /// A compressed intermediate is deleted afterwards whatever the outcome.
    /// The original file is never touched.
    pub async fn create_dub_from_file(
        &self,
        path: &Path,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> DubForgeResult<DubbingJob> {
        let size = file_size(path).await?;
        info!(
            "Submitting {} ({}) for dubbing into {}",
            path.display(),
            Utils::format_file_size(size),
            target_lang
        );

        let upload_path = self
            .compressor
            .compress_for_dubbing(path, cancel)
            .await
            .map_err(|e| e.in_step("compress", path))?;
        let compressed = upload_path.as_path() != path;

        let result = self
            .upload_file(&upload_path, source_lang, target_lang, cancel)
            .await;

        if compressed {
            match tokio::fs::remove_file(&upload_path).await {
                Ok(()) => debug!("Removed compressed intermediate {}", upload_path.display()),
                Err(e) => warn!(
                    "Failed to remove compressed intermediate {}: {}",
                    upload_path.display(),
                    e
                ),
            }
        }

        result
    }

    /// Fetch the current state of a job
    pub async fn get_dubbing_status(
        &self,
        dubbing_id: &str,
        cancel: &CancellationToken,
    ) -> DubForgeResult<DubbingJob> {
        let context = format!("GET /v1/dubbing/{}", dubbing_id);
        let url = self.endpoint(&["v1", "dubbing", dubbing_id])?;

        let response = self.get(url, &context, cancel).await?;
        let resource: DubbingResource = read_json(&context, response, cancel).await?;
        let job = resource.into_job(dubbing_id);

        debug!(id = %job.id, status = %job.status, "Fetched dubbing status");
        Ok(job)
    }

    /// Download the dubbed media of a finished job into `output`.
    ///
    /// The job status is re-fetched first; a job still dubbing or failed is
    /// refused without touching the media endpoint. Parent directories are
    /// created as needed and a partial file is removed on failure. Returns the
    /// number of bytes written.
    pub async fn download_dubbed_audio(
        &self,
        dubbing_id: &str,
        language: &str,
        output: &Path,
        cancel: &CancellationToken,
    ) -> DubForgeResult<u64> {
        let job = self.get_dubbing_status(dubbing_id, cancel).await?;
        match job.status {
            DubbingStatus::Dubbing => {
                return Err(DubForgeError::DubbingInProgress {
                    id: dubbing_id.to_string(),
                });
            }
            DubbingStatus::Failed => {
                return Err(DubForgeError::DubbingFailed {
                    id: dubbing_id.to_string(),
                    message: job.error,
                });
            }
            _ => {}
        }

        let context = format!("GET /v1/dubbing/{}/audio/{}", dubbing_id, language);
        let url = self.endpoint(&["v1", "dubbing", dubbing_id, "audio", language])?;
        let response = self.get(url, &context, cancel).await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DubForgeError::io(format!("create {}", parent.display()), e))?;
        }

        let written = cancellable(cancel, write_body(&context, response, output)).await;
        match written {
            Ok(bytes) => {
                info!(
                    "Downloaded {} dub of {} to {} ({})",
                    language,
                    dubbing_id,
                    output.display(),
                    Utils::format_file_size(bytes)
                );
                Ok(bytes)
            }
            Err(e) => {
                if let Err(remove_error) = tokio::fs::remove_file(output).await {
                    if remove_error.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Failed to remove partial download {}: {}",
                            output.display(),
                            remove_error
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn upload_file(
        &self,
        path: &Path,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> DubForgeResult<DubbingJob> {
        let (part, completion) = upload::file_part(path).await?;
        let form = self
            .submission_form(source_lang, target_lang)
            .part("file", part);
        self.submit(form, Some(completion), target_lang, cancel).await
    }

    /// Text fields shared by URL and file submissions
    fn submission_form(&self, source_lang: &str, target_lang: &str) -> Form {
        SubmissionRules::form_fields(&self.config, source_lang, target_lang)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
    }

    async fn submit(
        &self,
        form: Form,
        completion: Option<UploadCompletion>,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> DubForgeResult<DubbingJob> {
        let url = self.endpoint(&["v1", "dubbing"])?;
        debug!(%url, "POST dubbing submission");

        let request = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send();
        let sent = cancellable(cancel, async {
            request
                .await
                .map_err(|e| DubForgeError::http(SUBMIT_CONTEXT, e))
        })
        .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                return Err(match completion {
                    Some(completion) => completion.settle(e).await,
                    None => e,
                });
            }
        };

        if !response.status().is_success() {
            drop(completion);
            return Err(map_error_response(SUBMIT_CONTEXT, response).await);
        }

        if let Some(completion) = completion {
            let uploaded = completion.wait().await?;
            debug!(uploaded, "Upload body fully streamed");
        }

        let created: CreateDubbingResponse = read_json(SUBMIT_CONTEXT, response, cancel).await?;
        info!(
            id = %created.dubbing_id,
            expected_duration_sec = ?created.expected_duration_sec,
            "Dubbing job accepted"
        );

        Ok(DubbingJob {
            id: created.dubbing_id,
            status: DubbingStatus::Dubbing,
            target_languages: vec![target_lang.to_string()],
            error: None,
            expected_duration_sec: created.expected_duration_sec,
        })
    }

    /// Authenticated GET with the shared error mapping
    async fn get(&self, url: Url, context: &str, cancel: &CancellationToken) -> DubForgeResult<Response> {
        debug!(%url, "GET");
        let request = self.http.get(url).header(API_KEY_HEADER, &self.api_key).send();
        let response = cancellable(cancel, async {
            request.await.map_err(|e| DubForgeError::http(context, e))
        })
        .await?;

        if !response.status().is_success() {
            return Err(map_error_response(context, response).await);
        }
        Ok(response)
    }

    fn endpoint(&self, segments: &[&str]) -> DubForgeResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DubForgeError::Config {
                message: format!("base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> DubForgeResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| DubForgeError::Config {
        message: format!("invalid base URL {:?}: {}", raw, e),
    })?;
    if url.cannot_be_a_base() {
        return Err(DubForgeError::Config {
            message: format!("base URL {:?} cannot carry a path", raw),
        });
    }
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(
    context: &str,
    response: Response,
    cancel: &CancellationToken,
) -> DubForgeResult<T> {
    let body = cancellable(cancel, async {
        response
            .bytes()
            .await
            .map_err(|e| DubForgeError::http(context, e))
    })
    .await?;
    serde_json::from_slice(&body).map_err(|e| DubForgeError::json(context, e))
}

/// Stream a response body into a new file at `output`
async fn write_body(context: &str, response: Response, output: &Path) -> DubForgeResult<u64> {
    let mut file = tokio::fs::File::create(output)
        .await
        .map_err(|e| DubForgeError::io(format!("create {}", output.display()), e))?;

    let mut body = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| DubForgeError::http(context, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DubForgeError::io(format!("write {}", output.display()), e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| DubForgeError::io(format!("flush {}", output.display()), e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_process::MockProcessAdapter;
    use std::sync::Arc;

    fn client(base: &str) -> DubbingClient {
        let compressor = TwoPassCompressor::new(Arc::new(MockProcessAdapter::new()));
        DubbingClient::new("key", DubbingConfig::default(), compressor)
            .unwrap()
            .with_base_url(base)
            .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("http://localhost:9000/");
        let url = client.endpoint(&["v1", "dubbing", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v1/dubbing/abc");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_escapes_ids() {
        let client = client("http://localhost:9000/proxy");
        let url = client.endpoint(&["v1", "dubbing", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/proxy/v1/dubbing/a%2Fb");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let compressor = TwoPassCompressor::new(Arc::new(MockProcessAdapter::new()));
        let result = DubbingClient::new("key", DubbingConfig::default(), compressor)
            .unwrap()
            .with_base_url("not a url");
        assert!(matches!(result, Err(DubForgeError::Config { .. })));
    }

    #[test]
    fn test_default_base_url() {
        let compressor = TwoPassCompressor::new(Arc::new(MockProcessAdapter::new()));
        let client = DubbingClient::new("key", DubbingConfig::default(), compressor).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.elevenlabs.io/");
    }
}
