use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::dispatch::registry::GenerationVendorType;
use crate::dispatch::{GenerationOutcome, GenerationRequest, MediaKind};
use crate::error::EaselError;
use crate::validate;

/// Max response body size for vendor responses (status payloads are small;
/// anything bigger is not a generation object).
const MAX_VENDOR_RESPONSE_BYTES: usize = 1024 * 1024;

/// Per-request timeout for a single create or status call.
const VENDOR_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between status fetches. No backoff; vendor jobs finish in
/// seconds to minutes and a ready URL should be picked up promptly.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Wait budget for image jobs.
pub const IMAGE_BUDGET: Duration = Duration::from_secs(5 * 60);

/// Wait budget for video jobs.
pub const VIDEO_BUDGET: Duration = Duration::from_secs(30 * 60);

/// Fixed video parameters. The tool surface exposes no video knobs.
const VIDEO_RESOLUTION: &str = "720p";
const VIDEO_DURATION: &str = "5s";

const DREAM_MACHINE_BASE: &str = "https://api.lumalabs.ai/dream-machine/v1";

/// Wait budget for a media kind. Policy constants, not user-configurable.
pub fn budget_for(kind: MediaKind) -> Duration {
    match kind {
        MediaKind::Image => IMAGE_BUDGET,
        MediaKind::Video => VIDEO_BUDGET,
    }
}

/// One observation of a vendor job.
#[derive(Debug)]
pub enum PollStatus {
    /// Not yet terminal. Unrecognized vendor states land here too.
    InProgress,
    /// Vendor reports completed. `url` is None when the expected asset field
    /// is absent from the response.
    Completed { url: Option<String> },
    /// Vendor reports failed, with its reason verbatim.
    Failed(String),
}

/// Vendor job handle returned by `submit`. Job state lives vendor-side; this
/// is only the correlation data the wait loop needs.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub id: String,
    pub kind: MediaKind,
    pub model: String,
    pub provider: String,
}

/// Vendor-specific request/response handling for polled generation APIs.
pub trait GenerationApi: Send + Sync {
    /// Build the image creation request. Returns (url, headers, body).
    fn build_image_request(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        model: &str,
        api_key: &str,
    ) -> (String, Vec<(String, String)>, serde_json::Value);

    /// Build the video creation request. Returns (url, headers, body).
    fn build_video_request(
        &self,
        prompt: &str,
        model: &str,
        api_key: &str,
    ) -> (String, Vec<(String, String)>, serde_json::Value);

    /// Build the status request. Returns (url, headers).
    fn build_status_request(&self, job_id: &str, api_key: &str) -> (String, Vec<(String, String)>);

    /// Parse the creation response to extract the vendor job ID.
    fn parse_create_response(&self, body: &[u8]) -> Result<String, EaselError>;

    /// Parse a status response into a poll observation for `kind`.
    fn parse_status_response(
        &self,
        body: &[u8],
        kind: MediaKind,
    ) -> Result<PollStatus, EaselError>;
}

// ---------------------------------------------------------------------------
// Dream Machine generations API (photon image models, ray video models)
// ---------------------------------------------------------------------------

pub struct DreamMachineApi;

impl GenerationApi for DreamMachineApi {
    fn build_image_request(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        model: &str,
        api_key: &str,
    ) -> (String, Vec<(String, String)>, serde_json::Value) {
        let url = format!("{DREAM_MACHINE_BASE}/generations/image");
        let headers = vec![
            ("Authorization".to_string(), format!("Bearer {api_key}")),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "aspect_ratio": aspect_ratio,
        });
        (url, headers, body)
    }

    fn build_video_request(
        &self,
        prompt: &str,
        model: &str,
        api_key: &str,
    ) -> (String, Vec<(String, String)>, serde_json::Value) {
        let url = format!("{DREAM_MACHINE_BASE}/generations");
        let headers = vec![
            ("Authorization".to_string(), format!("Bearer {api_key}")),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "resolution": VIDEO_RESOLUTION,
            "duration": VIDEO_DURATION,
        });
        (url, headers, body)
    }

    fn build_status_request(&self, job_id: &str, api_key: &str) -> (String, Vec<(String, String)>) {
        let url = format!("{DREAM_MACHINE_BASE}/generations/{job_id}");
        let headers = vec![("Authorization".to_string(), format!("Bearer {api_key}"))];
        (url, headers)
    }

    fn parse_create_response(&self, body: &[u8]) -> Result<String, EaselError> {
        let v: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| EaselError::SchemaParse(format!("create response: {e}")))?;
        v["id"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| EaselError::SchemaParse("create response missing 'id'".into()))
    }

    fn parse_status_response(
        &self,
        body: &[u8],
        kind: MediaKind,
    ) -> Result<PollStatus, EaselError> {
        let v: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| EaselError::SchemaParse(format!("status response: {e}")))?;

        match v["state"].as_str() {
            Some("completed") => {
                let url = v["assets"][kind.as_str()].as_str().map(|s| s.to_string());
                Ok(PollStatus::Completed { url })
            }
            Some("failed") => {
                let reason = v["failure_reason"].as_str().unwrap_or("unspecified");
                Ok(PollStatus::Failed(reason.to_string()))
            }
            // "queued", "dreaming", and whatever states the vendor adds next:
            // anything non-terminal keeps the loop running.
            Some(_) => Ok(PollStatus::InProgress),
            None => Err(EaselError::SchemaParse(
                "status response missing 'state'".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Wait loop
// ---------------------------------------------------------------------------

/// One status read per tick. The HTTP implementation fetches from the vendor;
/// tests script observations directly.
pub trait StatusProbe: Send {
    fn fetch(&mut self) -> impl Future<Output = Result<PollStatus, EaselError>> + Send;
}

/// Pacing between ticks. The production pacer sleeps `POLL_INTERVAL`; tests
/// advance ticks without real delays.
pub trait Pacer: Send {
    fn pause(&mut self) -> impl Future<Output = ()> + Send;
}

/// Production pacer: one `POLL_INTERVAL` sleep between status fetches.
pub struct IntervalPacer;

impl Pacer for IntervalPacer {
    async fn pause(&mut self) {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Drive a submitted job to a terminal outcome.
///
/// One tick is one status fetch; `budget` in whole seconds is the tick
/// allowance, so a job whose completion shows up on the final permitted fetch
/// still succeeds. A transport error on any fetch ends the wait immediately;
/// it is neither counted as a tick nor retried here.
pub async fn drive<P: StatusProbe, W: Pacer>(
    probe: &mut P,
    pacer: &mut W,
    job: &SubmittedJob,
    budget: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<String, EaselError> {
    let ticks = budget.as_secs().max(1);

    for tick in 1..=ticks {
        if let Some(token) = cancel
            && token.is_cancelled()
        {
            return Err(EaselError::Cancelled(tick - 1));
        }

        match probe.fetch().await? {
            PollStatus::InProgress => {
                tracing::debug!(
                    provider = job.provider,
                    job_id = job.id,
                    tick = tick,
                    "generation still in progress"
                );
                // No pause after the final permitted fetch.
                if tick < ticks {
                    pacer.pause().await;
                }
            }
            PollStatus::Completed { url: Some(url) } => {
                tracing::info!(
                    provider = job.provider,
                    model = job.model,
                    job_id = job.id,
                    tick = tick,
                    "generation completed"
                );
                return Ok(url);
            }
            PollStatus::Completed { url: None } => {
                return Err(EaselError::MissingAsset {
                    provider: job.provider.clone(),
                    kind: job.kind,
                });
            }
            PollStatus::Failed(reason) => {
                return Err(EaselError::GenerationFailed {
                    provider: job.provider.clone(),
                    reason,
                });
            }
        }
    }

    Err(EaselError::Timeout {
        budget_secs: budget.as_secs(),
    })
}

// ---------------------------------------------------------------------------
// Generation dispatcher
// ---------------------------------------------------------------------------

/// Status probe backed by the vendor HTTP API. One GET per tick.
struct HttpStatusProbe<'a> {
    client: &'a Client,
    api: &'a dyn GenerationApi,
    job_id: &'a str,
    api_key: &'a str,
    provider: &'a str,
    kind: MediaKind,
}

impl StatusProbe for HttpStatusProbe<'_> {
    async fn fetch(&mut self) -> Result<PollStatus, EaselError> {
        let (url, headers) = self.api.build_status_request(self.job_id, self.api_key);

        let mut status_req = self.client.get(&url).timeout(VENDOR_CALL_TIMEOUT);
        for (k, v) in &headers {
            status_req = status_req.header(k, v);
        }

        let resp = status_req.send().await?;
        let body = check_vendor_response(resp, self.provider).await?;
        self.api.parse_status_response(&body, self.kind)
    }
}

pub struct GenerationDispatch {
    client: Client,
}

impl Default for GenerationDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationDispatch {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("failed to build generation HTTP client");
        Self { client }
    }

    fn api_for(vendor: &GenerationVendorType) -> Box<dyn GenerationApi> {
        match vendor {
            GenerationVendorType::DreamMachine => Box::new(DreamMachineApi),
        }
    }

    /// Submit a creation request and return the vendor job handle without
    /// waiting for completion. Rejects an empty prompt before any vendor call.
    pub async fn submit(
        &self,
        req: &GenerationRequest,
        provider: &str,
        vendor: &GenerationVendorType,
        api_key: &str,
    ) -> Result<SubmittedJob, EaselError> {
        validate::validate_prompt(&req.prompt).map_err(EaselError::InvalidRequest)?;

        let api = Self::api_for(vendor);
        let (url, headers, body) = match req.kind {
            MediaKind::Image => {
                let ratio = req
                    .aspect_ratio
                    .as_deref()
                    .unwrap_or(validate::DEFAULT_ASPECT_RATIO);
                api.build_image_request(&req.prompt, ratio, &req.model, api_key)
            }
            MediaKind::Video => api.build_video_request(&req.prompt, &req.model, api_key),
        };

        let mut create_req = self.client.post(&url).timeout(VENDOR_CALL_TIMEOUT);
        for (k, v) in &headers {
            create_req = create_req.header(k, v);
        }

        let resp = create_req.json(&body).send().await?;
        let response_body = check_vendor_response(resp, provider).await?;
        let id = api.parse_create_response(&response_body)?;

        tracing::info!(
            provider = provider,
            model = req.model,
            kind = %req.kind,
            job_id = id,
            "generation job submitted"
        );

        Ok(SubmittedJob {
            id,
            kind: req.kind,
            model: req.model.clone(),
            provider: provider.to_string(),
        })
    }

    /// Wait for a submitted job, fetching status at `POLL_INTERVAL` until a
    /// terminal observation or the kind's budget runs out.
    pub async fn await_completion(
        &self,
        job: &SubmittedJob,
        vendor: &GenerationVendorType,
        api_key: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, EaselError> {
        let api = Self::api_for(vendor);
        let mut probe = HttpStatusProbe {
            client: &self.client,
            api: api.as_ref(),
            job_id: &job.id,
            api_key,
            provider: &job.provider,
            kind: job.kind,
        };
        let mut pacer = IntervalPacer;
        drive(&mut probe, &mut pacer, job, budget_for(job.kind), cancel).await
    }

    /// Submit and wait. The registry calls this once per generate request.
    pub async fn generate(
        &self,
        req: &GenerationRequest,
        provider: &str,
        vendor: &GenerationVendorType,
        api_key: &str,
    ) -> Result<GenerationOutcome, EaselError> {
        let start = Instant::now();

        let job = self.submit(req, provider, vendor, api_key).await?;
        let url = self
            .await_completion(&job, vendor, api_key, req.cancellation_token.as_ref())
            .await?;

        tracing::info!(
            provider = provider,
            model = job.model,
            job_id = job.id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generation delivered"
        );

        Ok(GenerationOutcome {
            url,
            model: job.model,
            provider: job.provider,
        })
    }
}

/// Classify a vendor HTTP response, returning the capped body on success.
async fn check_vendor_response(
    resp: reqwest::Response,
    provider: &str,
) -> Result<Vec<u8>, EaselError> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(EaselError::AuthFailed {
            provider: provider.to_string(),
            message: format!("HTTP {status}"),
        });
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(EaselError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if !status.is_success() {
        let body = resp.bytes().await.unwrap_or_default();
        let truncated = &body[..body.len().min(MAX_VENDOR_RESPONSE_BYTES)];
        return Err(EaselError::Upstream {
            provider: provider.to_string(),
            message: format!("{status}: {}", String::from_utf8_lossy(truncated)),
            status: Some(status.as_u16()),
        });
    }

    let body = resp.bytes().await?;
    if body.len() > MAX_VENDOR_RESPONSE_BYTES {
        return Err(EaselError::Upstream {
            provider: provider.to_string(),
            message: format!("response too large: {} bytes", body.len()),
            status: None,
        });
    }

    Ok(body.to_vec())
}
