use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::enrich::{enrich_images, ProbeFailurePolicy, DEFAULT_PROBE_CONCURRENCY};
use crate::errors::{RequestDescriptor, Result, VideomatikError};
use crate::models::{CustomJson, CustomJsonOptions, NewVideoRequest, Pagination, VideoRequest};
use crate::normalize::{normalize_video_request, normalize_video_requests};
use crate::probe::{HttpImageProbe, ImageProbe};

const DEFAULT_HOST: &str = "https://api.videomatik.com.br";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_ENV: &str = "VIDEOMATIK_API_KEY";
const CLIENT_ID_ENV: &str = "VIDEOMATIK_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "VIDEOMATIK_CLIENT_SECRET";

/// How the client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent verbatim in the `authorization` header.
    ApiKey(String),
    /// Sent as HTTP basic credentials.
    ClientPair {
        client_id: String,
        client_secret: String,
    },
}

impl Credential {
    /// Pick a credential out of optional parts. Empty strings count as missing;
    /// an API key wins over a client pair.
    pub fn resolve(
        api_key: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());

        if let Some(key) = present(api_key) {
            return Ok(Self::ApiKey(key));
        }

        match (present(client_id), present(client_secret)) {
            (Some(client_id), Some(client_secret)) => Ok(Self::ClientPair {
                client_id,
                client_secret,
            }),
            (Some(_), None) => Err(VideomatikError::Configuration(
                "client id given without a client secret".into(),
            )),
            (None, Some(_)) => Err(VideomatikError::Configuration(
                "client secret given without a client id".into(),
            )),
            (None, None) => Err(VideomatikError::Configuration(format!(
                "an API key or a client id/secret pair is required. Pass them to \
                 ClientBuilder or set {API_KEY_ENV} (or {CLIENT_ID_ENV} and {CLIENT_SECRET_ENV})."
            ))),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(..)"),
            Self::ClientPair { client_id, .. } => f
                .debug_struct("ClientPair")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use videomatik::{ClientBuilder, ProbeFailurePolicy};
/// use std::time::Duration;
///
/// # fn example() -> videomatik::Result<()> {
/// let client = ClientBuilder::new()
///     .client_credentials("my-client-id", "my-client-secret")
///     .host("https://staging.example.com")
///     .timeout(Duration::from_secs(30))
///     .probe_concurrency(4)
///     .probe_failure_policy(ProbeFailurePolicy::Skip)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    host: String,
    timeout: Duration,
    probe_concurrency: usize,
    probe_failure_policy: ProbeFailurePolicy,
    image_probe: Option<Arc<dyn ImageProbe>>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            client_id: None,
            client_secret: None,
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            probe_failure_policy: ProbeFailurePolicy::default(),
            image_probe: None,
        }
    }

    /// Authenticate with an API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Authenticate with a client id and secret.
    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Override the API origin (defaults to `https://api.videomatik.com.br`).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the HTTP request timeout (defaults to 60 seconds).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Maximum image probes in flight during enrichment (defaults to 8, at least 1).
    pub fn probe_concurrency(mut self, n: usize) -> Self {
        self.probe_concurrency = n.max(1);
        self
    }

    /// What a failed image probe does to enrichment (defaults to
    /// [`ProbeFailurePolicy::Abort`]).
    pub fn probe_failure_policy(mut self, policy: ProbeFailurePolicy) -> Self {
        self.probe_failure_policy = policy;
        self
    }

    /// Replace the default [`HttpImageProbe`].
    pub fn image_probe(mut self, probe: impl ImageProbe + 'static) -> Self {
        self.image_probe = Some(Arc::new(probe));
        self
    }

    /// Build the [`Client`].
    ///
    /// If no credential was set on the builder, `VIDEOMATIK_API_KEY` is read,
    /// then `VIDEOMATIK_CLIENT_ID` with `VIDEOMATIK_CLIENT_SECRET`.
    ///
    /// Returns [`VideomatikError::Configuration`] if no credential is available.
    pub fn build(self) -> Result<Client> {
        let nothing_given =
            self.api_key.is_none() && self.client_id.is_none() && self.client_secret.is_none();

        let credential = if nothing_given {
            Credential::resolve(
                std::env::var(API_KEY_ENV).ok(),
                std::env::var(CLIENT_ID_ENV).ok(),
                std::env::var(CLIENT_SECRET_ENV).ok(),
            )?
        } else {
            Credential::resolve(self.api_key, self.client_id, self.client_secret)?
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Credential::ApiKey(key) = &credential {
            let mut value = HeaderValue::from_str(key).map_err(|_| {
                VideomatikError::Configuration(
                    "API key contains characters not allowed in an HTTP header".into(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| VideomatikError::Configuration(format!("HTTP client: {e}")))?;

        // Image hosts are third parties: the probe gets its own client so
        // credentials never leave for them.
        let image_probe = match self.image_probe {
            Some(probe) => probe,
            None => {
                let probe_http = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| VideomatikError::Configuration(format!("HTTP client: {e}")))?;
                Arc::new(HttpImageProbe::with_client(probe_http))
            }
        };

        Ok(Client {
            host: self.host.trim_end_matches('/').to_string(),
            credential,
            http,
            image_probe,
            probe_concurrency: self.probe_concurrency,
            probe_failure_policy: self.probe_failure_policy,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The Videomatik API client.
///
/// Use [`Client::new`] for quick construction or [`ClientBuilder`] for full control.
///
/// # Example
///
/// ```no_run
/// use videomatik::{Client, CustomJsonOptions, NewVideoRequest, Action};
///
/// # async fn example() -> videomatik::Result<()> {
/// let client = Client::new("my-api-key")?;
///
/// let custom_json = client
///     .get_template_custom_json("oferta-varejo-nujyuua", CustomJsonOptions::with_image_sizes())
///     .await?;
///
/// let request = NewVideoRequest::new("oferta-varejo-nujyuua", "feed", custom_json)
///     .action(Action::webhook("https://example.com/video-done"));
/// let video = client.create_video_request(&request).await?;
/// println!("created {:?}", video.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    host: String,
    credential: Credential,
    http: reqwest::Client,
    image_probe: Arc<dyn ImageProbe>,
    probe_concurrency: usize,
    probe_failure_policy: ProbeFailurePolicy,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("credential", &self.credential)
            .field("probe_concurrency", &self.probe_concurrency)
            .field("probe_failure_policy", &self.probe_failure_policy)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client authenticated with `api_key` and default settings.
    ///
    /// For customization, use [`ClientBuilder`] instead.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().api_key(api_key).build()
    }

    /// API origin every request path is appended to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The credential this client authenticates with. Its `Debug` output
    /// hides secrets.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Fetch the editable custom JSON of a template.
    ///
    /// With [`CustomJsonOptions::get_image_sizes`] set, every image with a
    /// `source` is probed and gets `width`/`height`. Images without a source
    /// are returned unchanged and never probed.
    ///
    /// # Errors
    ///
    /// - [`VideomatikError::InvalidRequest`] if `template_id` is empty.
    /// - [`VideomatikError::Probe`] if a probe fails under [`ProbeFailurePolicy::Abort`].
    pub async fn get_template_custom_json(
        &self,
        template_id: &str,
        opts: CustomJsonOptions,
    ) -> Result<CustomJson> {
        let path = format!(
            "/v1/templates/{}/custom-json",
            path_segment("template id", template_id)?
        );
        let mut custom_json: CustomJson = self.request(Method::GET, &path, None, None).await?;

        if !opts.get_image_sizes {
            return Ok(custom_json);
        }

        // Only an `images` array is enriched; any other shape is returned as is.
        if let Some(images) = custom_json.images_mut() {
            tracing::debug!(template_id, images = images.len(), "probing template image sizes");
            let taken = std::mem::take(images);
            *images = enrich_images(
                taken,
                self.image_probe.as_ref(),
                self.probe_concurrency,
                self.probe_failure_policy,
            )
            .await?;
        }

        Ok(custom_json)
    }

    /// List the compositions (output variants such as "feed" or "story") of a template.
    pub async fn get_template_compositions(&self, template_id: &str) -> Result<Value> {
        let path = format!(
            "/v1/templates/{}/compositions",
            path_segment("template id", template_id)?
        );
        self.request(Method::GET, &path, None, None).await
    }

    /// List video requests, optionally paginated with `limit`/`offset`.
    pub async fn list_video_requests(&self, pagination: Pagination) -> Result<Vec<VideoRequest>> {
        let raw: Vec<Value> = self
            .request(Method::GET, "/v1/video-requests", Some(&pagination), None)
            .await?;
        normalize_video_requests(raw)
    }

    /// Fetch a single video request, e.g. to check its status.
    pub async fn get_one_video_request(&self, id: &str) -> Result<VideoRequest> {
        let path = format!("/v1/video-requests/{}", path_segment("video request id", id)?);
        let raw: Value = self.request(Method::GET, &path, None, None).await?;
        normalize_video_request(raw)
    }

    /// Delete a video request. Returns the server's acknowledgment as-is.
    pub async fn delete_video_request(&self, id: &str) -> Result<Value> {
        let path = format!("/v1/video-requests/{}", path_segment("video request id", id)?);
        self.request(Method::DELETE, &path, None, None).await
    }

    /// Ask the server to render a video. Webhook [`Action`](crate::Action)s in
    /// the body are called by the server once rendering finishes.
    pub async fn create_video_request(&self, body: &NewVideoRequest) -> Result<VideoRequest> {
        if body.template_id.is_empty() {
            return Err(VideomatikError::InvalidRequest(
                "template id must not be empty".into(),
            ));
        }

        let body = serde_json::to_value(body)
            .map_err(|e| VideomatikError::data_format("video request body", e))?;
        let raw: Value = self
            .request(Method::POST, "/v1/video-requests", None, Some(body))
            .await?;
        normalize_video_request(raw)
    }

    /// Same as [`create_video_request`](Self::create_video_request), plus a
    /// warning in the log.
    #[deprecated(note = "use `create_video_request` instead")]
    pub async fn request_new_video(&self, body: &NewVideoRequest) -> Result<VideoRequest> {
        tracing::warn!("request_new_video is deprecated, use create_video_request instead");
        self.create_video_request(body).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Send one request and decode the JSON answer.
    ///
    /// Connection failures become [`VideomatikError::Transport`], non-2xx
    /// answers [`VideomatikError::Api`]. An empty body decodes as `null`.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Pagination>,
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.host, path);
        let descriptor = RequestDescriptor::new(method.clone(), path);

        let mut req = self.http.request(method, &url);

        if let Credential::ClientPair {
            client_id,
            client_secret,
        } = &self.credential
        {
            req = req.basic_auth(client_id, Some(client_secret));
        }
        if let Some(q) = query {
            req = req.query(q);
        }
        if let Some(ref b) = body {
            req = req.json(b);
        }

        tracing::debug!(request = %descriptor, "sending request");

        let response = req
            .send()
            .await
            .map_err(|source| VideomatikError::Transport {
                request: descriptor.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| VideomatikError::Transport {
                request: descriptor.clone(),
                source,
            })?;

        tracing::debug!(request = %descriptor, status = status.as_u16(), "received response");

        if !status.is_success() {
            let parsed_body: Option<Value> = serde_json::from_str(&text).ok();

            let message = parsed_body
                .as_ref()
                .and_then(|b| b.get("error").or_else(|| b.get("message")))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if text.is_empty() {
                        status.canonical_reason().unwrap_or("").to_string()
                    } else {
                        text.clone()
                    }
                });

            return Err(VideomatikError::Api {
                request: descriptor,
                status_code: status.as_u16(),
                message,
                body: parsed_body,
            });
        }

        let text = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(text).map_err(|e| {
            VideomatikError::data_format(format!("response body of {descriptor}"), e)
        })
    }
}

/// Percent-encode one path segment, rejecting empty ids.
fn path_segment<'a>(what: &str, id: &'a str) -> Result<std::borrow::Cow<'a, str>> {
    if id.is_empty() {
        return Err(VideomatikError::InvalidRequest(format!(
            "{what} must not be empty"
        )));
    }
    Ok(urlencoding::encode(id))
}
