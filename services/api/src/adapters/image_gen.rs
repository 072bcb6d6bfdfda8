//! services/api/src/adapters/image_gen.rs
//!
//! Image generator backed by a hosted Gradio Space. A call is two requests:
//! the job is queued with a POST, then its result is read from a server-sent
//! event stream. The Space answers with a single file, a list of files or a
//! list of `(file, caption)` pairs; all of them are flattened into references.

use async_trait::async_trait;
use bytes::Bytes;
use design_studio_core::ports::{ImageGenerator, ImageRequest, PortError, PortResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

const ENDPOINT: &str = "generate_image";

#[derive(Deserialize)]
struct QueuedJob {
    event_id: String,
}

/// An adapter that implements `ImageGenerator` against a Gradio Space.
#[derive(Clone)]
pub struct GradioImageAdapter {
    client: Client,
    space_url: String,
}

impl GradioImageAdapter {
    pub fn new(client: Client, space_url: String) -> Self {
        Self {
            client,
            space_url: space_url.trim_end_matches('/').to_string(),
        }
    }

    fn call_url(&self) -> String {
        format!("{}/gradio_api/call/{}", self.space_url, ENDPOINT)
    }

    /// Absolute URL for a reference: URLs are kept, Space-local paths go
    /// through the file route.
    fn file_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}/gradio_api/file={}", self.space_url, reference)
        }
    }
}

//=========================================================================================
// Response Parsing
//=========================================================================================

/// The reference carried by one output value, if any.
fn reference_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(file) => file
            .get("url")
            .and_then(Value::as_str)
            .or_else(|| file.get("path").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Flattens a Space output into image references, order preserved.
///
/// Accepts a single reference, a list of references, or a list of
/// `(reference, caption)` pairs. Anything else (seeds, captions, nulls) is
/// skipped.
pub fn extract_image_refs(output: &Value) -> Vec<String> {
    match output {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Array(pair) => pair.first().and_then(reference_of),
                other => reference_of(other),
            })
            .collect(),
        other => reference_of(other).into_iter().collect(),
    }
}

/// Pulls the payload of the `complete` event out of an SSE body.
fn completed_payload(body: &str) -> PortResult<Value> {
    let mut event = "";
    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match event {
                "complete" => {
                    return serde_json::from_str(data).map_err(|e| {
                        PortError::Upstream(format!("Malformed image result: {}", e))
                    })
                }
                "error" => {
                    return Err(PortError::Upstream(format!(
                        "Image generation failed: {}",
                        data
                    )))
                }
                _ => {}
            }
        }
    }
    Err(PortError::Upstream(
        "Image stream ended without a result".to_string(),
    ))
}

//=========================================================================================
// `ImageGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGenerator for GradioImageAdapter {
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<Vec<String>> {
        let body = json!({
            "data": [request.prompt, request.seed, request.width, request.height]
        });

        let job: QueuedJob = self
            .client
            .post(self.call_url())
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed queue response: {}", e)))?;
        info!("Image job {} queued.", job.event_id);

        let stream = self
            .client
            .get(format!("{}/{}", self.call_url(), job.event_id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .text()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        let payload = completed_payload(&stream)?;
        let refs = extract_image_refs(&payload);
        if refs.is_empty() {
            error!("Image job {} returned no usable reference.", job.event_id);
            return Err(PortError::NoImage);
        }
        Ok(refs)
    }

    async fn fetch_image(&self, reference: &str) -> PortResult<Bytes> {
        self.client
            .get(self.file_url(reference))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))
    }
}
