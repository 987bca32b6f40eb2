use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Editable content document of a template instance.
///
/// The document is kept exactly as the server sent it. `texts` and `images`
/// are reached through accessors that only see them when they are arrays;
/// any other shape is left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CustomJson(Map<String, Value>);

impl CustomJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn texts(&self) -> Option<&Vec<Value>> {
        self.0.get("texts").and_then(Value::as_array)
    }

    pub fn texts_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut("texts").and_then(Value::as_array_mut)
    }

    pub fn images(&self) -> Option<&Vec<Value>> {
        self.0.get("images").and_then(Value::as_array)
    }

    pub fn images_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut("images").and_then(Value::as_array_mut)
    }

    /// Sources of all images that have one, in document order.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.images().into_iter().flatten().filter_map(image_source)
    }

    /// `width`/`height` of the image at `index`, when both are unsigned integers.
    pub fn image_dimensions(&self, index: usize) -> Option<Dimensions> {
        let image = self.images()?.get(index)?;
        let read = |key: &str| {
            image
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
        };
        Some(Dimensions {
            width: read("width")?,
            height: read("height")?,
        })
    }
}

impl From<Map<String, Value>> for CustomJson {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The `source` of an image entry, if it is an object with a non-empty string source.
pub(crate) fn image_source(image: &Value) -> Option<&str> {
    image
        .get("source")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Pixel size reported by an [`ImageProbe`](crate::ImageProbe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Post-completion side effect performed by the server, e.g. a webhook call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    /// A `webhook` action the server calls once the video is rendered.
    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            kind: "webhook".to_string(),
            url: Some(url.into()),
            extra: Map::new(),
        }
    }
}

/// A render job as returned by the API, with `customJSON` always structured.
///
/// Server fields that are missing or do not have the expected shape leave
/// the typed field empty; their raw value, if any, stays in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "templateId", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,

    #[serde(rename = "compositionId", skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<String>,

    #[serde(rename = "customJSON")]
    pub custom_json: CustomJson,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,

    /// Status and any other server-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoRequest {
    /// The server's `status` field, when it is a string.
    pub fn status(&self) -> Option<&str> {
        self.extra.get("status").and_then(Value::as_str)
    }
}

/// Body of `POST /v1/video-requests`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVideoRequest {
    #[serde(rename = "templateId")]
    pub template_id: String,

    #[serde(rename = "customJSON")]
    pub custom_json: CustomJson,

    #[serde(rename = "compositionId")]
    pub composition_id: String,

    pub actions: Vec<Action>,
}

impl NewVideoRequest {
    pub fn new(
        template_id: impl Into<String>,
        composition_id: impl Into<String>,
        custom_json: CustomJson,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            custom_json,
            composition_id: composition_id.into(),
            actions: Vec::new(),
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// `limit`/`offset` for `list_video_requests`. Unset values are left out of
/// the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl Pagination {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// Options for `get_template_custom_json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomJsonOptions {
    /// Probe every image `source` and fill in `width`/`height`. Default: false.
    pub get_image_sizes: bool,
}

impl CustomJsonOptions {
    pub fn with_image_sizes() -> Self {
        Self {
            get_image_sizes: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire forms (not part of the public API surface)
// ---------------------------------------------------------------------------

/// `customJSON` as older API versions send it (a JSON document inside a
/// string) or as newer ones do.
#[derive(Debug)]
pub(crate) enum LegacyJson {
    Encoded(String),
    Structured(Value),
}

impl From<Value> for LegacyJson {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Encoded(text),
            other => Self::Structured(other),
        }
    }
}
