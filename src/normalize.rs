//! Resolves the legacy string-encoded `customJSON` of video requests.
//!
//! Some API versions send `customJSON` as a JSON document serialized into a
//! string. Everything returned to callers goes through here first, so the
//! rest of the crate only ever sees a structured [`CustomJson`].
//!
//! The other known fields are picked out leniently: a field of unexpected
//! shape stays in [`VideoRequest::extra`] untouched instead of failing the
//! call.

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{Result, VideomatikError};
use crate::models::{Action, CustomJson, LegacyJson, VideoRequest};

/// Turn a wire-form video request into a [`VideoRequest`].
///
/// A missing or `null` `customJSON` becomes an empty document.
pub(crate) fn normalize_video_request(raw: Value) -> Result<VideoRequest> {
    let mut fields = match raw {
        Value::Object(fields) => fields,
        other => {
            return Err(VideomatikError::data_format(
                "video request",
                serde_json::Error::custom(format!("expected an object, got {other}")),
            ))
        }
    };

    let custom_json = match fields.remove("customJSON") {
        None | Some(Value::Null) => CustomJson::default(),
        Some(value) => resolve_custom_json(value.into())?,
    };

    Ok(VideoRequest {
        id: take_identifier(&mut fields, "id"),
        template_id: take_identifier(&mut fields, "templateId"),
        composition_id: take_identifier(&mut fields, "compositionId"),
        custom_json,
        actions: take_actions(&mut fields),
        extra: fields,
    })
}

/// [`normalize_video_request`] over a list, keeping order. The first failure
/// aborts.
pub(crate) fn normalize_video_requests(raw: Vec<Value>) -> Result<Vec<VideoRequest>> {
    raw.into_iter().map(normalize_video_request).collect()
}

fn resolve_custom_json(field: LegacyJson) -> Result<CustomJson> {
    match field {
        LegacyJson::Encoded(text) => serde_json::from_str(&text)
            .map_err(|e| VideomatikError::data_format("string-encoded customJSON", e)),
        LegacyJson::Structured(value) => serde_json::from_value(value)
            .map_err(|e| VideomatikError::data_format("customJSON", e)),
    }
}

/// Remove `key` if it holds a string or a number.
fn take_identifier(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    let id = match fields.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    fields.remove(key);
    Some(id)
}

/// Remove `actions` if it is a non-empty list of well-formed actions.
fn take_actions(fields: &mut Map<String, Value>) -> Vec<Action> {
    let parsed = fields
        .get("actions")
        .and_then(|v| Vec::<Action>::deserialize(v).ok())
        .unwrap_or_default();
    if !parsed.is_empty() {
        fields.remove("actions");
    }
    parsed
}
