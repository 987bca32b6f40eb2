use std::io::Cursor;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::ProbeError;
use crate::models::Dimensions;

/// Stop reading an image once this many bytes came in without a decodable header.
const MAX_PROBE_BYTES: usize = 8 * 1024 * 1024;

static SVG_ROOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b([^>]*)>").unwrap());
static SVG_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(width|height|viewBox)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static SVG_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]*\.?[0-9]+)\s*(?:px)?\s*$").unwrap());

/// Something that can tell the pixel size of the image behind a URI.
///
/// [`HttpImageProbe`] is used unless the client is built with another one
/// via [`ClientBuilder::image_probe`](crate::ClientBuilder::image_probe).
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, uri: &str) -> Result<Dimensions, ProbeError>;
}

/// Downloads just enough of an image over HTTP to read its header.
///
/// Raster formats are whatever the `image` crate can decode. SVG has no
/// pixel size of its own: the root element's `width`/`height` are used when
/// they are plain or `px` lengths, falling back to `viewBox`. Relative
/// lengths such as `100%` without a `viewBox` cannot be sized.
#[derive(Debug, Clone, Default)]
pub struct HttpImageProbe {
    http: reqwest::Client,
}

impl HttpImageProbe {
    /// Probe with an existing reqwest client (shares its pool and timeout).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, uri: &str) -> Result<Dimensions, ProbeError> {
        let mut response = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| ProbeError::new(uri, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::new(uri, format!("server returned {status}")));
        }

        let mut buf: Vec<u8> = Vec::new();
        let mut last_reason = String::from("empty response body");

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProbeError::new(uri, e.to_string()))?
        {
            buf.extend_from_slice(&chunk);

            match read_dimensions(&buf) {
                Ok(dims) => {
                    tracing::debug!(
                        uri,
                        width = dims.width,
                        height = dims.height,
                        bytes = buf.len(),
                        "probed image size"
                    );
                    return Ok(dims);
                }
                Err(reason) => last_reason = reason,
            }

            if buf.len() >= MAX_PROBE_BYTES {
                break;
            }
        }

        Err(ProbeError::new(uri, last_reason))
    }
}

/// Read width and height from the (possibly truncated) start of an image.
fn read_dimensions(bytes: &[u8]) -> Result<Dimensions, String> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;

    if reader.format().is_none() {
        return read_svg_dimensions(bytes);
    }

    let (width, height) = reader.into_dimensions().map_err(|e| e.to_string())?;
    Ok(Dimensions { width, height })
}

/// Size of an SVG document from the attributes of its root `<svg>` tag.
fn read_svg_dimensions(bytes: &[u8]) -> Result<Dimensions, String> {
    let text = String::from_utf8_lossy(bytes);
    let Some(root) = SVG_ROOT.captures(&text) else {
        if text.contains("<svg") {
            return Err("incomplete svg root element".to_string());
        }
        return Err("unrecognized image format".to_string());
    };

    let (mut width, mut height, mut view_box) = (None, None, None);
    for attr in SVG_ATTR.captures_iter(&root[1]) {
        let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
        match &attr[1] {
            "width" => width = svg_length(value),
            "height" => height = svg_length(value),
            _ => view_box = svg_view_box(value),
        }
    }

    let (width, height) = match (width, height, view_box) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((vw, vh))) => (w, w * vh / vw),
        (None, Some(h), Some((vw, vh))) => (h * vw / vh, h),
        (None, None, Some(size)) => size,
        _ => return Err("svg has no absolute width/height or viewBox".to_string()),
    };

    match (pixels(width), pixels(height)) {
        (Some(width), Some(height)) => Ok(Dimensions { width, height }),
        _ => Err(format!("svg size out of range: {width}x{height}")),
    }
}

fn svg_length(value: &str) -> Option<f64> {
    SVG_LENGTH.captures(value)?[1].parse().ok()
}

/// Width and height of a `viewBox="min-x min-y width height"`.
fn svg_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts[..] {
        [_, _, w, h] if w > 0.0 && h > 0.0 => Some((w, h)),
        _ => None,
    }
}

fn pixels(length: f64) -> Option<u32> {
    let rounded = length.round();
    (1.0..=f64::from(u32::MAX))
        .contains(&rounded)
        .then_some(rounded as u32)
}
