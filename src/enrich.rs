use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

use crate::errors::{Result, VideomatikError};
use crate::models::image_source;
use crate::probe::ImageProbe;

/// Default number of image probes in flight at once.
pub(crate) const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// What to do when a single image probe fails during enrichment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// Fail the whole `get_template_custom_json` call.
    #[default]
    Abort,
    /// Leave the entry without `width`/`height` and carry on.
    Skip,
}

/// Fill in `width`/`height` for every image object with a `source`.
///
/// Entries that are not objects, or have no usable source, come back as they
/// were. At most `concurrency` probes run at once. Output order is input
/// order, whatever order the probes finish in.
pub(crate) async fn enrich_images(
    images: Vec<Value>,
    probe: &dyn ImageProbe,
    concurrency: usize,
    policy: ProbeFailurePolicy,
) -> Result<Vec<Value>> {
    stream::iter(images)
        .map(|mut image| async move {
            let Some(source) = image_source(&image).map(str::to_owned) else {
                return Ok(image);
            };

            match probe.probe(&source).await {
                Ok(dims) => {
                    if let Some(fields) = image.as_object_mut() {
                        fields.insert("width".to_string(), dims.width.into());
                        fields.insert("height".to_string(), dims.height.into());
                    }
                    Ok(image)
                }
                Err(err) if policy == ProbeFailurePolicy::Skip => {
                    tracing::warn!(uri = %source, "skipping image size: {err}");
                    Ok(image)
                }
                Err(err) => Err(VideomatikError::Probe(err)),
            }
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
