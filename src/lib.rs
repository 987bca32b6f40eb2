//! # Videomatik SDK for Rust
//!
//! Async client for the [Videomatik](https://videomatik.com.br) video
//! rendering API. Fetch a template's custom JSON, edit it, submit a video
//! request, then poll or delete it.
//!
//! ## Quick start
//!
//! ```no_run
//! use videomatik::{Action, Client, CustomJsonOptions, NewVideoRequest};
//!
//! #[tokio::main]
//! async fn main() -> videomatik::Result<()> {
//!     let client = Client::new("your-api-key")?;
//!
//!     let template_id = "oferta-varejo-nujyuua";
//!     let mut custom_json = client
//!         .get_template_custom_json(template_id, CustomJsonOptions::with_image_sizes())
//!         .await?;
//!     for (index, source) in custom_json.image_sources().enumerate() {
//!         println!("{source}: {:?}", custom_json.image_dimensions(index));
//!     }
//!
//!     if let Some(texts) = custom_json.texts_mut() {
//!         texts[0]["value"] = "Hello".into();
//!     }
//!
//!     let request = NewVideoRequest::new(template_id, "feed", custom_json)
//!         .action(Action::webhook("https://example.com/video-done"));
//!     let video = client.create_video_request(&request).await?;
//!
//!     if let Some(id) = video.id.as_deref() {
//!         let video = client.get_one_video_request(id).await?;
//!         println!("{id} is {:?}", video.status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Builder pattern
//!
//! ```no_run
//! use videomatik::ClientBuilder;
//! use std::time::Duration;
//!
//! # fn example() -> videomatik::Result<()> {
//! let client = ClientBuilder::new()
//!     .client_credentials("client-id", "client-secret")
//!     .host("https://api.videomatik.com.br")
//!     .timeout(Duration::from_secs(120))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! Older API versions send a video request's `customJSON` as a JSON string.
//! The client always parses it, so [`VideoRequest::custom_json`] is structured.

mod client;
mod enrich;
mod errors;
mod models;
mod normalize;
mod probe;

pub use client::{Client, ClientBuilder, Credential};
pub use enrich::ProbeFailurePolicy;
pub use errors::{ProbeError, RequestDescriptor, Result, VideomatikError};
pub use models::{
    Action, CustomJson, CustomJsonOptions, Dimensions, NewVideoRequest, Pagination, VideoRequest,
};
pub use probe::{HttpImageProbe, ImageProbe};
