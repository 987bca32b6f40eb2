//! Quick-start walkthrough of the Videomatik Rust SDK.
//!
//! Run with:
//!   VIDEOMATIK_API_KEY=... cargo run --example quickstart
//!
//! or with VIDEOMATIK_CLIENT_ID and VIDEOMATIK_CLIENT_SECRET set instead.

use videomatik::{Action, ClientBuilder, CustomJsonOptions, NewVideoRequest, Pagination};

const TEMPLATE_ID: &str = "oferta-varejo-nujyuua";

#[tokio::main]
async fn main() -> videomatik::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Create a client (reads credentials from the environment)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new().build()?;

    // -----------------------------------------------------------------------
    // 2. List template compositions
    // -----------------------------------------------------------------------
    let compositions = client.get_template_compositions(TEMPLATE_ID).await?;
    println!("Compositions: {compositions:#}");

    // -----------------------------------------------------------------------
    // 3. Fetch and edit the template's custom JSON
    // -----------------------------------------------------------------------
    let mut custom_json = client
        .get_template_custom_json(TEMPLATE_ID, CustomJsonOptions::with_image_sizes())
        .await?;
    for (index, image) in custom_json.images().into_iter().flatten().enumerate() {
        println!(
            "  {} ({:?})",
            image["source"].as_str().unwrap_or("<no source>"),
            custom_json.image_dimensions(index)
        );
    }
    if let Some(text) = custom_json.texts_mut().and_then(|texts| texts.get_mut(4)) {
        text["value"] = "change text".into();
    }

    // -----------------------------------------------------------------------
    // 4. Request a video, with a webhook called on completion
    // -----------------------------------------------------------------------
    let request = NewVideoRequest::new(TEMPLATE_ID, "feed", custom_json)
        .action(Action::webhook("http://localhost:3000/videoRequestCompleted"));
    let video = client.create_video_request(&request).await?;
    let Some(id) = video.id else {
        println!("Server returned a video request without an id");
        return Ok(());
    };
    println!("Created video request {id}");

    // -----------------------------------------------------------------------
    // 5. Check its status later
    // -----------------------------------------------------------------------
    let video = client.get_one_video_request(&id).await?;
    println!("Status: {}", video.status().unwrap_or("unknown"));

    // -----------------------------------------------------------------------
    // 6. Page through recent requests
    // -----------------------------------------------------------------------
    let mut offset = 0;
    loop {
        let page = client
            .list_video_requests(Pagination::new(10, offset))
            .await?;
        for video in &page {
            println!(
                "  {:?} | {:?} | {:?}",
                video.id,
                video.template_id,
                video.status()
            );
        }
        if page.len() < 10 {
            break;
        }
        offset += 10;
    }

    Ok(())
}
