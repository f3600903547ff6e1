//! Generate art for one job title and save both versions.
//!
//! Run with: `cargo run --example generate -- "Data Scientist"`
//!
//! Requires `API_KEY` (or `GEMINI_API_KEY` / `GOOGLE_API_KEY`).

use jobpost_art::{export, Config, JobTitle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Senior React Engineer".to_string());

    let pipeline = Config::from_env()?.build_pipeline()?;
    let title = JobTitle::parse(&raw)?;

    let generation = pipeline.run(&title).await?;
    println!("Creative prompt: {}", generation.prompt);

    for (i, image) in generation.images.iter().enumerate() {
        let path = export::export_image(image, &title, ".".as_ref()).await?;
        println!("Version {}: {}", i + 1, path.display());
    }

    Ok(())
}
