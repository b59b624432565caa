pub mod openai;
pub mod videos;

use anyhow::{Context, Result};

pub use openai::OpenAiChat;
pub use videos::OpenAiVideos;

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")
}
