// HTTP client for a running Veritas server

use anyhow::{anyhow, Context, Result};
use reqwest::Client;

use crate::models::AskRequest;
use crate::rag::Answer;

pub struct VeritasClient {
    client: Client,
    base_url: String,
}

impl VeritasClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn ask(&self, query: &str) -> Result<Answer> {
        let url = format!("{}/ask", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AskRequest {
                query: query.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("Connection to {} failed. Is the server running?", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Error ({}): {}", status, body));
        }

        Ok(response.json().await?)
    }
}
