use anyhow::Context;
use async_trait::async_trait;

use super::Mailer;

/// Mail delivery through a Mailgun-style HTTP API: one form POST per
/// message, api key as basic auth.
pub struct HttpApiMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl HttpApiMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for HttpApiMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.api_url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from.as_str()),
                ("to", to),
                ("subject", subject),
                ("text", body),
            ])
            .send()
            .await
            .context("failed to reach mail API")?
            .error_for_status()
            .context("mail API returned error")?;

        Ok(())
    }
}
