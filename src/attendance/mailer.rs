use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

/// Outbound mail seam. Implementations reject on delivery failure; callers
/// decide whether that aborts anything (the notifier deliberately does not).
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Mail relay client. The school's mail gateway accepts a JSON POST and
/// returns a non-2xx status on rejection.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_token: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_token,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("mail relay returned {}", response.status());
        }

        Ok(())
    }
}
