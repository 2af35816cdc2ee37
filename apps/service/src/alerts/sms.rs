use std::time::Duration;

use anyhow::{Result, anyhow};

use super::Notifier;
use crate::config::TwilioConfig;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Twilio's hard cap on SMS body length.
const MAX_MESSAGE_LEN: usize = 1600;

/// SMS alert delivery through the Twilio REST API.
pub struct SmsNotifier {
    client: reqwest::Client,
    config: TwilioConfig,
    api_base: String,
}

impl SmsNotifier {
    pub fn new(config: TwilioConfig) -> Result<Self> {
        Self::with_api_base(config, TWILIO_API_BASE.to_string())
    }

    /// Same notifier against a different API host. Tests point this at
    /// a local endpoint.
    pub fn with_api_base(config: TwilioConfig, api_base: String) -> Result<Self> {
        // The scheduler must never hang on a notifier, so the client
        // carries its own hard timeout.
        let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self { client, config, api_base })
    }
}

#[async_trait::async_trait]
impl Notifier for SmsNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        let destination = destination.trim();
        if destination.len() != 10 {
            return Err(anyhow!("destination must be a 10-digit phone number"));
        }

        let message = message.trim();
        if message.is_empty() || message.len() > MAX_MESSAGE_LEN {
            return Err(anyhow!("message must be 1 to {MAX_MESSAGE_LEN} characters"));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.config.account_sid
        );
        let form = [
            ("From", format!("+1{}", self.config.from_phone)),
            ("To", format!("+1{destination}")),
            ("Body", message.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(anyhow!("twilio rejected the message: status {status}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "ACtest".to_string(),
            auth_token: "secret".to_string(),
            from_phone: "5005550006".to_string(),
        }
    }

    /// One-shot HTTP endpoint that replies 201 and captures the body.
    async fn serve_once() -> (String, tokio::sync::oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Keep reading until the form body after the blank line is
            // complete; small requests may still arrive split.
            loop {
                let n = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text
                        .lines()
                        .find_map(|line| line.to_ascii_lowercase().strip_prefix("content-length:").map(str::trim).map(str::to_string))
                        .and_then(|len| len.parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = "HTTP/1.1 201 Created\r\ncontent-length: 0\r\n\r\n";
            tokio::io::AsyncWriteExt::write_all(&mut socket, response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).to_string());
        });

        (format!("http://{addr}"), rx)
    }

    #[tokio::test]
    async fn posts_form_encoded_message() {
        let (api_base, request_rx) = serve_once().await;
        let notifier = SmsNotifier::with_api_base(test_config(), api_base).unwrap();

        notifier.send("5551234567", "check is down").await.unwrap();

        let request = request_rx.await.unwrap();
        assert!(request.contains("POST /2010-04-01/Accounts/ACtest/Messages.json"));
        assert!(request.contains("To=%2B15551234567"));
        assert!(request.contains("Body=check+is+down"));
    }

    #[tokio::test]
    async fn rejects_bad_destination_without_sending() {
        let notifier = SmsNotifier::new(test_config()).unwrap();
        assert!(notifier.send("123", "msg").await.is_err());
    }

    #[tokio::test]
    async fn rejects_oversized_message() {
        let notifier = SmsNotifier::new(test_config()).unwrap();
        let oversized = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(notifier.send("5551234567", &oversized).await.is_err());
    }
}
