use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;
use tracing::{info, warn};

use crate::{config::Config, timing::time_label::TimeLabel};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notify endpoint returned {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No access token is configured.
    Skipped,
}

/// Tells the coffee group chat, via LINE Notify, that a slot was booked.
#[derive(Clone)]
pub struct LineNotifier {
    client: Client,
    url: String,
    access_token: Option<String>,
}

impl LineNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            url: config.notify_url.clone(),
            access_token: config.access_token.clone(),
        }
    }

    /// The chat message for a booking of `slot` on `date`.
    pub fn booking_message(date: NaiveDate, slot: TimeLabel) -> String {
        format!("{}日の{}時間に予約が入りました。", date.format("%Y-%m-%d"), slot)
    }

    fn request(&self, token: &str, message: &str) -> RequestBuilder {
        self.client
            .post(&self.url)
            .bearer_auth(token)
            .form(&[("message", message)])
    }

    pub async fn notify_booking(
        &self,
        date: NaiveDate,
        slot: TimeLabel,
    ) -> Result<Delivery, NotifyError> {
        let Some(token) = self.access_token.as_deref() else {
            warn!(%date, %slot, "no access token configured, booking not forwarded");
            return Ok(Delivery::Skipped);
        };

        let message = Self::booking_message(date, slot);
        let response = self.request(token, &message).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Server {
                status: status.as_u16(),
                body,
            });
        }
        info!(%date, %slot, "booking notification sent");
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> Config {
        Config {
            database_path: ":memory:".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            // Nothing listens on port 1
            notify_url: "http://127.0.0.1:1/api/notify".to_string(),
            access_token: token.map(str::to_string),
        }
    }

    fn slot(label: &str) -> TimeLabel {
        TimeLabel::parse(label).unwrap()
    }

    #[test]
    fn message_names_date_and_slot() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(
            LineNotifier::booking_message(date, slot("15:30")),
            "2024-06-10日の15:30時間に予約が入りました。"
        );
    }

    #[test]
    fn request_carries_bearer_token_and_form_body() {
        let notifier = LineNotifier::new(&config(Some("secret")));
        let request = notifier.request("secret", "hello world").build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "http://127.0.0.1:1/api/notify");
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer secret"
        );
        assert_eq!(
            request.headers()["content-type"].to_str().unwrap(),
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|body| body.as_bytes()).unwrap();
        assert_eq!(body, b"message=hello+world");
    }

    #[tokio::test]
    async fn skips_without_token() {
        let notifier = LineNotifier::new(&config(None));
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(
            notifier.notify_booking(date, slot("09:00")).await.unwrap(),
            Delivery::Skipped
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let notifier = LineNotifier::new(&config(Some("secret")));
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(matches!(
            notifier.notify_booking(date, slot("09:00")).await,
            Err(NotifyError::Http(_))
        ));
    }
}
