use crate::domain::{Reading, ReadingStatus};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum DialError {
    #[error("'{0}' is not a phone number")]
    InvalidNumber(String),
}

/// Places phone calls. Dialing hands over to the phone, it does not wait for the call to end.
#[async_trait]
pub trait Dialer: Debug + Send + Sync {
    async fn dial(&self, number: &str) -> Result<(), DialError>;
}

/// What the readings list offers next to a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingAction {
    Ok,
    EmergencyCall(CallPrompt),
}

pub fn reading_action(reading: &Reading, number: &str) -> ReadingAction {
    match CallPrompt::for_reading(reading, number) {
        Some(prompt) => ReadingAction::EmergencyCall(prompt),
        None => ReadingAction::Ok,
    }
}

/// A pending emergency call. Nothing is dialed until the operator confirms.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPrompt {
    number: String,
    reading_id: i64,
    temperature: f64,
    temperature_limit: f64,
}

impl CallPrompt {
    /// Only over-limit readings get a prompt.
    pub fn for_reading(reading: &Reading, number: &str) -> Option<CallPrompt> {
        match reading.status() {
            ReadingStatus::Ok => None,
            ReadingStatus::OverLimit => Some(CallPrompt {
                number: number.to_string(),
                reading_id: reading.id,
                temperature: reading.temperature,
                temperature_limit: reading.temperature_limit,
            }),
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn message(&self) -> String {
        format!(
            "Reading #{} is {:.1} °C, above the limit of {:.1} °C. Call {} now?",
            self.reading_id, self.temperature, self.temperature_limit, self.number
        )
    }

    #[instrument(skip_all, fields(reading_id = self.reading_id))]
    pub async fn confirm(self, dialer: &dyn Dialer) -> Result<(), DialError> {
        info!("📞 Dialing {}...", self.number);
        dialer.dial(&self.number).await?;
        info!("📞 Dialing {}... OK", self.number);
        Ok(())
    }

    pub fn dismiss(self) {
        info!(reading_id = self.reading_id, "Emergency call dismissed");
    }
}

/// Stand-in for a phone dialer on hosts that cannot place calls.
#[derive(Debug, Default)]
pub struct LogDialer;

#[async_trait]
impl Dialer for LogDialer {
    async fn dial(&self, number: &str) -> Result<(), DialError> {
        if !is_dialable(number) {
            return Err(DialError::InvalidNumber(number.to_string()));
        }
        warn!("☎️ No phone attached, pretending to call {}", number);
        Ok(())
    }
}

fn is_dialable(number: &str) -> bool {
    !number.is_empty() && number.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '*' | '#'))
}
