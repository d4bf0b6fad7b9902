use crate::app_config;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_EVENT_BUFFER_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// Settings every screen actor is spawned with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSettings {
    pub debounce: Duration,
    pub event_buffer_size: NonZeroUsize,
}

impl From<&app_config::Screen> for ScreenSettings {
    fn from(config: &app_config::Screen) -> Self {
        ScreenSettings {
            debounce: config.debounce(),
            event_buffer_size: config.event_buffer_size(),
        }
    }
}

impl Default for ScreenSettings {
    fn default() -> Self {
        ScreenSettings {
            debounce: Duration::from_millis(800),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("screen is closed")]
pub struct ScreenClosed;

/// Message shown whenever the backend could not be reached; the operator retries by hand.
pub const CONNECTION_FAILURE: &str = "Could not reach the server. Check your connection and try again.";
