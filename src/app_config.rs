use config::{Config, ConfigError};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    api: Api,
    screen: Screen,
    emergency: Emergency,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("PREVENFIRE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn emergency(&self) -> &Emergency {
        &self.emergency
    }
}

#[derive(Debug, Deserialize)]
pub struct Api {
    url: String,
    #[serde(with = "humantime_serde")]
    request_timeout: Duration,
}

impl Api {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[derive(Debug, Deserialize)]
pub struct Screen {
    #[serde(with = "humantime_serde")]
    debounce: Duration,
    event_buffer_size: NonZeroUsize,
}

impl Screen {
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn event_buffer_size(&self) -> NonZeroUsize {
        self.event_buffer_size
    }
}

#[derive(Debug, Deserialize)]
pub struct Emergency {
    phone_number: String,
}

impl Emergency {
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                api: Api {
                    url: "http://prevenfire.local".to_string(),
                    request_timeout: Duration::from_secs(5),
                },
                screen: Screen {
                    debounce: Duration::from_millis(800),
                    event_buffer_size: NonZeroUsize::new(8).unwrap(),
                },
                emergency: Emergency {
                    phone_number: "193".to_string(),
                },
            },
        }
    }

    pub fn api_url(mut self, url: String) -> Self {
        self.config.api.url = url;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_human_readable_durations() -> Result<(), ConfigError> {
        let toml = r#"
            [api]
            url = "http://localhost:8080"
            request_timeout = "10s"

            [screen]
            debounce = "800ms"
            event_buffer_size = 32

            [emergency]
            phone_number = "193"
        "#;

        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        assert_eq!(config.api().url(), "http://localhost:8080");
        assert_eq!(config.api().request_timeout(), Duration::from_secs(10));
        assert_eq!(config.screen().debounce(), Duration::from_millis(800));
        assert_eq!(config.screen().event_buffer_size().get(), 32);
        assert_eq!(config.emergency().phone_number(), "193");
        Ok(())
    }

    #[test]
    fn rejects_an_empty_event_buffer() {
        let toml = r#"
            [api]
            url = "http://localhost:8080"
            request_timeout = "10s"

            [screen]
            debounce = "800ms"
            event_buffer_size = 0

            [emergency]
            phone_number = "193"
        "#;

        let result = Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize::<AppConfig>());

        assert!(result.is_err());
    }
}
