use crate::runtime::telemetry;
use anyhow::{bail, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_NUMBER_OF_WORKERS: usize = 1;
const DEFAULT_SCAN_FREQUENCY_SECS: u64 = 60;
const DEFAULT_API_SLEEP_MS: u64 = 200;

/// Where the first scan window starts when the poller boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Scan from the beginning of the source's retained history.
    #[default]
    Beginning,
    /// Scan only from one scan-frequency before the initial window end.
    End,
}

impl FromStr for StartPosition {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "" | "beginning" => Ok(StartPosition::Beginning),
            "end" => Ok(StartPosition::End),
            other => bail!("start_position must be \"beginning\" or \"end\", got {other:?}"),
        }
    }
}

/// Runtime configuration for the poller.
///
/// All instances must be constructed via [`PollerConfig::builder`] so
/// invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    region: String,
    number_of_workers: usize,
    latency: Duration,
    scan_frequency: Duration,
    api_sleep: Duration,
    start_position: StartPosition,
    log_stream_names: Vec<String>,
    log_stream_name_prefix: Option<String>,
    metrics_interval: Duration,
}

impl PollerConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> PollerConfigBuilder {
        PollerConfigBuilder::default()
    }

    /// Region context attached to every processed page.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Number of concurrent fetch workers.
    pub fn number_of_workers(&self) -> usize {
        self.number_of_workers
    }

    /// Fixed offset subtracted from "now" when computing a window's end, to
    /// absorb upstream ingestion delay.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Pause between scan cycles, and the width of each steady-state window.
    pub fn scan_frequency(&self) -> Duration {
        self.scan_frequency
    }

    /// Delay inserted after every page request to stay under the source's
    /// calls-per-second quota.
    pub fn api_sleep(&self) -> Duration {
        self.api_sleep
    }

    pub fn start_position(&self) -> StartPosition {
        self.start_position
    }

    /// Stream-name allow-list applied to every query. Empty means unrestricted.
    pub fn log_stream_names(&self) -> &[String] {
        &self.log_stream_names
    }

    /// Stream-name prefix filter applied to every query.
    pub fn log_stream_name_prefix(&self) -> Option<&str> {
        self.log_stream_name_prefix.as_deref()
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            bail!("region cannot be empty");
        }

        if self.number_of_workers == 0 {
            bail!("number_of_workers must be greater than 0");
        }

        if self.scan_frequency.is_zero() {
            bail!("scan_frequency must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        if let Some(prefix) = &self.log_stream_name_prefix {
            if prefix.is_empty() {
                bail!("log_stream_name_prefix cannot be empty when set");
            }
        }

        if self.log_stream_names.iter().any(|name| name.is_empty()) {
            bail!("log_stream_names entries cannot be empty");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PollerConfigBuilder {
    region: Option<String>,
    number_of_workers: Option<usize>,
    latency: Option<Duration>,
    scan_frequency: Option<Duration>,
    api_sleep: Option<Duration>,
    start_position: Option<StartPosition>,
    log_stream_names: Option<Vec<String>>,
    log_stream_name_prefix: Option<String>,
    metrics_interval: Option<Duration>,
}

impl PollerConfigBuilder {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn number_of_workers(mut self, count: usize) -> Self {
        self.number_of_workers = Some(count);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn scan_frequency(mut self, frequency: Duration) -> Self {
        self.scan_frequency = Some(frequency);
        self
    }

    pub fn api_sleep(mut self, sleep: Duration) -> Self {
        self.api_sleep = Some(sleep);
        self
    }

    pub fn start_position(mut self, position: StartPosition) -> Self {
        self.start_position = Some(position);
        self
    }

    pub fn log_stream_names(mut self, names: Vec<String>) -> Self {
        self.log_stream_names = Some(names);
        self
    }

    pub fn log_stream_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_stream_name_prefix = Some(prefix.into());
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<PollerConfig> {
        let config = PollerConfig {
            region: self.region.map(trimmed_string).unwrap_or_default(),
            number_of_workers: self.number_of_workers.unwrap_or(DEFAULT_NUMBER_OF_WORKERS),
            latency: self.latency.unwrap_or(Duration::ZERO),
            scan_frequency: self
                .scan_frequency
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SCAN_FREQUENCY_SECS)),
            api_sleep: self
                .api_sleep
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_API_SLEEP_MS)),
            start_position: self.start_position.unwrap_or_default(),
            log_stream_names: self.log_stream_names.unwrap_or_default(),
            log_stream_name_prefix: self.log_stream_name_prefix,
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
        };

        config.validate()?;
        Ok(config)
    }
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> PollerConfigBuilder {
        PollerConfig::builder().region("eu-west-1")
    }

    #[test]
    fn builder_produces_valid_config_with_defaults() {
        let config = base_builder().build().unwrap();
        assert_eq!(config.region(), "eu-west-1");
        assert_eq!(config.number_of_workers(), DEFAULT_NUMBER_OF_WORKERS);
        assert_eq!(config.latency(), Duration::ZERO);
        assert_eq!(
            config.scan_frequency(),
            Duration::from_secs(DEFAULT_SCAN_FREQUENCY_SECS)
        );
        assert_eq!(
            config.api_sleep(),
            Duration::from_millis(DEFAULT_API_SLEEP_MS)
        );
        assert_eq!(config.start_position(), StartPosition::Beginning);
        assert!(config.log_stream_names().is_empty());
        assert_eq!(config.log_stream_name_prefix(), None);
        assert_eq!(
            config.metrics_interval(),
            telemetry::DEFAULT_METRICS_INTERVAL
        );
    }

    #[test]
    fn overrides_are_applied() {
        let config = base_builder()
            .number_of_workers(8)
            .latency(Duration::from_secs(30))
            .scan_frequency(Duration::from_secs(5))
            .api_sleep(Duration::from_millis(50))
            .start_position(StartPosition::End)
            .log_stream_names(vec!["audit".into(), "access".into()])
            .log_stream_name_prefix("prod-")
            .metrics_interval(Duration::from_secs(1))
            .build()
            .expect("config should build");

        assert_eq!(config.number_of_workers(), 8);
        assert_eq!(config.latency(), Duration::from_secs(30));
        assert_eq!(config.scan_frequency(), Duration::from_secs(5));
        assert_eq!(config.api_sleep(), Duration::from_millis(50));
        assert_eq!(config.start_position(), StartPosition::End);
        assert_eq!(config.log_stream_names(), ["audit", "access"]);
        assert_eq!(config.log_stream_name_prefix(), Some("prod-"));
        assert_eq!(config.metrics_interval(), Duration::from_secs(1));
    }

    #[test]
    fn region_is_required() {
        let err = PollerConfig::builder().build().unwrap_err();
        assert!(
            format!("{err}").contains("region"),
            "error should mention missing region"
        );
    }

    #[test]
    fn validation_catches_invalid_values() {
        let err = base_builder().number_of_workers(0).build().unwrap_err();
        assert!(
            format!("{err}").contains("number_of_workers"),
            "error should mention worker count"
        );

        let err = base_builder()
            .scan_frequency(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("scan_frequency"),
            "error should mention scan_frequency"
        );

        let err = base_builder()
            .metrics_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("metrics_interval"),
            "error should mention metrics_interval"
        );

        let err = base_builder()
            .log_stream_name_prefix("")
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("log_stream_name_prefix"),
            "error should mention the prefix"
        );
    }

    #[test]
    fn start_position_parses_known_values() {
        assert_eq!(
            "".parse::<StartPosition>().unwrap(),
            StartPosition::Beginning
        );
        assert_eq!(
            "beginning".parse::<StartPosition>().unwrap(),
            StartPosition::Beginning
        );
        assert_eq!("end".parse::<StartPosition>().unwrap(), StartPosition::End);
        assert!("middle".parse::<StartPosition>().is_err());
    }
}
