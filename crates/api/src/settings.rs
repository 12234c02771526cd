//! Runtime settings
//!
//! Layered as: compiled defaults, then an optional TOML file, then `DMS_`
//! environment variables (`DMS_ENGINE__EAR_CONSEC_FRAMES=15`).

use camera_capture::CameraConfig;
use config::{Config, Environment, File};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::rate_limit::RateLimitConfig;
use crate::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: DmsConfig,
    pub broadcast: BroadcastSettings,
    pub camera: CameraSettings,
    pub server: ServerSettings,
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastSettings {
    /// Minimum seconds between two dashboard pushes
    pub emit_interval_secs: f64,
    /// Event labels carried per push
    pub recent_events: usize,
    /// Events kept in the in-memory log
    pub event_log_capacity: usize,
    /// Snapshots buffered per slow subscriber
    pub channel_capacity: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            emit_interval_secs: 0.5,
            recent_events: alerting::DEFAULT_RECENT_EVENTS,
            event_log_capacity: 50,
            channel_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Landmark recording replayed as the geometry source
    pub recording: Option<PathBuf>,
    /// Back-off after a failed capture (milliseconds)
    pub capture_backoff_ms: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let camera = CameraConfig::default();
        Self {
            width: camera.width,
            height: camera.height,
            fps: camera.fps,
            recording: None,
            capture_backoff_ms: dms::worker::DEFAULT_CAPTURE_BACKOFF_MS,
        }
    }
}

impl CameraSettings {
    pub fn capture_config(&self, max_frames: Option<u64>) -> CameraConfig {
        CameraConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            max_frames,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load configuration from a specific file path; a missing file is fine
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("DMS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.engine.validate()?;

        let broadcast = &self.broadcast;
        if !broadcast.emit_interval_secs.is_finite() || broadcast.emit_interval_secs <= 0.0 {
            return Err(ApiError::InvalidSettings(format!(
                "broadcast.emit_interval_secs must be positive, got {}",
                broadcast.emit_interval_secs
            )));
        }
        if broadcast.recent_events == 0 {
            return Err(ApiError::InvalidSettings("broadcast.recent_events must be at least 1".into()));
        }
        if broadcast.event_log_capacity == 0 {
            return Err(ApiError::InvalidSettings(
                "broadcast.event_log_capacity must be at least 1".into(),
            ));
        }
        if self.camera.fps == 0 {
            return Err(ApiError::InvalidSettings("camera.fps must be at least 1".into()));
        }
        if self.server.rate_limit.burst_size == 0 || self.server.rate_limit.per_second == 0 {
            return Err(ApiError::InvalidSettings(
                "server.rate_limit values must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load_from_file("/nonexistent/dms.toml").unwrap();
        assert_eq!(settings.engine, DmsConfig::default());
        assert_eq!(settings.broadcast.recent_events, 20);
        assert_eq!(settings.broadcast.event_log_capacity, 50);
        assert_eq!(settings.server.port, 5000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[engine]
ear_consec_frames = 8
mar_open_threshold = 0.8

[broadcast]
emit_interval_secs = 1.0

[server]
port = 8080
"#
        )
        .unwrap();

        let settings = Settings::load_from_file(file.path()).unwrap();
        assert_eq!(settings.engine.ear_consec_frames, 8);
        assert_eq!(settings.engine.mar_open_threshold, 0.8);
        assert_eq!(settings.engine.mar_close_threshold, 0.55);
        assert_eq!(settings.broadcast.emit_interval_secs, 1.0);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.broadcast.emit_interval_secs = 0.0;
        assert!(matches!(settings.validate(), Err(ApiError::InvalidSettings(_))));

        let mut settings = Settings::default();
        settings.broadcast.event_log_capacity = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.engine.mar_close_threshold = 0.9;
        assert!(matches!(settings.validate(), Err(ApiError::Dms(_))));
    }

    #[test]
    fn test_capture_config() {
        let camera = CameraSettings::default();
        let capture = camera.capture_config(Some(10));
        assert_eq!(capture.fps, 15);
        assert_eq!(capture.max_frames, Some(10));
    }
}
