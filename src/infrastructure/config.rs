use crate::application::error::PipelineError;
use crate::application::graph_publisher::{Credentials, PublishTarget};
use crate::domain::chart::ChartSpec;
use crate::domain::series::{Archive, DataSource, SeriesId, StoreSchema};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config/speedchart";
const CONFIG_FILE_ENV: &str = "SPEEDCHART_CONFIG";
const ENV_PREFIX: &str = "SPEEDCHART";

/// Fully resolved configuration, built once at startup and passed down by value.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default = "SeriesSettings::ping")]
    pub ping: SeriesSettings,
    #[serde(default = "SeriesSettings::upload")]
    pub upload: SeriesSettings,
    #[serde(default = "SeriesSettings::download")]
    pub download: SeriesSettings,
    #[serde(default)]
    pub graph_upload: UploadSettings,
    #[serde(default)]
    pub speedtest: SpeedtestSettings,
    #[serde(default)]
    pub rrdtool: RrdToolSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneralSettings {
    pub measure: bool,
    pub log_level: String,
    pub store_path: PathBuf,
    pub graph_path: PathBuf,
    /// Defaults to the store path with a `.lock` extension
    pub lock_path: Option<PathBuf>,
    /// Directory for per-series charts; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            measure: true,
            log_level: "info".to_string(),
            store_path: PathBuf::from("./data/speed.rrd"),
            graph_path: PathBuf::from("./data/graph.png"),
            lock_path: None,
            temp_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    pub step_secs: u64,
    pub heartbeat_secs: u64,
    pub xff: f64,
    pub steps_per_row: u32,
    pub rows: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            step_secs: 1800,
            heartbeat_secs: 3600,
            xff: 0.5,
            steps_per_row: 2,
            rows: 168,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphSettings {
    pub width: u32,
    pub height: u32,
    pub window_secs: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 200,
            window_secs: 7 * 24 * 3600,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SeriesSettings {
    /// Upper bound of the gauge and of the chart axis
    pub max: f64,
    /// Reference line drawn on the chart
    pub min: f64,
    pub color: String,
}

impl SeriesSettings {
    fn ping() -> Self {
        Self {
            max: 100.0,
            min: 30.0,
            color: "FF8800".to_string(),
        }
    }

    fn upload() -> Self {
        Self {
            max: 50.0,
            min: 10.0,
            color: "00AA00".to_string(),
        }
    }

    fn download() -> Self {
        Self {
            max: 250.0,
            min: 50.0,
            color: "0000FF".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            store: StoreSettings::default(),
            graph: GraphSettings::default(),
            ping: SeriesSettings::ping(),
            upload: SeriesSettings::upload(),
            download: SeriesSettings::download(),
            graph_upload: UploadSettings::default(),
            speedtest: SpeedtestSettings::default(),
            rrdtool: RrdToolSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UploadSettings {
    pub enable: bool,
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// File name appended to `url`
    pub remote_name: String,
    pub timeout_secs: u64,
    /// Count a non-2xx response as a failed run
    pub fail_on_error_status: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enable: false,
            url: None,
            user: None,
            password: None,
            remote_name: "graph.png".to_string(),
            timeout_secs: 30,
            fail_on_error_status: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpeedtestSettings {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for SpeedtestSettings {
    fn default() -> Self {
        Self {
            command: "speedtest-cli".to_string(),
            args: vec!["--json".to_string()],
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RrdToolSettings {
    pub binary: String,
    pub timeout_secs: u64,
}

impl Default for RrdToolSettings {
    fn default() -> Self {
        Self {
            binary: "rrdtool".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Load settings from `config/speedchart.*` (or `$SPEEDCHART_CONFIG`) and
/// `SPEEDCHART__<SECTION>__<KEY>` environment variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    load_settings_from(&file)
}

pub fn load_settings_from(file: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl Settings {
    pub fn series(&self, series: SeriesId) -> &SeriesSettings {
        match series {
            SeriesId::Ping => &self.ping,
            SeriesId::Upload => &self.upload,
            SeriesId::Download => &self.download,
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        self.general
            .lock_path
            .clone()
            .unwrap_or_else(|| self.general.store_path.with_extension("lock"))
    }

    /// Schema used when the store does not exist yet.
    pub fn store_schema(&self) -> StoreSchema {
        let heartbeat = Duration::from_secs(self.store.heartbeat_secs);
        StoreSchema {
            step: Duration::from_secs(self.store.step_secs),
            data_sources: SeriesId::ALL
                .iter()
                .map(|&series| DataSource {
                    series,
                    heartbeat,
                    min: 0.0,
                    max: self.series(series).max,
                })
                .collect(),
            archive: Archive {
                xff: self.store.xff,
                steps_per_row: self.store.steps_per_row,
                rows: self.store.rows,
            },
        }
    }

    pub fn chart_specs(&self) -> HashMap<SeriesId, ChartSpec> {
        SeriesId::ALL
            .iter()
            .map(|&series| {
                let s = self.series(series);
                let spec = ChartSpec {
                    width: self.graph.width,
                    height: self.graph.height,
                    color: s.color.trim_start_matches('#').to_string(),
                    axis_max: s.max,
                    threshold_min: s.min,
                    window: Duration::from_secs(self.graph.window_secs),
                };
                (series, spec)
            })
            .collect()
    }

    /// Resolve where the graph is published, if publishing is enabled.
    ///
    /// Fails when publishing is enabled but the url, user or password is missing.
    pub fn publish_target(&self) -> Result<Option<PublishTarget>, PipelineError> {
        let upload = &self.graph_upload;
        if !upload.enable {
            return Ok(None);
        }

        let missing: Vec<&str> = [
            ("url", &upload.url),
            ("user", &upload.user),
            ("password", &upload.password),
        ]
        .iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(PipelineError::ConfigValidation(format!(
                "graph upload enabled but missing {}",
                missing.join(", ")
            )));
        }

        let url = upload.url.as_deref().unwrap_or_default();
        Ok(Some(PublishTarget {
            endpoint_url: format!(
                "{}/{}",
                url.trim_end_matches('/'),
                upload.remote_name.trim_start_matches('/')
            ),
            credentials: Credentials {
                username: upload.user.clone().unwrap_or_default(),
                password: upload.password.clone().unwrap_or_default(),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn upload_enabled() -> Settings {
        let mut settings = Settings::default();
        settings.graph_upload.enable = true;
        settings.graph_upload.url = Some("https://cloud.example.com/remote.php/dav/files/me/".to_string());
        settings.graph_upload.user = Some("me".to_string());
        settings.graph_upload.password = Some("secret".to_string());
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.general.measure);
        assert!(!settings.graph_upload.enable);
        assert_eq!(settings.lock_path(), PathBuf::from("./data/speed.lock"));
        assert_eq!(settings.store_schema().archive.declaration(), "RRA:MAX:0.5:2:168");
        assert_eq!(settings.ping, SeriesSettings::ping());
    }

    #[test]
    fn test_schema_uses_series_max() {
        let mut settings = Settings::default();
        settings.upload.max = 40.0;
        let schema = settings.store_schema();
        let names: Vec<String> = schema.data_sources.iter().map(|ds| ds.declaration()).collect();
        assert_eq!(names[1], "DS:upload:GAUGE:3600:0:40");
        assert_eq!(schema.step, Duration::from_secs(1800));
    }

    #[test]
    fn test_chart_specs_strip_hash() {
        let mut settings = Settings::default();
        settings.download.color = "#123456".to_string();
        let specs = settings.chart_specs();
        assert_eq!(specs[&SeriesId::Download].color, "123456");
        assert_eq!(specs[&SeriesId::Download].axis_max, 250.0);
        assert_eq!(specs[&SeriesId::Ping].window, Duration::from_secs(604_800));
    }

    #[test]
    fn test_publish_disabled_needs_nothing() {
        assert_eq!(Settings::default().publish_target().unwrap(), None);
    }

    #[test]
    fn test_publish_target_endpoint() {
        let target = upload_enabled().publish_target().unwrap().unwrap();
        assert_eq!(
            target.endpoint_url,
            "https://cloud.example.com/remote.php/dav/files/me/graph.png"
        );
        assert_eq!(target.credentials.username, "me");
    }

    #[test]
    fn test_missing_password_is_validation_error() {
        let mut settings = upload_enabled();
        settings.graph_upload.password = None;
        let err = settings.publish_target().unwrap_err();
        assert!(matches!(err, PipelineError::ConfigValidation(ref msg) if msg.contains("password")));

        settings.graph_upload.password = Some("  ".to_string());
        assert!(settings.publish_target().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[general]
measure = false
store_path = "/var/lib/speedchart/speed.rrd"

[graph]
width = 400

[ping]
max = 80
min = 20
color = "FF0000"

[graph_upload]
enable = true
url = "https://example.com/dav"
user = "me"
password = "pw"
"#
        )
        .unwrap();

        let settings = load_settings_from(file.path().to_str().unwrap()).unwrap();
        assert!(!settings.general.measure);
        assert_eq!(settings.general.log_level, "info");
        assert_eq!(settings.graph.width, 400);
        assert_eq!(settings.graph.height, 200);
        assert_eq!(settings.ping.max, 80.0);
        assert_eq!(settings.upload, SeriesSettings::upload());
        assert_eq!(
            settings.lock_path(),
            PathBuf::from("/var/lib/speedchart/speed.lock")
        );
        assert!(settings.publish_target().unwrap().is_some());
    }
}
