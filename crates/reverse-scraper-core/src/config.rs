use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::probe::DEFAULT_MAX_PIXELS;

/// Bounds for the number of candidate links attempted per image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBounds {
    /// Value used when the user gives no usable number
    pub default: i64,

    /// Fewer attempts than this rarely find anything
    pub lower: i64,

    /// Past this many links a larger copy almost never turns up
    pub upper: i64,
}

impl Default for LinkBounds {
    fn default() -> Self {
        Self {
            default: 6,
            lower: 3,
            upper: 50,
        }
    }
}

impl LinkBounds {
    /// Clamp raw user input against these bounds
    pub fn resolve(&self, raw: Option<&str>) -> Result<usize> {
        clamp_link_count(raw, self.default, self.lower, self.upper)
    }
}

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for a reverse image search run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the images to search for
    pub input_dir: PathBuf,

    /// Folder receiving per-image match folders and the shared no-match folder
    pub output_dir: PathBuf,

    /// Name of the shared folder for images without a larger match
    pub no_match_folder: String,

    /// Candidate cap bounds
    pub links: LinkBounds,

    /// Reverse image search upload endpoint
    pub upload_endpoint: String,

    /// Base used to qualify relative links found on result pages
    pub site_base: String,

    /// Text of the link leading to the page listing every size
    pub anchor_label: String,

    /// File name of the note left when a candidate answered 403
    pub forbidden_note: String,

    /// Attempts made to write a candidate before giving up on it
    pub save_attempts: u32,

    /// Pause between write attempts, in milliseconds
    pub save_retry_delay_ms: u64,

    /// Largest pixel count the probe accepts
    pub max_pixels: u64,

    /// Number of worker threads (0 = physical cores)
    pub workers: usize,

    /// User agent presented to the search site
    pub user_agent: String,

    /// Where the rolling log file lives
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            no_match_folder: "(-) Default Results".to_string(),
            links: LinkBounds::default(),
            upload_endpoint: "http://www.google.com/searchbyimage/upload".to_string(),
            site_base: "https://www.google.com".to_string(),
            anchor_label: "All sizes".to_string(),
            forbidden_note: "Forbidden error - try manually searching.txt".to_string(),
            save_attempts: 10,
            save_retry_delay_ms: 100,
            max_pixels: DEFAULT_MAX_PIXELS,
            workers: 0, // Auto
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            log_dir: PathBuf::from("logs"),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.no_match_folder.trim().is_empty() {
            return Err(Error::Configuration(
                "No-match folder name must not be empty".to_string(),
            ));
        }

        let note = self.forbidden_note.trim();
        if note.is_empty() || note.contains(|c| c == '/' || c == '\\') {
            return Err(Error::Configuration(
                "Forbidden note must be a plain file name".to_string(),
            ));
        }

        if self.save_attempts == 0 {
            return Err(Error::Configuration(
                "At least one save attempt is required".to_string(),
            ));
        }

        if self.max_pixels == 0 {
            return Err(Error::Configuration(
                "Pixel limit must be greater than zero".to_string(),
            ));
        }

        url::Url::parse(&self.upload_endpoint)
            .map_err(|e| Error::Configuration(format!("Invalid upload endpoint: {}", e)))?;
        url::Url::parse(&self.site_base)
            .map_err(|e| Error::Configuration(format!("Invalid site base: {}", e)))?;

        // Bounds are checked the same way the cap itself is resolved
        self.links.resolve(None)?;

        Ok(())
    }

    pub fn save_retry_delay(&self) -> Duration {
        Duration::from_millis(self.save_retry_delay_ms)
    }

    /// Worker count, falling back to the number of physical cores
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::cmp::max(1, num_cpus::get_physical())
        }
    }
}

/// Turn raw user input into a candidate cap within `[lower, upper]`.
///
/// Bounds that are negative or out of order are a configuration error.
/// Input that is missing or not an integer yields `default`; integers that
/// overflow saturate toward the bound on their side.
pub fn clamp_link_count(raw: Option<&str>, default: i64, lower: i64, upper: i64) -> Result<usize> {
    if lower < 0 || upper < 0 || lower > upper {
        return Err(Error::InvalidBounds { lower, upper });
    }

    let requested = match raw.map(str::trim) {
        Some(text) => match text.parse::<i64>() {
            Ok(value) => value,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => upper,
                IntErrorKind::NegOverflow => lower,
                _ => default,
            },
        },
        None => default,
    };

    Ok(requested.clamp(lower, upper) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_within_bounds() {
        assert_eq!(clamp_link_count(Some("10"), 6, 3, 50).unwrap(), 10);
        assert_eq!(clamp_link_count(Some(" 12\n"), 6, 3, 50).unwrap(), 12);
    }

    #[test]
    fn test_clamp_below_and_above() {
        assert_eq!(clamp_link_count(Some("0"), 6, 3, 50).unwrap(), 3);
        assert_eq!(clamp_link_count(Some("-7"), 6, 3, 50).unwrap(), 3);
        assert_eq!(clamp_link_count(Some("100"), 6, 3, 50).unwrap(), 50);
    }

    #[test]
    fn test_clamp_non_numeric_falls_back_to_default() {
        for raw in ["", "\n", "\\\\", "10.5", "ٱلْعَرَبِيَّة", "six"] {
            assert_eq!(clamp_link_count(Some(raw), 6, 3, 50).unwrap(), 6, "input {:?}", raw);
        }
        assert_eq!(clamp_link_count(None, 6, 3, 50).unwrap(), 6);
    }

    #[test]
    fn test_clamp_overflow_saturates() {
        let googol = format!("1{}", "0".repeat(100));
        assert_eq!(clamp_link_count(Some(&googol), 6, 3, 50).unwrap(), 50);
        let negative = format!("-{}", googol);
        assert_eq!(clamp_link_count(Some(&negative), 6, 3, 50).unwrap(), 3);
    }

    #[test]
    fn test_clamp_default_outside_bounds_is_clamped() {
        assert_eq!(clamp_link_count(None, 1, 3, 50).unwrap(), 3);
    }

    #[test]
    fn test_clamp_rejects_bad_bounds() {
        assert!(matches!(
            clamp_link_count(Some("10"), 3, -10, -5),
            Err(Error::InvalidBounds { .. })
        ));
        assert!(matches!(
            clamp_link_count(Some("10"), 3, 10, 5),
            Err(Error::InvalidBounds { lower: 10, upper: 5 })
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.save_attempts = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = Config::default();
        config.links.lower = 60;
        assert!(matches!(config.validate(), Err(Error::InvalidBounds { .. })));

        let mut config = Config::default();
        config.upload_endpoint = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_note_paths() {
        for note in ["notes/forbidden.txt", "..\\forbidden.txt", "  "] {
            let mut config = Config::default();
            config.forbidden_note = note.to_string();
            assert!(
                matches!(config.validate(), Err(Error::Configuration(_))),
                "note {:?}",
                note
            );
        }
    }

    #[test]
    fn test_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reverse-scraper.json");

        let mut config = Config::default();
        config.workers = 3;
        config.links.default = 8;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.workers, 3);
        assert_eq!(loaded.links.default, 8);
        assert_eq!(loaded.no_match_folder, "(-) Default Results");
    }
}
