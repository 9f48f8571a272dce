//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

use cassette_core::DEFAULT_REDUNDANCY;

/// Host configuration. File: ~/.config/cassette/config.toml.
/// Env overrides: CASSETTE_BAUD_RATE, CASSETTE_MARK_FREQ,
/// CASSETTE_CONFIDENCE, CASSETTE_REDUNDANCY, CASSETTE_MODEM_BIN,
/// CASSETTE_OUTPUT_DIR.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Modem signalling rate in baud (default 1000).
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Mark frequency in Hz (default 5000).
    #[serde(default = "default_mark_freq")]
    pub mark_freq: u32,
    /// Receive detection confidence threshold (default 1.5).
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Reed-Solomon parity symbols per block. Both ends of a session must
    /// agree; the coded stream does not carry it (default 20).
    #[serde(default = "default_redundancy")]
    pub redundancy: usize,
    /// Path to the minimodem binary (default /usr/bin/minimodem).
    #[serde(default = "default_modem_bin")]
    pub modem_bin: PathBuf,
    /// Directory received files are written into (default ".").
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_baud_rate() -> u32 {
    1000
}
fn default_mark_freq() -> u32 {
    5000
}
fn default_confidence() -> f64 {
    1.5
}
fn default_redundancy() -> usize {
    DEFAULT_REDUNDANCY
}
fn default_modem_bin() -> PathBuf {
    PathBuf::from("/usr/bin/minimodem")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            mark_freq: default_mark_freq(),
            confidence: default_confidence(),
            redundancy: default_redundancy(),
            modem_bin: default_modem_bin(),
            output_dir: default_output_dir(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_else(Config::default);
    if let Ok(s) = std::env::var("CASSETTE_BAUD_RATE") {
        if let Ok(v) = s.parse::<u32>() {
            c.baud_rate = v;
        }
    }
    if let Ok(s) = std::env::var("CASSETTE_MARK_FREQ") {
        if let Ok(v) = s.parse::<u32>() {
            c.mark_freq = v;
        }
    }
    if let Ok(s) = std::env::var("CASSETTE_CONFIDENCE") {
        if let Ok(v) = s.parse::<f64>() {
            c.confidence = v;
        }
    }
    if let Ok(s) = std::env::var("CASSETTE_REDUNDANCY") {
        if let Ok(v) = s.parse::<usize>() {
            c.redundancy = v;
        }
    }
    if let Ok(s) = std::env::var("CASSETTE_MODEM_BIN") {
        c.modem_bin = PathBuf::from(s);
    }
    if let Ok(s) = std::env::var("CASSETTE_OUTPUT_DIR") {
        c.output_dir = PathBuf::from(s);
    }
    c
}

fn config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config/cassette/config.toml"))
}

fn load_file() -> Option<Config> {
    let p = config_path()?;
    if !p.exists() {
        return None;
    }
    let s = std::fs::read_to_string(&p).ok()?;
    toml::from_str::<Config>(&s).ok()
}
