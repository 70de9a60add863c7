//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Case-insensitive substring of the game client's window title.
	pub window_title: String,

	/// Delay (seconds) between two screenshots of the game window.
	pub poll_delay_s: f32,

	/// Minimum sum of per-channel pixel differences between two screenshots
	/// for the screen to count as changed.
	pub change_threshold: u64,

	/// Optional max capture height (downscales large captures before diffing and OCR).
	pub max_capture_height: Option<u32>,

	/// Write the historical table after this many encounters (0 = only on stop/location change).
	pub autosave_every: u32,

	/// Where the per-location tables live. Defaults to the platform data directory.
	pub data_dir: Option<PathBuf>,

	/// Keep the tracker window above the game client.
	pub always_on_top: bool,

	/// Forced UI locale (e.g. `en`), otherwise the system locale.
	pub locale: Option<String>,

	/// Location selected when the app was last closed.
	pub last_location: Option<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			window_title: "PROClient".to_string(),
			poll_delay_s: 0.5,
			change_threshold: ie::DEFAULT_CHANGE_THRESHOLD,
			max_capture_height: None,
			autosave_every: 10,
			data_dir: None,
			always_on_top: false,
			locale: None,
			last_location: None,
		}
	}
}

impl Config {
	/// Path to the config file.
	pub fn path() -> Result<PathBuf> {
		let base = dirs::config_dir().context("config_dir() unavailable")?;
		Ok(base.join("protracker.json"))
	}

	/// Load configuration from disk, falling back to defaults on any error.
	pub fn load_or_default() -> Self {
		match Self::try_load() {
			Ok(cfg) => cfg,
			Err(err) => {
				tracing::warn!(error = %err, "failed to load config; using defaults");
				Self::default()
			}
		}
	}

	pub fn try_load() -> Result<Self> {
		let path = Self::path()?;
		if !path.exists() {
			return Ok(Self::default());
		}
		let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
		Self::from_json(&json).with_context(|| format!("parse {:?}", path))
	}

	fn from_json(json: &str) -> Result<Self> {
		let mut cfg: Self = serde_json::from_str(json)?;
		cfg.poll_delay_s = cfg.poll_delay_s.clamp(0.1, 60.0);
		Ok(cfg)
	}

	pub fn save(&self) -> Result<()> {
		let path = Self::path()?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
		}
		let json = serde_json::to_string_pretty(self).context("serialize config")?;
		fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
		Ok(())
	}

	/// Directory holding the per-location JSON tables.
	pub fn data_dir(&self) -> PathBuf {
		self.data_dir.clone().unwrap_or_else(|| {
			dirs::data_dir()
				.unwrap_or_else(|| PathBuf::from("."))
				.join("ProTracker")
				.join("data")
		})
	}
}
