//! ProTracker.
//!
//! Watches the game client, counts wild encounters per location and keeps a
//! session and a historical table of them.

use std::sync::{Arc, LazyLock, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod capture;
mod config;
mod i18n;
mod module;
mod tally;
mod ui;
mod util;
mod watcher;
mod worker;

pub use ui::UiExt;

static CONFIG: LazyLock<RwLock<config::Config>> = LazyLock::new(|| RwLock::new(config::Config::load_or_default()));

pub fn config() -> RwLockWriteGuard<'static, config::Config> {
	CONFIG.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub fn config_read() -> RwLockReadGuard<'static, config::Config> {
	CONFIG.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub type Uniform = Arc<UniformData>;

/// State shared by the UI modules and the tracker thread.
pub struct UniformData {
	pub ie: Arc<ie::Ie>,
	pub spawns: data::SpawnList,
	pub locations: Arc<RwLock<data::HuntableLocations>>,
	pub store: data::LocationStore,
	pub tally: Mutex<tally::Tally>,
}

impl UniformData {
	pub fn sources<'a>(&'a self, locations: &'a data::HuntableLocations) -> tally::Sources<'a> {
		tally::Sources {
			store: &self.store,
			spawns: &self.spawns,
			locations,
		}
	}
}

fn main() -> eframe::Result {
	// Structured logging. Use `RUST_LOG=debug` etc.
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.init();

	let (locale, always_on_top) = {
		let config = config_read();
		(config.locale.clone(), config.always_on_top)
	};
	i18n::init(locale.as_deref());

	let options = eframe::NativeOptions {
		viewport: egui::ViewportBuilder::default()
			.with_title("ProTracker")
			.with_inner_size([760.0, 680.0])
			.with_min_inner_size([480.0, 360.0])
			.with_window_level(window_level(always_on_top)),
		..Default::default()
	};

	eframe::run_native(
		"ProTracker",
		options,
		Box::new(|cc| Ok(Box::new(ui::ProTracker::new(cc)))),
	)
}

pub fn window_level(always_on_top: bool) -> egui::WindowLevel {
	if always_on_top {
		egui::WindowLevel::AlwaysOnTop
	} else {
		egui::WindowLevel::Normal
	}
}
