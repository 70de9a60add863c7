use std::{
	path::PathBuf,
	sync::{Arc, Mutex, RwLock},
};

mod ext;
pub use ext::UiExt;

mod settings;

use crate::util::assets;

pub struct ProTracker {
	uniform: crate::Uniform,
	modules: Vec<Box<dyn crate::module::Module>>,

	tab: Tab,
	always_on_top: bool,

	_locations_watcher: Option<crate::watcher::LocationsWatcher>,
}

impl ProTracker {
	pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
		let (data_dir, autosave_every, always_on_top) = {
			let config = crate::config_read();
			(config.data_dir(), config.autosave_every, config.always_on_top)
		};

		// Missing model files leave OCR disabled; the home tab explains why.
		let ie = match assets::resolve_ocr_assets("latin") {
			Ok(ocr) => ie::Ie::new(ocr.detection, ocr.recognition, ocr.charset),
			Err(err) => {
				tracing::warn!("{err:#}");
				ie::Ie::disabled(format!("{err:#}"))
			}
		};

		let spawns = match assets::spawns_path() {
			Ok(path) => data::SpawnList::load(path),
			Err(err) => {
				tracing::warn!("{err:#}");
				data::SpawnList::default()
			}
		};
		tracing::info!(count = spawns.len(), "loaded spawn list");

		let locations_path = assets::huntable_locations_path();
		let locations = match &locations_path {
			Ok(path) => data::HuntableLocations::load(path).unwrap_or_else(|err| {
				tracing::warn!("{err:#}");
				data::HuntableLocations::default()
			}),
			Err(err) => {
				tracing::warn!("{err:#}");
				data::HuntableLocations::default()
			}
		};
		let locations = Arc::new(RwLock::new(locations));
		let locations_watcher = locations_path
			.ok()
			.and_then(|path: PathBuf| {
				crate::watcher::LocationsWatcher::spawn(path, locations.clone())
					.inspect_err(|err| tracing::warn!("Live reload of locations disabled: {err:#}"))
					.ok()
			});

		tracing::info!(path = %data_dir.display(), "location tables directory");
		let uniform = Arc::new(crate::UniformData {
			ie: Arc::new(ie),
			spawns,
			locations,
			store: data::LocationStore::new(data_dir),
			tally: Mutex::new(crate::tally::Tally::new(autosave_every)),
		});

		let modules: Vec<Box<dyn crate::module::Module>> = vec![
			Box::new(crate::module::Encounters::new(uniform.clone())),
			Box::new(crate::module::Debug::new(uniform.clone())),
		];

		Self {
			uniform,
			modules,
			tab: Tab::Home,
			always_on_top,
			_locations_watcher: locations_watcher,
		}
	}

	fn ui_home(&mut self, ui: &mut egui::Ui) {
		if !self.uniform.ie.ocr_available() {
			ui.group(|ui| {
				ui.label(egui::RichText::new(crate::tr!("ocr-missing")).strong());
				if let Some(err) = self.uniform.ie.ocr_init_error() {
					ui.add_space(4.0);
					ui.small(err);
				}
			});
			ui.add_space(6.0);
		}
		for module in &mut self.modules {
			module.ui_important(ui);
		}
	}

	fn ui_settings(&mut self, ui: &mut egui::Ui) {
		settings::ui(ui, &mut self.modules);
	}

	fn ui_debug(&mut self, ui: &mut egui::Ui) {
		for module in &mut self.modules {
			ui.collapsing(module.name(), |ui| module.ui(ui));
		}
	}
}

impl eframe::App for ProTracker {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		let always_on_top = crate::config_read().always_on_top;
		if always_on_top != self.always_on_top {
			self.always_on_top = always_on_top;
			ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(crate::window_level(always_on_top)));
		}

		egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
			ui.horizontal(|ui| {
				ui.selectable_value(&mut self.tab, Tab::Home, crate::tr!("tab-home"));
				ui.selectable_value(&mut self.tab, Tab::Settings, crate::tr!("tab-settings"));
				ui.selectable_value(&mut self.tab, Tab::Debug, crate::tr!("tab-debug"));
			});
		});

		egui::CentralPanel::default().show(ctx, |ui| match self.tab {
			Tab::Home => self.ui_home(ui),
			Tab::Settings => self.ui_settings(ui),
			Tab::Debug => self.ui_debug(ui),
		});

		for module in &mut self.modules {
			module.tick(ctx);
		}
	}
}

impl Drop for ProTracker {
	fn drop(&mut self) {
		for module in &mut self.modules {
			module.shutdown();
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tab {
	Home,
	Settings,
	Debug,
}
