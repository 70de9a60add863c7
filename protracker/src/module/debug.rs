use crate::UiExt;

/// Manual capture and OCR, for checking the setup without tracking.
pub struct Debug {
	uniform: crate::Uniform,

	last_capture: Option<ie::OwnedImage>,
	difference: Option<u64>,
	encounter_text: String,
	location_text: String,
	message: Option<String>,
}

impl Debug {
	pub fn new(uniform: crate::Uniform) -> Self {
		Self {
			uniform,
			last_capture: None,
			difference: None,
			encounter_text: String::new(),
			location_text: String::new(),
			message: None,
		}
	}

	fn capture(&mut self) {
		let Some(image) = crate::capture::capture() else {
			self.message = Some(crate::tr!(
				"debug-capture-failed",
				window = crate::config_read().window_title.clone()
			));
			return;
		};

		self.difference = self
			.last_capture
			.as_ref()
			.and_then(|previous| ie::difference_sum(previous.as_image(), image.as_image()));
		self.message = Some(crate::tr!(
			"debug-captured",
			width = image.width(),
			height = image.height()
		));
		self.last_capture = Some(image);
	}

	fn run_ocr(&mut self) {
		let Some(image) = &self.last_capture else {
			return;
		};
		self.encounter_text = self.uniform.ie.encounter_text(image.as_image());
		self.location_text = self.uniform.ie.location_text(image.as_image());
		tracing::debug!(encounter = %self.encounter_text, location = %self.location_text, "debug ocr");
	}

	fn save_snapshot(&mut self) {
		let Some(image) = &self.last_capture else {
			return;
		};
		let path = self.uniform.store.dir().join("debug").join("snapshot.png");
		self.message = Some(match crate::capture::save_debug_png(image.as_image(), &path) {
			Ok(()) => crate::tr!("debug-saved", path = path.display().to_string()),
			Err(err) => format!("{err:#}"),
		});
	}
}

impl super::Module for Debug {
	fn name(&self) -> String {
		crate::tr!("module-debug")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			if ui.button(crate::tr!("debug-capture")).clicked() {
				self.capture();
			}
			let has_capture = self.last_capture.is_some();
			if ui
				.add_enabled(has_capture, egui::Button::new(crate::tr!("debug-ocr")))
				.clicked()
			{
				self.run_ocr();
			}
			if ui
				.add_enabled(has_capture, egui::Button::new(crate::tr!("debug-save")))
				.clicked()
			{
				self.save_snapshot();
			}
		});

		if let Some(message) = &self.message {
			ui.small(message.as_str());
		}

		if let Some(difference) = self.difference {
			let threshold = crate::config_read().change_threshold;
			ui.label(crate::tr!(
				"debug-difference",
				difference = difference,
				threshold = threshold,
				changed = (difference > threshold).to_string()
			));
		}

		if !self.encounter_text.is_empty() || !self.location_text.is_empty() {
			ui.spacer();
			ui.label(crate::tr!("debug-encounter-text"));
			ui.monospace(self.encounter_text.as_str());
			if let Some(line) = ie::screen::encounter::encounter_line(&self.encounter_text) {
				ui.label(crate::tr!("debug-banner", line = line.to_string()));
			}
			ui.spacer();
			ui.label(crate::tr!("debug-location-text"));
			ui.monospace(self.location_text.as_str());
		}
	}
}
