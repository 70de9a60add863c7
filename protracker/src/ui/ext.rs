use std::{ops::RangeInclusive, sync::Arc};

pub trait UiExt {
	/// Combo box over a list that is expensive to build (window titles, etc).
	/// The list is fetched when the popup opens and dropped when it closes.
	fn combo_cached(&mut self, value: &mut String, label: &str, fetch: impl FnOnce() -> Vec<String>) -> bool;

	fn num_edit_range<T: egui::emath::Numeric>(
		&mut self,
		value: &mut T,
		label: &str,
		range: RangeInclusive<T>,
	) -> egui::Response;

	fn spacer(&mut self);
}

impl UiExt for egui::Ui {
	fn combo_cached(&mut self, value: &mut String, label: &str, fetch: impl FnOnce() -> Vec<String>) -> bool {
		let id = self.make_persistent_id(label);
		let mut changed = false;

		let response = egui::ComboBox::new(id, label)
			.selected_text(value.as_str())
			.show_ui(self, |ui| {
				let options = match ui.data(|d| d.get_temp::<Arc<Vec<String>>>(id)) {
					Some(options) => options,
					None => {
						let options = Arc::new(fetch());
						ui.data_mut(|d| d.insert_temp(id, options.clone()));
						options
					}
				};

				for option in options.iter() {
					changed |= ui
						.selectable_value(value, option.clone(), option.as_str())
						.changed();
				}
			});

		if response.inner.is_none() {
			self.data_mut(|d| d.remove::<Arc<Vec<String>>>(id));
		}

		changed
	}

	fn num_edit_range<T: egui::emath::Numeric>(
		&mut self,
		value: &mut T,
		label: &str,
		range: RangeInclusive<T>,
	) -> egui::Response {
		self.horizontal(|ui| {
			let response = ui.add(egui::DragValue::new(value).range(range).speed(0.1));
			ui.label(label);
			response
		})
		.inner
	}

	fn spacer(&mut self) {
		self.add_space(8.0);
	}
}
