use crate::ui::ext::UiExt;

const LOCALES: [&str; 1] = ["en"];

pub fn ui(ui: &mut egui::Ui, modules: &mut [Box<dyn crate::module::Module>]) {
	let mut config = crate::config();
	let mut changed = false;

	ui.label(crate::tr!("settings-capture"));
	changed |= ui.combo_cached(&mut config.window_title, &crate::tr!("settings-window"), crate::capture::window_titles);
	ui.horizontal(|ui| {
		changed |= ui.text_edit_singleline(&mut config.window_title).changed();
		ui.small(crate::tr!("settings-window-hint"));
	});

	changed |= ui
		.num_edit_range(&mut config.poll_delay_s, &crate::tr!("settings-poll-delay"), 0.1..=60.0)
		.changed();
	changed |= ui
		.num_edit_range(
			&mut config.change_threshold,
			&crate::tr!("settings-change-threshold"),
			0..=u64::MAX,
		)
		.changed();

	let mut limit_height = config.max_capture_height.is_some();
	if ui
		.checkbox(&mut limit_height, crate::tr!("settings-limit-height"))
		.changed()
	{
		config.max_capture_height = limit_height.then_some(720);
		changed = true;
	}
	if let Some(height) = &mut config.max_capture_height {
		changed |= ui
			.num_edit_range(height, &crate::tr!("settings-max-height"), 120..=4320)
			.changed();
	}

	ui.separator();
	ui.label(crate::tr!("settings-tables"));
	changed |= ui
		.num_edit_range(&mut config.autosave_every, &crate::tr!("settings-autosave"), 0..=1000)
		.changed();
	ui.horizontal(|ui| {
		ui.label(crate::tr!("settings-data-dir"));
		ui.monospace(config.data_dir().display().to_string());
	});
	ui.small(crate::tr!("settings-restart-hint"));

	ui.separator();
	ui.label(crate::tr!("settings-window-behavior"));
	changed |= ui
		.checkbox(&mut config.always_on_top, crate::tr!("settings-always-on-top"))
		.changed();

	let system = crate::tr!("settings-locale-system");
	let selected = config.locale.clone().unwrap_or_else(|| system.clone());
	let mut locale_changed = false;
	egui::ComboBox::from_label(crate::tr!("settings-locale"))
		.selected_text(selected)
		.show_ui(ui, |ui| {
			locale_changed |= ui.selectable_value(&mut config.locale, None, system).changed();
			for tag in LOCALES {
				locale_changed |= ui
					.selectable_value(&mut config.locale, Some(tag.to_string()), tag)
					.changed();
			}
		});
	if locale_changed {
		crate::i18n::set_locale(config.locale.as_deref());
		changed = true;
	}

	for module in modules {
		ui.spacer();
		changed |= module.ui_settings(ui, &mut config);
	}

	if changed && let Err(err) = config.save() {
		tracing::warn!("Failed to save config: {err:#}");
	}
}
