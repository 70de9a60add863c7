use std::{sync::PoisonError, time::Duration};

use data::{EncounterTable, TimeOfDay};

use crate::{
	UiExt,
	tally::{self, Outcome},
	worker::{Tracker, TrackerStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clear {
	Session,
	Historical,
}

/// Location picker, tracker controls and the two encounter tables.
pub struct Encounters {
	uniform: crate::Uniform,
	tracker: Tracker,

	selection: Option<String>,
	pending_clear: Option<Clear>,
}

impl Encounters {
	pub fn new(uniform: crate::Uniform) -> Self {
		let mut this = Self {
			tracker: Tracker::new(uniform.clone()),
			uniform,
			selection: None,
			pending_clear: None,
		};

		let last = crate::config_read().last_location.clone();
		if let Some(location) = last
			&& this.location_names().contains(&location)
		{
			this.selection = Some(location);
			this.show_selection();
		}
		this
	}

	fn location_names(&self) -> Vec<String> {
		self.uniform
			.locations
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.names()
			.to_vec()
	}

	/// Loads the selected location's historical table.
	fn show_selection(&mut self) {
		let Some(location) = self.selection.clone() else {
			return;
		};
		let locations = self
			.uniform
			.locations
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();
		let selected = tally::lock(&self.uniform.tally).select_location(&location, self.uniform.sources(&locations));
		if let Err(err) = selected {
			tracing::warn!("Failed to show {location}: {err:#}");
			return;
		}

		let mut config = crate::config();
		config.last_location = Some(location);
		if let Err(err) = config.save() {
			tracing::warn!("Failed to save config: {err:#}");
		}
	}

	fn clear(&mut self, which: Clear) {
		let mut tally = tally::lock(&self.uniform.tally);
		match which {
			Clear::Session => tally.clear_session(),
			Clear::Historical => {
				if let Err(err) = tally.clear_historical(&self.uniform.store) {
					tracing::warn!("Failed to clear historical table: {err:#}");
				}
			}
		}
	}

	fn ui_controls(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			let names = self.location_names();
			let selected_text = self
				.selection
				.clone()
				.unwrap_or_else(|| crate::tr!("select-location"));
			egui::ComboBox::from_id_salt("location")
				.selected_text(selected_text)
				.width(220.0)
				.show_ui(ui, |ui| {
					for name in names {
						let label = name.clone();
						ui.selectable_value(&mut self.selection, Some(name), label);
					}
				});

			if ui
				.add_enabled(self.selection.is_some(), egui::Button::new(crate::tr!("show-selection")))
				.clicked()
			{
				self.show_selection();
			}
		});

		ui.horizontal(|ui| {
			let running = self.tracker.is_running();
			if ui
				.add_enabled(!running, egui::Button::new(crate::tr!("begin-tracking")))
				.clicked()
			{
				self.tracker.start();
			}
			if ui
				.add_enabled(running, egui::Button::new(crate::tr!("stop-tracking")))
				.clicked()
			{
				self.tracker.stop();
			}

			ui.separator();
			if ui.button(crate::tr!("clear-session")).clicked() {
				self.pending_clear = Some(Clear::Session);
			}
			if ui.button(crate::tr!("clear-historical")).clicked() {
				self.pending_clear = Some(Clear::Historical);
			}
		});
	}

	fn ui_confirm(&mut self, ctx: &egui::Context) {
		let Some(which) = self.pending_clear else {
			return;
		};
		let question = match which {
			Clear::Session => crate::tr!("confirm-clear-session"),
			Clear::Historical => crate::tr!("confirm-clear-historical"),
		};

		let mut answer = None;
		egui::Window::new(crate::tr!("confirm-title"))
			.collapsible(false)
			.resizable(false)
			.anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
			.show(ctx, |ui| {
				ui.label(question);
				ui.horizontal(|ui| {
					if ui.button(crate::tr!("yes")).clicked() {
						answer = Some(true);
					}
					if ui.button(crate::tr!("no")).clicked() {
						answer = Some(false);
					}
				});
			});

		match answer {
			Some(true) => {
				self.clear(which);
				self.pending_clear = None;
			}
			Some(false) => self.pending_clear = None,
			None => {}
		}
	}

	fn ui_status(&self, ui: &mut egui::Ui) {
		let tally = tally::lock(&self.uniform.tally);
		ui.horizontal(|ui| {
			let status = match self.tracker.status() {
				TrackerStatus::Idle => crate::tr!("status-idle"),
				TrackerStatus::WaitingForWindow => crate::tr!(
					"status-waiting",
					window = crate::config_read().window_title.clone()
				),
				TrackerStatus::Tracking => crate::tr!("status-tracking"),
				TrackerStatus::WindowClosed => crate::tr!("status-window-closed"),
			};
			ui.label(status);

			if let Some(elapsed) = self.tracker.elapsed() {
				ui.separator();
				ui.label(format_elapsed(elapsed));
			}

			ui.separator();
			ui.label(match tally.location() {
				Some(location) => crate::tr!("current-location", location = location.to_string()),
				None => crate::tr!("no-location"),
			});
		});

		if let Some(outcome) = tally.last_outcome() {
			ui.small(match outcome {
				Outcome::Recorded { subject, time, .. } => crate::tr!(
					"last-encounter",
					subject = subject.clone(),
					time = time_label(*time)
				),
				Outcome::Unrecognized { line } => crate::tr!("last-unrecognized", line = line.clone()),
				Outcome::NoEncounter | Outcome::StillInEncounter => String::new(),
			});
		}
	}
}

impl super::Module for Encounters {
	fn name(&self) -> String {
		crate::tr!("module-encounters")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		let tally = tally::lock(&self.uniform.tally);
		egui::Grid::new("encounters_details").num_columns(2).show(ui, |ui| {
			ui.label(crate::tr!("data-dir"));
			ui.label(self.uniform.store.dir().display().to_string());
			ui.end_row();

			if let Some(location) = tally.location() {
				ui.label(crate::tr!("table-file"));
				ui.label(self.uniform.store.path_for(location).display().to_string());
				ui.end_row();
			}

			ui.label(crate::tr!("spawn-count"));
			ui.label(self.uniform.spawns.len().to_string());
			ui.end_row();

			ui.label(crate::tr!("in-encounter"));
			ui.label(tally.in_encounter().to_string());
			ui.end_row();
		});
		if let Some(outcome) = tally.last_outcome() {
			ui.monospace(format!("{outcome:?}"));
		}
	}

	fn ui_important(&mut self, ui: &mut egui::Ui) -> bool {
		self.ui_controls(ui);
		ui.spacer();
		self.ui_status(ui);
		ui.separator();

		let (session, history) = {
			let tally = tally::lock(&self.uniform.tally);
			(tally.session().clone(), tally.history().clone())
		};

		egui::ScrollArea::vertical()
			.id_salt("tables")
			.auto_shrink([false, false])
			.show(ui, |ui| {
				ui.heading(crate::tr!("session-header", total = session.total()));
				table_grid(ui, "session_table", &session);
				ui.spacer();
				ui.heading(crate::tr!("historical-header", total = history.total()));
				table_grid(ui, "historical_table", &history);
			});

		self.ui_confirm(ui.ctx());
		true
	}

	fn tick(&mut self, ctx: &egui::Context) {
		// The worker ends by itself when the game window closes.
		if self.tracker.finished() {
			self.tracker.stop();
		}
		if self.tracker.is_running() {
			ctx.request_repaint_after(Duration::from_millis(250));
		}
	}

	fn shutdown(&mut self) {
		self.tracker.stop();
	}
}

fn table_grid(ui: &mut egui::Ui, id: &str, table: &EncounterTable) {
	egui::Grid::new(id).striped(true).num_columns(7).show(ui, |ui| {
		ui.strong(crate::tr!("column-subject"));
		ui.strong(crate::tr!("column-rarity"));
		ui.strong(crate::tr!("column-total"));
		ui.strong(crate::tr!("column-percent"));
		for time in TimeOfDay::ALL {
			ui.strong(time_label(time));
		}
		ui.end_row();

		for row in table.rows() {
			ui.label(row.name.as_str());
			ui.label(row.rarity.as_deref().unwrap_or("-"));
			ui.label(row.total.to_string());
			ui.label(format!("{:.2}%", row.percent));
			for time in TimeOfDay::ALL {
				ui.label(row.bucket(time).to_string());
			}
			ui.end_row();
		}
	});
}

fn time_label(time: TimeOfDay) -> String {
	match time {
		TimeOfDay::Morning => crate::tr!("time-morning"),
		TimeOfDay::Day => crate::tr!("time-day"),
		TimeOfDay::Night => crate::tr!("time-night"),
	}
}

/// `HH:MM:SS`.
fn format_elapsed(elapsed: Duration) -> String {
	let secs = elapsed.as_secs();
	format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn elapsed_is_clock_formatted() {
		assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
		assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
	}
}
