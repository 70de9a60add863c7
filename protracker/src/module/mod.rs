mod encounters;
pub use encounters::Encounters;

mod debug;
pub use debug::Debug;

pub trait Module {
	fn name(&self) -> String;

	fn ui(&mut self, ui: &mut egui::Ui);

	#[allow(unused_variables)]
	fn ui_settings(&mut self, ui: &mut egui::Ui, config: &mut crate::config::Config) -> bool {false}

	#[allow(unused_variables)]
	fn ui_important(&mut self, ui: &mut egui::Ui) -> bool {false}

	#[allow(unused_variables)]
	fn tick(&mut self, ctx: &egui::Context) {}

	/// Called once when the app closes.
	fn shutdown(&mut self) {}
}
