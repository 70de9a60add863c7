use std::{
	sync::{
		Arc, Mutex, PoisonError, RwLock,
		mpsc::{self, Receiver, RecvTimeoutError, Sender},
	},
	thread::JoinHandle,
	time::{Duration, Instant},
};

use data::{HuntableLocations, LocationStore, SpawnList};

use crate::tally::{self, Outcome, Recognizer, Sources, Tally};

const WINDOW_RETRY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
	Idle,
	WaitingForWindow,
	Tracking,
	WindowClosed,
}

type SharedStatus = Arc<Mutex<TrackerStatus>>;

/// The screen tracker: one background thread polling the game window.
pub struct Tracker {
	uniform: crate::Uniform,
	handle: Option<JoinHandle<()>>,
	stop_tx: Option<Sender<()>>,
	status: SharedStatus,
	started_at: Option<Instant>,
}

impl Tracker {
	pub fn new(uniform: crate::Uniform) -> Self {
		Self {
			uniform,
			handle: None,
			stop_tx: None,
			status: Arc::new(Mutex::new(TrackerStatus::Idle)),
			started_at: None,
		}
	}

	/// True while the worker thread is alive.
	pub fn is_running(&self) -> bool {
		self.handle.as_ref().is_some_and(|h| !h.is_finished())
	}

	/// The worker exited on its own and has not been joined yet.
	pub fn finished(&self) -> bool {
		self.handle.as_ref().is_some_and(JoinHandle::is_finished)
	}

	pub fn status(&self) -> TrackerStatus {
		*self.status.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Time since tracking started, while a session is active.
	pub fn elapsed(&self) -> Option<Duration> {
		self.handle.as_ref()?;
		self.started_at.map(|t| t.elapsed())
	}

	pub fn start(&mut self) {
		if self.is_running() {
			tracing::warn!("tracker already running");
			return;
		}
		// A worker that exited on its own (window closed) still needs joining.
		self.join();

		let (stop_tx, stop_rx) = mpsc::channel();
		let uniform = self.uniform.clone();
		let status = self.status.clone();
		set_status(&status, TrackerStatus::WaitingForWindow);

		let spawned = std::thread::Builder::new()
			.name("tracker".to_string())
			.spawn(move || {
				run(&uniform, &stop_rx, &status);
				let mut status = status.lock().unwrap_or_else(PoisonError::into_inner);
				if *status != TrackerStatus::WindowClosed {
					*status = TrackerStatus::Idle;
				}
			});

		match spawned {
			Ok(handle) => {
				tracing::info!("tracker started");
				self.handle = Some(handle);
				self.stop_tx = Some(stop_tx);
				self.started_at = Some(Instant::now());
			}
			Err(err) => {
				tracing::error!(error = %err, "failed to spawn tracker thread");
				set_status(&self.status, TrackerStatus::Idle);
			}
		}
	}

	/// Signals the worker, waits for it, then writes the historical table.
	pub fn stop(&mut self) {
		self.join();
		if self.status() != TrackerStatus::WindowClosed {
			set_status(&self.status, TrackerStatus::Idle);
		}
		self.started_at = None;

		let mut tally = tally::lock(&self.uniform.tally);
		if let Err(err) = tally.save(&self.uniform.store) {
			tracing::warn!("Failed to save table on stop: {err:#}");
		}
	}

	fn join(&mut self) {
		if let Some(tx) = self.stop_tx.take() {
			let _ = tx.send(());
		}
		if let Some(handle) = self.handle.take() {
			if handle.join().is_err() {
				tracing::error!("tracker thread panicked");
			}
			tracing::info!("tracker stopped");
		}
	}
}

impl Drop for Tracker {
	fn drop(&mut self) {
		if self.handle.is_some() {
			self.stop();
		}
	}
}

fn set_status(status: &SharedStatus, value: TrackerStatus) {
	*status.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

/// Interruptible sleep. Returns true once the tracker should stop.
fn wait(stop_rx: &Receiver<()>, timeout: Duration) -> bool {
	match stop_rx.recv_timeout(timeout) {
		Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
		Err(RecvTimeoutError::Timeout) => false,
	}
}

/// Where frames come from.
pub trait Screen {
	/// Looks up the game window. False while it is not open.
	fn locate(&mut self, title: &str) -> bool;
	/// Grabs the window found by the last `locate`.
	fn capture(&mut self, max_height: Option<u32>) -> Option<ie::OwnedImage>;
}

#[derive(Default)]
struct GameWindow {
	window: Option<xcap::Window>,
}

impl Screen for GameWindow {
	fn locate(&mut self, title: &str) -> bool {
		self.window = crate::capture::find_window(title);
		self.window.is_some()
	}

	fn capture(&mut self, max_height: Option<u32>) -> Option<ie::OwnedImage> {
		crate::capture::capture_window(self.window.as_ref()?, max_height)
	}
}

/// Config values used by one tick.
#[derive(Debug, Clone)]
struct Settings {
	title: String,
	threshold: u64,
	max_height: Option<u32>,
	delay: Duration,
	autosave_every: u32,
	write_images: bool,
}

impl Settings {
	fn read() -> Self {
		let config = crate::config_read();
		Self {
			title: config.window_title.clone(),
			threshold: config.change_threshold,
			max_height: config.max_capture_height,
			delay: Duration::from_secs_f32(config.poll_delay_s.max(0.1)),
			autosave_every: config.autosave_every,
			write_images: std::env::var("PROTRACKER_WRITE_IMAGE").as_deref() == Ok("1"),
		}
	}
}

/// Everything a changed frame is handed to.
struct Pipeline<'a, R> {
	tally: &'a Mutex<Tally>,
	recognizer: &'a R,
	store: &'a LocationStore,
	spawns: &'a SpawnList,
	locations: &'a RwLock<HuntableLocations>,
}

fn run(uniform: &crate::UniformData, stop_rx: &Receiver<()>, status: &SharedStatus) {
	let pipeline = Pipeline {
		tally: &uniform.tally,
		recognizer: &*uniform.ie,
		store: &uniform.store,
		spawns: &uniform.spawns,
		locations: &uniform.locations,
	};
	run_loop(&mut GameWindow::default(), &pipeline, Settings::read, stop_rx, status);
}

fn run_loop<S: Screen, R: Recognizer>(
	screen: &mut S,
	pipeline: &Pipeline<R>,
	settings: impl Fn() -> Settings,
	stop_rx: &Receiver<()>,
	status: &SharedStatus,
) {
	let title = settings().title;

	while !screen.locate(&title) {
		tracing::info!("{title} window not found. Retrying in {} seconds...", WINDOW_RETRY.as_secs());
		if wait(stop_rx, WINDOW_RETRY) {
			return;
		}
	}
	set_status(status, TrackerStatus::Tracking);
	tracing::info!("tracking {title}");

	let mut detector = ie::ChangeDetector::new(settings().threshold);

	loop {
		if !screen.locate(&title) {
			tracing::info!("{title} window was closed. Stopping tracker.");
			set_status(status, TrackerStatus::WindowClosed);
			return;
		}

		let settings = settings();
		detector.set_threshold(settings.threshold);

		let frame = screen.capture(settings.max_height);
		if let ie::Change::Changed(frame) = detector.observe(frame) {
			tracing::debug!(difference = detector.last_difference(), "screen changed");
			if settings.write_images {
				let path = pipeline.store.dir().join("debug").join(format!("change_{}.png", now_millis()));
				if let Err(err) = crate::capture::save_debug_png(frame.as_image(), &path) {
					tracing::warn!("Failed to write debug image: {err:#}");
				}
			}

			tally::lock(pipeline.tally).set_autosave_every(settings.autosave_every);
			let locations = pipeline
				.locations
				.read()
				.unwrap_or_else(PoisonError::into_inner)
				.clone();
			let sources = Sources {
				store: pipeline.store,
				spawns: pipeline.spawns,
				locations: &locations,
			};
			match tally::run_action_on_change(pipeline.tally, frame.as_image(), pipeline.recognizer, sources) {
				Outcome::Recorded { subject, .. } => tracing::debug!(subject = %subject, "encounter counted"),
				Outcome::Unrecognized { line } => tracing::debug!(line = %line, "encounter banner unreadable"),
				Outcome::NoEncounter | Outcome::StillInEncounter => {}
			}
		}

		if wait(stop_rx, settings.delay) {
			return;
		}
	}
}

fn now_millis() -> u128 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis())
		.unwrap_or_default()
}
