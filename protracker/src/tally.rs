//! Encounter bookkeeping shared between the tracker thread and the UI.
//!
//! A screen change is turned into a count in three steps: find the `Wild`
//! banner in the OCR text, work out where the player is, then resolve the
//! subject name against what we know can spawn there.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use data::{EncounterTable, HuntableLocations, LocationStore, SpawnList, TimeOfDay};
use ie::screen::encounter;

/// Text recognition as seen by the tally pipeline.
pub trait Recognizer {
	/// Text read from the frame looking for the encounter banner.
	fn encounter_text(&self, frame: ie::Image) -> String;
	/// Text read from the frame looking for the map name and clock.
	fn location_text(&self, frame: ie::Image) -> String;
}

impl Recognizer for ie::Ie {
	fn encounter_text(&self, frame: ie::Image) -> String {
		ie::Ie::encounter_text(self, frame)
	}

	fn location_text(&self, frame: ie::Image) -> String {
		ie::Ie::location_text(self, frame)
	}
}

/// Static lookups needed to interpret a frame.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
	pub store: &'a LocationStore,
	pub spawns: &'a SpawnList,
	pub locations: &'a HuntableLocations,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
	/// No encounter banner on screen.
	NoEncounter,
	/// The banner of an already counted encounter is still up.
	StillInEncounter,
	Recorded {
		subject: String,
		time: TimeOfDay,
		location: Option<String>,
	},
	/// A banner was found but no subject name could be read from it.
	Unrecognized { line: String },
}

pub struct Tally {
	session: EncounterTable,
	history: EncounterTable,
	location: Option<String>,
	current_encounter: bool,
	autosave_every: u32,
	unsaved: u32,
	last_outcome: Option<Outcome>,
}

impl Default for Tally {
	fn default() -> Self {
		Self::new(0)
	}
}

impl Tally {
	pub fn new(autosave_every: u32) -> Self {
		Self {
			session: EncounterTable::placeholder(),
			history: EncounterTable::placeholder(),
			location: None,
			current_encounter: false,
			autosave_every,
			unsaved: 0,
			last_outcome: None,
		}
	}

	pub fn session(&self) -> &EncounterTable {
		&self.session
	}

	pub fn history(&self) -> &EncounterTable {
		&self.history
	}

	pub fn location(&self) -> Option<&str> {
		self.location.as_deref()
	}

	pub fn in_encounter(&self) -> bool {
		self.current_encounter
	}

	pub fn last_outcome(&self) -> Option<&Outcome> {
		self.last_outcome.as_ref()
	}

	pub fn set_autosave_every(&mut self, every: u32) {
		self.autosave_every = every;
	}

	/// Counts one encounter in both tables.
	pub fn update_table(&mut self, subject: &str, time: TimeOfDay) {
		self.session.record(subject, time);
		self.history.record(subject, time);
		self.unsaved += 1;
		tracing::info!(
			subject,
			time = time.label(),
			session_total = self.session.total(),
			history_total = self.history.total(),
			"encounter recorded"
		);
	}

	/// Follows the player to a new location: the current historical table is
	/// written out and replaced by the new location's table.
	pub fn auto_change_location(&mut self, location: &str, sources: Sources) {
		if self.location.as_deref() == Some(location) {
			return;
		}
		tracing::info!(from = ?self.location, to = location, "location changed");
		if let Err(err) = self.switch_location(location, sources) {
			tracing::warn!("Staying on the current table: {err:#}");
		}
	}

	/// Explicit location pick from the UI ("Show Selection").
	pub fn select_location(&mut self, location: &str, sources: Sources) -> Result<()> {
		self.switch_location(location, sources)
	}

	/// Nothing changes unless the old table was saved and the new one loaded.
	/// Counts made before any location was known are added to the new table.
	fn switch_location(&mut self, location: &str, sources: Sources) -> Result<()> {
		if let Some(current) = self.location.clone() {
			self.save(sources.store)
				.with_context(|| format!("save table for {current}"))?;
		}

		let mut history = sources
			.store
			.load_or_create(location, sources.spawns)
			.with_context(|| format!("load table for {location}"))?;
		if self.location.is_none() {
			history.absorb(&self.history);
		}

		self.history = history;
		self.location = Some(location.to_string());
		Ok(())
	}

	pub fn clear_session(&mut self) {
		self.session = EncounterTable::placeholder();
	}

	/// Resets the historical table and writes the empty table to disk.
	pub fn clear_historical(&mut self, store: &LocationStore) -> Result<()> {
		self.history = EncounterTable::placeholder();
		self.save(store)
	}

	/// Writes the historical table for the current location, if there is one.
	pub fn save(&mut self, store: &LocationStore) -> Result<()> {
		if let Some(location) = &self.location {
			store.save(location, &self.history)?;
		}
		self.unsaved = 0;
		Ok(())
	}

	fn autosave(&mut self, store: &LocationStore) {
		if self.autosave_every == 0 || self.unsaved < self.autosave_every {
			return;
		}
		if let Err(err) = self.save(store) {
			tracing::warn!("Autosave failed: {err:#}");
		}
	}

	pub fn end_encounter(&mut self) {
		self.current_encounter = false;
	}

	/// Handles a freshly appeared encounter banner.
	///
	/// `location_text` is the second OCR pass over the same frame; it carries
	/// the map name and, when visible, the in-game clock.
	pub fn apply_encounter(&mut self, line: &str, location_text: &str, sources: Sources) -> Outcome {
		self.current_encounter = true;

		if let Some(location) = sources.locations.find_in_lines(location_text.lines()) {
			self.auto_change_location(location, sources);
		}

		let outcome = match self.resolve_subject(line, sources.spawns) {
			Some(subject) => {
				let time = TimeOfDay::from_clock_text(location_text).unwrap_or_else(TimeOfDay::now);
				self.update_table(&subject, time);
				self.autosave(sources.store);
				Outcome::Recorded {
					subject,
					time,
					location: self.location.clone(),
				}
			}
			None => {
				tracing::warn!(line, "could not read subject from encounter banner");
				Outcome::Unrecognized { line: line.to_string() }
			}
		};

		self.last_outcome = Some(outcome.clone());
		outcome
	}

	fn resolve_subject(&self, line: &str, spawns: &SpawnList) -> Option<String> {
		let words = encounter::candidate_words(line);
		// Two-word names first ("Mr. Mime"), then single words.
		let mut candidates = words
			.windows(2)
			.map(|pair| pair.join(" "))
			.collect::<Vec<_>>();
		candidates.extend(words.iter().map(|word| word.to_string()));

		let location = self.location.as_deref().unwrap_or_default();
		let pools: [Vec<&str>; 4] = [
			spawns.for_location(location).map(|s| s.name.as_str()).collect(),
			spawns.all_names().collect(),
			self.history.names().collect(),
			self.session.names().collect(),
		];

		pools
			.iter()
			.find_map(|pool| {
				candidates
					.iter()
					.find_map(|word| data::resolve_subject(word, pool.iter().copied()))
			})
			.map(str::to_owned)
			.or_else(|| encounter::fallback_subject(line).map(str::to_owned))
	}
}

pub fn lock(tally: &Mutex<Tally>) -> MutexGuard<'_, Tally> {
	tally.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs on every detected screen change.
///
/// OCR happens outside the lock so the UI keeps drawing the tables meanwhile.
pub fn run_action_on_change(
	tally: &Mutex<Tally>,
	frame: ie::Image,
	recognizer: &impl Recognizer,
	sources: Sources,
) -> Outcome {
	let text = recognizer.encounter_text(frame);
	let Some(line) = encounter::encounter_line(&text) else {
		lock(tally).end_encounter();
		return Outcome::NoEncounter;
	};

	if lock(tally).in_encounter() {
		return Outcome::StillInEncounter;
	}

	let location_text = recognizer.location_text(frame);
	lock(tally).apply_encounter(line, &location_text, sources)
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use data::Spawn;

	use super::*;

	struct FakeOcr {
		encounter: String,
		location: String,
		location_reads: Cell<u32>,
	}

	impl FakeOcr {
		fn new(encounter: &str, location: &str) -> Self {
			Self {
				encounter: encounter.to_string(),
				location: location.to_string(),
				location_reads: Cell::new(0),
			}
		}
	}

	impl Recognizer for FakeOcr {
		fn encounter_text(&self, _frame: ie::Image) -> String {
			self.encounter.clone()
		}

		fn location_text(&self, _frame: ie::Image) -> String {
			self.location_reads.set(self.location_reads.get() + 1);
			self.location.clone()
		}
	}

	struct Fixture {
		_dir: tempfile::TempDir,
		store: LocationStore,
		spawns: SpawnList,
		locations: HuntableLocations,
	}

	impl Fixture {
		fn new() -> Self {
			let dir = tempfile::tempdir().unwrap();
			let spawn = |map: &str, name: &str, tier: &str| Spawn {
				map: map.to_string(),
				name: name.to_string(),
				tier: Some(tier.to_string()),
			};
			Self {
				store: LocationStore::new(dir.path()),
				_dir: dir,
				spawns: SpawnList::new(vec![
					spawn("Route 1", "Pidgey", "Common"),
					spawn("Route 1", "Rattata", "Common"),
					spawn("Viridian Forest", "Caterpie", "Common"),
					spawn("Viridian Forest", "Pikachu", "Rare"),
					spawn("Viridian Forest", "Mr. Mime", "Rare"),
				]),
				locations: HuntableLocations::parse("Route 1\nViridian Forest\n"),
			}
		}

		fn sources(&self) -> Sources<'_> {
			Sources {
				store: &self.store,
				spawns: &self.spawns,
				locations: &self.locations,
			}
		}
	}

	fn frame() -> ie::OwnedImage {
		ie::OwnedImage::new(4, 4, ie::Color::BLACK)
	}

	#[test]
	fn counts_each_encounter_once() {
		let fx = Fixture::new();
		let tally = Mutex::new(Tally::new(0));
		let frame = frame();
		let battle = FakeOcr::new("Wild Pidgey Lv.3\nFight", "Route 1\n12:30");

		let outcome = run_action_on_change(&tally, frame.as_image(), &battle, fx.sources());
		assert_eq!(
			outcome,
			Outcome::Recorded {
				subject: "Pidgey".to_string(),
				time: TimeOfDay::Day,
				location: Some("Route 1".to_string()),
			}
		);

		// Banner still up on the next change: no double count, no second location pass.
		let outcome = run_action_on_change(&tally, frame.as_image(), &battle, fx.sources());
		assert_eq!(outcome, Outcome::StillInEncounter);
		assert_eq!(battle.location_reads.get(), 1);

		let overworld = FakeOcr::new("Route 1", "");
		assert_eq!(
			run_action_on_change(&tally, frame.as_image(), &overworld, fx.sources()),
			Outcome::NoEncounter
		);
		run_action_on_change(&tally, frame.as_image(), &battle, fx.sources());

		let tally = lock(&tally);
		assert_eq!(tally.session().get("Pidgey").unwrap().total, 2);
		assert_eq!(tally.history().get("Pidgey").unwrap().day, 2);
		assert_eq!(tally.session().total(), 2);
	}

	#[test]
	fn resolves_misread_and_two_word_names() {
		let fx = Fixture::new();
		let mut tally = Tally::new(0);
		tally.select_location("Viridian Forest", fx.sources()).unwrap();

		tally.apply_encounter("Wild Pikachv Lv.4", "07:00", fx.sources());
		tally.end_encounter();
		tally.apply_encounter("Wild Mr. Mime Lv.9", "07:10", fx.sources());

		let history = tally.history();
		assert_eq!(history.get("Pikachu").unwrap().morning, 1);
		assert_eq!(history.get("Mr. Mime").unwrap().total, 1);
		assert_eq!(history.get("Caterpie").unwrap().total, 0);
		assert_eq!(history.rows()[2].name, "Caterpie");
	}

	#[test]
	fn unknown_subject_uses_banner_word() {
		let fx = Fixture::new();
		let mut tally = Tally::new(0);
		let outcome = tally.apply_encounter("A Wild Missingno appeared", "23:00", fx.sources());
		assert!(matches!(
			outcome,
			Outcome::Recorded { ref subject, time: TimeOfDay::Night, location: None } if subject == "Missingno"
		));
		assert!(!tally.session().contains(data::PLACEHOLDER_NAME));

		tally.end_encounter();
		let outcome = tally.apply_encounter("Wild ... 12", "", fx.sources());
		assert_eq!(outcome, Outcome::Unrecognized { line: "Wild ... 12".to_string() });
		assert_eq!(tally.last_outcome(), Some(&outcome));
	}

	#[test]
	fn location_change_flushes_and_swaps() {
		let fx = Fixture::new();
		let mut tally = Tally::new(0);

		let mut stored = EncounterTable::placeholder();
		stored.record("Pidgey", TimeOfDay::Day);
		fx.store.save("Route 1", &stored).unwrap();

		tally.apply_encounter("Wild Rattata", "Route 1\n10:00", fx.sources());
		assert_eq!(tally.location(), Some("Route 1"));
		// First detection picks up the stored table.
		assert_eq!(tally.history().get("Pidgey").unwrap().total, 1);

		tally.end_encounter();
		tally.apply_encounter("Wild Caterpie", "Viridian Forest\n10:05", fx.sources());
		assert_eq!(tally.location(), Some("Viridian Forest"));

		let route1 = fx.store.load("Route 1").unwrap();
		assert_eq!(route1.get("Rattata").unwrap().total, 1);
		assert!(!route1.contains("Caterpie"));

		// New location table is seeded from its own spawns.
		let history = tally.history();
		assert_eq!(history.get("Caterpie").unwrap().total, 1);
		assert!(history.contains("Pikachu"));
		assert!(!history.contains("Rattata"));

		// The session table spans locations.
		assert_eq!(tally.session().total(), 2);
	}

	#[test]
	fn selecting_first_location_keeps_earlier_counts() {
		let fx = Fixture::new();
		let mut tally = Tally::new(0);

		let mut stored = EncounterTable::placeholder();
		stored.record("Pidgey", TimeOfDay::Day);
		fx.store.save("Route 1", &stored).unwrap();

		tally.apply_encounter("Wild Pidgey", "no map name\n12:00", fx.sources());
		assert_eq!(tally.location(), None);
		assert_eq!(tally.history().total(), 1);

		tally.select_location("Route 1", fx.sources()).unwrap();
		assert_eq!(tally.history().get("Pidgey").unwrap().total, 2);
	}

	#[test]
	fn unreadable_table_is_left_alone() {
		let fx = Fixture::new();
		let path = fx.store.path_for("Viridian Forest");
		std::fs::write(&path, "not a table").unwrap();

		let mut tally = Tally::new(1);
		tally.select_location("Route 1", fx.sources()).unwrap();
		tally.apply_encounter("Wild Caterpie", "Viridian Forest\n12:00", fx.sources());

		// The switch is refused; the count lands in the table that was loaded.
		assert_eq!(tally.location(), Some("Route 1"));
		assert_eq!(fx.store.load("Route 1").unwrap().get("Caterpie").unwrap().total, 1);
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "not a table");
		assert!(tally.select_location("Viridian Forest", fx.sources()).is_err());
		assert_eq!(tally.location(), Some("Route 1"));
	}

	#[test]
	fn clearing_tables() {
		let fx = Fixture::new();
		let mut tally = Tally::new(0);
		tally.select_location("Route 1", fx.sources()).unwrap();
		tally.update_table("Pidgey", TimeOfDay::Day);
		tally.save(&fx.store).unwrap();

		tally.clear_session();
		assert_eq!(tally.session(), &EncounterTable::placeholder());
		assert_eq!(tally.history().total(), 1);

		tally.clear_historical(&fx.store).unwrap();
		assert_eq!(tally.history().total(), 0);
		assert_eq!(fx.store.load("Route 1").unwrap(), EncounterTable::placeholder());
	}

	#[test]
	fn autosaves_after_configured_encounters() {
		let fx = Fixture::new();
		let mut tally = Tally::new(2);
		tally.select_location("Route 1", fx.sources()).unwrap();

		tally.apply_encounter("Wild Pidgey", "Route 1\n12:00", fx.sources());
		assert_eq!(fx.store.load("Route 1").unwrap().total(), 0);

		tally.end_encounter();
		tally.apply_encounter("Wild Rattata", "Route 1\n12:01", fx.sources());
		assert_eq!(fx.store.load("Route 1").unwrap().total(), 2);
	}
}
