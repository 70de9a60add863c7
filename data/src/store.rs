use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{EncounterTable, SpawnList};

/// `"Viridian Forest"` -> `viridian_forest`.
pub fn location_file_stem(location: &str) -> String {
	location
		.split_whitespace()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join("_")
}

/// Historical tables, one JSON file per location.
#[derive(Debug, Clone)]
pub struct LocationStore {
	dir: PathBuf,
}

impl LocationStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path_for(&self, location: &str) -> PathBuf {
		self.dir.join(format!("{}.json", location_file_stem(location)))
	}

	pub fn exists(&self, location: &str) -> bool {
		self.path_for(location).is_file()
	}

	pub fn load(&self, location: &str) -> Result<EncounterTable> {
		let path = self.path_for(location);
		let file = File::open(&path).with_context(|| format!("Open table {}", path.display()))?;
		let mut table: EncounterTable = serde_json::from_reader(BufReader::new(file))
			.with_context(|| format!("Parse table {}", path.display()))?;
		table.recompute_percent();
		table.sort_by_percent();
		Ok(table)
	}

	/// Loads a location's table, first writing a zeroed one seeded from the spawn list if none exists.
	pub fn load_or_create(&self, location: &str, spawns: &SpawnList) -> Result<EncounterTable> {
		if !self.exists(location) {
			tracing::info!(location, "creating new location table");
			let table = EncounterTable::seeded(spawns.for_location(location));
			self.save(location, &table)?;
		}
		self.load(location)
	}

	pub fn save(&self, location: &str, table: &EncounterTable) -> Result<()> {
		std::fs::create_dir_all(&self.dir)
			.with_context(|| format!("Create data dir {}", self.dir.display()))?;

		let path = self.path_for(location);
		let tmp = path.with_extension("json.tmp");
		let file = File::create(&tmp).with_context(|| format!("Write table temp {}", tmp.display()))?;
		let mut writer = BufWriter::new(file);
		serde_json::to_writer_pretty(&mut writer, table).context("Serialize table")?;
		writer.flush().context("Flush table")?;
		drop(writer);

		// Replace existing file (Windows-friendly).
		if std::fs::rename(&tmp, &path).is_err() {
			let _ = std::fs::remove_file(&path);
			std::fs::rename(&tmp, &path).with_context(|| format!("Persist table {}", path.display()))?;
		}
		tracing::debug!(path = %path.display(), total = table.total(), "saved table");
		Ok(())
	}

	/// Resets a location's persisted table to the placeholder.
	pub fn clear(&self, location: &str) -> Result<EncounterTable> {
		let table = EncounterTable::placeholder();
		self.save(location, &table)?;
		Ok(table)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Spawn, TimeOfDay};

	fn spawns() -> SpawnList {
		SpawnList::new(vec![
			Spawn {
				map: "Viridian Forest".to_string(),
				name: "Caterpie".to_string(),
				tier: Some("Common".to_string()),
			},
			Spawn {
				map: "Viridian Forest".to_string(),
				name: "Pikachu".to_string(),
				tier: Some("Rare".to_string()),
			},
			Spawn {
				map: "Route 1".to_string(),
				name: "Pidgey".to_string(),
				tier: None,
			},
		])
	}

	#[test]
	fn file_names_from_locations() {
		assert_eq!(location_file_stem("Viridian Forest"), "viridian_forest");
		assert_eq!(location_file_stem("  Mt. Moon  1F "), "mt._moon_1f");
		let store = LocationStore::new("/tmp/tables");
		assert_eq!(store.path_for("Route 1"), Path::new("/tmp/tables/route_1.json"));
	}

	#[test]
	fn creates_seeded_table_once() {
		let dir = tempfile::tempdir().unwrap();
		let store = LocationStore::new(dir.path().join("data"));

		let table = store.load_or_create("Viridian Forest", &spawns()).unwrap();
		assert!(store.exists("Viridian Forest"));
		assert_eq!(table.len(), 2);
		assert!(table.contains("Caterpie"));
		assert!(!table.contains("Pidgey"));

		let mut table = table;
		table.record("Pikachu", TimeOfDay::Night);
		store.save("Viridian Forest", &table).unwrap();

		let reloaded = store.load_or_create("Viridian Forest", &spawns()).unwrap();
		assert_eq!(reloaded, table);
		assert_eq!(reloaded.rows()[0].name, "Pikachu");
	}

	#[test]
	fn unknown_location_gets_placeholder() {
		let dir = tempfile::tempdir().unwrap();
		let store = LocationStore::new(dir.path());
		let table = store.load_or_create("Cerulean Cave", &spawns()).unwrap();
		assert_eq!(table, EncounterTable::placeholder());
	}

	#[test]
	fn clear_overwrites_file() {
		let dir = tempfile::tempdir().unwrap();
		let store = LocationStore::new(dir.path());
		let mut table = store.load_or_create("Route 1", &spawns()).unwrap();
		table.record("Pidgey", TimeOfDay::Day);
		store.save("Route 1", &table).unwrap();

		store.clear("Route 1").unwrap();
		assert_eq!(store.load("Route 1").unwrap().total(), 0);
		assert!(!dir.path().join("route_1.json.tmp").exists());
	}

	#[test]
	fn null_percent_is_recomputed_on_load() {
		let dir = tempfile::tempdir().unwrap();
		let store = LocationStore::new(dir.path());
		std::fs::write(
			store.path_for("Route 1"),
			r#"[{"Pokemon": "Pidgey", "Total": 0, "Total Percent": null},
			    {"Pokemon": "Rattata", "Total": 3, "Total Percent": null, "Day": 3}]"#,
		)
		.unwrap();

		let table = store.load("Route 1").unwrap();
		assert_eq!(table.rows()[0].name, "Rattata");
		assert_eq!(table.get("Rattata").unwrap().percent, 100.0);
		assert_eq!(table.get("Pidgey").unwrap().percent, 0.0);
	}
}
