use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};

/// One entry of the spawn list: a subject that can appear on a map.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Spawn {
	#[serde(rename = "Map")]
	pub map: String,
	#[serde(rename = "Pokemon")]
	pub name: String,
	#[serde(rename = "Tier", default)]
	pub tier: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SpawnList {
	spawns: Vec<Spawn>,
}

impl SpawnList {
	pub fn new(spawns: Vec<Spawn>) -> Self {
		Self { spawns }
	}

	pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).with_context(|| format!("Open spawn list {}", path.display()))?;
		let spawns: Vec<Spawn> = serde_json::from_reader(BufReader::new(file))
			.with_context(|| format!("Parse spawn list {}", path.display()))?;
		Ok(Self { spawns })
	}

	/// Never errors: without a spawn list, tables simply grow as subjects are seen.
	pub fn load(path: impl AsRef<Path>) -> Self {
		Self::try_load(path).unwrap_or_else(|err| {
			tracing::warn!("Failed to load spawn list: {err:#}");
			Self::default()
		})
	}

	pub fn len(&self) -> usize {
		self.spawns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.spawns.is_empty()
	}

	pub fn for_location<'a>(&'a self, map: &'a str) -> impl Iterator<Item = &'a Spawn> + 'a {
		self.spawns
			.iter()
			.filter(move |spawn| spawn.map.eq_ignore_ascii_case(map))
	}

	pub fn all_names(&self) -> impl Iterator<Item = &str> {
		self.spawns.iter().map(|spawn| spawn.name.as_str())
	}
}

/// Maps a dirty OCR word onto one of the known subject names.
///
/// Exact matches win. Otherwise the closest name by edit distance is taken,
/// as long as it is within a quarter of the word's length (at least one edit).
pub fn resolve_subject<'a>(word: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
	let word = word.trim();
	if word.chars().count() < 3 {
		return None;
	}

	let max_distance = (word.chars().count() / 4).max(1);
	let mut best: Option<(&str, usize)> = None;
	for candidate in candidates {
		if candidate == word {
			return Some(candidate);
		}

		let distance = levenshtein::levenshtein(&word.to_lowercase(), &candidate.to_lowercase());
		if distance <= max_distance && best.is_none_or(|(_, d)| distance < d) {
			best = Some((candidate, distance));
		}
	}

	best.map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn list() -> SpawnList {
		let spawn = |map: &str, name: &str| Spawn {
			map: map.to_string(),
			name: name.to_string(),
			tier: Some("Common".to_string()),
		};
		SpawnList::new(vec![
			spawn("Route 1", "Pidgey"),
			spawn("Route 1", "Rattata"),
			spawn("Viridian Forest", "Caterpie"),
			spawn("Viridian Forest", "Pikachu"),
		])
	}

	#[test]
	fn filters_by_location_case_insensitively() {
		let spawns = list();
		let names: Vec<_> = spawns.for_location("viridian forest").map(|s| s.name.as_str()).collect();
		assert_eq!(names, ["Caterpie", "Pikachu"]);
		assert_eq!(spawns.for_location("Cerulean Cave").count(), 0);
	}

	#[test]
	fn resolves_exact_and_misread_names() {
		let spawns = list();
		assert_eq!(resolve_subject("Pidgey", spawns.all_names()), Some("Pidgey"));
		assert_eq!(resolve_subject("Pidqey", spawns.all_names()), Some("Pidgey"));
		assert_eq!(resolve_subject("PIKACHU", spawns.all_names()), Some("Pikachu"));
	}

	#[test]
	fn rejects_noise() {
		let spawns = list();
		assert_eq!(resolve_subject("appeared", spawns.all_names()), None);
		assert_eq!(resolve_subject("Pi", spawns.all_names()), None);
	}

	#[test]
	fn reads_json_list() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("spawns.json");
		std::fs::write(&path, r#"[{"Map": "Route 1", "Pokemon": "Pidgey", "Tier": "Common"}]"#).unwrap();

		let spawns = SpawnList::try_load(&path).unwrap();
		assert_eq!(spawns.len(), 1);
		assert!(SpawnList::load(dir.path().join("missing.json")).is_empty());
	}
}
