//! Encounter tally tables.
//!
//! Rows serialize to the same record-oriented JSON the tracker has always
//! written, so existing per-location files keep loading.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Spawn, TimeOfDay};

pub const PLACEHOLDER_NAME: &str = "Default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRow {
	#[serde(rename = "Pokemon", deserialize_with = "name_from_any")]
	pub name: String,
	#[serde(rename = "Rarity", default, skip_serializing_if = "Option::is_none")]
	pub rarity: Option<String>,
	#[serde(rename = "Total", default)]
	pub total: u32,
	#[serde(rename = "Total Percent", default, deserialize_with = "percent_or_zero")]
	pub percent: f64,
	#[serde(rename = "Morning", default)]
	pub morning: u32,
	#[serde(rename = "Day", default)]
	pub day: u32,
	#[serde(rename = "Night", default)]
	pub night: u32,
}

impl EncounterRow {
	pub fn new(name: impl Into<String>, rarity: Option<String>) -> Self {
		Self {
			name: name.into(),
			rarity,
			total: 0,
			percent: 0.0,
			morning: 0,
			day: 0,
			night: 0,
		}
	}

	pub fn bucket(&self, time: TimeOfDay) -> u32 {
		match time {
			TimeOfDay::Morning => self.morning,
			TimeOfDay::Day => self.day,
			TimeOfDay::Night => self.night,
		}
	}

	fn bucket_mut(&mut self, time: TimeOfDay) -> &mut u32 {
		match time {
			TimeOfDay::Morning => &mut self.morning,
			TimeOfDay::Day => &mut self.day,
			TimeOfDay::Night => &mut self.night,
		}
	}

	fn is_placeholder(&self) -> bool {
		self.name == PLACEHOLDER_NAME && self.total == 0
	}
}

// Older files were written with a numeric placeholder name.
fn name_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::String(s) => s,
		_ => PLACEHOLDER_NAME.to_string(),
	})
}

// NaN percentages were written as `null`.
fn percent_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
	Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncounterTable {
	rows: Vec<EncounterRow>,
}

impl EncounterTable {
	/// The single all-zero `Default` row shown before anything is tracked.
	pub fn placeholder() -> Self {
		Self {
			rows: vec![EncounterRow::new(PLACEHOLDER_NAME, None)],
		}
	}

	/// One zero row per spawn of a location.
	pub fn seeded<'a>(spawns: impl IntoIterator<Item = &'a Spawn>) -> Self {
		let mut rows: Vec<EncounterRow> = Vec::new();
		for spawn in spawns {
			if rows.iter().any(|r| r.name == spawn.name) {
				continue;
			}
			rows.push(EncounterRow::new(spawn.name.clone(), spawn.tier.clone()));
		}

		if rows.is_empty() {
			return Self::placeholder();
		}
		Self { rows }
	}

	pub fn rows(&self) -> &[EncounterRow] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn total(&self) -> u32 {
		self.rows.iter().map(|r| r.total).sum()
	}

	pub fn get(&self, name: &str) -> Option<&EncounterRow> {
		self.rows.iter().find(|r| r.name == name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Names of the real rows (the placeholder is skipped).
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.rows
			.iter()
			.filter(|r| !r.is_placeholder())
			.map(|r| r.name.as_str())
	}

	/// Counts one encounter, appending a row for names not seen before.
	pub fn record(&mut self, name: &str, time: TimeOfDay) {
		let index = match self.rows.iter().position(|r| r.name == name) {
			Some(index) => index,
			None => {
				self.rows.retain(|r| !r.is_placeholder());
				self.rows.push(EncounterRow::new(name, None));
				self.rows.len() - 1
			}
		};

		let row = &mut self.rows[index];
		row.total += 1;
		*row.bucket_mut(time) += 1;

		self.recompute_percent();
		self.sort_by_percent();
	}

	/// Adds every count of `other` into this table.
	pub fn absorb(&mut self, other: &EncounterTable) {
		for incoming in other.rows.iter().filter(|r| r.total > 0) {
			let index = match self.rows.iter().position(|r| r.name == incoming.name) {
				Some(index) => index,
				None => {
					self.rows.retain(|r| !r.is_placeholder());
					self.rows.push(EncounterRow::new(incoming.name.clone(), incoming.rarity.clone()));
					self.rows.len() - 1
				}
			};
			let row = &mut self.rows[index];
			row.total += incoming.total;
			for time in TimeOfDay::ALL {
				*row.bucket_mut(time) += incoming.bucket(time);
			}
		}
		self.recompute_percent();
		self.sort_by_percent();
	}

	pub fn recompute_percent(&mut self) {
		let total = self.total();
		for row in &mut self.rows {
			row.percent = if total == 0 {
				0.0
			} else {
				row.total as f64 / total as f64 * 100.0
			};
		}
	}

	pub fn sort_by_percent(&mut self) {
		self.rows.sort_by(|a, b| {
			b.percent
				.total_cmp(&a.percent)
				.then_with(|| a.name.cmp(&b.name))
		});
	}
}
