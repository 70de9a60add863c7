use std::sync::LazyLock;

use chrono::Timelike;

static CLOCK_REGEX: LazyLock<regex::Regex> =
	LazyLock::new(|| regex::Regex::new(r"\b(?<hour>\d{1,2}):(?<minute>\d{2})\b").unwrap());

/// In-game time of day an encounter happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum TimeOfDay {
	Morning,
	Day,
	Night,
}

impl TimeOfDay {
	pub const ALL: [Self; 3] = [Self::Morning, Self::Day, Self::Night];

	/// Morning is 04:00-09:59, day 10:00-19:59, night the rest.
	pub fn from_hour(hour: u32) -> Self {
		match hour % 24 {
			4..=9 => Self::Morning,
			10..=19 => Self::Day,
			_ => Self::Night,
		}
	}

	/// Reads the first plausible `HH:MM` clock out of OCR text.
	pub fn from_clock_text(text: &str) -> Option<Self> {
		CLOCK_REGEX.captures_iter(text).find_map(|cap| {
			let hour = cap["hour"].parse::<u32>().ok()?;
			let minute = cap["minute"].parse::<u32>().ok()?;
			(hour < 24 && minute < 60).then(|| Self::from_hour(hour))
		})
	}

	pub fn now() -> Self {
		Self::from_hour(chrono::Local::now().hour())
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::Morning => "Morning",
			Self::Day => "Day",
			Self::Night => "Night",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hour_buckets() {
		assert_eq!(TimeOfDay::from_hour(3), TimeOfDay::Night);
		assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Morning);
		assert_eq!(TimeOfDay::from_hour(9), TimeOfDay::Morning);
		assert_eq!(TimeOfDay::from_hour(10), TimeOfDay::Day);
		assert_eq!(TimeOfDay::from_hour(19), TimeOfDay::Day);
		assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Night);
		assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
	}

	#[test]
	fn clock_from_ocr_text() {
		assert_eq!(TimeOfDay::from_clock_text("Route 1\n07:45\nChannel 2"), Some(TimeOfDay::Morning));
		assert_eq!(TimeOfDay::from_clock_text("Server time 13:05"), Some(TimeOfDay::Day));
		assert_eq!(TimeOfDay::from_clock_text("no clock here"), None);
	}

	#[test]
	fn clock_skips_impossible_times() {
		assert_eq!(TimeOfDay::from_clock_text("99:99 then 22:10"), Some(TimeOfDay::Night));
		assert_eq!(TimeOfDay::from_clock_text("12:75"), None);
	}
}
