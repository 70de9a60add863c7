use std::path::Path;

use anyhow::{Context, Result};

const MAX_LINE_DISTANCE: usize = 2;

/// Locations worth tracking, one per line in `huntable_locations.txt`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HuntableLocations {
	names: Vec<String>,
}

impl HuntableLocations {
	pub fn parse(text: &str) -> Self {
		let names = text
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty() && !line.starts_with('#'))
			.map(str::to_owned)
			.collect();
		Self { names }
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("Read huntable locations {}", path.display()))?;
		Ok(Self::parse(&text))
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.iter().any(|v| v == name)
	}

	/// Finds the first OCR line naming a huntable location.
	pub fn find_in_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Option<&str> {
		let lines = lines
			.into_iter()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.collect::<Vec<_>>();

		if let Some(name) = lines
			.iter()
			.find_map(|line| self.names.iter().find(|name| name.as_str() == *line))
		{
			return Some(name.as_str());
		}

		// OCR tends to drop or swap a character or two in map names. Numbers
		// must match exactly ("Route 11" is not "Route 1") and the closest
		// name must be the only one at that distance.
		lines.iter().find_map(|line| {
			let mut close = self
				.names
				.iter()
				.filter(|name| name.len().abs_diff(line.len()) <= MAX_LINE_DISTANCE)
				.filter(|name| digits(name) == digits(line))
				.map(|name| (name.as_str(), levenshtein::levenshtein(name, line)))
				.filter(|(_, distance)| *distance <= MAX_LINE_DISTANCE)
				.collect::<Vec<_>>();
			close.sort_by_key(|(_, distance)| *distance);
			match close.as_slice() {
				[(name, _)] => Some(*name),
				[(name, best), (_, next), ..] if best < next => Some(*name),
				_ => None,
			}
		})
	}
}

fn digits(text: &str) -> String {
	text.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn locations() -> HuntableLocations {
		HuntableLocations::parse("Route 1\n\n# caves\nMt. Moon 1F\n  Viridian Forest  \n")
	}

	#[test]
	fn parse_skips_blanks_and_comments() {
		assert_eq!(locations().names(), ["Route 1", "Mt. Moon 1F", "Viridian Forest"]);
	}

	#[test]
	fn finds_exact_line() {
		let text = "Pokedex\nViridian Forest\nWild Caterpie";
		assert_eq!(locations().find_in_lines(text.lines()), Some("Viridian Forest"));
	}

	#[test]
	fn finds_misread_line() {
		assert_eq!(locations().find_in_lines(["Viridlan Forest"]), Some("Viridian Forest"));
		assert_eq!(locations().find_in_lines(["Mt.Moon 1F"]), Some("Mt. Moon 1F"));
	}

	#[test]
	fn unlisted_numbered_routes_do_not_match() {
		let listed = HuntableLocations::parse(include_str!("../../assets/huntable_locations.txt"));
		for route in ["Route 5", "Route 6", "Route 11", "Route 21"] {
			assert_eq!(listed.find_in_lines([route]), None, "{route}");
		}
		assert_eq!(listed.find_in_lines(["Route 22"]), Some("Route 22"));
		assert_eq!(listed.find_in_lines(["Raute 22"]), Some("Route 22"));
	}

	#[test]
	fn ambiguous_misread_is_rejected() {
		let locations = HuntableLocations::parse("Cave A\nCave B\n");
		assert_eq!(locations.find_in_lines(["Cave C"]), None);
	}

	#[test]
	fn ignores_unrelated_text() {
		assert_eq!(locations().find_in_lines(["Wild Pidgey", "Route 22 Gate"]), None);
	}
}
