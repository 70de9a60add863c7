use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

/// Base directories searched for bundled assets, most specific first.
///
/// `PROTRACKER_ASSETS_DIR` overrides discovery.
fn asset_roots() -> Vec<PathBuf> {
	let mut roots: Vec<PathBuf> = Vec::new();
	if let Some(dir) = std::env::var_os("PROTRACKER_ASSETS_DIR") {
		roots.push(PathBuf::from(dir));
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		roots.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		roots.push(cwd);
	}
	// Workspace root during local dev, when launched from another CWD.
	#[cfg(debug_assertions)]
	roots.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	roots
}

fn normalize_dir(dir: &Path, sub: &str, marker: &str) -> PathBuf {
	// The root may point at the app folder or straight at the asset folder.
	if dir.join(marker).is_file() {
		dir.to_path_buf()
	} else {
		dir.join(sub)
	}
}

fn tried_list(tried: Vec<PathBuf>) -> String {
	tried
		.into_iter()
		.map(|p| format!("  - {}", p.display()))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Resolves the OCR model files (`ocr/detection.mnn` plus the recognition
/// model and charset for `lang_code`).
pub fn resolve_ocr_assets(lang_code: &str) -> Result<OcrAssets> {
	let recognition_name = format!("{lang_code}_recognition.mnn");
	let charset_name = format!("{lang_code}_charset.txt");

	let mut tried = Vec::new();
	for base in asset_roots() {
		let ocr_dir = normalize_dir(&base, "ocr", "detection.mnn");
		let detection = ocr_dir.join("detection.mnn");
		let recognition = ocr_dir.join(&recognition_name);
		let charset = ocr_dir.join(&charset_name);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			return Ok(OcrAssets { detection, recognition, charset });
		}
		tried.push(ocr_dir);
	}

	bail!(
		"OCR model files not found. Expected these files:\n  - ocr/detection.mnn\n  - ocr/{recognition_name}\n  - ocr/{charset_name}\n\nSearched in:\n{}\n\nFix: copy the 'ocr/' folder next to the executable (or set PROTRACKER_ASSETS_DIR to the folder that contains it).",
		tried_list(tried)
	)
}

/// Resolves a data file shipped under `assets/` (location list, spawn table).
pub fn resolve_asset_file(name: &str) -> Result<PathBuf> {
	let mut tried = Vec::new();
	for base in asset_roots() {
		let path = normalize_dir(&base, "assets", name).join(name);
		if path.is_file() {
			return Ok(path);
		}
		tried.push(path);
	}
	bail!("{name} not found. Searched:\n{}", tried_list(tried))
}

pub fn huntable_locations_path() -> Result<PathBuf> {
	resolve_asset_file("huntable_locations.txt")
}

pub fn spawns_path() -> Result<PathBuf> {
	resolve_asset_file("spawns.json")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn asset_dir_may_be_given_directly() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("spawns.json"), "[]").unwrap();
		assert_eq!(normalize_dir(dir.path(), "assets", "spawns.json"), dir.path());
		assert_eq!(
			normalize_dir(dir.path(), "assets", "huntable_locations.txt"),
			dir.path().join("assets")
		);
	}
}
