use std::{
	path::{Path, PathBuf},
	sync::{Arc, PoisonError, RwLock},
};

use anyhow::{Context, Result};
use data::HuntableLocations;
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Reloads the huntable location list whenever its file changes on disk.
pub struct LocationsWatcher {
	_watcher: notify::RecommendedWatcher,
}

impl LocationsWatcher {
	pub fn spawn(path: PathBuf, locations: Arc<RwLock<HuntableLocations>>) -> Result<Self> {
		let dir = path
			.parent()
			.map(Path::to_path_buf)
			.context("locations file has no parent directory")?;

		let watched = path.clone();
		let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
			Ok(event) => {
				if is_relevant(&event, &watched) {
					reload(&watched, &locations);
				}
			}
			Err(err) => tracing::warn!(error = %err, "locations watcher error"),
		})
		.context("create file watcher")?;

		// Editors often replace the file, so watch the directory rather than the file itself.
		watcher
			.watch(&dir, RecursiveMode::NonRecursive)
			.with_context(|| format!("watch {:?}", dir))?;
		tracing::info!(path = %path.display(), "watching huntable locations");

		Ok(Self { _watcher: watcher })
	}
}

fn is_relevant(event: &Event, path: &Path) -> bool {
	matches!(
		event.kind,
		EventKind::Create(_) | EventKind::Modify(_)
	) && event.paths.iter().any(|p| p.file_name() == path.file_name())
}

fn reload(path: &Path, locations: &RwLock<HuntableLocations>) {
	match HuntableLocations::load(path) {
		Ok(loaded) => {
			tracing::info!(count = loaded.names().len(), "reloaded huntable locations");
			*locations.write().unwrap_or_else(PoisonError::into_inner) = loaded;
		}
		Err(err) => tracing::warn!("Failed to reload {}: {err:#}", path.display()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_events_for_the_list_count() {
		let path = PathBuf::from("/data/huntable_locations.txt");
		let modify = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
			.add_path(PathBuf::from("/data/huntable_locations.txt"));
		let other = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
			.add_path(PathBuf::from("/data/spawns.json"));
		let removed = Event::new(EventKind::Remove(notify::event::RemoveKind::Any)).add_path(path.clone());

		assert!(is_relevant(&modify, &path));
		assert!(!is_relevant(&other, &path));
		assert!(!is_relevant(&removed, &path));
	}

	#[test]
	fn reload_replaces_list() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("huntable_locations.txt");
		std::fs::write(&path, "Route 1\n").unwrap();
		let locations = RwLock::new(HuntableLocations::default());

		reload(&path, &locations);
		assert!(locations.read().unwrap().contains("Route 1"));

		reload(&dir.path().join("missing.txt"), &locations);
		assert!(locations.read().unwrap().contains("Route 1"));
	}
}
