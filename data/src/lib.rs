//! Encounter bookkeeping: tally tables, their per-location JSON files, and
//! the static lists (spawns, huntable locations) used to make sense of OCR text.

mod locations;
pub use locations::HuntableLocations;
mod spawns;
pub use spawns::{Spawn, SpawnList, resolve_subject};
mod store;
pub use store::{LocationStore, location_file_stem};
mod table;
pub use table::{EncounterRow, EncounterTable, PLACEHOLDER_NAME};
mod time;
pub use time::TimeOfDay;
