mod diff;
pub use diff::*;
mod image;
pub use self::image::*;
mod ocr;

pub mod screen;

/// Image extraction engine: OCR plus the screen-specific preprocessing around it.
pub struct Ie {
	ocr: Result<ocr::Ocr, String>,
}

impl Ie {
	/// Never fails: if the OCR models can't be loaded, text extraction returns
	/// empty strings and [`Ie::ocr_init_error`] explains why.
	pub fn new(
		ocr_detection: impl AsRef<std::path::Path>,
		ocr_recognition: impl AsRef<std::path::Path>,
		ocr_charset: impl AsRef<std::path::Path>,
	) -> Self {
		let ocr = ocr::Ocr::try_new(ocr_detection, ocr_recognition, ocr_charset).map_err(|err| {
			tracing::warn!("OCR disabled: {err:#}");
			format!("{err:#}")
		});
		Self { ocr }
	}

	/// An engine with OCR switched off, e.g. when the model files are missing.
	pub fn disabled(reason: impl Into<String>) -> Self {
		Self { ocr: Err(reason.into()) }
	}

	pub fn ocr_available(&self) -> bool {
		self.ocr.is_ok()
	}

	pub fn ocr_init_error(&self) -> Option<&str> {
		self.ocr.as_ref().err().map(String::as_str)
	}

	/// Raw OCR of a view, no preprocessing.
	pub fn text(&self, image: Image) -> String {
		match &self.ocr {
			Ok(ocr) => ocr.get_text(image),
			Err(_) => String::new(),
		}
	}

	/// Text of a battle screen, read for the `Wild <name>` banner.
	pub fn encounter_text(&self, image: Image) -> String {
		if !self.ocr_available() {
			return String::new();
		}
		self.text(screen::encounter::grayscale(image).as_image())
	}

	/// Text of a full frame, read for the map name and clock. Tries several
	/// binarizations and keeps the most plausible result.
	pub fn location_text(&self, image: Image) -> String {
		if !self.ocr_available() {
			return String::new();
		}
		screen::encounter::location_candidates(image)
			.iter()
			.map(|candidate| self.text(candidate.as_image()))
			.max_by_key(|text| screen::encounter::score_ocr_text(text))
			.unwrap_or_default()
	}
}
