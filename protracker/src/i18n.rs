use std::sync::LazyLock;

use i18n_embed::{
	DesktopLanguageRequester,
	fluent::{FluentLanguageLoader, fluent_language_loader},
};
use rust_embed::RustEmbed;
use unic_langid::LanguageIdentifier;

#[derive(RustEmbed)]
#[folder = "i18n"]
struct Localizations;

static LOADER: LazyLock<FluentLanguageLoader> = LazyLock::new(|| {
	let loader = fluent_language_loader!();
	// Bidi isolation marks show up as boxes in egui.
	loader.set_use_isolating(false);
	loader
});

/// Access the global language loader (used by `tr!()`).
pub fn loader() -> &'static FluentLanguageLoader {
	&LOADER
}

/// Initialize localization. If `forced_locale` is provided, it is preferred over the system locale.
pub fn init(forced_locale: Option<&str>) {
	let requested = if let Some(tag) = forced_locale {
		tag.parse::<LanguageIdentifier>()
			.ok()
			.into_iter()
			.collect::<Vec<_>>()
	} else {
		DesktopLanguageRequester::requested_languages()
	};

	if let Err(err) = i18n_embed::select(loader(), &Localizations, &requested) {
		tracing::warn!(error = %err, "failed to select locale; using fallback");
	}
}

/// (Re)select a locale at runtime.
pub fn set_locale(tag: Option<&str>) {
	init(tag);
}

#[macro_export]
macro_rules! tr {
	($id:literal $(, $name:ident = $value:expr )* $(,)?) => {
		i18n_embed_fl::fl!($crate::i18n::loader(), $id $(, $name = $value )* )
	};
}

#[cfg(test)]
mod tests {
	#[test]
	fn fallback_strings_resolve() {
		super::init(Some("en"));
		assert_eq!(crate::tr!("tab-home"), "Home");
		assert_eq!(
			crate::tr!("session-header", total = 3),
			"Session Tracker | Total Encounters: 3"
		);
	}
}
