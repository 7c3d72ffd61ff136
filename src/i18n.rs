// SPDX-License-Identifier: GPL-3.0-only

//! Provides localization support for this crate.

use std::sync::LazyLock;

use crate::constants::UiLanguage;
use i18n_embed::{
    DefaultLocalizer, DesktopLanguageRequester, LanguageLoader, Localizer,
    fluent::{FluentLanguageLoader, fluent_language_loader},
};
pub use i18n_embed::unic_langid::LanguageIdentifier;
use rust_embed::RustEmbed;
use tracing::{debug, warn};

/// Applies the requested language(s) to requested translations from the `fl!()` macro.
pub fn init(requested_languages: &[LanguageIdentifier]) {
    match localizer().select(requested_languages) {
        Ok(selected) => debug!(languages = ?selected, "Selected localizations"),
        Err(why) => warn!(error = %why, "Failed to load localizations"),
    }
}

/// Languages to localize with
///
/// An explicit language wins; otherwise the desktop's preferred languages
/// are used, falling back to Portuguese for anything without a translation.
pub fn requested_languages(language: Option<UiLanguage>) -> Vec<LanguageIdentifier> {
    if let Some(language) = language {
        match language.tag().parse::<LanguageIdentifier>() {
            Ok(id) => return vec![id],
            Err(e) => warn!(tag = language.tag(), error = %e, "Invalid language tag"),
        }
    }
    DesktopLanguageRequester::requested_languages()
}

// Get the `Localizer` to be used for localizing this library.
#[must_use]
pub fn localizer() -> Box<dyn Localizer> {
    Box::from(DefaultLocalizer::new(&*LANGUAGE_LOADER, &Localizations))
}

#[derive(RustEmbed)]
#[folder = "i18n/"]
struct Localizations;

pub static LANGUAGE_LOADER: LazyLock<FluentLanguageLoader> = LazyLock::new(|| {
    let loader: FluentLanguageLoader = fluent_language_loader!();

    if let Err(e) = loader.load_fallback_language(&Localizations) {
        warn!(error = %e, "Failed to load fallback localization");
    }

    loader
});

/// Request a localized string by ID from the i18n/ directory.
#[macro_export]
macro_rules! fl {
    ($message_id:literal) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id)
    }};

    ($message_id:literal, $($args:expr),*) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id, $($args), *)
    }};
}
