// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use code_scanner::constants::{Symbology, UiLanguage, file_formats};

#[test]
fn test_default_symbology_ids() {
    let ids: Vec<&str> = Symbology::DEFAULT_RECOGNIZED
        .iter()
        .map(|s| s.id())
        .collect();
    assert_eq!(
        ids,
        vec![
            "qr", "ean-13", "ean-8", "upc-a", "upc-e", "code-128", "code-39", "itf", "code-93"
        ]
    );
}

#[test]
fn test_symbology_parse_display_serde_agree() {
    for symbology in Symbology::ALL {
        let id = symbology.to_string();
        assert_eq!(id.parse::<Symbology>(), Ok(symbology));

        let json = serde_json::to_string(&symbology).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        assert_eq!(serde_json::from_str::<Symbology>(&json).unwrap(), symbology);
    }
}

#[test]
fn test_symbology_parse_is_lenient() {
    assert_eq!("EAN_13".parse::<Symbology>(), Ok(Symbology::Ean13));
    assert_eq!(" Code-128 ".parse::<Symbology>(), Ok(Symbology::Code128));
    assert!("maxicode".parse::<Symbology>().is_err());
}

#[test]
fn test_ui_language_tags() {
    assert_eq!("en".parse::<UiLanguage>(), Ok(UiLanguage::En));
    assert_eq!("pt-BR".parse::<UiLanguage>(), Ok(UiLanguage::PtBr));
    assert_eq!("PT_br".parse::<UiLanguage>(), Ok(UiLanguage::PtBr));
    assert!("de".parse::<UiLanguage>().is_err());

    for language in [UiLanguage::PtBr, UiLanguage::En] {
        assert_eq!(language.tag().parse::<UiLanguage>(), Ok(language));
        let json = serde_json::to_string(&language).unwrap();
        assert_eq!(json, format!("\"{}\"", language.tag()));
    }
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("PNG"));
    assert!(file_formats::is_image_extension("jpeg"));
    assert!(!file_formats::is_image_extension("mp4"));
}
