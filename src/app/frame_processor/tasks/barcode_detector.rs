// SPDX-License-Identifier: GPL-3.0-only

//! Linear barcode and non-QR 2D code detection
//!
//! Uses rxing's multi-format reader on the prepared luma image, limited to
//! the recognized formats. QR codes are left to the dedicated QR detector.

use crate::app::frame_processor::prepare::LumaImage;
use crate::app::frame_processor::types::DecodedCode;
use crate::constants::Symbology;
use rxing::{BarcodeFormat, DecodeHintType, DecodeHintValue, DecodingHintDictionary};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace};

/// Map an rxing format to a symbology, `None` for formats we do not offer
pub fn symbology_for_format(format: &BarcodeFormat) -> Option<Symbology> {
    match format {
        BarcodeFormat::QR_CODE => Some(Symbology::Qr),
        BarcodeFormat::EAN_13 => Some(Symbology::Ean13),
        BarcodeFormat::EAN_8 => Some(Symbology::Ean8),
        BarcodeFormat::UPC_A => Some(Symbology::UpcA),
        BarcodeFormat::UPC_E => Some(Symbology::UpcE),
        BarcodeFormat::CODE_128 => Some(Symbology::Code128),
        BarcodeFormat::CODE_39 => Some(Symbology::Code39),
        BarcodeFormat::CODE_93 => Some(Symbology::Code93),
        BarcodeFormat::ITF => Some(Symbology::Itf),
        BarcodeFormat::CODABAR => Some(Symbology::Codabar),
        BarcodeFormat::PDF_417 => Some(Symbology::Pdf417),
        BarcodeFormat::AZTEC => Some(Symbology::Aztec),
        BarcodeFormat::DATA_MATRIX => Some(Symbology::DataMatrix),
        _ => None,
    }
}

/// rxing format for a symbology
pub fn format_for_symbology(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Qr => BarcodeFormat::QR_CODE,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Code93 => BarcodeFormat::CODE_93,
        Symbology::Itf => BarcodeFormat::ITF,
        Symbology::Codabar => BarcodeFormat::CODABAR,
        Symbology::Pdf417 => BarcodeFormat::PDF_417,
        Symbology::Aztec => BarcodeFormat::AZTEC,
        Symbology::DataMatrix => BarcodeFormat::DATA_MATRIX,
    }
}

/// Formats rxing should try for `recognized`, without QR
pub fn possible_formats(recognized: &BTreeSet<Symbology>) -> HashSet<BarcodeFormat> {
    recognized
        .iter()
        .filter(|symbology| **symbology != Symbology::Qr)
        .map(|symbology| format_for_symbology(*symbology))
        .collect()
}

/// Detect the recognized non-QR codes in the image
pub fn detect_barcodes(
    image: &LumaImage,
    recognized: &BTreeSet<Symbology>,
) -> Vec<DecodedCode> {
    let formats = possible_formats(recognized);
    if formats.is_empty() {
        return Vec::new();
    }

    let start = std::time::Instant::now();
    let mut hints = DecodingHintDictionary::new();
    hints.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(formats),
    );

    let results = match rxing::helpers::detect_multiple_in_luma_with_hints(
        image.data.clone(),
        image.width,
        image.height,
        &mut hints,
    ) {
        Ok(results) => results,
        Err(e) => {
            // "Not found" is the normal outcome for most frames
            trace!(error = %e, "No barcodes in frame");
            return Vec::new();
        }
    };

    let detections: Vec<DecodedCode> = results
        .iter()
        .filter_map(|result| {
            let format = result.getBarcodeFormat();
            let Some(symbology) = symbology_for_format(format) else {
                debug!(format = ?format, "Ignoring unsupported barcode format");
                return None;
            };
            if !recognized.contains(&symbology) {
                return None;
            }
            Some(DecodedCode::new(result.getText(), symbology))
        })
        .collect();

    if !detections.is_empty() {
        debug!(
            count = detections.len(),
            total_ms = start.elapsed().as_millis(),
            "Barcode detection found codes"
        );
    }

    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_symbologies_all_map() {
        let mapped: Vec<Symbology> = [
            BarcodeFormat::QR_CODE,
            BarcodeFormat::EAN_13,
            BarcodeFormat::EAN_8,
            BarcodeFormat::UPC_A,
            BarcodeFormat::UPC_E,
            BarcodeFormat::CODE_128,
            BarcodeFormat::CODE_39,
            BarcodeFormat::ITF,
            BarcodeFormat::CODE_93,
        ]
        .iter()
        .filter_map(symbology_for_format)
        .collect();
        assert_eq!(mapped, Symbology::DEFAULT_RECOGNIZED.to_vec());
    }

    #[test]
    fn test_unsupported_format() {
        assert_eq!(symbology_for_format(&BarcodeFormat::MAXICODE), None);
    }

    #[test]
    fn test_format_mapping_is_symmetric() {
        for symbology in Symbology::ALL {
            let format = format_for_symbology(symbology);
            assert_eq!(symbology_for_format(&format), Some(symbology));
        }
    }

    #[test]
    fn test_possible_formats_skip_qr() {
        let recognized: BTreeSet<Symbology> =
            [Symbology::Qr, Symbology::Ean13, Symbology::Code128].into_iter().collect();
        let formats = possible_formats(&recognized);
        assert_eq!(formats.len(), 2);
        assert!(formats.contains(&BarcodeFormat::EAN_13));
        assert!(formats.contains(&BarcodeFormat::CODE_128));
        assert!(!formats.contains(&BarcodeFormat::QR_CODE));

        let only_qr: BTreeSet<Symbology> = [Symbology::Qr].into_iter().collect();
        assert!(possible_formats(&only_qr).is_empty());
    }

    #[test]
    fn test_blank_image_has_no_barcodes() {
        let image = LumaImage {
            width: 32,
            height: 32,
            data: vec![255; 32 * 32],
        };
        let recognized: BTreeSet<Symbology> = Symbology::ALL.into_iter().collect();
        assert!(detect_barcodes(&image, &recognized).is_empty());
    }
}
