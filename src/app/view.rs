// SPDX-License-Identifier: GPL-3.0-only

//! Render decision
//!
//! Maps (permission, device, scanned result) to exactly one of three screens.
//! Front ends draw whatever this returns and hold no logic of their own.

use crate::app::state::ScannedCode;
use crate::backends::camera::CameraDevice;
use crate::fl;

/// Text lines of the decoded-result overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOverlay {
    /// e.g. "Código: 12345"
    pub value_line: String,
    /// e.g. "Tipo: ean-13"
    pub type_line: String,
}

impl ResultOverlay {
    pub fn new(scanned: &ScannedCode) -> Self {
        Self {
            value_line: format!("{}: {}", fl!("value-label"), scanned.value),
            type_line: format!("{}: {}", fl!("type-label"), scanned.symbology),
        }
    }
}

/// What the screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    /// Camera permission has not been granted
    PermissionRequest { message: String },
    /// Permission granted but no camera to scan with
    NoDevice { message: String },
    /// Live preview with the static instruction and, if present, the result
    LiveCapture {
        device_name: String,
        is_active: bool,
        overlay: Option<ResultOverlay>,
        instruction: String,
    },
}

impl ScreenView {
    pub fn overlay(&self) -> Option<&ResultOverlay> {
        match self {
            ScreenView::LiveCapture { overlay, .. } => overlay.as_ref(),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ScreenView::LiveCapture { .. })
    }
}

/// Decide what to render
///
/// Missing permission wins over a missing device.
pub fn render_decision(
    has_permission: bool,
    device: Option<&CameraDevice>,
    scanned: Option<&ScannedCode>,
    is_active: bool,
) -> ScreenView {
    if !has_permission {
        return ScreenView::PermissionRequest {
            message: fl!("permission-request"),
        };
    }

    let Some(device) = device else {
        return ScreenView::NoDevice {
            message: fl!("no-device"),
        };
    };

    ScreenView::LiveCapture {
        device_name: device.name.clone(),
        is_active,
        overlay: scanned.map(ResultOverlay::new),
        instruction: fl!("instruction"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::DecodedCode;
    use crate::backends::camera::CameraPosition;
    use crate::constants::Symbology;

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Integrated Camera".to_string(),
            path: "/dev/video0".to_string(),
            position: CameraPosition::External,
            device_info: None,
        }
    }

    fn scanned() -> ScannedCode {
        ScannedCode::from_decoded(DecodedCode::new("12345", Symbology::Ean13), 1)
    }

    #[test]
    fn test_permission_wins_over_device() {
        let dev = device();
        for device in [None, Some(&dev)] {
            let view = render_decision(false, device, None, true);
            assert_eq!(
                view,
                ScreenView::PermissionRequest {
                    message: "Precisamos de permissão para acessar a câmera".to_string()
                }
            );
        }
    }

    #[test]
    fn test_no_device() {
        let view = render_decision(true, None, Some(&scanned()), true);
        assert_eq!(
            view,
            ScreenView::NoDevice {
                message: "Dispositivo de câmera não encontrado".to_string()
            }
        );
    }

    #[test]
    fn test_live_capture_overlay_text() {
        let dev = device();
        let code = scanned();
        let view = render_decision(true, Some(&dev), Some(&code), true);
        let overlay = view.overlay().unwrap();
        assert_eq!(overlay.value_line, "Código: 12345");
        assert_eq!(overlay.type_line, "Tipo: ean-13");

        let view = render_decision(true, Some(&dev), None, true);
        assert!(view.is_live());
        assert!(view.overlay().is_none());
    }
}
