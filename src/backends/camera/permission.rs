// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission checks
//!
//! Access is granted when the user can open the video device nodes. The
//! request goes through the XDG desktop camera portal, which shows the
//! desktop's consent dialog (and is what sandboxed installs have to use).

use super::v4l2_utils::{is_accessible, list_video_nodes};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// How long to wait for the user to answer the consent dialog
const PORTAL_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Whether camera nodes can be opened
///
/// With no nodes at all there is nothing to deny; the missing device is
/// reported separately.
pub fn video_nodes_accessible() -> bool {
    let nodes = list_video_nodes();
    nodes.is_empty() || nodes.iter().any(|node| is_accessible(node))
}

/// Ask for camera access, resolving to the resulting permission state
pub async fn request_camera_access() -> bool {
    if video_nodes_accessible() {
        return true;
    }

    match tokio::time::timeout(PORTAL_RESPONSE_TIMEOUT, access_camera_via_portal()).await {
        Ok(Ok(true)) => {
            info!("Camera access granted by portal");
            let accessible = video_nodes_accessible();
            if !accessible {
                warn!("Portal granted access but video devices are still not readable");
            }
            accessible
        }
        Ok(Ok(false)) => {
            warn!("Camera access denied");
            false
        }
        Ok(Err(e)) => {
            warn!(
                error = %e,
                "Camera portal unavailable; add your user to the 'video' group to grant access"
            );
            false
        }
        Err(_) => {
            warn!("Timed out waiting for camera permission");
            false
        }
    }
}

/// Call `org.freedesktop.portal.Camera.AccessCamera` and wait for the reply
///
/// The portal answers through a `Response` signal on a request object whose
/// path is derived from our bus name and a handle token, so we subscribe
/// before calling to avoid missing a fast reply.
async fn access_camera_via_portal() -> Result<bool, String> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;

    let token = format!("code_scanner_{}", uuid::Uuid::new_v4().simple());
    let sender = connection
        .unique_name()
        .ok_or_else(|| "Connection has no unique name".to_string())?
        .as_str()
        .trim_start_matches(':')
        .replace('.', "_");
    let request_path = format!("{}/request/{}/{}", PORTAL_PATH, sender, token);

    let request_proxy = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        request_path.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(|e| format!("Failed to create portal request proxy: {}", e))?;

    let mut responses = request_proxy
        .receive_signal("Response")
        .await
        .map_err(|e| format!("Failed to subscribe to portal response: {}", e))?;

    let camera_proxy = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        PORTAL_PATH,
        CAMERA_INTERFACE,
    )
    .await
    .map_err(|e| format!("Failed to create camera portal proxy: {}", e))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::new(token.as_str()));

    let handle: OwnedObjectPath = camera_proxy
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| format!("AccessCamera failed: {}", e))?;
    debug!(handle = %handle, "Camera access requested");

    let message = responses
        .next()
        .await
        .ok_or_else(|| "Portal closed the request without answering".to_string())?;

    // 0 = granted, 1 = cancelled by the user, 2 = other failure
    let (response, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| format!("Malformed portal response: {}", e))?;

    Ok(response == 0)
}
