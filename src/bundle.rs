use crate::path_util::{is_under, parent_dir, path_segments};
use serde::Serialize;

const APP_BUNDLE_SUFFIX: &str = ".app";

/// Mount root for attached disk images.
const DISK_IMAGE_ROOTS: &[&str] = &["/Volumes"];

/// Roots whose contents may be cleaned up by the OS at any time.
const TEMPORARY_ROOTS: &[&str] = &[
    "/tmp",
    "/private/tmp",
    "/var/tmp",
    "/private/var/tmp",
    "/var/folders",
    "/private/var/folders",
];

/// Gatekeeper runs quarantined apps from a randomized read-only copy that
/// contains this segment.
const TRANSLOCATION_SEGMENT: &str = "AppTranslocation";

/// Outcome of classifying where the running application is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLocationCheck {
    pub is_sane: bool,
    pub is_app_bundle: bool,
    pub app_path: Option<String>,
    pub reason: Option<String>,
}

impl AppLocationCheck {
    fn no_bundle() -> Self {
        Self {
            is_sane: false,
            is_app_bundle: false,
            app_path: None,
            reason: None,
        }
    }

    fn sane(app_path: String) -> Self {
        Self {
            is_sane: true,
            is_app_bundle: true,
            app_path: Some(app_path),
            reason: None,
        }
    }

    fn rejected(app_path: String, reason: String) -> Self {
        Self {
            is_sane: false,
            is_app_bundle: true,
            app_path: Some(app_path),
            reason: Some(reason),
        }
    }
}

/// Returns the prefix of `executable_path` through the first segment named
/// `<something>.app`.
pub fn resolve_app_bundle_path(executable_path: &str) -> Option<String> {
    path_segments(executable_path)
        .find(|(_, segment)| {
            segment.len() > APP_BUNDLE_SUFFIX.len() && segment.ends_with(APP_BUNDLE_SUFFIX)
        })
        .map(|(end, _)| executable_path[..end].to_string())
}

/// Classify the directory holding the app bundle that `executable_path` lives in.
pub fn check_app_location(executable_path: &str) -> AppLocationCheck {
    let Some(app_path) = resolve_app_bundle_path(executable_path) else {
        log::debug!("no application bundle found in {executable_path}");
        return AppLocationCheck::no_bundle();
    };
    let container = parent_dir(&app_path).unwrap_or_else(|| String::from("/"));

    // Disk images win over temporary roots when both could apply.
    if DISK_IMAGE_ROOTS.iter().any(|root| is_under(&container, root)) {
        return AppLocationCheck::rejected(
            app_path,
            String::from(
                "the app is running from a disk image; drag it into /Applications before installing the command",
            ),
        );
    }
    if TEMPORARY_ROOTS.iter().any(|root| is_under(&container, root)) {
        return AppLocationCheck::rejected(
            app_path,
            format!("the app is running from a temporary directory ({container}) that may be cleaned up"),
        );
    }
    if path_segments(&container).any(|(_, segment)| segment == TRANSLOCATION_SEGMENT) {
        return AppLocationCheck::rejected(
            app_path,
            String::from(
                "the app is running from a temporary App Translocation location; move it to /Applications and relaunch",
            ),
        );
    }

    log::debug!("application bundle {app_path} is in a stable location");
    AppLocationCheck::sane(app_path)
}
