//! Android APK inspection

use std::path::Path;

use tracing::{debug, warn};

use crate::archive::{base_name, PackageArchive};
use crate::axml::{self, XmlElement};
use crate::error::{PackageError, Result};
use crate::ipa::fallback_name;
use crate::types::{AppIcon, DeviceType, PackageMetadata};

pub(crate) const MANIFEST: &str = "AndroidManifest.xml";

// Framework attribute resource ids (android.R.attr)
const ATTR_LABEL: u32 = 0x0101_0001;
const ATTR_MIN_SDK_VERSION: u32 = 0x0101_020c;
const ATTR_VERSION_CODE: u32 = 0x0101_021b;
const ATTR_VERSION_NAME: u32 = 0x0101_021c;

/// Read metadata from an opened APK
pub(crate) fn inspect(mut archive: PackageArchive, path: &Path, size: u64) -> Result<PackageMetadata> {
    let manifest = archive
        .read(MANIFEST)?
        .ok_or_else(|| PackageError::invalid("APK has no AndroidManifest.xml"))?;
    let elements = axml::parse(&manifest)?;

    let root = elements
        .iter()
        .find(|e| e.name == "manifest" && e.depth == 0)
        .ok_or_else(|| PackageError::invalid("AndroidManifest.xml has no <manifest> root"))?;

    let identifier = text(root, "package", 0)
        .ok_or_else(|| PackageError::invalid("manifest has no package attribute"))?;
    let build_version = text(root, "versionCode", ATTR_VERSION_CODE).unwrap_or_default();
    let release_version = text(root, "versionName", ATTR_VERSION_NAME).unwrap_or_default();

    let min_os_version = child(&elements, "uses-sdk")
        .and_then(|e| text(e, "minSdkVersion", ATTR_MIN_SDK_VERSION));

    // Labels are usually resource references, which need resources.arsc to resolve
    let name = child(&elements, "application")
        .and_then(|e| text(e, "label", ATTR_LABEL))
        .unwrap_or_else(|| fallback_name(path));

    let icon = find_icon(&mut archive)?;

    debug!(
        identifier = %identifier,
        version = %release_version,
        build = %build_version,
        icon = icon.as_ref().map(|i| i.file_name.as_str()).unwrap_or(""),
        "inspected APK"
    );

    Ok(PackageMetadata {
        name,
        device_type: DeviceType::Android,
        identifier,
        release_version,
        build_version,
        os: DeviceType::Android.to_string(),
        min_os_version,
        release_type: None,
        provisioning_profile: None,
        icon,
        size,
    })
}

fn child<'a>(elements: &'a [XmlElement], name: &str) -> Option<&'a XmlElement> {
    elements.iter().find(|e| e.name == name && e.depth > 0)
}

fn text(element: &XmlElement, name: &str, resource_id: u32) -> Option<String> {
    element
        .attribute(name, resource_id)
        .and_then(|v| v.as_text())
        .filter(|s| !s.is_empty())
}

fn find_icon(archive: &mut PackageArchive) -> Result<Option<AppIcon>> {
    let candidates: Vec<String> = archive
        .names()
        .iter()
        .filter(|n| n.starts_with("res/") && n.ends_with(".png"))
        .filter(|n| base_name(n).starts_with("ic_launcher"))
        .cloned()
        .collect();

    let Some(entry) = archive.largest(&candidates) else {
        warn!("no launcher icon found in APK");
        return Ok(None);
    };

    Ok(archive.read(&entry)?.map(|data| AppIcon {
        file_name: base_name(&entry).to_string(),
        data,
    }))
}
