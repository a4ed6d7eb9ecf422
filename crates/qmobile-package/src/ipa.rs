//! iOS IPA inspection

use std::io::Cursor;
use std::path::Path;

use tracing::{debug, warn};

use crate::archive::{base_name, PackageArchive};
use crate::error::{PackageError, Result};
use crate::provision::parse_mobileprovision;
use crate::types::{AppIcon, DeviceType, PackageMetadata, ReleaseType};

const PAYLOAD_PREFIX: &str = "Payload/";
const ITUNES_METADATA: &str = "iTunesMetadata.plist";

/// Locate `Payload/<name>.app/` inside the archive
pub(crate) fn app_root(archive: &PackageArchive) -> Option<String> {
    archive
        .names()
        .iter()
        .find(|n| {
            n.starts_with(PAYLOAD_PREFIX)
                && n.ends_with(".app/Info.plist")
                && n.matches('/').count() == 2
        })
        .map(|n| n.trim_end_matches("Info.plist").to_string())
}

/// Read metadata from an opened IPA
pub(crate) fn inspect(mut archive: PackageArchive, path: &Path, size: u64) -> Result<PackageMetadata> {
    let root = app_root(&archive)
        .ok_or_else(|| PackageError::invalid("IPA has no Payload/*.app/Info.plist"))?;

    let info_data = archive
        .read(&format!("{root}Info.plist"))?
        .ok_or_else(|| PackageError::invalid("missing Info.plist"))?;
    let info = plist::Value::from_reader(Cursor::new(info_data))?;
    let dict = info
        .as_dictionary()
        .ok_or_else(|| PackageError::invalid("Info.plist is not a dictionary"))?;

    let string = |key: &str| {
        dict.get(key)
            .and_then(|v| v.as_string())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    let identifier = string("CFBundleIdentifier")
        .ok_or_else(|| PackageError::invalid("missing CFBundleIdentifier"))?;

    let name = string("CFBundleDisplayName")
        .or_else(|| string("CFBundleName"))
        .unwrap_or_else(|| fallback_name(path));

    let release_version = string("CFBundleShortVersionString").unwrap_or_default();
    let build_version = string("CFBundleVersion").unwrap_or_default();
    let min_os_version = string("MinimumOSVersion");

    let provisioning_profile = match archive.read(&format!("{root}embedded.mobileprovision"))? {
        Some(data) => parse_mobileprovision(&data)?,
        None => None,
    };

    let release_type = if archive.contains(ITUNES_METADATA) {
        Some(ReleaseType::AppStore)
    } else {
        provisioning_profile.as_ref().map(|p| p.release_type())
    };

    let icon_names = icon_names(dict);
    let icon = find_icon(&mut archive, &root, &icon_names)?;

    debug!(
        identifier = %identifier,
        version = %release_version,
        build = %build_version,
        profile = provisioning_profile.is_some(),
        icon = icon.as_ref().map(|i| i.file_name.as_str()).unwrap_or(""),
        "inspected IPA"
    );

    Ok(PackageMetadata {
        name,
        device_type: DeviceType::Ios,
        identifier,
        release_version,
        build_version,
        os: DeviceType::Ios.to_string(),
        min_os_version,
        release_type,
        provisioning_profile,
        icon,
        size,
    })
}

/// Icon base names declared in Info.plist
fn icon_names(dict: &plist::Dictionary) -> Vec<String> {
    let mut names = Vec::new();
    let mut collect = |value: Option<&plist::Value>| {
        if let Some(items) = value.and_then(|v| v.as_array()) {
            names.extend(items.iter().filter_map(|v| v.as_string()).map(|s| s.to_string()));
        }
    };

    for key in ["CFBundleIcons", "CFBundleIcons~ipad"] {
        collect(
            dict.get(key)
                .and_then(|v| v.as_dictionary())
                .and_then(|d| d.get("CFBundlePrimaryIcon"))
                .and_then(|v| v.as_dictionary())
                .and_then(|d| d.get("CFBundleIconFiles")),
        );
    }
    collect(dict.get("CFBundleIconFiles"));

    if let Some(icon) = dict.get("CFBundleIconFile").and_then(|v| v.as_string()) {
        names.push(icon.to_string());
    }

    names
        .into_iter()
        .map(|n| n.trim_end_matches(".png").to_string())
        .collect()
}

fn find_icon(archive: &mut PackageArchive, root: &str, declared: &[String]) -> Result<Option<AppIcon>> {
    let pngs: Vec<String> = archive
        .names()
        .iter()
        .filter(|n| n.starts_with(root) && n.ends_with(".png"))
        .filter(|n| !n[root.len()..].contains('/'))
        .cloned()
        .collect();

    let matches_declared = |n: &&String| {
        let file = base_name(n);
        if declared.is_empty() {
            file.starts_with("AppIcon") || file.starts_with("Icon")
        } else {
            declared.iter().any(|d| file.starts_with(d.as_str()))
        }
    };
    let candidates: Vec<String> = pngs.iter().filter(matches_declared).cloned().collect();

    let Some(entry) = archive.largest(&candidates) else {
        warn!("no app icon found in IPA");
        return Ok(None);
    };

    Ok(archive.read(&entry)?.map(|data| AppIcon {
        file_name: base_name(&entry).to_string(),
        data,
    }))
}

pub(crate) fn fallback_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string()
}
