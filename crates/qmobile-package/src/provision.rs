//! Embedded provisioning profile parsing
//!
//! An `embedded.mobileprovision` is a CMS (PKCS#7) envelope whose signed
//! content is an XML property list. The envelope is not verified here; the
//! plist payload is located by its XML prologue and closing tag.

use std::io::Cursor;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{PackageError, Result};
use crate::types::ProvisioningProfile;

const XML_START: &[u8] = b"<?xml";
const PLIST_END: &[u8] = b"</plist>";

/// Parse the raw bytes of an `embedded.mobileprovision`.
///
/// Returns `Ok(None)` for an empty file.
pub fn parse_mobileprovision(data: &[u8]) -> Result<Option<ProvisioningProfile>> {
    if data.is_empty() {
        return Ok(None);
    }

    let payload = extract_plist_payload(data).ok_or_else(|| {
        PackageError::invalid("embedded.mobileprovision does not contain a property list")
    })?;

    let value = plist::Value::from_reader_xml(Cursor::new(payload))?;
    let dict = value
        .as_dictionary()
        .ok_or_else(|| PackageError::invalid("provisioning profile is not a dictionary"))?;

    let string = |key: &str| {
        dict.get(key)
            .and_then(|v| v.as_string())
            .map(|s| s.to_string())
    };
    let date = |key: &str| dict.get(key).and_then(|v| v.as_date()).map(to_utc);

    let devices = dict
        .get("ProvisionedDevices")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_string())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    let provisions_all_devices = dict
        .get("ProvisionsAllDevices")
        .and_then(|v| v.as_boolean())
        .unwrap_or(false);

    let get_task_allow = dict
        .get("Entitlements")
        .and_then(|v| v.as_dictionary())
        .and_then(|e| e.get("get-task-allow"))
        .and_then(|v| v.as_boolean())
        .unwrap_or(false);

    let profile = ProvisioningProfile {
        name: string("Name"),
        team_name: string("TeamName"),
        created_at: date("CreationDate"),
        expired_at: date("ExpirationDate"),
        devices,
        provisions_all_devices,
        get_task_allow,
    };

    debug!(
        name = profile.name.as_deref().unwrap_or(""),
        devices = profile.devices.len(),
        "parsed provisioning profile"
    );

    Ok(Some(profile))
}

fn extract_plist_payload(data: &[u8]) -> Option<&[u8]> {
    let start = find(data, XML_START)?;
    let end = find(&data[start..], PLIST_END)? + start + PLIST_END.len();
    Some(&data[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn to_utc(date: plist::Date) -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::from(date))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PROFILE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Name</key>
    <string>Example AdHoc</string>
    <key>TeamName</key>
    <string>Example Inc.</string>
    <key>CreationDate</key>
    <date>2024-01-02T03:04:05Z</date>
    <key>ExpirationDate</key>
    <date>2025-01-02T03:04:05Z</date>
    <key>ProvisionedDevices</key>
    <array>
        <string>00008030-0001</string>
        <string>00008030-0002</string>
    </array>
    <key>Entitlements</key>
    <dict>
        <key>get-task-allow</key>
        <false/>
    </dict>
</dict>
</plist>"#;

    /// Wrap the XML in junk bytes the way a CMS envelope does
    pub(crate) fn enveloped(xml: &str) -> Vec<u8> {
        let mut data = vec![0x30, 0x82, 0x1f, 0x4a, 0x06, 0x09];
        data.extend_from_slice(xml.as_bytes());
        data.extend_from_slice(&[0xa0, 0x82, 0x0c, 0x00]);
        data
    }

    #[test]
    fn test_parse_enveloped_profile() {
        let profile = parse_mobileprovision(&enveloped(PROFILE_XML))
            .unwrap()
            .unwrap();

        assert_eq!(profile.name.as_deref(), Some("Example AdHoc"));
        assert_eq!(profile.team_name.as_deref(), Some("Example Inc."));
        assert_eq!(profile.devices.len(), 2);
        assert!(!profile.get_task_allow);
        assert_eq!(
            profile.created_at.unwrap().to_rfc3339(),
            "2024-01-02T03:04:05+00:00"
        );
        assert_eq!(
            profile.expired_at.unwrap().to_rfc3339(),
            "2025-01-02T03:04:05+00:00"
        );
    }

    #[test]
    fn test_empty_profile_is_none() {
        assert!(parse_mobileprovision(&[]).unwrap().is_none());
    }

    #[test]
    fn test_profile_without_plist_fails() {
        let err = parse_mobileprovision(b"\x30\x82garbage").unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackage(_)));
    }
}
