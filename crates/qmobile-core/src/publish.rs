//! Process-wide output values shared with later steps of the same run

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use tracing::debug;

/// Key and environment variable name of the install URL
pub const QMOBILE_PUBLISH_URL: &str = "QMOBILE_PUBLISH_URL";

fn store() -> &'static Mutex<HashMap<String, String>> {
    static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Record `value` under `key` in the shared store and the environment
///
/// Last write wins.
pub fn set_shared_value(key: &str, value: &str) {
    // A poisoned lock still holds a usable map
    let mut values = store().lock().unwrap_or_else(|e| e.into_inner());
    values.insert(key.to_string(), value.to_string());
    std::env::set_var(key, value);
    debug!(key, value, "published shared value");
}

pub fn shared_value(key: &str) -> Option<String> {
    store()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(key)
        .cloned()
}

/// Publish the install URL of the last upload
pub fn publish(url: &str) {
    set_shared_value(QMOBILE_PUBLISH_URL, url);
}

pub fn published_url() -> Option<String> {
    shared_value(QMOBILE_PUBLISH_URL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        set_shared_value("QMOBILE_TEST_SHARED", "first");
        set_shared_value("QMOBILE_TEST_SHARED", "second");
        assert_eq!(shared_value("QMOBILE_TEST_SHARED").as_deref(), Some("second"));
        assert_eq!(std::env::var("QMOBILE_TEST_SHARED").as_deref(), Ok("second"));
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(shared_value("QMOBILE_TEST_NEVER_SET"), None);
    }
}
