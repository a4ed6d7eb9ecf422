//! Upload workflow

mod context;
mod discovery;
mod options;
mod upload;

pub use context::*;
pub use discovery::*;
pub use options::*;
pub use upload::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::error::{ConfigError, WorkflowError};
    use crate::publish::{publish, published_url};
    use qmobile_client::{
        ClientError, HostType, ResponseBody, UploadRequest, UploadResponse, Uploader,
    };
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.example.demo</string>
    <key>CFBundleDisplayName</key>
    <string>Demo</string>
    <key>CFBundleShortVersionString</key>
    <string>2.1.0</string>
    <key>CFBundleVersion</key>
    <string>7</string>
</dict>
</plist>"#;

    /// Serializes tests that write the process-wide published URL
    static PUBLISH_GUARD: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

    const UNTOUCHED_URL: &str = "https://h/apps/previous";

    struct FakeUploader {
        status: u16,
        body: serde_json::Value,
        requests: Mutex<Vec<UploadRequest>>,
    }

    impl FakeUploader {
        fn new(status: u16, body: serde_json::Value) -> Self {
            Self {
                status,
                body,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl Uploader for FakeUploader {
        fn request_url(&self, host_type: HostType) -> qmobile_client::Result<String> {
            match host_type {
                HostType::External => Ok("https://h/api/v2/apps/upload".to_string()),
                HostType::Internal => Err(ClientError::HostNotConfigured(host_type)),
            }
        }

        async fn upload(&self, request: &UploadRequest) -> qmobile_client::Result<UploadResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(UploadResponse {
                status: self.status,
                body: serde_json::from_value::<ResponseBody>(self.body.clone()).unwrap(),
            })
        }
    }

    fn write_ipa(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("Demo.ipa");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        zip.start_file(
            "Payload/Demo.app/Info.plist",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        zip.write_all(INFO_PLIST.as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    fn created() -> FakeUploader {
        FakeUploader::new(
            201,
            serde_json::json!({ "entry": { "host": { "external": "https://h" }, "app": { "slug": "s1" } } }),
        )
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_upload() {
        let dir = TempDir::new().unwrap();
        write_ipa(&dir);
        let uploader = created();
        let env = MapEnv::new();

        let options = UploadOptions::new("").with_working_dir(dir.path());
        let err = UploadWorkflow::new(&uploader, &env).run(options).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Configuration(ConfigError::MissingApiKey)));
        assert_eq!(uploader.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_upload() {
        let dir = TempDir::new().unwrap();
        let uploader = created();
        let env = MapEnv::new();

        let options = UploadOptions::new("k").with_working_dir(dir.path());
        let err = UploadWorkflow::new(&uploader, &env).run(options).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(ConfigError::MissingFile)));
        assert_eq!(
            err.to_string(),
            "You have to either pass an ipa or an apk file"
        );

        let options = UploadOptions::new("k").with_file(dir.path().join("gone.ipa"));
        let err = UploadWorkflow::new(&uploader, &env).run(options).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(ConfigError::MissingFile)));
        assert_eq!(uploader.calls(), 0);
    }

    #[tokio::test]
    async fn test_new_upload_publishes_url() {
        let _guard = PUBLISH_GUARD.lock().await;
        let dir = TempDir::new().unwrap();
        write_ipa(&dir);
        let uploader = created();
        let env = MapEnv::new();

        let options = UploadOptions::new("secret").with_working_dir(dir.path());
        let report = UploadWorkflow::new(&uploader, &env).run(options).await.unwrap();

        assert_eq!(report.url, "https://h/apps/s1");
        assert_eq!(report.status, 201);
        assert_eq!(report.message, "Successful uploaded file");
        assert!(!report.already_existed());
        assert_eq!(published_url().as_deref(), Some(report.url.as_str()));
        assert_eq!(std::env::var("QMOBILE_PUBLISH_URL").as_deref(), Ok("https://h/apps/s1"));

        let requests = uploader.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].params.get("key").unwrap().to_string(), "secret");
        assert_eq!(requests[0].params.get("identifier").unwrap().to_string(), "com.example.demo");
        assert!(requests[0].file.ends_with("Demo.ipa"));
    }

    #[tokio::test]
    async fn test_already_exists_is_not_an_error() {
        let _guard = PUBLISH_GUARD.lock().await;
        let dir = TempDir::new().unwrap();
        let file = write_ipa(&dir);
        let uploader = FakeUploader::new(
            200,
            serde_json::json!({ "entry": { "host": { "external": "https://h" }, "app": { "slug": "s1" }, "version": 7 } }),
        );
        let env = MapEnv::new();

        let report = UploadWorkflow::new(&uploader, &env)
            .run(UploadOptions::new("k").with_file(file))
            .await
            .unwrap();
        assert_eq!(report.url, "https://h/apps/s1/7");
        assert!(report.already_existed());
        assert_eq!(published_url().as_deref(), Some("https://h/apps/s1/7"));
    }

    #[tokio::test]
    async fn test_validation_failure() {
        let _guard = PUBLISH_GUARD.lock().await;
        publish(UNTOUCHED_URL);
        let dir = TempDir::new().unwrap();
        let file = write_ipa(&dir);
        let uploader = FakeUploader::new(
            422,
            serde_json::json!({ "message": "Invalid", "entry": { "file": ["is broken"] } }),
        );
        let env = MapEnv::new();

        let err = UploadWorkflow::new(&uploader, &env)
            .run(UploadOptions::new("k").with_file(file))
            .await
            .unwrap_err();
        match err {
            WorkflowError::Validation(message) => {
                assert_eq!(message, "[ERROR] Invalid\n1. file\n- is broken")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(published_url().as_deref(), Some(UNTOUCHED_URL));
        assert_eq!(uploader.calls(), 1);
    }

    #[tokio::test]
    async fn test_unclassified_failure() {
        let _guard = PUBLISH_GUARD.lock().await;
        publish(UNTOUCHED_URL);
        let dir = TempDir::new().unwrap();
        let file = write_ipa(&dir);
        let uploader = FakeUploader::new(503, serde_json::json!({ "message": "Maintenance" }));
        let env = MapEnv::new();

        let err = UploadWorkflow::new(&uploader, &env)
            .run(UploadOptions::new("k").with_file(file))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unclassified(ref m) if m == "Maintenance"));
        assert_eq!(published_url().as_deref(), Some(UNTOUCHED_URL));
    }

    #[test]
    fn test_prepare_summary_hides_sensitive_fields() {
        let dir = TempDir::new().unwrap();
        let file = write_ipa(&dir);
        let uploader = created();
        let env = MapEnv::new();

        let mut options = UploadOptions::new("secret").with_file(&file);
        options.changelog = Some("A long changelog".to_string());
        options.timeout = Some(120);

        let context = UploadWorkflow::new(&uploader, &env).prepare(options).unwrap();
        let summary = context.summary();
        let keys: Vec<&str> = summary.iter().map(|r| r.key.as_str()).collect();

        assert_eq!(&keys[..5], &["channel", "timeout", "url", "file", "icon"]);
        assert!(keys.contains(&"identifier"));
        assert!(!keys.contains(&"key"));
        assert!(!keys.contains(&"changelog"));
        assert_eq!(summary[1].value, "120");
        assert_eq!(summary[2].value, "https://h/api/v2/apps/upload");
        assert_eq!(uploader.calls(), 0);
    }

    #[test]
    fn test_unconfigured_host() {
        let dir = TempDir::new().unwrap();
        let file = write_ipa(&dir);
        let uploader = created();
        let env = MapEnv::new();

        let mut options = UploadOptions::new("k").with_file(file);
        options.host_type = HostType::Internal;
        let err = UploadWorkflow::new(&uploader, &env).prepare(options).unwrap_err();
        assert!(matches!(err, WorkflowError::Client(ClientError::HostNotConfigured(_))));
    }
}
