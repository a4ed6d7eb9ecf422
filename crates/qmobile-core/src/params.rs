//! Form fields sent with an upload

use chrono::SecondsFormat;
use qmobile_client::{ParamValue, QueryParams};
use qmobile_package::PackageMetadata;
use tracing::debug;

use crate::ci;
use crate::env::Environment;
use crate::workflow::UploadOptions;

/// Build the upload form fields
///
/// Later groups override earlier ones on key collision: package metadata,
/// user options, provisioning profile fields, Jenkins fields, then
/// `custom_data`. `key` always comes first.
pub fn build_query_params(
    options: &UploadOptions,
    metadata: &PackageMetadata,
    env: &dyn Environment,
) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("key", options.api_key.as_str());

    params.insert("name", metadata.name.as_str());
    params.insert("device_type", metadata.device_type.as_str());
    params.insert("identifier", metadata.identifier.as_str());
    params.insert("release_version", metadata.release_version.as_str());
    params.insert("build_version", metadata.build_version.as_str());

    params.insert("channel", options.channel.as_str());
    params.insert_opt("branch", options.branch.as_deref());
    params.insert_opt("last_commit", options.last_commit.as_deref());
    params.insert_opt("ci_url", options.ci_url.as_deref());
    params.insert_opt("changelog", options.changelog.as_deref());
    params.insert_opt("name", options.app_name.as_deref());
    params.insert_opt("slug", options.slug.as_deref());

    add_provisioning_fields(&mut params, metadata);

    if ci::is_jenkins(env) {
        params.insert_opt("ci_name", env.var("JOB_NAME"));
        params.insert_opt("git_url", env.var("GIT_URL"));
    }

    for (key, value) in &options.custom_data {
        if let Some(value) = ParamValue::from_json(value) {
            params.insert(key.as_str(), value);
        }
    }

    debug!(fields = params.len(), "built upload params");
    params
}

fn add_provisioning_fields(params: &mut QueryParams, metadata: &PackageMetadata) {
    if !metadata.is_ios() {
        return;
    }
    let Some(profile) = &metadata.provisioning_profile else {
        return;
    };

    let release_type = metadata.release_type.unwrap_or_else(|| profile.release_type());
    params.insert("release_type", release_type.as_str());
    params.insert_opt("devices", metadata.devices().map(|d| d.to_vec()));
    params.insert_opt("profile_name", profile.name.as_deref());
    params.insert_opt(
        "profile_created_at",
        profile.created_at.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    params.insert_opt(
        "profile_expired_at",
        profile.expired_at.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
}
