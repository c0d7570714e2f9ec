//! Staging lifecycle operations
//!
//! Drives a Nexus staging repository from open to promoted: `start` opens a
//! repository under a product's staging profile, `finish` requests the close,
//! `promote` moves a closed repository (or a previously promoted group) into
//! a promotion profile group, and `drop` discards a repository entirely.
//! Completion of close/promote is asynchronous on the server and must be
//! confirmed via the [`crate::activity`] module.

use crate::config::{Config, QualityLevel};
use crate::error::Result;
use crate::session::Session;
use crate::xml::{from_xml, to_xml};
use serde::{Deserialize, Serialize};

const BULK_PROMOTE_PATH: &str = "/service/local/staging/bulk/promote";

fn profile_path(profile_id: &str, operation: &str) -> String {
    format!("/service/local/staging/profiles/{profile_id}/{operation}")
}

fn repository_path(repo_id: &str) -> String {
    format!("/service/local/staging/repository/{repo_id}")
}

/// XML envelope for start/finish/drop requests
#[derive(Debug, Serialize)]
#[serde(rename = "promoteRequest")]
struct PromoteRequest {
    data: PromoteRequestData,
}

#[derive(Debug, Serialize)]
struct PromoteRequestData {
    description: String,
    #[serde(rename = "stagedRepositoryId", skip_serializing_if = "Option::is_none")]
    staged_repository_id: Option<String>,
}

impl PromoteRequest {
    fn new(description: String, staged_repository_id: Option<String>) -> Self {
        Self {
            data: PromoteRequestData {
                description,
                staged_repository_id,
            },
        }
    }
}

/// XML envelope of the start response
#[derive(Debug, Deserialize)]
struct PromoteResponse {
    data: PromoteResponseData,
}

#[derive(Debug, Deserialize)]
struct PromoteResponseData {
    #[serde(rename = "stagedRepositoryId")]
    staged_repository_id: String,
}

/// Staging repository metadata, used to recover the owning profile for drop
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagingRepositoryInfo {
    profile_id: String,
}

/// Error envelope returned by the server when it rejects a request
#[derive(Debug, Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    #[serde(default)]
    msg: String,
}

/// Human-readable description attached to every lifecycle request
pub fn staging_description(product: &str, version: &str, quality: QualityLevel) -> String {
    format!("{product}, ver {version} (to {})", quality.group_label())
}

/// Open a staging repository under the product's staging profile.
///
/// Returns the server-assigned repository id.
pub fn start_staging_repo(
    session: &Session,
    config: &Config,
    product: &str,
    version: &str,
    quality: QualityLevel,
) -> Result<String> {
    let profile_id = config.profile_id(product, quality)?;

    let request = PromoteRequest::new(staging_description(product, version, quality), None);
    let response = session.post(&profile_path(profile_id, "start"), to_xml(&request)?)?;
    parse_staged_repository_id(&response)
}

/// Extract the server-assigned repository id from a start response
fn parse_staged_repository_id(response: &str) -> Result<String> {
    let parsed: PromoteResponse = from_xml(response)?;
    Ok(parsed.data.staged_repository_id)
}

/// Request the close of a filled staging repository.
///
/// The server records the close asynchronously; success must be confirmed by
/// polling the repository's activity log.
pub fn finish_staging_repo(
    session: &Session,
    config: &Config,
    repo_id: &str,
    product: &str,
    version: &str,
    quality: QualityLevel,
) -> Result<()> {
    let profile_id = config.profile_id(product, quality)?;

    let request = PromoteRequest::new(
        staging_description(product, version, quality),
        Some(repo_id.to_string()),
    );
    session.post(&profile_path(profile_id, "finish"), to_xml(&request)?)?;
    Ok(())
}

/// Drop a staging repository, discarding its content.
///
/// The owning profile is recovered from the repository's metadata. A server
/// rejection is reported (every server-provided message is printed) and
/// returned as `Ok(false)` rather than raised.
pub fn drop_staging_repo(session: &Session, repo_id: &str) -> Result<bool> {
    let info: StagingRepositoryInfo = session.get_json(&repository_path(repo_id))?;

    let request = PromoteRequest::new(
        format!("Dropping repository {repo_id}"),
        Some(repo_id.to_string()),
    );
    let (status, body) =
        session.post_lenient(&profile_path(&info.profile_id, "drop"), to_xml(&request)?)?;

    if status == 201 {
        return Ok(true);
    }

    let messages = parse_error_messages(&body);
    if messages.is_empty() {
        eprintln!("Drop failed with status {status}: {body}");
    } else {
        for message in messages {
            eprintln!("Drop failed: {message}");
        }
    }
    Ok(false)
}

/// Pull individual error messages out of a server rejection body
fn parse_error_messages(body: &str) -> Vec<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| {
            envelope
                .errors
                .into_iter()
                .map(|e| e.msg)
                .filter(|m| !m.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Promote an entity into a promotion profile group.
///
/// The entity is a staging repository id on the first hop of a promotion
/// chain, or the group id produced by the previous hop on later ones.
pub fn promote(
    session: &Session,
    profile_group: &str,
    entity_id: &str,
    product: &str,
    version: &str,
    quality: QualityLevel,
) -> Result<()> {
    let body = promote_request_body(profile_group, entity_id, product, version, quality);
    session.post_json(BULK_PROMOTE_PATH, &body)?;
    Ok(())
}

fn promote_request_body(
    profile_group: &str,
    entity_id: &str,
    product: &str,
    version: &str,
    quality: QualityLevel,
) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "stagingProfileGroup": profile_group,
            "description": staging_description(product, version, quality),
            "stagedRepositoryIds": [entity_id],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn description_names_product_version_and_destination() {
        assert_eq!(
            staging_description("eap", "1.1.1", QualityLevel::Ga),
            "eap, ver 1.1.1 (to GA)"
        );
        assert_eq!(
            staging_description("eap", "1.1.1", QualityLevel::Ea),
            "eap, ver 1.1.1 (to Early-Access)"
        );
    }

    #[test]
    fn start_response_yields_repository_id() {
        let response = r#"
        <promoteResponse>
          <data>
            <stagedRepositoryId>xyz-1001</stagedRepositoryId>
            <description>Unused Description</description>
          </data>
        </promoteResponse>
        "#;

        let repo_id = parse_staged_repository_id(response).expect("response parses");
        assert_eq!(repo_id, "xyz-1001");
    }

    #[test]
    fn malformed_start_response_is_an_error() {
        let err = parse_staged_repository_id("<promoteResponse/>").expect_err("missing data");
        assert!(matches!(err, CliError::InvalidResponse(_)));
    }

    #[test]
    fn start_envelope_omits_repository_id() {
        let request = PromoteRequest::new("eap, ver 1.0 (to GA)".to_string(), None);
        let xml = to_xml(&request).expect("serializes");
        assert!(xml.contains("<promoteRequest>"));
        assert!(xml.contains("<description>eap, ver 1.0 (to GA)</description>"));
        assert!(!xml.contains("stagedRepositoryId"));
    }

    #[test]
    fn finish_envelope_carries_repository_id() {
        let request = PromoteRequest::new(
            "eap, ver 1.0 (to GA)".to_string(),
            Some("xyz-1001".to_string()),
        );
        let xml = to_xml(&request).expect("serializes");
        assert!(xml.contains("<stagedRepositoryId>xyz-1001</stagedRepositoryId>"));
    }

    #[test]
    fn promote_body_names_group_and_entity() {
        let body = promote_request_body("g-123", "xyz-1001", "eap", "1.0", QualityLevel::Ga);
        assert_eq!(body["data"]["stagingProfileGroup"], "g-123");
        assert_eq!(body["data"]["stagedRepositoryIds"][0], "xyz-1001");
        assert_eq!(body["data"]["description"], "eap, ver 1.0 (to GA)");
    }

    #[test]
    fn server_error_messages_are_extracted() {
        let body = r#"{"errors":[{"id":"*","msg":"Unable to drop"},{"id":"*","msg":"Repository busy"}]}"#;
        assert_eq!(
            parse_error_messages(body),
            vec!["Unable to drop".to_string(), "Repository busy".to_string()]
        );
        assert!(parse_error_messages("not json").is_empty());
    }
}
