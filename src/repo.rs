//! Nexus repository access
//!
//! Typed view of a repository definition (enough to resolve canonical id and
//! name for group membership) plus the compressed-content upload used to fill
//! a staging repository.

use crate::error::Result;
use crate::session::Session;
use crate::xml::from_xml;
use serde::{Deserialize, Serialize};
use std::path::Path;

const REPOS_PATH: &str = "/service/local/repositories";

fn named_repo_path(key: &str) -> String {
    format!("{REPOS_PATH}/{key}")
}

fn compressed_content_path(key: &str, delete_first: bool) -> String {
    let delete_param = if delete_first { "?delete=true" } else { "" };
    format!("{}/content-compressed{delete_param}", named_repo_path(key))
}

/// Repository definition document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "repository")]
pub struct Repository {
    /// Payload of the definition
    pub data: RepositoryData,
}

/// The fields of a repository definition this tool consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryData {
    /// Repository id (key)
    pub id: String,

    /// Display name
    pub name: String,

    /// Content URI of the repository, when exposed
    #[serde(
        rename = "contentResourceURI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_resource_uri: Option<String>,
}

/// Load a repository definition; a 404 resolves to `None`
pub fn load(session: &Session, key: &str) -> Result<Option<Repository>> {
    match session.get_optional(&named_repo_path(key))? {
        Some(body) => from_xml(&body).map(Some),
        None => Ok(None),
    }
}

/// Check whether a repository exists
pub fn exists(session: &Session, key: &str) -> Result<bool> {
    session.exists(&named_repo_path(key))
}

/// Upload one zip part into a repository's compressed-content endpoint.
///
/// `delete_first` is set for the first part of a push so a re-push replaces
/// whatever content an earlier attempt left behind.
pub fn push_zip(session: &Session, repo_key: &str, zip_file: &Path, delete_first: bool) -> Result<()> {
    session.post_file(
        &compressed_content_path(repo_key, delete_first),
        zip_file,
        "application/zip",
    )
}
