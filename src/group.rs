//! Content group membership management
//!
//! Typed view of a Nexus repository group document with explicit XML
//! (de)serialization. Membership edits are idempotent, and `save` compares
//! canonical serialized forms so an unchanged document never touches the
//! network.

use crate::error::{CliError, Result};
use crate::repo;
use crate::session::Session;
use crate::xml::{from_xml, to_xml, to_xml_fragment};
use serde::{Deserialize, Serialize};

const GROUPS_PATH: &str = "/service/local/repo_groups";

/// Marker separating a server's base URL from a group's content path
const GROUP_CONTENT_MARKER: &str = "/content/groups/";

fn named_group_path(key: &str) -> String {
    format!("{GROUPS_PATH}/{key}")
}

/// Group document as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "repo-group")]
struct GroupDoc {
    data: GroupData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GroupData {
    id: String,
    name: String,
    #[serde(default = "maven2")]
    provider: String,
    #[serde(default = "maven2")]
    format: String,
    #[serde(rename = "repoType", default = "group_repo_type")]
    repo_type: String,
    #[serde(default = "yes")]
    exposed: bool,
    #[serde(
        rename = "contentResourceURI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    content_resource_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Memberships::is_empty")]
    repositories: Memberships,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct Memberships {
    #[serde(rename = "repo-group-member", default)]
    members: Vec<GroupMember>,
}

impl Memberships {
    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One member repository of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Repository id (key)
    pub id: String,

    /// Repository display name
    pub name: String,

    /// REST resource URI of the membership record
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
}

fn maven2() -> String {
    "maven2".to_string()
}

fn group_repo_type() -> String {
    "group".to_string()
}

fn yes() -> bool {
    true
}

/// A repository group with change tracking against its loaded form
#[derive(Debug, Clone)]
pub struct Group {
    doc: GroupDoc,
    new: bool,
    baseline: Option<String>,
}

/// Check whether a group exists
pub fn exists(session: &Session, group_key: &str) -> Result<bool> {
    session.exists(&named_group_path(group_key))
}

/// Load a group definition; a 404 resolves to `None`
pub fn load(session: &Session, group_key: &str) -> Result<Option<Group>> {
    match session.get_optional(&named_group_path(group_key))? {
        Some(body) => Group::from_wire(&body).map(Some),
        None => Ok(None),
    }
}

impl Group {
    /// Create a new (unsaved) group definition
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            doc: GroupDoc {
                data: GroupData {
                    id: id.to_string(),
                    name: name.to_string(),
                    provider: maven2(),
                    format: maven2(),
                    repo_type: group_repo_type(),
                    exposed: true,
                    content_resource_uri: None,
                    repositories: Memberships::default(),
                },
            },
            new: true,
            baseline: None,
        }
    }

    fn from_wire(xml: &str) -> Result<Self> {
        let doc: GroupDoc = from_xml(xml)?;
        // Baseline against our own rendering, not whatever formatting the
        // server sent, so comparisons stay canonical.
        let baseline = to_xml_fragment(&doc)?;
        Ok(Self {
            doc,
            new: false,
            baseline: Some(baseline),
        })
    }

    /// Group id (key)
    pub fn id(&self) -> &str {
        &self.doc.data.id
    }

    /// Group display name
    pub fn name(&self) -> &str {
        &self.doc.data.name
    }

    /// Content URI of the group, when known
    pub fn content_uri(&self) -> Option<&str> {
        self.doc.data.content_resource_uri.as_deref()
    }

    /// Current member repositories
    pub fn members(&self) -> &[GroupMember] {
        &self.doc.data.repositories.members
    }

    /// Whether the repository is already a member
    pub fn has_member(&self, repo_key: &str) -> bool {
        self.members().iter().any(|m| m.id == repo_key)
    }

    /// Whether the document differs from its loaded/saved form
    pub fn is_modified(&self) -> Result<bool> {
        match &self.baseline {
            Some(baseline) => Ok(*baseline != to_xml_fragment(&self.doc)?),
            None => Ok(true),
        }
    }

    /// Add a repository to the group's membership.
    ///
    /// A no-op when the repository is already a member. When the repository
    /// does not exist on the server, the condition is reported and the group
    /// is left untouched.
    pub fn append_member(&mut self, session: &Session, repo_key: &str) -> Result<()> {
        if self.has_member(repo_key) {
            return Ok(());
        }

        let Some(repository) = repo::load(session, repo_key)? else {
            println!(
                "Repository {repo_key} does not exist; not adding to group {}",
                self.id()
            );
            return Ok(());
        };

        self.append_resolved(&repository.data.id, &repository.data.name)?;
        Ok(())
    }

    /// Append a member whose canonical id and name are already known
    fn append_resolved(&mut self, repo_id: &str, repo_name: &str) -> Result<bool> {
        if self.has_member(repo_id) {
            return Ok(false);
        }

        let resource_uri = self.member_resource_uri(repo_id)?;
        self.doc.data.repositories.members.push(GroupMember {
            id: repo_id.to_string(),
            name: repo_name.to_string(),
            resource_uri,
        });
        Ok(true)
    }

    /// Membership records live under the group's REST resource on the same
    /// server that exposes the group content
    fn member_resource_uri(&self, repo_id: &str) -> Result<String> {
        let uri = self.content_uri().ok_or_else(|| {
            CliError::InvalidResponse(format!("group {} has no content URI", self.id()))
        })?;
        let Some((base, _)) = uri.split_once(GROUP_CONTENT_MARKER) else {
            return Err(CliError::InvalidResponse(format!(
                "unrecognized group content URI: {uri}"
            )));
        };
        Ok(format!("{base}{}/{repo_id}", named_group_path(self.id())))
    }

    /// Remove every membership record matching the repository key.
    ///
    /// A no-op when the repository is not a member.
    pub fn remove_member(&mut self, repo_key: &str) {
        self.doc
            .data
            .repositories
            .members
            .retain(|m| m.id != repo_key);
    }

    /// Persist the group: POST when new, PUT when existing.
    ///
    /// Skipped entirely (zero network calls) when the rendered document is
    /// identical to the form it was loaded or last saved with. The in-memory
    /// document is refreshed from the server's response.
    pub fn save(&mut self, session: &Session) -> Result<()> {
        if !self.is_modified()? {
            if session.debug() {
                println!("No changes to group {}; skipping save", self.id());
            }
            return Ok(());
        }

        let xml = to_xml(&self.doc)?;
        let response = if self.new {
            session.post(GROUPS_PATH, xml)?
        } else {
            session.put(&named_group_path(self.id()), xml)?
        };

        let refreshed: GroupDoc = from_xml(&response)?;
        self.baseline = Some(to_xml_fragment(&refreshed)?);
        self.doc = refreshed;
        self.new = false;
        Ok(())
    }
}
