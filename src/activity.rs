//! Activity log verification and polling
//!
//! Close and promote are asynchronous on the server: the REST call only
//! queues the action, and its outcome appears later in the repository's
//! activity log. This module polls that log until the action is recorded as
//! complete, surfaces any rule failures, and resolves the group a repository
//! was promoted into.

use crate::config::PollingSettings;
use crate::error::{CliError, Result};
use crate::session::Session;
use serde::Deserialize;
use std::thread;
use std::time::Duration;

fn activity_path(entity_id: &str) -> String {
    format!("/service/local/staging/repository/{entity_id}/activity")
}

/// One recorded action (close, promote, drop) against a repository or group
#[derive(Debug, Deserialize)]
pub struct Activity {
    /// Action name: `close`, `promote`, or `drop`
    pub name: String,

    /// Set once the server has finished recording the action
    #[serde(default)]
    pub stopped: Option<String>,

    /// Events recorded for the action; absent while still in progress
    #[serde(default)]
    pub events: Option<Vec<ActivityEvent>>,
}

/// One event within an activity record
#[derive(Debug, Deserialize)]
pub struct ActivityEvent {
    /// Event name, e.g. `ruleFailed` or `repositoryPromoted`
    pub name: String,

    #[serde(default)]
    properties: Vec<ActivityProperty>,
}

#[derive(Debug, Deserialize)]
struct ActivityProperty {
    name: String,
    value: String,
}

impl ActivityEvent {
    /// Look up a property value by name
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// An action is complete only once the server has recorded both its events
/// and a stopped marker; anything less must be re-polled.
fn find_completed<'a>(activities: &'a [Activity], action: &str) -> Option<&'a Activity> {
    activities
        .iter()
        .find(|a| a.name == action && a.stopped.is_some() && a.events.is_some())
}

/// Collect the failure messages of every `ruleFailed` event in an action
fn rule_failures(activity: &Activity) -> Vec<&str> {
    activity
        .events
        .iter()
        .flatten()
        .filter(|event| event.name == "ruleFailed")
        .filter_map(|event| event.property("failureMessage"))
        .collect()
}

/// Find the group id a promote action produced, if recorded
fn promoted_group(activities: &[Activity]) -> Option<&str> {
    activities
        .iter()
        .filter(|a| a.name == "promote")
        .flat_map(|a| a.events.iter().flatten())
        .find(|event| event.name == "repositoryPromoted")
        .and_then(|event| event.property("group"))
}

/// Poll the entity's activity log until the named action completes, then
/// report whether it recorded rule failures.
///
/// Polling repeats at `poll.interval_secs` until the action shows both
/// events and a stopped marker. With `poll.max_attempts` unset the loop
/// never gives up; transport errors are never retried. Every rule failure
/// message is reported before returning `Ok(true)`.
pub fn verify_action(
    session: &Session,
    entity_id: &str,
    action: &str,
    poll: &PollingSettings,
) -> Result<bool> {
    let interval = Duration::from_secs(poll.interval_secs);
    let mut attempts: u32 = 0;

    loop {
        let activities: Vec<Activity> = session.get_json(&activity_path(entity_id))?;

        if let Some(activity) = find_completed(&activities, action) {
            let failures = rule_failures(activity);
            if failures.is_empty() {
                return Ok(false);
            }
            for failure in &failures {
                eprintln!("Rule failure: {failure}");
            }
            return Ok(true);
        }

        attempts = attempts.saturating_add(1);
        if let Some(max) = poll.max_attempts {
            if attempts >= max {
                return Err(CliError::ActivityTimeout {
                    action: action.to_string(),
                    repository: entity_id.to_string(),
                    attempts,
                });
            }
        }

        if session.debug() {
            println!("Waiting for '{action}' on {entity_id} (attempt {attempts})");
        }
        thread::sleep(interval);
    }
}

/// Resolve the group id the entity was promoted into.
///
/// Reads a single activity snapshot without polling: callers must have
/// already confirmed the promote action via [`verify_action`]. A snapshot
/// with no `repositoryPromoted` event is an error.
pub fn resolve_promotion_target(session: &Session, entity_id: &str) -> Result<String> {
    let activities: Vec<Activity> = session.get_json(&activity_path(entity_id))?;
    promoted_group(&activities)
        .map(str::to_string)
        .ok_or_else(|| CliError::PromotedIdNotFound {
            repository: entity_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Activity> {
        serde_json::from_str(json).expect("activity fixture parses")
    }

    #[test]
    fn completed_action_with_rule_failure_reports_message() {
        let activities = parse(
            r#"[
                {
                    "name": "close",
                    "started": "2016-02-01T10:00:00.000Z",
                    "stopped": "2016-02-01T10:00:03.000Z",
                    "events": [
                        {
                            "timestamp": "2016-02-01T10:00:02.000Z",
                            "name": "ruleFailed",
                            "severity": 1,
                            "properties": [
                                {"name": "typeId", "value": "checksum-staging"},
                                {"name": "failureMessage", "value": "bad checksum"}
                            ]
                        }
                    ]
                }
            ]"#,
        );

        let activity = find_completed(&activities, "close").expect("close is complete");
        assert_eq!(rule_failures(activity), vec!["bad checksum"]);
    }

    #[test]
    fn clean_close_has_no_failures() {
        let activities = parse(
            r#"[
                {
                    "name": "close",
                    "stopped": "2016-02-01T10:00:03.000Z",
                    "events": [
                        {"name": "repositoryClosed", "properties": []}
                    ]
                }
            ]"#,
        );

        let activity = find_completed(&activities, "close").expect("close is complete");
        assert!(rule_failures(activity).is_empty());
    }

    #[test]
    fn action_without_stopped_marker_is_not_complete() {
        let activities = parse(
            r#"[
                {"name": "close", "events": [{"name": "rulesEvaluate", "properties": []}]}
            ]"#,
        );
        assert!(find_completed(&activities, "close").is_none());
    }

    #[test]
    fn action_without_events_is_not_complete() {
        let activities = parse(r#"[{"name": "close", "stopped": "2016-02-01T10:00:03.000Z"}]"#);
        assert!(find_completed(&activities, "close").is_none());
    }

    #[test]
    fn missing_action_is_not_complete() {
        let activities = parse(
            r#"[
                {"name": "close", "stopped": "t", "events": []}
            ]"#,
        );
        assert!(find_completed(&activities, "promote").is_none());
    }

    #[test]
    fn promoted_group_is_resolved_from_promote_events() {
        let activities = parse(
            r#"[
                {"name": "close", "stopped": "t", "events": []},
                {
                    "name": "promote",
                    "stopped": "t",
                    "events": [
                        {
                            "name": "repositoryPromoted",
                            "properties": [{"name": "group", "value": "g-2002"}]
                        }
                    ]
                }
            ]"#,
        );
        assert_eq!(promoted_group(&activities), Some("g-2002"));
    }

    #[test]
    fn promoted_group_is_absent_without_promote_event() {
        let activities = parse(r#"[{"name": "close", "stopped": "t", "events": []}]"#);
        assert_eq!(promoted_group(&activities), None);
    }
}
