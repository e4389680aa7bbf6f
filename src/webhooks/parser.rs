//! Webhook payload parser.
//!
//! Turns a delivery (event name from `X-GitHub-Event` plus the JSON body) into
//! a [`WebhookEvent`]. Deliveries the bot does not act on, such as tag pushes,
//! branch deletions, or a pull request closed without merging, parse to
//! `Ok(None)`. Only payloads that are not the JSON GitHub documents for the
//! event are errors.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{CheckConclusion, PrNumber, RepoId};

use super::events::{CheckedPullRequest, WebhookEvent};

const BRANCH_REF_PREFIX: &str = "refs/heads/";

#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not JSON, or lacks a field the event always carries.
    #[error("malformed {event} payload: {source}")]
    Malformed {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Parses a delivery into the event the bot reacts to, if any.
///
/// # Examples
///
/// ```
/// use release_cascade::webhooks::{WebhookEvent, parse_webhook};
///
/// let payload = br#"{
///     "ref": "refs/heads/release/1.0",
///     "deleted": false,
///     "repository": { "name": "app", "owner": { "login": "octo" } }
/// }"#;
///
/// match parse_webhook("push", payload).unwrap() {
///     Some(WebhookEvent::Push { branch, .. }) => assert_eq!(branch, "release/1.0"),
///     other => panic!("unexpected {other:?}"),
/// }
///
/// assert!(parse_webhook("star", b"{}").unwrap().is_none());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    match event_type {
        "push" => parse_push(payload),
        "check_suite" => parse_check_suite(payload),
        "pull_request" => parse_pull_request(payload),
        _ => Ok(None),
    }
}

fn from_payload<'a, T: Deserialize<'a>>(
    event: &'static str,
    payload: &'a [u8],
) -> Result<T, ParseError> {
    serde_json::from_slice(payload).map_err(|source| ParseError::Malformed { event, source })
}

// ─── Shared Payload Pieces ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    owner: RawOwner,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

impl RawRepository {
    fn into_repo_id(self) -> RepoId {
        RepoId::new(self.owner.login, self.name)
    }
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    name: String,
}

// ─── push ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    deleted: bool,
    repository: RawRepository,
}

fn parse_push(payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    let raw: RawPushPayload = from_payload("push", payload)?;
    if raw.deleted {
        return Ok(None);
    }
    let Some(branch) = raw.git_ref.strip_prefix(BRANCH_REF_PREFIX) else {
        return Ok(None);
    };

    Ok(Some(WebhookEvent::Push {
        branch: branch.to_string(),
        repo: raw.repository.into_repo_id(),
    }))
}

// ─── check_suite ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawCheckSuitePayload {
    action: String,
    check_suite: RawCheckSuite,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawCheckSuite {
    conclusion: Option<String>,
    #[serde(default)]
    pull_requests: Vec<RawCheckSuitePr>,
}

#[derive(Debug, Deserialize)]
struct RawCheckSuitePr {
    number: u64,
    head: RawRef,
}

fn parse_check_suite(payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    let raw: RawCheckSuitePayload = from_payload("check_suite", payload)?;
    if raw.action != "completed" {
        return Ok(None);
    }

    Ok(Some(WebhookEvent::CheckSuiteCompleted {
        repo: raw.repository.into_repo_id(),
        conclusion: raw
            .check_suite
            .conclusion
            .as_deref()
            .map(CheckConclusion::from_api_str),
        pull_requests: raw
            .check_suite
            .pull_requests
            .into_iter()
            .map(|pr| CheckedPullRequest {
                number: PrNumber(pr.number),
                head_branch: pr.head.name,
            })
            .collect(),
    }))
}

// ─── pull_request ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    #[serde(default)]
    merged: bool,
    body: Option<String>,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    let raw: RawPullRequestPayload = from_payload("pull_request", payload)?;
    if raw.action != "closed" || !raw.pull_request.merged {
        return Ok(None);
    }

    Ok(Some(WebhookEvent::PullRequestMerged {
        repo: raw.repository.into_repo_id(),
        pr: PrNumber(raw.pull_request.number),
        body: raw.pull_request.body.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repository() -> serde_json::Value {
        json!({ "name": "app", "owner": { "login": "octo", "id": 1 }, "full_name": "octo/app" })
    }

    fn parse(event: &str, payload: serde_json::Value) -> Option<WebhookEvent> {
        parse_webhook(event, &serde_json::to_vec(&payload).unwrap()).unwrap()
    }

    // ─── push ───

    #[test]
    fn push_to_branch() {
        let event = parse(
            "push",
            json!({
                "ref": "refs/heads/release/2.0",
                "before": "0000000000000000000000000000000000000000",
                "deleted": false,
                "repository": repository(),
            }),
        );
        assert_eq!(
            event,
            Some(WebhookEvent::Push {
                repo: RepoId::new("octo", "app"),
                branch: "release/2.0".to_string(),
            })
        );
    }

    #[test]
    fn push_without_deleted_flag_is_a_push() {
        let event = parse(
            "push",
            json!({ "ref": "refs/heads/main", "repository": repository() }),
        );
        assert!(matches!(event, Some(WebhookEvent::Push { branch, .. }) if branch == "main"));
    }

    #[test]
    fn tag_push_is_ignored() {
        let event = parse(
            "push",
            json!({ "ref": "refs/tags/v1.0.0", "deleted": false, "repository": repository() }),
        );
        assert_eq!(event, None);
    }

    #[test]
    fn branch_deletion_is_ignored() {
        let event = parse(
            "push",
            json!({ "ref": "refs/heads/cascading/1.0.0-1.1.0", "deleted": true, "repository": repository() }),
        );
        assert_eq!(event, None);
    }

    #[test]
    fn push_without_repository_is_malformed() {
        let err = parse_webhook("push", br#"{"ref": "refs/heads/main"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { event: "push", .. }));
    }

    // ─── check_suite ───

    #[test]
    fn completed_check_suite() {
        let event = parse(
            "check_suite",
            json!({
                "action": "completed",
                "check_suite": {
                    "head_sha": "abc123",
                    "conclusion": "success",
                    "pull_requests": [
                        { "number": 7, "head": { "ref": "cascading/1.0.0-1.1.0", "sha": "abc123" }, "base": { "ref": "release/1.1" } },
                        { "number": 9, "head": { "ref": "cascading/1.1.0-2.0.0", "sha": "abc123" }, "base": { "ref": "release/2.0" } }
                    ]
                },
                "repository": repository(),
            }),
        );
        assert_eq!(
            event,
            Some(WebhookEvent::CheckSuiteCompleted {
                repo: RepoId::new("octo", "app"),
                conclusion: Some(CheckConclusion::Success),
                pull_requests: vec![
                    CheckedPullRequest {
                        number: PrNumber(7),
                        head_branch: "cascading/1.0.0-1.1.0".to_string(),
                    },
                    CheckedPullRequest {
                        number: PrNumber(9),
                        head_branch: "cascading/1.1.0-2.0.0".to_string(),
                    },
                ],
            })
        );
    }

    #[test]
    fn check_suite_without_conclusion() {
        let event = parse(
            "check_suite",
            json!({
                "action": "completed",
                "check_suite": { "conclusion": null, "pull_requests": [] },
                "repository": repository(),
            }),
        );
        assert!(matches!(
            event,
            Some(WebhookEvent::CheckSuiteCompleted { conclusion: None, .. })
        ));
    }

    #[test]
    fn requested_check_suite_is_ignored() {
        let event = parse(
            "check_suite",
            json!({
                "action": "requested",
                "check_suite": { "conclusion": null, "pull_requests": [] },
                "repository": repository(),
            }),
        );
        assert_eq!(event, None);
    }

    #[test]
    fn unknown_conclusion_is_kept() {
        let event = parse(
            "check_suite",
            json!({
                "action": "completed",
                "check_suite": { "conclusion": "exploded", "pull_requests": [] },
                "repository": repository(),
            }),
        );
        assert!(matches!(
            event,
            Some(WebhookEvent::CheckSuiteCompleted { conclusion: Some(CheckConclusion::Other(c)), .. }) if c == "exploded"
        ));
    }

    // ─── pull_request ───

    fn pull_request(action: &str, merged: bool, body: serde_json::Value) -> serde_json::Value {
        json!({
            "action": action,
            "number": 12,
            "pull_request": {
                "number": 12,
                "merged": merged,
                "body": body,
                "head": { "ref": "cascading/1.0.0-1.1.0", "sha": "abc" },
                "base": { "ref": "release/1.1", "sha": "def" }
            },
            "repository": repository(),
        })
    }

    #[test]
    fn merged_pull_request() {
        let event = parse("pull_request", pull_request("closed", true, json!("text")));
        assert_eq!(
            event,
            Some(WebhookEvent::PullRequestMerged {
                repo: RepoId::new("octo", "app"),
                pr: PrNumber(12),
                body: "text".to_string(),
            })
        );
    }

    #[test]
    fn merged_pull_request_without_body() {
        let event = parse("pull_request", pull_request("closed", true, json!(null)));
        assert!(matches!(
            event,
            Some(WebhookEvent::PullRequestMerged { body, .. }) if body.is_empty()
        ));
    }

    #[test]
    fn closed_without_merge_is_ignored() {
        assert_eq!(
            parse("pull_request", pull_request("closed", false, json!("text"))),
            None
        );
    }

    #[test]
    fn other_pull_request_actions_are_ignored() {
        assert_eq!(
            parse("pull_request", pull_request("opened", false, json!("text"))),
            None
        );
    }

    // ─── Other events ───

    #[test]
    fn unknown_events_are_ignored_without_parsing() {
        assert!(parse_webhook("ping", b"not json").unwrap().is_none());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_webhook("pull_request", b"{").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { event: "pull_request", .. }));
    }
}
