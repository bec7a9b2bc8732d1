use chrono::{DateTime, Utc};
use valq::query_value;

use super::FetchError;

/// One entry of a user's public events feed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "RawEvent")]
pub struct Event {
    pub kind: EventKind,
    pub repo: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// The event type together with the payload fields its summary line needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Push {
        commits: usize,
    },
    Create(CreatedRef),
    Delete {
        ref_type: String,
        reference: String,
    },
    Fork {
        forkee: Option<String>,
    },
    Watch,
    Issues {
        action: String,
        issue_number: Option<u64>,
    },
    IssueComment {
        issue_number: Option<u64>,
    },
    PullRequest {
        action: String,
        pr_number: Option<u64>,
    },
    PullRequestReview {
        pr_number: Option<u64>,
    },
    PullRequestReviewComment {
        pr_number: Option<u64>,
    },
    Release,
    Public,
    Member,
    CommitComment,
    Gollum,
    /// Any event type without a summary; holds the raw `type` tag.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedRef {
    Repository,
    Branch(String),
    Tag(String),
    Other(String),
}

#[derive(Debug, serde::Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    repo: RawRepo,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, serde::Deserialize)]
struct RawRepo {
    name: String,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        Self {
            kind: EventKind::from_payload(&raw.kind, &raw.payload),
            repo: raw.repo.name,
            created_at: raw.created_at,
        }
    }
}

impl EventKind {
    fn from_payload(type_name: &str, payload: &serde_json::Value) -> Self {
        let action = || {
            query_value!(payload.action -> str)
                .unwrap_or_default()
                .to_string()
        };
        // `ref` is a keyword, so `query_value!` can't name it.
        let reference = || {
            payload
                .get("ref")
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let ref_type = || {
            query_value!(payload.ref_type -> str)
                .unwrap_or_default()
                .to_string()
        };
        let issue_number = || query_value!(payload.issue.number -> u64);
        let pr_number = || query_value!(payload.pull_request.number -> u64);

        match type_name {
            "PushEvent" => EventKind::Push {
                commits: query_value!(payload.commits -> array).map_or(0, |commits| commits.len()),
            },
            "CreateEvent" => EventKind::Create(match ref_type().as_str() {
                "repository" => CreatedRef::Repository,
                "branch" => CreatedRef::Branch(reference()),
                "tag" => CreatedRef::Tag(reference()),
                _ => CreatedRef::Other(ref_type()),
            }),
            "DeleteEvent" => EventKind::Delete {
                ref_type: ref_type(),
                reference: reference(),
            },
            "ForkEvent" => EventKind::Fork {
                forkee: query_value!(payload.forkee.full_name -> str).map(str::to_string),
            },
            "WatchEvent" => EventKind::Watch,
            "IssuesEvent" => EventKind::Issues {
                action: action(),
                issue_number: issue_number(),
            },
            "IssueCommentEvent" => EventKind::IssueComment {
                issue_number: issue_number(),
            },
            "PullRequestEvent" => EventKind::PullRequest {
                action: action(),
                pr_number: pr_number(),
            },
            "PullRequestReviewEvent" => EventKind::PullRequestReview {
                pr_number: pr_number(),
            },
            "PullRequestReviewCommentEvent" => EventKind::PullRequestReviewComment {
                pr_number: pr_number(),
            },
            "ReleaseEvent" => EventKind::Release,
            "PublicEvent" => EventKind::Public,
            "MemberEvent" => EventKind::Member,
            "CommitCommentEvent" => EventKind::CommitComment,
            "GollumEvent" => EventKind::Gollum,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// Decodes an events response body, keeping the order the API returned.
pub fn decode_events(body: &str) -> Result<Vec<Event>, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}
