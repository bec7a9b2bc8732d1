use crate::github::{CreatedRef, Event, EventKind};

const SEPARATOR_WIDTH: usize = 70;

pub const NO_ACTIVITY: &str = "No recent activity found for this user.";

/// Renders one event as a `- ` prefixed line, or `None` for event types
/// that have no summary.
pub fn format_event(event: &Event) -> Option<String> {
    summarize(event).map(|summary| format!("- {summary}"))
}

pub fn format_report(events: &[Event], show_dates: bool) -> String {
    if events.is_empty() {
        return format!("{NO_ACTIVITY}\n");
    }

    let mut out = String::new();
    out.push_str("Recent Activity:\n");
    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out.push('\n');

    for event in events {
        let line = match event.created_at.filter(|_| show_dates) {
            Some(created_at) => summarize(event)
                .map(|summary| format!("- {} {summary}", created_at.date_naive())),
            None => format_event(event),
        };
        if let Some(line) = line {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

fn summarize(event: &Event) -> Option<String> {
    let repo = &event.repo;
    let summary = match &event.kind {
        EventKind::Push { commits: 1 } => format!("Pushed 1 commit to {repo}"),
        EventKind::Push { commits } => format!("Pushed {commits} commits to {repo}"),
        EventKind::Create(CreatedRef::Repository) => format!("Created repository {repo}"),
        EventKind::Create(CreatedRef::Branch(name)) => {
            format!("Created branch '{name}' in {repo}")
        }
        EventKind::Create(CreatedRef::Tag(name)) => format!("Created tag '{name}' in {repo}"),
        EventKind::Create(CreatedRef::Other(ref_type)) => format!("Created {ref_type} in {repo}"),
        EventKind::Delete {
            ref_type,
            reference,
        } => format!("Deleted {ref_type} '{reference}' in {repo}"),
        EventKind::Fork {
            forkee: Some(forkee),
        } => format!("Forked {repo} to {forkee}"),
        EventKind::Fork { forkee: None } => format!("Forked {repo}"),
        EventKind::Watch => format!("Starred {repo}"),
        EventKind::Issues {
            action,
            issue_number: Some(number),
        } => format!("{} issue #{number} in {repo}", capitalize(action)),
        EventKind::Issues {
            action,
            issue_number: None,
        } => format!("{} an issue in {repo}", capitalize(action)),
        EventKind::IssueComment {
            issue_number: Some(number),
        } => format!("Commented on issue #{number} in {repo}"),
        EventKind::IssueComment { issue_number: None } => {
            format!("Commented on an issue in {repo}")
        }
        EventKind::PullRequest {
            action,
            pr_number: Some(number),
        } => format!("{} pull request #{number} in {repo}", capitalize(action)),
        EventKind::PullRequest {
            action,
            pr_number: None,
        } => format!("{} a pull request in {repo}", capitalize(action)),
        EventKind::PullRequestReview {
            pr_number: Some(number),
        } => format!("Reviewed pull request #{number} in {repo}"),
        EventKind::PullRequestReview { pr_number: None } => {
            format!("Reviewed a pull request in {repo}")
        }
        EventKind::PullRequestReviewComment {
            pr_number: Some(number),
        } => format!("Commented on pull request #{number} in {repo}"),
        EventKind::PullRequestReviewComment { pr_number: None } => {
            format!("Commented on a pull request in {repo}")
        }
        EventKind::Release => format!("Published a release in {repo}"),
        EventKind::Public => format!("Made {repo} public"),
        EventKind::Member => format!("Added a collaborator to {repo}"),
        EventKind::CommitComment => format!("Commented on a commit in {repo}"),
        EventKind::Gollum => format!("Updated the wiki in {repo}"),
        EventKind::Other(_) => return None,
    };
    Some(summary)
}

/// Uppercases the first character and leaves the rest untouched.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
