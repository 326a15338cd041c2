//! ui::render
//!
//! Human-readable goal rendering.
//!
//! Renders goal snapshots as plain text and works out which actions the
//! viewing account can take. Nothing here talks to the contract.

use serde::Serialize;

use crate::core::goal::Goal;
use crate::core::types::{Address, GoalId, Nonce};

/// An action the viewing account can take on a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Affordance {
    /// The viewer is a judge who has not approved yet.
    /// Inactive until every milestone is achieved.
    Approve { active: bool },
    /// The viewer owns the goal and has milestones left to mark.
    #[serde(rename_all = "camelCase")]
    MarkMilestones { remaining: Vec<u64> },
}

/// Actions `viewer` can take on `goal`.
pub fn affordances(goal: &Goal, viewer: Option<&Address>) -> Vec<Affordance> {
    let Some(viewer) = viewer else {
        return Vec::new();
    };

    let mut out = Vec::new();
    if goal.is_judge(viewer) && !goal.has_approved(viewer) {
        out.push(Affordance::Approve {
            active: goal.completed,
        });
    }
    if goal.is_owner(viewer) {
        let remaining: Vec<u64> = (0..goal.milestone_count())
            .filter(|i| goal.milestone_is_achieved(*i) == Some(false))
            .map(|i| i as u64 + 1)
            .collect();
        if !remaining.is_empty() {
            out.push(Affordance::MarkMilestones { remaining });
        }
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// A text progress bar, e.g. `[#####-----]`.
pub fn progress_bar(done: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        width
    } else {
        (done.min(total) * width) / total
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One goal in a list.
pub fn goal_summary(nonce: Nonce, goal_id: &GoalId, goal: &Goal) -> String {
    let done = goal.milestones_completed();
    let total = goal.milestone_count();
    format!(
        "#{} {}\n    {}\n    Stake: {} ETH | Approvals: {} / {} Needed | {} | Funds {}\n    Milestones: {} / {} {}",
        nonce,
        goal_id,
        goal.description,
        goal.stake,
        goal.current_approvals,
        goal.required_approvals,
        if goal.completed { "Completed" } else { "In Progress" },
        if goal.funds_released { "Released" } else { "Locked" },
        done,
        total,
        progress_bar(done, total, 20),
    )
}

/// Full goal details, with the viewer's available actions.
pub fn goal_details(goal_id: &GoalId, goal: &Goal, viewer: Option<&Address>) -> String {
    let mut lines = vec![
        format!("Goal {}", goal_id),
        String::new(),
        format!("Description:    {}", goal.description),
        format!("Owner:          {}", goal.owner),
        format!("Stake:          {} ETH", goal.stake),
        format!("Completed:      {}", yes_no(goal.completed)),
        format!("Funds Released: {}", yes_no(goal.funds_released)),
        String::new(),
        format!(
            "Approvals: {} / {} Needed",
            goal.current_approvals, goal.required_approvals
        ),
    ];

    for (i, judge) in goal.judges.iter().enumerate() {
        let approved = goal.verified_approvals.get(i).copied().unwrap_or(false);
        lines.push(format!(
            "  {} {} ({})",
            if approved { "✓" } else { " " },
            judge,
            if approved { "Has Approved" } else { "Has Not Approved" }
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Milestones: {} / {} {}",
        goal.milestones_completed(),
        goal.milestone_count(),
        progress_bar(goal.milestones_completed(), goal.milestone_count(), 20)
    ));
    for (i, description) in goal.milestone_descriptions.iter().enumerate() {
        let achieved = goal.milestone_achieved.get(i).copied().unwrap_or(false);
        lines.push(format!(
            "  [{}] {}. {}",
            if achieved { "x" } else { " " },
            i + 1,
            description
        ));
    }

    let actions = affordances(goal, viewer);
    if !actions.is_empty() {
        lines.push(String::new());
        for action in actions {
            lines.push(match action {
                Affordance::Approve { active: true } => {
                    format!("You are a judge for this goal: approve with `akt approve {}`", goal_id)
                }
                Affordance::Approve { active: false } => {
                    "You are a judge for this goal. Approval activates once every milestone is achieved."
                        .to_string()
                }
                Affordance::MarkMilestones { remaining } => format!(
                    "Mark a milestone as achieved with `akt milestone {} <n>` (remaining: {})",
                    goal_id,
                    remaining
                        .iter()
                        .map(u64::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
    }

    lines.join("\n")
}
