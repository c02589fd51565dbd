//! Approval gates and bonus latching.
//!
//! A task carries three independent gates. Once all three are approved and
//! a work price is set, the bonus month is latched to the month of approval
//! and never moves again.

use chrono::{DateTime, Utc};
use shared::period::MonthYear;
use thiserror::Error;

use crate::models::notification::NotificationKind;
use crate::models::task::{ApprovalGate, ApprovalState, Task, TaskStatus, UpdateTaskRequest};

/// Error type for approval operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("Invalid {gate} approval transition: {from} -> {to}")]
    InvalidTransition {
        gate: ApprovalGate,
        from: ApprovalState,
        to: ApprovalState,
    },
}

/// Moves one gate to `target`.
///
/// Returns whether the state changed. Re-applying the current state is a no-op.
pub fn apply_gate(task: &mut Task, gate: ApprovalGate, target: ApprovalState) -> Result<bool, ApprovalError> {
    let current = task.gate(gate);
    if !current.can_transition_to(target) {
        return Err(ApprovalError::InvalidTransition {
            gate,
            from: current,
            to: target,
        });
    }
    *task.gate_mut(gate) = target;
    Ok(current != target)
}

/// All three gates approved and a work price entered.
pub fn bonus_eligible(task: &Task) -> bool {
    task.approved_by_warehouse.is_approved()
        && task.approved_by_accountant.is_approved()
        && task.approved_by_regional_manager.is_approved()
        && task.has_work_price()
}

/// Sets the bonus month to `now` if the task is eligible and has none yet.
///
/// Returns whether the date was set.
pub fn latch_bonus_date<Tz: chrono::TimeZone>(task: &mut Task, now: &DateTime<Tz>) -> bool {
    if task.bonus_approval_date.is_some() || !bonus_eligible(task) {
        return false;
    }
    task.bonus_approval_date = Some(MonthYear::from_datetime(now));
    true
}

/// Result of applying an update to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Notifications to send, in firing order.
    pub events: Vec<NotificationKind>,
    /// Whether the bonus month was set by this update.
    pub bonus_latched: bool,
}

/// Applies field and gate changes, latches the bonus month, and derives the
/// resulting notification events.
///
/// Gate transitions are checked before anything is modified, so on error the
/// task is left untouched.
pub fn apply_update(task: &mut Task, request: UpdateTaskRequest, now: DateTime<Utc>) -> Result<UpdateOutcome, ApprovalError> {
    let gates = [
        (ApprovalGate::Warehouse, request.approved_by_warehouse),
        (ApprovalGate::Accountant, request.approved_by_accountant),
        (ApprovalGate::RegionalManager, request.approved_by_regional_manager),
    ];

    for (gate, target) in gates {
        if let Some(target) = target {
            let current = task.gate(gate);
            if !current.can_transition_to(target) {
                return Err(ApprovalError::InvalidTransition {
                    gate,
                    from: current,
                    to: target,
                });
            }
        }
    }

    let before = task.clone();
    request.fields.apply_to(task);
    for (gate, target) in gates {
        if let Some(target) = target {
            apply_gate(task, gate, target)?;
        }
    }

    let bonus_latched = latch_bonus_date(task, &now);
    if task.status == TaskStatus::Done && before.status != TaskStatus::Done && task.auto_completed_at.is_none() {
        task.auto_completed_at = Some(now);
    }
    task.updated_at = now;

    Ok(UpdateOutcome {
        events: derive_events(&before, task, bonus_latched),
        bonus_latched,
    })
}

/// Notification events implied by the change from `before` to `after`.
pub fn derive_events(before: &Task, after: &Task, bonus_latched: bool) -> Vec<NotificationKind> {
    let mut events = Vec::new();

    if after.status == TaskStatus::Done && before.status != TaskStatus::Done {
        events.push(NotificationKind::PendingApproval);
    }
    if after.approved_by_warehouse.is_approved() && !before.approved_by_warehouse.is_approved() {
        events.push(NotificationKind::AccountantApproval);
    }
    if bonus_latched {
        events.push(NotificationKind::ApprovedRequests);
    }

    let newly_rejected = [
        ApprovalGate::Warehouse,
        ApprovalGate::Accountant,
        ApprovalGate::RegionalManager,
    ]
    .into_iter()
    .any(|gate| after.gate(gate).is_rejected() && !before.gate(gate).is_rejected());
    if newly_rejected {
        events.push(NotificationKind::RejectedRequests);
    }

    events
}

/// Counts from a bonus-date backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub updated: u64,
    pub skipped: u64,
}

/// Latches every eligible task without a bonus month. Returns the changed tasks.
pub fn backfill_bonus_dates<Tz: chrono::TimeZone>(
    tasks: Vec<Task>,
    now: &DateTime<Tz>,
) -> (Vec<Task>, BackfillReport) {
    let mut report = BackfillReport::default();
    let mut changed = Vec::new();
    for mut task in tasks {
        if latch_bonus_date(&mut task, now) {
            report.updated += 1;
            changed.push(task);
        } else {
            report.skipped += 1;
        }
    }
    (changed, report)
}
