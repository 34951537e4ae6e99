// Quote lifecycle state machine
//
//   DRAFT ──request-approval──► PENDING_APPROVAL ──approve──► SENT ──accept──► ACCEPTED
//     │                               │
//     └──send (approved/bypass)──► SENT └──reject──► REJECTED
//
// Editing is legal everywhere. SENT and REJECTED quotes go back to DRAFT and
// lose their approval; other states keep their status. Transitions are
// computed here without I/O; the service persists them with a write
// conditioned on the prior status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};
use crate::middleware::auth::Principal;
use crate::modules::quotes::models::{Quote, QuoteStatus};

/// Something that happens to a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteEvent {
    RequestApproval,
    Approve { notes: Option<String> },
    Reject { notes: Option<String> },
    SendToClient,
    Accept,
    Edit,
}

impl QuoteEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QuoteEvent::RequestApproval => "request-approval",
            QuoteEvent::Approve { .. } => "approve",
            QuoteEvent::Reject { .. } => "reject",
            QuoteEvent::SendToClient => "send-to-client",
            QuoteEvent::Accept => "accept",
            QuoteEvent::Edit => "edit",
        }
    }

    /// States from which this event is legal
    pub fn allowed_from(&self) -> &'static [QuoteStatus] {
        match self {
            QuoteEvent::RequestApproval => &[QuoteStatus::Draft],
            QuoteEvent::Approve { .. } | QuoteEvent::Reject { .. } => &[QuoteStatus::PendingApproval],
            QuoteEvent::SendToClient => &[QuoteStatus::Draft, QuoteStatus::Sent],
            QuoteEvent::Accept => &[QuoteStatus::Sent],
            QuoteEvent::Edit => &QuoteStatus::ALL,
        }
    }
}

/// Outcome of applying an event
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: QuoteStatus,
    pub quote: Quote,
    /// False for no-op events (sending an already-sent quote)
    pub changed: bool,
}

pub struct QuoteLifecycle;

impl QuoteLifecycle {
    /// Reject `event` unless `status` is one of its legal origins
    pub fn ensure_allowed(status: QuoteStatus, event: &QuoteEvent) -> Result<()> {
        let allowed = event.allowed_from();
        if allowed.contains(&status) {
            return Ok(());
        }

        Err(AppError::illegal_transition(format!(
            "Quote must be in {} status; current status: {}",
            join_statuses(allowed),
            status
        )))
    }

    /// Compute the quote that results from `event`
    ///
    /// State is checked before capability, so an event from the wrong
    /// state is always an illegal transition.
    pub fn apply(
        quote: &Quote,
        event: &QuoteEvent,
        actor: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let from = quote.status;
        Self::ensure_allowed(from, event)?;

        let mut next = quote.clone();

        match event {
            QuoteEvent::RequestApproval => {
                next.status = QuoteStatus::PendingApproval;
            }
            QuoteEvent::Approve { notes } => {
                Self::ensure_can_approve(actor)?;
                next.status = QuoteStatus::Sent;
                next.is_approved = true;
                next.approved_by = Some(actor.user_id.clone());
                next.approved_at = Some(now);
                next.approval_notes = clean_notes(notes);
                next.sent_at = Some(now);
            }
            QuoteEvent::Reject { notes } => {
                Self::ensure_can_approve(actor)?;
                next.status = QuoteStatus::Rejected;
                next.is_approved = false;
                next.approved_by = Some(actor.user_id.clone());
                next.approved_at = Some(now);
                next.approval_notes = clean_notes(notes);
            }
            QuoteEvent::SendToClient => {
                if from == QuoteStatus::Sent {
                    return Ok(Transition {
                        from,
                        quote: next,
                        changed: false,
                    });
                }
                if !(quote.is_approved || actor.capabilities.can_bypass_approval) {
                    return Err(AppError::forbidden(format!(
                        "Quote {} is not approved and role '{}' cannot bypass approval",
                        quote.quote_number, actor.role
                    )));
                }
                next.status = QuoteStatus::Sent;
                next.sent_at = Some(now);
            }
            QuoteEvent::Accept => {
                next.status = QuoteStatus::Accepted;
                next.accepted_at = Some(now);
            }
            QuoteEvent::Edit => {
                next.status = Self::status_after_edit(from);
                if next.status != from {
                    next.is_approved = false;
                    next.approved_by = None;
                    next.approved_at = None;
                    next.approval_notes = None;
                    next.sent_at = None;
                }
                next.version = quote.version + 1;
            }
        }

        next.updated_at = now;

        Ok(Transition {
            from,
            quote: next,
            changed: true,
        })
    }

    /// Status a quote lands in after a content edit
    ///
    /// A sent quote changed behind the client's back needs approval again,
    /// and a rejected one is reworked as a fresh draft.
    pub fn status_after_edit(from: QuoteStatus) -> QuoteStatus {
        match from {
            QuoteStatus::Sent | QuoteStatus::Rejected => QuoteStatus::Draft,
            other => other,
        }
    }

    fn ensure_can_approve(actor: &Principal) -> Result<()> {
        if actor.capabilities.can_approve {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Role '{}' lacks the approve-quotes capability",
                actor.role
            )))
        }
    }
}

fn clean_notes(notes: &Option<String>) -> Option<String> {
    notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn join_statuses(statuses: &[QuoteStatus]) -> String {
    match statuses {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!(
            "{} or {}",
            init.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
            last
        ),
    }
}
