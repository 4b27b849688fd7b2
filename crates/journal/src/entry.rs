use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallybook_core::{Aggregate, AggregateId, AggregateRoot};
use tallybook_events::Event;

use crate::error::JournalError;
use crate::line::{check_line_shapes, validate_lines, JournalLine};

/// Journal entry identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub AggregateId);

impl EntryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for EntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Journal entry lifecycle.
///
/// `post` accepts draft or approved entries; `unpost` is the only way back
/// out of posted and is always recorded, never a silent mutation. Lines are
/// editable in draft only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Approved,
    Posted,
    Rejected,
    Discarded,
}

impl EntryStatus {
    pub fn is_editable(&self) -> bool {
        matches!(self, EntryStatus::Draft)
    }

    pub fn is_postable(&self) -> bool {
        matches!(self, EntryStatus::Draft | EntryStatus::Approved)
    }
}

impl core::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Approved => "approved",
            EntryStatus::Posted => "posted",
            EntryStatus::Rejected => "rejected",
            EntryStatus::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

/// Aggregate root: JournalEntry.
///
/// The aggregate holds lifecycle state and the current line set; account
/// balances are derived from `EntryPosted`/`EntryUnposted` events by a
/// downstream projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    id: EntryId,
    date: DateTime<Utc>,
    reference: Option<String>,
    description: Option<String>,
    lines: Vec<JournalLine>,
    status: EntryStatus,
    posted_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl JournalEntry {
    /// Empty aggregate for rehydration.
    pub fn empty(id: EntryId) -> Self {
        Self {
            id,
            date: DateTime::<Utc>::MIN_UTC,
            reference: None,
            description: None,
            lines: Vec::new(),
            status: EntryStatus::Draft,
            posted_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> EntryId {
        self.id
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    /// Server-assigned posting time, while the entry is posted.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }
}

impl AggregateRoot for JournalEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: DraftEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    pub entry_id: EntryId,
    pub date: DateTime<Utc>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub lines: Vec<JournalLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseLines (draft only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseLines {
    pub entry_id: EntryId,
    pub lines: Vec<JournalLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveEntry {
    pub entry_id: EntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PostEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEntry {
    pub entry_id: EntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UnpostEntry (audit-logged reversal, not a delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpostEntry {
    pub entry_id: EntryId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectEntry {
    pub entry_id: EntryId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DiscardEntry (draft/rejected only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardEntry {
    pub entry_id: EntryId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalCommand {
    DraftEntry(DraftEntry),
    ReviseLines(ReviseLines),
    ApproveEntry(ApproveEntry),
    PostEntry(PostEntry),
    UnpostEntry(UnpostEntry),
    RejectEntry(RejectEntry),
    DiscardEntry(DiscardEntry),
}

/// Event: EntryDrafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDrafted {
    pub entry_id: EntryId,
    pub date: DateTime<Utc>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub lines: Vec<JournalLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinesRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinesRevised {
    pub entry_id: EntryId,
    pub lines: Vec<JournalLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryApproved {
    pub entry_id: EntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryPosted.
///
/// Carries the posted lines so balance projections are self-contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPosted {
    pub entry_id: EntryId,
    pub lines: Vec<JournalLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryUnposted.
///
/// Carries the lines being reversed plus the operator-supplied reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryUnposted {
    pub entry_id: EntryId,
    pub lines: Vec<JournalLine>,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRejected {
    pub entry_id: EntryId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryDiscarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDiscarded {
    pub entry_id: EntryId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEvent {
    EntryDrafted(EntryDrafted),
    LinesRevised(LinesRevised),
    EntryApproved(EntryApproved),
    EntryPosted(EntryPosted),
    EntryUnposted(EntryUnposted),
    EntryRejected(EntryRejected),
    EntryDiscarded(EntryDiscarded),
}

impl Event for JournalEvent {
    fn event_type(&self) -> &'static str {
        match self {
            JournalEvent::EntryDrafted(_) => "journal.entry.drafted",
            JournalEvent::LinesRevised(_) => "journal.entry.lines_revised",
            JournalEvent::EntryApproved(_) => "journal.entry.approved",
            JournalEvent::EntryPosted(_) => "journal.entry.posted",
            JournalEvent::EntryUnposted(_) => "journal.entry.unposted",
            JournalEvent::EntryRejected(_) => "journal.entry.rejected",
            JournalEvent::EntryDiscarded(_) => "journal.entry.discarded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            JournalEvent::EntryDrafted(e) => e.occurred_at,
            JournalEvent::LinesRevised(e) => e.occurred_at,
            JournalEvent::EntryApproved(e) => e.occurred_at,
            JournalEvent::EntryPosted(e) => e.occurred_at,
            JournalEvent::EntryUnposted(e) => e.occurred_at,
            JournalEvent::EntryRejected(e) => e.occurred_at,
            JournalEvent::EntryDiscarded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for JournalEntry {
    type Command = JournalCommand;
    type Event = JournalEvent;
    type Error = JournalError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            JournalEvent::EntryDrafted(e) => {
                self.id = e.entry_id;
                self.date = e.date;
                self.reference = e.reference.clone();
                self.description = e.description.clone();
                self.lines = e.lines.clone();
                self.status = EntryStatus::Draft;
                self.posted_at = None;
                self.created = true;
            }
            JournalEvent::LinesRevised(e) => {
                self.lines = e.lines.clone();
            }
            JournalEvent::EntryApproved(_) => {
                self.status = EntryStatus::Approved;
            }
            JournalEvent::EntryPosted(e) => {
                self.status = EntryStatus::Posted;
                self.posted_at = Some(e.occurred_at);
            }
            JournalEvent::EntryUnposted(_) => {
                self.status = EntryStatus::Draft;
                self.posted_at = None;
            }
            JournalEvent::EntryRejected(_) => {
                self.status = EntryStatus::Rejected;
            }
            JournalEvent::EntryDiscarded(_) => {
                self.status = EntryStatus::Discarded;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            JournalCommand::DraftEntry(cmd) => self.handle_draft(cmd),
            JournalCommand::ReviseLines(cmd) => self.handle_revise(cmd),
            JournalCommand::ApproveEntry(cmd) => self.handle_approve(cmd),
            JournalCommand::PostEntry(cmd) => self.handle_post(cmd),
            JournalCommand::UnpostEntry(cmd) => self.handle_unpost(cmd),
            JournalCommand::RejectEntry(cmd) => self.handle_reject(cmd),
            JournalCommand::DiscardEntry(cmd) => self.handle_discard(cmd),
        }
    }
}

impl JournalEntry {
    fn ensure_exists(&self, entry_id: EntryId) -> Result<(), JournalError> {
        if !self.created {
            return Err(JournalError::NotFound);
        }
        if self.id != entry_id {
            return Err(JournalError::EntryIdMismatch);
        }
        Ok(())
    }

    fn handle_draft(&self, cmd: &DraftEntry) -> Result<Vec<JournalEvent>, JournalError> {
        if self.created {
            return Err(JournalError::AlreadyExists);
        }

        // Drafts may be unbalanced while being worked on; only the line
        // shapes are enforced here. Balance is checked at post time.
        check_line_shapes(&cmd.lines)?;

        Ok(vec![JournalEvent::EntryDrafted(EntryDrafted {
            entry_id: cmd.entry_id,
            date: cmd.date,
            reference: cmd.reference.clone(),
            description: cmd.description.clone(),
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseLines) -> Result<Vec<JournalEvent>, JournalError> {
        self.ensure_exists(cmd.entry_id)?;

        if !self.status.is_editable() {
            return Err(JournalError::Immutable { status: self.status });
        }

        check_line_shapes(&cmd.lines)?;

        Ok(vec![JournalEvent::LinesRevised(LinesRevised {
            entry_id: cmd.entry_id,
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveEntry) -> Result<Vec<JournalEvent>, JournalError> {
        self.ensure_exists(cmd.entry_id)?;

        if self.status != EntryStatus::Draft {
            return Err(JournalError::InvalidTransition {
                from: self.status,
                to: EntryStatus::Approved,
            });
        }

        Ok(vec![JournalEvent::EntryApproved(EntryApproved {
            entry_id: cmd.entry_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_post(&self, cmd: &PostEntry) -> Result<Vec<JournalEvent>, JournalError> {
        self.ensure_exists(cmd.entry_id)?;

        if !self.status.is_postable() {
            return Err(JournalError::InvalidTransition {
                from: self.status,
                to: EntryStatus::Posted,
            });
        }

        validate_lines(&self.lines)?;

        Ok(vec![JournalEvent::EntryPosted(EntryPosted {
            entry_id: cmd.entry_id,
            lines: self.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_unpost(&self, cmd: &UnpostEntry) -> Result<Vec<JournalEvent>, JournalError> {
        self.ensure_exists(cmd.entry_id)?;

        if self.status != EntryStatus::Posted {
            return Err(JournalError::InvalidTransition {
                from: self.status,
                to: EntryStatus::Draft,
            });
        }
        if cmd.reason.trim().is_empty() {
            return Err(JournalError::ReasonRequired { action: "unpost" });
        }

        Ok(vec![JournalEvent::EntryUnposted(EntryUnposted {
            entry_id: cmd.entry_id,
            lines: self.lines.clone(),
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectEntry) -> Result<Vec<JournalEvent>, JournalError> {
        self.ensure_exists(cmd.entry_id)?;

        if !matches!(self.status, EntryStatus::Draft | EntryStatus::Approved) {
            return Err(JournalError::InvalidTransition {
                from: self.status,
                to: EntryStatus::Rejected,
            });
        }
        if cmd.reason.trim().is_empty() {
            return Err(JournalError::ReasonRequired { action: "reject" });
        }

        Ok(vec![JournalEvent::EntryRejected(EntryRejected {
            entry_id: cmd.entry_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_discard(&self, cmd: &DiscardEntry) -> Result<Vec<JournalEvent>, JournalError> {
        self.ensure_exists(cmd.entry_id)?;

        if !matches!(self.status, EntryStatus::Draft | EntryStatus::Rejected) {
            return Err(JournalError::InvalidTransition {
                from: self.status,
                to: EntryStatus::Discarded,
            });
        }

        Ok(vec![JournalEvent::EntryDiscarded(EntryDiscarded {
            entry_id: cmd.entry_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tallybook_accounts::AccountId;
    use tallybook_core::{Currency, Money};

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::new("USD").unwrap())
    }

    fn test_entry_id() -> EntryId {
        EntryId::new(AggregateId::new())
    }

    fn test_account() -> AccountId {
        AccountId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn balanced_lines(minor: i64) -> Vec<JournalLine> {
        vec![
            JournalLine::debit(test_account(), usd(minor)),
            JournalLine::credit(test_account(), usd(minor)),
        ]
    }

    /// Draft an entry and apply the event; returns the live aggregate.
    fn drafted(entry_id: EntryId, lines: Vec<JournalLine>) -> JournalEntry {
        let mut entry = JournalEntry::empty(entry_id);
        let events = entry
            .handle(&JournalCommand::DraftEntry(DraftEntry {
                entry_id,
                date: test_time(),
                reference: Some("JE-100".to_string()),
                description: Some("test entry".to_string()),
                lines,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            entry.apply(e);
        }
        entry
    }

    fn posted(entry_id: EntryId, lines: Vec<JournalLine>) -> JournalEntry {
        let mut entry = drafted(entry_id, lines);
        let events = entry
            .handle(&JournalCommand::PostEntry(PostEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            entry.apply(e);
        }
        entry
    }

    #[test]
    fn post_emits_event_when_balanced() {
        let entry_id = test_entry_id();
        let lines = balanced_lines(50_000);
        let entry = drafted(entry_id, lines.clone());

        let events = entry
            .handle(&JournalCommand::PostEntry(PostEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            JournalEvent::EntryPosted(e) => {
                assert_eq!(e.entry_id, entry_id);
                assert_eq!(e.lines, lines);
            }
            other => panic!("expected EntryPosted, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_entry_cannot_post() {
        let entry_id = test_entry_id();
        let lines = vec![
            JournalLine::debit(test_account(), usd(10_000)),
            JournalLine::credit(test_account(), usd(9_000)),
        ];
        let entry = drafted(entry_id, lines);

        let err = entry
            .handle(&JournalCommand::PostEntry(PostEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, JournalError::Unbalanced { .. }));
    }

    #[test]
    fn second_post_is_an_invalid_transition() {
        let entry_id = test_entry_id();
        let entry = posted(entry_id, balanced_lines(10_000));

        let err = entry
            .handle(&JournalCommand::PostEntry(PostEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            JournalError::InvalidTransition {
                from: EntryStatus::Posted,
                to: EntryStatus::Posted,
            }
        );
    }

    #[test]
    fn posted_entry_lines_are_immutable() {
        let entry_id = test_entry_id();
        let entry = posted(entry_id, balanced_lines(50_000));

        let err = entry
            .handle(&JournalCommand::ReviseLines(ReviseLines {
                entry_id,
                lines: balanced_lines(1_000),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, JournalError::Immutable { status: EntryStatus::Posted });
    }

    #[test]
    fn unpost_requires_a_reason_and_returns_to_draft() {
        let entry_id = test_entry_id();
        let mut entry = posted(entry_id, balanced_lines(10_000));

        let err = entry
            .handle(&JournalCommand::UnpostEntry(UnpostEntry {
                entry_id,
                reason: "  ".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, JournalError::ReasonRequired { action: "unpost" });

        let events = entry
            .handle(&JournalCommand::UnpostEntry(UnpostEntry {
                entry_id,
                reason: "duplicate of JE-099".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        match &events[0] {
            JournalEvent::EntryUnposted(e) => {
                assert_eq!(e.reason, "duplicate of JE-099");
                assert_eq!(e.lines.len(), 2);
            }
            other => panic!("expected EntryUnposted, got {other:?}"),
        }
        for e in &events {
            entry.apply(e);
        }
        assert_eq!(entry.status(), EntryStatus::Draft);
        assert_eq!(entry.posted_at(), None);
    }

    #[test]
    fn unpost_then_post_round_trips_to_an_equivalent_state() {
        let entry_id = test_entry_id();
        let lines = balanced_lines(75_000);
        let mut entry = posted(entry_id, lines.clone());
        let first_lines = entry.lines().to_vec();

        for cmd in [
            JournalCommand::UnpostEntry(UnpostEntry {
                entry_id,
                reason: "period correction".to_string(),
                occurred_at: test_time(),
            }),
            JournalCommand::PostEntry(PostEntry {
                entry_id,
                occurred_at: test_time(),
            }),
        ] {
            let events = entry.handle(&cmd).unwrap();
            for e in &events {
                entry.apply(e);
            }
        }

        // Equivalent posted state modulo timestamps/audit metadata.
        assert_eq!(entry.status(), EntryStatus::Posted);
        assert_eq!(entry.lines(), first_lines.as_slice());
        assert!(entry.posted_at().is_some());
    }

    #[test]
    fn reject_requires_reason_and_only_from_draft_or_approved() {
        let entry_id = test_entry_id();
        let entry = drafted(entry_id, balanced_lines(10_000));

        assert_eq!(
            entry
                .handle(&JournalCommand::RejectEntry(RejectEntry {
                    entry_id,
                    reason: String::new(),
                    occurred_at: test_time(),
                }))
                .unwrap_err(),
            JournalError::ReasonRequired { action: "reject" }
        );

        let posted_entry = posted(entry_id, balanced_lines(10_000));
        assert!(matches!(
            posted_entry
                .handle(&JournalCommand::RejectEntry(RejectEntry {
                    entry_id,
                    reason: "bad coding".to_string(),
                    occurred_at: test_time(),
                }))
                .unwrap_err(),
            JournalError::InvalidTransition { from: EntryStatus::Posted, .. }
        ));
    }

    #[test]
    fn approve_then_post_succeeds_and_approve_twice_fails() {
        let entry_id = test_entry_id();
        let mut entry = drafted(entry_id, balanced_lines(20_000));

        let events = entry
            .handle(&JournalCommand::ApproveEntry(ApproveEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            entry.apply(e);
        }
        assert_eq!(entry.status(), EntryStatus::Approved);

        assert!(matches!(
            entry
                .handle(&JournalCommand::ApproveEntry(ApproveEntry {
                    entry_id,
                    occurred_at: test_time(),
                }))
                .unwrap_err(),
            JournalError::InvalidTransition { from: EntryStatus::Approved, .. }
        ));

        let events = entry
            .handle(&JournalCommand::PostEntry(PostEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            entry.apply(e);
        }
        assert_eq!(entry.status(), EntryStatus::Posted);
    }

    #[test]
    fn discard_is_limited_to_draft_and_rejected() {
        let entry_id = test_entry_id();
        let mut entry = drafted(entry_id, balanced_lines(10_000));

        let events = entry
            .handle(&JournalCommand::DiscardEntry(DiscardEntry {
                entry_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            entry.apply(e);
        }
        assert_eq!(entry.status(), EntryStatus::Discarded);

        let posted_entry = posted(test_entry_id(), balanced_lines(10_000));
        assert!(matches!(
            posted_entry
                .handle(&JournalCommand::DiscardEntry(DiscardEntry {
                    entry_id: posted_entry.id_typed(),
                    occurred_at: test_time(),
                }))
                .unwrap_err(),
            JournalError::InvalidTransition { from: EntryStatus::Posted, .. }
        ));
    }

    #[test]
    fn drafting_twice_conflicts() {
        let entry_id = test_entry_id();
        let entry = drafted(entry_id, balanced_lines(10_000));

        let err = entry
            .handle(&JournalCommand::DraftEntry(DraftEntry {
                entry_id,
                date: test_time(),
                reference: None,
                description: None,
                lines: balanced_lines(10_000),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, JournalError::AlreadyExists);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every balanced entry posts, and the posted lines net to
        /// zero (debits minus credits) in minor units.
        #[test]
        fn balanced_entries_always_post_and_net_to_zero(
            amounts in prop::collection::vec(1i64..1_000_000i64, 1..8)
        ) {
            let entry_id = test_entry_id();
            let mut lines: Vec<JournalLine> = amounts
                .iter()
                .map(|a| JournalLine::debit(test_account(), usd(*a)))
                .collect();
            let total: i64 = amounts.iter().sum();
            lines.push(JournalLine::credit(test_account(), usd(total)));

            let entry = drafted(entry_id, lines);
            let events = entry
                .handle(&JournalCommand::PostEntry(PostEntry {
                    entry_id,
                    occurred_at: test_time(),
                }))
                .unwrap();

            let JournalEvent::EntryPosted(posted) = &events[0] else {
                panic!("expected EntryPosted");
            };
            let mut net: i128 = 0;
            for line in &posted.lines {
                if let Some(d) = &line.debit {
                    net += i128::from(d.minor());
                }
                if let Some(c) = &line.credit {
                    net -= i128::from(c.minor());
                }
            }
            prop_assert_eq!(net, 0);
        }
    }
}
