//! Journal entries: double-entry validation and the posting state machine.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! [`JournalEntry`] aggregate decides events; balances and read models are
//! derived downstream from the event stream.

pub mod entry;
pub mod error;
pub mod line;

pub use entry::{
    ApproveEntry, DiscardEntry, DraftEntry, EntryApproved, EntryDiscarded, EntryDrafted, EntryId,
    EntryPosted, EntryRejected, EntryStatus, EntryUnposted, JournalCommand, JournalEntry,
    JournalEvent, LinesRevised, PostEntry, RejectEntry, ReviseLines, UnpostEntry,
};
pub use error::JournalError;
pub use line::{validate_lines, JournalLine, LineTotals};
