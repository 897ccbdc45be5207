//! Mailbox access — listing unseen messages and mutating mailbox state.
//!
//! The quarantine contract is portable ("move this message out of the
//! inbox"); the Gmail IMAP session implements it as spam label + mark-delete
//! with a batched expunge at session close.

pub mod imap;
pub mod message;

pub use imap::ImapMailbox;
pub use message::InboundMessage;

use crate::error::MailboxError;

/// One live mailbox session, opened fresh each cycle and closed after that
/// cycle's destructive operations. All methods block; callers run them under
/// `spawn_blocking`.
pub trait MailboxSession: Send {
    /// List unseen messages in mailbox order, normalized and with
    /// self-originated mail filtered out. Must not mark anything read.
    fn fetch_unseen(&mut self) -> Result<Vec<InboundMessage>, MailboxError>;

    /// Move one message toward quarantine. Destructive removal is deferred
    /// to [`MailboxSession::close`].
    fn quarantine(&mut self, id: &str) -> Result<(), MailboxError>;

    /// End the session. With `expunge` the batched destructive removal runs
    /// first; idle cycles pass `false` so a logout-only close never touches
    /// deletions staged by other clients.
    fn close(self, expunge: bool) -> Result<(), MailboxError>
    where
        Self: Sized;
}

/// Factory for mailbox sessions.
pub trait Mailbox: Send + Sync {
    type Session: MailboxSession + 'static;

    /// Open a secure session and select the inbox. A failure here leaves
    /// mailbox state untouched.
    fn connect(&self) -> Result<Self::Session, MailboxError>;
}
