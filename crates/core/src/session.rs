//! The session slot contract.
//!
//! Each browser owns exactly one slot holding at most one [`UserSession`].
//! An empty slot is the normal signed-out state, not an error.

use std::future::Future;

use crate::types::UserSession;

/// Read/write access to the current browser's session slot.
pub trait SessionSlot: Send + Sync {
    /// Storage error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The persisted session, if any.
    fn get(&self) -> impl Future<Output = Result<Option<UserSession>, Self::Error>> + Send;

    /// Replace the slot's contents.
    fn set(&self, session: &UserSession) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Empty the slot.
    fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
