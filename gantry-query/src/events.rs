//! Observational event notifications.
//!
//! The engine reports lifecycle events to an [`EventSink`]; nothing is
//! consumed from the sink, and delivery is purely side-effecting. The
//! default sink is [`NullSink`].

use crate::collection::EntitySet;
use crate::entity::Entity;
use crate::traits::InsertResponse;
use crate::types::Options;
use crate::value::Row;

/// Named lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A fetch produced a non-empty result.
    Fetched,
    /// A save (insert or update) is about to run.
    BeforeSave,
    /// An insert completed.
    Created,
    /// An update completed.
    Updated,
    /// A destroy is about to run.
    BeforeDestroy,
    /// A destroy completed.
    Destroyed,
}

impl EventKind {
    /// The event's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::BeforeSave => "before_save",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::BeforeDestroy => "before_destroy",
            Self::Destroyed => "destroyed",
        }
    }
}

/// The Entity or EntitySet an event concerns.
#[derive(Debug)]
pub enum EventTarget<'a> {
    /// A single entity.
    Entity(&'a Entity),
    /// An entity set.
    Set(&'a EntitySet),
}

/// The server response attached to an event, if any.
#[derive(Debug)]
pub enum EventResponse<'a> {
    /// Raw rows from a fetch.
    Rows(&'a [Row]),
    /// Insert response.
    Insert(&'a InsertResponse),
    /// Affected-row count from an update or delete.
    Affected(u64),
    /// No response (pre-operation events).
    None,
}

/// One event notification.
#[derive(Debug)]
pub struct EventPayload<'a> {
    /// Which event occurred.
    pub kind: EventKind,
    /// The affected Entity or EntitySet.
    pub target: EventTarget<'a>,
    /// The server response, when the event follows an executed query.
    pub response: EventResponse<'a>,
    /// The options bag of the triggering operation.
    pub options: &'a Options,
}

/// Receiver of event notifications.
pub trait EventSink: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, payload: EventPayload<'_>);
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _payload: EventPayload<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(EventKind::Fetched.name(), "fetched");
        assert_eq!(EventKind::BeforeSave.name(), "before_save");
        assert_eq!(EventKind::Destroyed.name(), "destroyed");
    }
}
