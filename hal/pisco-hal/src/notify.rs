//! Controller-pushed notifications
//!
//! The controller reports fault, state and counter changes from its own
//! execution context. Consumers register a [`NotificationSink`] per
//! [`Topic`]; the sink answers every delivery with a [`Disposition`], and
//! the source drops the subscription the first time a sink asks to detach.

use crate::arm::{ArmError, ControllerState};

/// Notification topics a controller can publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Topic {
    /// Fault/warning code changes
    Fault = 0,
    /// Execution state changes
    State = 1,
    /// User counter changes (not every controller supports it)
    Count = 2,
}

impl Topic {
    /// All topics, in subscription order
    pub const ALL: [Topic; 3] = [Topic::Fault, Topic::State, Topic::Count];

    /// Get the topic as a slot index
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A single pushed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// Fault code changed (0 = cleared)
    Fault { code: u16 },
    /// Execution state changed
    State(ControllerState),
    /// Counter value changed
    Count(u32),
}

impl Notification {
    /// Get the topic this notification is published on
    pub fn topic(&self) -> Topic {
        match self {
            Notification::Fault { .. } => Topic::Fault,
            Notification::State(_) => Topic::State,
            Notification::Count(_) => Topic::Count,
        }
    }
}

/// What a sink wants done with its subscription after a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Keep delivering
    Keep,
    /// Unsubscribe this sink from the topic
    Detach,
}

/// Receiver of pushed notifications
///
/// Deliveries may arrive on the controller's own thread, hence `Sync`.
pub trait NotificationSink: Sync {
    /// Handle one notification
    fn notify(&self, notification: Notification) -> Disposition;
}

/// Publisher side of the notification channel
pub trait NotificationSource<'a> {
    /// Check if the controller publishes on this topic
    fn supports(&self, topic: Topic) -> bool;

    /// Register a sink for a topic, replacing any previous one
    fn subscribe(&mut self, topic: Topic, sink: &'a dyn NotificationSink)
        -> Result<(), ArmError>;

    /// Remove the sink for a topic (no-op if none is registered)
    fn unsubscribe(&mut self, topic: Topic) -> Result<(), ArmError>;

    /// Check if a sink is currently registered for a topic
    fn is_subscribed(&self, topic: Topic) -> bool;
}
