//! Event naming shared between the client and the server.
//!
//! The realtime layer is generic over [`EventName`]; it never interprets a
//! domain event. [`EmitType`] is the closed set of domain events the server
//! currently pushes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Anything that can name an event on the wire.
pub trait EventName {
    /// The wire name of the event.
    fn event_name(&self) -> &str;
}

impl EventName for str {
    fn event_name(&self) -> &str {
        self
    }
}

impl EventName for String {
    fn event_name(&self) -> &str {
        self.as_str()
    }
}

/// Domain events emitted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmitType {
    /// A lab device was booked by a user.
    BookDevice,
    /// A lab device booking was released.
    UnbookDevice,
}

impl EmitType {
    /// All known domain events.
    pub const ALL: [EmitType; 2] = [EmitType::BookDevice, EmitType::UnbookDevice];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookDevice => "BookDevice",
            Self::UnbookDevice => "UnbookDevice",
        }
    }

    /// Parse a wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl EventName for EmitType {
    fn event_name(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
