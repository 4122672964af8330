//! Connection state machine
//!
//! A single [`ConnectionState`] describes where the link is, from radio
//! availability through scanning, connecting and GATT discovery to a usable
//! channel. The state machine does not police transitions: components drive
//! it according to the link protocol, and radio power changes override
//! whatever state is current.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::LinkError;

// ----------------------------------------------------------------------------
// Radio Power
// ----------------------------------------------------------------------------

/// Radio state as reported by a platform adapter
///
/// Adapters translate their platform codes into this enum; the core never sees
/// raw platform values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    #[default]
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        self == PowerState::PoweredOn
    }
}

// ----------------------------------------------------------------------------
// Connection State
// ----------------------------------------------------------------------------

/// Current link state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    RadioOff,
    /// Radio on, no scan or connection in progress
    RadioOn,
    Scanning,
    /// Scan ended, by timeout or explicit stop
    ScanTimedOut,
    Connecting,
    ConnectFailed,
    Disconnected,
    DiscoveringServices,
    ServiceDiscoveryFailed,
    DiscoveringCharacteristics,
    CharacteristicDiscoveryFailed,
    /// Both characteristics bound; messages can flow
    Ready,
}

impl From<PowerState> for ConnectionState {
    fn from(power: PowerState) -> Self {
        match power {
            PowerState::Unknown => ConnectionState::Unknown,
            PowerState::Resetting => ConnectionState::Resetting,
            PowerState::Unsupported => ConnectionState::Unsupported,
            PowerState::Unauthorized => ConnectionState::Unauthorized,
            PowerState::PoweredOff => ConnectionState::RadioOff,
            PowerState::PoweredOn => ConnectionState::RadioOn,
        }
    }
}

impl ConnectionState {
    /// Name used in logs
    pub fn state_name(&self) -> &'static str {
        match self {
            ConnectionState::Unknown => "Unknown",
            ConnectionState::Resetting => "Resetting",
            ConnectionState::Unsupported => "Unsupported",
            ConnectionState::Unauthorized => "Unauthorized",
            ConnectionState::RadioOff => "RadioOff",
            ConnectionState::RadioOn => "RadioOn",
            ConnectionState::Scanning => "Scanning",
            ConnectionState::ScanTimedOut => "ScanTimedOut",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::ConnectFailed => "ConnectFailed",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::DiscoveringServices => "DiscoveringServices",
            ConnectionState::ServiceDiscoveryFailed => "ServiceDiscoveryFailed",
            ConnectionState::DiscoveringCharacteristics => "DiscoveringCharacteristics",
            ConnectionState::CharacteristicDiscoveryFailed => "CharacteristicDiscoveryFailed",
            ConnectionState::Ready => "Ready",
        }
    }

    /// State reflects the radio rather than a scan or connection
    pub fn is_radio_state(&self) -> bool {
        matches!(
            self,
            ConnectionState::Unknown
                | ConnectionState::Resetting
                | ConnectionState::Unsupported
                | ConnectionState::Unauthorized
                | ConnectionState::RadioOff
                | ConnectionState::RadioOn
        )
    }

    pub fn is_ready(&self) -> bool {
        *self == ConnectionState::Ready
    }

    /// Typed error for failure states, `None` for progress states
    pub fn failure(&self) -> Option<LinkError> {
        match self {
            ConnectionState::Unknown
            | ConnectionState::Resetting
            | ConnectionState::Unsupported
            | ConnectionState::Unauthorized
            | ConnectionState::RadioOff => Some(LinkError::RadioUnavailable {
                state: self.state_name().to_string(),
            }),
            ConnectionState::ScanTimedOut => Some(LinkError::ScanTimedOut),
            ConnectionState::ConnectFailed => Some(LinkError::ConnectFailed),
            ConnectionState::ServiceDiscoveryFailed => Some(LinkError::ServiceDiscoveryFailed),
            ConnectionState::CharacteristicDiscoveryFailed => {
                Some(LinkError::CharacteristicDiscoveryFailed)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_name())
    }
}

// ----------------------------------------------------------------------------
// State Machine
// ----------------------------------------------------------------------------

/// Holder of the single current state
#[derive(Debug, Default)]
pub struct StateMachine {
    current: ConnectionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ConnectionState {
        self.current
    }

    /// Replace the current state, returning the previous one
    pub(crate) fn set(&mut self, to: ConnectionState) -> ConnectionState {
        std::mem::replace(&mut self.current, to)
    }
}
