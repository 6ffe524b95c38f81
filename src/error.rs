//! Unified error types for the edgenode core.
//!
//! A single `Error` enum that every subsystem converts into, one category per
//! failure class the control loop distinguishes.  None of them is fatal: the
//! loop turns each into state (Down + retry) or a log line and keeps cycling.
//! All variants are `Copy` so they travel through events and outcomes without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The network link could not be brought up or was lost.
    Link(LinkError),
    /// The broker session could not be opened or was lost.
    Session(SessionError),
    /// An inbound control payload was rejected.
    Decode(DecodeError),
    /// An outbound publish did not complete.
    Publish(PublishError),
    /// The persistent byte store failed.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Publish(e) => write!(f, "publish: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No SSID configured.
    NoCredentials,
    /// The attempt did not complete within its timeout.
    Timeout,
    /// The radio stack refused or failed the association.
    ConnectFailed,
    /// A link previously recorded as Up is no longer connected.
    Dropped,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no credentials configured"),
            Self::Timeout => write!(f, "connect timed out"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Dropped => write!(f, "unexpected drop"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Session work requested while the link is down.
    LinkDown,
    /// The broker refused the connection.
    ConnectFailed,
    /// The broker did not acknowledge within the timeout.
    Timeout,
    /// The control topic subscription was refused.
    SubscribeFailed,
    /// The client library reported disconnection.
    Dropped,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkDown => write!(f, "link down"),
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::Timeout => write!(f, "broker connect timed out"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::Dropped => write!(f, "unexpected drop"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload exceeds the JSON document budget.
    TooLarge,
    /// Payload is not valid JSON.
    Syntax,
    /// Payload is valid JSON but not an object.
    NotAnObject,
    /// No `state` field.
    MissingState,
    /// `state` is present but not a boolean.
    StateNotBool,
    /// `command` names an action this device does not implement.
    UnknownCommand,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "payload too large"),
            Self::Syntax => write!(f, "malformed JSON"),
            Self::NotAnObject => write!(f, "payload is not an object"),
            Self::MissingState => write!(f, "missing state field"),
            Self::StateNotBool => write!(f, "state is not a boolean"),
            Self::UnknownCommand => write!(f, "unknown command"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// No broker session.
    NotConnected,
    /// The payload could not be serialised.
    Serialize,
    /// The client library refused the message.
    Rejected,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Serialize => write!(f, "serialisation failed"),
            Self::Rejected => write!(f, "rejected by client"),
        }
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Offset lies outside the store.
    OutOfRange,
    /// Flushing to flash failed.
    CommitFailed,
    /// Generic I/O error from the backend.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "offset out of range"),
            Self::CommitFailed => write!(f, "commit failed"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
