//! Inbound control commands.
//!
//! Two equivalent payload shapes set IO1:
//!
//! ```text
//!   A  {"state": true}                        (extra fields allowed)
//!   B  {"command": "set_io1", "state": true}
//! ```
//!
//! A `state` field decides: any object carrying one sets IO1, whatever else
//! rides along, including a foreign `command`.  Without `state` the `command`
//! field is examined only to report why the payload was refused.  Anything
//! that does not set IO1 decodes to [`ControlDecode::Malformed`].

use serde_json::{Map, Value};

use crate::error::DecodeError;

/// The only action name this device implements.
pub const SET_COMMAND: &str = "set_io1";

/// Which payload shape a command arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandShape {
    /// `{"state": bool}`
    Bare,
    /// `{"command": "set_io1", "state": bool}`
    Action,
}

/// Tagged decode result for a control payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlDecode {
    Ok { desired: bool, shape: CommandShape },
    Malformed(DecodeError),
}

impl ControlDecode {
    pub fn desired(&self) -> Option<bool> {
        match *self {
            Self::Ok { desired, .. } => Some(desired),
            Self::Malformed(_) => None,
        }
    }
}

/// Decode a control payload.  `budget` is the largest payload accepted.
pub fn decode_control(payload: &[u8], budget: usize) -> ControlDecode {
    if payload.len() > budget {
        return ControlDecode::Malformed(DecodeError::TooLarge);
    }
    let value: Value = match serde_json::from_slice(payload) {
        Ok(v) => v,
        Err(_) => return ControlDecode::Malformed(DecodeError::Syntax),
    };
    let Value::Object(fields) = value else {
        return ControlDecode::Malformed(DecodeError::NotAnObject);
    };

    match decode_state(&fields) {
        Some(result) => result,
        None => refuse_stateless(&fields),
    }
}

/// `None` means no `state` field, so the record is not a command.
fn decode_state(fields: &Map<String, Value>) -> Option<ControlDecode> {
    let state = fields.get("state")?;
    let &Value::Bool(desired) = state else {
        return Some(ControlDecode::Malformed(DecodeError::StateNotBool));
    };
    let shape = match fields.get("command") {
        Some(Value::String(cmd)) if cmd == SET_COMMAND => CommandShape::Action,
        _ => CommandShape::Bare,
    };
    Some(ControlDecode::Ok { desired, shape })
}

fn refuse_stateless(fields: &Map<String, Value>) -> ControlDecode {
    match fields.get("command") {
        None => ControlDecode::Malformed(DecodeError::MissingState),
        Some(Value::String(cmd)) if cmd == SET_COMMAND => {
            ControlDecode::Malformed(DecodeError::MissingState)
        }
        Some(_) => ControlDecode::Malformed(DecodeError::UnknownCommand),
    }
}
