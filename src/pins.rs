//! GPIO / peripheral pin assignments for the edgenode board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// AD1 analog input
// ---------------------------------------------------------------------------

/// GPIO36 (SENSOR_VP), input-only.
pub const AD1_ADC_GPIO: i32 = 36;
/// ADC1 channel wired to GPIO36.
pub const AD1_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// IO1 digital output
// ---------------------------------------------------------------------------

/// Actuator output line.
pub const IO1_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Status indicator
// ---------------------------------------------------------------------------

/// On-board LED.  Shares GPIO2 with IO1 on the reference board, so the
/// indicator and the actuator drive the same line.
pub const STATUS_LED_GPIO: i32 = 2;

/// True when the indicator and the actuator are the same physical pin.
pub const LED_SHARES_IO1: bool = STATUS_LED_GPIO == IO1_GPIO;
