//! Optional hardware bridge for Phasor
//!
//! Streams the realizable leg duties to an external H-bridge controller as
//! newline-delimited JSON over TCP and latches an emergency stop whenever
//! the connection drops.

mod client;
mod error;
mod protocol;

pub use client::{BridgeCommand, BridgeConfig, BridgeEvent, BridgeStatus, HardwareBridge, DEFAULT_ENDPOINT};
pub use error::BridgeError;
pub use protocol::{duty_to_hbridge, parse_incoming, ChannelCommand, HBridgeFrame, MotorFeedback, PWM_MAX};
