//! Bridge wire format
//!
//! Newline-delimited JSON. Outgoing frames carry one PWM magnitude and
//! direction per H-bridge channel; incoming lines may report coil currents.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Largest PWM magnitude a channel accepts
pub const PWM_MAX: u8 = 255;

/// Magnitude and direction for one H-bridge channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelCommand {
    pub pwm: u8,
    /// `true` drives the positive direction
    pub direction: bool,
}

/// Map a leg duty cycle (0-100) onto a signed H-bridge command.
///
/// 50 % is standstill; 0 and 100 are full scale in opposite directions.
pub fn duty_to_hbridge(duty: f64) -> ChannelCommand {
    let duty = if duty.is_finite() {
        duty.clamp(0.0, 100.0)
    } else {
        50.0
    };
    let signed = (duty - 50.0) / 50.0 * f64::from(PWM_MAX);
    ChannelCommand {
        pwm: signed.abs().round().min(f64::from(PWM_MAX)) as u8,
        direction: signed >= 0.0,
    }
}

/// One periodic frame sent to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HBridgeFrame {
    pub ch1: ChannelCommand,
    pub ch2: ChannelCommand,
    pub ch3: ChannelCommand,
    #[serde(rename = "eStop")]
    pub e_stop: bool,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl HBridgeFrame {
    /// Frame for the given leg duties; an engaged e-stop zeroes every channel
    pub fn from_duties(duties: &[f64; 3], e_stop: bool, timestamp: u64) -> Self {
        let [ch1, ch2, ch3] = if e_stop {
            [ChannelCommand::default(); 3]
        } else {
            duties.map(duty_to_hbridge)
        };
        Self {
            ch1,
            ch2,
            ch3,
            e_stop,
            timestamp,
        }
    }

    pub fn emergency(timestamp: u64) -> Self {
        Self::from_duties(&[50.0; 3], true, timestamp)
    }
}

/// Coil currents reported by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorFeedback {
    #[serde(default)]
    pub ch1_current: f64,
    #[serde(default)]
    pub ch2_current: f64,
    #[serde(default)]
    pub ch3_current: f64,
    /// Set locally while the link that delivered this feedback is up
    #[serde(skip)]
    pub connected: bool,
}

impl MotorFeedback {
    pub fn currents(&self) -> [f64; 3] {
        [self.ch1_current, self.ch2_current, self.ch3_current]
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IncomingMessage {
    Feedback(MotorFeedback),
}

/// Parse one received line; anything but a feedback message is ignored
pub fn parse_incoming(line: &str) -> Option<MotorFeedback> {
    match serde_json::from_str::<IncomingMessage>(line.trim()) {
        Ok(IncomingMessage::Feedback(mut feedback)) => {
            feedback.connected = true;
            Some(feedback)
        }
        Err(_) => None,
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_mapping() {
        assert_eq!(duty_to_hbridge(50.0), ChannelCommand { pwm: 0, direction: true });
        assert_eq!(duty_to_hbridge(100.0), ChannelCommand { pwm: 255, direction: true });
        assert_eq!(duty_to_hbridge(0.0), ChannelCommand { pwm: 255, direction: false });
        assert_eq!(duty_to_hbridge(75.0), ChannelCommand { pwm: 128, direction: true });
        assert_eq!(duty_to_hbridge(25.0), ChannelCommand { pwm: 128, direction: false });
    }

    #[test]
    fn test_duty_mapping_out_of_range() {
        assert_eq!(duty_to_hbridge(130.0).pwm, 255);
        assert_eq!(duty_to_hbridge(-5.0), ChannelCommand { pwm: 255, direction: false });
        assert_eq!(duty_to_hbridge(f64::NAN).pwm, 0);
    }

    #[test]
    fn test_frame_field_names() {
        let frame = HBridgeFrame::from_duties(&[100.0, 50.0, 0.0], false, 1234);
        let json: serde_json::Value = serde_json::to_value(frame).unwrap();
        assert_eq!(json["eStop"], false);
        assert_eq!(json["timestamp"], 1234);
        assert_eq!(json["ch1"]["pwm"], 255);
        assert_eq!(json["ch1"]["direction"], true);
        assert_eq!(json["ch3"]["direction"], false);
    }

    #[test]
    fn test_estop_frame_zeroes_channels() {
        let frame = HBridgeFrame::from_duties(&[100.0, 0.0, 90.0], true, 0);
        assert!(frame.e_stop);
        assert_eq!(frame.ch1.pwm, 0);
        assert_eq!(frame.ch2.pwm, 0);
        assert_eq!(frame.ch3.pwm, 0);
        assert_eq!(HBridgeFrame::emergency(7).timestamp, 7);
    }

    #[test]
    fn test_parse_feedback() {
        let feedback =
            parse_incoming(r#"{"type":"feedback","ch1_current":0.5,"ch2_current":-0.25,"ch3_current":0.0}"#)
                .unwrap();
        assert!((feedback.ch1_current - 0.5).abs() < 1e-12);
        assert!((feedback.ch2_current + 0.25).abs() < 1e-12);
        assert!(feedback.connected);
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert!(parse_incoming(r#"{"type":"hello"}"#).is_none());
        assert!(parse_incoming("not json").is_none());
        assert!(parse_incoming("").is_none());
        let partial = parse_incoming(r#"{"type":"feedback","ch2_current":1.5}"#).unwrap();
        assert_eq!(partial.currents(), [0.0, 1.5, 0.0]);
    }
}
