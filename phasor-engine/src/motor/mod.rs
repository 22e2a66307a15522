//! 3D motor visualization driven by the simulation
//!
//! The simulation loop publishes a [`MotorFrame`] every frame; the motor loop
//! reads it at its own pace and never writes back.

mod model;
mod scene;

pub use model::{coil_intensity, MotorModel, IDLE_GLOW};
pub use scene::{MotorScene, OrbitCamera, Vec3};

use crate::snapshot::{SnapshotCell, SnapshotReader, SnapshotWriter};

const RECORD_LEN: usize = 6;

/// Values handed from the simulation to the motor loop
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorFrame {
    /// Effective electrical angle in degrees
    pub angle: f64,
    /// Realizable phase-to-neutral voltages
    pub phase_voltages: [f64; 3],
    /// Amplitude setting in percent
    pub amplitude: f64,
    pub running: bool,
}

impl MotorFrame {
    fn to_record(self) -> [f64; RECORD_LEN] {
        let [v1, v2, v3] = self.phase_voltages;
        [
            self.angle,
            v1,
            v2,
            v3,
            self.amplitude,
            if self.running { 1.0 } else { 0.0 },
        ]
    }

    fn from_record(record: [f64; RECORD_LEN]) -> Self {
        Self {
            angle: record[0],
            phase_voltages: [record[1], record[2], record[3]],
            amplitude: record[4],
            running: record[5] != 0.0,
        }
    }
}

/// Simulation-side handle
pub struct MotorPublisher {
    writer: SnapshotWriter<RECORD_LEN>,
}

impl MotorPublisher {
    pub fn publish(&mut self, frame: MotorFrame) {
        self.writer.publish(&frame.to_record());
    }
}

/// Motor-loop-side handle
#[derive(Clone)]
pub struct MotorFeed {
    reader: SnapshotReader<RECORD_LEN>,
}

impl MotorFeed {
    pub fn latest(&self) -> MotorFrame {
        MotorFrame::from_record(self.reader.load())
    }
}

/// Create the one-way hand-off between the simulation and the motor loop
pub fn motor_link() -> (MotorPublisher, MotorFeed) {
    let (writer, reader) = SnapshotCell::split(MotorFrame::default().to_record());
    (MotorPublisher { writer }, MotorFeed { reader })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_carries_frame() {
        let (mut publisher, feed) = motor_link();
        assert_eq!(feed.latest(), MotorFrame::default());
        let frame = MotorFrame {
            angle: 120.0,
            phase_voltages: [10.0, -4.0, -6.0],
            amplitude: 75.0,
            running: true,
        };
        publisher.publish(frame);
        assert_eq!(feed.latest(), frame);
    }
}
