//! Simulation core for Phasor
//!
//! Provides three-phase voltage synthesis under several common-mode
//! injection strategies, the frame-driven simulation clock, the 2D views
//! (time graph, switching hexagon, PWM pulse trains) and the 3D motor model.

mod clock;
mod config;
mod labels;
pub mod motor;
mod panel;
pub mod render;
mod simulator;
mod snapshot;
mod state;
mod synthesis;

pub use clock::{ClockTuning, SimulationClock};
pub use config::{
    ModulationMethod, ParseError, PhaseCount, PwmAlignment, SimulationConfig, FREQUENCY_LIMIT,
    PERCENT_MAX, PERCENT_MIN,
};
pub use labels::{EnglishLabels, Translate};
pub use motor::{motor_link, MotorFeed, MotorFrame, MotorModel, MotorPublisher, MotorScene, OrbitCamera};
pub use panel::{angle_slider, ControlAction, ControlPanelModel, ControlSpec, SliderId, SliderSpec};
pub use render::{DisplayList, Point, Rgb, Stroke, Surface, Viewport, LOGICAL_SIZE};
pub use simulator::{FrameReport, FrameSurfaces, Simulator};
pub use snapshot::{SnapshotCell, SnapshotReader, SnapshotWriter};
pub use state::{FlickerState, SimulationState, Trace};
pub use synthesis::{
    effective_angle, leg_amplitude, snap_to_sector, synthesize, wrap_degrees, NeutralInputs, NeutralStrategy,
    Voltages, SECTOR_DEG,
};
