//! Motor render loop
//!
//! Runs on its own thread at its own rate. Reads the latest motor frame
//! from the simulation, renders the wireframe into a fresh display list
//! and swaps it into the slot the UI draws from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use phasor_engine::{DisplayList, MotorFeed, MotorModel, MotorScene, OrbitCamera};
use tracing::{debug, info};

/// Camera requests from the UI thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Azimuth and elevation change in radians
    Orbit(f64, f64),
    /// Distance factor; below 1 moves closer
    Zoom(f64),
    Reset,
}

impl CameraCommand {
    pub fn apply(self, camera: &mut OrbitCamera) {
        match self {
            CameraCommand::Orbit(d_azimuth, d_elevation) => camera.orbit(d_azimuth, d_elevation),
            CameraCommand::Zoom(factor) => camera.zoom(factor),
            CameraCommand::Reset => camera.reset(),
        }
    }
}

/// UI-side handle to the motor thread
pub struct MotorView {
    camera_tx: Sender<CameraCommand>,
    frame: Arc<Mutex<DisplayList>>,
    handle: Option<JoinHandle<()>>,
}

impl MotorView {
    pub fn spawn(feed: MotorFeed, fps: u32, shutdown: Arc<AtomicBool>) -> std::io::Result<Self> {
        let (camera_tx, camera_rx) = bounded(256);
        let frame = Arc::new(Mutex::new(DisplayList::new()));
        let output = frame.clone();
        let period = Duration::from_millis(1000 / fps.max(1) as u64);

        let handle = thread::Builder::new()
            .name("phasor-motor".into())
            .spawn(move || run_motor_loop(feed, camera_rx, output, period, shutdown))?;

        Ok(Self {
            camera_tx,
            frame,
            handle: Some(handle),
        })
    }

    pub fn send(&self, cmd: CameraCommand) {
        let _ = self.camera_tx.try_send(cmd);
    }

    /// Latest rendered wireframe
    pub fn frame(&self) -> &Arc<Mutex<DisplayList>> {
        &self.frame
    }

    /// Wait for the thread after the shutdown flag is set
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_motor_loop(
    feed: MotorFeed,
    camera_rx: Receiver<CameraCommand>,
    output: Arc<Mutex<DisplayList>>,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) {
    info!(?period, "motor loop started");
    let scene = MotorScene::new();
    let mut model = MotorModel::default();
    let mut camera = OrbitCamera::default();
    let mut scratch = DisplayList::new();

    while !shutdown.load(Ordering::Relaxed) {
        let started = Instant::now();

        for cmd in camera_rx.try_iter() {
            debug!(?cmd, "camera");
            cmd.apply(&mut camera);
        }

        model.update(&feed.latest());
        scene.render(&model, &camera, &mut scratch);
        std::mem::swap(&mut *output.lock(), &mut scratch);

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
    info!("motor loop stopped");
}
