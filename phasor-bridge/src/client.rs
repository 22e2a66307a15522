//! Bridge worker thread and the handle the UI talks to
//!
//! The worker owns the socket. It never blocks the caller: commands go in
//! and link events come out over bounded channels. Feedback arrives at the
//! sample rate, so it is kept in a latest-value slot instead of the event
//! queue.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use phasor_engine::SnapshotReader;
use tracing::{debug, info, trace, warn};

use crate::error::BridgeError;
use crate::protocol::{now_millis, parse_incoming, HBridgeFrame, MotorFeedback};

/// Default bridge endpoint
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:4000";

const READ_POLL: Duration = Duration::from_millis(100);
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Where and how often to stream frames.
///
/// The e-stop latches only when an established link is lost. A bridge that
/// cannot be reached at all is retried every `reconnect_interval` without
/// latching, so nothing is ever driven before a link exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// `host:port` of the bridge
    pub endpoint: String,
    /// Interval between frames
    pub sample_interval: Duration,
    /// Delay between connection attempts
    pub reconnect_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sample_interval: Duration::from_millis(20),
            reconnect_interval: Duration::from_secs(1),
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), BridgeError> {
        match self.endpoint.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
            _ => Err(BridgeError::InvalidEndpoint(self.endpoint.clone())),
        }
    }
}

/// Commands to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Latch the emergency stop and send an e-stop frame now
    TriggerEstop,
    /// Clear the latch
    ResetEstop,
    Shutdown,
}

/// Events from the worker
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Connected(String),
    Disconnected(String),
    EstopLatched,
    EstopCleared,
}

/// Read-only bridge status for display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BridgeStatus {
    pub connected: bool,
    pub e_stop: bool,
    pub feedback: MotorFeedback,
}

impl BridgeStatus {
    fn apply(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::Connected(_) => self.connected = true,
            BridgeEvent::Disconnected(_) => {
                self.connected = false;
                self.feedback.connected = false;
            }
            BridgeEvent::EstopLatched => self.e_stop = true,
            BridgeEvent::EstopCleared => self.e_stop = false,
        }
    }
}

/// Handle to the bridge worker; dropping it stops and joins the worker
pub struct HardwareBridge {
    command_tx: Sender<BridgeCommand>,
    event_rx: Receiver<BridgeEvent>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// Written by the feedback reader, read on every poll
    feedback: Arc<Mutex<MotorFeedback>>,
    status: BridgeStatus,
}

impl HardwareBridge {
    /// Start streaming the duties published into `duties`
    pub fn spawn(config: BridgeConfig, duties: SnapshotReader<3>) -> Result<Self, BridgeError> {
        config.validate()?;
        let (command_tx, command_rx) = bounded(64);
        let (event_tx, event_rx) = bounded(1024);
        let shutdown = Arc::new(AtomicBool::new(false));
        let feedback = Arc::new(Mutex::new(MotorFeedback::default()));

        let worker_shutdown = shutdown.clone();
        let worker_feedback = feedback.clone();
        let worker = thread::Builder::new()
            .name("phasor-bridge".into())
            .spawn(move || {
                let mut worker = Worker::new(config, duties, event_tx, worker_shutdown, worker_feedback);
                worker.run(&command_rx);
            })?;

        Ok(Self {
            command_tx,
            event_rx,
            shutdown,
            worker: Some(worker),
            feedback,
            status: BridgeStatus::default(),
        })
    }

    pub fn send(&self, cmd: BridgeCommand) {
        let _ = self.command_tx.try_send(cmd);
    }

    pub fn trigger_estop(&self) {
        self.send(BridgeCommand::TriggerEstop);
    }

    pub fn reset_estop(&self) {
        self.send(BridgeCommand::ResetEstop);
    }

    /// Drain pending events without blocking and refresh the status
    pub fn poll(&mut self) -> Vec<BridgeEvent> {
        let events: Vec<_> = self.event_rx.try_iter().collect();
        for event in &events {
            self.status.apply(event);
        }
        self.status.feedback = *self.feedback.lock();
        events
    }

    pub fn status(&self) -> &BridgeStatus {
        &self.status
    }
}

impl Drop for HardwareBridge {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.command_tx.try_send(BridgeCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// An open connection plus its feedback reader thread
struct Link {
    stream: TcpStream,
    alive: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl Link {
    fn open(endpoint: &str, latest: Arc<Mutex<MotorFeedback>>) -> Result<Self, BridgeError> {
        let addr = endpoint
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| BridgeError::InvalidEndpoint(endpoint.to_string()))?;
        let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(1))?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_read_timeout(Some(READ_POLL))?;

        let alive = Arc::new(AtomicBool::new(true));
        let reader_alive = alive.clone();
        let reader_stream = stream.try_clone()?;
        let reader = thread::Builder::new()
            .name("phasor-bridge-rx".into())
            .spawn(move || read_feedback(reader_stream, reader_alive, latest))?;

        Ok(Self {
            stream,
            alive,
            reader: Some(reader),
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn send(&mut self, frame: &HBridgeFrame) -> Result<(), BridgeError> {
        let json = serde_json::to_string(frame)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;
        Ok(())
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

fn read_feedback(stream: TcpStream, alive: Arc<AtomicBool>, latest: Arc<Mutex<MotorFeedback>>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    while alive.load(Ordering::Acquire) {
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(feedback) = parse_incoming(&line) {
                    *latest.lock() = feedback;
                } else {
                    trace!(line = line.trim(), "ignored bridge message");
                }
                line.clear();
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                debug!("bridge read failed: {}", e);
                break;
            }
        }
    }
    alive.store(false, Ordering::Release);
}

struct Worker {
    config: BridgeConfig,
    duties: SnapshotReader<3>,
    events: Sender<BridgeEvent>,
    shutdown: Arc<AtomicBool>,
    latest: Arc<Mutex<MotorFeedback>>,
    link: Option<Link>,
    e_stop: bool,
    next_attempt: Instant,
    last_sent: Instant,
}

impl Worker {
    fn new(
        config: BridgeConfig,
        duties: SnapshotReader<3>,
        events: Sender<BridgeEvent>,
        shutdown: Arc<AtomicBool>,
        latest: Arc<Mutex<MotorFeedback>>,
    ) -> Self {
        let now = Instant::now();
        Self {
            config,
            duties,
            events,
            shutdown,
            latest,
            link: None,
            e_stop: false,
            next_attempt: now,
            last_sent: now,
        }
    }

    fn run(&mut self, commands: &Receiver<BridgeCommand>) {
        info!(endpoint = %self.config.endpoint, "bridge worker started");
        while !self.shutdown.load(Ordering::Relaxed) {
            let wait = self
                .config
                .sample_interval
                .saturating_sub(self.last_sent.elapsed());
            match commands.recv_timeout(wait) {
                Ok(BridgeCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(BridgeCommand::TriggerEstop) => {
                    self.latch_estop();
                    self.send_frame();
                }
                Ok(BridgeCommand::ResetEstop) => {
                    if self.e_stop {
                        info!("bridge e-stop reset");
                        self.e_stop = false;
                        self.emit(BridgeEvent::EstopCleared);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            if self.link.as_ref().is_some_and(|link| !link.is_alive()) {
                self.drop_link("connection closed by bridge");
            }
            if self.link.is_none() && Instant::now() >= self.next_attempt {
                self.connect();
            }
            if self.last_sent.elapsed() >= self.config.sample_interval {
                self.send_frame();
            }
        }

        if self.link.is_some() {
            self.e_stop = true;
            self.send_frame();
        }
        self.link = None;
        info!("bridge worker stopped");
    }

    fn connect(&mut self) {
        match Link::open(&self.config.endpoint, self.latest.clone()) {
            Ok(link) => {
                info!(endpoint = %self.config.endpoint, "bridge connected");
                self.link = Some(link);
                self.emit(BridgeEvent::Connected(self.config.endpoint.clone()));
            }
            Err(e) => {
                trace!("bridge connect failed: {}", e);
                self.next_attempt = Instant::now() + self.config.reconnect_interval;
            }
        }
    }

    fn send_frame(&mut self) {
        self.last_sent = Instant::now();
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let frame = if self.e_stop {
            HBridgeFrame::emergency(now_millis())
        } else {
            HBridgeFrame::from_duties(&self.duties.load(), false, now_millis())
        };
        if let Err(e) = link.send(&frame) {
            self.drop_link(&e.to_string());
        }
    }

    /// Forget the connection; a lost link always latches the e-stop
    fn drop_link(&mut self, reason: &str) {
        if self.link.take().is_none() {
            return;
        }
        warn!(reason, "bridge disconnected");
        self.latest.lock().connected = false;
        self.emit(BridgeEvent::Disconnected(reason.to_string()));
        self.latch_estop();
        self.next_attempt = Instant::now() + self.config.reconnect_interval;
    }

    fn latch_estop(&mut self) {
        if !self.e_stop {
            warn!("bridge e-stop latched");
            self.e_stop = true;
            self.emit(BridgeEvent::EstopLatched);
        }
    }

    fn emit(&self, event: BridgeEvent) {
        let _ = self.events.try_send(event);
    }
}
