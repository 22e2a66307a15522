//! Phasor - three-phase PWM visualizer
//!
//! Terminal host for the simulation engine: runs the frame loop, the motor
//! render thread and the optional hardware bridge.

mod config;
mod motor_view;

use std::fs::{self, OpenOptions};
use std::io::{self, stdout};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, widgets::Clear, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use phasor_bridge::HardwareBridge;
use phasor_engine::render::TimeGraphSurfaces;
use phasor_engine::{
    angle_slider, motor_link, wrap_degrees, ControlAction, DisplayList, EnglishLabels, FrameSurfaces, Simulator,
    SliderId, SnapshotCell, SnapshotReader, Surface, Translate,
};
use phasor_input::{BridgeAction, Command, InputHandler};
use phasor_tui::{
    item_at, panel_items, App, ControlPanelWidget, HelpWidget, PanelItem, PlotWidget, Region, ScreenLayout,
    StatusBarWidget,
};

use config::Settings;
use motor_view::{CameraCommand, MotorView};

/// Orbit radians per terminal cell of mouse drag
const DRAG_ORBIT: f64 = 0.05;
const WHEEL_ZOOM: f64 = 1.1;

fn main() -> anyhow::Result<()> {
    // The log location is itself a setting, so load problems are logged afterwards
    let (settings, problems) = Settings::load();
    if let Err(e) = init_logging(&settings.log_path()) {
        eprintln!("phasor: logging disabled: {}", e);
    }
    info!(path = %Settings::config_path().display(), "starting phasor");
    for problem in &problems {
        warn!("settings: {}", problem);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let (publisher, feed) = motor_link();
    let motor = MotorView::spawn(feed, settings.motor_fps, shutdown.clone())?;
    let simulator = Simulator::new(settings.simulation.clone()).with_motor(publisher);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, settings, simulator, &motor, shutdown.clone());

    // Cleanup
    shutdown.store(true, Ordering::SeqCst);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // Wait for the motor thread
    motor.join();
    info!("phasor stopped");

    result
}

fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("PHASOR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Persistent drawing layers of the 2D panels
#[derive(Default)]
struct Layers {
    grid: DisplayList,
    trace: DisplayList,
    overlay: DisplayList,
    hexagon: DisplayList,
    pwm: DisplayList,
}

/// Pointer gesture in progress
#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    None,
    /// Angle slider held; released anywhere ends the scrub
    Angle(PanelItem),
    Slider(PanelItem),
    Orbit { column: u16, row: u16 },
}

/// Everything the frame loop owns besides the UI state
struct Host<'a> {
    simulator: Simulator,
    layers: Layers,
    motor: &'a MotorView,
    settings: Settings,
    duties: SnapshotReader<3>,
    bridge: Option<HardwareBridge>,
    labels: EnglishLabels,
    layout: ScreenLayout,
    drag: Drag,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: Settings,
    simulator: Simulator,
    motor: &MotorView,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut app = App::new();
    let mut input_handler = InputHandler::new();

    let (duty_writer, duties) = SnapshotCell::split([50.0; 3]);
    let simulator = simulator.with_duties(duty_writer);

    app.state.set_theme(&settings.theme);
    app.state.show_motor = settings.show_motor;
    let frame_duration = settings.frame_duration();
    let bridge_on_start = settings.bridge_enabled;

    let mut host = Host {
        simulator,
        layers: Layers::default(),
        motor,
        settings,
        duties,
        bridge: None,
        labels: EnglishLabels,
        layout: ScreenLayout::compute(Rect::default(), app.state.show_motor),
        drag: Drag::None,
    };
    app.state
        .set_message("Phasor | Space to start, ? for help, : for commands");
    if bridge_on_start {
        host.set_bridge(&mut app, true);
    }

    let mut last_frame = Instant::now();

    loop {
        if shutdown.load(Ordering::Relaxed) || app.should_quit {
            break;
        }

        // Bridge events
        if let Some(bridge) = host.bridge.as_mut() {
            for event in bridge.poll() {
                app.state.handle_bridge_event(&event);
            }
            app.state.bridge = Some(*bridge.status());
        }

        // Advance the simulation and repaint the 2D layers
        let report = {
            let layers = &mut host.layers;
            let mut surfaces = FrameSurfaces {
                time_graph: TimeGraphSurfaces {
                    grid: Some(&mut layers.grid as &mut dyn Surface),
                    trace: Some(&mut layers.trace as &mut dyn Surface),
                    overlay: Some(&mut layers.overlay as &mut dyn Surface),
                },
                hexagon: Some(&mut layers.hexagon as &mut dyn Surface),
                pwm: Some(&mut layers.pwm as &mut dyn Surface),
            };
            host.simulator.frame(&mut surfaces)
        };
        app.state.report = Some(report);

        terminal.draw(|frame| {
            host.layout = ScreenLayout::compute(frame.area(), app.state.show_motor);
            render_ui(frame, &app, &host);
        })?;

        // Handle input
        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            loop {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(cmd) = input_handler.handle_key(key) {
                            host.handle_command(&mut app, cmd);
                        }
                        app.state.set_mode(input_handler.mode());
                        app.state.command_buffer = input_handler.command_buffer().to_string();
                    }
                    Event::Mouse(mouse) => host.handle_mouse(&mut app, mouse),
                    _ => {}
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        // Maintain frame rate
        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        last_frame = Instant::now();
    }

    // Dropping the bridge sends a final e-stop frame and joins its worker
    host.bridge = None;
    Ok(())
}

impl Host<'_> {
    fn handle_command(&mut self, app: &mut App, cmd: Command) {
        match cmd {
            Command::Control(action) => self.apply(app, action),

            // Keyboard scrubbing
            Command::BeginScrub => {
                let phase = self.simulator.clock().state().phase;
                self.simulator.apply(ControlAction::BeginScrub(phase));
            }
            Command::ScrubBy(delta) => {
                let phase = self.simulator.clock().state().phase;
                let slider = angle_slider(self.simulator.config().step_mode, phase);
                let step = if delta.abs() < slider.step {
                    slider.step.copysign(delta)
                } else {
                    delta
                };
                let target = wrap_degrees(phase + step);
                self.simulator.apply(ControlAction::ScrubTo(target));
            }
            Command::EndScrub => self.simulator.apply(ControlAction::EndScrub),

            // Motor view
            Command::ToggleMotor => {
                app.state.show_motor = !app.state.show_motor;
            }
            Command::OrbitMotor(d_azimuth, d_elevation) => {
                self.motor.send(CameraCommand::Orbit(d_azimuth, d_elevation))
            }
            Command::ZoomMotor(factor) => self.motor.send(CameraCommand::Zoom(factor)),
            Command::ResetCamera => self.motor.send(CameraCommand::Reset),

            // UI
            Command::ToggleHelp => app.state.toggle_help(),
            Command::HelpScrollUp => app.state.help_scroll_up(),
            Command::HelpScrollDown => app.state.help_scroll_down(),
            Command::SetTheme(name) => app.state.set_theme(&name),
            Command::EnterCommandMode | Command::EnterNormalMode => {}

            Command::Bridge(action) => self.bridge_action(app, action),
            Command::SaveSettings => self.save_settings(app),
            Command::Invalid(reason) => app.state.set_error(reason),
            Command::ExecuteCommand(line) => {
                app.state.set_error(format!("Unknown command: {}", line));
            }
            Command::Quit => app.quit(),
        }
    }

    fn apply(&mut self, app: &mut App, action: ControlAction) {
        self.simulator.apply(action);
        let config = self.simulator.config();
        match action {
            ControlAction::SetMethod(method) => {
                let name = self.labels.translate(method.label_key());
                app.state.set_message(format!("Modulation: {}", name));
            }
            ControlAction::SetFrequency(_) | ControlAction::NudgeFrequency(_) if config.step_mode => {
                app.state.set_warning("Frequency is fixed in step mode");
            }
            ControlAction::SetManualStarPoint(_) | ControlAction::NudgeManualStarPoint(_)
                if !config.is_manual() =>
            {
                app.state.set_warning("Neutral point is only adjustable in Manual mode");
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, app: &mut App, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        let drag = self.drag;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => match self.layout.region_at(column, row) {
                Some(Region::Controls) => self.press_control(app, column, row),
                Some(Region::Motor) => self.drag = Drag::Orbit { column, row },
                _ => {}
            },
            MouseEventKind::Drag(MouseButton::Left) => match drag {
                Drag::Angle(item) => {
                    if let Some(ControlAction::ScrubTo(angle)) = item.action_at(column) {
                        self.simulator.apply(ControlAction::ScrubTo(angle));
                    }
                }
                Drag::Slider(item) => {
                    if let Some(action) = item.action_at(column) {
                        self.apply(app, action);
                    }
                }
                Drag::Orbit {
                    column: last_column,
                    row: last_row,
                } => {
                    let dx = column as f64 - last_column as f64;
                    let dy = row as f64 - last_row as f64;
                    self.motor
                        .send(CameraCommand::Orbit(-dx * DRAG_ORBIT, dy * DRAG_ORBIT));
                    self.drag = Drag::Orbit { column, row };
                }
                Drag::None => {}
            },
            MouseEventKind::Up(_) => {
                if let Drag::Angle(_) = drag {
                    self.simulator.apply(ControlAction::EndScrub);
                }
                self.drag = Drag::None;
            }
            MouseEventKind::ScrollUp if self.layout.region_at(column, row) == Some(Region::Motor) => {
                self.motor.send(CameraCommand::Zoom(1.0 / WHEEL_ZOOM));
            }
            MouseEventKind::ScrollDown if self.layout.region_at(column, row) == Some(Region::Motor) => {
                self.motor.send(CameraCommand::Zoom(WHEEL_ZOOM));
            }
            MouseEventKind::Moved => {
                app.state.tooltip = self.control_at(column, row).map(|item| item.tooltip_key());
            }
            _ => {}
        }
    }

    fn control_at(&self, column: u16, row: u16) -> Option<PanelItem> {
        let items = panel_items(self.layout.controls_inner(), &self.simulator.panel());
        item_at(&items, column, row).copied()
    }

    fn press_control(&mut self, app: &mut App, column: u16, row: u16) {
        let Some(item) = self.control_at(column, row) else {
            return;
        };
        app.state.tooltip = Some(item.tooltip_key());
        let action = item.action_at(column);
        match (item.slider_id(), action) {
            (Some(SliderId::Angle), Some(ControlAction::ScrubTo(angle))) => {
                self.simulator.apply(ControlAction::BeginScrub(angle));
                self.drag = Drag::Angle(item);
            }
            (Some(_), Some(action)) => {
                self.apply(app, action);
                self.drag = Drag::Slider(item);
            }
            (_, Some(action)) => self.apply(app, action),
            (_, None) => {}
        }
    }

    fn set_bridge(&mut self, app: &mut App, enabled: bool) {
        if !enabled {
            if self.bridge.take().is_some() {
                info!("bridge disabled");
                app.state.set_message("Bridge disabled");
            }
            app.state.bridge = None;
            return;
        }
        if self.bridge.is_some() {
            app.state.set_message("Bridge already enabled");
            return;
        }
        let config = self.settings.bridge_config();
        let endpoint = config.endpoint.clone();
        match HardwareBridge::spawn(config, self.duties.clone()) {
            Ok(bridge) => {
                app.state.bridge = Some(*bridge.status());
                self.bridge = Some(bridge);
                app.state.set_message(format!("Bridge enabled, connecting to {}", endpoint));
            }
            Err(e) => {
                warn!(error = %e, "bridge start failed");
                app.state.set_error(format!("Bridge: {}", e));
            }
        }
    }

    fn bridge_action(&mut self, app: &mut App, action: BridgeAction) {
        match action {
            BridgeAction::Enable => self.set_bridge(app, true),
            BridgeAction::Disable => self.set_bridge(app, false),
            BridgeAction::ResetEstop | BridgeAction::TriggerEstop => match self.bridge.as_ref() {
                Some(bridge) if action == BridgeAction::ResetEstop => bridge.reset_estop(),
                Some(bridge) => bridge.trigger_estop(),
                None => app.state.set_warning("Bridge is off - :bridge on"),
            },
        }
    }

    fn save_settings(&mut self, app: &mut App) {
        self.settings.simulation = self.simulator.config().clone();
        self.settings.show_motor = app.state.show_motor;
        self.settings.theme = app.state.theme.name.to_string();
        self.settings.bridge_enabled = self.bridge.is_some();
        match self.settings.save() {
            Ok(path) => app.state.set_success(format!("Settings saved to {}", path.display())),
            Err(e) => {
                warn!(error = %e, "settings save failed");
                app.state.set_error(e.to_string());
            }
        }
    }
}

fn render_ui(frame: &mut ratatui::Frame, app: &App, host: &Host<'_>) {
    let area = frame.area();
    let theme = &app.state.theme;
    let labels = &host.labels;
    let layout = host.layout;

    // Clear with background
    let block = ratatui::widgets::Block::default().style(theme.normal());
    frame.render_widget(block, area);

    let layers = &host.layers;
    let time_graph_title = labels.translate("panel.time_graph");
    let time_graph_layers = [&layers.grid, &layers.trace, &layers.overlay];
    frame.render_widget(
        PlotWidget::new(&time_graph_title, &time_graph_layers, theme),
        layout.time_graph,
    );

    let hexagon_title = labels.translate("panel.hexagon");
    let hexagon_layers = [&layers.hexagon];
    frame.render_widget(
        PlotWidget::new(&hexagon_title, &hexagon_layers, theme).active(host.simulator.clock().is_scrubbing()),
        layout.hexagon,
    );

    let pwm_title = labels.translate("panel.pwm");
    let pwm_layers = [&layers.pwm];
    frame.render_widget(PlotWidget::new(&pwm_title, &pwm_layers, theme), layout.pwm);

    let model = host.simulator.panel();
    frame.render_widget(
        ControlPanelWidget::new(&model, labels, theme).hovered(app.state.tooltip),
        layout.controls,
    );

    if let Some(motor_area) = layout.motor {
        let motor_title = labels.translate("panel.motor");
        let wireframe = host.motor.frame().lock();
        let motor_layers = [&*wireframe];
        frame.render_widget(
            PlotWidget::new(&motor_title, &motor_layers, theme)
                .active(matches!(host.drag, Drag::Orbit { .. }))
                .placeholder("starting..."),
            motor_area,
        );
    }

    let status = StatusBarWidget::new(app.state.mode, &app.state.command_buffer, theme)
        .message(app.state.message.as_deref(), app.state.message_type)
        .labels(labels)
        .tooltip(app.state.tooltip)
        .report(app.state.report.as_ref())
        .bridge(app.state.bridge);
    frame.render_widget(status, layout.status);

    if app.state.show_help {
        let help_area = centered_rect(70, area.height.saturating_sub(2), area);
        frame.render_widget(Clear, help_area);
        frame.render_widget(HelpWidget::new(theme).scroll(app.state.help_scroll), help_area);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
