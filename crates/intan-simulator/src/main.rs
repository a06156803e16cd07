//! Desktop simulator for the Intan kiosk OLED UI.
//!
//! Runs intan-core's [`AppContext`] against an SDL2 window via
//! `embedded-graphics-simulator`. Sensors, the RFID reader and the cloud
//! backend are mocked so the full measurement flow can be exercised without
//! hardware.
//!
//! # Key bindings
//!
//! | Key        | Action                                   |
//! |------------|------------------------------------------|
//! | Up / Down  | Move the menu highlight                  |
//! | Enter      | Select (button A)                        |
//! | Backspace  | Back (button B)                          |
//! | W          | Child steps on / off the scale           |
//! | H          | Child stands under / leaves the pole     |
//! | C          | Tap the expected RFID card               |
//! | X          | Tap a foreign RFID card                  |
//! | R          | App opens a weighing session             |
//! | P          | App opens an RFID pairing session        |
//! | Q / Esc    | Quit                                     |

use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    sdl2::Keycode,
};
use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use intan_core::app_state::AppContext;
use intan_core::clock::Clock;
use intan_core::config::Config;
use intan_core::sync::{RemoteCommand, SyncQueue, SyncRequest};
use intan_core::ui::{BufferedSurface, DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 4;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Interval between mock load cell and ultrasonic readings.
const MOCK_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// How long the mock backend takes to acknowledge a request.
const MOCK_SYNC_LATENCY: Duration = Duration::from_millis(1500);

/// Card carried by the simulated child.
const CHILD_RFID: &str = "a1b2c3d4";
const FOREIGN_RFID: &str = "ffee0011";

const WEIGHING_DOCUMENT: &str = r#"{
    "isInUse": true,
    "sessionType": "weighing",
    "userRfid": "a1b2c3d4",
    "currentUserId": "sim-child-01",
    "currentUserName": "Siti Aminah",
    "eatingPattern": "",
    "childResponse": "",
    "measurementComplete": false
}"#;

const PAIRING_DOCUMENT: &str = r#"{
    "isInUse": true,
    "sessionType": "rfid",
    "currentUserId": "sim-child-02",
    "currentUserName": "Rizky",
    "rfid": ""
}"#;

// ---------------------------------------------------------------------------
// Platform shims
// ---------------------------------------------------------------------------

/// Milliseconds since the simulator started.
struct SimClock {
    start: Instant,
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

// ---------------------------------------------------------------------------
// Mock hardware
// ---------------------------------------------------------------------------

/// Synthetic load cell and ultrasonic readings.
struct MockSensors {
    elapsed_secs: f64,
    on_scale: bool,
    under_pole: bool,
}

impl MockSensors {
    fn new() -> Self {
        Self {
            elapsed_secs: 0.0,
            on_scale: false,
            under_pole: false,
        }
    }

    /// Returns `(weight_kg, distance_cm)`.
    fn next_sample(&mut self, dt_secs: f64, pole_height_cm: f32) -> (f32, f32) {
        self.elapsed_secs += dt_secs;
        let t = self.elapsed_secs;

        // small jitter so the stability filter has something to do
        let weight = if self.on_scale {
            14.3 + 0.03 * (t * 7.0).sin()
        } else {
            0.02 * (t * 3.0).cos()
        };
        let distance = if self.under_pole {
            pole_height_cm as f64 - 96.5 + 0.2 * (t * 5.0).sin()
        } else {
            pole_height_cm as f64 + 20.0
        };
        (weight as f32, distance as f32)
    }
}

/// Stand-in for the cloud backend and the network worker.
///
/// Drains the sync channel, acknowledges after a fixed latency and keeps the
/// remote session document the kiosk polls.
struct MockBackend {
    document: RemoteCommand,
    in_flight: Option<(SyncRequest, Instant)>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            document: RemoteCommand::default(),
            in_flight: None,
        }
    }

    fn open_session(&mut self, json: &str) {
        match serde_json::from_str::<RemoteCommand>(json) {
            Ok(doc) => {
                info!("App opened a '{}' session for {}", doc.session_type, doc.current_user_name);
                self.document = doc;
            }
            Err(e) => error!("Bad canned document: {}", e),
        }
    }

    /// Take new requests off the queue. Returns a sync result when one is due.
    fn poll(&mut self, queue: &SyncQueue<'_>) -> Option<bool> {
        if self.in_flight.is_none() {
            if let Some(request) = queue.try_next() {
                info!("Backend received {:?}", request);
                if request == SyncRequest::ResetSession {
                    self.document = RemoteCommand::default();
                    return None;
                }
                self.in_flight = Some((request, Instant::now()));
            }
        }

        let (request, since) = self.in_flight.as_ref()?;
        if since.elapsed() < MOCK_SYNC_LATENCY {
            return None;
        }
        match request {
            SyncRequest::PairRfid { tag, .. } => self.document.rfid = tag.clone(),
            SyncRequest::PublishMeasurement(record) => {
                info!(
                    "Stored {:.1} kg / {:.1} cm, IMT {:.1} ({})",
                    record.weight_kg,
                    record.height_cm,
                    record.imt,
                    record.nutrition_status.as_str()
                );
                self.document.measurement_complete = true;
            }
            SyncRequest::ResetSession => {}
        }
        self.in_flight = None;
        Some(true)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting Intan kiosk simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: ↑/↓ move  Enter=A  Backspace=B  W=scale  H=pole  C/X=card  R/P=app session  Q=quit");

    let display = SimulatorDisplay::<BinaryColor>::new(Size::new(
        DISPLAY_WIDTH_PX as u32,
        DISPLAY_HEIGHT_PX as u32,
    ));
    let mut surface = BufferedSurface::new(display);

    let output_settings = OutputSettingsBuilder::new()
        .theme(BinaryColorTheme::OledBlue)
        .scale(WINDOW_SCALE)
        .build();
    let mut window = Window::new("Intan Simulator", &output_settings);

    let config = Config::default();
    let pole_height_cm = config.sensors.pole_height_cm;
    let poll_interval = Duration::from_millis(config.sync.poll_interval_ms);

    let clock = SimClock {
        start: Instant::now(),
    };
    let queue = SyncQueue::global();
    let mut app = AppContext::new(clock, config, queue);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    window.update(surface.panel());
    let Ok(()) = app.initialize(&mut surface, &mut StdDelay);

    let mut sensors = MockSensors::new();
    let mut backend = MockBackend::new();
    let mut last_sample = Instant::now();
    let mut last_poll = Instant::now();

    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        let mut up = false;
        let mut down = false;
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, repeat: false, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::Up => up = true,
                    Keycode::Down => down = true,
                    Keycode::Return => app.cursor.select = true,
                    Keycode::Backspace => app.cursor.back = true,
                    Keycode::W => {
                        sensors.on_scale = !sensors.on_scale;
                        info!("Child on scale: {}", sensors.on_scale);
                    }
                    Keycode::H => {
                        sensors.under_pole = !sensors.under_pole;
                        info!("Child under pole: {}", sensors.under_pole);
                    }
                    Keycode::C | Keycode::X => {
                        let uid = if keycode == Keycode::C { CHILD_RFID } else { FOREIGN_RFID };
                        info!("Card tapped: {}", uid);
                        if let Err(e) = app.feed_rfid(uid) {
                            warn!("{}", e);
                        }
                    }
                    Keycode::R => backend.open_session(WEIGHING_DOCUMENT),
                    Keycode::P => backend.open_session(PAIRING_DOCUMENT),
                    _ => {}
                },
                _ => {}
            }
        }
        app.cursor.up = up;
        app.cursor.down = down;

        // --- Mock sensor data ---------------------------------------------
        if last_sample.elapsed() >= MOCK_SAMPLE_INTERVAL {
            let (kg, distance_cm) =
                sensors.next_sample(MOCK_SAMPLE_INTERVAL.as_secs_f64(), pole_height_cm);
            app.feed_weight(kg);
            app.feed_distance(distance_cm);
            last_sample = Instant::now();
        }

        // --- Mock network worker ------------------------------------------
        if let Some(ok) = backend.poll(&queue) {
            if let Err(e) = app.sync_finished(ok) {
                warn!("{}", e);
            }
        }
        if last_poll.elapsed() >= poll_interval {
            if let Err(e) = app.feed_remote(&backend.document) {
                warn!("{}", e);
            }
            last_poll = Instant::now();
        }

        // --- Render -------------------------------------------------------
        let Ok(()) = app.tick(&mut surface);
        window.update(surface.panel());

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
