//! Application state for the Intan kiosk
//!
//! [`AppContext`] owns everything the UI loop touches: the cursor, every
//! menu, the menu engine, the measurement session and sensor filters. The run
//! loop owns one context and calls [`AppContext::tick`] once per iteration;
//! sensor, RFID and network results are fed in through the `feed_*` methods.

mod menus;

pub use menus::*;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::clock::Clock;
use crate::config::Config;
use crate::menu::{Menu, MenuCursor, MenuEngine, MenuReset, reset_all};
use crate::sampling::{Scale, height_from_distance};
use crate::sync::{RemoteCommand, SyncError, SyncQueue, SyncRequest};
use crate::ui::screens::{render_info_screen, render_spinner};
use crate::ui::{Label, Surface};
use crate::workflow::{
    ChildResponse, EatingPattern, FlowError, FlowEvent, FlowState, MeasurementSession, RfidTag,
    SessionKind, SystemMode,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Workflow error: {0}")]
    Flow(FlowError),
    #[error("Sync error: {0}")]
    Sync(SyncError),
    #[error("RFID tag too long: {len} bytes")]
    TagTooLong { len: usize },
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        Self::Flow(e)
    }
}

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        Self::Sync(e)
    }
}

/// Everything the kiosk UI loop owns.
pub struct AppContext<'q, C> {
    /// Edges for the current frame, written by the input poller.
    pub cursor: MenuCursor,
    root: Menu<RootAction>,
    admin: Menu<AdminAction>,
    patterns: Menu<EatingPattern>,
    responses: Menu<ChildResponse>,
    engine: MenuEngine<C>,
    session: MeasurementSession,
    scale: Scale,
    height_cm: f32,
    mode: SystemMode,
    config: Config,
    queue: SyncQueue<'q>,
    force_redraw: bool,
    spinner_frame: usize,
}

impl<'q, C: Clock> AppContext<'q, C> {
    pub fn new(clock: C, config: Config, queue: SyncQueue<'q>) -> Self {
        Self {
            cursor: MenuCursor::new(),
            root: root_menu(),
            admin: admin_menu(),
            patterns: eating_pattern_menu(),
            responses: child_response_menu(),
            engine: MenuEngine::new(clock, config.display.params),
            session: MeasurementSession::new(),
            scale: Scale::with_window(config.sensors.weight_filter_window as usize),
            height_cm: 0.0,
            mode: SystemMode::Startup,
            config,
            queue,
            force_redraw: false,
            spinner_frame: 0,
        }
    }

    /// Show the splash screen and enter the idle menu.
    pub fn initialize<S: Surface, D: DelayNs>(
        &mut self,
        surface: &mut S,
        delay: &mut D,
    ) -> Result<(), S::Error> {
        self.engine.initialize(surface, delay)?;
        self.mode = SystemMode::Idle;
        info!("Kiosk ready");
        Ok(())
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root_menu(&self) -> &Menu<RootAction> {
        &self.root
    }

    pub fn admin_menu(&self) -> &Menu<AdminAction> {
        &self.admin
    }

    fn now_ms(&self) -> u64 {
        self.engine.clock().now_ms()
    }

    /// Draw the active screen and apply this frame's input.
    ///
    /// Workflow and queue errors are logged, never returned: a rejected
    /// button press must not stop the UI loop.
    pub fn tick<S: Surface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        let now = self.now_ms();
        match self.session.check_timeout(now) {
            Ok(request) => self.log_failure(self.submit(request)),
            Err(e) => warn!("Timeout check failed: {}", e),
        }

        if self.session.kind().is_some() {
            return self.render_session(surface);
        }
        match self.mode {
            SystemMode::Startup => Ok(()),
            SystemMode::AdminMode => self.render_admin(surface),
            _ => self.render_root(surface),
        }
    }

    fn render_root<S: Surface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        let force = core::mem::take(&mut self.force_redraw);
        let interval = self.config.display.redraw_interval_ms;
        let outcome = self
            .engine
            .render(surface, &mut self.root, &mut self.cursor, force, interval)?;

        self.root
            .on_select(&mut self.cursor, ROOT_WEIGH, None, |_| {
                render_info_screen(surface, ROOT_WEIGH, "Mulai sesi dari", "aplikasi Intan", "B: kembali")
            })
            .transpose()?;
        self.root
            .on_select(&mut self.cursor, ROOT_PAIRING, None, |_| {
                render_info_screen(surface, ROOT_PAIRING, "Pilih akun anak", "di aplikasi Intan", "B: kembali")
            })
            .transpose()?;

        if let Some(action) = outcome.activated {
            let result = self.on_root_action(action);
            self.log_failure(result);
        }
        Ok(())
    }

    fn render_admin<S: Surface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        let force = core::mem::take(&mut self.force_redraw);
        let interval = self.config.display.redraw_interval_ms;
        let outcome = self
            .engine
            .render(surface, &mut self.admin, &mut self.cursor, force, interval)?;

        let tare = Label::format(format_args!("Nol: {:.2} kg", self.scale.tare_kg()));
        self.admin
            .on_select(&mut self.cursor, ADMIN_TARE, None, |_| {
                render_info_screen(surface, ADMIN_TARE, "Timbangan dinolkan", tare.as_str(), "B: kembali")
            })
            .transpose()?;

        let params = self.engine.params();
        let rows = Label::format(format_args!("{} baris x {} px", params.visible_rows, params.row_height));
        let pole = Label::format(format_args!("Tiang {:.0} cm", self.config.sensors.pole_height_cm));
        let sync = Label::format(format_args!("Sync {} ms", self.config.sync.poll_interval_ms));
        self.admin
            .on_select(&mut self.cursor, ADMIN_INFO, None, |_| {
                render_info_screen(surface, ADMIN_INFO, rows.as_str(), pole.as_str(), sync.as_str())
            })
            .transpose()?;

        if let Some(action) = outcome.activated {
            let result = self.on_admin_action(action);
            self.log_failure(result);
        }
        Ok(())
    }

    fn render_session<S: Surface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        let user = self.session.user().map(|u| u.name.clone()).unwrap_or_default();
        let state = self.session.state().clone();

        match state {
            FlowState::Pairing => {
                render_info_screen(surface, ROOT_PAIRING, "Tempel kartu baru", user.as_str(), "B: batal")?;
                self.cancel_on_back();
            }
            FlowState::AwaitingRfid { .. } => {
                render_info_screen(surface, ROOT_WEIGH, "Tempel kartu RFID", user.as_str(), "B: batal")?;
                self.cancel_on_back();
            }
            FlowState::SelectEatingPattern => {
                let force = core::mem::take(&mut self.force_redraw);
                let interval = self.config.display.redraw_interval_ms;
                let outcome = self
                    .engine
                    .render(surface, &mut self.patterns, &mut self.cursor, force, interval)?;
                if let Some(pattern) = outcome.activated {
                    info!("Eating pattern: {} ({})", pattern.label(), pattern.description());
                    self.patterns.reset();
                    self.dispatch(FlowEvent::PatternChosen(pattern));
                } else {
                    self.cancel_on_back();
                }
            }
            FlowState::SelectChildResponse => {
                let force = core::mem::take(&mut self.force_redraw);
                let interval = self.config.display.redraw_interval_ms;
                let outcome = self
                    .engine
                    .render(surface, &mut self.responses, &mut self.cursor, force, interval)?;
                if let Some(response) = outcome.activated {
                    info!("Child response: {} ({})", response.label(), response.description());
                    self.responses.reset();
                    self.dispatch(FlowEvent::ResponseChosen(response));
                } else {
                    self.cancel_on_back();
                }
            }
            FlowState::Weighing => {
                let kg = self.scale.weight_kg();
                let reading = Label::format(format_args!("{:.1} kg", kg));
                render_info_screen(surface, "Berat Badan", reading.as_str(), "Berdiri diam...", "B: batal")?;
                if kg > 0.0 && self.scale.is_stable(self.config.sensors.stable_tolerance_kg) {
                    self.dispatch(FlowEvent::WeightStable(kg));
                } else {
                    self.cancel_on_back();
                }
            }
            FlowState::MeasuringHeight => {
                let reading = Label::format(format_args!("{:.1} cm", self.height_cm));
                render_info_screen(surface, "Tinggi Badan", reading.as_str(), "Mengukur...", "B: batal")?;
                if self.height_cm > 0.0 {
                    self.dispatch(FlowEvent::HeightMeasured(self.height_cm));
                } else {
                    self.cancel_on_back();
                }
            }
            FlowState::Validating => {
                let m = *self.session.measurement();
                let sizes = Label::format(format_args!("{:.1}kg {:.1}cm", m.weight_kg, m.height_cm));
                let status = match (m.bmi(), m.nutrition_status()) {
                    (Some(bmi), Some(status)) => {
                        Label::format(format_args!("IMT {:.1} {}", bmi, status.as_str()))
                    }
                    _ => Label::truncated("IMT -"),
                };
                render_info_screen(surface, "Hasil", sizes.as_str(), status.as_str(), "A: kirim B: batal")?;
                if self.cursor.take_select() {
                    self.dispatch(FlowEvent::Confirm);
                } else {
                    self.cancel_on_back();
                }
            }
            FlowState::Sending => {
                render_spinner(surface, "Mengirim data", self.spinner_frame)?;
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
            }
            FlowState::Complete => {
                let status = self
                    .session
                    .measurement()
                    .nutrition_status()
                    .map(|s| s.as_str())
                    .unwrap_or("Kartu tersimpan");
                render_info_screen(surface, "Selesai", status, user.as_str(), "A: kembali")?;
                self.dismiss_on_press();
            }
            FlowState::Failed { reason } => {
                render_info_screen(surface, "Gagal", reason.as_str(), user.as_str(), "A: kembali")?;
                self.dismiss_on_press();
            }
            FlowState::Idle => {}
        }
        Ok(())
    }

    fn cancel_on_back(&mut self) {
        if self.cursor.take_back() {
            self.dispatch(FlowEvent::Cancel);
        }
    }

    fn dismiss_on_press(&mut self) {
        let select = self.cursor.take_select();
        let back = self.cursor.take_back();
        if select || back {
            self.dispatch(FlowEvent::Confirm);
        }
    }

    /// Apply a UI-originated event, logging rather than returning errors.
    fn dispatch(&mut self, event: FlowEvent) {
        let result = self.apply_event(event);
        self.log_failure(result);
    }

    fn log_failure(&self, result: Result<(), AppError>) {
        if let Err(e) = result {
            warn!("{}", e);
        }
    }

    fn submit(&self, request: Option<SyncRequest>) -> Result<(), AppError> {
        if let Some(request) = request {
            debug!("Queueing {:?}", request);
            self.queue.submit(request)?;
        }
        Ok(())
    }

    fn apply_event(&mut self, event: FlowEvent) -> Result<(), AppError> {
        let now = self.now_ms();
        let before = self.session.state().name();
        let request = self.session.apply(event, now)?;
        self.after_transition(before);
        self.submit(request)
    }

    /// Prepare sensors for the new state and switch the top-level mode.
    fn after_transition(&mut self, before: &'static str) {
        let state = self.session.state();
        if state.name() != before {
            match state {
                FlowState::Weighing => self.scale.reset(),
                FlowState::MeasuringHeight => self.height_cm = 0.0,
                _ => {}
            }
            // presses made on the previous screen must not act on this one
            self.cursor.clear_edges();
            self.force_redraw = true;
        }

        let mode = match self.session.kind() {
            Some(_) => SystemMode::for_session(&self.session),
            None if matches!(
                self.mode,
                SystemMode::RfidPairing | SystemMode::WeighingSession | SystemMode::QuickMeasure
            ) =>
            {
                SystemMode::Idle
            }
            None => self.mode,
        };
        if mode != self.mode {
            info!("Mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.reset_screens();
        }
    }

    /// Handle an action bound to a root menu row.
    pub fn on_root_action(&mut self, action: RootAction) -> Result<(), AppError> {
        match action {
            RootAction::QuickMeasure => {
                self.root.reset();
                self.apply_event(FlowEvent::SessionStarted(SessionKind::Quick))
            }
            RootAction::OpenAdmin => {
                self.mode = SystemMode::AdminMode;
                self.reset_screens();
                Ok(())
            }
        }
    }

    /// Handle an action bound to an admin menu row.
    pub fn on_admin_action(&mut self, action: AdminAction) -> Result<(), AppError> {
        match action {
            AdminAction::Tare => {
                let zero = self.scale.tare();
                info!("Scale tared at {:.2} kg", zero);
                Ok(())
            }
            AdminAction::ResetSession => {
                self.admin.reset();
                if !self.session.state().is_idle() {
                    self.apply_event(FlowEvent::Reset)?;
                }
                self.submit(Some(SyncRequest::ResetSession))
            }
            AdminAction::Exit => {
                self.mode = SystemMode::Idle;
                self.reset_screens();
                Ok(())
            }
        }
    }

    /// Raw load cell reading in kilograms.
    pub fn feed_weight(&mut self, kg: f32) {
        self.scale.push_raw(kg);
    }

    /// Raw ultrasonic distance from the top of the pole.
    pub fn feed_distance(&mut self, distance_cm: f32) {
        self.height_cm = height_from_distance(self.config.sensors.pole_height_cm, distance_cm);
    }

    /// A card was read. Ignored unless a session is waiting for one.
    pub fn feed_rfid(&mut self, uid: &str) -> Result<(), AppError> {
        let tag = RfidTag::try_from(uid).map_err(|_| AppError::TagTooLong { len: uid.len() })?;
        let waiting = matches!(
            self.session.state(),
            FlowState::Pairing | FlowState::AwaitingRfid { .. }
        );
        if !waiting {
            debug!("Card {} ignored", tag);
            return Ok(());
        }
        self.apply_event(FlowEvent::RfidTapped(tag))
    }

    /// A freshly polled remote session document.
    pub fn feed_remote(&mut self, command: &RemoteCommand) -> Result<(), AppError> {
        let now = self.now_ms();
        let before = self.session.state().name();
        let request = self.session.apply_remote(command, now)?;
        self.after_transition(before);
        self.submit(request)
    }

    /// Result reported by the sync worker for the request in flight.
    pub fn sync_finished(&mut self, ok: bool) -> Result<(), AppError> {
        if !matches!(self.session.state(), FlowState::Sending) {
            return Ok(());
        }
        let event = if ok {
            FlowEvent::SyncAcknowledged
        } else {
            FlowEvent::SyncFailed
        };
        self.apply_event(event)
    }

    /// Clear input edges and return every menu to its first row.
    pub fn reset_screens(&mut self) {
        reset_all(
            &mut self.cursor,
            &mut [
                &mut self.root as &mut dyn MenuReset,
                &mut self.admin,
                &mut self.patterns,
                &mut self.responses,
            ],
        );
        self.force_redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::sync::SyncChannel;
    use crate::ui::surface::testing::RecordingSurface;
    use crate::workflow::FailureReason;

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    struct Rig<'a> {
        ctx: AppContext<'a, &'a ManualClock>,
        surface: RecordingSurface,
        clock: &'a ManualClock,
    }

    impl<'a> Rig<'a> {
        fn new(clock: &'a ManualClock, channel: &'a SyncChannel) -> Self {
            let mut ctx = AppContext::new(clock, Config::default(), SyncQueue::new(channel));
            let mut surface = RecordingSurface::default();
            ctx.initialize(&mut surface, &mut NoDelay).unwrap();
            Self { ctx, surface, clock }
        }

        fn tick(&mut self) {
            self.clock.advance(300);
            self.ctx.tick(&mut self.surface).unwrap();
        }

        fn down(&mut self) {
            self.ctx.cursor.down = true;
            self.tick();
            self.ctx.cursor.down = false;
        }

        fn select(&mut self) {
            self.ctx.cursor.select = true;
            self.tick();
        }

        fn back(&mut self) {
            self.ctx.cursor.back = true;
            self.tick();
        }
    }

    fn weighing_doc(rfid: &str) -> RemoteCommand {
        RemoteCommand {
            is_in_use: true,
            session_type: heapless::String::try_from("weighing").unwrap(),
            user_rfid: RfidTag::try_from(rfid).unwrap(),
            current_user_id: heapless::String::try_from("u-42").unwrap(),
            current_user_name: Label::truncated("Budi"),
            ..Default::default()
        }
    }

    #[test]
    fn quick_measure_end_to_end() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);
        assert_eq!(rig.ctx.mode(), SystemMode::Idle);

        rig.tick();
        rig.down();
        assert_eq!(rig.ctx.root_menu().cursor(), 1);
        rig.select();
        assert_eq!(rig.ctx.mode(), SystemMode::QuickMeasure);
        assert_eq!(rig.ctx.session().state(), &FlowState::SelectEatingPattern);

        // forced redraw of the pattern menu, then pick the first row twice
        rig.tick();
        rig.select();
        assert_eq!(rig.ctx.session().state(), &FlowState::SelectChildResponse);
        rig.tick();
        rig.select();
        assert_eq!(rig.ctx.session().state(), &FlowState::Weighing);

        for _ in 0..10 {
            rig.ctx.feed_weight(15.0);
        }
        rig.tick();
        assert_eq!(rig.ctx.session().state(), &FlowState::MeasuringHeight);

        rig.ctx.feed_distance(99.0);
        rig.tick();
        assert_eq!(rig.ctx.session().state(), &FlowState::Validating);

        rig.select();
        assert_eq!(rig.ctx.session().state(), &FlowState::Sending);
        let queue = SyncQueue::new(&channel);
        let Some(SyncRequest::PublishMeasurement(record)) = queue.try_next() else {
            panic!("expected a measurement to publish");
        };
        assert_eq!(record.user_id, None);
        assert_eq!(record.weight_kg, 15.0);
        assert_eq!(record.height_cm, 100.0);
        assert_eq!(record.eating_pattern, Some(EatingPattern::Kurang));
        assert_eq!(record.child_response, Some(ChildResponse::Pasif));

        rig.ctx.sync_finished(true).unwrap();
        assert_eq!(rig.ctx.session().state(), &FlowState::Complete);
        rig.select();
        assert!(rig.ctx.session().state().is_idle());
        assert_eq!(rig.ctx.mode(), SystemMode::Idle);
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn press_on_previous_screen_does_not_confirm_result() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);
        rig.ctx.on_root_action(RootAction::QuickMeasure).unwrap();
        rig.tick();
        rig.select();
        rig.tick();
        rig.select();
        assert_eq!(rig.ctx.session().state(), &FlowState::Weighing);

        // A pressed while the child is still on the scale
        rig.select();
        assert_eq!(rig.ctx.session().state(), &FlowState::Weighing);
        for _ in 0..10 {
            rig.ctx.feed_weight(15.0);
        }
        rig.tick();
        rig.ctx.feed_distance(99.0);
        rig.tick();
        assert_eq!(rig.ctx.session().state(), &FlowState::Validating);
        assert!(!rig.ctx.cursor.select);

        rig.tick();
        assert_eq!(rig.ctx.session().state(), &FlowState::Validating);
        assert_eq!(SyncQueue::new(&channel).pending(), 0);
    }

    #[test]
    fn press_while_sending_does_not_dismiss_result() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);
        rig.ctx.on_root_action(RootAction::QuickMeasure).unwrap();
        rig.tick();
        rig.select();
        rig.tick();
        rig.select();
        for _ in 0..10 {
            rig.ctx.feed_weight(15.0);
        }
        rig.tick();
        rig.ctx.feed_distance(99.0);
        rig.tick();
        rig.select();
        assert_eq!(rig.ctx.session().state(), &FlowState::Sending);

        rig.ctx.cursor.back = true;
        rig.tick();
        rig.ctx.sync_finished(true).unwrap();
        assert_eq!(rig.ctx.session().state(), &FlowState::Complete);
        rig.tick();
        assert_eq!(rig.ctx.session().state(), &FlowState::Complete);
    }

    #[test]
    fn instruction_option_opens_and_closes() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);

        // first tick binds the option rows
        rig.tick();
        rig.select();
        assert_eq!(rig.ctx.root_menu().selected(), ROOT_WEIGH);
        rig.tick();
        assert!(rig.surface.is_on(0, 0), "info screen title bar");

        rig.back();
        assert!(!rig.ctx.root_menu().has_selection());
        assert!(!rig.ctx.cursor.back);
    }

    #[test]
    fn admin_tare_and_exit() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);

        for _ in 0..10 {
            rig.ctx.feed_weight(0.5);
        }
        rig.tick();
        for _ in 0..3 {
            rig.down();
        }
        rig.select();
        assert_eq!(rig.ctx.mode(), SystemMode::AdminMode);

        rig.tick();
        rig.select();
        assert_eq!(rig.ctx.scale().tare_kg(), 0.5);
        assert_eq!(rig.ctx.admin_menu().selected(), ADMIN_TARE);
        rig.back();
        assert!(!rig.ctx.admin_menu().has_selection());

        for _ in 0..3 {
            rig.down();
        }
        rig.select();
        assert_eq!(rig.ctx.mode(), SystemMode::Idle);
        assert_eq!(rig.ctx.root_menu().cursor(), 0);
    }

    #[test]
    fn remote_session_with_wrong_card() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);
        rig.tick();

        rig.ctx.feed_remote(&weighing_doc("a1b2c3d4")).unwrap();
        assert_eq!(rig.ctx.mode(), SystemMode::WeighingSession);
        rig.tick();

        rig.ctx.feed_rfid("deadbeef").unwrap();
        assert_eq!(
            rig.ctx.session().state(),
            &FlowState::Failed {
                reason: FailureReason::RfidMismatch
            }
        );
        assert_eq!(SyncQueue::new(&channel).try_next(), Some(SyncRequest::ResetSession));

        rig.back();
        assert_eq!(rig.ctx.mode(), SystemMode::Idle);
    }

    #[test]
    fn cards_outside_sessions_are_ignored() {
        let clock = ManualClock::at(0);
        let channel = SyncChannel::new();
        let mut rig = Rig::new(&clock, &channel);

        rig.ctx.feed_rfid("a1b2c3d4").unwrap();
        assert!(rig.ctx.session().state().is_idle());
        assert!(matches!(
            rig.ctx.feed_rfid("0123456789abcdef0123"),
            Err(AppError::TagTooLong { len: 20 })
        ));
    }
}
