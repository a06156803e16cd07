//! A running measurement session: flow state plus the data collected so far.

use log::{debug, info, warn};

use super::flow::{FlowError, FlowEvent, FlowState, SessionKind, SessionUser, transition};
use super::{Measurement, UserId};
use crate::sync::{MeasurementRecord, RemoteCommand, SyncRequest};

/// Remote pairing sessions are dropped after 5 minutes.
pub const PAIRING_TIMEOUT_MS: u64 = 5 * 60 * 1000;
/// Weighing and quick sessions are dropped after 10 minutes.
pub const WEIGHING_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Owns the [`FlowState`] and applies events to it.
///
/// Event data is stored here; outgoing work is returned as a [`SyncRequest`]
/// for the caller to queue.
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    state: FlowState,
    kind: Option<SessionKind>,
    measurement: Measurement,
    started_ms: u64,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSession {
    pub const fn new() -> Self {
        Self {
            state: FlowState::Idle,
            kind: None,
            measurement: Measurement {
                weight_kg: 0.0,
                height_cm: 0.0,
                eating_pattern: None,
                child_response: None,
            },
            started_ms: 0,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn kind(&self) -> Option<&SessionKind> {
        self.kind.as_ref()
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self.kind.as_ref()? {
            SessionKind::Pairing { user } | SessionKind::Weighing { user, .. } => Some(user),
            SessionKind::Quick => None,
        }
    }

    /// Whether the open session was started from the backend.
    pub fn is_remote(&self) -> bool {
        matches!(
            self.kind,
            Some(SessionKind::Pairing { .. } | SessionKind::Weighing { .. })
        )
    }

    fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id.clone())
    }

    /// Apply one event, then any answers the app already supplied.
    ///
    /// On error the session is left untouched.
    pub fn apply(&mut self, event: FlowEvent, now_ms: u64) -> Result<Option<SyncRequest>, FlowError> {
        let request = self.step(event, now_ms)?;
        self.apply_preset_answers(now_ms);
        Ok(request)
    }

    /// Validate and take one transition. Nothing is changed before the
    /// transition is known to be legal.
    fn step(&mut self, event: FlowEvent, now_ms: u64) -> Result<Option<SyncRequest>, FlowError> {
        if matches!(event, FlowEvent::Confirm) && self.state == FlowState::Validating {
            self.measurement.validate()?;
        }

        let next = transition(&self.state, &event)?;
        let previous = core::mem::replace(&mut self.state, next);
        info!(
            "Session: {} -> {} ({})",
            previous.name(),
            self.state.name(),
            event.name()
        );

        let request = match event {
            FlowEvent::SessionStarted(kind) => {
                self.kind = Some(kind);
                self.measurement = Measurement::default();
                self.started_ms = now_ms;
                None
            }
            FlowEvent::RfidTapped(tag) => match (&previous, &self.state) {
                (FlowState::Pairing, _) => Some(SyncRequest::PairRfid {
                    user_id: self.user_id().unwrap_or_default(),
                    tag,
                }),
                (_, FlowState::Failed { .. }) => {
                    warn!("Card {} does not belong to this session", tag);
                    Some(SyncRequest::ResetSession)
                }
                _ => None,
            },
            FlowEvent::PatternChosen(pattern) => {
                self.measurement.eating_pattern = Some(pattern);
                None
            }
            FlowEvent::ResponseChosen(response) => {
                self.measurement.child_response = Some(response);
                None
            }
            FlowEvent::WeightStable(kg) => {
                self.measurement.weight_kg = kg;
                None
            }
            FlowEvent::HeightMeasured(cm) => {
                self.measurement.height_cm = cm;
                None
            }
            FlowEvent::Confirm if previous == FlowState::Validating => Some(
                SyncRequest::PublishMeasurement(MeasurementRecord::new(&self.measurement, self.user_id())),
            ),
            FlowEvent::Cancel | FlowEvent::TimedOut if previous.is_active() && self.is_remote() => {
                Some(SyncRequest::ResetSession)
            }
            _ => None,
        };

        if self.state.is_idle() {
            self.kind = None;
            self.measurement = Measurement::default();
        }
        Ok(request)
    }

    /// Skip selection screens the app already answered.
    ///
    /// Only fires in the matching selection state, where the answer event is
    /// always accepted and never produces a request.
    fn apply_preset_answers(&mut self, now_ms: u64) {
        let Some(SessionKind::Weighing {
            pattern, response, ..
        }) = self.kind
        else {
            return;
        };
        if let (FlowState::SelectEatingPattern, Some(pattern)) = (&self.state, pattern) {
            debug!("Eating pattern preset to {}", pattern.label());
            if let Err(e) = self.step(FlowEvent::PatternChosen(pattern), now_ms) {
                warn!("Preset eating pattern rejected: {}", e);
            }
        }
        if let (FlowState::SelectChildResponse, Some(response)) = (&self.state, response) {
            debug!("Child response preset to {}", response.label());
            if let Err(e) = self.step(FlowEvent::ResponseChosen(response), now_ms) {
                warn!("Preset child response rejected: {}", e);
            }
        }
    }

    /// React to a polled remote document.
    ///
    /// Start requests are ignored while a session is open. A closed remote
    /// document only ends sessions that came from the backend.
    pub fn apply_remote(
        &mut self,
        command: &RemoteCommand,
        now_ms: u64,
    ) -> Result<Option<SyncRequest>, FlowError> {
        match command.to_event() {
            Some(FlowEvent::Reset) if self.is_remote() => self.apply(FlowEvent::Reset, now_ms),
            Some(event @ FlowEvent::SessionStarted(_)) if self.state.is_idle() => {
                self.apply(event, now_ms)
            }
            _ => Ok(None),
        }
    }

    /// Fail the session once it has been open longer than its limit.
    pub fn check_timeout(&mut self, now_ms: u64) -> Result<Option<SyncRequest>, FlowError> {
        let limit = match (&self.kind, self.state.is_active()) {
            (Some(SessionKind::Pairing { .. }), true) => PAIRING_TIMEOUT_MS,
            (Some(_), true) => WEIGHING_TIMEOUT_MS,
            _ => return Ok(None),
        };
        if now_ms.saturating_sub(self.started_ms) < limit {
            return Ok(None);
        }
        warn!("Session timed out after {} ms", limit);
        self.apply(FlowEvent::TimedOut, now_ms)
    }
}
