//! Measurement workflow
//!
//! A kiosk session moves through a fixed sequence of screens: identify the
//! child (RFID), collect the eating pattern and child response, weigh, measure
//! height, confirm, then hand the result to the sync worker. The sequence is a
//! single tagged state machine ([`FlowState`]) driven by [`FlowEvent`]s through
//! the [`transition`] table. It knows nothing about the display or the network;
//! [`MeasurementSession`] stores event data and returns the
//! [`SyncRequest`](crate::sync::SyncRequest)s the caller must queue.

mod flow;
mod measurement;
mod session;

pub use flow::{
    FailureReason, FlowError, FlowEvent, FlowState, RFID_TAG_LEN, RfidTag, SessionKind,
    SessionUser, USER_ID_LEN, UserId, transition,
};
pub use measurement::{ChildResponse, EatingPattern, Measurement, NutritionStatus};
pub use session::{MeasurementSession, PAIRING_TIMEOUT_MS, WEIGHING_TIMEOUT_MS};

/// Top-level mode shown by the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemMode {
    Startup,
    Idle,
    RfidPairing,
    WeighingSession,
    QuickMeasure,
    AdminMode,
}

impl SystemMode {
    /// Mode matching the session's kind, `Idle` when no session is open.
    pub fn for_session(session: &MeasurementSession) -> Self {
        match session.kind() {
            Some(SessionKind::Pairing { .. }) => Self::RfidPairing,
            Some(SessionKind::Weighing { .. }) => Self::WeighingSession,
            Some(SessionKind::Quick) => Self::QuickMeasure,
            None => Self::Idle,
        }
    }
}
