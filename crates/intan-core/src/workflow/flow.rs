//! Session states, the events that move between them, and the transition table.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use super::{ChildResponse, EatingPattern};
use crate::ui::Label;

/// Longest RFID UID string kept (7-byte UID as hex).
pub const RFID_TAG_LEN: usize = 16;
/// Longest user id kept.
pub const USER_ID_LEN: usize = 32;

pub type RfidTag = heapless::String<RFID_TAG_LEN>;
pub type UserId = heapless::String<USER_ID_LEN>;

/// Account a remote session was opened for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: Label,
}

/// What a session was opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    /// Bind the next tapped card to `user`.
    Pairing { user: SessionUser },
    /// Weigh the child whose card is `expected_rfid`.
    ///
    /// Answers already given in the app skip the matching selection screen.
    Weighing {
        user: SessionUser,
        expected_rfid: RfidTag,
        pattern: Option<EatingPattern>,
        response: Option<ChildResponse>,
    },
    /// Anonymous measurement started from the kiosk menu.
    Quick,
}

/// Why a session ended without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    RfidMismatch,
    SyncFailed,
    TimedOut,
}

impl FailureReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RfidMismatch => "RFID tidak cocok",
            Self::SyncFailed => "Gagal kirim data",
            Self::TimedOut => "Waktu habis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    /// Waiting for a card to pair.
    Pairing,
    AwaitingRfid {
        expected: RfidTag,
    },
    SelectEatingPattern,
    SelectChildResponse,
    Weighing,
    MeasuringHeight,
    /// Results on screen, waiting for the operator to confirm.
    Validating,
    /// Waiting for the sync worker.
    Sending,
    Complete,
    Failed {
        reason: FailureReason,
    },
}

impl FlowState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pairing => "Pairing",
            Self::AwaitingRfid { .. } => "AwaitingRfid",
            Self::SelectEatingPattern => "SelectEatingPattern",
            Self::SelectChildResponse => "SelectChildResponse",
            Self::Weighing => "Weighing",
            Self::MeasuringHeight => "MeasuringHeight",
            Self::Validating => "Validating",
            Self::Sending => "Sending",
            Self::Complete => "Complete",
            Self::Failed { .. } => "Failed",
        }
    }

    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// A session is open and has not finished yet.
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Complete | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    SessionStarted(SessionKind),
    RfidTapped(RfidTag),
    PatternChosen(EatingPattern),
    ResponseChosen(ChildResponse),
    /// Filtered weight settled.
    WeightStable(f32),
    HeightMeasured(f32),
    Confirm,
    SyncAcknowledged,
    SyncFailed,
    TimedOut,
    /// Operator backed out of an open session.
    Cancel,
    /// Drop whatever is going on, e.g. the remote session was closed.
    Reset,
}

impl FlowEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted(_) => "SessionStarted",
            Self::RfidTapped(_) => "RfidTapped",
            Self::PatternChosen(_) => "PatternChosen",
            Self::ResponseChosen(_) => "ResponseChosen",
            Self::WeightStable(_) => "WeightStable",
            Self::HeightMeasured(_) => "HeightMeasured",
            Self::Confirm => "Confirm",
            Self::SyncAcknowledged => "SyncAcknowledged",
            Self::SyncFailed => "SyncFailed",
            Self::TimedOut => "TimedOut",
            Self::Cancel => "Cancel",
            Self::Reset => "Reset",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    #[error("No transition from {state} on {event}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
    #[error("Measurement rejected: {reason}")]
    InvalidMeasurement { reason: &'static str },
}

/// Next state for `event` arriving in `state`.
///
/// Pure: data carried by events is stored by
/// [`MeasurementSession`](super::MeasurementSession), not here.
pub fn transition(state: &FlowState, event: &FlowEvent) -> Result<FlowState, FlowError> {
    use FlowEvent as E;
    use FlowState as S;

    let next = match (state, event) {
        (_, E::Reset) => S::Idle,

        (S::Idle, E::SessionStarted(kind)) => match kind {
            SessionKind::Pairing { .. } => S::Pairing,
            SessionKind::Weighing { expected_rfid, .. } => S::AwaitingRfid {
                expected: expected_rfid.clone(),
            },
            SessionKind::Quick => S::SelectEatingPattern,
        },

        (S::Pairing, E::RfidTapped(_)) => S::Sending,
        (S::AwaitingRfid { expected }, E::RfidTapped(tag)) => {
            if tag.eq_ignore_ascii_case(expected) {
                S::SelectEatingPattern
            } else {
                S::Failed {
                    reason: FailureReason::RfidMismatch,
                }
            }
        }

        (S::SelectEatingPattern, E::PatternChosen(_)) => S::SelectChildResponse,
        (S::SelectChildResponse, E::ResponseChosen(_)) => S::Weighing,
        (S::Weighing, E::WeightStable(_)) => S::MeasuringHeight,
        (S::MeasuringHeight, E::HeightMeasured(_)) => S::Validating,
        (S::Validating, E::Confirm) => S::Sending,

        (S::Sending, E::SyncAcknowledged) => S::Complete,
        (S::Sending, E::SyncFailed) => S::Failed {
            reason: FailureReason::SyncFailed,
        },

        (s, E::TimedOut) if s.is_active() => S::Failed {
            reason: FailureReason::TimedOut,
        },
        (s, E::Cancel) if s.is_active() => S::Idle,
        (S::Complete | S::Failed { .. }, E::Confirm | E::Cancel) => S::Idle,

        (state, event) => {
            return Err(FlowError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            });
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> RfidTag {
        RfidTag::try_from(text).unwrap()
    }

    fn weighing(expected: &str) -> FlowEvent {
        FlowEvent::SessionStarted(SessionKind::Weighing {
            user: SessionUser::default(),
            expected_rfid: tag(expected),
            pattern: None,
            response: None,
        })
    }

    #[test]
    fn full_weighing_path() {
        let steps = [
            (weighing("a1b2c3d4"), "AwaitingRfid"),
            (FlowEvent::RfidTapped(tag("A1B2C3D4")), "SelectEatingPattern"),
            (FlowEvent::PatternChosen(EatingPattern::Cukup), "SelectChildResponse"),
            (FlowEvent::ResponseChosen(ChildResponse::Aktif), "Weighing"),
            (FlowEvent::WeightStable(14.2), "MeasuringHeight"),
            (FlowEvent::HeightMeasured(96.0), "Validating"),
            (FlowEvent::Confirm, "Sending"),
            (FlowEvent::SyncAcknowledged, "Complete"),
            (FlowEvent::Confirm, "Idle"),
        ];

        let mut state = FlowState::Idle;
        for (event, expected) in steps {
            state = transition(&state, &event).unwrap();
            assert_eq!(state.name(), expected, "after {}", event.name());
        }
    }

    #[test]
    fn wrong_card_fails_session() {
        let state = transition(&FlowState::Idle, &weighing("a1b2c3d4")).unwrap();
        let state = transition(&state, &FlowEvent::RfidTapped(tag("ffff0000"))).unwrap();
        assert_eq!(
            state,
            FlowState::Failed {
                reason: FailureReason::RfidMismatch
            }
        );
    }

    #[test]
    fn pairing_and_quick_entry_points() {
        let pairing = FlowEvent::SessionStarted(SessionKind::Pairing {
            user: SessionUser::default(),
        });
        assert_eq!(transition(&FlowState::Idle, &pairing).unwrap(), FlowState::Pairing);
        assert_eq!(
            transition(&FlowState::Pairing, &FlowEvent::RfidTapped(tag("01"))).unwrap(),
            FlowState::Sending
        );
        assert_eq!(
            transition(&FlowState::Idle, &FlowEvent::SessionStarted(SessionKind::Quick)).unwrap(),
            FlowState::SelectEatingPattern
        );
    }

    #[test]
    fn cancel_and_timeout_only_apply_to_open_sessions() {
        assert_eq!(transition(&FlowState::Weighing, &FlowEvent::Cancel).unwrap(), FlowState::Idle);
        assert_eq!(
            transition(&FlowState::Sending, &FlowEvent::TimedOut).unwrap(),
            FlowState::Failed {
                reason: FailureReason::TimedOut
            }
        );
        assert!(transition(&FlowState::Idle, &FlowEvent::Cancel).is_err());
        assert!(transition(&FlowState::Idle, &FlowEvent::TimedOut).is_err());
        assert_eq!(transition(&FlowState::Validating, &FlowEvent::Reset).unwrap(), FlowState::Idle);
        assert_eq!(transition(&FlowState::Idle, &FlowEvent::Reset).unwrap(), FlowState::Idle);
    }

    #[test]
    fn unknown_pairs_are_rejected() {
        let err = transition(&FlowState::Weighing, &FlowEvent::HeightMeasured(90.0)).unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidTransition {
                state: "Weighing",
                event: "HeightMeasured"
            }
        );
        assert!(transition(&FlowState::Pairing, &weighing("01")).is_err());
    }
}
