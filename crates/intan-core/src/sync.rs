//! Hand-off between the UI flow and the cloud sync worker.
//!
//! The UI never touches the network. It pushes plain [`SyncRequest`]
//! snapshots into [`SYNC_CHANNEL`]; the worker task drains them, talks to the
//! backend, and feeds results back as [`FlowEvent`]s. Remote session changes
//! arrive the other way as [`RemoteCommand`]s polled from the
//! `systemStatus/hardware` document.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::ui::Label;
use crate::workflow::{
    ChildResponse, EatingPattern, FlowEvent, Measurement, NutritionStatus, RfidTag, SessionKind,
    SessionUser, UserId,
};

/// Channel capacity for sync requests
pub const SYNC_QUEUE_CAPACITY: usize = 4;

pub type SyncChannel = Channel<CriticalSectionRawMutex, SyncRequest, SYNC_QUEUE_CAPACITY>;

/// Global channel from the UI flow to the sync worker
pub static SYNC_CHANNEL: SyncChannel = Channel::new();

/// One finished measurement as stored in the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// `None` for quick measurements outside a remote session.
    pub user_id: Option<UserId>,
    pub weight_kg: f32,
    pub height_cm: f32,
    /// Body mass index (IMT).
    pub imt: f32,
    pub nutrition_status: NutritionStatus,
    pub eating_pattern: Option<EatingPattern>,
    pub child_response: Option<ChildResponse>,
}

impl MeasurementRecord {
    pub fn new(measurement: &Measurement, user_id: Option<UserId>) -> Self {
        let imt = measurement.bmi().unwrap_or(0.0);
        Self {
            user_id,
            weight_kg: measurement.weight_kg,
            height_cm: measurement.height_cm,
            imt,
            nutrition_status: NutritionStatus::classify(imt),
            eating_pattern: measurement.eating_pattern,
            child_response: measurement.child_response,
        }
    }
}

/// Work for the sync worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncRequest {
    /// Store `tag` as the card of `user_id`.
    PairRfid { user_id: UserId, tag: RfidTag },
    PublishMeasurement(MeasurementRecord),
    /// Clear the remote session document.
    ResetSession,
}

/// Fields of the remote session document the kiosk reacts to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteCommand {
    pub is_in_use: bool,
    /// `"rfid"` for card pairing, `"weighing"` for a measurement.
    pub session_type: heapless::String<16>,
    pub user_rfid: RfidTag,
    pub current_user_id: UserId,
    pub current_user_name: Label,
    pub eating_pattern: heapless::String<16>,
    pub child_response: heapless::String<16>,
    pub measurement_complete: bool,
    /// Card written back by the kiosk after pairing.
    pub rfid: RfidTag,
}

impl RemoteCommand {
    fn user(&self) -> SessionUser {
        SessionUser {
            id: self.current_user_id.clone(),
            name: self.current_user_name.clone(),
        }
    }

    /// Event this document state asks for, if any.
    ///
    /// The document is polled repeatedly; callers ignore a start event while a
    /// session is already running.
    pub fn to_event(&self) -> Option<FlowEvent> {
        if !self.is_in_use {
            return Some(FlowEvent::Reset);
        }
        match self.session_type.as_str() {
            "rfid" if self.rfid.is_empty() => Some(FlowEvent::SessionStarted(SessionKind::Pairing {
                user: self.user(),
            })),
            "weighing" if !self.measurement_complete => {
                Some(FlowEvent::SessionStarted(SessionKind::Weighing {
                    user: self.user(),
                    expected_rfid: self.user_rfid.clone(),
                    pattern: EatingPattern::from_label(&self.eating_pattern),
                    response: ChildResponse::from_label(&self.child_response),
                }))
            }
            "rfid" | "weighing" => None,
            other => {
                warn!("Unknown remote session type: {}", other);
                None
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    #[error("Sync queue full (capacity: {capacity})")]
    QueueFull { capacity: usize },
}

/// Non-blocking access to a sync channel.
#[derive(Clone, Copy)]
pub struct SyncQueue<'a> {
    channel: &'a SyncChannel,
}

impl<'a> SyncQueue<'a> {
    pub const fn new(channel: &'a SyncChannel) -> Self {
        Self { channel }
    }

    /// Queue backed by [`SYNC_CHANNEL`].
    pub fn global() -> SyncQueue<'static> {
        SyncQueue::new(&SYNC_CHANNEL)
    }

    /// Queue a request without waiting. The request is dropped when the
    /// queue is full.
    pub fn submit(&self, request: SyncRequest) -> Result<(), SyncError> {
        self.channel.try_send(request).map_err(|e| {
            let TrySendError::Full(dropped) = e;
            warn!("Sync queue full, dropping {:?}", dropped);
            SyncError::QueueFull {
                capacity: SYNC_QUEUE_CAPACITY,
            }
        })
    }

    /// Next pending request, if any. Used by the worker side.
    pub fn try_next(&self) -> Option<SyncRequest> {
        self.channel.try_receive().ok()
    }

    pub fn pending(&self) -> usize {
        self.channel.len()
    }
}
