//! Hardware-independent core library for the Intan growth-measurement kiosk
//!
//! This crate contains all platform-agnostic logic for the kiosk: the OLED
//! menu engine, full-screen status screens, button edge detection, load cell
//! and ultrasonic sampling helpers, the measurement workflow state machine and
//! the snapshots handed to the cloud sync worker.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod clock;
pub mod config;
pub mod framebuffer;
pub mod input;
pub mod menu;
pub mod sampling;
pub mod sync;
pub mod ui;
pub mod workflow;
