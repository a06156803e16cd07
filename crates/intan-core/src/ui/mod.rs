//! Intan UI system for the 128x64 monochrome OLED
//!
//! This module provides:
//! - Bounded menu labels with truncate-on-format semantics
//! - The drawing surface abstraction the menu engine renders into
//! - Full-screen status screens (info box, progress bar, spinner)

pub mod label;
pub mod screens;
pub mod surface;

pub use label::{LABEL_CAPACITY, Label};
pub use surface::{BufferedSurface, Surface};

use embedded_graphics::mono_font::{MonoFont, ascii::FONT_6X10};

/// SH1106 panel width in pixels.
pub const DISPLAY_WIDTH_PX: u16 = 128;
/// SH1106 panel height in pixels.
pub const DISPLAY_HEIGHT_PX: u16 = 64;

/// Font used for menu rows and status text.
pub const MENU_FONT: &MonoFont<'static> = &FONT_6X10;
/// Height of [`MENU_FONT`] glyphs, used to centre labels inside rows.
pub const MENU_FONT_HEIGHT_PX: u32 = 10;

/// Horizontal inset of row labels.
pub const LABEL_INSET_PX: i32 = 8;
