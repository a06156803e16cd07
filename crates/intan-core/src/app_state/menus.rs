//! Menus shown by the kiosk and the actions bound to their rows.

use crate::menu::{Menu, MenuBuilder};
use crate::workflow::{ChildResponse, EatingPattern};

pub const ROOT_WEIGH: &str = "Timbang";
pub const ROOT_QUICK: &str = "Ukur Cepat";
pub const ROOT_PAIRING: &str = "Pairing RFID";
pub const ROOT_ADMIN: &str = "Admin";

pub const ADMIN_TARE: &str = "Tara Timbangan";
pub const ADMIN_INFO: &str = "Info Perangkat";
pub const ADMIN_RESET: &str = "Reset Sesi";
pub const ADMIN_EXIT: &str = "Kembali";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootAction {
    QuickMeasure,
    OpenAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Tare,
    ResetSession,
    Exit,
}

/// Main menu. "Timbang" and "Pairing RFID" only show instructions; those
/// sessions are opened from the app.
pub fn root_menu() -> Menu<RootAction> {
    MenuBuilder::new()
        .item(ROOT_WEIGH, None)
        .item(ROOT_QUICK, Some(RootAction::QuickMeasure))
        .item(ROOT_PAIRING, None)
        .item(ROOT_ADMIN, Some(RootAction::OpenAdmin))
        .build()
}

pub fn admin_menu() -> Menu<AdminAction> {
    MenuBuilder::new()
        .items([
            (ADMIN_TARE, Some(AdminAction::Tare)),
            (ADMIN_INFO, None),
            (ADMIN_RESET, Some(AdminAction::ResetSession)),
            (ADMIN_EXIT, Some(AdminAction::Exit)),
        ])
        .build()
}

pub fn eating_pattern_menu() -> Menu<EatingPattern> {
    MenuBuilder::new()
        .items(EatingPattern::ALL.map(|p| (p.label(), Some(p))))
        .build()
}

pub fn child_response_menu() -> Menu<ChildResponse> {
    MenuBuilder::new()
        .items(ChildResponse::ALL.map(|r| (r.label(), Some(r))))
        .build()
}
