//! User-facing status messages
//!
//! Created: 2026-10-19

pub mod coordinator;
pub mod toast;

pub use coordinator::NotificationCoordinator;
pub use toast::{ToastDurations, ToastEvent, ToastKind, ToastMessage};
