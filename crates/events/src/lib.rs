//! Scheduled notification events for ProjectHub.
//!
//! - [`ReminderScheduler`]: periodic due-date reminder processor.
//! - [`delivery`]: external delivery channels (SMTP email).
//! - [`NotificationSink`]: hook through which freshly written notifications
//!   reach live connections.

pub mod delivery;
pub mod reminder;

pub use delivery::email::{EmailConfig, EmailDelivery};
pub use reminder::{NotificationSink, ReminderReport, ReminderScheduler};
