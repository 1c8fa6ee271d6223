//! Notification fan-out for REST handlers, the gateway and background jobs.

mod broadcaster;

pub use broadcaster::{Broadcaster, LiveNotifier};
