//! The calendars, i.e. the [`TasksCalendar`](crate::traits::TasksCalendar) implementations of this crate
//!
//! * [`LocalCalendar`] keeps every task in a single slot of a key-value store
//! * [`RemoteCalendar`] keeps every task as a document of a remote collection

pub mod local_calendar;
pub mod remote_calendar;

pub use local_calendar::LocalCalendar;
pub use remote_calendar::RemoteCalendar;
