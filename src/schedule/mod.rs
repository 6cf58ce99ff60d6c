//! Time-driven view selection.
//!
//! [`schedule`] is a pure function of `(time, duration)`: no state is carried between frames, so
//! any frame can be evaluated independently (and in parallel).

mod view_state;

pub use view_state::{ScheduleParams, ViewState, schedule};
