//! UI-facing state controllers.
//!
//! Each controller owns the state for one view concern, talks to the
//! prescriptions API from spawned tasks and exposes a snapshot the views
//! read on every frame.

pub mod debounce;
pub mod detail;
pub mod refill;
pub mod search;
