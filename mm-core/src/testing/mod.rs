//! Test doubles for the exchange adapter and wall clock.
//!
//! Grounded on the teacher's `testing::mock_huginn` module: a programmable
//! feed that queues fixed responses and records what was submitted against
//! it, rather than simulating a real matching engine. Available outside
//! `#[cfg(test)]` (gated instead by the `testing` feature or simply left
//! public, matching the teacher's choice to ship its mock feed as an
//! ordinary module) so integration tests in `mm-agent` can use it too.

mod clock;
mod scripted_adapter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scripted_adapter::{RecordedOrder, ScriptedAdapter, ScriptedTick};
