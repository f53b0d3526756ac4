//! In-memory window host.
//!
//! [`host::HeadlessHost`] implements [`WindowHost`](crate::traits::WindowHost)
//! over a plain window table so the overview can run (and be tested)
//! without a compositor.  [`driver::Driver`] feeds it
//! [`Command`](crate::command::Command)s and paces frames.

pub mod driver;
pub mod host;
