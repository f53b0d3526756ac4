//! **scalegrid**: an exposé-style window overview.
//!
//! When activated, every eligible window on the output (or on the current
//! workspace) is scaled down and arranged in a grid so the user can pick
//! one with the keyboard or pointer.  Leaving the overview animates every
//! window back to where it was.
//!
//! # Architecture
//!
//! * [`grid`]: pure partitioning of a window set into rows and columns
//!   and the per-window target transform.
//! * [`animation`] and [`bezier`]: time-driven transitions with cubic
//!   Bézier easing.
//! * [`session`]: the overview state machine and its frame pacing.
//! * [`navigation`]: keyboard and pointer handling.
//!
//! The session never talks to a compositor directly; it goes through
//! [`traits::WindowHost`].  [`headless`] provides an in-memory host and a
//! command driver, and [`ipc`] accepts [`command::Command`]s over a Unix
//! socket.

pub mod animation;
pub mod bezier;
pub mod command;
pub mod config;
pub mod grid;
pub mod headless;
pub mod ipc;
pub mod navigation;
pub mod session;
pub mod traits;
