//! IPC listener that accepts commands over a Unix socket.
//!
//! Key-bind helpers and scripts connect to the socket and send
//! newline-delimited JSON commands to toggle and steer the overview.

pub mod listener;
