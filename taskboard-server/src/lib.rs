//! Mock REST backend for the task board.
//!
//! Serves the task board API over an in-memory [`Ledger`](taskboard_proto::ledger::Ledger)
//! for local development and end-to-end tests of the client.

pub mod config;
pub mod routes;
pub mod store;
