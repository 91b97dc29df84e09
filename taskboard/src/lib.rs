//! `taskboard`: client-side kanban board state with optimistic updates.

pub mod api;
pub mod board;
pub mod config;
pub mod render;
