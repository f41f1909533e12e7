#![allow(clippy::collapsible_if)]
pub mod error;
pub mod recheck;
pub mod routes;
pub mod state;
pub mod tracking;
