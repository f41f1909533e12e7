#![allow(clippy::collapsible_if)]
pub mod fallback;
pub mod parser;
pub mod segment;
