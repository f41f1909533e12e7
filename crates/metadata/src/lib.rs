#![allow(clippy::type_complexity)]
pub mod completion;
pub mod lookup;
pub mod provider;
pub mod signals;
pub mod tmdb;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("not found")]
    NotFound,
}
