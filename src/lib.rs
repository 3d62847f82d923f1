//! reposcope library exports for testing

pub mod api;
pub mod core;

#[cfg(test)]
pub mod test_support;

pub use crate::core::interactor::{CountriesInteractor, ReposInteractor};
pub use crate::core::loadable::{LoadError, Loadable};
pub use crate::core::state::{AppState, paths};
pub use crate::core::store::{Path, Store, Subscription};
