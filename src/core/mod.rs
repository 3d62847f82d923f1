//! # Core Application Logic
//!
//! The reactive state layer. It knows nothing about how state is shown.
//!
//! ```text
//!     front end (CLI)
//!          │ intent                 ▲ Subscription<T>
//!          ▼                        │
//!   ┌──────────────┐  set/update  ┌─┴────────────┐
//!   │ Interactors  │─────────────▶│    Store     │
//!   └──────┬───────┘              │  AppState    │
//!          │ async                └──────────────┘
//!          ▼
//!   ┌──────────────┐
//!   │ api (HTTP)   │
//!   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`loadable`]: `Loadable<T>`, the async resource lifecycle
//! - [`store`]: the observable container and typed paths
//! - [`state`]: `AppState`, the root record, and its paths
//! - [`interactor`]: orchestration of web calls into the store
//! - [`search`]: query de-duplication and debouncing
//! - [`config`]: settings and their override hierarchy

pub mod config;
pub mod interactor;
pub mod loadable;
pub mod search;
pub mod state;
pub mod store;
