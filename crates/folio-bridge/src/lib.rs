//! folio-bridge: a capability-scoped virtual filesystem for AI tools.
//!
//! Users grant individual folders; the bridge mounts each one under a
//! virtual root named after it (`/reports/...`) and exposes read, write,
//! edit, glob, and grep tools over the combined namespace. Access is
//! capability-shaped: every operation descends from a granted
//! [`capability::DirectoryHandle`] one child at a time, so nothing outside
//! a grant is reachable by construction.
//!
//! Component map:
//!
//! - [`capability`]: the handle traits plus in-memory and local-disk
//!   implementations.
//! - [`store`]: SQLite persistence for folder metadata and capability
//!   tokens.
//! - [`registry`]: the tracked folder list, including picker-driven adds
//!   and capability rehydration on load.
//! - [`resolver`]: virtual path resolution.
//! - [`tree`]: full and one-level file tree construction.
//! - [`search`]: glob and grep across folders.
//! - [`notify`]: synchronous change event fan-out.
//! - [`tools`]: the JSON-argument tool surface over all of the above.

pub mod capability;
pub mod error;
pub mod notify;
pub mod registry;
pub mod resolver;
pub mod search;
pub mod store;
pub mod tools;
pub mod tree;
pub mod vpath;

pub use error::{BridgeError, BridgeResult};
