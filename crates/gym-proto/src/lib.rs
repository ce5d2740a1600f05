//! GYM persisted formats.
//!
//! This crate defines the messages exchanged between the translator and the
//! executor, and the statistics file produced by the loader. Everything is
//! archived with rkyv; serde derives are provided for human-readable dumps.
//!
//! # Modules
//!
//! - [`plan`] - Join-tree plan messages
//! - [`stats`] - Per-predicate statistics messages
//! - [`codec`] - Byte-level encode/decode helpers
//! - [`error`] - Protocol error types
//!
//! ```ignore
//! use gym_proto::{codec, Element, Node, Triple};
//!
//! let node = Node::triple(Triple::new(
//!     Element::variable("?s"),
//!     Element::constant(":knows"),
//!     Element::variable("?o"),
//! ));
//! let bytes = codec::encode_plan(&node).unwrap();
//! assert_eq!(codec::decode_plan(&bytes).unwrap(), node);
//! ```

pub mod codec;
pub mod error;
pub mod plan;
pub mod stats;

pub use error::Error;

pub use plan::{Element, ElementType, Node, NodePayload, TableStats, Triple};
pub use stats::{Graph, Table};

/// Version of the plan and statistics formats, written into the header of
/// every encoded file and checked on decode.
///
/// Bump when an archived type changes shape.
pub const FORMAT_VERSION: u32 = 1;
