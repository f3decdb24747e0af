//! ytrpc Common Types and Transport
//!
//! Shared building blocks of the ytrpc client:
//!
//! - [`protocol`] - error taxonomy and the wire messages exchanged with RPC proxies
//! - [`enums`] - option enums with stable wire names and protocol codes
//! - [`ypath`] - validated paths and key-range bounds
//! - [`transport`] - JSON codec and length-prefixed async TCP framing
//!
//! # Example
//!
//! ```
//! use ytrpc_common::{KeyBound, Relation, YPath};
//! use serde_json::json;
//!
//! let path = YPath::new("//home/logs").unwrap();
//! let bound = KeyBound::with_relation(Relation::GreaterOrEqual, &[json!("2024-01-01")]);
//! assert_eq!(bound.to_wire(), json!([">=", ["2024-01-01"]]));
//! assert_eq!(path.as_str(), "//home/logs");
//! ```

pub mod enums;
pub mod protocol;
pub mod transport;
pub mod ypath;

pub use enums::{LockMode, MergeMode, ProtoEnum, Relation, StringValueEnum};
pub use protocol::*;
pub use ypath::{KeyBound, RichYPath, TableRange, YPath};
