//! Building blocks shared by every layer of the engine
//!
//! - [`Path`] / [`PathSegment`]: immutable locations inside nested input
//! - [`ValueShape`]: runtime shape classification used by predicates and
//!   message lookup
//! - [`SchemaError`] / [`MessagesError`]: construction-time failures

pub mod error;
pub mod path;
pub mod shape;

pub use error::{MessagesError, SchemaError};
pub use path::{Path, PathSegment};
pub use shape::ValueShape;
