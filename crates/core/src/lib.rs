pub mod codec;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod sequence;

pub use codec::{BoolDecoding, ScalarValue, TypeTag};
pub use error::CoreError;
pub use ids::*;
pub use mapping::{EdgeData, EdgeKey, EdgeMapping, NodeRef, RawEdgeKey, RawMapping};
pub use sequence::{RepresentationTag, Sequence, Series};
