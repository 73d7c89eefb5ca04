// In-memory DOM used by the extractor and the applicator

pub mod markup;
pub mod node;
pub mod range;
pub mod tree;

pub use node::{Attr, ElementData, Node, NodeData, NodeId};
pub use range::{BoundaryPoint, Range};
pub use tree::Dom;
