// Library exports for format-copier

pub mod apply;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod editable;
pub mod error;
pub mod extract;
pub mod page;
pub mod segment;
pub mod snapshot;
pub mod store;
pub mod style;

pub use error::{Error, Result};
