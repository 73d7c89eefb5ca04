// CSS support: inline declarations, colors and resolved styles

pub mod color;
pub mod computed;
pub mod declarations;

pub use computed::{ComputedStyle, computed_style, computed_style_in};
pub use declarations::{Declaration, StyleDeclarations};
