//! Built-in node implementations.

pub mod constant;
pub mod passthrough;
pub mod solid_image;

pub use constant::ConstantNode;
pub use passthrough::PassthroughNode;
pub use solid_image::SolidImageNode;
