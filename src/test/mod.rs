mod builder;
pub mod factories;

pub use builder::{def, GenericOwner, MetadataBuilder, PeBuilder};
