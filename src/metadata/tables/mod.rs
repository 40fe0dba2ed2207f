//! Row readers for the metadata tables that describe a library's public surface.
//!
//! Each row type implements [`RowReadable`] and is read through a [`MetadataTable`]
//! obtained from [`crate::metadata::streams::TablesHeader::table`].

mod assembly;
mod event;
mod eventmap;
mod field;
mod genericparam;
mod methoddef;
mod methodsemantics;
mod module;
mod nestedclass;
mod param;
mod property;
mod propertymap;
mod typedef;
mod typeref;
mod typespec;
mod types;

pub use assembly::AssemblyRaw;
pub use event::EventRaw;
pub use eventmap::EventMapRaw;
pub use field::FieldRaw;
pub use genericparam::GenericParamRaw;
pub use methoddef::MethodDefRaw;
pub use methodsemantics::MethodSemanticsRaw;
pub use module::ModuleRaw;
pub use nestedclass::NestedClassRaw;
pub use param::ParamRaw;
pub use property::PropertyRaw;
pub use propertymap::PropertyMapRaw;
pub use typedef::TypeDefRaw;
pub use typeref::TypeRefRaw;
pub use typespec::TypeSpecRaw;
pub use types::*;
