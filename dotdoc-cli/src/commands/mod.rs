pub mod common;
pub mod key;
pub mod lookup;
pub mod parse;
