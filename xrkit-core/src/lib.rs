pub mod binary;
pub mod primitive;
pub mod string;

pub use xrkit_core_derive::*;
