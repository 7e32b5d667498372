pub mod appimage;
pub mod audio;
pub mod boxedarray;
pub mod debug;
pub mod frontend;
pub mod input;
pub mod macros;
pub mod num;
pub mod rom;
pub mod timeutils;

pub use appimage::{fix_appimage_relative_path, is_appimage_build};
