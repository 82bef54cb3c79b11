//! Device implementations

pub mod console;
pub mod database;
pub mod file;
pub mod string;
pub mod text;

pub use console::ConsoleDevice;
pub use database::{DatabaseDevice, RowCounter};
pub use file::FileDevice;
pub use string::{StringBuffer, StringDevice};
pub use text::TextDevice;

pub use crate::core::Device;
