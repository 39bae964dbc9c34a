// # Server Store Implementations
//
// This module provides implementations of the ServerStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileServerStore;
pub use memory::MemoryServerStore;
