#![no_std]

// Narrow-integer types appear in the public API (filter numbers)
pub use arbitrary_int;

pub mod config;
pub mod hooks;
pub mod pack;
pub mod protocol;
pub mod token;
pub mod tracing;

#[cfg(test)]
extern crate std;
