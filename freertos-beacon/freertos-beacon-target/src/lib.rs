//! Target-side reference recorder for `freertos-beacon`.
//!
//! The core crate hands every message to a `write_trace_message` symbol and
//! leaves the wire format to whoever implements it. This crate is that
//! implementation: each message becomes one frame of
//! `[time delta][message id][filter][word count][words, little-endian]`,
//! shipped over RTT when the `rtt` feature is enabled. Hosts with their own
//! transport can reuse the frame encoder and define the symbol themselves —
//! but not both, the symbol must exist exactly once in the final image.

#![no_std]

pub mod buffer;
pub mod frame;
pub mod time_delta;

cfg_if::cfg_if! {
    if #[cfg(feature = "rtt")] {
        mod tracing_rtt;
        pub use tracing_rtt::*;
    }
}

#[cfg(test)]
extern crate std;
