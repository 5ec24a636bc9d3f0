//! Compact binary trace instrumentation for FreeRTOS kernels.
//!
//! A FreeRTOS port wires its `trace*` hook points to the methods of a
//! [`hooks::KernelTracer`]. Each hook reduces the kernel objects involved to
//! 32-bit tokens (name or address digest), packs narrow fields into words,
//! and forwards the result to a recorder through a single link-time symbol.
//! The `rtt` feature pulls in a reference recorder that frames messages with
//! delta timestamps and ships them over RTT.
//!
//! ```ignore
//! use freertos_beacon::config::TraceConfig;
//! use freertos_beacon::hooks::KernelTracer;
//!
//! static TRACER: KernelTracer = KernelTracer::new(TraceConfig::DEFAULT);
//!
//! // called from the port's traceTASK_SWITCHED_IN hook point
//! fn on_task_switched_in(tcb: &Tcb) {
//!     TRACER.task_switched_in(Some(tcb));
//! }
//! ```

#![no_std]

pub use freertos_beacon_core::*;

#[cfg(feature = "rtt")]
pub use freertos_beacon_target::*;

pub mod freertos;

#[cfg(test)]
extern crate std;
