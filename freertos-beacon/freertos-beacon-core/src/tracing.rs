//! Hand-off to the recorder.
//!
//! The recorder — ring buffer, framing, capture-side filtering — lives
//! outside this crate. The link-time seam below is all it has to provide.

use arbitrary_int::{traits::Integer, u5};

use crate::protocol::MessageId;

unsafe extern "Rust" {
    /// Low-level recorder entry point. Implemented by the target crate or
    /// the host application; must be callable from any context, including
    /// interrupts.
    fn write_trace_message(message_id: u8, filter: u8, words: &[u32]);
}

/// Largest number of payload words any hook emits.
pub const MAX_MESSAGE_WORDS: usize = 4;

/// Forwards one message to the recorder.
pub fn emit(message: MessageId, filter: u5, words: &[u32]) {
    debug_assert!(words.len() <= MAX_MESSAGE_WORDS);

    unsafe { write_trace_message(message as u8, filter.as_u8(), words) };
}
