//! RTT transport for the frame stream.
//!
//! Frames go out over a dedicated RTT up-channel in non-blocking skip mode:
//! when the debug probe falls behind, whole frames are dropped and counted,
//! and the next successful write is preceded by a synthesized data-loss
//! frame so the capture shows how much is missing instead of silently
//! skipping time.

use core::cell::RefCell;

use critical_section::Mutex;
use freertos_beacon_core::protocol::MessageId;
use portable_atomic::{AtomicU32, Ordering};
use rtt_target::UpChannel;

use crate::buffer::BufferWriter;
use crate::frame::{SINK_FILTER, encode_frame};
use crate::time_delta::TimeDelta;

static TRACE_CHANNEL: Mutex<RefCell<Option<UpChannel>>> = Mutex::new(RefCell::new(None));

static DROPPED_MESSAGES: AtomicU32 = AtomicU32::new(0);

/// Routes the frame stream to `channel`. Must be called before the first
/// hook fires; earlier messages are counted as dropped.
pub fn set_trace_channel(channel: UpChannel) {
    critical_section::with(|cs| {
        TRACE_CHANNEL.borrow(cs).replace(Some(channel));
    });
}

fn write_frame(channel: &mut UpChannel, buffer: &BufferWriter) -> bool {
    // NoBlockSkip either takes the whole frame or none of it
    channel.write(buffer.as_slice()) == buffer.len()
}

#[unsafe(no_mangle)]
fn write_trace_message(message_id: u8, filter: u8, words: &[u32]) {
    critical_section::with(|cs| {
        let mut channel = TRACE_CHANNEL.borrow(cs).borrow_mut();
        let Some(channel) = channel.as_mut() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Trace channel not initialized, dropping trace message");

            DROPPED_MESSAGES.fetch_add(1, Ordering::Relaxed);
            return;
        };

        // Report any earlier overflow before the next regular frame
        if DROPPED_MESSAGES.load(Ordering::Relaxed) > 0 {
            let previously_dropped = DROPPED_MESSAGES.swap(0, Ordering::Relaxed);

            let mut buffer = BufferWriter::new();
            encode_frame(
                &mut buffer,
                TimeDelta::from_now(),
                MessageId::TraceDataLost as u8,
                SINK_FILTER,
                &[previously_dropped],
            );

            if write_frame(channel, &buffer) {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Recovered from trace overflow: {} messages were lost",
                    previously_dropped
                );
            } else {
                DROPPED_MESSAGES.fetch_add(previously_dropped, Ordering::Relaxed);
            }
        }

        let mut buffer = BufferWriter::new();
        encode_frame(&mut buffer, TimeDelta::from_now(), message_id, filter, words);

        if !write_frame(channel, &buffer) {
            // Only log when the first message of a burst is dropped
            #[cfg(feature = "defmt")]
            if DROPPED_MESSAGES.load(Ordering::Relaxed) == 0 {
                defmt::warn!("Trace channel full, dropping messages...");
            }

            DROPPED_MESSAGES.fetch_add(1, Ordering::Relaxed);
        }
    });
}

#[cfg(feature = "defmt")]
/// Initializes RTT with the default channel plan:
/// - Channel 0 for defmt (1kB, NoBlockSkip)
/// - Channel 1 for trace frames (4kB, NoBlockSkip)
pub fn beacon_init_default() {
    let channels = rtt_target::rtt_init! {
        up: {
            0: {
                size: 1024,
                mode: rtt_target::ChannelMode::NoBlockSkip,
                name: "defmt"
            }
            1: {
                size: 4096,
                mode: rtt_target::ChannelMode::NoBlockSkip,
                name: "FreertosBeacon"
            }
        }
    };

    rtt_target::set_defmt_channel(channels.up.0);
    set_trace_channel(channels.up.1);
}

#[cfg(not(feature = "defmt"))]
/// Initializes RTT with the default channel plan:
/// - Channel 1 for trace frames (4kB, NoBlockSkip)
pub fn beacon_init_default() {
    let channels = rtt_target::rtt_init! {
        up: {
            1: {
                size: 4096,
                mode: rtt_target::ChannelMode::NoBlockSkip,
                name: "FreertosBeacon"
            }
        }
    };

    set_trace_channel(channels.up.1);
}
