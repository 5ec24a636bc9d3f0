//! Frame layout.
//!
//! One recorder message becomes one frame:
//!
//! ```text
//! [time delta, 2 or 4 bytes][message id][filter][word count][words, LE]
//! ```
//!
//! The word count is explicit so a decoder can skip messages it does not
//! know.

use crate::buffer::BufferWriter;
use crate::time_delta::TimeDelta;

/// Filter byte used on frames the sink synthesizes itself (data-loss
/// reports); recorders must not suppress these.
pub const SINK_FILTER: u8 = 0;

/// Serializes one message into `writer`.
pub fn encode_frame(
    writer: &mut BufferWriter,
    delta: TimeDelta,
    message_id: u8,
    filter: u8,
    words: &[u32],
) {
    delta.write_bytes(writer);
    writer.write_byte(message_id);
    writer.write_byte(filter);
    writer.write_byte(words.len() as u8);
    for &word in words {
        writer.write_word(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferReader;

    #[test]
    fn test_frame_layout() {
        let mut writer = BufferWriter::new();
        encode_frame(
            &mut writer,
            TimeDelta::from_delta_us(0x1234),
            42,
            3,
            &[0xAABB_CCDD, 7],
        );

        let mut reader = BufferReader::new(writer.as_slice());
        let delta = TimeDelta::read_bytes(&mut reader).unwrap();
        assert_eq!(delta.delta_us(), 0x1234);
        assert_eq!(reader.read_byte(), Some(42));
        assert_eq!(reader.read_byte(), Some(3));
        assert_eq!(reader.read_byte(), Some(2));
        assert_eq!(reader.read_word(), Some(0xAABB_CCDD));
        assert_eq!(reader.read_word(), Some(7));
        assert_eq!(reader.read_byte(), None);
    }

    #[test]
    fn test_empty_message_is_header_only() {
        let mut writer = BufferWriter::new();
        encode_frame(&mut writer, TimeDelta::from_delta_us(1), 90, 1, &[]);
        // 2 delta bytes + id + filter + count
        assert_eq!(writer.len(), 5);
    }

    #[test]
    fn test_longest_message_fits_the_scratch_buffer() {
        let mut writer = BufferWriter::new();
        encode_frame(
            &mut writer,
            TimeDelta::from_delta_us(u32::MAX),
            255,
            31,
            &[1, 2, 3, 4],
        );
        assert_eq!(writer.len(), 4 + 3 + 16);
    }
}
