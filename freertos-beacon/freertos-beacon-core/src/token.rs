//! Name/address tokens.
//!
//! Every trace record identifies a kernel object with a single 32-bit word:
//! the first four characters of its configured name packed little-endian, or
//! the low 16 bits of its address rendered as four ASCII hex digits when no
//! name exists. A host-side decoder prints the word's bytes directly.

/// Hex lookup table (0-15 => '0'-'F')
const HEX_LUT: [u8; 16] = *b"0123456789ABCDEF";

/// A 32-bit trace payload word identifying a kernel object.
///
/// Exactly one representation per token: a packed name, a hex digest of an
/// address, or one of the two sentinels. Unused trailing bytes of a short
/// name stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Token(u32);

impl Token {
    /// The object reference itself was null/absent. Decodes as `"NULL"`.
    pub const NULL_REF: Token = Token::from_name_bytes(b"NULL");

    /// The object exists but a name is categorically unobtainable
    /// (name lookups disabled for its kind). Decodes as `"????"`.
    pub const UNNAMED: Token = Token(0x3F3F_3F3F);

    /// The raw word, as handed to the recorder.
    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn from_name_bytes(name: &[u8]) -> Token {
        let mut word = 0u32;
        let mut shift = 0u32;
        let mut i = 0;
        while i < name.len() && i < 4 {
            if name[i] == 0 {
                break;
            }
            word |= (name[i] as u32) << shift;
            shift += 8;
            i += 1;
        }
        Token(word)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> u32 {
        token.0
    }
}

/// How to identify an object whose name lookup came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NameFallback {
    /// Encode the low 16 bits of the object's address as hex digits.
    HexAddress,
    /// Use the fixed `"????"` sentinel.
    Unnamed,
}

/// Packs the first four characters of a name into a little-endian token.
///
/// `None` yields [`Token::NULL_REF`]. The copy stops at an embedded NUL or
/// after four bytes, whichever comes first; bytes past that point are never
/// inspected.
pub fn name_token(name: Option<&str>) -> Token {
    match name {
        Some(name) => Token::from_name_bytes(name.as_bytes()),
        None => Token::NULL_REF,
    }
}

/// Renders a 16-bit value as four ASCII hex digits packed little-endian.
///
/// The digit of the most significant nibble occupies the least significant
/// byte: `hex_digest(0x1234)` returns `0x3433_3231`, whose bytes read
/// `'1' '2' '3' '4'` in memory order. This byte layout is a wire-format
/// contract shared with the host-side decoder; do not rearrange it.
pub const fn hex_digest(value: u16) -> Token {
    Token(
        (HEX_LUT[(value >> 12 & 0xF) as usize] as u32)
            | (HEX_LUT[(value >> 8 & 0xF) as usize] as u32) << 8
            | (HEX_LUT[(value >> 4 & 0xF) as usize] as u32) << 16
            | (HEX_LUT[(value & 0xF) as usize] as u32) << 24,
    )
}

/// Resolves an object reference to a token.
///
/// A null reference always yields [`Token::NULL_REF`], regardless of the
/// other arguments. Otherwise `name_of` supplies the object's configured
/// name; if it has none, `fallback` decides between the address digest and
/// the `"????"` sentinel.
///
/// Total by design: every input maps to a defined token. Trace encoding must
/// never be the thing that faults.
pub fn object_token<T>(
    object: Option<&T>,
    name_of: impl FnOnce(&T) -> Option<&str>,
    fallback: NameFallback,
) -> Token {
    let Some(object) = object else {
        return Token::NULL_REF;
    };

    match name_of(object) {
        Some(name) => name_token(Some(name)),
        None => match fallback {
            NameFallback::HexAddress => {
                // Address is truncated to 16 bits since the token is one word
                hex_digest((object as *const T as usize & 0xFFFF) as u16)
            }
            NameFallback::Unnamed => Token::UNNAMED,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{string::String, vec::Vec};

    fn decode_hex_token(token: Token) -> u16 {
        // Bytes LSB-first are the digits most-significant-nibble-first
        let digits: String = token.raw().to_le_bytes().iter().map(|&b| b as char).collect();
        u16::from_str_radix(&digits, 16).expect("token bytes are not hex digits")
    }

    #[test]
    fn test_hex_digest_reference_vector() {
        assert_eq!(hex_digest(0x1234).raw(), 0x3433_3231);
        assert_eq!(hex_digest(0x0000).raw(), 0x3030_3030);
        assert_eq!(hex_digest(0xFFFF).raw(), 0x4646_4646);
    }

    #[test]
    fn test_hex_digest_round_trips_all_values() {
        for value in 0..=u16::MAX {
            assert_eq!(decode_hex_token(hex_digest(value)), value, "value {:#06x}", value);
        }
    }

    #[test]
    fn test_name_token_packs_little_endian() {
        assert_eq!(name_token(Some("AB")).raw(), 0x0000_4241);
        assert_eq!(name_token(Some("Tmr1")).raw(), u32::from_le_bytes(*b"Tmr1"));
        assert_eq!(name_token(Some("")).raw(), 0);
    }

    #[test]
    fn test_name_token_ignores_past_fourth_char() {
        assert_eq!(name_token(Some("ABCDE")), name_token(Some("ABCD")));
        assert_eq!(name_token(Some("ABCD")).raw(), u32::from_le_bytes(*b"ABCD"));
    }

    #[test]
    fn test_name_token_stops_at_embedded_nul() {
        assert_eq!(name_token(Some("AB\0CD")), name_token(Some("AB")));
    }

    #[test]
    fn test_name_token_none_is_null_sentinel() {
        assert_eq!(name_token(None), Token::NULL_REF);
        assert_eq!(Token::NULL_REF.raw(), u32::from_le_bytes(*b"NULL"));
    }

    #[test]
    fn test_object_token_null_reference_wins() {
        let object: Option<&u32> = None;
        assert_eq!(
            object_token(object, |_| Some("name"), NameFallback::HexAddress),
            Token::NULL_REF
        );
        assert_eq!(
            object_token(object, |_| Some("name"), NameFallback::Unnamed),
            Token::NULL_REF
        );
    }

    #[test]
    fn test_object_token_prefers_name() {
        let object = 7u32;
        assert_eq!(
            object_token(Some(&object), |_| Some("Rx"), NameFallback::HexAddress),
            name_token(Some("Rx"))
        );
    }

    #[test]
    fn test_object_token_hex_fallback_uses_low_address_bits() {
        let object = 7u32;
        let low16 = (&object as *const u32 as usize & 0xFFFF) as u16;
        assert_eq!(
            object_token(Some(&object), |_| None, NameFallback::HexAddress),
            hex_digest(low16)
        );
    }

    #[test]
    fn test_object_token_unnamed_fallback_ignores_address() {
        let a = 1u32;
        let b = 2u64;
        assert_eq!(
            object_token(Some(&a), |_| None, NameFallback::Unnamed),
            Token::UNNAMED
        );
        assert_eq!(
            object_token(Some(&b), |_| None, NameFallback::Unnamed),
            Token::UNNAMED
        );
        assert_eq!(Token::UNNAMED.raw(), 0x3F3F_3F3F);
    }

    #[test]
    fn test_encoding_is_pure_across_threads() {
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                std::thread::spawn(move || {
                    let base = t * 0x1000;
                    (0..0x1000u32)
                        .map(|v| hex_digest((base + v) as u16).raw())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for (t, handle) in handles.into_iter().enumerate() {
            let words = handle.join().unwrap();
            for (v, word) in words.into_iter().enumerate() {
                let value = (t * 0x1000 + v) as u16;
                assert_eq!(word, hex_digest(value).raw());
            }
        }
    }
}
