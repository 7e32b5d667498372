//! Cheat code parsing (Game Genie / Pro Action Replay style patches)
//!
//! A parsed code becomes a [`CheatPatch`](crate::bus::CheatPatch) that the Bus consults on every
//! read; see `Bus::apply_cheats`.

use crate::bus::CheatPatch;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheatError {
    #[error("cheat code has invalid length {len} (expected 8 hex digits, or 6 or 8 letters)")]
    InvalidLength { len: usize },
    #[error("cheat code contains invalid character '{0}'")]
    InvalidCharacter(char),
}

// Pro Action Replay: 8 hex digits, `AAAAAADD` -> patch byte DD at 24-bit address AAAAAA
pub fn parse_action_replay(code: &str) -> Result<CheatPatch, CheatError> {
    if code.len() != 8 {
        return Err(CheatError::InvalidLength { len: code.len() });
    }

    let value = u32::from_str_radix(code, 16)
        .map_err(|_| CheatError::InvalidCharacter(code.chars().find(|c| !c.is_ascii_hexdigit()).unwrap_or('?')))?;

    let address = value >> 8;
    let replacement = value as u8;
    Ok(CheatPatch { address, replacement, compare: None })
}

// Game Genie-style alphabet; each letter maps to a nibble 0..=15 in this order. This alphabet is
// just the 16 hex digits under a different name, so an 8-character Game Genie code and an 8-digit
// Action Replay code are never distinguishable by character content alone -- see `parse`.
const ALPHABET: [char; 16] =
    ['D', 'F', '4', '7', '0', '9', '1', '5', '6', 'B', 'C', '8', 'A', '2', '3', 'E'];

fn char_to_nibble(c: char) -> Result<u8, CheatError> {
    ALPHABET
        .iter()
        .position(|&letter| letter == c.to_ascii_uppercase())
        .map(|pos| pos as u8)
        .ok_or(CheatError::InvalidCharacter(c))
}

// Game Genie addresses are always within this fixed bank. A 6 (or 8) letter code only carries 8
// bits of data (and, for the 8-letter form, 8 bits of compare) plus 16 bits of address nibbles --
// not enough to span the full 24-bit bus on its own -- so the remaining top byte of the address is
// pinned here rather than left always-zero. This is the "documented transposition": the offset
// nibbles cover bits 15..0 in full (including the low byte), instead of being shifted up into
// bits 23..8 and leaving the true low address byte unreachable.
const GAME_GENIE_BANK: u32 = 0x80;

// Game Genie: 6 letters -> address/data, 8 letters -> address/data/compare.
//
// Nibbles 0-1 give the replacement data byte; nibbles 2-5 give the full 16-bit offset within
// `GAME_GENIE_BANK` (so the offset's low byte, unlike a straight nibble-to-high-bits pack, can be
// any value); the 8-letter form's nibbles 6-7 give the compare byte.
pub fn parse_game_genie(code: &str) -> Result<CheatPatch, CheatError> {
    let len = code.len();
    if len != 6 && len != 8 {
        return Err(CheatError::InvalidLength { len });
    }

    let mut nibbles = [0u8; 8];
    for (i, c) in code.chars().enumerate() {
        nibbles[i] = char_to_nibble(c)?;
    }

    let replacement = (nibbles[0] << 4) | nibbles[1];
    let offset = (u32::from(nibbles[2]) << 12)
        | (u32::from(nibbles[3]) << 8)
        | (u32::from(nibbles[4]) << 4)
        | u32::from(nibbles[5]);
    let address = (GAME_GENIE_BANK << 16) | offset;

    let compare = if len == 8 { Some((nibbles[6] << 4) | nibbles[7]) } else { None };
    Ok(CheatPatch { address, replacement, compare })
}

/// Parse a cheat code in either supported format.
///
/// Pro Action Replay codes are a bare 8 hex-digit string (`AAAAAADD`). Game Genie's alphabet is
/// just the hex digits relabeled, so a bare 8-character code can never be told apart from an
/// Action Replay code by its characters alone; Game Genie codes are written with a hyphen
/// splitting the letters in half (`XXX-XXX` for the 6-letter form, `XXXX-XXXX` for the 8-letter
/// form) to disambiguate. A 6-character code is unambiguous either way, since Action Replay codes
/// are always 8 digits, so the hyphen is optional there.
pub fn parse(code: &str) -> Result<CheatPatch, CheatError> {
    let code = code.trim();

    if let Some(dash) = code.find('-') {
        let mut letters = String::with_capacity(code.len() - 1);
        letters.push_str(&code[..dash]);
        letters.push_str(&code[dash + 1..]);
        return parse_game_genie(&letters);
    }

    match code.len() {
        6 => parse_game_genie(code),
        _ => parse_action_replay(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_replay_basic() {
        let patch = parse_action_replay("80ABCD42").unwrap();
        assert_eq!(patch.address, 0x80ABCD);
        assert_eq!(patch.replacement, 0x42);
        assert_eq!(patch.compare, None);
    }

    #[test]
    fn game_genie_rejects_bad_length() {
        assert!(matches!(parse_game_genie("DFDFD"), Err(CheatError::InvalidLength { len: 5 })));
    }

    #[test]
    fn game_genie_rejects_bad_character() {
        assert!(matches!(parse_game_genie("DFDFDQ"), Err(CheatError::InvalidCharacter('Q'))));
    }

    #[test]
    fn game_genie_six_letter_roundtrips_through_alphabet() {
        // "DDDDDD" is all zero nibbles; the address is still the fixed bank with a zero offset.
        let patch = parse_game_genie("DDDDDD").unwrap();
        assert_eq!(patch.replacement, 0);
        assert_eq!(patch.address, 0x800000);
        assert_eq!(patch.compare, None);
    }

    #[test]
    fn game_genie_eight_letter_sets_compare() {
        let patch = parse_game_genie("DDDDDDFF").unwrap();
        assert_eq!(patch.compare, Some(0x11));
    }

    #[test]
    fn game_genie_offset_covers_low_byte() {
        // nibbles 4-5 select a nonzero low byte (0xDD), which the old bits-23..8 packing
        // could never produce -- the low address byte was always stuck at zero.
        let patch = parse_game_genie("DD4422").unwrap();
        assert_eq!(patch.address & 0xFF, 0xDD);
    }

    #[test]
    fn dash_selects_game_genie_over_action_replay() {
        // "04C8A275" is a valid Action Replay hex string, but with a hyphen it's an 8-letter Game
        // Genie code that decodes to addr=0x80ABCD, data=0x42, compare=0x37 -- the compare branch
        // is unreachable unless `parse` can tell the two formats apart.
        let patch = parse("04C8-A275").unwrap();
        assert_eq!(patch.address, 0x80ABCD);
        assert_eq!(patch.replacement, 0x42);
        assert_eq!(patch.compare, Some(0x37));
    }

    #[test]
    fn no_dash_eight_chars_is_action_replay() {
        let patch = parse("04C8A275").unwrap();
        assert_eq!(patch.compare, None);
        assert_eq!(patch.address, 0x04C8A2);
        assert_eq!(patch.replacement, 0x75);
    }

    #[test]
    fn six_letter_dash_optional() {
        let with_dash = parse("DD4-44D").unwrap();
        let without_dash = parse("DD444D").unwrap();
        assert_eq!(with_dash.address, without_dash.address);
        assert_eq!(with_dash.replacement, without_dash.replacement);
    }
}
