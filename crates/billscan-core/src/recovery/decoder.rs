//! Shift-cipher decoder for corrupted statement text.
//!
//! Corrupted documents store every glyph of the 7-bit printable band
//! 29 positions lower than its real code, wrapping around the band.
//! Decoding adds the offset back and wraps anything past `~`.

use crate::pdf::{RawLine, RawPage};

/// Offset added to every raw character code.
pub const SHIFT: u32 = 29;

/// Highest printable ASCII code.
pub const PRINTABLE_CEILING: u32 = 126;

/// Size of the printable ASCII band (space through `~`).
pub const PRINTABLE_SPAN: u32 = 95;

const PRINTABLE_FLOOR: u32 = PRINTABLE_CEILING + 1 - PRINTABLE_SPAN;

/// Apply the decoding shift to one character code.
pub fn shift_code(code: u32) -> u32 {
    let shifted = code.saturating_add(SHIFT);
    if shifted > PRINTABLE_CEILING {
        shifted - PRINTABLE_SPAN
    } else {
        shifted
    }
}

/// Decode a sequence of raw character codes.
pub fn decode_codes<I: IntoIterator<Item = u32>>(codes: I) -> String {
    codes
        .into_iter()
        .map(|code| char::from_u32(shift_code(code)).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode one raw line; spans are concatenated without separators.
pub fn decode_line(line: &RawLine) -> String {
    decode_codes(line.chars().map(|rc| rc.code))
}

/// Decode a page, one output line per source line, blocks in stream order.
pub fn decode_page(page: &RawPage) -> String {
    page.blocks
        .iter()
        .flat_map(|block| block.lines.iter())
        .map(decode_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode every page and join them with newlines.
pub fn decode(pages: &[RawPage]) -> String {
    pages.iter().map(decode_page).collect::<Vec<_>>().join("\n")
}

/// Apply the corruption to printable ASCII text; other characters pass
/// through unchanged. `decode_codes` inverts this for printable input.
pub fn garble(text: &str) -> String {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if !(PRINTABLE_FLOOR..=PRINTABLE_CEILING).contains(&code) {
                return c;
            }
            let mut garbled = code - SHIFT;
            if garbled < PRINTABLE_FLOOR {
                garbled += PRINTABLE_SPAN;
            }
            char::from_u32(garbled).unwrap_or(c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{RawBlock, RawChar, RawSpan};

    fn raw_line(text: &str) -> RawLine {
        RawLine {
            spans: vec![RawSpan {
                chars: text.chars().map(|c| RawChar::from_code(c as u32)).collect(),
            }],
        }
    }

    #[test]
    fn test_shift_without_wrap() {
        assert_eq!(shift_code(65), 94);
        assert_eq!(shift_code(3), 32);
    }

    #[test]
    fn test_shift_wraps_past_ceiling() {
        assert_eq!(shift_code(100), 34);
        assert_eq!(shift_code(97), 126);
        assert_eq!(shift_code(98), 32);
    }

    #[test]
    fn test_round_trip_printable_text() {
        let plain = "GAS DELIVERY CHARGE $41.23 ~ Total therms used 87 {x}";
        let garbled = garble(plain);

        assert_ne!(garbled, plain);
        assert_eq!(decode_line(&raw_line(&garbled)), plain);
    }

    #[test]
    fn test_decode_page_keeps_line_boundaries() {
        let page = RawPage {
            blocks: vec![
                RawBlock {
                    lines: vec![raw_line(&garble("Delivery Services")), raw_line(&garble("$12.50"))],
                },
                RawBlock {
                    lines: vec![raw_line(&garble("Total therms used 64"))],
                },
            ],
        };

        assert_eq!(
            decode(&[page.clone(), page]),
            "Delivery Services\n$12.50\nTotal therms used 64\nDelivery Services\n$12.50\nTotal therms used 64"
        );
    }

    #[test]
    fn test_decode_never_fails() {
        let decoded = decode_codes([0xD7E3, 0, 200]);
        assert_eq!(decoded.chars().count(), 3);
    }
}
