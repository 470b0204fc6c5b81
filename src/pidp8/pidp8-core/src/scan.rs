use crate::constants::ROW_MASK;

/// Closed switches pull their column low, so the logical state is the inverted sample
pub fn logical_state(raw: u16) -> u16 {
    !raw & ROW_MASK
}

/// Bits that are set in `next` but were clear in `previous`
pub fn rising_edges(previous: u16, next: u16) -> u16 {
    next & !previous & ROW_MASK
}

/// Collects the level of each column pin into a row word (bit `j` = `columns[j]`)
pub fn gather_columns(levels: u32, columns: &[u8]) -> u16 {
    let mut word = 0;
    for (bit, pin) in columns.iter().enumerate() {
        if levels & (1 << pin) != 0 {
            word |= 1 << bit;
        }
    }
    word
}

/// Spreads a row word onto the column pins (bit `j` -> pin `columns[j]`)
pub fn scatter_columns(word: u16, columns: &[u8]) -> u32 {
    let mut mask = 0;
    for (bit, pin) in columns.iter().enumerate() {
        if word & (1 << bit) != 0 {
            mask |= 1 << pin;
        }
    }
    mask
}

/// Builds a GPIO bitmask from a list of pin numbers
pub fn pin_mask(pins: &[u8]) -> u32 {
    pins.iter().fold(0, |mask, pin| mask | (1 << pin))
}

#[cfg(test)]
mod scan_tests {
    use super::*;

    const COLUMNS: [u8; 12] = [13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 15, 14];

    #[test]
    fn test_logical_state_inverts_and_masks() {
        assert_eq!(logical_state(0o7777), 0);
        assert_eq!(logical_state(0o7776), 0o0001);
        assert_eq!(logical_state(0xFFFF), 0);
        assert_eq!(logical_state(0), 0o7777);
    }

    #[test]
    fn test_rising_edges_only_new_bits() {
        assert_eq!(rising_edges(0, 0o0005), 0o0005);
        assert_eq!(rising_edges(0o0005, 0o0005), 0);
        assert_eq!(rising_edges(0o0005, 0o0004), 0);
        assert_eq!(rising_edges(0o0004, 0o0006), 0o0002);
    }

    #[test]
    fn test_gather_scatter_columns() {
        // column 0 is GPIO 13, column 10 is GPIO 15
        assert_eq!(scatter_columns(0o0001, &COLUMNS), 1 << 13);
        assert_eq!(scatter_columns(1 << 10, &COLUMNS), 1 << 15);
        assert_eq!(gather_columns(1 << 14, &COLUMNS), 1 << 11);
        assert_eq!(gather_columns(pin_mask(&COLUMNS), &COLUMNS), 0o7777);
    }

    #[test]
    fn test_pin_masks_match_wiring() {
        assert_eq!(pin_mask(&COLUMNS), 0x0fff0);
        assert_eq!(pin_mask(&[20, 21, 22, 23, 24, 25, 26, 27]), 0x0ff0_0000);
        assert_eq!(pin_mask(&[16, 17, 18]), 0x0007_0000);
    }
}
