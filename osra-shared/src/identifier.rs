//! OSRA number formatting.

/// Minimum number of digits in the sequence part of an OSRA number.
pub const DEFAULT_OSRA_NUM_WIDTH: usize = 5;

/// Build an OSRA number from a province code and a sequence number.
///
/// The sequence is zero-padded to `width` digits. Longer sequences are kept whole.
///
/// # Example
///
/// ```
/// use osra_shared::{format_osra_num, DEFAULT_OSRA_NUM_WIDTH};
///
/// assert_eq!(format_osra_num("KR", 42, DEFAULT_OSRA_NUM_WIDTH), "KR00042");
/// assert_eq!(format_osra_num("KR", 123456, DEFAULT_OSRA_NUM_WIDTH), "KR123456");
/// ```
pub fn format_osra_num(province_code: &str, sequence: i64, width: usize) -> String {
    format!("{}{:0width$}", province_code, sequence, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_to_width() {
        assert_eq!(format_osra_num("KR", 7, DEFAULT_OSRA_NUM_WIDTH), "KR00007");
        assert_eq!(format_osra_num("KR", 99999, DEFAULT_OSRA_NUM_WIDTH), "KR99999");
    }

    #[test]
    fn test_does_not_truncate() {
        assert_eq!(format_osra_num("KR", 123456, DEFAULT_OSRA_NUM_WIDTH), "KR123456");
    }

    #[test]
    fn test_empty_province_code() {
        assert_eq!(format_osra_num("", 1, DEFAULT_OSRA_NUM_WIDTH), "00001");
    }

    #[test]
    fn test_custom_width() {
        assert_eq!(format_osra_num("11", 3, 3), "11003");
    }
}
