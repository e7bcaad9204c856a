#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    Invalid,
    Unsatisfiable,
}

/// Parses a `bytes=start-end` header against a resource of `size` bytes.
/// `end` is optional and defaults to the final byte. Any bound at or past
/// `size` is unsatisfiable; malformed values (suffix form, multiple ranges,
/// reversed or non-numeric bounds) are invalid and callers fall back to the
/// full representation.
pub fn parse_range_header(value: &str, size: u64) -> Result<ByteRange, RangeError> {
    let value = value.trim();
    if !value.starts_with("bytes=") {
        return Err(RangeError::Invalid);
    }

    if size == 0 {
        return Err(RangeError::Unsatisfiable);
    }

    let range = &value[6..];
    if range.contains(',') {
        return Err(RangeError::Invalid);
    }

    let mut parts = range.splitn(2, '-');
    let start_str = parts.next().unwrap_or("");
    let end_str = parts.next().unwrap_or("");
    if start_str.is_empty() {
        return Err(RangeError::Invalid);
    }

    let start: u64 = start_str.parse().map_err(|_| RangeError::Invalid)?;
    if start >= size {
        return Err(RangeError::Unsatisfiable);
    }

    let end = if end_str.is_empty() {
        size - 1
    } else {
        let end: u64 = end_str.parse().map_err(|_| RangeError::Invalid)?;
        if end < start {
            return Err(RangeError::Invalid);
        }
        if end >= size {
            return Err(RangeError::Unsatisfiable);
        }
        end
    };

    Ok(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::{parse_range_header, ByteRange, RangeError};

    #[test]
    fn parses_open_ended_range() {
        let range = parse_range_header("bytes=0-", 100).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn parses_closed_range() {
        let range = parse_range_header("bytes=10-19", 100).unwrap();
        assert_eq!(range, ByteRange { start: 10, end: 19 });
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn rejects_end_past_resource() {
        let err = parse_range_header("bytes=90-200", 100).unwrap_err();
        assert_eq!(err, RangeError::Unsatisfiable);
    }

    #[test]
    fn rejects_start_past_resource() {
        let err = parse_range_header("bytes=100-", 100).unwrap_err();
        assert_eq!(err, RangeError::Unsatisfiable);
    }

    #[test]
    fn rejects_suffix_range() {
        let err = parse_range_header("bytes=-10", 100).unwrap_err();
        assert_eq!(err, RangeError::Invalid);
    }

    #[test]
    fn rejects_multiple_ranges() {
        let err = parse_range_header("bytes=0-1,2-3", 100).unwrap_err();
        assert_eq!(err, RangeError::Invalid);
    }

    #[test]
    fn rejects_reversed_range() {
        let err = parse_range_header("bytes=10-5", 100).unwrap_err();
        assert_eq!(err, RangeError::Invalid);
    }

    #[test]
    fn rejects_other_units() {
        let err = parse_range_header("items=0-1", 100).unwrap_err();
        assert_eq!(err, RangeError::Invalid);
    }

    #[test]
    fn empty_resource_is_unsatisfiable() {
        let err = parse_range_header("bytes=0-", 0).unwrap_err();
        assert_eq!(err, RangeError::Unsatisfiable);
    }

    #[test]
    fn final_byte_is_reachable() {
        let range = parse_range_header("bytes=99-99", 100).unwrap();
        assert_eq!(range, ByteRange { start: 99, end: 99 });
        assert_eq!(range.len(), 1);
    }
}
