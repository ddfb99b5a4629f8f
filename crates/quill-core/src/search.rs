//! In-buffer find and replace.
//!
//! Search operates over a byte snapshot of the buffer. Literal queries are
//! scanned directly with optional ASCII case folding; regex queries delegate
//! to the `regex` engine over bytes. All matches are non-overlapping and
//! reported with the line/column derived from the snapshot at search time —
//! any later mutation at or before a match invalidates it.

use regex::bytes::{Regex, RegexBuilder};

use crate::error::{CoreError, CoreResult};

/// Options controlling how the finder compares text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    /// Compare bytes exactly instead of ASCII case-insensitively.
    pub case_sensitive: bool,
    /// Treat the needle as a regular expression.
    pub use_regex: bool,
}

/// A located occurrence of a needle in one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Byte offset of the match start.
    pub position: usize,
    /// Byte length of the match.
    pub length: usize,
    /// Zero-based line holding the match start.
    pub line: usize,
    /// Byte offset of the match start since the last newline.
    pub column: usize,
}

fn compile_regex(needle: &[u8], options: SearchOptions) -> CoreResult<Regex> {
    let pattern = std::str::from_utf8(needle)
        .map_err(|_| CoreError::InvalidArgument("regex pattern is not valid UTF-8".into()))?;

    RegexBuilder::new(pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()
        .map_err(|err| CoreError::InvalidArgument(format!("invalid regex: {}", err)))
}

fn matches_at(haystack: &[u8], pos: usize, needle: &[u8], case_sensitive: bool) -> bool {
    let Some(window) = haystack.get(pos..pos + needle.len()) else {
        return false;
    };

    if case_sensitive {
        window == needle
    } else {
        window
            .iter()
            .zip(needle)
            .all(|(a, b)| a.to_ascii_lowercase() == b.to_ascii_lowercase())
    }
}

/// Line and column (bytes since the last newline) of `position`.
pub fn line_col_at(haystack: &[u8], position: usize) -> (usize, usize) {
    let mut line = 0usize;
    let mut line_start = 0usize;
    for (i, &byte) in haystack.iter().take(position).enumerate() {
        if byte == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, position - line_start)
}

/// All non-overlapping matches of `needle`, in ascending position order.
///
/// An empty needle yields no matches.
pub fn find_all(
    haystack: &[u8],
    needle: &[u8],
    options: SearchOptions,
) -> CoreResult<Vec<SearchMatch>> {
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    if options.use_regex {
        return find_all_regex(haystack, needle, options);
    }

    let mut matches = Vec::new();
    let mut line = 0usize;
    let mut line_start = 0usize;
    let mut pos = 0usize;

    while pos < haystack.len() {
        if matches_at(haystack, pos, needle, options.case_sensitive) {
            matches.push(SearchMatch {
                position: pos,
                length: needle.len(),
                line,
                column: pos - line_start,
            });

            let end = pos + needle.len();
            while pos < end {
                if haystack[pos] == b'\n' {
                    line += 1;
                    line_start = pos + 1;
                }
                pos += 1;
            }
        } else {
            if haystack[pos] == b'\n' {
                line += 1;
                line_start = pos + 1;
            }
            pos += 1;
        }
    }

    Ok(matches)
}

fn find_all_regex(
    haystack: &[u8],
    needle: &[u8],
    options: SearchOptions,
) -> CoreResult<Vec<SearchMatch>> {
    let re = compile_regex(needle, options)?;

    let mut matches = Vec::new();
    for m in re.find_iter(haystack) {
        if m.start() == m.end() {
            continue;
        }
        let (line, column) = line_col_at(haystack, m.start());
        matches.push(SearchMatch {
            position: m.start(),
            length: m.end() - m.start(),
            line,
            column,
        });
    }

    Ok(matches)
}

/// The first match at or after `start_pos`, if any.
pub fn find_next(
    haystack: &[u8],
    needle: &[u8],
    start_pos: usize,
    options: SearchOptions,
) -> CoreResult<Option<SearchMatch>> {
    if needle.is_empty() {
        return Ok(None);
    }

    if options.use_regex {
        let re = compile_regex(needle, options)?;
        let mut from = start_pos.min(haystack.len());
        loop {
            let Some(m) = re.find_at(haystack, from) else {
                return Ok(None);
            };
            if m.start() == m.end() {
                if m.end() >= haystack.len() {
                    return Ok(None);
                }
                from = m.end() + 1;
                continue;
            }
            let (line, column) = line_col_at(haystack, m.start());
            return Ok(Some(SearchMatch {
                position: m.start(),
                length: m.end() - m.start(),
                line,
                column,
            }));
        }
    }

    for pos in start_pos..haystack.len() {
        if matches_at(haystack, pos, needle, options.case_sensitive) {
            let (line, column) = line_col_at(haystack, pos);
            return Ok(Some(SearchMatch {
                position: pos,
                length: needle.len(),
                line,
                column,
            }));
        }
    }

    Ok(None)
}

/// The highest-offset match starting in `[0, start_pos)`, if any.
pub fn find_previous(
    haystack: &[u8],
    needle: &[u8],
    start_pos: usize,
    options: SearchOptions,
) -> CoreResult<Option<SearchMatch>> {
    if needle.is_empty() || start_pos == 0 {
        return Ok(None);
    }

    if options.use_regex {
        let re = compile_regex(needle, options)?;
        let mut last = None;
        for m in re.find_iter(haystack) {
            if m.start() >= start_pos {
                break;
            }
            if m.start() == m.end() {
                continue;
            }
            last = Some(m);
        }
        return Ok(last.map(|m| {
            let (line, column) = line_col_at(haystack, m.start());
            SearchMatch {
                position: m.start(),
                length: m.end() - m.start(),
                line,
                column,
            }
        }));
    }

    let mut pos = start_pos.min(haystack.len());
    while pos > 0 {
        pos -= 1;
        if matches_at(haystack, pos, needle, options.case_sensitive) {
            let (line, column) = line_col_at(haystack, pos);
            return Ok(Some(SearchMatch {
                position: pos,
                length: needle.len(),
                line,
                column,
            }));
        }
    }

    Ok(None)
}

/// Replace the bytes covered by `m` with `replacement`, returning the new
/// haystack.
pub fn replace_current(
    haystack: &[u8],
    m: &SearchMatch,
    replacement: &[u8],
) -> CoreResult<Vec<u8>> {
    let end = m
        .position
        .checked_add(m.length)
        .filter(|&end| end <= haystack.len())
        .ok_or(CoreError::OutOfRange {
            position: m.position + m.length,
            length: haystack.len(),
        })?;

    let mut out = Vec::with_capacity(haystack.len() - m.length + replacement.len());
    out.extend_from_slice(&haystack[..m.position]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&haystack[end..]);
    Ok(out)
}

/// Replace every non-overlapping occurrence of `needle` left to right.
///
/// The scan resumes after each inserted replacement, so a replacement that
/// contains the needle does not cascade. Returns the rewritten haystack and
/// the number of replacements.
pub fn replace_all(
    haystack: &[u8],
    needle: &[u8],
    replacement: &[u8],
    options: SearchOptions,
) -> CoreResult<(Vec<u8>, usize)> {
    if needle.is_empty() {
        return Ok((haystack.to_vec(), 0));
    }

    if options.use_regex {
        let matches = find_all_regex(haystack, needle, options)?;
        let mut out = Vec::with_capacity(haystack.len());
        let mut cursor = 0usize;
        for m in &matches {
            out.extend_from_slice(&haystack[cursor..m.position]);
            out.extend_from_slice(replacement);
            cursor = m.position + m.length;
        }
        out.extend_from_slice(&haystack[cursor..]);
        return Ok((out, matches.len()));
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut count = 0usize;
    let mut pos = 0usize;

    while pos < haystack.len() {
        if matches_at(haystack, pos, needle, options.case_sensitive) {
            out.extend_from_slice(replacement);
            pos += needle.len();
            count += 1;
        } else {
            out.push(haystack[pos]);
            pos += 1;
        }
    }

    Ok((out, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensitive() -> SearchOptions {
        SearchOptions {
            case_sensitive: true,
            use_regex: false,
        }
    }

    #[test]
    fn test_find_all_positions_and_lines() {
        let matches = find_all(b"Hello, world!", b"o", sensitive()).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].position, matches[0].length), (4, 1));
        assert_eq!((matches[1].position, matches[1].length), (8, 1));
    }

    #[test]
    fn test_find_all_line_column() {
        let matches = find_all(b"ab\ncdab\nab", b"ab", sensitive()).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!((matches[0].line, matches[0].column), (0, 0));
        assert_eq!((matches[1].line, matches[1].column), (1, 2));
        assert_eq!((matches[2].line, matches[2].column), (2, 0));
    }

    #[test]
    fn test_find_all_non_overlapping() {
        let matches = find_all(b"aaaa", b"aa", sensitive()).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].position, 0);
        assert_eq!(matches[1].position, 2);
    }

    #[test]
    fn test_empty_needle_matches_nothing() {
        assert!(find_all(b"abc", b"", sensitive()).unwrap().is_empty());
        assert!(find_next(b"abc", b"", 0, sensitive()).unwrap().is_none());
        assert!(find_previous(b"abc", b"", 3, sensitive()).unwrap().is_none());
    }

    #[test]
    fn test_case_insensitive() {
        let options = SearchOptions::default();
        let matches = find_all(b"Foo foo FOO", b"foo", options).unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_find_next_from_position() {
        let m = find_next(b"ab ab ab", b"ab", 1, sensitive())
            .unwrap()
            .unwrap();
        assert_eq!(m.position, 3);
        assert!(find_next(b"ab ab ab", b"ab", 7, sensitive()).unwrap().is_none());
    }

    #[test]
    fn test_find_previous_highest_before_start() {
        let m = find_previous(b"ab ab ab", b"ab", 6, sensitive())
            .unwrap()
            .unwrap();
        assert_eq!(m.position, 3);
        assert!(find_previous(b"ab ab ab", b"ab", 0, sensitive()).unwrap().is_none());
    }

    #[test]
    fn test_replace_current() {
        let matches = find_all(b"one two one", b"two", sensitive()).unwrap();
        let out = replace_current(b"one two one", &matches[0], b"2").unwrap();
        assert_eq!(out, b"one 2 one");
    }

    #[test]
    fn test_replace_all_counts() {
        let (out, count) = replace_all(b"Hello, world!", b"o", b"0", sensitive()).unwrap();
        assert_eq!(out, b"Hell0, w0rld!");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_replace_all_no_cascade() {
        // Replacement contains the needle; the cursor skips past it.
        let (out, count) = replace_all(b"aa", b"a", b"aa", sensitive()).unwrap();
        assert_eq!(out, b"aaaa");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_replace_all_zero_matches_identity() {
        let (out, count) = replace_all(b"abc", b"zz", b"q", sensitive()).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_regex_mode() {
        let options = SearchOptions {
            case_sensitive: true,
            use_regex: true,
        };
        let matches = find_all(b"x1 y22 z333", br"\d+", options).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[2].position, 8);
        assert_eq!(matches[2].length, 3);
    }

    #[test]
    fn test_regex_invalid_pattern_rejected() {
        let options = SearchOptions {
            case_sensitive: true,
            use_regex: true,
        };
        assert!(matches!(
            find_all(b"abc", b"(", options),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_line_col_at() {
        assert_eq!(line_col_at(b"ab\ncd", 0), (0, 0));
        assert_eq!(line_col_at(b"ab\ncd", 4), (1, 1));
    }
}
