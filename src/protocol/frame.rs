//! Request Framing
//!
//! TCP is a byte stream, so a read may hold half a request or several
//! pipelined ones. The tokenizer works on exactly one request, and this module
//! finds where that request ends inside the connection buffer.
//!
//! Only the headers are inspected here; payload bytes and terminators are left
//! to the tokenizer to validate.

use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::types::prefix;

/// Returns the length of the first complete request in `buf`.
///
/// - `Ok(Some(n))`: the first `n` bytes form one request
/// - `Ok(None)`: more data is needed
/// - `Err(e)`: a header length cannot be read, the buffer cannot be framed
///
/// A request that does not start with `*` is framed up to its first CRLF so
/// the decoder can reject it as a unit. Nested arrays are framed with their
/// parent, for the same reason.
pub fn frame_length(buf: &[u8]) -> ProtocolResult<Option<usize>> {
    if buf.is_empty() {
        return Ok(None);
    }

    if buf[0] != prefix::ARRAY {
        return Ok(find_crlf(buf, 0).map(|end| end + 2));
    }

    let Some((count, mut pos)) = read_length(buf, 1)? else {
        return Ok(None);
    };

    // Elements still to skip. A nested array adds its own count, so the whole
    // request stays one frame without recursing.
    let mut remaining = count;
    while remaining > 0 {
        remaining -= 1;
        if pos >= buf.len() {
            return Ok(None);
        }

        if buf[pos] == prefix::ARRAY {
            let Some((count, start)) = read_length(buf, pos + 1)? else {
                return Ok(None);
            };
            remaining = remaining
                .checked_add(count)
                .ok_or(ProtocolError::InvalidLength { pos: pos + 1 })?;
            pos = start;
        } else if buf[pos] == prefix::BULK_STRING {
            let Some((length, start)) = read_length(buf, pos + 1)? else {
                return Ok(None);
            };
            // payload + CRLF
            let end = start
                .checked_add(length)
                .and_then(|n| n.checked_add(2))
                .ok_or(ProtocolError::InvalidLength { pos })?;
            if end > buf.len() {
                return Ok(None);
            }
            pos = end;
        } else {
            match find_crlf(buf, pos) {
                Some(end) => pos = end + 2,
                None => return Ok(None),
            }
        }
    }

    Ok(Some(pos))
}

/// Reads `<digits>\r\n` starting at `start`. Returns the number and the
/// offset just past the CRLF.
fn read_length(buf: &[u8], start: usize) -> ProtocolResult<Option<(usize, usize)>> {
    let Some(end) = find_crlf(buf, start) else {
        return Ok(None);
    };

    let digits = &buf[start..end];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::InvalidLength { pos: start });
    }

    let length = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or(ProtocolError::InvalidLength { pos: start })?;

    Ok(Some((length, end + 2)))
}

/// Position of the first `\r\n` at or after `from`.
fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_request() {
        let buf = b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n";
        assert_eq!(frame_length(buf), Ok(Some(buf.len())));
    }

    #[test]
    fn test_incomplete_request() {
        let buf = b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n";
        for cut in 0..buf.len() {
            assert_eq!(frame_length(&buf[..cut]), Ok(None), "cut at {}", cut);
        }
    }

    #[test]
    fn test_pipelined_requests() {
        let buf = b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n";
        assert_eq!(frame_length(buf), Ok(Some(14)));
        assert_eq!(frame_length(&buf[14..]), Ok(Some(buf.len() - 14)));
    }

    #[test]
    fn test_payload_containing_crlf() {
        let buf = b"*2\r\n$4\r\nECHO\r\n$4\r\n\r\n\r\n\r\n";
        assert_eq!(frame_length(buf), Ok(Some(buf.len())));
    }

    #[test]
    fn test_short_payload_waits_for_more() {
        // declared 5 bytes, only "HI\r\n" present
        let buf = b"*2\r\n$4\r\nECHO\r\n$5\r\nHI\r\n";
        assert_eq!(frame_length(buf), Ok(None));
    }

    #[test]
    fn test_non_array_is_framed_by_line() {
        assert_eq!(frame_length(b"PING\r\n*1\r\n"), Ok(Some(6)));
        assert_eq!(frame_length(b"PING"), Ok(None));
    }

    #[test]
    fn test_nested_array_is_one_frame() {
        let buf = b"*1\r\n*1\r\n$4\r\nPING\r\n";
        assert_eq!(frame_length(buf), Ok(Some(buf.len())));
        for cut in 0..buf.len() {
            assert_eq!(frame_length(&buf[..cut]), Ok(None), "cut at {}", cut);
        }

        let buf = b"*2\r\n*2\r\n:1\r\n+a\r\n$1\r\nx\r\n*1\r\n";
        assert_eq!(frame_length(buf), Ok(Some(buf.len() - 4)));
    }

    #[test]
    fn test_invalid_header() {
        assert_eq!(
            frame_length(b"*x\r\n"),
            Err(ProtocolError::InvalidLength { pos: 1 })
        );
        assert_eq!(
            frame_length(b"*1\r\n$-1\r\n"),
            Err(ProtocolError::InvalidLength { pos: 5 })
        );
    }
}
