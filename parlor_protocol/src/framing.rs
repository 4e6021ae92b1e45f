// Length-delimited message framing over TCP.
//
// Wire format: a 4-byte big-endian length prefix, then a JSON payload.
// Both helpers operate on raw bytes — JSON encoding is the caller's
// business, which keeps this module format-agnostic and usable with any
// `Read`/`Write` (blocking sockets, buffered wrappers, in-memory cursors
// in tests).
//
// `MAX_MESSAGE_SIZE` bounds allocation against malformed or malicious
// length prefixes. Even a state snapshot for the largest allowed
// tic-tac-toe board is a few kilobytes of JSON; 1 MB is generous headroom.

use std::io::{self, Read, Write};

/// Maximum allowed message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

/// Write one length-delimited message: 4-byte big-endian length, payload.
pub fn write_message<W: Write>(writer: &mut W, msg: &[u8]) -> io::Result<()> {
    let len = u32::try_from(msg.len())
        .ok()
        .filter(|len| *len <= MAX_MESSAGE_SIZE)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("message too large: {} bytes (max {MAX_MESSAGE_SIZE})", msg.len()),
            )
        })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(msg)?;
    writer.flush()
}

/// Read one length-delimited message.
///
/// Returns `UnexpectedEof` if the stream closes before or during a
/// message, `InvalidData` if the length exceeds `MAX_MESSAGE_SIZE`.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn roundtrip_single_message() {
        let payload = br#"{"Reset":null}"#;
        let mut wire = Vec::new();
        write_message(&mut wire, payload).unwrap();

        let mut cursor = Cursor::new(&wire);
        assert_eq!(read_message(&mut cursor).unwrap(), payload);
    }

    #[test]
    fn roundtrip_back_to_back_messages() {
        let payloads: [&[u8]; 3] = [b"one", b"", b"three"];
        let mut wire = Vec::new();
        for payload in payloads {
            write_message(&mut wire, payload).unwrap();
        }

        let mut cursor = Cursor::new(&wire);
        for payload in payloads {
            assert_eq!(read_message(&mut cursor).unwrap(), payload);
        }
    }

    #[test]
    fn write_rejects_oversized_payload() {
        let huge = vec![0u8; MAX_MESSAGE_SIZE as usize + 1];
        let mut wire = Vec::new();
        let err = write_message(&mut wire, &huge).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(wire.is_empty(), "nothing may reach the wire");
    }

    #[test]
    fn read_rejects_oversized_length_prefix() {
        let prefix = (MAX_MESSAGE_SIZE + 1).to_be_bytes();
        let mut cursor = Cursor::new(prefix.to_vec());
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_reports_truncated_streams_as_eof() {
        // Half a length prefix.
        let mut cursor = Cursor::new(vec![0u8, 0]);
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        // A full prefix promising more bytes than follow.
        let mut wire = 8u32.to_be_bytes().to_vec();
        wire.extend_from_slice(b"abc");
        let mut cursor = Cursor::new(wire);
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
