//! RouterOS API wire framing.
//!
//! The RouterOS binary API exchanges *sentences*: sequences of words, each
//! prefixed with a variable-length byte count, terminated by a zero-length
//! word. This module implements the length encoding and sentence I/O on top
//! of any async byte stream.
//!
//! # Length prefix encoding
//!
//! The number of payload bytes in a word is encoded in 1-5 prefix bytes,
//! with the high bits of the first byte indicating the width:
//!
//! | Length range        | Encoding                          |
//! |---------------------|-----------------------------------|
//! | 0x00..=0x7F         | 1 byte, as-is                     |
//! | 0x80..=0x3FFF       | 2 bytes, ORed with 0x8000         |
//! | 0x4000..=0x1FFFFF   | 3 bytes, ORed with 0xC00000       |
//! | 0x200000..=0xFFFFFFF| 4 bytes, ORed with 0xE0000000     |
//! | larger              | 0xF0 marker, then u32 big-endian  |

use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::MikrotikWifiError;

/// Upper bound on a single word accepted from the router. Anything larger
/// than this is a corrupt stream, not a legitimate reply.
const MAX_WORD_LEN: u32 = 4 * 1024 * 1024;

/// Encodes a word length prefix into `buf`.
pub fn encode_length(len: u32, buf: &mut Vec<u8>) {
    if len < 0x80 {
        buf.push(len as u8);
    } else if len < 0x4000 {
        buf.extend_from_slice(&(len | 0x8000).to_be_bytes()[2..]);
    } else if len < 0x20_0000 {
        buf.extend_from_slice(&(len | 0xC0_0000).to_be_bytes()[1..]);
    } else if len < 0x1000_0000 {
        buf.extend_from_slice(&(len | 0xE000_0000).to_be_bytes());
    } else {
        buf.push(0xF0);
        buf.extend_from_slice(&len.to_be_bytes());
    }
}

/// Reads a word length prefix from the stream.
pub async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32> {
    let first = reader.read_u8().await?;

    let len = if first < 0x80 {
        u32::from(first)
    } else if first & 0xC0 == 0x80 {
        let b = reader.read_u8().await?;
        (u32::from(first & 0x3F) << 8) | u32::from(b)
    } else if first & 0xE0 == 0xC0 {
        let mut rest = [0u8; 2];
        reader.read_exact(&mut rest).await?;
        (u32::from(first & 0x1F) << 16) | (u32::from(rest[0]) << 8) | u32::from(rest[1])
    } else if first & 0xF0 == 0xE0 {
        let mut rest = [0u8; 3];
        reader.read_exact(&mut rest).await?;
        (u32::from(first & 0x0F) << 24)
            | (u32::from(rest[0]) << 16)
            | (u32::from(rest[1]) << 8)
            | u32::from(rest[2])
    } else if first == 0xF0 {
        let mut rest = [0u8; 4];
        reader.read_exact(&mut rest).await?;
        u32::from_be_bytes(rest)
    } else {
        // 0xF1..=0xFF are reserved control bytes.
        return Err(MikrotikWifiError::Protocol(format!(
            "reserved length prefix byte 0x{first:02X}"
        ))
        .into());
    };

    if len > MAX_WORD_LEN {
        return Err(MikrotikWifiError::WordTooLong(len as usize).into());
    }

    Ok(len)
}

/// Writes one sentence: every word with its length prefix, then the
/// zero-length terminator. Flushes the stream so the router sees the
/// complete command.
pub async fn write_sentence<W: AsyncWrite + Unpin>(writer: &mut W, words: &[String]) -> Result<()> {
    let mut buf = Vec::new();
    for word in words {
        let len = u32::try_from(word.len())
            .map_err(|_| MikrotikWifiError::WordTooLong(word.len()))?;
        encode_length(len, &mut buf);
        buf.extend_from_slice(word.as_bytes());
    }
    buf.push(0); // sentence terminator
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one sentence, stopping at the zero-length terminator word.
pub async fn read_sentence<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let len = read_length(reader).await?;
        if len == 0 {
            return Ok(words);
        }
        let mut word = vec![0u8; len as usize];
        reader.read_exact(&mut word).await?;
        words.push(String::from_utf8_lossy(&word).into_owned());
    }
}

/// Splits an attribute word of the form `=key=value` into its parts.
/// Returns `None` for words that are not attributes (reply markers,
/// query words).
pub fn parse_attribute(word: &str) -> Option<(&str, &str)> {
    let rest = word.strip_prefix('=')?;
    let (key, value) = rest.split_once('=')?;
    Some((key, value))
}
