//! Reads exactly one lenient JSON value from a connection.
//!
//! Clients may either close their write side after the request or leave the
//! connection open, so the reader cannot wait for EOF. [`FrameScanner`]
//! tracks bracket depth (skipping strings and comments) and reports the byte
//! that closes a top-level object or array. Bare scalars have no closing
//! delimiter and are only complete at EOF.
//!
//! The framed bytes are then parsed with `jsonc-parser`, which accepts
//! comments, trailing commas, single-quoted strings, and unquoted property
//! names. Unquoted words in value position (`{cmd: echo}`) are quoted
//! beforehand, leaving `true`, `false`, and `null` as literals.

use std::io::{self, Read};

use jsonc_parser::ParseOptions;
use serde_json::Value;
use thiserror::Error;

/// Largest request accepted on a single connection.
pub(crate) const MAX_REQUEST_BYTES: usize = 32 * 1024 * 1024;

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Errors raised while reading a request.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The connection closed before any value was sent.
    #[error("connection closed without a request")]
    Empty,
    /// The request exceeded [`MAX_REQUEST_BYTES`].
    #[error("request exceeds {max_size} byte limit")]
    TooLarge {
        /// Configured limit.
        max_size: usize,
    },
    /// The request bytes are not valid UTF-8.
    #[error("request is not valid UTF-8")]
    NotUtf8,
    /// The request could not be parsed.
    #[error("malformed request: {message}")]
    Malformed {
        /// Parser message.
        message: String,
    },
    /// Reading from the connection failed.
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// Incremental detector for the end of a top-level JSON container.
#[derive(Debug, Default)]
pub(crate) struct FrameScanner {
    depth: usize,
    quote: Option<u8>,
    escaped: bool,
    pending_slash: bool,
    line_comment: bool,
    block_comment: bool,
    block_star: bool,
    scalar: bool,
}

impl FrameScanner {
    /// Feeds `bytes` and returns the index just past the closing bracket of
    /// the top-level value, if it appears in this slice.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Option<usize> {
        bytes
            .iter()
            .position(|&byte| self.step(byte))
            .map(|index| index + 1)
    }

    fn step(&mut self, byte: u8) -> bool {
        if self.line_comment {
            self.line_comment = byte != b'\n';
            return false;
        }
        if self.block_comment {
            if self.block_star && byte == b'/' {
                self.block_comment = false;
            }
            self.block_star = byte == b'*';
            return false;
        }
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == quote {
                self.quote = None;
            }
            return false;
        }
        if self.pending_slash {
            self.pending_slash = false;
            match byte {
                b'/' => {
                    self.line_comment = true;
                    return false;
                }
                b'*' => {
                    self.block_comment = true;
                    self.block_star = false;
                    return false;
                }
                _ => self.mark_scalar(),
            }
        }

        match byte {
            b'/' => self.pending_slash = true,
            b'"' | b'\'' => {
                self.mark_scalar();
                self.quote = Some(byte);
            }
            b'{' | b'[' if !self.scalar => self.depth += 1,
            b'}' | b']' if self.depth > 0 => {
                self.depth -= 1;
                return self.depth == 0;
            }
            byte if byte.is_ascii_whitespace() => {}
            _ => self.mark_scalar(),
        }
        false
    }

    // Content outside any container means a bare scalar, which only EOF ends.
    fn mark_scalar(&mut self) {
        if self.depth == 0 {
            self.scalar = true;
        }
    }
}

/// Reads one request value from `reader`.
///
/// Bytes following a complete top-level object or array are never read.
///
/// # Errors
///
/// Returns [`CodecError`] when the connection is empty, the request is too
/// large or malformed, or reading fails.
pub(crate) fn read_request(reader: &mut impl Read) -> Result<Value, CodecError> {
    let frame = read_frame(reader)?;
    parse_frame(&frame)
}

fn read_frame(reader: &mut impl Read) -> Result<Vec<u8>, CodecError> {
    let mut scanner = FrameScanner::default();
    let mut buffer = Vec::new();
    let mut chunk = vec![0_u8; READ_CHUNK_BYTES];
    loop {
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            return Ok(buffer);
        }
        let received = &chunk[..bytes_read];
        if let Some(end) = scanner.feed(received) {
            buffer.extend_from_slice(&received[..end]);
            enforce_limit(buffer.len())?;
            return Ok(buffer);
        }
        buffer.extend_from_slice(received);
        enforce_limit(buffer.len())?;
    }
}

fn parse_frame(frame: &[u8]) -> Result<Value, CodecError> {
    let text = std::str::from_utf8(frame).map_err(|_| CodecError::NotUtf8)?;
    if text.trim().is_empty() {
        return Err(CodecError::Empty);
    }
    let text = quote_bare_words(text);
    jsonc_parser::parse_to_serde_value(&text, &ParseOptions::default())
        .map_err(|error| CodecError::Malformed {
            message: error.to_string(),
        })?
        .ok_or(CodecError::Empty)
}

const LITERALS: [&str; 3] = ["true", "false", "null"];

/// Wraps every unquoted identifier-like word in double quotes.
///
/// Strings, comments, and numbers (including exponents such as `1e5`) are
/// copied untouched.
fn quote_bare_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => {
                out.push(ch);
                let mut escaped = false;
                for inner in chars.by_ref() {
                    out.push(inner);
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == ch {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                out.push(ch);
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                out.push(ch);
                if let Some(star) = chars.next() {
                    out.push(star);
                }
                let mut star = false;
                for inner in chars.by_ref() {
                    out.push(inner);
                    if star && inner == '/' {
                        break;
                    }
                    star = inner == '*';
                }
            }
            ch if ch.is_ascii_digit() || "+-.".contains(ch) => {
                out.push(ch);
                while let Some(next) = chars.next_if(|&next| !ends_token(next)) {
                    out.push(next);
                }
            }
            ch if ch.is_alphabetic() || ch == '_' || ch == '$' => {
                let mut word = String::from(ch);
                while let Some(next) = chars.next_if(|&next| !ends_token(next)) {
                    word.push(next);
                }
                if LITERALS.contains(&word.as_str()) {
                    out.push_str(&word);
                } else {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn ends_token(ch: char) -> bool {
    ch.is_whitespace() || "{}[]:,'\"/\\".contains(ch)
}

fn read_with_retry(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), CodecError> {
    if size > MAX_REQUEST_BYTES {
        return Err(CodecError::TooLarge {
            max_size: MAX_REQUEST_BYTES,
        });
    }
    Ok(())
}
