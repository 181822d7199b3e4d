//! Array assembly: chunk bookkeeping and streaming content validation.
//!
//! An array arrives as a begin event, then one or more chunk headers each
//! followed by data events that fill exactly the declared chunk length. The
//! [`ArrayState`] here tracks one array in flight; [`Utf8Validator`] checks
//! text content as it streams, carrying partial code points across data
//! event boundaries.

use crate::{ArrayType, Error, Result};

/// Why the array is being read, which decides how its content is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArrayRole {
    Data,
    /// Content names a marker or reference and is kept for resolution.
    Identifier,
    MarkupName,
    /// Text inside a comment, subject to the comment character blacklist.
    Comment,
}

/// Streaming UTF-8 checker tolerant of code points split across chunks.
#[derive(Debug, Default)]
pub(crate) struct Utf8Validator {
    pending: [u8; 4],
    pending_len: usize,
}

impl Utf8Validator {
    pub fn reset(&mut self) {
        self.pending_len = 0;
    }

    /// Validates `bytes`, calling `on_char` for every completed code point.
    pub fn feed<F>(&mut self, mut bytes: &[u8], context: &'static str, mut on_char: F) -> Result<()>
    where
        F: FnMut(char) -> Result<()>,
    {
        // Finish a code point left over from the previous data event first.
        while self.pending_len > 0 && !bytes.is_empty() {
            self.pending[self.pending_len] = bytes[0];
            self.pending_len += 1;
            bytes = &bytes[1..];
            match std::str::from_utf8(&self.pending[..self.pending_len]) {
                Ok(s) => {
                    self.pending_len = 0;
                    s.chars().try_for_each(&mut on_char)?;
                }
                Err(e) if e.error_len().is_some() || self.pending_len == 4 => {
                    return Err(Error::InvalidUtf8 { context });
                }
                Err(_) => {}
            }
        }

        match std::str::from_utf8(bytes) {
            Ok(s) => s.chars().try_for_each(on_char),
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to guarantees this prefix decodes.
                if let Ok(s) = std::str::from_utf8(valid) {
                    s.chars().try_for_each(&mut on_char)?;
                }
                if e.error_len().is_some() {
                    return Err(Error::InvalidUtf8 { context });
                }
                self.pending[..rest.len()].copy_from_slice(rest);
                self.pending_len = rest.len();
                Ok(())
            }
        }
    }

    /// Fails if the content ended partway through a code point.
    pub fn finish(&mut self, context: &'static str) -> Result<()> {
        if self.pending_len > 0 {
            self.pending_len = 0;
            return Err(Error::InvalidUtf8 { context });
        }
        Ok(())
    }
}

/// Characters that may not appear inside comment text.
///
/// Tab, line feed and carriage return are the only permitted control
/// characters.
pub(crate) fn is_disallowed_comment_char(ch: char) -> bool {
    match ch {
        '\t' | '\n' | '\r' => false,
        '\u{00}'..='\u{1f}' | '\u{7f}'..='\u{9f}' => true,
        '\u{2028}' | '\u{2029}' => true,
        _ => false,
    }
}

/// Bookkeeping for the array currently being received.
#[derive(Debug)]
pub(crate) struct ArrayState {
    pub kind: ArrayType,
    pub role: ArrayRole,
    pub max_length: usize,
    /// Bytes declared by all chunk headers so far.
    pub declared: usize,
    pub chunk_length: usize,
    pub chunk_consumed: usize,
    pub is_final_chunk: bool,
    utf8: Utf8Validator,
    /// Accumulated content, kept only for identifiers.
    content: Vec<u8>,
}

impl ArrayState {
    pub fn new(kind: ArrayType, role: ArrayRole, max_length: usize) -> Self {
        ArrayState {
            kind,
            role,
            max_length,
            declared: 0,
            chunk_length: 0,
            chunk_consumed: 0,
            is_final_chunk: false,
            utf8: Utf8Validator::default(),
            content: Vec::new(),
        }
    }

    fn context(&self) -> &'static str {
        match (self.role, self.kind) {
            (ArrayRole::Comment, _) => "comment",
            (_, ArrayType::Uri) => "URI",
            _ => "string",
        }
    }

    /// Accepts a chunk header, enforcing the cumulative length limit.
    pub fn begin_chunk(&mut self, length: usize, is_final: bool) -> Result<()> {
        let total = self.declared.saturating_add(length);
        if total > self.max_length {
            return Err(match self.role {
                ArrayRole::Identifier if self.kind == ArrayType::String => {
                    Error::IdentifierLengthExceeded {
                        length: total,
                        max: self.max_length,
                    }
                }
                ArrayRole::MarkupName => Error::MarkupNameLengthExceeded {
                    length: total,
                    max: self.max_length,
                },
                _ => Error::ArrayLengthExceeded {
                    kind: self.kind,
                    length: total,
                    max: self.max_length,
                },
            });
        }
        self.declared = total;
        self.chunk_length = length;
        self.chunk_consumed = 0;
        self.is_final_chunk = is_final;
        Ok(())
    }

    /// Accepts data for the current chunk.
    pub fn add_data(&mut self, data: &[u8]) -> Result<()> {
        let remaining = self.chunk_length - self.chunk_consumed;
        if data.len() > remaining {
            return Err(Error::ChunkLengthExceeded {
                length: data.len(),
                remaining,
            });
        }

        if self.kind.is_text() {
            let context = self.context();
            let is_comment = self.role == ArrayRole::Comment;
            self.utf8.feed(data, context, |ch| {
                if is_comment && is_disallowed_comment_char(ch) {
                    return Err(Error::InvalidCharacter {
                        character: ch,
                        context,
                    });
                }
                Ok(())
            })?;
        }

        if self.role == ArrayRole::Identifier {
            self.content.extend_from_slice(data);
        }
        self.chunk_consumed += data.len();
        Ok(())
    }

    pub fn is_chunk_complete(&self) -> bool {
        self.chunk_consumed == self.chunk_length
    }

    /// Returns `true` once the final chunk has been completely received.
    pub fn is_complete(&self) -> bool {
        self.is_final_chunk && self.is_chunk_complete()
    }

    /// Finishes the array, returning identifier content if it was kept.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.kind.is_text() {
            let context = self.context();
            self.utf8.finish(context)?;
        }
        Ok(self.content)
    }
}
