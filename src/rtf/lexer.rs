//! RTF lexer.
//!
//! Tokenizes raw RTF bytes lazily: the lexer is an iterator yielding one
//! token at a time, borrowing plain text straight from the input where it
//! can and allocating decoded text in an arena. Byte-level escapes are
//! resolved here so downstream code only ever sees text: `\'XX` sequences
//! decode through the active code page (adjoining escapes together, so
//! multi-byte encodings survive), `\uN` applies the current `\uc` skip
//! count, and `\binN` consumes exactly N raw bytes no matter what they
//! contain.

use std::borrow::Cow;

use bumpalo::Bump;
use encoding_rs::{Encoding, WINDOWS_1252};
use memchr::memchr3;
use smallvec::SmallVec;
use tracing::debug;

use super::error::{RtfError, RtfResult};
use crate::common::encoding::codepage_to_encoding;

/// A control word with its optional signed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlWord<'a> {
    pub name: &'a str,
    pub param: Option<i32>,
}

impl ControlWord<'_> {
    /// Parameter value, 1 when absent (the RTF convention).
    pub fn value(&self) -> i32 {
        self.param.unwrap_or(1)
    }

    /// Toggle parameter: absent or nonzero means on.
    pub fn flag(&self) -> bool {
        self.param.unwrap_or(1) != 0
    }
}

/// One lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    GroupStart,
    GroupEnd,
    Control(ControlWord<'a>),
    /// A control symbol the lexer does not resolve itself, e.g. `\*`.
    Symbol(u8),
    /// Decoded text. May be empty; consumers skip empty tokens.
    Text(&'a str),
    /// Raw bytes taken verbatim by `\binN`.
    Binary(&'a [u8]),
}

/// Lazy tokenizer over raw RTF bytes.
///
/// Yields `RtfResult<Token>`: the only error it emits mid-stream is
/// [`RtfError::UnbalancedGroup`] when a group end has no matching start,
/// after which the iterator is exhausted.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    depth: u32,
    encoding: &'static Encoding,
    /// Current `\uc` skip count per open group.
    uc_stack: SmallVec<[i32; 8]>,
    pending_surrogate: Option<u16>,
    arena: &'a Bump,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8], arena: &'a Bump) -> Self {
        let mut uc_stack = SmallVec::new();
        uc_stack.push(1);
        Self {
            input,
            pos: 0,
            depth: 0,
            encoding: WINDOWS_1252,
            uc_stack,
            pending_surrogate: None,
            arena,
            done: false,
        }
    }

    /// The code page the lexer is currently decoding with.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn control(&mut self) -> RtfResult<Token<'a>> {
        self.pos += 1;
        let Some(&byte) = self.input.get(self.pos) else {
            debug!("input ends with a bare backslash");
            return Ok(Token::Text(""));
        };
        if byte.is_ascii_alphabetic() {
            return self.control_word();
        }
        self.pos += 1;
        match byte {
            b'\\' | b'{' | b'}' => Ok(Token::Text(ascii_str(
                &self.input[self.pos - 1..self.pos],
            ))),
            b'\'' => self.hex_run(),
            b'*' => Ok(Token::Symbol(b'*')),
            b'~' => Ok(Token::Text("\u{a0}")),
            b'-' => Ok(Token::Text("\u{ad}")),
            b'_' => Ok(Token::Text("\u{2011}")),
            b'\r' | b'\n' => {
                // A backslash followed by a line break stands for \par.
                if byte == b'\r' && self.input.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
                Ok(Token::Control(ControlWord {
                    name: "par",
                    param: None,
                }))
            }
            other => Ok(Token::Symbol(other)),
        }
    }

    fn control_word(&mut self) -> RtfResult<Token<'a>> {
        let start = self.pos;
        while self
            .input
            .get(self.pos)
            .is_some_and(u8::is_ascii_alphabetic)
        {
            self.pos += 1;
        }
        let name = ascii_str(&self.input[start..self.pos]);
        let param = self.numeric_parameter();
        // One space directly after a control word is its delimiter.
        if self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
        match name {
            "bin" => return self.binary(param),
            "u" => return self.unicode_char(param),
            "uc" => {
                if let Some(top) = self.uc_stack.last_mut() {
                    *top = param.unwrap_or(1).max(0);
                }
            }
            "ansicpg" => {
                let encoding = param
                    .and_then(|cp| u32::try_from(cp).ok())
                    .and_then(codepage_to_encoding);
                match encoding {
                    Some(encoding) => self.encoding = encoding,
                    None => debug!(
                        "unknown code page {:?}, keeping {}",
                        param,
                        self.encoding.name()
                    ),
                }
            }
            _ => {}
        }
        Ok(Token::Control(ControlWord { name, param }))
    }

    /// Optional signed decimal parameter. Overlong values clamp instead
    /// of failing so damaged input cannot halt the stream.
    fn numeric_parameter(&mut self) -> Option<i32> {
        let negative = self.input.get(self.pos) == Some(&b'-');
        let digits_start = self.pos + usize::from(negative);
        let mut end = digits_start;
        while self.input.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if end == digits_start {
            return None;
        }
        let mut value: i64 = 0;
        for &digit in &self.input[digits_start..end] {
            value = value.saturating_mul(10).saturating_add((digit - b'0') as i64);
        }
        if negative {
            value = -value;
        }
        self.pos = end;
        Some(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    fn binary(&mut self, param: Option<i32>) -> RtfResult<Token<'a>> {
        let declared = param.unwrap_or(0).max(0) as usize;
        let end = self.pos.saturating_add(declared).min(self.input.len());
        if end - self.pos < declared {
            debug!(
                "\\bin declares {} bytes but only {} remain",
                declared,
                end - self.pos
            );
        }
        let data = &self.input[self.pos..end];
        self.pos = end;
        Ok(Token::Binary(data))
    }

    fn unicode_char(&mut self, param: Option<i32>) -> RtfResult<Token<'a>> {
        let Some(raw) = param else {
            debug!("\\u without a parameter");
            return Ok(Token::Text(""));
        };
        // Parameters are signed 16-bit; negative values wrap.
        let code = if raw < 0 { (raw + 65536) as u32 } else { raw as u32 };
        self.skip_unicode_fallback();

        let mut out = String::new();
        match code {
            0xD800..0xDC00 => {
                if let Some(high) = self.pending_surrogate.replace(code as u16) {
                    debug!("high surrogate {:04X} without a low half", high);
                    out.push(char::REPLACEMENT_CHARACTER);
                }
            }
            0xDC00..0xE000 => match self.pending_surrogate.take() {
                Some(high) => {
                    let combined =
                        0x10000 + (((high as u32) - 0xD800) << 10) + (code - 0xDC00);
                    out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                None => {
                    debug!("low surrogate {:04X} without a high half", code);
                    out.push(char::REPLACEMENT_CHARACTER);
                }
            },
            _ => {
                if let Some(high) = self.pending_surrogate.take() {
                    debug!("high surrogate {:04X} without a low half", high);
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
        if out.is_empty() {
            return Ok(Token::Text(""));
        }
        Ok(Token::Text(self.arena.alloc_str(&out)))
    }

    /// Consumes the fallback text that follows `\uN`, one item per
    /// `\uc` count: a plain byte or a whole `\'XX` escape. Group
    /// delimiters and other control words end the fallback early.
    fn skip_unicode_fallback(&mut self) {
        let mut remaining = self.uc_stack.last().copied().unwrap_or(1);
        while remaining > 0 {
            match self.input.get(self.pos) {
                Some(&b'\\') if self.input.get(self.pos + 1) == Some(&b'\'') => {
                    self.pos = self.pos.saturating_add(4).min(self.input.len());
                }
                Some(&b'\\') | Some(&b'{') | Some(&b'}') | None => break,
                Some(_) => self.pos += 1,
            }
            remaining -= 1;
        }
    }

    /// Decodes a run of `\'XX` escapes through the active code page.
    /// Directly adjoining escapes are decoded together so multi-byte
    /// sequences come out as the characters they encode.
    fn hex_run(&mut self) -> RtfResult<Token<'a>> {
        let mut bytes: SmallVec<[u8; 16]> = SmallVec::new();
        loop {
            let pair = (
                self.input.get(self.pos).and_then(|&b| hex_value(b)),
                self.input.get(self.pos + 1).and_then(|&b| hex_value(b)),
            );
            let (Some(high), Some(low)) = pair else {
                debug!("malformed hex escape at byte {}", self.pos);
                break;
            };
            bytes.push((high << 4) | low);
            self.pos += 2;
            if self.input.get(self.pos) == Some(&b'\\')
                && self.input.get(self.pos + 1) == Some(&b'\'')
            {
                self.pos += 2;
                continue;
            }
            break;
        }
        if bytes.is_empty() {
            return Ok(Token::Text(""));
        }
        let (decoded, had_errors) = self.encoding.decode_without_bom_handling(&bytes);
        if had_errors {
            debug!("hex escape not valid in {}", self.encoding.name());
        }
        Ok(Token::Text(self.arena.alloc_str(&decoded)))
    }

    /// Plain text up to the next delimiter. Stray CR/LF bytes are file
    /// formatting, not content, and are dropped.
    fn text_run(&mut self) -> RtfResult<Token<'a>> {
        let start = self.pos;
        let end = memchr3(b'\\', b'{', b'}', &self.input[start..])
            .map(|found| start + found)
            .unwrap_or(self.input.len());
        self.pos = end;
        let raw: &'a [u8] = &self.input[start..end];
        let (decoded, had_errors) = self.encoding.decode_without_bom_handling(raw);
        if had_errors {
            debug!("text bytes not valid in {}", self.encoding.name());
        }
        let text = match decoded {
            Cow::Borrowed(text) if !text.contains(['\r', '\n']) => text,
            other => {
                let cleaned: String = other.chars().filter(|&c| c != '\r' && c != '\n').collect();
                self.arena.alloc_str(&cleaned)
            }
        };
        Ok(Token::Text(text))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = RtfResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let &byte = self.input.get(self.pos)?;
            match byte {
                b'{' => {
                    self.pos += 1;
                    self.depth += 1;
                    let top = self.uc_stack.last().copied().unwrap_or(1);
                    self.uc_stack.push(top);
                    return Some(Ok(Token::GroupStart));
                }
                b'}' => {
                    self.pos += 1;
                    if self.depth == 0 {
                        self.done = true;
                        return Some(Err(RtfError::UnbalancedGroup(format!(
                            "group end without start at byte {}",
                            self.pos - 1
                        ))));
                    }
                    self.depth -= 1;
                    if self.uc_stack.len() > 1 {
                        self.uc_stack.pop();
                    }
                    return Some(Ok(Token::GroupEnd));
                }
                b'\\' => return Some(self.control()),
                b'\r' | b'\n' | b'\0' => self.pos += 1,
                _ => return Some(self.text_run()),
            }
        }
    }
}

/// The scanned bytes are ASCII by construction.
fn ascii_str(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap_or("")
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
