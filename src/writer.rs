//! Low-level output: column and line tracking, indicators, indentation,
//! and the five scalar writers.
//!
//! Everything here appends to the emitter's UTF-8 buffer and keeps the
//! `column`, `line`, `whitespace` and `indention` flags in sync; the state
//! machine in `emitter.rs` never touches the buffer directly. The buffer
//! is re-encoded and handed to the output sink by [`Emitter::flush`].

use crate::chars::{is_blank, is_blankz, is_bom, is_break, is_printable};
use crate::emitter::OpenEnded;
use crate::{Emitter, EmitterError};

/// Flush the internal buffer once it grows past this many bytes.
const OUTPUT_BUFFER_SIZE: usize = 16384;

/// The character encoding applied to the output bytes at flush time.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Encoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16 little-endian. No byte order mark is written.
    Utf16Le,
    /// UTF-16 big-endian. No byte order mark is written.
    Utf16Be,
}

/// The line break written for every `\n` the emitter produces.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Break {
    /// CR only (old Mac style).
    Cr,
    /// LF only (Unix style).
    #[default]
    Ln,
    /// CR LF (DOS style).
    CrLn,
}

impl Emitter<'_> {
    /// Flush the accumulated characters to the output sink.
    pub fn flush(&mut self) -> Result<(), EmitterError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let handler = self
            .write_handler
            .as_mut()
            .expect("emitter output is not set");
        match self.encoding {
            Encoding::Utf8 => {
                handler.write_all(self.buffer.as_bytes())?;
            }
            Encoding::Utf16Le | Encoding::Utf16Be => {
                let big_endian = self.encoding == Encoding::Utf16Be;
                for unit in self.buffer.encode_utf16() {
                    let bytes = if big_endian {
                        unit.to_be_bytes()
                    } else {
                        unit.to_le_bytes()
                    };
                    self.raw_buffer.extend(bytes);
                }
                handler.write_all(&self.raw_buffer)?;
                self.raw_buffer.clear();
            }
        }
        self.buffer.clear();
        Ok(())
    }

    fn flush_if_full(&mut self) -> Result<(), EmitterError> {
        if self.buffer.len() >= OUTPUT_BUFFER_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    /// Write one character. Callers maintain the whitespace flags.
    pub(crate) fn put(&mut self, ch: char) -> Result<(), EmitterError> {
        self.flush_if_full()?;
        self.buffer.push(ch);
        self.column += 1;
        Ok(())
    }

    /// Write the configured line break.
    pub(crate) fn put_break(&mut self) -> Result<(), EmitterError> {
        self.flush_if_full()?;
        match self.line_break {
            Break::Cr => self.buffer.push('\r'),
            Break::Ln => self.buffer.push('\n'),
            Break::CrLn => self.buffer.push_str("\r\n"),
        }
        self.column = 0;
        self.line += 1;
        Ok(())
    }

    /// Write a break character from a scalar value: `\n` becomes the
    /// configured break, the Unicode breaks are preserved verbatim.
    pub(crate) fn write_break(&mut self, ch: char) -> Result<(), EmitterError> {
        if ch == '\n' {
            self.put_break()?;
        } else {
            self.flush_if_full()?;
            self.buffer.push(ch);
            self.column = 0;
            self.line += 1;
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<(), EmitterError> {
        self.flush_if_full()?;
        self.buffer.push_str(s);
        self.column += s.chars().count() as i32;
        Ok(())
    }

    /// Break the line if the current position is past the indent (or holds
    /// non-indent content), then pad with spaces up to the indent column.
    pub(crate) fn write_indent(&mut self) -> Result<(), EmitterError> {
        let indent = self.indent.max(0);
        if !self.indention
            || self.column > indent
            || (self.column == indent && !self.whitespace)
        {
            self.put_break()?;
        }
        while self.column < indent {
            self.put(' ')?;
        }
        self.whitespace = true;
        self.indention = true;
        Ok(())
    }

    /// Write a syntax indicator such as `-`, `---`, `[`, or `?`.
    ///
    /// `need_whitespace` separates the indicator from preceding content;
    /// `is_whitespace` marks indicators that count as separation for what
    /// follows; `is_indention` keeps the indentation flag alive for
    /// indicators that may carry indented content (`-`, `?`, `:`).
    pub(crate) fn write_indicator(
        &mut self,
        indicator: &str,
        need_whitespace: bool,
        is_whitespace: bool,
        is_indention: bool,
    ) -> Result<(), EmitterError> {
        if need_whitespace && !self.whitespace {
            self.put(' ')?;
        }
        self.write_str(indicator)?;
        self.whitespace = is_whitespace;
        self.indention = self.indention && is_indention;
        self.open_ended = OpenEnded::No;
        Ok(())
    }

    pub(crate) fn write_anchor(&mut self, value: &str) -> Result<(), EmitterError> {
        self.write_str(value)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    pub(crate) fn write_tag_handle(&mut self, value: &str) -> Result<(), EmitterError> {
        if !self.whitespace {
            self.put(' ')?;
        }
        self.write_str(value)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    /// Write a tag suffix or `%TAG` prefix, percent-escaping every byte
    /// outside the URI character set.
    pub(crate) fn write_tag_content(
        &mut self,
        value: &str,
        need_whitespace: bool,
    ) -> Result<(), EmitterError> {
        if need_whitespace && !self.whitespace {
            self.put(' ')?;
        }
        for ch in value.chars() {
            if ch.is_ascii_alphanumeric()
                || matches!(
                    ch,
                    '_' | '-'
                        | ';'
                        | '/'
                        | '?'
                        | ':'
                        | '@'
                        | '&'
                        | '='
                        | '+'
                        | '$'
                        | ','
                        | '.'
                        | '!'
                        | '~'
                        | '*'
                        | '\''
                        | '('
                        | ')'
                        | '['
                        | ']'
                )
            {
                self.put(ch)?;
            } else {
                let mut utf8 = [0u8; 4];
                for octet in ch.encode_utf8(&mut utf8).bytes() {
                    self.put('%')?;
                    self.put(hex_digit(octet >> 4))?;
                    self.put(hex_digit(octet & 0x0F))?;
                }
            }
        }
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    pub(crate) fn write_plain_scalar(
        &mut self,
        value: &str,
        allow_breaks: bool,
    ) -> Result<(), EmitterError> {
        if !self.whitespace && (!value.is_empty() || self.flow_level > 0) {
            self.put(' ')?;
        }
        let chars: Vec<char> = value.chars().collect();
        let mut spaces = false;
        let mut breaks = false;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if ch == ' ' {
                if allow_breaks
                    && !spaces
                    && self.column > self.best_width
                    && chars.get(i + 1) != Some(&' ')
                {
                    self.write_indent()?;
                } else {
                    self.put(ch)?;
                }
                spaces = true;
            } else if is_break(ch) {
                // A lone break folds back to a space on parsing; doubling
                // it preserves the newline.
                if !breaks && ch == '\n' {
                    self.put_break()?;
                }
                self.write_break(ch)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                }
                self.put(ch)?;
                self.indention = false;
                spaces = false;
                breaks = false;
            }
            i += 1;
        }
        self.whitespace = false;
        self.indention = false;
        if self.root_context {
            self.open_ended = OpenEnded::Document;
        }
        Ok(())
    }

    pub(crate) fn write_single_quoted_scalar(
        &mut self,
        value: &str,
        allow_breaks: bool,
    ) -> Result<(), EmitterError> {
        self.write_indicator("'", true, false, false)?;
        let chars: Vec<char> = value.chars().collect();
        let mut spaces = false;
        let mut breaks = false;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if ch == ' ' {
                if allow_breaks
                    && !spaces
                    && self.column > self.best_width
                    && i != 0
                    && i != chars.len() - 1
                    && chars.get(i + 1) != Some(&' ')
                {
                    self.write_indent()?;
                } else {
                    self.put(ch)?;
                }
                spaces = true;
            } else if is_break(ch) {
                if !breaks && ch == '\n' {
                    self.put_break()?;
                }
                self.write_break(ch)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                }
                if ch == '\'' {
                    self.put('\'')?;
                }
                self.put(ch)?;
                self.indention = false;
                spaces = false;
                breaks = false;
            }
            i += 1;
        }
        if breaks {
            self.write_indent()?;
        }
        self.write_indicator("'", false, false, false)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    pub(crate) fn write_double_quoted_scalar(
        &mut self,
        value: &str,
        allow_breaks: bool,
    ) -> Result<(), EmitterError> {
        self.write_indicator("\"", true, false, false)?;
        let chars: Vec<char> = value.chars().collect();
        let mut spaces = false;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if !is_printable(ch)
                || (!self.unicode && !ch.is_ascii())
                || is_bom(ch)
                || is_break(ch)
                || ch == '"'
                || ch == '\\'
            {
                self.write_escaped_char(ch)?;
                spaces = false;
            } else if ch == ' ' {
                if allow_breaks
                    && !spaces
                    && self.column > self.best_width
                    && i != 0
                    && i != chars.len() - 1
                {
                    self.write_indent()?;
                    // A space right after the fold would be eaten by the
                    // parser; escape the line end instead.
                    if chars.get(i + 1) == Some(&' ') {
                        self.put('\\')?;
                    }
                } else {
                    self.put(ch)?;
                }
                spaces = true;
            } else {
                self.put(ch)?;
                spaces = false;
            }
            i += 1;
        }
        self.write_indicator("\"", false, false, false)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    fn write_escaped_char(&mut self, ch: char) -> Result<(), EmitterError> {
        self.put('\\')?;
        match ch {
            '\0' => self.put('0'),
            '\x07' => self.put('a'),
            '\x08' => self.put('b'),
            '\t' => self.put('t'),
            '\n' => self.put('n'),
            '\x0b' => self.put('v'),
            '\x0c' => self.put('f'),
            '\r' => self.put('r'),
            '\x1b' => self.put('e'),
            '"' => self.put('"'),
            '\\' => self.put('\\'),
            '\u{0085}' => self.put('N'),
            '\u{00a0}' => self.put('_'),
            '\u{2028}' => self.put('L'),
            '\u{2029}' => self.put('P'),
            _ => {
                let value = ch as u32;
                let width = if value <= 0xFF {
                    self.put('x')?;
                    2
                } else if value <= 0xFFFF {
                    self.put('u')?;
                    4
                } else {
                    self.put('U')?;
                    8
                };
                for shift in (0..width).rev() {
                    let digit = ((value >> (shift * 4)) & 0x0F) as u8;
                    self.put(hex_digit(digit))?;
                }
                Ok(())
            }
        }
    }

    /// Write the indentation and chomping hints that follow `|` or `>`.
    fn write_block_scalar_hints(&mut self, chars: &[char]) -> Result<(), EmitterError> {
        if matches!(chars.first(), Some(&ch) if ch == ' ' || is_break(ch)) {
            // Content starting with whitespace needs an explicit indent
            // hint, or the parser cannot find the content column.
            let digit = char::from_digit(self.best_indent as u32, 10)
                .expect("best indent is a single digit");
            let mut buffer = [0u8; 1];
            self.write_indicator(digit.encode_utf8(&mut buffer), false, false, false)?;
        }
        self.open_ended = OpenEnded::No;
        let keep = match chars.last() {
            None => {
                self.write_indicator("-", false, false, false)?;
                false
            }
            Some(&ch) if !is_break(ch) => {
                self.write_indicator("-", false, false, false)?;
                false
            }
            _ => {
                if chars.len() == 1 || is_break(chars[chars.len() - 2]) {
                    self.write_indicator("+", false, false, false)?;
                    true
                } else {
                    false
                }
            }
        };
        if keep {
            // The kept trailing breaks belong to the scalar; the next
            // document must be introduced by an explicit `...`.
            self.open_ended = OpenEnded::BlockScalar;
        }
        Ok(())
    }

    pub(crate) fn write_literal_scalar(&mut self, value: &str) -> Result<(), EmitterError> {
        self.write_indicator("|", true, false, false)?;
        let chars: Vec<char> = value.chars().collect();
        self.write_block_scalar_hints(&chars)?;
        self.put_break()?;
        self.indention = true;
        self.whitespace = true;
        let mut breaks = true;
        for &ch in &chars {
            if is_break(ch) {
                self.write_break(ch)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                }
                self.put(ch)?;
                self.indention = false;
                breaks = false;
            }
        }
        Ok(())
    }

    pub(crate) fn write_folded_scalar(&mut self, value: &str) -> Result<(), EmitterError> {
        self.write_indicator(">", true, false, false)?;
        let chars: Vec<char> = value.chars().collect();
        self.write_block_scalar_hints(&chars)?;
        self.put_break()?;
        self.indention = true;
        self.whitespace = true;
        let mut breaks = true;
        let mut leading_spaces = true;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if is_break(ch) {
                if !breaks && !leading_spaces && ch == '\n' {
                    // An interior blank line folds away unless doubled.
                    let mut k = i;
                    while k < chars.len() && is_break(chars[k]) {
                        k += 1;
                    }
                    if !is_blankz(chars.get(k).copied()) {
                        self.put_break()?;
                    }
                }
                self.write_break(ch)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                    leading_spaces = is_blank(ch);
                }
                if !breaks
                    && ch == ' '
                    && chars.get(i + 1) != Some(&' ')
                    && self.column > self.best_width
                {
                    self.write_indent()?;
                } else {
                    self.put(ch)?;
                }
                self.indention = false;
                breaks = false;
            }
            i += 1;
        }
        Ok(())
    }
}

fn hex_digit(value: u8) -> char {
    char::from_digit(u32::from(value), 16)
        .expect("nibble is in range")
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use crate::{Emitter, Encoding, Event, ScalarStyle};

    fn emit_styled(value: &str, style: ScalarStyle) -> String {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.emit(Event::stream_start()).unwrap();
        emitter.emit(Event::document_start(None, &[], true)).unwrap();
        emitter
            .emit(Event::scalar(None, None, value, true, true, style))
            .unwrap();
        emitter.emit(Event::document_end(true)).unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn double_quoted_escapes() {
        assert_eq!(
            emit_styled("\0 \x07 \x08 \t \x0b \x0c \r \x1b", ScalarStyle::DoubleQuoted),
            "\"\\0 \\a \\b \\t \\v \\f \\r \\e\"\n"
        );
        assert_eq!(
            emit_styled("quote \" backslash \\", ScalarStyle::DoubleQuoted),
            "\"quote \\\" backslash \\\\\"\n"
        );
        assert_eq!(
            emit_styled("\u{85} \u{a0} \u{2028} \u{2029}", ScalarStyle::DoubleQuoted),
            "\"\\N \\_ \\L \\P\"\n"
        );
    }

    #[test]
    fn double_quoted_numeric_escapes() {
        // One escape per width: \xHH, \uHHHH, \UHHHHHHHH.
        assert_eq!(emit_styled("\x01", ScalarStyle::DoubleQuoted), "\"\\x01\"\n");
        assert_eq!(emit_styled("é", ScalarStyle::DoubleQuoted), "\"\\xE9\"\n");
        assert_eq!(
            emit_styled("\u{fffe}", ScalarStyle::DoubleQuoted),
            "\"\\uFFFE\"\n"
        );
        assert_eq!(
            emit_styled("\u{1f389}", ScalarStyle::DoubleQuoted),
            "\"\\U0001F389\"\n"
        );
    }

    #[test]
    fn unicode_setting_controls_escaping() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.set_unicode(true);
        emitter.emit(Event::stream_start()).unwrap();
        emitter.emit(Event::document_start(None, &[], true)).unwrap();
        emitter
            .emit(Event::scalar(None, None, "café", true, true, ScalarStyle::Any))
            .unwrap();
        emitter.emit(Event::document_end(true)).unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "café\n");

        // With unicode off the same value must be escaped.
        assert_eq!(emit_styled("café", ScalarStyle::Any), "\"caf\\xE9\"\n");
    }

    #[test]
    fn single_quote_doubling() {
        assert_eq!(
            emit_styled("it''s", ScalarStyle::SingleQuoted),
            "'it''''s'\n"
        );
    }

    #[test]
    fn literal_scalar_clip() {
        assert_eq!(
            emit_styled("line1\nline2\n", ScalarStyle::Literal),
            "|\n  line1\n  line2\n"
        );
    }

    #[test]
    fn literal_scalar_strip() {
        assert_eq!(
            emit_styled("no-newline", ScalarStyle::Literal),
            "|-\n  no-newline\n"
        );
    }

    #[test]
    fn literal_scalar_keep_sets_open_ended() {
        assert_eq!(
            emit_styled("line\n\n", ScalarStyle::Literal),
            "|+\n  line\n\n...\n"
        );
    }

    #[test]
    fn block_scalar_indent_hint() {
        // Content starting with a space needs the explicit indent digit.
        assert_eq!(
            emit_styled(" padded\n", ScalarStyle::Literal),
            "|2\n   padded\n"
        );
    }

    #[test]
    fn folded_scalar_preserves_blank_lines() {
        assert_eq!(
            emit_styled("fold me\nplease\n", ScalarStyle::Folded),
            ">\n  fold me\n\n  please\n"
        );
    }

    #[test]
    fn plain_scalar_wraps_at_width() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.set_width(10).unwrap();
        emitter.emit(Event::stream_start()).unwrap();
        emitter.emit(Event::document_start(None, &[], true)).unwrap();
        emitter
            .emit(Event::scalar(
                None,
                None,
                "the quick brown fox jumps",
                true,
                true,
                ScalarStyle::Any,
            ))
            .unwrap();
        emitter.emit(Event::document_end(true)).unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "the quick brown\n  fox jumps\n"
        );
    }

    #[test]
    fn utf16le_output() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.set_encoding(Encoding::Utf16Le);
        emitter.emit(Event::stream_start()).unwrap();
        emitter.emit(Event::document_start(None, &[], true)).unwrap();
        emitter
            .emit(Event::scalar(None, None, "hi", true, true, ScalarStyle::Any))
            .unwrap();
        emitter.emit(Event::document_end(true)).unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        assert_eq!(output, b"h\0i\0\n\0");
    }
}
