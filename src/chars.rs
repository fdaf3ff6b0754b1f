//! Character classes used by the scalar analyzer and the writers.
//!
//! All predicates accept `Option<char>` so that callers can feed them
//! `chars.get(i).copied()` directly; `None` (end of input) counts as a
//! break for the `*z` variants.

pub(crate) fn is_alpha(ch: impl Into<Option<char>>) -> bool {
    let Some(ch) = ch.into() else {
        return false;
    };
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

pub(crate) fn is_space(ch: impl Into<Option<char>>) -> bool {
    ch.into() == Some(' ')
}

pub(crate) fn is_tab(ch: impl Into<Option<char>>) -> bool {
    ch.into() == Some('\t')
}

pub(crate) fn is_blank(ch: impl Into<Option<char>>) -> bool {
    let ch = ch.into();
    is_space(ch) || is_tab(ch)
}

pub(crate) fn is_break(ch: impl Into<Option<char>>) -> bool {
    matches!(
        ch.into(),
        Some('\r' | '\n' | '\u{0085}' | '\u{2028}' | '\u{2029}')
    )
}

pub(crate) fn is_breakz(ch: impl Into<Option<char>>) -> bool {
    let ch = ch.into();
    ch.is_none() || is_break(ch)
}

pub(crate) fn is_blankz(ch: impl Into<Option<char>>) -> bool {
    let ch = ch.into();
    is_blank(ch) || is_breakz(ch)
}

pub(crate) fn is_bom(ch: impl Into<Option<char>>) -> bool {
    ch.into() == Some('\u{feff}')
}

/// Characters the YAML character productions allow to appear verbatim in a
/// stream. Everything else must be escaped (and therefore forces the
/// double-quoted style).
pub(crate) fn is_printable(ch: char) -> bool {
    match ch {
        '\u{feff}' | '\u{fffe}' | '\u{ffff}' => false,
        '\x0a'
        | '\x20'..='\x7e'
        | '\u{00a0}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fffd}'
        | '\u{10000}'..='\u{10ffff}' => true,
        _ => false,
    }
}
