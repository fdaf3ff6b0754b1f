//! Lexical analysis of scalar values.
//!
//! A scalar value constrains which presentation styles can reproduce it.
//! [`analyze_scalar`] scans the value once and records which of the five
//! styles remain legal; the emitter's style selector starts from the
//! requested style and downgrades along plain → single-quoted →
//! double-quoted until it reaches a legal one.

use crate::chars::{is_blankz, is_break, is_printable};

/// The outcome of scanning one scalar value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScalarAnalysis {
    /// The value contains line breaks.
    pub multiline: bool,
    /// The plain style is legal in flow context.
    pub flow_plain_allowed: bool,
    /// The plain style is legal in block context.
    pub block_plain_allowed: bool,
    /// The single-quoted style is legal.
    pub single_quoted_allowed: bool,
    /// The literal and folded block styles are legal.
    pub block_allowed: bool,
}

impl Default for ScalarAnalysis {
    fn default() -> Self {
        ScalarAnalysis {
            multiline: false,
            flow_plain_allowed: true,
            block_plain_allowed: true,
            single_quoted_allowed: true,
            block_allowed: true,
        }
    }
}

/// Scan `value` and decide which scalar styles can reproduce it.
///
/// `allow_unicode` mirrors the emitter setting: when false, every
/// non-ASCII character counts as special and forces the double-quoted
/// style, which is the only one that can escape it.
pub(crate) fn analyze_scalar(value: &str, allow_unicode: bool) -> ScalarAnalysis {
    if value.is_empty() {
        // Only `''` or a plain empty node in block context can express it.
        return ScalarAnalysis {
            multiline: false,
            flow_plain_allowed: false,
            block_plain_allowed: true,
            single_quoted_allowed: true,
            block_allowed: false,
        };
    }

    let mut block_indicators = false;
    let mut flow_indicators = false;
    let mut line_breaks = false;
    let mut special_characters = false;

    let mut leading_space = false;
    let mut leading_break = false;
    let mut trailing_space = false;
    let mut trailing_break = false;
    let mut break_space = false;
    let mut space_break = false;

    let mut previous_space = false;
    let mut previous_break = false;

    if value.starts_with("---") || value.starts_with("...") {
        block_indicators = true;
        flow_indicators = true;
    }

    let chars: Vec<char> = value.chars().collect();
    let last = chars.len() - 1;
    let mut preceded_by_whitespace = true;
    let mut followed_by_whitespace = is_blankz(chars.get(1).copied());

    for (i, &ch) in chars.iter().enumerate() {
        if i == 0 {
            match ch {
                '#' | ',' | '[' | ']' | '{' | '}' | '&' | '*' | '!' | '|' | '>' | '\'' | '"'
                | '%' | '@' | '`' => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                '?' | ':' => {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                '-' if followed_by_whitespace => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                _ => {}
            }
        } else {
            match ch {
                ',' | '?' | '[' | ']' | '{' | '}' => flow_indicators = true,
                ':' => {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                '#' if preceded_by_whitespace => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                _ => {}
            }
        }

        if !is_printable(ch) || (!ch.is_ascii() && !allow_unicode) {
            special_characters = true;
        }
        if is_break(ch) {
            line_breaks = true;
        }

        if ch == ' ' {
            if i == 0 {
                leading_space = true;
            }
            if i == last {
                trailing_space = true;
            }
            if previous_break {
                break_space = true;
            }
            previous_space = true;
            previous_break = false;
        } else if is_break(ch) {
            if i == 0 {
                leading_break = true;
            }
            if i == last {
                trailing_break = true;
            }
            if previous_space {
                space_break = true;
            }
            previous_space = false;
            previous_break = true;
        } else {
            previous_space = false;
            previous_break = false;
        }

        preceded_by_whitespace = is_blankz(ch);
        followed_by_whitespace = is_blankz(chars.get(i + 2).copied());
    }

    let mut analysis = ScalarAnalysis {
        multiline: line_breaks,
        ..ScalarAnalysis::default()
    };
    let edge_whitespace = leading_space || leading_break || trailing_space || trailing_break;
    if edge_whitespace {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
    }
    if trailing_space {
        analysis.block_allowed = false;
    }
    if break_space {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        analysis.single_quoted_allowed = false;
    }
    if space_break || special_characters {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        analysis.single_quoted_allowed = false;
        analysis.block_allowed = false;
    }
    if line_breaks {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        // Single-quoted folding eats a space or break adjacent to the
        // quotes, so an edge space cannot survive in a multiline value.
        if edge_whitespace {
            analysis.single_quoted_allowed = false;
        }
    }
    if flow_indicators {
        analysis.flow_plain_allowed = false;
    }
    if block_indicators {
        analysis.block_plain_allowed = false;
    }
    analysis
}
