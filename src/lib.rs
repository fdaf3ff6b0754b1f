//! A streaming YAML 1.1 emitter.
//!
//! `yamel` turns a sequence of parsing events — the stream/document/node
//! boundaries a YAML parser produces — into byte-for-byte valid YAML text.
//! It is the writing half of a YAML processor: event producers (parsers,
//! object-model serializers) and schema resolution live elsewhere.
//!
//! The emitter buffers just enough look-ahead to commit to a layout,
//! chooses a legal presentation style for every scalar (plain,
//! single-quoted, double-quoted, literal, or folded), folds long lines at
//! the preferred width, and resolves tags against the document's `%TAG`
//! directives.
//!
//! ```
//! use yamel::{CollectionStyle, Emitter, Event, ScalarStyle};
//!
//! let mut output = Vec::new();
//! let mut emitter = Emitter::new();
//! emitter.set_output(&mut output);
//! for event in [
//!     Event::stream_start(),
//!     Event::document_start(None, &[], true),
//!     Event::sequence_start(None, None, true, CollectionStyle::Block),
//!     Event::scalar(None, None, "one", true, true, ScalarStyle::Any),
//!     Event::scalar(None, None, "two", true, true, ScalarStyle::Any),
//!     Event::sequence_end(),
//!     Event::document_end(true),
//!     Event::stream_end(),
//! ] {
//!     emitter.emit(event)?;
//! }
//! assert_eq!(output, b"- one\n- two\n");
//! # Ok::<(), yamel::EmitterError>(())
//! ```

#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::match_same_arms,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::too_many_lines
)]

mod analysis;
mod chars;
mod emitter;
mod error;
mod event;
mod writer;

pub use crate::emitter::Emitter;
pub use crate::error::EmitterError;
pub use crate::event::{CollectionStyle, Event, ScalarStyle, TagDirective, VersionDirective};
pub use crate::writer::{Break, Encoding};

#[cfg(test)]
mod tests {
    use super::*;

    fn emit_to_string(events: Vec<Event>) -> String {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        for event in events {
            emitter.emit(event).unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    fn plain(value: &str) -> Event {
        Event::scalar(None, None, value, true, true, ScalarStyle::Any)
    }

    #[test]
    fn plain_scalar_document() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            plain("hello"),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "hello\n");
    }

    #[test]
    fn block_sequence() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::sequence_start(None, None, true, CollectionStyle::Block),
            plain("a"),
            plain("b"),
            Event::sequence_end(),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "- a\n- b\n");
    }

    #[test]
    fn block_mapping_with_simple_key() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            plain("key"),
            plain("value"),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "key: value\n");
    }

    #[test]
    fn canonical_mapping() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.set_canonical(true);
        for event in [
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            plain("key"),
            plain("value"),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "---\n{\n  ? \"key\"\n  : \"value\",\n}\n...\n"
        );
    }

    #[test]
    fn multiline_with_trailing_space_is_double_quoted() {
        // The line break rules out plain, the trailing space rules out the
        // block styles and (combined with the break) single-quoted.
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            plain("line1\nline2 "),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "\"line1\\nline2 \"\n");
    }

    #[test]
    fn tag_directives_and_resolution() {
        let directives = [TagDirective::new("!e!", "tag:example.com,2024:")];
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(Some(VersionDirective { major: 1, minor: 1 }), &directives, true),
            Event::scalar(
                None,
                Some("tag:example.com,2024:foo"),
                "bar",
                false,
                false,
                ScalarStyle::Any,
            ),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(
            output,
            "%YAML 1.1\n%TAG !e! tag:example.com,2024:\n--- !e!foo bar\n"
        );
    }

    #[test]
    fn open_ended_document_terminated_before_directives() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            plain("hello"),
            Event::document_end(true),
            Event::document_start(Some(VersionDirective { major: 1, minor: 1 }), &[], true),
            plain("world"),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "hello\n...\n%YAML 1.1\n--- world\n");
    }

    #[test]
    fn anchors_and_aliases() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            plain("x"),
            Event::sequence_start(Some("id"), None, true, CollectionStyle::Flow),
            plain("1"),
            plain("2"),
            Event::sequence_end(),
            plain("y"),
            Event::alias("id"),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "x: &id [1, 2]\ny: *id\n");
    }

    #[test]
    fn single_quoted_multiline_preserves_breaks() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::scalar(
                None,
                None,
                "1st non-empty\n2nd non-empty 3rd non-empty",
                true,
                true,
                ScalarStyle::Plain,
            ),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "'1st non-empty\n\n  2nd non-empty 3rd non-empty'\n");
    }

    #[test]
    fn empty_containers_collapse_to_flow() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            plain("seq"),
            Event::sequence_start(None, None, true, CollectionStyle::Block),
            Event::sequence_end(),
            plain("map"),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            Event::mapping_end(),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "seq: []\nmap: {}\n");
    }

    #[test]
    fn nested_block_collections() {
        let output = emit_to_string(vec![
            Event::stream_start(),
            Event::document_start(None, &[], true),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            plain("outer"),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            plain("inner"),
            Event::sequence_start(None, None, true, CollectionStyle::Block),
            plain("a"),
            plain("b"),
            Event::sequence_end(),
            Event::mapping_end(),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ]);
        assert_eq!(output, "outer:\n  inner:\n  - a\n  - b\n");
    }
}
