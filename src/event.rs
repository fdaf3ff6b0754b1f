//! The parsing events consumed by the emitter.

/// The version of the `%YAML` directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionDirective {
    /// The major version number.
    pub major: i32,
    /// The minor version number.
    pub minor: i32,
}

/// A `%TAG` directive: a handle and the URI prefix it stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagDirective {
    /// The tag handle, `!`-framed (`!`, `!!`, or `!name!`).
    pub handle: String,
    /// The tag prefix the handle expands to.
    pub prefix: String,
}

impl TagDirective {
    pub fn new(handle: &str, prefix: &str) -> Self {
        Self {
            handle: String::from(handle),
            prefix: String::from(prefix),
        }
    }
}

/// Scalar presentation styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ScalarStyle {
    /// Let the emitter choose the style.
    #[default]
    Any,
    /// The plain (unquoted) scalar style.
    Plain,
    /// The single-quoted scalar style.
    SingleQuoted,
    /// The double-quoted scalar style.
    DoubleQuoted,
    /// The literal (`|`) block scalar style.
    Literal,
    /// The folded (`>`) block scalar style.
    Folded,
}

/// Presentation styles for sequences and mappings.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum CollectionStyle {
    /// Let the emitter choose the style.
    #[default]
    Any,
    /// The block (indentation-based) style.
    Block,
    /// The flow (bracketed) style.
    Flow,
}

/// A parsing event.
///
/// The emitter accepts the event sequences produced by a YAML parser: a
/// stream wraps documents, documents wrap a single node, and sequence and
/// mapping nodes wrap their children. The first event must be
/// [`StreamStart`](Event::StreamStart) and the last
/// [`StreamEnd`](Event::StreamEnd).
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The start of the stream.
    StreamStart,
    /// The end of the stream. No further events are accepted.
    StreamEnd,
    /// The start of a document.
    DocumentStart {
        /// The `%YAML` directive, if any.
        version: Option<VersionDirective>,
        /// The `%TAG` directives declared by this document.
        tags: Vec<TagDirective>,
        /// May the `---` marker be omitted?
        implicit: bool,
    },
    /// The end of a document.
    DocumentEnd {
        /// May the `...` marker be omitted?
        implicit: bool,
    },
    /// A reference to a previously anchored node.
    Alias {
        /// The anchor name.
        anchor: String,
    },
    /// A scalar node.
    Scalar {
        /// The anchor, if the node is anchored.
        anchor: Option<String>,
        /// The tag, if the node is tagged.
        tag: Option<String>,
        /// The scalar value.
        value: String,
        /// Is the tag optional for the plain style?
        plain_implicit: bool,
        /// Is the tag optional for any non-plain style?
        quoted_implicit: bool,
        /// The requested scalar style.
        style: ScalarStyle,
    },
    /// The start of a sequence node.
    SequenceStart {
        /// The anchor, if the node is anchored.
        anchor: Option<String>,
        /// The tag, if the node is tagged.
        tag: Option<String>,
        /// Is the tag optional?
        implicit: bool,
        /// The requested sequence style.
        style: CollectionStyle,
    },
    /// The end of a sequence node.
    SequenceEnd,
    /// The start of a mapping node.
    MappingStart {
        /// The anchor, if the node is anchored.
        anchor: Option<String>,
        /// The tag, if the node is tagged.
        tag: Option<String>,
        /// Is the tag optional?
        implicit: bool,
        /// The requested mapping style.
        style: CollectionStyle,
    },
    /// The end of a mapping node.
    MappingEnd,
}

impl Event {
    /// Create a STREAM-START event.
    pub fn stream_start() -> Self {
        Event::StreamStart
    }

    /// Create a STREAM-END event.
    pub fn stream_end() -> Self {
        Event::StreamEnd
    }

    /// Create a DOCUMENT-START event.
    ///
    /// `implicit` is a stylistic request; the emitter writes `---` anyway
    /// whenever directives, canonical mode, or document position require it.
    pub fn document_start(
        version: Option<VersionDirective>,
        tags: &[TagDirective],
        implicit: bool,
    ) -> Self {
        Event::DocumentStart {
            version,
            tags: tags.to_vec(),
            implicit,
        }
    }

    /// Create a DOCUMENT-END event.
    pub fn document_end(implicit: bool) -> Self {
        Event::DocumentEnd { implicit }
    }

    /// Create an ALIAS event.
    pub fn alias(anchor: &str) -> Self {
        Event::Alias {
            anchor: String::from(anchor),
        }
    }

    /// Create a SCALAR event.
    ///
    /// Either `tag` must be set or one of the implicit flags must be true.
    /// The `style` is a request and may be overridden when the value cannot
    /// be represented in that style.
    pub fn scalar(
        anchor: Option<&str>,
        tag: Option<&str>,
        value: &str,
        plain_implicit: bool,
        quoted_implicit: bool,
        style: ScalarStyle,
    ) -> Self {
        Event::Scalar {
            anchor: anchor.map(String::from),
            tag: tag.map(String::from),
            value: String::from(value),
            plain_implicit,
            quoted_implicit,
            style,
        }
    }

    /// Create a SEQUENCE-START event.
    pub fn sequence_start(
        anchor: Option<&str>,
        tag: Option<&str>,
        implicit: bool,
        style: CollectionStyle,
    ) -> Self {
        Event::SequenceStart {
            anchor: anchor.map(String::from),
            tag: tag.map(String::from),
            implicit,
            style,
        }
    }

    /// Create a SEQUENCE-END event.
    pub fn sequence_end() -> Self {
        Event::SequenceEnd
    }

    /// Create a MAPPING-START event.
    pub fn mapping_start(
        anchor: Option<&str>,
        tag: Option<&str>,
        implicit: bool,
        style: CollectionStyle,
    ) -> Self {
        Event::MappingStart {
            anchor: anchor.map(String::from),
            tag: tag.map(String::from),
            implicit,
            style,
        }
    }

    /// Create a MAPPING-END event.
    pub fn mapping_end() -> Self {
        Event::MappingEnd
    }
}
