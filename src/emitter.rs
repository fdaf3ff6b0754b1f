//! The emitter state machine.
//!
//! Events are queued until enough look-ahead is buffered to commit to a
//! layout (a container start cannot be written before knowing whether the
//! container is empty), then dispatched by the current state to the
//! matching emission routine.

use std::collections::VecDeque;

use crate::analysis::analyze_scalar;
use crate::chars::is_alpha;
use crate::event::{CollectionStyle, Event, ScalarStyle, TagDirective};
use crate::writer::{Break, Encoding};
use crate::EmitterError;

/// The emitter states.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) enum EmitterState {
    /// Expect STREAM-START.
    #[default]
    StreamStart,
    /// Expect the first DOCUMENT-START or STREAM-END.
    FirstDocumentStart,
    /// Expect DOCUMENT-START or STREAM-END.
    DocumentStart,
    /// Expect the content of a document.
    DocumentContent,
    /// Expect DOCUMENT-END.
    DocumentEnd,
    /// Expect the first item of a flow sequence.
    FlowSequenceFirstItem,
    /// Expect an item of a flow sequence.
    FlowSequenceItem,
    /// Expect the first key of a flow mapping.
    FlowMappingFirstKey,
    /// Expect a key of a flow mapping.
    FlowMappingKey,
    /// Expect a value for a simple key of a flow mapping.
    FlowMappingSimpleValue,
    /// Expect a value of a flow mapping.
    FlowMappingValue,
    /// Expect the first item of a block sequence.
    BlockSequenceFirstItem,
    /// Expect an item of a block sequence.
    BlockSequenceItem,
    /// Expect the first key of a block mapping.
    BlockMappingFirstKey,
    /// Expect the key of a block mapping.
    BlockMappingKey,
    /// Expect a value for a simple key of a block mapping.
    BlockMappingSimpleValue,
    /// Expect a value of a block mapping.
    BlockMappingValue,
    /// Expect nothing.
    End,
}

/// Whether the output so far ends in an unterminated document.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) enum OpenEnded {
    #[default]
    No,
    /// A document ended without `...`; one must be written before the next
    /// directive line.
    Document,
    /// A document ended in a keep-chomped block scalar whose trailing
    /// breaks belong to the value; `...` is required even at stream end.
    BlockScalar,
}

#[derive(Default)]
struct AnchorData {
    anchor: Option<String>,
    alias: bool,
}

#[derive(Default)]
struct TagData {
    handle: Option<String>,
    suffix: Option<String>,
}

#[derive(Default)]
struct ScalarData {
    value: String,
    multiline: bool,
    flow_plain_allowed: bool,
    block_plain_allowed: bool,
    single_quoted_allowed: bool,
    block_allowed: bool,
    style: ScalarStyle,
}

/// A streaming YAML 1.1 emitter.
///
/// Feed it the event sequence of a well-formed stream via
/// [`emit`](Emitter::emit); it writes the corresponding YAML text to the
/// sink installed with [`set_output`](Emitter::set_output). Layout knobs
/// must be configured before the STREAM-START event is emitted.
///
/// ```
/// use yamel::{Emitter, Event, ScalarStyle};
///
/// let mut output = Vec::new();
/// let mut emitter = Emitter::new();
/// emitter.set_output(&mut output);
/// emitter.emit(Event::stream_start()).unwrap();
/// emitter.emit(Event::document_start(None, &[], true)).unwrap();
/// emitter.emit(Event::scalar(None, None, "hello", true, true, ScalarStyle::Any)).unwrap();
/// emitter.emit(Event::document_end(true)).unwrap();
/// emitter.emit(Event::stream_end()).unwrap();
/// assert_eq!(output, b"hello\n");
/// ```
pub struct Emitter<'w> {
    /// Write handler.
    pub(crate) write_handler: Option<&'w mut dyn std::io::Write>,
    /// The working buffer. Always valid UTF-8.
    pub(crate) buffer: String,
    /// The output buffer in the encoded format, for UTF-16 encodings.
    pub(crate) raw_buffer: Vec<u8>,
    /// The output encoding.
    pub(crate) encoding: Encoding,
    /// Emit in the canonical style?
    pub(crate) canonical: bool,
    /// The number of indentation spaces per level.
    pub(crate) best_indent: i32,
    /// The preferred width of the output lines.
    pub(crate) best_width: i32,
    /// Allow unescaped non-ASCII characters?
    pub(crate) unicode: bool,
    /// The preferred line break.
    pub(crate) line_break: Break,
    /// The stack of continuation states.
    states: Vec<EmitterState>,
    /// The current emitter state.
    state: EmitterState,
    /// The look-ahead event queue.
    events: VecDeque<Event>,
    /// The stack of surrounding indentation levels.
    indents: Vec<i32>,
    /// The `%TAG` directives in effect for the current document.
    tag_directives: Vec<TagDirective>,
    /// The current indentation column, or -1 at the top of the stream.
    pub(crate) indent: i32,
    /// The depth of nested flow contexts. 0 means block mode.
    pub(crate) flow_level: i32,
    /// Is the current node the document root?
    pub(crate) root_context: bool,
    /// Is the current node a mapping key or value?
    mapping_context: bool,
    /// Is the current node a simple mapping key?
    pub(crate) simple_key_context: bool,
    /// The current output line.
    pub(crate) line: i32,
    /// The current output column.
    pub(crate) column: i32,
    /// The last written character was whitespace (or nothing was written).
    pub(crate) whitespace: bool,
    /// The current position consists of indentation characters only.
    pub(crate) indention: bool,
    /// Does the output end in an unterminated document?
    pub(crate) open_ended: OpenEnded,
    /// Anchor of the event being emitted.
    anchor_data: AnchorData,
    /// Resolved tag of the event being emitted.
    tag_data: TagData,
    /// Analysis of the scalar being emitted.
    scalar_data: ScalarData,
}

impl Default for Emitter<'_> {
    fn default() -> Self {
        Emitter::new()
    }
}

impl<'w> Emitter<'w> {
    /// Create an emitter with the default configuration: UTF-8 output,
    /// two-space indentation, a preferred width of 80 columns, LF breaks,
    /// non-canonical, non-ASCII escaped.
    pub fn new() -> Emitter<'w> {
        Emitter {
            write_handler: None,
            buffer: String::new(),
            raw_buffer: Vec::new(),
            encoding: Encoding::default(),
            canonical: false,
            best_indent: 2,
            best_width: 80,
            unicode: false,
            line_break: Break::default(),
            states: Vec::with_capacity(16),
            state: EmitterState::StreamStart,
            events: VecDeque::with_capacity(16),
            indents: Vec::with_capacity(16),
            tag_directives: Vec::new(),
            indent: -1,
            flow_level: 0,
            root_context: false,
            mapping_context: false,
            simple_key_context: false,
            line: 0,
            column: 0,
            whitespace: true,
            indention: true,
            open_ended: OpenEnded::No,
            anchor_data: AnchorData::default(),
            tag_data: TagData::default(),
            scalar_data: ScalarData::default(),
        }
    }

    /// Set the output sink. Must be called before the first event is
    /// emitted.
    pub fn set_output(&mut self, writer: &'w mut dyn std::io::Write) {
        self.write_handler = Some(writer);
    }

    /// Set the output encoding.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// Force the canonical style: explicit directives and document
    /// markers, flow collections, double-quoted scalars.
    pub fn set_canonical(&mut self, canonical: bool) {
        self.canonical = canonical;
    }

    /// Set the preferred number of indentation spaces per nesting level.
    ///
    /// Accepts 2 through 9; the indent must also stay below half the
    /// preferred width.
    pub fn set_indent(&mut self, indent: i32) -> Result<(), EmitterError> {
        if !(2..=9).contains(&indent) {
            return Err(EmitterError::InvalidArgument(
                "indent must be between 2 and 9",
            ));
        }
        if self.best_width <= indent * 2 {
            return Err(EmitterError::InvalidArgument(
                "indent must be less than half the preferred width",
            ));
        }
        self.best_indent = indent;
        Ok(())
    }

    /// Set the preferred line width. Longer lines are broken at spaces
    /// where the style permits. A negative width disables wrapping.
    ///
    /// The width must exceed twice the indentation step.
    pub fn set_width(&mut self, width: i32) -> Result<(), EmitterError> {
        if width < 0 {
            self.best_width = i32::MAX;
            return Ok(());
        }
        if width <= self.best_indent * 2 {
            return Err(EmitterError::InvalidArgument(
                "width must exceed twice the indent",
            ));
        }
        self.best_width = width;
        Ok(())
    }

    /// Allow non-ASCII characters to be written unescaped.
    pub fn set_unicode(&mut self, unicode: bool) {
        self.unicode = unicode;
    }

    /// Set the line break style.
    pub fn set_break(&mut self, line_break: Break) {
        self.line_break = line_break;
    }

    /// The current output line, starting at zero.
    pub fn line(&self) -> i32 {
        self.line
    }

    /// The current output column, starting at zero.
    pub fn column(&self) -> i32 {
        self.column
    }

    /// Emit an event.
    ///
    /// The event is queued; it and any previously queued events are
    /// written once enough look-ahead is available to fix the layout.
    /// Errors leave the emitter in an unspecified state; it must then be
    /// discarded.
    pub fn emit(&mut self, event: Event) -> Result<(), EmitterError> {
        self.events.push_back(event);
        while !self.need_more_events() {
            let event = self
                .events
                .pop_front()
                .expect("event queue is not empty");
            self.analyze_event(&event)?;
            self.state_machine(&event)?;
        }
        Ok(())
    }

    /// Check if the head of the queue may be dispatched, or whether more
    /// look-ahead is required first.
    ///
    /// A document start needs one following event, a sequence start two
    /// and a mapping start three, unless the buffered events already
    /// close the container.
    fn need_more_events(&self) -> bool {
        let Some(event) = self.events.front() else {
            return true;
        };
        let accumulate = match event {
            Event::DocumentStart { .. } => 1,
            Event::SequenceStart { .. } => 2,
            Event::MappingStart { .. } => 3,
            _ => return false,
        };
        if self.events.len() > accumulate {
            return false;
        }
        let mut level = 0i32;
        for event in &self.events {
            match event {
                Event::StreamStart
                | Event::DocumentStart { .. }
                | Event::SequenceStart { .. }
                | Event::MappingStart { .. } => level += 1,
                Event::StreamEnd
                | Event::DocumentEnd { .. }
                | Event::SequenceEnd
                | Event::MappingEnd => level -= 1,
                _ => {}
            }
            if level == 0 {
                return false;
            }
        }
        true
    }

    fn state_machine(&mut self, event: &Event) -> Result<(), EmitterError> {
        match self.state {
            EmitterState::StreamStart => self.emit_stream_start(event),
            EmitterState::FirstDocumentStart => self.emit_document_start(event, true),
            EmitterState::DocumentStart => self.emit_document_start(event, false),
            EmitterState::DocumentContent => self.emit_document_content(event),
            EmitterState::DocumentEnd => self.emit_document_end(event),
            EmitterState::FlowSequenceFirstItem => self.emit_flow_sequence_item(event, true),
            EmitterState::FlowSequenceItem => self.emit_flow_sequence_item(event, false),
            EmitterState::FlowMappingFirstKey => self.emit_flow_mapping_key(event, true),
            EmitterState::FlowMappingKey => self.emit_flow_mapping_key(event, false),
            EmitterState::FlowMappingSimpleValue => self.emit_flow_mapping_value(event, true),
            EmitterState::FlowMappingValue => self.emit_flow_mapping_value(event, false),
            EmitterState::BlockSequenceFirstItem => self.emit_block_sequence_item(event, true),
            EmitterState::BlockSequenceItem => self.emit_block_sequence_item(event, false),
            EmitterState::BlockMappingFirstKey => self.emit_block_mapping_key(event, true),
            EmitterState::BlockMappingKey => self.emit_block_mapping_key(event, false),
            EmitterState::BlockMappingSimpleValue => self.emit_block_mapping_value(event, true),
            EmitterState::BlockMappingValue => self.emit_block_mapping_value(event, false),
            EmitterState::End => Err(EmitterError::UnexpectedEvent(
                "expected nothing after STREAM-END",
            )),
        }
    }

    fn emit_stream_start(&mut self, event: &Event) -> Result<(), EmitterError> {
        if !matches!(event, Event::StreamStart) {
            return Err(EmitterError::UnexpectedEvent("expected STREAM-START"));
        }
        self.indent = -1;
        self.line = 0;
        self.column = 0;
        self.whitespace = true;
        self.indention = true;
        self.open_ended = OpenEnded::No;
        self.state = EmitterState::FirstDocumentStart;
        Ok(())
    }

    fn emit_document_start(&mut self, event: &Event, first: bool) -> Result<(), EmitterError> {
        match event {
            Event::DocumentStart {
                version,
                tags,
                implicit,
            } => {
                if let Some(version) = version {
                    if version.major != 1 || version.minor != 1 {
                        return Err(EmitterError::IncompatibleVersion {
                            major: version.major,
                            minor: version.minor,
                        });
                    }
                }
                for directive in tags {
                    analyze_tag_directive(directive)?;
                    self.append_tag_directive(directive.clone(), false)?;
                }
                for directive in default_tag_directives() {
                    self.append_tag_directive(directive, true)?;
                }
                let mut implicit = *implicit && first && !self.canonical;
                if (version.is_some() || !tags.is_empty()) && self.open_ended != OpenEnded::No {
                    self.write_indicator("...", true, false, false)?;
                    self.write_indent()?;
                }
                self.open_ended = OpenEnded::No;
                if version.is_some() {
                    implicit = false;
                    self.write_indicator("%YAML", true, false, false)?;
                    self.write_indicator("1.1", true, false, false)?;
                    self.write_indent()?;
                }
                if !tags.is_empty() {
                    implicit = false;
                    for directive in tags {
                        self.write_indicator("%TAG", true, false, false)?;
                        self.write_tag_handle(&directive.handle)?;
                        self.write_tag_content(&directive.prefix, true)?;
                        self.write_indent()?;
                    }
                }
                if self.check_empty_document() {
                    implicit = false;
                }
                if !implicit {
                    self.write_indent()?;
                    self.write_indicator("---", true, false, false)?;
                    if self.canonical {
                        self.write_indent()?;
                    }
                }
                self.state = EmitterState::DocumentContent;
                self.open_ended = OpenEnded::No;
                Ok(())
            }
            Event::StreamEnd => {
                if self.open_ended == OpenEnded::BlockScalar {
                    self.write_indicator("...", true, false, false)?;
                    self.open_ended = OpenEnded::No;
                    self.write_indent()?;
                }
                self.flush()?;
                self.state = EmitterState::End;
                Ok(())
            }
            _ => Err(EmitterError::UnexpectedEvent(
                "expected DOCUMENT-START or STREAM-END",
            )),
        }
    }

    fn emit_document_content(&mut self, event: &Event) -> Result<(), EmitterError> {
        self.states.push(EmitterState::DocumentEnd);
        self.emit_node(event, true, false, false)
    }

    fn emit_document_end(&mut self, event: &Event) -> Result<(), EmitterError> {
        let Event::DocumentEnd { implicit } = event else {
            return Err(EmitterError::UnexpectedEvent("expected DOCUMENT-END"));
        };
        self.write_indent()?;
        if !*implicit || self.canonical {
            self.write_indicator("...", true, false, false)?;
            self.open_ended = OpenEnded::No;
            self.write_indent()?;
        } else if self.open_ended == OpenEnded::No {
            self.open_ended = OpenEnded::Document;
        }
        self.flush()?;
        self.state = EmitterState::DocumentStart;
        self.tag_directives.clear();
        Ok(())
    }

    fn emit_flow_sequence_item(&mut self, event: &Event, first: bool) -> Result<(), EmitterError> {
        if first {
            self.write_indicator("[", true, true, false)?;
            self.increase_indent(true, false);
            self.flow_level += 1;
        }
        if matches!(event, Event::SequenceEnd) {
            self.flow_level -= 1;
            self.indent = self.indents.pop().expect("indent stack is not empty");
            if self.canonical && !first {
                self.write_indicator(",", false, false, false)?;
                self.write_indent()?;
            }
            self.write_indicator("]", false, false, false)?;
            self.state = self.states.pop().expect("state stack is not empty");
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
        }
        if self.canonical || self.column > self.best_width {
            self.write_indent()?;
        }
        self.states.push(EmitterState::FlowSequenceItem);
        self.emit_node(event, false, false, false)
    }

    fn emit_flow_mapping_key(&mut self, event: &Event, first: bool) -> Result<(), EmitterError> {
        if first {
            self.write_indicator("{", true, true, false)?;
            self.increase_indent(true, false);
            self.flow_level += 1;
        }
        if matches!(event, Event::MappingEnd) {
            self.flow_level -= 1;
            self.indent = self.indents.pop().expect("indent stack is not empty");
            if self.canonical && !first {
                self.write_indicator(",", false, false, false)?;
                self.write_indent()?;
            }
            self.write_indicator("}", false, false, false)?;
            self.state = self.states.pop().expect("state stack is not empty");
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
        }
        if self.canonical || self.column > self.best_width {
            self.write_indent()?;
        }
        if !self.canonical && self.check_simple_key(event) {
            self.states.push(EmitterState::FlowMappingSimpleValue);
            self.emit_node(event, false, true, true)
        } else {
            self.write_indicator("?", true, false, false)?;
            self.states.push(EmitterState::FlowMappingValue);
            self.emit_node(event, false, true, false)
        }
    }

    fn emit_flow_mapping_value(&mut self, event: &Event, simple: bool) -> Result<(), EmitterError> {
        if simple {
            self.write_indicator(":", false, false, false)?;
        } else {
            if self.canonical || self.column > self.best_width {
                self.write_indent()?;
            }
            self.write_indicator(":", true, false, false)?;
        }
        self.states.push(EmitterState::FlowMappingKey);
        self.emit_node(event, false, true, false)
    }

    fn emit_block_sequence_item(&mut self, event: &Event, first: bool) -> Result<(), EmitterError> {
        if first {
            // A sequence nested right after a mapping key shares the key's
            // line, so its items stay on the key's indentation level.
            self.increase_indent(false, self.mapping_context && !self.indention);
        }
        if matches!(event, Event::SequenceEnd) {
            self.indent = self.indents.pop().expect("indent stack is not empty");
            self.state = self.states.pop().expect("state stack is not empty");
            return Ok(());
        }
        self.write_indent()?;
        self.write_indicator("-", true, false, true)?;
        self.states.push(EmitterState::BlockSequenceItem);
        self.emit_node(event, false, false, false)
    }

    fn emit_block_mapping_key(&mut self, event: &Event, first: bool) -> Result<(), EmitterError> {
        if first {
            self.increase_indent(false, false);
        }
        if matches!(event, Event::MappingEnd) {
            self.indent = self.indents.pop().expect("indent stack is not empty");
            self.state = self.states.pop().expect("state stack is not empty");
            return Ok(());
        }
        self.write_indent()?;
        if self.check_simple_key(event) {
            self.states.push(EmitterState::BlockMappingSimpleValue);
            self.emit_node(event, false, true, true)
        } else {
            self.write_indicator("?", true, false, true)?;
            self.states.push(EmitterState::BlockMappingValue);
            self.emit_node(event, false, true, false)
        }
    }

    fn emit_block_mapping_value(
        &mut self,
        event: &Event,
        simple: bool,
    ) -> Result<(), EmitterError> {
        if simple {
            self.write_indicator(":", false, false, false)?;
        } else {
            self.write_indent()?;
            self.write_indicator(":", true, false, true)?;
        }
        self.states.push(EmitterState::BlockMappingKey);
        self.emit_node(event, false, true, false)
    }

    fn emit_node(
        &mut self,
        event: &Event,
        root: bool,
        mapping: bool,
        simple_key: bool,
    ) -> Result<(), EmitterError> {
        self.root_context = root;
        self.mapping_context = mapping;
        self.simple_key_context = simple_key;
        match event {
            Event::Alias { .. } => self.emit_alias(),
            Event::Scalar { .. } => self.emit_scalar(event),
            Event::SequenceStart { style, .. } => self.emit_sequence_start(*style),
            Event::MappingStart { style, .. } => self.emit_mapping_start(*style),
            _ => Err(EmitterError::UnexpectedEvent(
                "expected SCALAR, SEQUENCE-START, MAPPING-START, or ALIAS",
            )),
        }
    }

    fn emit_alias(&mut self) -> Result<(), EmitterError> {
        self.process_anchor()?;
        if self.simple_key_context {
            // Keep the alias name and the following ':' apart.
            self.put(' ')?;
        }
        self.state = self.states.pop().expect("state stack is not empty");
        Ok(())
    }

    fn emit_scalar(&mut self, event: &Event) -> Result<(), EmitterError> {
        self.select_scalar_style(event)?;
        self.process_anchor()?;
        self.process_tag()?;
        self.increase_indent(true, false);
        self.process_scalar()?;
        self.indent = self.indents.pop().expect("indent stack is not empty");
        self.state = self.states.pop().expect("state stack is not empty");
        Ok(())
    }

    fn emit_sequence_start(&mut self, style: CollectionStyle) -> Result<(), EmitterError> {
        self.process_anchor()?;
        self.process_tag()?;
        if self.flow_level > 0
            || self.canonical
            || style == CollectionStyle::Flow
            || self.check_empty_sequence()
        {
            self.state = EmitterState::FlowSequenceFirstItem;
        } else {
            self.state = EmitterState::BlockSequenceFirstItem;
        }
        Ok(())
    }

    fn emit_mapping_start(&mut self, style: CollectionStyle) -> Result<(), EmitterError> {
        self.process_anchor()?;
        self.process_tag()?;
        if self.flow_level > 0
            || self.canonical
            || style == CollectionStyle::Flow
            || self.check_empty_mapping()
        {
            self.state = EmitterState::FlowMappingFirstKey;
        } else {
            self.state = EmitterState::BlockMappingFirstKey;
        }
        Ok(())
    }

    /// The document being started has no content: the next queued event
    /// already ends it.
    fn check_empty_document(&self) -> bool {
        matches!(self.events.front(), Some(Event::DocumentEnd { .. }))
    }

    /// The sequence being started is closed by the next queued event.
    fn check_empty_sequence(&self) -> bool {
        matches!(self.events.front(), Some(Event::SequenceEnd))
    }

    /// The mapping being started is closed by the next queued event.
    fn check_empty_mapping(&self) -> bool {
        matches!(self.events.front(), Some(Event::MappingEnd))
    }

    /// May this node be written as a simple (inline) mapping key?
    ///
    /// Aliases, short single-line scalars, and empty containers qualify;
    /// anything longer than 128 characters, multiline, or non-empty does
    /// not.
    fn check_simple_key(&self, event: &Event) -> bool {
        let anchor_length = self.anchor_data.anchor.as_ref().map_or(0, String::len);
        let tag_length = self.tag_data.handle.as_ref().map_or(0, String::len)
            + self.tag_data.suffix.as_ref().map_or(0, String::len);
        let length = match event {
            Event::Alias { .. } => anchor_length,
            Event::Scalar { .. } => {
                if self.scalar_data.multiline {
                    return false;
                }
                anchor_length + tag_length + self.scalar_data.value.len()
            }
            Event::SequenceStart { .. } => {
                if !self.check_empty_sequence() {
                    return false;
                }
                anchor_length + tag_length
            }
            Event::MappingStart { .. } => {
                if !self.check_empty_mapping() {
                    return false;
                }
                anchor_length + tag_length
            }
            _ => return false,
        };
        length <= 128
    }

    fn select_scalar_style(&mut self, event: &Event) -> Result<(), EmitterError> {
        let Event::Scalar {
            plain_implicit,
            quoted_implicit,
            style,
            ..
        } = event
        else {
            return Err(EmitterError::InvalidState(
                "style selection on a non-scalar event",
            ));
        };
        let mut style = *style;
        let no_tag = self.tag_data.handle.is_none() && self.tag_data.suffix.is_none();
        if no_tag && !*plain_implicit && !*quoted_implicit {
            return Err(EmitterError::InvalidArgument(
                "neither tag nor implicit flags are specified",
            ));
        }
        if style == ScalarStyle::Any {
            style = ScalarStyle::Plain;
        }
        if self.canonical {
            style = ScalarStyle::DoubleQuoted;
        }
        if self.simple_key_context && self.scalar_data.multiline {
            style = ScalarStyle::DoubleQuoted;
        }
        if style == ScalarStyle::Plain {
            if (self.flow_level > 0 && !self.scalar_data.flow_plain_allowed)
                || (self.flow_level == 0 && !self.scalar_data.block_plain_allowed)
            {
                style = ScalarStyle::SingleQuoted;
            }
            if self.scalar_data.value.is_empty()
                && (self.flow_level > 0 || self.simple_key_context)
            {
                style = ScalarStyle::SingleQuoted;
            }
            if no_tag && !*plain_implicit {
                style = ScalarStyle::SingleQuoted;
            }
        }
        if style == ScalarStyle::SingleQuoted && !self.scalar_data.single_quoted_allowed {
            style = ScalarStyle::DoubleQuoted;
        }
        if matches!(style, ScalarStyle::Literal | ScalarStyle::Folded)
            && (!self.scalar_data.block_allowed
                || self.flow_level > 0
                || self.simple_key_context)
        {
            style = ScalarStyle::DoubleQuoted;
        }
        self.scalar_data.style = style;
        Ok(())
    }

    fn process_anchor(&mut self) -> Result<(), EmitterError> {
        let Some(anchor) = self.anchor_data.anchor.take() else {
            return Ok(());
        };
        let indicator = if self.anchor_data.alias { "*" } else { "&" };
        self.write_indicator(indicator, true, false, false)?;
        self.write_anchor(&anchor)
    }

    fn process_tag(&mut self) -> Result<(), EmitterError> {
        if self.tag_data.handle.is_none() && self.tag_data.suffix.is_none() {
            return Ok(());
        }
        let handle = self.tag_data.handle.take();
        let suffix = self.tag_data.suffix.take();
        if let Some(handle) = handle {
            self.write_tag_handle(&handle)?;
            if let Some(suffix) = suffix {
                self.write_tag_content(&suffix, false)?;
            }
        } else if let Some(suffix) = suffix {
            // No directive covers this tag; write it verbatim.
            self.write_indicator("!<", true, false, false)?;
            self.write_tag_content(&suffix, false)?;
            self.write_indicator(">", false, false, false)?;
        }
        Ok(())
    }

    fn process_scalar(&mut self) -> Result<(), EmitterError> {
        let value = std::mem::take(&mut self.scalar_data.value);
        let allow_breaks = !self.simple_key_context;
        match self.scalar_data.style {
            ScalarStyle::Plain => self.write_plain_scalar(&value, allow_breaks),
            ScalarStyle::SingleQuoted => self.write_single_quoted_scalar(&value, allow_breaks),
            ScalarStyle::DoubleQuoted => self.write_double_quoted_scalar(&value, allow_breaks),
            ScalarStyle::Literal => self.write_literal_scalar(&value),
            ScalarStyle::Folded => self.write_folded_scalar(&value),
            ScalarStyle::Any => Err(EmitterError::InvalidState("no scalar style was selected")),
        }
    }

    fn analyze_event(&mut self, event: &Event) -> Result<(), EmitterError> {
        self.anchor_data = AnchorData::default();
        self.tag_data = TagData::default();
        self.scalar_data = ScalarData::default();
        match event {
            Event::Alias { anchor } => self.analyze_anchor(anchor, true),
            Event::Scalar {
                anchor,
                tag,
                value,
                plain_implicit,
                quoted_implicit,
                ..
            } => {
                if let Some(anchor) = anchor {
                    self.analyze_anchor(anchor, false);
                }
                if let Some(tag) = tag {
                    if self.canonical || (!*plain_implicit && !*quoted_implicit) {
                        self.analyze_tag(tag)?;
                    }
                }
                self.analyze_scalar_value(value);
            }
            Event::SequenceStart {
                anchor,
                tag,
                implicit,
                ..
            }
            | Event::MappingStart {
                anchor,
                tag,
                implicit,
                ..
            } => {
                if let Some(anchor) = anchor {
                    self.analyze_anchor(anchor, false);
                }
                if let Some(tag) = tag {
                    if self.canonical || !*implicit {
                        self.analyze_tag(tag)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Record the anchor of the current event. Producers guarantee
    /// well-formed anchor names; they are written verbatim.
    fn analyze_anchor(&mut self, anchor: &str, alias: bool) {
        self.anchor_data.anchor = Some(String::from(anchor));
        self.anchor_data.alias = alias;
    }

    /// Resolve a tag against the directives in effect. The directive with
    /// the longest prefix of the tag wins; the suffix is never empty. A
    /// tag no directive covers is kept whole for verbatim output.
    fn analyze_tag(&mut self, tag: &str) -> Result<(), EmitterError> {
        if tag.is_empty() {
            return Err(EmitterError::InvalidArgument("tag value must not be empty"));
        }
        let mut matched: Option<&TagDirective> = None;
        for directive in &self.tag_directives {
            if directive.prefix.len() < tag.len()
                && tag.starts_with(directive.prefix.as_str())
                && matched.map_or(true, |best| directive.prefix.len() > best.prefix.len())
            {
                matched = Some(directive);
            }
        }
        if let Some(directive) = matched {
            self.tag_data.handle = Some(directive.handle.clone());
            self.tag_data.suffix = Some(String::from(&tag[directive.prefix.len()..]));
        } else {
            self.tag_data.suffix = Some(String::from(tag));
        }
        Ok(())
    }

    fn analyze_scalar_value(&mut self, value: &str) {
        let analysis = analyze_scalar(value, self.unicode);
        self.scalar_data = ScalarData {
            value: String::from(value),
            multiline: analysis.multiline,
            flow_plain_allowed: analysis.flow_plain_allowed,
            block_plain_allowed: analysis.block_plain_allowed,
            single_quoted_allowed: analysis.single_quoted_allowed,
            block_allowed: analysis.block_allowed,
            style: ScalarStyle::Any,
        };
    }

    fn append_tag_directive(
        &mut self,
        directive: TagDirective,
        allow_duplicates: bool,
    ) -> Result<(), EmitterError> {
        if self
            .tag_directives
            .iter()
            .any(|existing| existing.handle == directive.handle)
        {
            if allow_duplicates {
                return Ok(());
            }
            return Err(EmitterError::DuplicateTagDirective(directive.handle));
        }
        self.tag_directives.push(directive);
        Ok(())
    }

    fn increase_indent(&mut self, flow: bool, indentless: bool) {
        self.indents.push(self.indent);
        if self.indent < 0 {
            self.indent = if flow { self.best_indent } else { 0 };
        } else if !indentless {
            self.indent += self.best_indent;
        }
    }
}

fn default_tag_directives() -> [TagDirective; 2] {
    [
        TagDirective::new("!", "!"),
        TagDirective::new("!!", "tag:yaml.org,2002:"),
    ]
}

fn analyze_tag_directive(directive: &TagDirective) -> Result<(), EmitterError> {
    if directive.handle.is_empty() {
        return Err(EmitterError::InvalidArgument(
            "tag handle must not be empty",
        ));
    }
    if !directive.handle.starts_with('!') {
        return Err(EmitterError::InvalidArgument(
            "tag handle must start with '!'",
        ));
    }
    if !directive.handle.ends_with('!') {
        return Err(EmitterError::InvalidArgument(
            "tag handle must end with '!'",
        ));
    }
    if directive.handle.len() > 1 {
        let interior = &directive.handle[1..directive.handle.len() - 1];
        if !interior.chars().all(is_alpha) {
            return Err(EmitterError::InvalidArgument(
                "tag handle must contain alphanumerical characters only",
            ));
        }
    }
    if directive.prefix.is_empty() {
        return Err(EmitterError::InvalidArgument(
            "tag prefix must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionDirective;

    fn started_emitter(output: &mut Vec<u8>) -> Emitter<'_> {
        let mut emitter = Emitter::new();
        emitter.set_output(output);
        emitter.emit(Event::stream_start()).unwrap();
        emitter
            .emit(Event::document_start(None, &[], true))
            .unwrap();
        emitter
    }

    #[test]
    fn first_event_must_be_stream_start() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        let error = emitter
            .emit(Event::scalar(None, None, "x", true, true, ScalarStyle::Any))
            .unwrap_err();
        assert!(matches!(error, EmitterError::UnexpectedEvent(_)));
    }

    #[test]
    fn nothing_after_stream_end() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        emitter
            .emit(Event::scalar(None, None, "x", true, true, ScalarStyle::Any))
            .unwrap();
        emitter.emit(Event::document_end(true)).unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        let error = emitter.emit(Event::stream_start()).unwrap_err();
        assert!(matches!(error, EmitterError::UnexpectedEvent(_)));
    }

    #[test]
    fn rejects_incompatible_version() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.emit(Event::stream_start()).unwrap();
        emitter
            .emit(Event::document_start(
                Some(VersionDirective { major: 1, minor: 2 }),
                &[],
                true,
            ))
            .unwrap();
        // The document start is dispatched once its look-ahead arrives.
        let error = emitter
            .emit(Event::scalar(None, None, "x", true, true, ScalarStyle::Any))
            .unwrap_err();
        assert!(matches!(
            error,
            EmitterError::IncompatibleVersion { major: 1, minor: 2 }
        ));
    }

    #[test]
    fn rejects_duplicate_tag_directive() {
        let directives = [
            TagDirective::new("!e!", "tag:example.com,2024:"),
            TagDirective::new("!e!", "tag:example.org,2024:"),
        ];
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.emit(Event::stream_start()).unwrap();
        emitter
            .emit(Event::document_start(None, &directives, true))
            .unwrap();
        let error = emitter
            .emit(Event::scalar(None, None, "x", true, true, ScalarStyle::Any))
            .unwrap_err();
        assert!(matches!(error, EmitterError::DuplicateTagDirective(handle) if handle == "!e!"));
    }

    #[test]
    fn rejects_malformed_tag_handle() {
        for handle in ["", "e!", "!e", "!e e!"] {
            let directives = [TagDirective::new(handle, "tag:example.com,2024:")];
            let mut output = Vec::new();
            let mut emitter = Emitter::new();
            emitter.set_output(&mut output);
            emitter.emit(Event::stream_start()).unwrap();
            emitter
                .emit(Event::document_start(None, &directives, true))
                .unwrap();
            let error = emitter
                .emit(Event::scalar(None, None, "x", true, true, ScalarStyle::Any))
                .unwrap_err();
            assert!(
                matches!(error, EmitterError::InvalidArgument(_)),
                "{handle:?}"
            );
        }
    }

    #[test]
    fn scalar_needs_tag_or_implicit() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        let error = emitter
            .emit(Event::scalar(None, None, "x", false, false, ScalarStyle::Any))
            .unwrap_err();
        assert!(matches!(error, EmitterError::InvalidArgument(_)));
    }

    #[test]
    fn indent_and_width_ranges() {
        let mut emitter = Emitter::new();
        assert!(matches!(
            emitter.set_indent(1),
            Err(EmitterError::InvalidArgument(_))
        ));
        assert!(matches!(
            emitter.set_indent(10),
            Err(EmitterError::InvalidArgument(_))
        ));
        emitter.set_indent(4).unwrap();
        assert!(matches!(
            emitter.set_width(8),
            Err(EmitterError::InvalidArgument(_))
        ));
        emitter.set_width(9).unwrap();
        // Unlimited width is expressed as a negative value.
        emitter.set_width(-1).unwrap();
    }

    #[test]
    fn long_keys_are_spelled_out() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        let long_key = "k".repeat(129);
        for event in [
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            Event::scalar(None, None, &long_key, true, true, ScalarStyle::Any),
            Event::scalar(None, None, "v", true, true, ScalarStyle::Any),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, format!("? {long_key}\n: v\n"));
    }

    #[test]
    fn multiline_keys_are_spelled_out() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        for event in [
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            Event::scalar(None, None, "two\nlines", true, true, ScalarStyle::Any),
            Event::scalar(None, None, "v", true, true, ScalarStyle::Any),
            Event::mapping_end(),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "? 'two\n\n  lines'\n: v\n");
    }

    #[test]
    fn unmatched_tag_is_written_verbatim() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        for event in [
            Event::scalar(
                None,
                Some("tag:other.org,2024:thing"),
                "x",
                false,
                false,
                ScalarStyle::Any,
            ),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "!<tag:other.org,2024:thing> x\n"
        );
    }

    #[test]
    fn secondary_handle_resolution() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        for event in [
            Event::scalar(
                None,
                Some("tag:yaml.org,2002:str"),
                "x",
                false,
                false,
                ScalarStyle::Any,
            ),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), "!!str x\n");
    }

    #[test]
    fn longest_prefix_wins() {
        let directives = [
            TagDirective::new("!short!", "tag:example.com,2024:"),
            TagDirective::new("!long!", "tag:example.com,2024:nested:"),
        ];
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.emit(Event::stream_start()).unwrap();
        emitter
            .emit(Event::document_start(None, &directives, true))
            .unwrap();
        for event in [
            Event::scalar(
                None,
                Some("tag:example.com,2024:nested:leaf"),
                "x",
                false,
                false,
                ScalarStyle::Any,
            ),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        let output = String::from_utf8(output).unwrap();
        assert!(output.ends_with("--- !long!leaf x\n"), "{output:?}");
    }

    #[test]
    fn tag_suffix_is_percent_escaped() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        for event in [
            Event::scalar(
                None,
                Some("tag:yaml.org,2002:with space"),
                "x",
                false,
                false,
                ScalarStyle::Any,
            ),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), "!!with%20space x\n");
    }

    #[test]
    fn flow_styles_propagate_inward() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        for event in [
            Event::sequence_start(None, None, true, CollectionStyle::Flow),
            Event::mapping_start(None, None, true, CollectionStyle::Block),
            Event::scalar(None, None, "k", true, true, ScalarStyle::Any),
            Event::scalar(None, None, "v", true, true, ScalarStyle::Any),
            Event::mapping_end(),
            Event::sequence_end(),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        // A nested collection cannot fall back to block style.
        assert_eq!(String::from_utf8(output).unwrap(), "[{k: v}]\n");
    }

    #[test]
    fn document_must_have_content() {
        let mut output = Vec::new();
        let mut emitter = Emitter::new();
        emitter.set_output(&mut output);
        emitter.emit(Event::stream_start()).unwrap();
        emitter
            .emit(Event::document_start(None, &[], true))
            .unwrap();
        let error = emitter.emit(Event::document_end(true)).unwrap_err();
        assert!(matches!(error, EmitterError::UnexpectedEvent(_)));
    }

    #[test]
    fn second_document_gets_explicit_marker() {
        let mut output = Vec::new();
        let mut emitter = started_emitter(&mut output);
        for event in [
            Event::scalar(None, None, "one", true, true, ScalarStyle::Any),
            Event::document_end(true),
            Event::document_start(None, &[], true),
            Event::scalar(None, None, "two", true, true, ScalarStyle::Any),
            Event::document_end(true),
            Event::stream_end(),
        ] {
            emitter.emit(event).unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), "one\n--- two\n");
    }
}
