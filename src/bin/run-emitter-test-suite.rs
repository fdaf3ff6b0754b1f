//! Drive the emitter with the event syntax of the YAML test suite.
//!
//! Each input line is one event (`+STR`, `+DOC`, `+SEQ`, `+MAP`, `=VAL`,
//! `=ALI`, and their closing counterparts); the resulting YAML stream is
//! written to stdout.

use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::process::ExitCode;

use yamel::{CollectionStyle, Emitter, Event, ScalarStyle};

fn test_main(stdin: &mut dyn Read, stdout: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let mut emitter = Emitter::new();
    emitter.set_output(stdout);
    emitter.set_canonical(false);
    emitter.set_unicode(false);

    let mut reader = io::BufReader::new(stdin);
    let mut line_buffer = String::with_capacity(1024);
    let mut value_buffer = String::with_capacity(128);

    loop {
        line_buffer.clear();
        let n = reader.read_line(&mut line_buffer)?;
        if n == 0 {
            emitter.flush()?;
            return Ok(());
        }
        let line = line_buffer.strip_suffix('\n').unwrap_or(&line_buffer);

        let event = if line.starts_with("+STR") {
            Event::stream_start()
        } else if line.starts_with("-STR") {
            Event::stream_end()
        } else if line.starts_with("+DOC") {
            let implicit = !line[4..].starts_with(" ---");
            Event::document_start(None, &[], implicit)
        } else if line.starts_with("-DOC") {
            let implicit = !line[4..].starts_with(" ...");
            Event::document_end(implicit)
        } else if line.starts_with("+MAP") {
            Event::mapping_start(
                get_anchor('&', line),
                get_tag(line),
                false,
                CollectionStyle::Block,
            )
        } else if line.starts_with("-MAP") {
            Event::mapping_end()
        } else if line.starts_with("+SEQ") {
            Event::sequence_start(
                get_anchor('&', line),
                get_tag(line),
                false,
                CollectionStyle::Block,
            )
        } else if line.starts_with("-SEQ") {
            Event::sequence_end()
        } else if line.starts_with("=VAL") {
            let mut style = ScalarStyle::Any;
            let value = get_value(line, &mut value_buffer, &mut style);
            let implicit = get_tag(line).is_none();
            Event::scalar(
                get_anchor('&', line),
                get_tag(line),
                value,
                implicit,
                implicit,
                style,
            )
        } else if line.starts_with("=ALI") {
            Event::alias(get_anchor('*', line).ok_or("missing alias name")?)
        } else {
            return Err(format!("unknown event: '{line}'").into());
        };

        emitter.emit(event)?;
    }
}

fn get_anchor(sigil: char, line: &str) -> Option<&str> {
    let (_, from_sigil) = line.split_once(sigil)?;
    match from_sigil.split_once(' ') {
        Some((until_space, _)) => Some(until_space),
        None if !from_sigil.is_empty() => Some(from_sigil),
        None => None,
    }
}

fn get_tag(line: &str) -> Option<&str> {
    let (_, from_angle_open) = line.split_once('<')?;
    let (until_angle_close, _) = from_angle_open.split_once('>')?;
    Some(until_angle_close)
}

fn get_value<'a>(line: &str, buffer: &'a mut String, style: &mut ScalarStyle) -> &'a str {
    let mut remainder = line;
    let value = loop {
        let Some((_, tail)) = remainder.split_once(' ') else {
            panic!("invalid line: {line}");
        };
        *style = match tail.chars().next().expect("event value is not empty") {
            ':' => ScalarStyle::Plain,
            '\'' => ScalarStyle::SingleQuoted,
            '"' => ScalarStyle::DoubleQuoted,
            '|' => ScalarStyle::Literal,
            '>' => ScalarStyle::Folded,
            _ => {
                // An anchor or tag; skip to the next field.
                remainder = tail;
                continue;
            }
        };
        break &tail[1..];
    };

    buffer.clear();
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            buffer.push(match chars.next().expect("unterminated escape sequence") {
                '\\' => '\\',
                '0' => '\0',
                'b' => '\x08',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                otherwise => panic!("invalid escape character: {otherwise:?}"),
            });
        } else {
            buffer.push(ch);
        }
    }

    buffer.as_str()
}

fn main() -> ExitCode {
    let args = env::args_os().skip(1);
    if args.len() == 0 {
        let _ = writeln!(io::stderr(), "Usage: run-emitter-test-suite <test.event>...");
        return ExitCode::FAILURE;
    }
    for arg in args {
        let mut stdin = match File::open(&arg) {
            Ok(file) => file,
            Err(err) => {
                let _ = writeln!(io::stderr(), "{}: {err}", arg.to_string_lossy());
                return ExitCode::FAILURE;
            }
        };
        let mut stdout = io::stdout();
        if let Err(err) = test_main(&mut stdin, &mut stdout) {
            let _ = writeln!(io::stderr(), "{err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
