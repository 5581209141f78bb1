/*
 * Printf-style template engine
 *
 * Directives take the form %[flags][width][.precision]<conversion>:
 * - conversions: s (any value), d (decimal int), x/X (hex int), o (octal
 *   int), f (float), c (char), b (bool), F (epoch-millis rendered as a
 *   local ISO date), and %% for a literal percent sign
 * - flags: '-' left-aligns within the width, '0' zero-pads numerics
 * - precision clips strings to a char count and picks float decimal places
 *
 * Arguments are consumed left to right. A directive with no matching
 * argument, a type mismatch, or an unknown conversion makes the template
 * malformed; surplus arguments are ignored. Messages logged without an
 * argument list bypass this engine entirely and are rendered verbatim.
 */

use std::borrow::Cow;

use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::record::Arg;
use crate::writer::LineBuffer;

#[derive(Debug)]
struct Directive {
    left_align: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conv: u8,
}

/// Expand `template` against `args`, appending the result to `buf`.
pub(crate) fn expand_into(buf: &mut LineBuffer, template: &str, args: &[Arg]) -> Result<()> {
    run(template, args, Some(buf))
}

/// Check `template` against `args` without producing output. Catches the
/// same errors expansion would.
pub(crate) fn validate(template: &str, args: &[Arg]) -> Result<()> {
    run(template, args, None)
}

/// Expand into a fresh string, for consumers that want text rather than a
/// sink, such as filename construction.
pub(crate) fn render(template: &str, args: &[Arg]) -> Result<String> {
    let mut buf = LineBuffer::new();
    expand_into(&mut buf, template, args)?;
    Ok(String::from_utf8_lossy(buf.as_bytes()).into_owned())
}

fn run(template: &str, args: &[Arg], mut out: Option<&mut LineBuffer>) -> Result<()> {
    let bytes = template.as_bytes();
    let mut i = 0;
    let mut lit_start = 0;
    let mut next_arg = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if let Some(buf) = out.as_deref_mut() {
            buf.extend(&bytes[lit_start..i]);
        }
        let pos = i;
        i += 1;
        if i >= bytes.len() {
            return Err(err_at(pos, "template ends inside a directive"));
        }
        if bytes[i] == b'%' {
            if let Some(buf) = out.as_deref_mut() {
                buf.push(b'%');
            }
            i += 1;
            lit_start = i;
            continue;
        }

        let (directive, after) = parse_directive(bytes, pos, i)?;
        i = after;
        lit_start = i;

        let arg = args.get(next_arg).ok_or_else(|| {
            err_at(
                pos,
                format!(
                    "missing argument {} for '%{}'",
                    next_arg + 1,
                    directive.conv as char
                ),
            )
        })?;
        next_arg += 1;
        check_arg(&directive, arg, pos)?;
        if let Some(buf) = out.as_deref_mut() {
            write_arg(buf, &directive, arg);
        }
    }

    if let Some(buf) = out.as_deref_mut() {
        buf.extend(&bytes[lit_start..]);
    }
    Ok(())
}

fn parse_directive(bytes: &[u8], pos: usize, mut i: usize) -> Result<(Directive, usize)> {
    let mut d = Directive {
        left_align: false,
        zero_pad: false,
        width: 0,
        precision: None,
        conv: 0,
    };

    loop {
        match bytes.get(i) {
            Some(b'-') if !d.left_align => {
                d.left_align = true;
                i += 1;
            }
            Some(b'0') if !d.zero_pad => {
                d.zero_pad = true;
                i += 1;
            }
            _ => break,
        }
    }

    while let Some(c @ b'0'..=b'9') = bytes.get(i).copied() {
        d.width = d.width * 10 + (c - b'0') as usize;
        if d.width > 1_000_000 {
            return Err(err_at(pos, "field width too large"));
        }
        i += 1;
    }

    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let mut precision = 0usize;
        let mut digits = false;
        while let Some(c @ b'0'..=b'9') = bytes.get(i).copied() {
            digits = true;
            precision = precision * 10 + (c - b'0') as usize;
            if precision > 1_000_000 {
                return Err(err_at(pos, "precision too large"));
            }
            i += 1;
        }
        if !digits {
            return Err(err_at(pos, "precision has no digits"));
        }
        d.precision = Some(precision);
    }

    d.conv = match bytes.get(i).copied() {
        Some(c) => c,
        None => return Err(err_at(pos, "template ends inside a directive")),
    };
    i += 1;

    if !matches!(d.conv, b's' | b'd' | b'x' | b'X' | b'o' | b'f' | b'c' | b'b' | b'F') {
        return Err(err_at(
            pos,
            format!("unknown conversion '%{}'", d.conv as char),
        ));
    }
    if d.left_align && d.zero_pad {
        return Err(err_at(pos, "conflicting '-' and '0' flags"));
    }
    if d.zero_pad && !matches!(d.conv, b'd' | b'x' | b'X' | b'o' | b'f') {
        return Err(err_at(
            pos,
            format!("zero padding is not valid for '%{}'", d.conv as char),
        ));
    }
    if d.precision.is_some() && !matches!(d.conv, b's' | b'f') {
        return Err(err_at(
            pos,
            format!("precision is not valid for '%{}'", d.conv as char),
        ));
    }

    Ok((d, i))
}

fn check_arg(d: &Directive, arg: &Arg, pos: usize) -> Result<()> {
    let ok = match d.conv {
        b's' => true,
        b'd' | b'x' | b'X' | b'o' | b'F' => matches!(arg, Arg::Int(_) | Arg::UInt(_)),
        b'f' => matches!(arg, Arg::Float(_)),
        b'c' => matches!(arg, Arg::Char(_)),
        b'b' => matches!(arg, Arg::Bool(_)),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(err_at(
            pos,
            format!(
                "'%{}' cannot format a {} value",
                d.conv as char,
                kind_of(arg)
            ),
        ))
    }
}

/// Render one checked argument. Type agreement is established by
/// `check_arg` before this runs.
fn write_arg(buf: &mut LineBuffer, d: &Directive, arg: &Arg) {
    match d.conv {
        b's' => {
            let text = display_string(arg);
            let clipped = match d.precision {
                Some(p) => clip_chars(&text, p),
                None => &text,
            };
            pad_text(buf, clipped, d);
        }
        b'd' => match arg {
            Arg::Int(v) => pad_digits(buf, &v.to_string(), d),
            Arg::UInt(v) => pad_digits(buf, &v.to_string(), d),
            _ => {}
        },
        b'x' => pad_digits(buf, &format!("{:x}", int_bits(arg)), d),
        b'X' => pad_digits(buf, &format!("{:X}", int_bits(arg)), d),
        b'o' => pad_digits(buf, &format!("{:o}", int_bits(arg)), d),
        b'f' => {
            if let Arg::Float(v) = arg {
                let precision = d.precision.unwrap_or(6);
                pad_digits(buf, &format!("{:.*}", precision, v), d);
            }
        }
        b'c' | b'b' => pad_text(buf, &display_string(arg), d),
        b'F' => pad_text(buf, &iso_local_date(int_value(arg)), d),
        _ => {}
    }
}

fn display_string(arg: &Arg) -> Cow<'_, str> {
    match arg {
        Arg::Str(s) => Cow::Borrowed(s.as_str()),
        Arg::Int(v) => Cow::Owned(v.to_string()),
        Arg::UInt(v) => Cow::Owned(v.to_string()),
        Arg::Float(v) => Cow::Owned(v.to_string()),
        Arg::Bool(v) => Cow::Borrowed(if *v { "true" } else { "false" }),
        Arg::Char(v) => Cow::Owned(v.to_string()),
    }
}

fn kind_of(arg: &Arg) -> &'static str {
    match arg {
        Arg::Str(_) => "string",
        Arg::Int(_) | Arg::UInt(_) => "integer",
        Arg::Float(_) => "float",
        Arg::Bool(_) => "bool",
        Arg::Char(_) => "char",
    }
}

/// Two's-complement bit pattern for the radix conversions.
fn int_bits(arg: &Arg) -> u64 {
    match arg {
        Arg::Int(v) => *v as u64,
        Arg::UInt(v) => *v,
        _ => 0,
    }
}

fn int_value(arg: &Arg) -> i64 {
    match arg {
        Arg::Int(v) => *v,
        Arg::UInt(v) => *v as i64,
        _ => 0,
    }
}

fn iso_local_date(epoch_millis: i64) -> String {
    // out-of-range input falls back to the epoch day
    let utc = DateTime::from_timestamp_millis(epoch_millis).unwrap_or_default();
    utc.with_timezone(&Local).date_naive().to_string()
}

fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn pad_text(buf: &mut LineBuffer, text: &str, d: &Directive) {
    let len = text.chars().count();
    if d.width <= len {
        buf.push_str(text);
        return;
    }
    let fill = d.width - len;
    if d.left_align {
        buf.push_str(text);
        buf.push_repeat(b' ', fill);
    } else {
        buf.push_repeat(b' ', fill);
        buf.push_str(text);
    }
}

/// Like `pad_text`, but zero padding goes between the sign and the digits.
fn pad_digits(buf: &mut LineBuffer, text: &str, d: &Directive) {
    if d.zero_pad && d.width > text.len() {
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text),
        };
        buf.push_str(sign);
        buf.push_repeat(b'0', d.width - text.len());
        buf.push_str(digits);
    } else {
        pad_text(buf, text, d);
    }
}

fn err_at(pos: usize, reason: impl Into<String>) -> Error {
    Error::MalformedTemplate {
        pos,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expand(template: &str, args: &[Arg]) -> String {
        render(template, args).unwrap()
    }

    fn expect_err(template: &str, args: &[Arg]) -> (usize, String) {
        match render(template, args) {
            Err(Error::MalformedTemplate { pos, reason }) => (pos, reason),
            other => panic!("expected malformed template, got {:?}", other),
        }
    }

    #[test]
    fn literal_and_escaped_percent() {
        assert_eq!(expand("plain text", &[]), "plain text");
        assert_eq!(expand("100%% done", &[]), "100% done");
        assert_eq!(expand("%%", &[]), "%");
    }

    #[test]
    fn string_conversion_accepts_all_kinds() {
        assert_eq!(
            expand("%s %s %s %s %s", &[
                Arg::from("a"),
                Arg::from(-3i32),
                Arg::from(true),
                Arg::from('z'),
                Arg::from(9u64),
            ]),
            "a -3 true z 9"
        );
    }

    #[test]
    fn decimal_conversion() {
        assert_eq!(expand("%d", &[Arg::from(42i32)]), "42");
        assert_eq!(expand("%d", &[Arg::from(-42i32)]), "-42");
        assert_eq!(expand("%5d", &[Arg::from(42i32)]), "   42");
        assert_eq!(expand("%-5d|", &[Arg::from(42i32)]), "42   |");
        assert_eq!(expand("%05d", &[Arg::from(42i32)]), "00042");
        assert_eq!(expand("%06d", &[Arg::from(-42i32)]), "-00042");
    }

    #[test]
    fn radix_conversions_use_two_complement_bits() {
        assert_eq!(expand("%x", &[Arg::from(255u32)]), "ff");
        assert_eq!(expand("%X", &[Arg::from(255u32)]), "FF");
        assert_eq!(expand("%o", &[Arg::from(255u32)]), "377");
        assert_eq!(expand("%x", &[Arg::from(-42i64)]), "ffffffffffffffd6");
        assert_eq!(expand("%08X", &[Arg::from(0xBEEFu32)]), "0000BEEF");
    }

    #[test]
    fn float_conversion_defaults_to_six_places() {
        assert_eq!(expand("%f", &[Arg::from(1.5f64)]), "1.500000");
        assert_eq!(expand("%.2f", &[Arg::from(1.5f64)]), "1.50");
        assert_eq!(expand("%8.2f", &[Arg::from(-1.5f64)]), "   -1.50");
        assert_eq!(expand("%08.2f", &[Arg::from(-1.5f64)]), "-0001.50");
    }

    #[test]
    fn char_and_bool_conversions() {
        assert_eq!(expand("%c%c", &[Arg::from('o'), Arg::from('k')]), "ok");
        assert_eq!(expand("%b", &[Arg::from(false)]), "false");
        assert_eq!(expand("%3c", &[Arg::from('x')]), "  x");
    }

    #[test]
    fn precision_clips_strings_by_chars() {
        assert_eq!(expand("%.3s", &[Arg::from("abcdef")]), "abc");
        assert_eq!(expand("%.2s", &[Arg::from("héllo")]), "hé");
        assert_eq!(expand("%6.3s", &[Arg::from("abcdef")]), "   abc");
    }

    #[test]
    fn date_conversion_renders_local_iso_date() {
        let millis = 86_400_000i64 * 10_000;
        let expected = chrono::Local
            .timestamp_millis_opt(millis)
            .unwrap()
            .date_naive()
            .to_string();
        assert_eq!(expand("day %F", &[Arg::Int(millis)]), format!("day {}", expected));
    }

    #[test]
    fn surplus_arguments_are_ignored() {
        assert_eq!(
            expand("%s", &[Arg::from("kept"), Arg::from("dropped")]),
            "kept"
        );
    }

    #[test]
    fn missing_argument_is_malformed() {
        let (pos, reason) = expect_err("a %s and %d", &[Arg::from("one")]);
        assert_eq!(pos, 9);
        assert!(reason.contains("missing argument 2"));
    }

    #[test]
    fn type_mismatch_is_malformed() {
        let (pos, reason) = expect_err("ab %d", &[Arg::from("nope")]);
        assert_eq!(pos, 3);
        assert!(reason.contains("string"));
        expect_err("%f", &[Arg::from(1i32)]);
        expect_err("%c", &[Arg::from("s")]);
        expect_err("%b", &[Arg::from(0i32)]);
        expect_err("%F", &[Arg::from("2024-01-01")]);
    }

    #[test]
    fn unknown_conversion_is_malformed() {
        let (pos, reason) = expect_err("%q", &[Arg::from(1i32)]);
        assert_eq!(pos, 0);
        assert!(reason.contains("unknown conversion"));
    }

    #[test]
    fn dangling_percent_is_malformed() {
        let (_, reason) = expect_err("50% off", &[Arg::from(1i32)]);
        assert!(reason.contains("unknown conversion"));
        let (pos, reason) = expect_err("trailing %", &[]);
        assert_eq!(pos, 9);
        assert!(reason.contains("ends inside"));
    }

    #[test]
    fn flag_misuse_is_malformed() {
        expect_err("%0s", &[Arg::from("x")]);
        expect_err("%-05d", &[Arg::from(1i32)]);
        expect_err("%.2d", &[Arg::from(1i32)]);
        expect_err("%.s", &[Arg::from("x")]);
    }

    #[test]
    fn validate_matches_expansion_without_output() {
        assert!(validate("ok %s %d", &[Arg::from("a"), Arg::from(1i32)]).is_ok());
        assert!(validate("ok %s %d", &[Arg::from("a")]).is_err());
        assert!(validate("%d", &[Arg::from("text")]).is_err());
        assert!(validate("trailing %", &[]).is_err());
    }
}
