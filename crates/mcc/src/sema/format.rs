//! printf format string scanning and rendering
//!
//! Shared between the analyzer (argument type checking) and the
//! interpreter (output rendering). Conversions `d i u o x X c` take an
//! int, `f F e E g G a A` take a float, and `s` takes a string. `%%`
//! is a literal percent sign; a `%` that does not start a valid
//! specifier is kept verbatim.

use crate::ast::Type;
use std::fmt::Write;

/// A single conversion specifier, e.g. `%-8.3f`
#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    pub flags: String,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub conv: char,
}

/// One piece of a scanned format string
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Lit(String),
    Spec(Spec),
}

const CONVERSIONS: &str = "diuoxXfFeEgGaAcs";

/// The argument type a conversion consumes
pub fn spec_type(conv: char) -> Type {
    match conv {
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'a' | 'A' => Type::Float,
        's' => Type::Str,
        _ => Type::Int,
    }
}

/// Scan a format string into literal runs and specifiers
pub fn scan(format: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut lit = String::new();
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            lit.push(chars[i]);
            i += 1;
            continue;
        }
        if i + 1 < chars.len() && chars[i + 1] == '%' {
            lit.push('%');
            i += 2;
            continue;
        }
        match scan_spec(&chars, i) {
            Some((spec, end)) => {
                if !lit.is_empty() {
                    pieces.push(Piece::Lit(std::mem::take(&mut lit)));
                }
                pieces.push(Piece::Spec(spec));
                i = end;
            }
            None => {
                lit.push('%');
                i += 1;
            }
        }
    }
    if !lit.is_empty() {
        pieces.push(Piece::Lit(lit));
    }
    pieces
}

/// Expected argument types for a format string, in order
pub fn arg_types(format: &str) -> Vec<Type> {
    scan(format)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Spec(spec) => Some(spec_type(spec.conv)),
            Piece::Lit(_) => None,
        })
        .collect()
}

// Scan `%[-+#0]*[width][.precision]conv` starting at the `%`.
// Returns the spec and the index one past the conversion character.
fn scan_spec(chars: &[char], start: usize) -> Option<(Spec, usize)> {
    let mut i = start + 1;
    let mut flags = String::new();
    while i < chars.len() && "-+#0".contains(chars[i]) {
        flags.push(chars[i]);
        i += 1;
    }
    let width = scan_number(chars, &mut i);
    let mut precision = None;
    if i < chars.len() && chars[i] == '.' {
        let mut j = i + 1;
        precision = scan_number(chars, &mut j);
        if precision.is_none() {
            return None;
        }
        i = j;
    }
    if i < chars.len() && CONVERSIONS.contains(chars[i]) {
        let spec = Spec {
            flags,
            width,
            precision,
            conv: chars[i],
        };
        Some((spec, i + 1))
    } else {
        None
    }
}

fn scan_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i > start {
        chars[start..*i].iter().collect::<String>().parse().ok()
    } else {
        None
    }
}

/// Render a scanned piece against its argument, already checked to be
/// the right class of value
pub fn render_spec(spec: &Spec, arg: &FormatArg) -> String {
    let body = match (spec.conv, arg) {
        ('d' | 'i' | 'u', FormatArg::Int(v)) => format_signed(*v, spec),
        ('o', FormatArg::Int(v)) => format!("{v:o}"),
        ('x', FormatArg::Int(v)) => format!("{v:x}"),
        ('X', FormatArg::Int(v)) => format!("{v:X}"),
        ('c', FormatArg::Int(v)) => char::from_u32(*v as u32)
            .map(String::from)
            .unwrap_or_default(),
        ('f' | 'F', FormatArg::Float(v)) => {
            let prec = spec.precision.unwrap_or(6);
            let mut s = String::new();
            let _ = write!(s, "{:+.*}", prec, v);
            strip_plus(s, spec)
        }
        ('e' | 'E', FormatArg::Float(v)) => {
            let prec = spec.precision.unwrap_or(6);
            let mut s = String::new();
            let _ = write!(s, "{:.*e}", prec, v);
            if spec.conv == 'E' {
                s = s.replace('e', "E");
            }
            s
        }
        ('g' | 'G' | 'a' | 'A', FormatArg::Float(v)) => format!("{v}"),
        ('s', FormatArg::Str(v)) => v.clone(),
        // Mismatches are caught before rendering; fall back to the raw value
        (_, FormatArg::Int(v)) => format!("{v}"),
        (_, FormatArg::Float(v)) => format!("{v}"),
        (_, FormatArg::Str(v)) => v.clone(),
    };
    pad(body, spec)
}

/// Argument handed to the renderer
#[derive(Debug, Clone)]
pub enum FormatArg {
    Int(i64),
    Float(f64),
    Str(String),
}

fn format_signed(v: i64, spec: &Spec) -> String {
    if spec.flags.contains('+') && v >= 0 {
        format!("+{v}")
    } else {
        format!("{v}")
    }
}

fn strip_plus(s: String, spec: &Spec) -> String {
    if spec.flags.contains('+') {
        s
    } else {
        s.trim_start_matches('+').to_string()
    }
}

fn pad(body: String, spec: &Spec) -> String {
    let Some(width) = spec.width else {
        return body;
    };
    if body.chars().count() >= width {
        return body;
    }
    let fill = width - body.chars().count();
    if spec.flags.contains('-') {
        let mut s = body;
        s.extend(std::iter::repeat_n(' ', fill));
        s
    } else if spec.flags.contains('0') {
        // Zero padding goes after any sign
        let (sign, digits) = match body.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => match body.strip_prefix('+') {
                Some(rest) => ("+", rest),
                None => ("", body.as_str()),
            },
        };
        let mut s = String::from(sign);
        s.extend(std::iter::repeat_n('0', fill));
        s.push_str(digits);
        s
    } else {
        let mut s: String = std::iter::repeat_n(' ', fill).collect();
        s.push_str(&body);
        s
    }
}
