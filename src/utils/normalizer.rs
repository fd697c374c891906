//! Text and field normalization applied while loading the paper table.
//!
//! Everything here is total: malformed input never errors, it degrades to a
//! documented default that is visible in the return type through [`Coerced`].

use std::iter::Peekable;
use std::str::Chars;

/// Outcome of a permissive parse.
///
/// `Parsed` carries the value read from the input, `Fallback` carries the
/// documented default (or the raw input) used because the input could not be
/// read as intended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced<T> {
    Parsed(T),
    Fallback(T),
}

impl<T> Coerced<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            Coerced::Parsed(v) | Coerced::Fallback(v) => v,
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Coerced::Fallback(_))
    }
}

/// Canonical search text.
///
/// Lowercases, replaces every character outside `[a-z0-9]` and whitespace
/// with a space, collapses whitespace runs and trims. `None` yields `""`.
pub fn clean(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a list-like metadata field (authors, references).
///
/// Values written as a literal list (`["A", 'B', 3]`) are parsed and their
/// items joined with `", "`. String items are joined as-is; nested lists,
/// tuples, dicts and sets are rendered in literal form (`['a']`,
/// `{'name': 'A'}`). Values that only look like a list but do not parse fall
/// back to the trimmed original; anything else passes through trimmed.
pub fn normalize_list_like(value: Option<&str>) -> Coerced<String> {
    let Some(value) = value else {
        return Coerced::Fallback(String::new());
    };
    let val = value.trim();
    if val.starts_with('[') && val.ends_with(']') {
        return match parse_literal(val) {
            Some(Literal::List(items)) => Coerced::Parsed(
                items.iter().map(Literal::to_text).collect::<Vec<_>>().join(", "),
            ),
            _ => Coerced::Fallback(val.to_string()),
        };
    }
    Coerced::Parsed(val.to_string())
}

/// Literal value accepted inside a list cell.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    /// Number or `True`/`False`/`None`, already in display form
    Atom(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Plain text form: strings unquoted, everything else as a literal.
    fn to_text(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            other => other.to_literal(),
        }
    }

    /// Literal form, strings quoted.
    fn to_literal(&self) -> String {
        fn join(items: &[Literal]) -> String {
            items.iter().map(Literal::to_literal).collect::<Vec<_>>().join(", ")
        }
        match self {
            Literal::Str(s) => quote(s),
            Literal::Atom(a) => a.clone(),
            Literal::List(items) => format!("[{}]", join(items)),
            Literal::Tuple(items) if items.len() == 1 => format!("({},)", items[0].to_literal()),
            Literal::Tuple(items) => format!("({})", join(items)),
            Literal::Set(items) => format!("{{{}}}", join(items)),
            Literal::Dict(pairs) => {
                let body: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_literal(), v.to_literal()))
                    .collect();
                format!("{{{}}}", body.join(", "))
            }
        }
    }
}

/// Single quotes unless the text holds a single quote and no double quote.
fn quote(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

/// Parse one complete literal. Returns `None` on anything it does not
/// understand or on trailing input.
fn parse_literal(src: &str) -> Option<Literal> {
    let mut chars = src.chars().peekable();
    skip_ws(&mut chars);
    let value = parse_value(&mut chars)?;
    skip_ws(&mut chars);
    if chars.next().is_some() {
        return None;
    }
    Some(value)
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_value(chars: &mut Peekable<Chars<'_>>) -> Option<Literal> {
    match *chars.peek()? {
        '[' => {
            chars.next();
            parse_items(chars, ']').map(|(items, _)| Literal::List(items))
        }
        '(' => {
            chars.next();
            let (mut items, trailing_comma) = parse_items(chars, ')')?;
            // `(x)` is grouping, `(x,)` is a tuple
            if items.len() == 1 && !trailing_comma {
                return items.pop();
            }
            Some(Literal::Tuple(items))
        }
        '{' => {
            chars.next();
            parse_braced(chars)
        }
        '\'' | '"' => parse_quoted(chars).map(Literal::Str),
        c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => parse_number(chars).map(Literal::Atom),
        c if c.is_ascii_alphabetic() => {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            match word.as_str() {
                "True" | "False" | "None" => Some(Literal::Atom(word)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Comma separated values up to `close`, which is consumed.
/// Also reports whether the last item was followed by a comma.
fn parse_items(chars: &mut Peekable<Chars<'_>>, close: char) -> Option<(Vec<Literal>, bool)> {
    let mut items = Vec::new();
    let mut trailing_comma = false;
    loop {
        skip_ws(chars);
        if chars.peek() == Some(&close) {
            chars.next();
            return Some((items, trailing_comma));
        }
        items.push(parse_value(chars)?);
        skip_ws(chars);
        match chars.next()? {
            ',' => trailing_comma = true,
            c if c == close => return Some((items, false)),
            _ => return None,
        }
    }
}

/// Body of `{...}` after the opening brace: a dict, a set, or `{}` (empty dict).
fn parse_braced(chars: &mut Peekable<Chars<'_>>) -> Option<Literal> {
    let mut pairs = Vec::new();
    let mut set = Vec::new();
    loop {
        skip_ws(chars);
        if chars.peek() == Some(&'}') {
            chars.next();
            break;
        }
        let key = parse_value(chars)?;
        skip_ws(chars);
        if chars.peek() == Some(&':') {
            if !set.is_empty() {
                return None;
            }
            chars.next();
            skip_ws(chars);
            pairs.push((key, parse_value(chars)?));
        } else {
            if !pairs.is_empty() {
                return None;
            }
            set.push(key);
        }
        skip_ws(chars);
        match chars.next()? {
            ',' => continue,
            '}' => break,
            _ => return None,
        }
    }
    if set.is_empty() {
        Some(Literal::Dict(pairs))
    } else {
        Some(Literal::Set(set))
    }
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let quote = chars.next()?;
    let mut out = String::new();
    loop {
        match chars.next()? {
            c if c == quote => return Some(out),
            '\\' => {
                let escaped = chars.next()?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' | '\'' | '"' => out.push(escaped),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            c => out.push(c),
        }
    }
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut raw = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_') {
            raw.push(c);
            chars.next();
        } else {
            break;
        }
    }
    let digits = raw.replace('_', "");
    if let Ok(int) = digits.parse::<i64>() {
        return Some(int.to_string());
    }
    let float = digits.parse::<f64>().ok()?;
    if !float.is_finite() {
        return None;
    }
    Some(format!("{:?}", float))
}
