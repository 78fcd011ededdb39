use crate::value::{Key, Type};

pub fn parse_key(text: &str, key_type: &Type) -> Option<Key> {
    match key_type {
        Type::Str => unquote(text).map(Key::Str),
        Type::Int(w) => {
            let n = parse_int(text).or_else(|| unquote_char(text).map(|c| c as i64))?;
            w.fits_int(n).then_some(Key::Int(n))
        }
        Type::Uint(w) => {
            let n = parse_uint(text).or_else(|| unquote_char(text).map(|c| c as u64))?;
            w.fits_uint(n).then_some(Key::Uint(n))
        }
        Type::Float(w) => text.parse::<f64>().ok().map(|x| Key::Float(w.round(x))),
        Type::Bool => parse_bool(text).map(Key::Bool),
        _ => None,
    }
}

/// Parses a sequence or text index: an unsigned integer literal.
pub fn parse_index(text: &str) -> Option<usize> {
    parse_uint(text).and_then(|n| usize::try_from(n).ok())
}

/// Unsigned integer literal: decimal, `0x` hex, `0o` or leading-`0` octal,
/// `0b` binary. Single underscores may separate digits or follow a prefix.
pub fn parse_uint(text: &str) -> Option<u64> {
    let (digits, radix, prefixed) = match text.as_bytes() {
        [b'0', b'x' | b'X', ..] => (&text[2..], 16, true),
        [b'0', b'o' | b'O', ..] => (&text[2..], 8, true),
        [b'0', b'b' | b'B', ..] => (&text[2..], 2, true),
        [b'0', _, ..] => (&text[1..], 8, true),
        _ => (text, 10, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    if digits.contains('_') {
        if (!prefixed && digits.starts_with('_'))
            || digits.ends_with('_')
            || digits.contains("__")
        {
            return None;
        }
        let joined: String = digits.chars().filter(|c| *c != '_').collect();
        return u64::from_str_radix(&joined, radix).ok();
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Signed integer literal: an optional sign followed by `parse_uint` syntax.
pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_uint(rest)? as i128;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Interprets a quoted literal: `"..."` with escapes, back-quoted raw text,
/// or a single-quoted character.
pub fn unquote(text: &str) -> Option<String> {
    let quote = text.chars().next()?;
    if !matches!(quote, '`' | '"' | '\'') || text.len() < 2 || !text.ends_with(quote) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    match quote {
        '`' => (!inner.contains('`')).then(|| inner.replace('\r', "")),
        '"' => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => out.push(unescape(&mut chars, '"')?),
                    '"' | '\n' => return None,
                    c => out.push(c),
                }
            }
            Some(out)
        }
        _ => unquote_char(text).map(String::from),
    }
}

pub fn unquote_char(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let c = match chars.next()? {
        '\\' => unescape(&mut chars, '\'')?,
        '\'' | '\n' => return None,
        c => c,
    };
    chars.next().is_none().then_some(c)
}

fn unescape(chars: &mut std::str::Chars<'_>, quote: char) -> Option<char> {
    let c = chars.next()?;
    let decoded = match c {
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        '\\' => '\\',
        '\'' | '"' if c == quote => c,
        'x' => ascii(hex_digits(chars, 2)?)?,
        'u' => char::from_u32(hex_digits(chars, 4)?)?,
        'U' => char::from_u32(hex_digits(chars, 8)?)?,
        '0'..='7' => {
            let mut n = c.to_digit(8)?;
            for _ in 0..2 {
                n = n * 8 + chars.next()?.to_digit(8)?;
            }
            ascii(n)?
        }
        _ => return None,
    };
    Some(decoded)
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut n = 0u32;
    for _ in 0..count {
        n = n * 16 + chars.next()?.to_digit(16)?;
    }
    Some(n)
}

// Byte escapes outside ASCII would not form valid UTF-8 text.
fn ascii(n: u32) -> Option<char> {
    u8::try_from(n).ok().filter(u8::is_ascii).map(char::from)
}
