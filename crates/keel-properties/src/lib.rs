//! A small parser for Java `.properties` files.
//!
//! Keel reads persisted per-project build settings from `.properties` files. The parser follows
//! the `java.util.Properties` line format closely enough for tool-written files: comments,
//! `=`/`:`/whitespace separators, backslash line continuations and escape sequences.
//!
//! Files on disk are ISO-8859-1; decode them with [`decode_latin1`] before parsing. [`render`]
//! only ever emits ASCII, escaping everything else as `\uXXXX`.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
    /// 1-based line on which the entry starts.
    pub line: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    pub entries: Vec<PropertyEntry>,
}

impl PropertiesFile {
    #[must_use]
    pub fn by_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a PropertyEntry> + 'a {
        self.entries.iter().filter(move |e| e.key == key)
    }

    /// Returns the effective value for `key`.
    ///
    /// Like `java.util.Properties`, a later duplicate key replaces an earlier one.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug)]
struct LogicalLine {
    chars: Vec<char>,
    line: usize,
}

/// Decode the bytes of a `.properties` file. Every byte is one ISO-8859-1 character, so this
/// never fails.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Parse a `.properties` file into key/value entries.
#[must_use]
pub fn parse(text: &str) -> PropertiesFile {
    let mut lines = text.split('\n').enumerate().peekable();
    let mut entries = Vec::new();

    while lines.peek().is_some() {
        let Some(logical) = read_logical_line(&mut lines) else {
            break;
        };
        if let Some((key, value)) = parse_logical_line(&logical.chars) {
            entries.push(PropertyEntry {
                key,
                value,
                line: logical.line,
            });
        }
    }

    PropertiesFile { entries }
}

fn read_logical_line<'a>(
    lines: &mut std::iter::Peekable<impl Iterator<Item = (usize, &'a str)>>,
) -> Option<LogicalLine> {
    let (first_idx, first) = lines.next()?;
    let mut out = Vec::new();
    let mut physical = first;

    loop {
        let content = physical.strip_suffix('\r').unwrap_or(physical);
        let continues = ends_with_unescaped_backslash(content) && !is_comment(&out, content);
        let copy = if continues {
            // Skip the final backslash.
            &content[..content.len() - 1]
        } else {
            content
        };
        out.extend(copy.chars());

        if !continues {
            break;
        }

        match lines.next() {
            // Continuation: leading whitespace on the next physical line is dropped.
            Some((_, next)) => physical = next.trim_start_matches([' ', '\t', '\x0C']),
            None => break,
        }
    }

    Some(LogicalLine {
        chars: out,
        line: first_idx + 1,
    })
}

/// Comment lines never continue, even when they end in a backslash.
fn is_comment(so_far: &[char], content: &str) -> bool {
    if !so_far.is_empty() {
        return false;
    }
    matches!(
        content.trim_start_matches([' ', '\t', '\x0C']).chars().next(),
        Some('#' | '!')
    )
}

fn ends_with_unescaped_backslash(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

fn parse_logical_line(line: &[char]) -> Option<(String, String)> {
    let mut i = 0usize;
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    if i >= line.len() || line[i] == '#' || line[i] == '!' {
        return None;
    }

    let key_start = i;
    while i < line.len() {
        match line[i] {
            '\\' => i += 2,
            '=' | ':' => break,
            c if is_whitespace(c) => break,
            _ => i += 1,
        }
    }
    let key_end = i.min(line.len());
    i = key_end;

    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }
    if i < line.len() && (line[i] == '=' || line[i] == ':') {
        i += 1;
    }
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    let key = unescape(&line[key_start..key_end]);
    let value = unescape(&line[i..]);
    Some((key, value))
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }

        i += 1;
        let Some(&escaped) = chars.get(i) else {
            break;
        };

        match escaped {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\x0C'),
            'u' => match decode_unicode(chars, i + 1) {
                Some((ch, consumed)) => {
                    out.push(ch);
                    i += consumed;
                }
                None => out.push('u'),
            },
            other => out.push(other),
        }
        i += 1;
    }

    out
}

/// Decode the hex digits of a `\uXXXX` escape starting at `start`.
///
/// Characters outside the BMP are written as two escapes holding a UTF-16 surrogate pair; those
/// are joined. Returns the character and how many chars after the `u` it consumed.
fn decode_unicode(chars: &[char], start: usize) -> Option<(char, usize)> {
    let unit = hex_unit(chars.get(start..start + 4)?)?;
    if (0xD800..0xDC00).contains(&unit) {
        if let Some(['\\', 'u', digits @ ..]) = chars.get(start + 4..start + 10) {
            if let Some(low) = hex_unit(digits).filter(|low| (0xDC00..0xE000).contains(low)) {
                let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined).map(|ch| (ch, 10));
            }
        }
    }
    char::from_u32(unit).map(|ch| (ch, 4))
}

fn hex_unit(digits: &[char]) -> Option<u32> {
    if digits.len() != 4 {
        return None;
    }
    digits
        .iter()
        .try_fold(0u32, |value, d| Some((value << 4) | d.to_digit(16)?))
}

/// Render key/value pairs as `.properties` text, one `key=value` line each.
///
/// The output is pure ASCII, so it is valid ISO-8859-1 as written. It round-trips through
/// [`parse`].
#[must_use]
pub fn render<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (idx, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0C' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' if is_key || idx == 0 => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            c if c < ' ' || c > '~' => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
            _ => out.push(c),
        }
    }
}
