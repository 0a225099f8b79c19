//! Java `.properties` files
//!
//! Parses the format read by `java.util.Properties#load`, which is what
//! Gradle build scripts use for `keystore.properties` and
//! `local.properties`.

use droidconf_core::error::{Error, Result, ResultExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key/value pairs loaded from a properties file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesSource {
    entries: BTreeMap<String, String>,
    origin: Option<PathBuf>,
}

impl PropertiesSource {
    /// Parse properties text
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for (line_no, line) in logical_lines(text) {
            let (key, value) = split_entry(&line);
            let key = unescape(key).map_err(|msg| malformed(line_no, msg))?;
            let value = unescape(value).map_err(|msg| malformed(line_no, msg))?;
            entries.insert(key, value);
        }

        Ok(Self {
            entries,
            origin: None,
        })
    }

    /// Parse raw file bytes, decoded as ISO-8859-1 like `Properties.load(InputStream)`
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Self::parse(&text)
    }

    /// Load `path` if it exists.
    ///
    /// A missing file is `Ok(None)`. Unreadable or malformed files are errors.
    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Properties file not present");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::from(e)).context(format!("Reading {}", path.display()));
            }
        };

        let mut source = Self::parse_bytes(&bytes).context(format!("Parsing {}", path.display()))?;
        source.origin = Some(path.to_path_buf());

        tracing::debug!(path = %path.display(), entries = source.len(), "Loaded properties");
        Ok(Some(source))
    }

    /// File this source was loaded from, if any
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Value for `key`, unescaped
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether `key` is defined, even with an empty value
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys are defined
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertiesSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            origin: None,
        }
    }
}

fn malformed(line_no: usize, msg: &str) -> Error {
    Error::config_parse(format!("{} on line {}", msg, line_no))
        .with_suggestion("Escape backslashes as \\\\ or use a complete \\uXXXX sequence")
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Join continuation lines and drop comments, yielding (first line number, text)
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let normalized = text.replace("\r\n", "\n");
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in normalized.split(['\n', '\r']).enumerate() {
        let trimmed = raw.trim_start_matches(is_blank);

        let (start, mut buf) = match pending.take() {
            Some((start, mut buf)) => {
                buf.push_str(trimmed);
                (start, buf)
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, trimmed.to_string())
            }
        };

        let trailing = buf.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            buf.pop();
            pending = Some((start, buf));
        } else {
            lines.push((start, buf));
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }

    lines
}

/// Split a logical line into raw (still escaped) key and value
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if !escaped && (c == '=' || c == ':') {
            key_end = i;
            value_start = i + c.len_utf8();
            has_separator = true;
            break;
        }
        if !escaped && is_blank(c) {
            key_end = i;
            value_start = i + c.len_utf8();
            break;
        }
        escaped = c == '\\' && !escaped;
    }

    let mut rest = &line[value_start..];
    loop {
        rest = rest.trim_start_matches(is_blank);
        match rest.chars().next() {
            Some(c @ ('=' | ':')) if !has_separator => {
                has_separator = true;
                rest = &rest[c.len_utf8()..];
            }
            _ => break,
        }
    }

    (&line[..key_end], rest)
}

/// Resolve backslash escapes
fn unescape(raw: &str) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let mut units = vec![utf16_unit(&mut chars)?];
                if (0xD800..0xDC00).contains(&units[0]) {
                    // Only consume the next escape if it completes the pair
                    let mut ahead = chars.clone();
                    if ahead.next() == Some('\\') && ahead.next() == Some('u') {
                        if let Ok(low) = utf16_unit(&mut ahead) {
                            if (0xDC00..0xE000).contains(&low) {
                                units.push(low);
                                chars = ahead;
                            }
                        }
                    }
                }
                // Lone surrogate halves cannot live in a Rust string
                out.extend(
                    char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
                );
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Read the four hex digits of a `\uXXXX` escape
fn utf16_unit(chars: &mut std::str::Chars<'_>) -> std::result::Result<u16, &'static str> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
        return Err("Malformed \\uxxxx encoding");
    }
    u16::from_str_radix(&hex, 16).map_err(|_| "Malformed \\uxxxx encoding")
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidconf_core::error::ErrorCode;
    use tempfile::TempDir;

    fn parse(text: &str) -> PropertiesSource {
        PropertiesSource::parse(text).unwrap()
    }

    #[test]
    fn test_separators() {
        let props = parse("a=1\nb:2\nc 3\nd = 4\ne\t:\t5\nf  = = 6\n");
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some("5"));
        assert_eq!(props.get("f"), Some("= 6"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let props = parse("# comment\n   ! also comment\n\n   \nkey=value # not a comment\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some("value # not a comment"));
    }

    #[test]
    fn test_key_without_value() {
        let props = parse("empty\nblank=\n");
        assert_eq!(props.get("empty"), Some(""));
        assert_eq!(props.get("blank"), Some(""));
    }

    #[test]
    fn test_trailing_whitespace_is_kept() {
        let props = parse("key=value  \n");
        assert_eq!(props.get("key"), Some("value  "));
    }

    #[test]
    fn test_line_continuation() {
        let props = parse("fruits = apple, \\\n         banana, \\\n         pear\nnext=1\n");
        assert_eq!(props.get("fruits"), Some("apple, banana, pear"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let props = parse("path=C:\\\\\nother=x\n");
        assert_eq!(props.get("path"), Some("C:\\"));
        assert_eq!(props.get("other"), Some("x"));
    }

    #[test]
    fn test_continuation_keeps_hash_lines() {
        let props = parse("key=a\\\n#b\n");
        assert_eq!(props.get("key"), Some("a#b"));
    }

    #[test]
    fn test_continuation_at_eof() {
        let props = parse("key=value\\");
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn test_line_terminators() {
        let props = parse("a=1\r\nb=2\rc=3");
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
    }

    #[test]
    fn test_escapes() {
        let props = parse("tab=a\\tb\nnl=a\\nb\nunicode=caf\\u00e9\nplain=\\q\\=\\:\nesc\\ aped\\=key=v\n");
        assert_eq!(props.get("tab"), Some("a\tb"));
        assert_eq!(props.get("nl"), Some("a\nb"));
        assert_eq!(props.get("unicode"), Some("café"));
        assert_eq!(props.get("plain"), Some("q=:"));
        assert_eq!(props.get("esc aped=key"), Some("v"));
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let props = parse("releaseStorePassword=pw\\uD83D\\uDE00\nlower=\\ud83d\\ude00!\n");
        assert_eq!(props.get("releaseStorePassword"), Some("pw\u{1F600}"));
        assert_eq!(props.get("lower"), Some("\u{1F600}!"));
    }

    #[test]
    fn test_lone_surrogates_become_replacement() {
        let props = parse("high=a\\uD83Db\nlow=\\uDE00\nhigh_then_bmp=\\uD83D\\u0041\n");
        assert_eq!(props.get("high"), Some("a\u{FFFD}b"));
        assert_eq!(props.get("low"), Some("\u{FFFD}"));
        assert_eq!(props.get("high_then_bmp"), Some("\u{FFFD}A"));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = PropertiesSource::parse("ok=1\nbad=\\u12G4\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.message.contains("line 2"));

        let err = PropertiesSource::parse("short=\\u12").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_duplicates_last_wins() {
        let props = parse("k=1\nk=2\n");
        assert_eq!(props.get("k"), Some("2"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_latin1_decoding() {
        let props = PropertiesSource::parse_bytes(b"name=caf\xe9\n").unwrap();
        assert_eq!(props.get("name"), Some("café"));
    }

    #[test]
    fn test_try_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let loaded = PropertiesSource::try_load(&dir.path().join("keystore.properties")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_try_load_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keystore.properties");
        std::fs::write(&path, "releaseKeyAlias=upload\n").unwrap();

        let loaded = PropertiesSource::try_load(&path).unwrap().unwrap();
        assert_eq!(loaded.get("releaseKeyAlias"), Some("upload"));
        assert_eq!(loaded.origin(), Some(path.as_path()));
    }

    #[test]
    fn test_try_load_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(PropertiesSource::try_load(dir.path()).is_err());
    }

    #[test]
    fn test_try_load_malformed_has_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keystore.properties");
        std::fs::write(&path, "releaseKeyStore=\\uZZZZ\n").unwrap();

        let err = PropertiesSource::try_load(&path).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.context.unwrap().contains("keystore.properties"));
    }
}
