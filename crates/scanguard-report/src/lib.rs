//! Checkstyle report parser for scanguard.
//!
//! This crate turns the checkstyle XML emitted by the external analysis tool
//! into an ordered sequence of [`Violation`] records. Parsing is
//! all-or-nothing: a single malformed entry fails the whole report rather
//! than producing a partial, misleading violation list.
//!
//! The scanner handles the XML subset checkstyle documents actually use:
//! prolog, comments, CDATA, elements with quoted attributes, and the
//! predefined entities plus numeric character references.

use scanguard_types::Violation;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while parsing a checkstyle report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The report markup is invalid or malformed.
    #[error("invalid report format: {0}")]
    InvalidFormat(String),

    /// A required attribute is missing from a reported entry.
    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// A line attribute is missing, zero, or not a number.
    #[error("invalid line number '{value}' on <error>")]
    InvalidLine { value: String },
}

// ============================================================================
// Path Relativization
// ============================================================================

/// Rewrite a raw file reference relative to the project root.
///
/// The scanner reports absolute paths; the diff provider reports
/// revision-relative ones. If `raw` starts with `project_root` (on a path
/// component boundary), the prefix and any leading separator are removed;
/// otherwise the raw value is kept unchanged. Backslashes are normalized to
/// forward slashes first.
///
/// # Examples
///
/// ```
/// use scanguard_report::relativize_path;
///
/// assert_eq!(
///     relativize_path("/repo/Sources/Foo.swift", "/repo"),
///     "Sources/Foo.swift"
/// );
/// assert_eq!(
///     relativize_path("Sources/Foo.swift", "/repo"),
///     "Sources/Foo.swift"
/// );
/// ```
pub fn relativize_path(raw: &str, project_root: &str) -> String {
    let raw = raw.trim().replace('\\', "/");
    let root = project_root.trim().replace('\\', "/");
    let root = root.trim_end_matches('/');

    if root.is_empty() {
        return raw;
    }

    if let Some(rest) = raw.strip_prefix(root) {
        // Only strip on a path component boundary: "/repo" must not
        // swallow "/repository/Foo.swift".
        if rest.is_empty() {
            return String::new();
        }
        if let Some(stripped) = rest.strip_prefix('/') {
            return stripped.to_string();
        }
    }

    raw
}

// ============================================================================
// XML Scanner
// ============================================================================

/// A start or end tag pulled from the document.
#[derive(Debug)]
enum Tag<'a> {
    Open {
        name: &'a str,
        attrs: Vec<(&'a str, String)>,
        self_closing: bool,
    },
    Close {
        name: &'a str,
    },
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Advance past the next occurrence of `pat`, returning false at EOF.
    fn skip_past(&mut self, pat: &str) -> bool {
        match self.rest().find(pat) {
            Some(i) => {
                self.pos += i + pat.len();
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }

    /// Skip character data until the next `<`. Content between tags carries
    /// no information in a checkstyle document.
    fn skip_text(&mut self) {
        match self.rest().find('<') {
            Some(i) => self.pos += i,
            None => self.pos = self.input.len(),
        }
    }

    fn scan_name(&mut self) -> Result<&'a str, ReportError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        {
            self.bump();
        }
        if self.pos == start {
            return Err(ReportError::InvalidFormat(format!(
                "expected a name at byte {}",
                start
            )));
        }
        Ok(&self.input[start..self.pos])
    }

    fn scan_attr_value(&mut self) -> Result<String, ReportError> {
        let quote = match self.bump() {
            Some(c @ ('"' | '\'')) => c,
            _ => {
                return Err(ReportError::InvalidFormat(
                    "attribute value must be quoted".to_string(),
                ));
            }
        };
        let raw = match self.rest().find(quote) {
            Some(i) => {
                let raw = &self.rest()[..i];
                self.pos += i + 1;
                raw
            }
            None => {
                return Err(ReportError::InvalidFormat(
                    "unterminated attribute value".to_string(),
                ));
            }
        };
        unescape(raw)
    }

    /// Pull the next tag, skipping text, comments, CDATA, and declarations.
    fn next_tag(&mut self) -> Result<Option<Tag<'a>>, ReportError> {
        loop {
            self.skip_text();
            if self.rest().is_empty() {
                return Ok(None);
            }

            if self.eat("<!--") {
                if !self.skip_past("-->") {
                    return Err(ReportError::InvalidFormat(
                        "unterminated comment".to_string(),
                    ));
                }
                continue;
            }
            if self.eat("<![CDATA[") {
                if !self.skip_past("]]>") {
                    return Err(ReportError::InvalidFormat(
                        "unterminated CDATA section".to_string(),
                    ));
                }
                continue;
            }
            if self.eat("<?") {
                if !self.skip_past("?>") {
                    return Err(ReportError::InvalidFormat(
                        "unterminated processing instruction".to_string(),
                    ));
                }
                continue;
            }
            if self.eat("<!") {
                if !self.skip_past(">") {
                    return Err(ReportError::InvalidFormat(
                        "unterminated declaration".to_string(),
                    ));
                }
                continue;
            }

            if self.eat("</") {
                let name = self.scan_name()?;
                self.skip_whitespace();
                if !self.eat(">") {
                    return Err(ReportError::InvalidFormat(format!(
                        "malformed closing tag </{}",
                        name
                    )));
                }
                return Ok(Some(Tag::Close { name }));
            }

            // Plain start tag.
            if !self.eat("<") {
                return Err(ReportError::InvalidFormat(
                    "expected '<'".to_string(),
                ));
            }
            let name = self.scan_name()?;
            let mut attrs = Vec::new();
            loop {
                self.skip_whitespace();
                if self.eat("/>") {
                    return Ok(Some(Tag::Open {
                        name,
                        attrs,
                        self_closing: true,
                    }));
                }
                if self.eat(">") {
                    return Ok(Some(Tag::Open {
                        name,
                        attrs,
                        self_closing: false,
                    }));
                }
                if self.rest().is_empty() {
                    return Err(ReportError::InvalidFormat(format!(
                        "unterminated tag <{}",
                        name
                    )));
                }
                let attr_name = self.scan_name()?;
                self.skip_whitespace();
                if !self.eat("=") {
                    return Err(ReportError::InvalidFormat(format!(
                        "attribute '{}' has no value",
                        attr_name
                    )));
                }
                self.skip_whitespace();
                let value = self.scan_attr_value()?;
                attrs.push((attr_name, value));
            }
        }
    }
}

/// Resolve the predefined entities and numeric character references.
fn unescape(raw: &str) -> Result<String, ReportError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let semi = rest.find(';').ok_or_else(|| {
            ReportError::InvalidFormat(format!("unterminated entity in '{}'", raw))
        })?;
        let entity = &rest[1..semi];
        match entity {
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "amp" => out.push('&'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                match code.and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(ReportError::InvalidFormat(format!(
                            "unknown entity '&{};'",
                            entity
                        )));
                    }
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

// ============================================================================
// Checkstyle Parsing
// ============================================================================

fn attr_value<'a>(attrs: &'a [(&str, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(attr, _)| *attr == name)
        .map(|(_, value)| value.as_str())
}

/// Parse a checkstyle XML report into an ordered list of violations.
///
/// Each `<error>` entry must carry a positive integer `line` and a `message`;
/// each `<file>` must carry a `name`. Raw file references are rewritten
/// relative to `project_root` (see [`relativize_path`]). Attributes the
/// relevance engine does not use (`severity`, `column`, `source`) are
/// accepted and ignored.
///
/// # Errors
///
/// Returns [`ReportError`] on malformed markup or any entry missing a
/// required attribute. The whole report fails; no partial list is produced.
///
/// # Examples
///
/// ```
/// use scanguard_report::parse_checkstyle;
///
/// let xml = r#"<?xml version="1.0" encoding="utf-8"?>
/// <checkstyle version="4.3">
///   <file name="/repo/Sources/Foo.swift">
///     <error line="5" severity="warning" message="unused parameter"/>
///   </file>
/// </checkstyle>
/// "#;
///
/// let violations = parse_checkstyle(xml, "/repo").unwrap();
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].file_path, "Sources/Foo.swift");
/// assert_eq!(violations[0].line, 5);
/// ```
pub fn parse_checkstyle(text: &str, project_root: &str) -> Result<Vec<Violation>, ReportError> {
    let mut scanner = Scanner::new(text);
    let mut violations = Vec::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut current_file: Option<String> = None;
    let mut saw_root = false;

    while let Some(tag) = scanner.next_tag()? {
        match tag {
            Tag::Open {
                name,
                attrs,
                self_closing,
            } => {
                if stack.is_empty() {
                    if saw_root {
                        return Err(ReportError::InvalidFormat(
                            "content after the root element".to_string(),
                        ));
                    }
                    if name != "checkstyle" {
                        return Err(ReportError::InvalidFormat(format!(
                            "expected <checkstyle> root, found <{}>",
                            name
                        )));
                    }
                    saw_root = true;
                }

                match name {
                    "file" => {
                        if current_file.is_some() {
                            return Err(ReportError::InvalidFormat(
                                "nested <file> elements".to_string(),
                            ));
                        }
                        let raw = attr_value(&attrs, "name").ok_or(
                            ReportError::MissingAttribute {
                                element: "file",
                                attribute: "name",
                            },
                        )?;
                        if !self_closing {
                            current_file = Some(relativize_path(raw, project_root));
                        }
                    }
                    "error" => {
                        let file = current_file.clone().ok_or_else(|| {
                            ReportError::InvalidFormat(
                                "<error> outside of a <file> element".to_string(),
                            )
                        })?;
                        let line_raw = attr_value(&attrs, "line").ok_or(
                            ReportError::MissingAttribute {
                                element: "error",
                                attribute: "line",
                            },
                        )?;
                        let line: u32 = line_raw.trim().parse().map_err(|_| {
                            ReportError::InvalidLine {
                                value: line_raw.to_string(),
                            }
                        })?;
                        if line == 0 {
                            return Err(ReportError::InvalidLine {
                                value: line_raw.to_string(),
                            });
                        }
                        let message = attr_value(&attrs, "message").ok_or(
                            ReportError::MissingAttribute {
                                element: "error",
                                attribute: "message",
                            },
                        )?;
                        violations.push(Violation::new(file, line, message));
                    }
                    _ => {
                        // Unknown elements are tolerated for forward
                        // compatibility; their tag balance is still checked.
                    }
                }

                if !self_closing {
                    stack.push(name);
                }
            }
            Tag::Close { name } => match stack.pop() {
                Some(open) if open == name => {
                    if name == "file" {
                        current_file = None;
                    }
                }
                Some(open) => {
                    return Err(ReportError::InvalidFormat(format!(
                        "mismatched closing tag: expected </{}>, found </{}>",
                        open, name
                    )));
                }
                None => {
                    return Err(ReportError::InvalidFormat(format!(
                        "unexpected closing tag </{}>",
                        name
                    )));
                }
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(ReportError::InvalidFormat(format!(
            "unclosed element <{}>",
            open
        )));
    }
    if !saw_root {
        return Err(ReportError::InvalidFormat(
            "document has no <checkstyle> root".to_string(),
        ));
    }

    Ok(violations)
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property Tests
// ============================================================================
