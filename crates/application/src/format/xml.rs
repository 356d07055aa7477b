//! XML well-formedness checking and pretty-printing.
//!
//! The parser accepts the XML 1.0 document shape the editor needs to reason
//! about: an optional prolog (declaration, processing instructions, comments,
//! doctype), one root element, and trailing misc. Text and attribute values
//! are kept verbatim, so entity references survive formatting unchanged.

use std::fmt;

use courier_domain::{SyntaxStatus, parse_markers};

use super::placeholder::{TokenSet, substitute};

/// Token substituted for markers during validation.
const NEUTRAL_PLACEHOLDER: &str = "__courier_var__";

/// A parse failure with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError {
    /// What went wrong.
    pub message: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {} column {}", self.message, self.line, self.column)
    }
}

impl std::error::Error for XmlError {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    name: String,
    value: String,
    quote: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
    self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
    /// Comments, CDATA sections, processing instructions and doctypes, verbatim.
    Verbatim(String),
}

impl Node {
    fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

/// Checks whether the document is well-formed once markers are substituted.
pub fn validate(document: &str) -> SyntaxStatus {
    if document.trim().is_empty() {
        return SyntaxStatus::Valid;
    }
    let markers = parse_markers(document);
    let substituted = substitute(document, &markers, |_, _| NEUTRAL_PLACEHOLDER.to_string());
    match parse(&substituted) {
        Ok(_) => SyntaxStatus::Valid,
        Err(e) => SyntaxStatus::invalid(e.to_string()),
    }
}

/// Pretty-prints the document, keeping every marker's raw text.
///
/// Returns `None` if the document is not well-formed.
pub fn format(document: &str, indent_unit: &str) -> Option<String> {
    if document.trim().is_empty() {
        return None;
    }
    let markers = parse_markers(document);
    let tokens = TokenSet::for_document(document);
    let tokenized = substitute(document, &markers, |i, _| tokens.token(i));
    let nodes = parse(&tokenized).ok()?;

    let mut pretty = String::with_capacity(tokenized.len() * 2);
    let mut first = true;
    for node in nodes.iter().filter(|n| !n.is_blank_text()) {
        if !first {
            pretty.push('\n');
        }
        first = false;
        write_node(&mut pretty, node, 0, indent_unit);
    }

    for (i, marker) in markers.iter().enumerate() {
        pretty = pretty.replacen(&tokens.token(i), &marker.raw, 1);
    }
    Some(pretty)
}

fn write_node(out: &mut String, node: &Node, depth: usize, indent_unit: &str) {
    match node {
        Node::Text(text) => out.push_str(text.trim()),
        Node::Verbatim(raw) => out.push_str(raw),
        Node::Element(element) => write_element(out, element, depth, indent_unit),
    }
}

fn write_element(out: &mut String, element: &Element, depth: usize, indent_unit: &str) {
    out.push('<');
    out.push_str(&element.name);
    for attr in &element.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push('=');
        out.push(attr.quote);
        out.push_str(&attr.value);
        out.push(attr.quote);
    }

    let children: Vec<&Node> = element.children.iter().filter(|n| !n.is_blank_text()).collect();

    if children.is_empty() {
        if element.self_closing {
            out.push_str("/>");
        } else {
            out.push_str("></");
            out.push_str(&element.name);
            out.push('>');
        }
        return;
    }

    out.push('>');
    if children.iter().all(|n| matches!(n, Node::Text(_))) {
        let text: String = children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        out.push_str(text.trim());
    } else {
        out.push('\n');
        for child in children {
            push_indent(out, depth + 1, indent_unit);
            write_node(out, child, depth + 1, indent_unit);
            out.push('\n');
        }
        push_indent(out, depth, indent_unit);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn push_indent(out: &mut String, depth: usize, indent_unit: &str) {
    for _ in 0..depth {
        out.push_str(indent_unit);
    }
}

fn parse(input: &str) -> Result<Vec<Node>, XmlError> {
    Parser::new(input).parse_document()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> XmlError {
        let consumed = &self.src[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
        XmlError {
            message: message.into(),
            line,
            column: consumed[line_start..].chars().count() + 1,
        }
    }

    fn expect(&mut self, literal: &str) -> Result<(), XmlError> {
        if self.starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.error(format!("expected `{literal}`")))
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    /// Consumes up to and including `terminator`, returning the consumed text.
    fn take_through(&mut self, terminator: &str, what: &str) -> Result<&'a str, XmlError> {
        let start = self.pos;
        let Some(offset) = self.rest().find(terminator) else {
            return Err(self.error(format!("unterminated {what}")));
        };
        self.pos += offset + terminator.len();
        Ok(&self.src[start..self.pos])
    }

    fn parse_document(&mut self) -> Result<Vec<Node>, XmlError> {
        let mut nodes = Vec::new();
        let mut seen_root = false;

        loop {
            let ws_start = self.pos;
            if self.skip_whitespace() {
                nodes.push(Node::Text(self.src[ws_start..self.pos].to_string()));
            }
            if self.at_end() {
                break;
            }
            if self.starts_with("<?") {
                let pi = self.take_through("?>", "processing instruction")?;
                nodes.push(Node::Verbatim(pi.to_string()));
            } else if self.starts_with("<!--") {
                nodes.push(Node::Verbatim(self.parse_comment()?.to_string()));
            } else if self.starts_with("<!DOCTYPE") {
                if seen_root {
                    return Err(self.error("doctype after root element"));
                }
                nodes.push(Node::Verbatim(self.parse_doctype()?.to_string()));
            } else if self.starts_with("</") {
                return Err(self.error("unexpected closing tag"));
            } else if self.starts_with("<") {
                if seen_root {
                    return Err(self.error("junk after document element"));
                }
                nodes.push(Node::Element(self.parse_element()?));
                seen_root = true;
            } else {
                return Err(self.error("text outside of the root element"));
            }
        }

        if seen_root {
            Ok(nodes)
        } else {
            Err(self.error("no root element"))
        }
    }

    fn parse_comment(&mut self) -> Result<&'a str, XmlError> {
        let start = self.pos;
        self.pos += "<!--".len();
        let Some(offset) = self.rest().find("--") else {
            return Err(self.error("unterminated comment"));
        };
        self.pos += offset;
        if !self.starts_with("-->") {
            return Err(self.error("`--` is not allowed inside a comment"));
        }
        self.pos += "-->".len();
        Ok(&self.src[start..self.pos])
    }

    fn parse_doctype(&mut self) -> Result<&'a str, XmlError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(ch) = self.bump() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(&self.src[start..self.pos]),
                _ => {}
            }
        }
        Err(self.error("unterminated doctype"))
    }

    fn parse_name(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_alphabetic() || ch == '_' || ch == ':' => {
                self.bump();
            }
            _ => return Err(self.error("expected a name")),
        }
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || matches!(ch, '_' | ':' | '-' | '.'))
        {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_element(&mut self) -> Result<Element, XmlError> {
        self.expect("<")?;
        let name = self.parse_name()?;
        let mut attributes: Vec<Attribute> = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(Element {
                    name,
                    attributes,
                    children: Vec::new(),
                    self_closing: true,
                });
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            if self.at_end() {
                return Err(self.error(format!("unclosed start tag <{name}>")));
            }
            if !had_space {
                return Err(self.error("expected whitespace before attribute"));
            }
            let attribute = self.parse_attribute()?;
            if attributes.iter().any(|a| a.name == attribute.name) {
                return Err(self.error(format!("duplicate attribute `{}`", attribute.name)));
            }
            attributes.push(attribute);
        }

        let children = self.parse_content(&name)?;
        Ok(Element {
            name,
            attributes,
            children,
            self_closing: false,
        })
    }

    fn parse_attribute(&mut self) -> Result<Attribute, XmlError> {
        let name = self.parse_name()?;
        self.skip_whitespace();
        self.expect("=")?;
        self.skip_whitespace();
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("attribute value must be quoted")),
        };
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated attribute value")),
                Some('<') => return Err(self.error("`<` is not allowed in attribute values")),
                Some('&') => self.parse_reference()?,
                Some(ch) if ch == quote => break,
                Some(_) => {
                    self.bump();
                }
            }
        }
        let value = self.src[start..self.pos].to_string();
        self.bump();
        Ok(Attribute { name, value, quote })
    }

    fn parse_reference(&mut self) -> Result<(), XmlError> {
        self.expect("&")?;
        if self.starts_with("#x") {
            self.pos += 2;
            self.take_digits(|c| c.is_ascii_hexdigit())?;
        } else if self.starts_with("#") {
            self.pos += 1;
            self.take_digits(|c| c.is_ascii_digit())?;
        } else {
            self.parse_name()?;
        }
        if self.bump() == Some(';') {
            Ok(())
        } else {
            Err(self.error("entity reference must end with `;`"))
        }
    }

    fn take_digits(&mut self, accept: impl Fn(char) -> bool) -> Result<(), XmlError> {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.bump();
        }
        if self.pos == start {
            Err(self.error("malformed character reference"))
        } else {
            Ok(())
        }
    }

    fn parse_content(&mut self, parent: &str) -> Result<Vec<Node>, XmlError> {
        let mut children = Vec::new();
        loop {
            if self.at_end() {
                return Err(self.error(format!("unclosed element <{parent}>")));
            }
            if self.starts_with("</") {
                self.pos += 2;
                let name = self.parse_name()?;
                if name != parent {
                    let message = format!("closing tag </{name}> does not match <{parent}>");
                    return Err(self.error(message));
                }
                self.skip_whitespace();
                self.expect(">")?;
                return Ok(children);
            }
            if self.starts_with("<!--") {
                children.push(Node::Verbatim(self.parse_comment()?.to_string()));
            } else if self.starts_with("<![CDATA[") {
                let cdata = self.take_through("]]>", "CDATA section")?;
                children.push(Node::Verbatim(cdata.to_string()));
            } else if self.starts_with("<?") {
                let pi = self.take_through("?>", "processing instruction")?;
                children.push(Node::Verbatim(pi.to_string()));
            } else if self.starts_with("<") {
                children.push(Node::Element(self.parse_element()?));
            } else {
                children.push(Node::Text(self.parse_text()?));
            }
        }
    }

    fn parse_text(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            match ch {
                '<' => break,
                '&' => self.parse_reference()?,
                _ => {
                    if self.starts_with("]]>") {
                        return Err(self.error("`]]>` is not allowed in text"));
                    }
                    self.bump();
                }
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }
}
