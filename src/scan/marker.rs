//! Marker argument grammar.
//!
//! ```text
//! args    := assets ( "," object? )?
//! assets  := string | "[" string ( "," string )* ","? "]"
//! object  := "{" ( entry ( "," entry )* ","? )? "}"
//! entry   := ( string | ident ) ":" scalar
//! scalar  := string | "true" | "false" | number
//! string  := "'" … "'" | '"' … '"'        (backslash escapes)
//! ```

use crate::asset::{AssetReference, AttrValue, RenderAttributes};

/// Parsed marker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub assets: AssetReference,
    pub attributes: RenderAttributes,
}

/// Parse failure with a byte offset into the argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerError {
    pub offset: usize,
    pub message: String,
}

type ParseResult<T> = Result<T, MarkerError>;

/// Parse the text between a marker's parentheses.
pub fn parse_marker(args: &str) -> ParseResult<Marker> {
    let mut parser = Cursor::new(args);
    parser.skip_ws();
    let assets = parser.assets()?;
    parser.skip_ws();

    let mut attributes = RenderAttributes::new();
    if parser.eat(',') {
        parser.skip_ws();
        if parser.peek() == Some('{') {
            attributes = parser.object()?;
            parser.skip_ws();
            parser.eat(',');
            parser.skip_ws();
        }
    }

    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected `{c}` after marker arguments")));
    }
    Ok(Marker { assets, attributes })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{expected}`")))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> MarkerError {
        MarkerError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn unexpected(&self, wanted: &str) -> MarkerError {
        match self.peek() {
            Some(c) => self.error(format!("expected {wanted}, found `{c}`")),
            None => self.error(format!("expected {wanted}, found end of input")),
        }
    }

    fn assets(&mut self) -> ParseResult<AssetReference> {
        match self.peek() {
            Some('\'' | '"') => Ok(AssetReference::Single(self.string()?)),
            Some('[') => {
                self.bump();
                let mut paths = Vec::new();
                loop {
                    self.skip_ws();
                    if self.eat(']') {
                        break;
                    }
                    if !paths.is_empty() {
                        self.expect(',')?;
                        self.skip_ws();
                        if self.eat(']') {
                            break;
                        }
                    }
                    paths.push(self.string()?);
                }
                if paths.is_empty() {
                    return Err(self.error("empty asset list"));
                }
                Ok(AssetReference::Bundle(paths))
            }
            _ => Err(self.unexpected("asset string or list")),
        }
    }

    fn object(&mut self) -> ParseResult<RenderAttributes> {
        self.expect('{')?;
        let mut attributes = RenderAttributes::new();
        let mut first = true;
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(attributes);
            }
            if !first {
                self.expect(',')?;
                self.skip_ws();
                if self.eat('}') {
                    return Ok(attributes);
                }
            }
            first = false;

            let key = match self.peek() {
                Some('\'' | '"') => self.string()?,
                Some(c) if is_ident_start(c) => self.ident(),
                _ => return Err(self.unexpected("attribute name")),
            };
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.scalar()?;
            attributes.insert(key, value);
        }
    }

    fn scalar(&mut self) -> ParseResult<AttrValue> {
        match self.peek() {
            Some('\'' | '"') => Ok(AttrValue::Text(self.string()?)),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c == '-' || c == '.' || c.is_ascii_digit())
                {
                    self.bump();
                }
                Ok(AttrValue::Text(self.src[start..self.pos].to_string()))
            }
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                match self.ident().as_str() {
                    "true" => Ok(AttrValue::Bool(true)),
                    "false" => Ok(AttrValue::Bool(false)),
                    other => Err(MarkerError {
                        offset: start,
                        message: format!("unsupported attribute value `{other}`"),
                    }),
                }
            }
            _ => Err(self.unexpected("attribute value")),
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| is_ident_start(c) || c.is_ascii_digit() || c == '-')
        {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn string(&mut self) -> ParseResult<String> {
        let start = self.pos;
        let Some(quote @ ('\'' | '"')) = self.bump() else {
            self.pos = start;
            return Err(self.unexpected("quoted string"));
        };

        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(MarkerError {
            offset: start,
            message: "unterminated string".to_string(),
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}
