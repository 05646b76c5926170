//! Byte-level JSON parsing into `serde_json::Value`.
//!
//! Numbers without a fractional or exponent part that fit a signed 64-bit
//! integer are kept integral; everything else becomes a double. The parser
//! object is reused through a thread-local pool so repeated invocations do
//! not reallocate the string scratch buffer.
use crate::error::ParseError;
use serde_json::{Map, Number, Value};
use std::cell::RefCell;

/// A reusable JSON parser. One instance handles one invocation at a time;
/// its scratch buffer survives between uses.
#[derive(Debug, Default)]
pub struct Parser {
    scratch: Vec<u8>,
}

thread_local! {
    static POOL: RefCell<Parser> = RefCell::new(Parser::new());
}

/// Parse a byte slice into a `Value` using the thread-local parser pool.
pub fn parse_slice(data: &[u8]) -> Result<Value, ParseError> {
    POOL.with(|parser| parser.borrow_mut().parse(data))
}

impl Parser {
    /// Create a parser with an empty scratch buffer.
    pub fn new() -> Parser {
        Parser {
            scratch: Vec::with_capacity(64),
        }
    }

    /// Parse one complete JSON document. Trailing non-whitespace input is
    /// rejected.
    pub fn parse(&mut self, data: &[u8]) -> Result<Value, ParseError> {
        let mut scanner = Scanner {
            data,
            pos: 0,
            scratch: &mut self.scratch,
        };
        scanner.skip_whitespace();
        let value = scanner.parse_value(0)?;
        scanner.skip_whitespace();
        if scanner.pos != data.len() {
            return Err(ParseError::new(scanner.pos, "trailing characters after value"));
        }
        Ok(value)
    }
}

const MAX_DEPTH: usize = 128;

struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    scratch: &'a mut Vec<u8>,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.bump() {
            Some(byte) if byte == expected => Ok(()),
            Some(_) => Err(ParseError::new(
                self.pos - 1,
                format!("expected '{}'", expected as char),
            )),
            None => Err(ParseError::new(self.pos, "unexpected end of input")),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new(self.pos, "recursion limit exceeded"));
        }
        match self.peek() {
            Some(b'{') => self.parse_object(depth),
            Some(b'[') => self.parse_array(depth),
            Some(b'"') => Ok(Value::String(self.parse_string()?)),
            Some(b't') => self.parse_literal(b"true", Value::Bool(true)),
            Some(b'f') => self.parse_literal(b"false", Value::Bool(false)),
            Some(b'n') => self.parse_literal(b"null", Value::Null),
            Some(byte) if byte == b'-' || byte.is_ascii_digit() => self.parse_number(),
            Some(_) => Err(ParseError::new(self.pos, "unexpected character")),
            None => Err(ParseError::new(self.pos, "unexpected end of input")),
        }
    }

    fn parse_literal(&mut self, literal: &[u8], value: Value) -> Result<Value, ParseError> {
        if self.data[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(value)
        } else {
            Err(ParseError::new(self.pos, "invalid literal"))
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.expect(b'{')?;
        let mut object = Map::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(object));
        }
        loop {
            self.skip_whitespace();
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.parse_value(depth + 1)?;
            object.insert(key, value);
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => return Ok(Value::Object(object)),
                Some(_) => return Err(ParseError::new(self.pos - 1, "expected ',' or '}'")),
                None => return Err(ParseError::new(self.pos, "unexpected end of input")),
            }
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.parse_value(depth + 1)?);
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b']') => return Ok(Value::Array(items)),
                Some(_) => return Err(ParseError::new(self.pos - 1, "expected ',' or ']'")),
                None => return Err(ParseError::new(self.pos, "unexpected end of input")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.expect(b'"')?;
        self.scratch.clear();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => self.parse_escape()?,
                Some(byte) if byte < 0x20 => {
                    return Err(ParseError::new(
                        self.pos - 1,
                        "control character inside string",
                    ));
                }
                Some(byte) => self.scratch.push(byte),
                None => return Err(ParseError::new(self.pos, "unterminated string")),
            }
        }
        match std::str::from_utf8(self.scratch) {
            Ok(text) => Ok(text.to_string()),
            Err(error) => Err(ParseError::new(
                self.pos,
                format!("invalid UTF-8 in string: {}", error),
            )),
        }
    }

    fn parse_escape(&mut self) -> Result<(), ParseError> {
        match self.bump() {
            Some(b'"') => self.scratch.push(b'"'),
            Some(b'\\') => self.scratch.push(b'\\'),
            Some(b'/') => self.scratch.push(b'/'),
            Some(b'b') => self.scratch.push(0x08),
            Some(b'f') => self.scratch.push(0x0C),
            Some(b'n') => self.scratch.push(b'\n'),
            Some(b'r') => self.scratch.push(b'\r'),
            Some(b't') => self.scratch.push(b'\t'),
            Some(b'u') => {
                let first = self.parse_hex4()?;
                let code_point = if (0xD800..=0xDBFF).contains(&first) {
                    // High surrogate; a low surrogate escape must follow
                    if self.bump() != Some(b'\\') || self.bump() != Some(b'u') {
                        return Err(ParseError::new(self.pos, "unpaired surrogate"));
                    }
                    let second = self.parse_hex4()?;
                    if !(0xDC00..=0xDFFF).contains(&second) {
                        return Err(ParseError::new(self.pos, "invalid low surrogate"));
                    }
                    0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
                } else if (0xDC00..=0xDFFF).contains(&first) {
                    return Err(ParseError::new(self.pos, "unpaired surrogate"));
                } else {
                    first
                };
                match char::from_u32(code_point) {
                    Some(character) => {
                        let mut buffer = [0_u8; 4];
                        self.scratch
                            .extend_from_slice(character.encode_utf8(&mut buffer).as_bytes());
                    }
                    None => return Err(ParseError::new(self.pos, "invalid unicode escape")),
                }
            }
            Some(_) => return Err(ParseError::new(self.pos - 1, "invalid escape sequence")),
            None => return Err(ParseError::new(self.pos, "unexpected end of input")),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32, ParseError> {
        let mut value = 0_u32;
        for _ in 0..4 {
            let byte = self
                .bump()
                .ok_or_else(|| ParseError::new(self.pos, "unexpected end of input"))?;
            let digit = match byte {
                b'0'..=b'9' => u32::from(byte - b'0'),
                b'a'..=b'f' => u32::from(byte - b'a') + 10,
                b'A'..=b'F' => u32::from(byte - b'A') + 10,
                _ => return Err(ParseError::new(self.pos - 1, "invalid hex digit")),
            };
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
                    return Err(ParseError::new(self.pos, "leading zero in number"));
                }
            }
            Some(byte) if byte.is_ascii_digit() => {
                while matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            _ => return Err(ParseError::new(self.pos, "invalid number")),
        }
        let mut integral = true;
        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            if !matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
                return Err(ParseError::new(self.pos, "expected digit after '.'"));
            }
            while matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            integral = false;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
                return Err(ParseError::new(self.pos, "expected digit in exponent"));
            }
            while matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| ParseError::new(start, "invalid number"))?;
        if integral {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(Value::Number(Number::from(value)));
            }
        }
        let value = text
            .parse::<f64>()
            .map_err(|_| ParseError::new(start, "invalid number"))?;
        if !value.is_finite() {
            return Err(ParseError::new(start, "number out of range"));
        }
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| ParseError::new(start, "number out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn integral_numbers_stay_integral() {
        let value = parse_slice(b"[1, -7, 9007199254740993, 2.5, 1e3]").unwrap();
        let items = value.as_array().unwrap();
        assert!(items[0].is_i64());
        assert!(items[1].is_i64());
        assert!(items[2].is_i64());
        assert!(items[3].is_f64());
        assert!(items[4].is_f64());
    }

    #[test]
    fn i64_overflow_becomes_double() {
        let value = parse_slice(b"92233720368547758080").unwrap();
        assert!(value.is_f64());
    }

    #[test]
    fn unicode_escapes() {
        let value = parse_slice(br#""\u00e9\u0041\ud83d\ude00""#).unwrap();
        assert_eq!(value, json!("\u{e9}A\u{1F600}"));
    }

    #[test]
    fn raw_utf8_passthrough() {
        let value = parse_slice("\"héllo\"".as_bytes()).unwrap();
        assert_eq!(value, json!("héllo"));
    }

    #[test]
    fn object_and_array_nesting() {
        let value = parse_slice(br#"{"a": {"b": [1, "two", null, true]}}"#).unwrap();
        assert_eq!(value, json!({"a": {"b": [1, "two", null, true]}}));
    }

    #[test_case(b"{\"a\": 1} trailing" ; "object with trailing data")]
    #[test_case(b"1 2" ; "two values")]
    #[test_case(b"[1,]" ; "trailing comma")]
    #[test_case(b"{\"a\" 1}" ; "missing colon")]
    #[test_case(b"01" ; "leading zero")]
    #[test_case(b"\"\\ud800\"" ; "lone surrogate")]
    #[test_case(b"nul" ; "truncated literal")]
    #[test_case(b"" ; "empty input")]
    fn rejected(input: &[u8]) {
        assert!(parse_slice(input).is_err());
    }

    #[test]
    fn error_carries_position() {
        let error = parse_slice(b"[1, x]").unwrap_err();
        assert_eq!(error.position, 4);
    }

    #[test]
    fn parser_is_reusable() {
        let mut parser = Parser::new();
        assert_eq!(parser.parse(b"\"one\"").unwrap(), json!("one"));
        assert!(parser.parse(b"not json").is_err());
        assert_eq!(parser.parse(b"[2]").unwrap(), json!([2]));
    }
}
