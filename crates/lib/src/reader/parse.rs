//! ASCII property-list parsing.
//!
//! Xcode writes `project.pbxproj` in the old-style (NeXTSTEP) property list
//! grammar:
//!
//! - `{ key = value; ... }` dictionaries
//! - `( value, value, )` arrays, trailing comma allowed
//! - `"quoted"` strings with `\n`, `\t`, `\r`, `\"`, `\\` and `\Uxxxx` escapes
//! - bare strings made of anything but whitespace and delimiters
//! - `<0fbd7768>` hex data
//! - `/* block */` and `// line` comments anywhere whitespace is allowed, which
//!   covers the `// !$*UTF8*$!` marker on the first line
//!
//! # Example
//!
//! ```
//! use pbxgen_lib::reader::parse::{parse, PlistValue};
//!
//! let value = parse("{ isa = PBXGroup; children = ( A, B, ); }").unwrap();
//! assert_eq!(value.get("isa").and_then(PlistValue::as_str), Some("PBXGroup"));
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use indexmap::IndexMap;
use thiserror::Error;

/// A parsed property-list value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlistValue {
  String(String),
  Array(Vec<PlistValue>),
  Dictionary(IndexMap<String, PlistValue>),
  Data(Vec<u8>),
}

impl PlistValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      PlistValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[PlistValue]> {
    match self {
      PlistValue::Array(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_dictionary(&self) -> Option<&IndexMap<String, PlistValue>> {
    match self {
      PlistValue::Dictionary(map) => Some(map),
      _ => None,
    }
  }

  /// Dictionary lookup; `None` for missing keys and non-dictionaries.
  pub fn get(&self, key: &str) -> Option<&PlistValue> {
    self.as_dictionary().and_then(|map| map.get(key))
  }
}

/// Errors that can occur while parsing a property list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("unexpected end of input")]
  UnexpectedEnd,

  #[error("unexpected '{found}' at position {position}, expected {expected}")]
  Unexpected {
    position: usize,
    found: char,
    expected: &'static str,
  },

  #[error("unterminated string starting at position {0}")]
  UnterminatedString(usize),

  #[error("unterminated comment starting at position {0}")]
  UnterminatedComment(usize),

  #[error("invalid escape sequence at position {0}")]
  InvalidEscape(usize),

  #[error("invalid data block at position {position}: {message}")]
  InvalidData { position: usize, message: String },

  #[error("nesting too deep at position {0}")]
  TooDeep(usize),
}

/// Deepest array/dictionary nesting accepted.
pub const MAX_DEPTH: usize = 256;

/// Unicode for NeXTSTEP bytes 0x80..=0xFF, used by `\NNN` octal escapes.
const NEXTSTEP_HIGH: [u16; 128] = [
  0x00A0, 0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C7,
  0x00C8, 0x00C9, 0x00CA, 0x00CB, 0x00CC, 0x00CD, 0x00CE, 0x00CF,
  0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D9,
  0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00B5, 0x00D7, 0x00F7,
  0x00A9, 0x00A1, 0x00A2, 0x00A3, 0x2044, 0x00A5, 0x0192, 0x00A7,
  0x00A4, 0x2019, 0x201C, 0x00AB, 0x2039, 0x203A, 0xFB01, 0xFB02,
  0x00AE, 0x2013, 0x2020, 0x2021, 0x00B7, 0x00A6, 0x00B6, 0x2022,
  0x201A, 0x201E, 0x201D, 0x00BB, 0x2026, 0x2030, 0x00AC, 0x00BF,
  0x00B9, 0x02CB, 0x00B4, 0x02C6, 0x02DC, 0x00AF, 0x02D8, 0x02D9,
  0x00A8, 0x00B2, 0x02DA, 0x00B8, 0x00B3, 0x02DD, 0x02DB, 0x02C7,
  0x2014, 0x00B1, 0x00BC, 0x00BD, 0x00BE, 0x00E0, 0x00E1, 0x00E2,
  0x00E3, 0x00E4, 0x00E5, 0x00E7, 0x00E8, 0x00E9, 0x00EA, 0x00EB,
  0x00EC, 0x00C6, 0x00ED, 0x00AA, 0x00EE, 0x00EF, 0x00F0, 0x00F1,
  0x0141, 0x00D8, 0x0152, 0x00BA, 0x00F2, 0x00F3, 0x00F4, 0x00F5,
  0x00F6, 0x00E6, 0x00F9, 0x00FA, 0x00FB, 0x0131, 0x00FC, 0x00FD,
  0x0142, 0x00F8, 0x0153, 0x00DF, 0x00FE, 0x00FF, 0xFFFD, 0xFFFD,
];

/// Parse a complete property-list document.
pub fn parse(input: &str) -> Result<PlistValue, ParseError> {
  let mut parser = Parser {
    chars: input.char_indices().peekable(),
    depth: 0,
  };
  parser.skip_trivia()?;
  let value = parser.value()?;
  parser.skip_trivia()?;
  match parser.chars.peek() {
    Some(&(position, found)) => Err(ParseError::Unexpected {
      position,
      found,
      expected: "end of input",
    }),
    None => Ok(value),
  }
}

fn is_delimiter(c: char) -> bool {
  c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | ';' | ',' | '=' | '"' | '<' | '>')
}

struct Parser<'a> {
  chars: Peekable<CharIndices<'a>>,
  depth: usize,
}

impl Parser<'_> {
  fn peek(&mut self) -> Result<(usize, char), ParseError> {
    self.chars.peek().copied().ok_or(ParseError::UnexpectedEnd)
  }

  fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), ParseError> {
    let (position, found) = self.peek()?;
    if found != wanted {
      return Err(ParseError::Unexpected {
        position,
        found,
        expected,
      });
    }
    self.chars.next();
    Ok(())
  }

  /// Skip whitespace and comments.
  fn skip_trivia(&mut self) -> Result<(), ParseError> {
    while let Some(&(start, c)) = self.chars.peek() {
      if c.is_whitespace() {
        self.chars.next();
        continue;
      }
      if c != '/' {
        break;
      }
      let mut ahead = self.chars.clone();
      ahead.next();
      match ahead.peek() {
        Some((_, '/')) => {
          for (_, c) in self.chars.by_ref() {
            if c == '\n' {
              break;
            }
          }
        }
        Some((_, '*')) => {
          self.chars.next();
          self.chars.next();
          let mut closed = false;
          let mut star = false;
          for (_, c) in self.chars.by_ref() {
            if star && c == '/' {
              closed = true;
              break;
            }
            star = c == '*';
          }
          if !closed {
            return Err(ParseError::UnterminatedComment(start));
          }
        }
        // A bare string starting with '/'.
        _ => break,
      }
    }
    Ok(())
  }

  fn value(&mut self) -> Result<PlistValue, ParseError> {
    let (position, c) = self.peek()?;
    match c {
      '{' | '(' => {
        if self.depth >= MAX_DEPTH {
          return Err(ParseError::TooDeep(position));
        }
        self.depth += 1;
        let nested = if c == '{' { self.dictionary() } else { self.array() };
        self.depth -= 1;
        nested
      }
      '<' => self.data(),
      '"' => self.quoted().map(PlistValue::String),
      c if !is_delimiter(c) => Ok(PlistValue::String(self.bare())),
      found => Err(ParseError::Unexpected {
        position,
        found,
        expected: "a value",
      }),
    }
  }

  fn key(&mut self) -> Result<String, ParseError> {
    let (position, c) = self.peek()?;
    match c {
      '"' => self.quoted(),
      c if !is_delimiter(c) => Ok(self.bare()),
      found => Err(ParseError::Unexpected {
        position,
        found,
        expected: "a key",
      }),
    }
  }

  fn dictionary(&mut self) -> Result<PlistValue, ParseError> {
    self.expect('{', "'{'")?;
    let mut map = IndexMap::new();
    loop {
      self.skip_trivia()?;
      if self.peek()?.1 == '}' {
        self.chars.next();
        return Ok(PlistValue::Dictionary(map));
      }
      let key = self.key()?;
      self.skip_trivia()?;
      self.expect('=', "'='")?;
      self.skip_trivia()?;
      let value = self.value()?;
      self.skip_trivia()?;
      self.expect(';', "';'")?;
      map.insert(key, value);
    }
  }

  fn array(&mut self) -> Result<PlistValue, ParseError> {
    self.expect('(', "'('")?;
    let mut items = Vec::new();
    loop {
      self.skip_trivia()?;
      if self.peek()?.1 == ')' {
        self.chars.next();
        return Ok(PlistValue::Array(items));
      }
      items.push(self.value()?);
      self.skip_trivia()?;
      match self.peek()? {
        (_, ',') => {
          self.chars.next();
        }
        (_, ')') => {}
        (position, found) => {
          return Err(ParseError::Unexpected {
            position,
            found,
            expected: "',' or ')'",
          });
        }
      }
    }
  }

  fn data(&mut self) -> Result<PlistValue, ParseError> {
    let (start, _) = self.peek()?;
    self.expect('<', "'<'")?;
    let mut hex_digits = String::new();
    loop {
      match self.chars.next() {
        Some((_, '>')) => break,
        Some((_, c)) if c.is_whitespace() => {}
        Some((_, c)) => hex_digits.push(c),
        None => return Err(ParseError::UnexpectedEnd),
      }
    }
    hex::decode(&hex_digits).map(PlistValue::Data).map_err(|e| ParseError::InvalidData {
      position: start,
      message: e.to_string(),
    })
  }

  fn quoted(&mut self) -> Result<String, ParseError> {
    let (start, _) = self.peek()?;
    self.expect('"', "'\"'")?;
    let mut out = String::new();
    loop {
      let Some((position, c)) = self.chars.next() else {
        return Err(ParseError::UnterminatedString(start));
      };
      match c {
        '"' => return Ok(out),
        '\\' => {
          let Some((_, escaped)) = self.chars.next() else {
            return Err(ParseError::UnterminatedString(start));
          };
          match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'U' | 'u' => out.push(self.unicode_escape(position)?),
            digit @ '0'..='7' => out.push(self.octal_escape(digit, position)?),
            other => out.push(other),
          }
        }
        c => out.push(c),
      }
    }
  }

  fn unicode_escape(&mut self, position: usize) -> Result<char, ParseError> {
    let mut code = 0u32;
    for _ in 0..4 {
      let digit = self
        .chars
        .next()
        .and_then(|(_, c)| c.to_digit(16))
        .ok_or(ParseError::InvalidEscape(position))?;
      code = code * 16 + digit;
    }
    char::from_u32(code).ok_or(ParseError::InvalidEscape(position))
  }

  /// Up to three octal digits naming one NeXTSTEP byte.
  fn octal_escape(&mut self, first: char, position: usize) -> Result<char, ParseError> {
    let mut code = first.to_digit(8).ok_or(ParseError::InvalidEscape(position))?;
    for _ in 0..2 {
      match self.chars.peek().and_then(|&(_, c)| c.to_digit(8)) {
        Some(digit) => {
          code = code * 8 + digit;
          self.chars.next();
        }
        None => break,
      }
    }
    let code = match code {
      0..=0x7F => code,
      0x80..=0xFF => u32::from(NEXTSTEP_HIGH[(code - 0x80) as usize]),
      _ => return Err(ParseError::InvalidEscape(position)),
    };
    char::from_u32(code).ok_or(ParseError::InvalidEscape(position))
  }

  fn bare(&mut self) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = self.chars.peek() {
      if is_delimiter(c) {
        break;
      }
      out.push(c);
      self.chars.next();
    }
    out
  }
}
