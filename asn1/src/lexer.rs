use std::{
    collections::{HashMap, VecDeque},
    str::CharIndices,
    sync::OnceLock,
};

use crate::{
    compiler::{Features, SourceId},
    token::{self, Token, TokenKind},
    util::{Peek, Peekable},
};

/// State for converting a source string into a token stream
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /// Iterator over all chars in the file
    chars: Peekable<CharIndices<'a>>,

    /// The original source text
    source: &'a str,

    /// File ID to use for all returned tokens
    pub(crate) file: SourceId,

    /// Enabled lexer extensions
    features: Features,

    /// List of comment tokens not returned yet
    comments: VecDeque<Token<'a>>,

    /// The next meaningful token, if it has already been lexed
    peeked: Option<Token<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LexerError {
    /// A character that cannot start any token
    Unrecognised { offset: usize, file: SourceId },

    NonTerminatedComment { offset: usize, file: SourceId },

    NonTerminatedString { offset: usize, file: SourceId },

    /// A number with leading zeros
    InvalidNumber { offset: usize, file: SourceId },

    /// A binary or hexadecimal string containing other characters, or with
    /// a missing `B` or `H` suffix.
    InvalidString { offset: usize, file: SourceId },
}

pub type Result<T, E = LexerError> = std::result::Result<T, E>;

impl<'a> Lexer<'a> {
    /// Create a new Lexer for a given source file.  `file` represents a file
    /// ID that will be returned with each token.
    pub fn new(file: SourceId, source: &'a str, features: Features) -> Self {
        Self {
            chars: source.char_indices().n_peekable(),
            source,
            file,
            features,
            comments: VecDeque::new(),
            peeked: None,
        }
    }

    /// Return the next token that is not a comment, without consuming it.
    /// At the end of the source an `Eof` token is returned.
    pub fn peek(&mut self) -> Result<Token<'a>> {
        if let Some(tok) = self.peeked {
            return Ok(tok);
        }

        loop {
            let tok = self.lex()?;
            if matches!(tok.kind, TokenKind::SingleComment | TokenKind::MultiComment) {
                self.comments.push_back(tok);
                continue;
            }

            self.peeked = Some(tok);
            return Ok(tok);
        }
    }

    /// Consume a token.  Comments before the next meaningful token are
    /// returned first.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        if let Some(comment) = self.comments.pop_front() {
            return Ok(comment);
        }

        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => self.lex(),
        }
    }

    /// Returns true if the lexer is at the end of its source file
    pub fn is_eof(&mut self) -> Result<bool> {
        Ok(self.peek()?.kind == TokenKind::Eof)
    }

    /// Byte offset of the next token
    pub fn offset(&mut self) -> usize {
        match self.peeked {
            Some(tok) => tok.offset,
            None => self.chars.peek(0).map_or(self.source.len(), |&(o, _)| o),
        }
    }

    /// Lex a single token, which could be a comment
    fn lex(&mut self) -> Result<Token<'a>> {
        while let Some(&(_, c)) = self.chars.peek(0) {
            if !self.is_whitespace(c) {
                break;
            }
            self.chars.next();
        }

        let Some(&(offset, c)) = self.chars.peek(0) else {
            return Ok(Token {
                kind: TokenKind::Eof,
                value: "",
                offset: self.source.len(),
                file: self.file,
            });
        };

        let tok = match c {
            '-' | '\u{2011}' if self.next_is_hyphen() => self.single_comment(offset),
            '/' if matches!(self.chars.peek(1), Some((_, '*'))) => self.multi_comment(offset)?,
            '{' => self.simple_token(TokenKind::LeftCurly, offset),
            '}' => self.simple_token(TokenKind::RightCurly, offset),
            '(' => self.simple_token(TokenKind::LeftParen, offset),
            ')' => self.simple_token(TokenKind::RightParen, offset),
            ',' => self.simple_token(TokenKind::Comma, offset),
            ';' => self.simple_token(TokenKind::SemiColon, offset),
            '!' => self.simple_token(TokenKind::Exclamation, offset),
            '-' | '\u{2011}' => self.simple_token(TokenKind::Hyphen, offset),
            '[' => self
                .multi_token(TokenKind::LeftVersionBrackets, offset, "[[")
                .unwrap_or_else(|| self.simple_token(TokenKind::LeftSquare, offset)),
            ']' => self
                .multi_token(TokenKind::RightVersionBrackets, offset, "]]")
                .unwrap_or_else(|| self.simple_token(TokenKind::RightSquare, offset)),
            ':' => self
                .multi_token(TokenKind::Assignment, offset, "::=")
                .unwrap_or_else(|| self.simple_token(TokenKind::Colon, offset)),
            '.' => self
                .multi_token(TokenKind::Ellipsis, offset, "...")
                .ok_or(LexerError::Unrecognised {
                    offset,
                    file: self.file,
                })?,
            '"' => self.cstring(offset)?,
            '\'' => self.bstring_or_hstring(offset)?,
            _ if c.is_ascii_digit() => self.number(offset)?,
            _ if self.is_identifier_start(c) => self.identifier(c, offset),
            _ => {
                return Err(LexerError::Unrecognised {
                    offset,
                    file: self.file,
                })
            }
        };

        // comments have already been consumed while lexing them
        if !matches!(tok.kind, TokenKind::SingleComment | TokenKind::MultiComment) {
            for _ in tok.value.chars() {
                self.chars.next();
            }
        }

        Ok(tok)
    }

    /// Return a 1 character token
    fn simple_token(&self, kind: TokenKind, offset: usize) -> Token<'a> {
        let value = &self.source[offset..];
        let len = value.chars().next().map_or(0, char::len_utf8);

        Token {
            kind,
            value: &value[..len],
            offset,
            file: self.file,
        }
    }

    /// Try to return a multi-character token
    fn multi_token(&self, kind: TokenKind, offset: usize, value: &str) -> Option<Token<'a>> {
        let tok_value = &self.source[offset..];

        if !tok_value.starts_with(value) {
            return None;
        }

        Some(Token {
            kind,
            value: &tok_value[..value.len()],
            offset,
            file: self.file,
        })
    }

    fn next_is_hyphen(&mut self) -> bool {
        matches!(self.chars.peek(1), Some((_, '-' | '\u{2011}')))
    }

    /// Parse a single line comment which is text between pairs of two hyphens,
    /// or until the end of the line.  Non-breaking hyphens are also accepted
    /// instead of hyphens.
    fn single_comment(&mut self, offset: usize) -> Token<'a> {
        let mut end = offset;

        // the two opening hyphens
        for _ in 0..2 {
            if let Some((o, c)) = self.chars.next() {
                end = o + c.len_utf8();
            }
        }

        while let Some(&(o, next)) = self.chars.peek(0) {
            if is_newline(next) {
                break;
            }

            self.chars.next();
            end = o + next.len_utf8();

            if matches!(next, '-' | '\u{2011}') {
                if let Some(&(o, c @ ('-' | '\u{2011}'))) = self.chars.peek(0) {
                    self.chars.next();
                    end = o + c.len_utf8();
                    break;
                }
            }
        }

        Token {
            kind: TokenKind::SingleComment,
            value: &self.source[offset..end],
            offset,
            file: self.file,
        }
    }

    /// Parse a multi line comment which is text between `/*` and `*/`.  The comment
    /// ends when a matching `*/` has been found for every `/*` encountered.
    fn multi_comment(&mut self, offset: usize) -> Result<Token<'a>> {
        self.chars.next();
        self.chars.next();

        let mut end = offset + 2;
        let mut depth = 1;
        while let Some((o, c)) = self.chars.next() {
            end = o + c.len_utf8();

            if c == '/' && matches!(self.chars.peek(0), Some((_, '*'))) {
                depth += 1;
                end += 1;
                self.chars.next();
            } else if c == '*' && matches!(self.chars.peek(0), Some((_, '/'))) {
                depth -= 1;
                end += 1;
                self.chars.next();

                if depth == 0 {
                    break;
                }
            }
        }

        if depth != 0 {
            return Err(LexerError::NonTerminatedComment {
                offset,
                file: self.file,
            });
        }

        Ok(Token {
            kind: TokenKind::MultiComment,
            value: &self.source[offset..end],
            offset,
            file: self.file,
        })
    }

    /// Parse a character string, `"` within the string is written as `""`
    fn cstring(&mut self, offset: usize) -> Result<Token<'a>> {
        let mut len = 1;

        loop {
            match self.chars.peek(len) {
                Some(&(o, '"')) => {
                    if matches!(self.chars.peek(len + 1), Some((_, '"'))) {
                        len += 2;
                        continue;
                    }

                    return Ok(Token {
                        kind: TokenKind::CString,
                        value: &self.source[offset..o + 1],
                        offset,
                        file: self.file,
                    });
                }
                Some(_) => len += 1,
                None => {
                    return Err(LexerError::NonTerminatedString {
                        offset,
                        file: self.file,
                    })
                }
            }
        }
    }

    /// Parse `'0101'B` or `'CAFE'H`.  Whitespace is allowed between digits.
    fn bstring_or_hstring(&mut self, offset: usize) -> Result<Token<'a>> {
        let mut len = 1;
        let mut binary = true;
        let mut hex = true;

        let close = loop {
            match self.chars.peek(len).copied() {
                Some((o, '\'')) => break o,
                Some((_, c)) if self.is_whitespace(c) => (),
                Some((_, c)) => {
                    binary &= matches!(c, '0' | '1');
                    hex &= c.is_ascii_digit() || ('A'..='F').contains(&c);
                }
                None => {
                    return Err(LexerError::NonTerminatedString {
                        offset,
                        file: self.file,
                    })
                }
            }
            len += 1;
        };

        let kind = match self.chars.peek(len + 1) {
            Some((_, 'B')) if binary => TokenKind::BString,
            Some((_, 'H')) if hex => TokenKind::HString,
            _ => {
                return Err(LexerError::InvalidString {
                    offset,
                    file: self.file,
                })
            }
        };

        Ok(Token {
            kind,
            value: &self.source[offset..close + 2],
            offset,
            file: self.file,
        })
    }

    /// Parse a number ([1-9][0-9]*)|0
    fn number(&mut self, offset: usize) -> Result<Token<'a>> {
        let value = &self.source[offset..];
        let len = value.chars().take_while(char::is_ascii_digit).count();

        let value = &value[..len];
        if value.starts_with('0') && len > 1 {
            return Err(LexerError::InvalidNumber {
                offset,
                file: self.file,
            });
        }

        Ok(Token {
            kind: TokenKind::Number,
            value,
            offset,
            file: self.file,
        })
    }

    /// Parse an identifier, type reference or keyword.  Single hyphens are
    /// allowed within the identifier, but not at the end.
    fn identifier(&mut self, first: char, offset: usize) -> Token<'a> {
        let mut n = 1;
        let mut end = offset + first.len_utf8();
        while let Some(&(o, c)) = self.chars.peek(n) {
            if self.is_identifier_char(c) {
                end = o + c.len_utf8();
                n += 1;
                continue;
            }

            if c == '-' || c == '\u{2011}' {
                if let Some(&(o, c)) = self.chars.peek(n + 1) {
                    if self.is_identifier_char(c) {
                        end = o + c.len_utf8();
                        n += 2;
                        continue;
                    }
                }
            }

            break;
        }

        let value = &self.source[offset..end];

        let ident_kind = if first.is_uppercase() {
            TokenKind::TypeReference
        } else {
            TokenKind::Identifier
        };

        let mut kind = keywords().get(value).copied();
        if kind.is_none() && self.features.lowercase_keywords {
            kind = lowercase_keywords().get(&*value.to_lowercase()).copied();
        }

        Token {
            kind: kind.unwrap_or(ident_kind),
            value,
            offset,
            file: self.file,
        }
    }

    fn is_identifier_start(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || (self.features.unicode_identifiers && c.is_alphabetic())
    }

    fn is_identifier_char(&self, c: char) -> bool {
        c.is_ascii_alphanumeric()
            || "$_".contains(c)
            || (self.features.unicode_identifiers && c.is_alphanumeric())
    }

    /// Is the character any valid whitespace
    fn is_whitespace(&self, c: char) -> bool {
        // A0 = Non breaking space
        "\t \u{A0}".contains(c)
            || is_newline(c)
            || (self.features.unicode_whitespace && c.is_whitespace())
    }
}

/// Is the character a valid newline character
fn is_newline(c: char) -> bool {
    // 0B = Vertical Tab
    // 0C = Form Feed
    "\n\x0B\x0C\r".contains(c)
}

/// Get a mapping from keyword strings to their token kind
fn keywords() -> &'static HashMap<&'static str, TokenKind> {
    static KEYWORDS: OnceLock<HashMap<&'static str, TokenKind>> = OnceLock::new();
    KEYWORDS.get_or_init(|| HashMap::from(token::KEYWORD_DATA))
}

/// Keywords in lower case, used when lowercase keywords are enabled
fn lowercase_keywords() -> &'static HashMap<String, TokenKind> {
    static KEYWORDS: OnceLock<HashMap<String, TokenKind>> = OnceLock::new();
    KEYWORDS.get_or_init(|| {
        token::KEYWORD_DATA
            .iter()
            .map(|(name, kind)| (name.to_lowercase(), *kind))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str, features: Features) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(SourceId(0), source, features);
        let mut kinds = vec![];
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(tok.kind);
        }
    }

    #[test]
    fn punctuation() {
        use TokenKind::*;

        assert_eq!(
            kinds("::= : ... [[ [ ]] ] { } ( ) , ; ! -", Features::default()),
            [
                Assignment,
                Colon,
                Ellipsis,
                LeftVersionBrackets,
                LeftSquare,
                RightVersionBrackets,
                RightSquare,
                LeftCurly,
                RightCurly,
                LeftParen,
                RightParen,
                Comma,
                SemiColon,
                Exclamation,
                Hyphen
            ]
        );
    }

    #[test]
    fn identifiers_and_keywords() {
        use TokenKind::*;

        assert_eq!(
            kinds("my-field My-Type SEQUENCE UTF8String sequence", Features::default()),
            [Identifier, TypeReference, KwSequence, KwUtf8String, Identifier]
        );

        let features = Features {
            lowercase_keywords: true,
            ..Default::default()
        };
        assert_eq!(kinds("sequence Of", features), [KwSequence, KwOf]);
    }

    #[test]
    fn bit_and_hex_strings() {
        use TokenKind::*;

        assert_eq!(
            kinds("'0101'B 'CA FE'H '12'H ''B", Features::default()),
            [BString, HString, HString, BString]
        );

        let mut lexer = Lexer::new(SourceId(0), "'0 1'B", Features::default());
        assert_eq!(lexer.next_token().unwrap().value, "'0 1'B");

        let mut lexer = Lexer::new(SourceId(0), "'G'H", Features::default());
        assert!(matches!(
            lexer.next_token(),
            Err(LexerError::InvalidString { offset: 0, .. })
        ));
    }

    #[test]
    fn trailing_hyphen_is_not_part_of_identifier() {
        let mut lexer = Lexer::new(SourceId(0), "abc- 5", Features::default());
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.value, "abc");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Hyphen);
    }

    #[test]
    fn comments() {
        use TokenKind::*;

        assert_eq!(
            kinds("a -- one -- b -- two\n c /* x /* y */ z */ d", Features::default()),
            [
                Identifier,
                SingleComment,
                Identifier,
                SingleComment,
                Identifier,
                MultiComment,
                Identifier
            ]
        );

        let mut lexer = Lexer::new(SourceId(0), "/* /* */", Features::default());
        assert!(matches!(
            lexer.next_token(),
            Err(LexerError::NonTerminatedComment { offset: 0, .. })
        ));
    }

    #[test]
    fn peek_skips_comments() {
        let mut lexer = Lexer::new(SourceId(0), "-- note --\nBEGIN", Features::default());
        assert_eq!(lexer.peek().unwrap().kind, TokenKind::KwBegin);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::SingleComment);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::KwBegin);
        assert!(lexer.is_eof().unwrap());
    }

    #[test]
    fn strings_and_numbers() {
        use TokenKind::*;

        assert_eq!(
            kinds(r#"0 42 "say ""hi""" '0101'B 'CAFE'H"#, Features::default()),
            [Number, Number, CString, BString, HString]
        );

        let mut lexer = Lexer::new(SourceId(0), "012", Features::default());
        assert!(matches!(lexer.next_token(), Err(LexerError::InvalidNumber { .. })));

        let mut lexer = Lexer::new(SourceId(0), "'012'B", Features::default());
        assert!(matches!(lexer.next_token(), Err(LexerError::InvalidString { .. })));
    }

    #[test]
    fn unicode_identifiers() {
        let mut lexer = Lexer::new(SourceId(0), "caf\u{e9}", Features::default());
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.value, "caf");

        let features = Features {
            unicode_identifiers: true,
            ..Default::default()
        };
        let mut lexer = Lexer::new(SourceId(0), "caf\u{e9} x", features);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.value, "caf\u{e9}");
        assert_eq!(tok.kind, TokenKind::Identifier);
    }
}
