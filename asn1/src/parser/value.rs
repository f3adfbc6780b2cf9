use crate::{
    token::TokenKind,
    types::{Identifier, Value, ValueKind},
};

use super::{Parser, ParserError, Result};

const VALUE_START: &[TokenKind] = &[
    TokenKind::Number,
    TokenKind::Hyphen,
    TokenKind::KwTrue,
    TokenKind::KwFalse,
    TokenKind::KwNull,
    TokenKind::CString,
    TokenKind::BString,
    TokenKind::HString,
    TokenKind::Identifier,
    TokenKind::LeftCurly,
];

impl<'a> Parser<'a> {
    /// Value ::=
    ///     SignedNumber
    ///     | BooleanValue
    ///     | NullValue
    ///     | cstring | bstring | hstring
    ///     | valuereference
    ///     | "{" ... "}"
    ///
    /// Braced values are only checked for balanced braces.
    pub(super) fn value(&mut self) -> Result<Value> {
        let tok = self.next(VALUE_START)?;

        let kind = match tok.kind {
            TokenKind::Number => ValueKind::Integer(self.integer(tok.value, false, tok.offset)?),
            TokenKind::Hyphen => {
                let number = self.next(&[TokenKind::Number])?;
                ValueKind::Integer(self.integer(number.value, true, number.offset)?)
            }
            TokenKind::KwTrue => ValueKind::Boolean(true),
            TokenKind::KwFalse => ValueKind::Boolean(false),
            TokenKind::KwNull => ValueKind::Null,
            TokenKind::CString => {
                let inner = &tok.value[1..tok.value.len() - 1];
                ValueKind::CString(inner.replace("\"\"", "\""))
            }
            TokenKind::BString => ValueKind::BString(string_digits(tok.value)),
            TokenKind::HString => ValueKind::HString(string_digits(tok.value)),
            TokenKind::Identifier => ValueKind::Reference(Identifier::new(tok.value)),
            _ => {
                self.skip_braced()?;
                ValueKind::Braced
            }
        };

        Ok(Value {
            kind,
            loc: self.loc_from(tok.offset),
        })
    }

    /// Parse the digits of a number token, negating if required
    fn integer(&self, digits: &str, negative: bool, offset: usize) -> Result<i64> {
        let text = if negative {
            format!("-{digits}")
        } else {
            digits.to_string()
        };

        text.parse().map_err(|_| ParserError::NumberTooLarge {
            offset,
            id: self.lexer.file,
        })
    }

    /// Skip tokens until the brace matching an already consumed `{`
    fn skip_braced(&mut self) -> Result {
        let mut depth = 1;

        while depth > 0 {
            let tok = self.peek(&[])?;
            if tok.kind == TokenKind::Eof {
                return Err(ParserError::Expected {
                    kind: vec![TokenKind::RightCurly].into(),
                    got: tok.kind,
                    offset: tok.offset,
                    id: tok.file,
                });
            }

            match self.next(&[])?.kind {
                TokenKind::LeftCurly => depth += 1,
                TokenKind::RightCurly => depth -= 1,
                _ => (),
            }
        }

        Ok(())
    }
}

/// The digits of `'0101'B` without quotes, suffix or whitespace
fn string_digits(value: &str) -> String {
    let end = value.rfind('\'').unwrap_or(value.len());
    value[..end]
        .chars()
        .filter(|&c| c != '\'' && !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::string_digits;

    #[test]
    fn bit_string_digits() {
        assert_eq!(string_digits("'01 10'B"), "0110");
        assert_eq!(string_digits("'CAFE'H"), "CAFE");
        assert_eq!(string_digits("''B"), "");
    }
}
