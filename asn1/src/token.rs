use std::fmt::Display;

use crate::compiler::SourceId;

/// The kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Comments
    SingleComment,
    MultiComment,

    // Single Character tokens
    LeftCurly,
    RightCurly,
    LeftParen,
    RightParen,
    LeftSquare,
    RightSquare,
    Comma,
    Hyphen,
    Colon,
    SemiColon,
    Exclamation,

    // Compound Tokens
    Identifier,
    TypeReference,
    Number,
    CString,
    BString,
    HString,
    Assignment,
    Ellipsis,
    LeftVersionBrackets,
    RightVersionBrackets,

    // Keywords
    KwAny,
    KwApplication,
    KwAutomatic,
    KwBegin,
    KwBit,
    KwBmpString,
    KwBoolean,
    KwChoice,
    KwComponents,
    KwDefault,
    KwDefinitions,
    KwEnd,
    KwExplicit,
    KwExtensibility,
    KwFalse,
    KwGeneralizedTime,
    KwIa5String,
    KwIdentifier,
    KwImplicit,
    KwImplied,
    KwInteger,
    KwNull,
    KwNumericString,
    KwObject,
    KwOctet,
    KwOf,
    KwOptional,
    KwPrintableString,
    KwPrivate,
    KwReal,
    KwSequence,
    KwSet,
    KwString,
    KwTags,
    KwTrue,
    KwUniversal,
    KwUtcTime,
    KwUtf8String,
    KwVisibleString,

    /// End of the source file
    Eof,
}

/// Data relating to a single lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token<'a> {
    /// The type of this token
    pub(crate) kind: TokenKind,

    /// The string value of the token, will be a valid string for the token kind
    /// so it can be parsed further, e.g. into a number.
    pub(crate) value: &'a str,

    /// Byte offset into the file that the token starts at.  The end location
    /// can be derived from this offset + the length of the value string.
    pub(crate) offset: usize,

    /// The file ID of the file the token was lexed from
    pub(crate) file: SourceId,
}

impl Token<'_> {
    /// Byte offset one past the end of the token
    pub(crate) fn end(&self) -> usize {
        self.offset + self.value.len()
    }
}

/// Mapping from keyword spelling to token kind
pub const KEYWORD_DATA: [(&str, TokenKind); 39] = [
    ("ANY", TokenKind::KwAny),
    ("APPLICATION", TokenKind::KwApplication),
    ("AUTOMATIC", TokenKind::KwAutomatic),
    ("BEGIN", TokenKind::KwBegin),
    ("BIT", TokenKind::KwBit),
    ("BMPString", TokenKind::KwBmpString),
    ("BOOLEAN", TokenKind::KwBoolean),
    ("CHOICE", TokenKind::KwChoice),
    ("COMPONENTS", TokenKind::KwComponents),
    ("DEFAULT", TokenKind::KwDefault),
    ("DEFINITIONS", TokenKind::KwDefinitions),
    ("END", TokenKind::KwEnd),
    ("EXPLICIT", TokenKind::KwExplicit),
    ("EXTENSIBILITY", TokenKind::KwExtensibility),
    ("FALSE", TokenKind::KwFalse),
    ("GeneralizedTime", TokenKind::KwGeneralizedTime),
    ("IA5String", TokenKind::KwIa5String),
    ("IDENTIFIER", TokenKind::KwIdentifier),
    ("IMPLICIT", TokenKind::KwImplicit),
    ("IMPLIED", TokenKind::KwImplied),
    ("INTEGER", TokenKind::KwInteger),
    ("NULL", TokenKind::KwNull),
    ("NumericString", TokenKind::KwNumericString),
    ("OBJECT", TokenKind::KwObject),
    ("OCTET", TokenKind::KwOctet),
    ("OF", TokenKind::KwOf),
    ("OPTIONAL", TokenKind::KwOptional),
    ("PrintableString", TokenKind::KwPrintableString),
    ("PRIVATE", TokenKind::KwPrivate),
    ("REAL", TokenKind::KwReal),
    ("SEQUENCE", TokenKind::KwSequence),
    ("SET", TokenKind::KwSet),
    ("STRING", TokenKind::KwString),
    ("TAGS", TokenKind::KwTags),
    ("TRUE", TokenKind::KwTrue),
    ("UNIVERSAL", TokenKind::KwUniversal),
    ("UTCTime", TokenKind::KwUtcTime),
    ("UTF8String", TokenKind::KwUtf8String),
    ("VisibleString", TokenKind::KwVisibleString),
];

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let punctuation = match self {
            TokenKind::SingleComment | TokenKind::MultiComment => return write!(f, "comment"),
            TokenKind::Identifier => return write!(f, "identifier"),
            TokenKind::TypeReference => return write!(f, "type reference"),
            TokenKind::Number => return write!(f, "number"),
            TokenKind::CString => return write!(f, "character string"),
            TokenKind::BString => return write!(f, "binary string"),
            TokenKind::HString => return write!(f, "hexadecimal string"),
            TokenKind::Eof => return write!(f, "end of file"),
            TokenKind::LeftCurly => "{",
            TokenKind::RightCurly => "}",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftSquare => "[",
            TokenKind::RightSquare => "]",
            TokenKind::Comma => ",",
            TokenKind::Hyphen => "-",
            TokenKind::Colon => ":",
            TokenKind::SemiColon => ";",
            TokenKind::Exclamation => "!",
            TokenKind::Assignment => "::=",
            TokenKind::Ellipsis => "...",
            TokenKind::LeftVersionBrackets => "[[",
            TokenKind::RightVersionBrackets => "]]",
            keyword => {
                let name = KEYWORD_DATA
                    .iter()
                    .find(|(_, kind)| kind == keyword)
                    .map_or("?", |(name, _)| name);
                return write!(f, "`{name}`");
            }
        };

        write!(f, "`{punctuation}`")
    }
}
