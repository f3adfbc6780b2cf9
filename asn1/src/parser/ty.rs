use crate::{
    ast::{
        AdditionAst, ComponentAst, ComponentListsAst, ExceptionAst, ExtensionAst, TagAst,
        TagNumberAst, TypeAst, TypeBody,
    },
    token::TokenKind,
    types::{Builtin, CompoundKind, TagClass, TagPlicit},
};

use super::{Parser, ParserError, Result};

/// Tokens that can start a type after any tags
const TYPE_BODY_START: &[TokenKind] = &[
    TokenKind::TypeReference,
    TokenKind::KwAny,
    TokenKind::KwBit,
    TokenKind::KwBmpString,
    TokenKind::KwBoolean,
    TokenKind::KwChoice,
    TokenKind::KwGeneralizedTime,
    TokenKind::KwIa5String,
    TokenKind::KwInteger,
    TokenKind::KwNull,
    TokenKind::KwNumericString,
    TokenKind::KwObject,
    TokenKind::KwOctet,
    TokenKind::KwPrintableString,
    TokenKind::KwReal,
    TokenKind::KwSequence,
    TokenKind::KwSet,
    TokenKind::KwUtcTime,
    TokenKind::KwUtf8String,
    TokenKind::KwVisibleString,
];

/// Tokens that can start a type, including tags
const TYPE_START: &[TokenKind] = &[
    TokenKind::LeftSquare,
    TokenKind::TypeReference,
    TokenKind::KwAny,
    TokenKind::KwBit,
    TokenKind::KwBmpString,
    TokenKind::KwBoolean,
    TokenKind::KwChoice,
    TokenKind::KwGeneralizedTime,
    TokenKind::KwIa5String,
    TokenKind::KwInteger,
    TokenKind::KwNull,
    TokenKind::KwNumericString,
    TokenKind::KwObject,
    TokenKind::KwOctet,
    TokenKind::KwPrintableString,
    TokenKind::KwReal,
    TokenKind::KwSequence,
    TokenKind::KwSet,
    TokenKind::KwUtcTime,
    TokenKind::KwUtf8String,
    TokenKind::KwVisibleString,
];

/// Tokens that can follow the closing bracket of a tag
const TAG_FOLLOW: &[TokenKind] = &[
    TokenKind::KwImplicit,
    TokenKind::KwExplicit,
    TokenKind::LeftSquare,
    TokenKind::TypeReference,
    TokenKind::KwAny,
    TokenKind::KwBit,
    TokenKind::KwBmpString,
    TokenKind::KwBoolean,
    TokenKind::KwChoice,
    TokenKind::KwGeneralizedTime,
    TokenKind::KwIa5String,
    TokenKind::KwInteger,
    TokenKind::KwNull,
    TokenKind::KwNumericString,
    TokenKind::KwObject,
    TokenKind::KwOctet,
    TokenKind::KwPrintableString,
    TokenKind::KwReal,
    TokenKind::KwSequence,
    TokenKind::KwSet,
    TokenKind::KwUtcTime,
    TokenKind::KwUtf8String,
    TokenKind::KwVisibleString,
];

/// Tokens that can follow the `!` of an exception specification
const EXCEPTION_START: &[TokenKind] = &[
    TokenKind::Number,
    TokenKind::Hyphen,
    TokenKind::Identifier,
    TokenKind::LeftSquare,
    TokenKind::TypeReference,
    TokenKind::KwAny,
    TokenKind::KwBit,
    TokenKind::KwBmpString,
    TokenKind::KwBoolean,
    TokenKind::KwChoice,
    TokenKind::KwGeneralizedTime,
    TokenKind::KwIa5String,
    TokenKind::KwInteger,
    TokenKind::KwNull,
    TokenKind::KwNumericString,
    TokenKind::KwObject,
    TokenKind::KwOctet,
    TokenKind::KwPrintableString,
    TokenKind::KwReal,
    TokenKind::KwSequence,
    TokenKind::KwSet,
    TokenKind::KwUtcTime,
    TokenKind::KwUtf8String,
    TokenKind::KwVisibleString,
];

impl<'a> Parser<'a> {
    /// Type ::= BuiltinType | ReferencedType | TaggedType
    ///
    /// TaggedType ::= Tag Type | Tag IMPLICIT Type | Tag EXPLICIT Type
    pub(super) fn ty(&mut self) -> Result<TypeAst> {
        self.start_node()?;

        let start = self.peek(TYPE_START)?.offset;

        let mut tags = vec![];
        while self.peek(TYPE_START)?.kind == TokenKind::LeftSquare {
            tags.push(self.tag()?);
        }

        let body = self.type_body()?;

        self.end_node();
        Ok(TypeAst {
            tags,
            body,
            loc: self.loc_from(start),
        })
    }

    /// Tag ::= "[" Class ClassNumber "]"
    ///
    /// ClassNumber ::= number | DefinedValue
    ///
    /// Class ::= UNIVERSAL | APPLICATION | PRIVATE | empty
    fn tag(&mut self) -> Result<TagAst> {
        let open = self.next(&[TokenKind::LeftSquare])?;

        let tok = self.peek(&[
            TokenKind::KwUniversal,
            TokenKind::KwApplication,
            TokenKind::KwPrivate,
            TokenKind::Number,
            TokenKind::Identifier,
        ])?;
        let class = match tok.kind {
            TokenKind::KwUniversal => TagClass::Universal,
            TokenKind::KwApplication => TagClass::Application,
            TokenKind::KwPrivate => TagClass::Private,
            _ => TagClass::Context,
        };
        if class != TagClass::Context {
            self.next(vec![tok.kind])?;
        }

        let tok = self.next(&[TokenKind::Number, TokenKind::Identifier])?;
        let number = if tok.kind == TokenKind::Number {
            let number = tok.value.parse().map_err(|_| ParserError::NumberTooLarge {
                offset: tok.offset,
                id: tok.file,
            })?;
            TagNumberAst::Number(number)
        } else {
            TagNumberAst::Reference(tok.value.to_string())
        };

        self.next(&[TokenKind::RightSquare])?;
        let loc = self.loc_from(open.offset);

        let tok = self.peek(TAG_FOLLOW)?;
        let plicit = match tok.kind {
            TokenKind::KwImplicit => TagPlicit::Implicit,
            TokenKind::KwExplicit => TagPlicit::Explicit,
            _ => TagPlicit::Default,
        };
        if plicit != TagPlicit::Default {
            self.next(vec![tok.kind])?;
        }

        Ok(TagAst {
            class,
            number,
            plicit,
            loc,
        })
    }

    /// The type after any tags
    fn type_body(&mut self) -> Result<TypeBody> {
        let tok = self.next(TYPE_BODY_START)?;

        let builtin = match tok.kind {
            TokenKind::KwBoolean => Builtin::Boolean,
            TokenKind::KwNull => Builtin::Null,
            TokenKind::KwInteger => Builtin::Integer,
            TokenKind::KwReal => Builtin::Real,
            TokenKind::KwUtf8String => Builtin::Utf8String,
            TokenKind::KwIa5String => Builtin::Ia5String,
            TokenKind::KwPrintableString => Builtin::PrintableString,
            TokenKind::KwVisibleString => Builtin::VisibleString,
            TokenKind::KwNumericString => Builtin::NumericString,
            TokenKind::KwBmpString => Builtin::BmpString,
            TokenKind::KwUtcTime => Builtin::UtcTime,
            TokenKind::KwGeneralizedTime => Builtin::GeneralizedTime,
            TokenKind::KwOctet => {
                self.next(&[TokenKind::KwString])?;
                Builtin::OctetString
            }
            TokenKind::KwBit => {
                self.next(&[TokenKind::KwString])?;
                Builtin::BitString
            }
            TokenKind::KwObject => {
                self.next(&[TokenKind::KwIdentifier])?;
                Builtin::ObjectIdentifier
            }
            TokenKind::KwAny => return Ok(TypeBody::Any),
            TokenKind::TypeReference => return Ok(TypeBody::Reference(tok.value.to_string())),
            TokenKind::KwSequence | TokenKind::KwSet => {
                let sequence = tok.kind == TokenKind::KwSequence;

                if self.peek(&[TokenKind::LeftCurly, TokenKind::KwOf])?.kind == TokenKind::KwOf {
                    self.next(&[TokenKind::KwOf])?;
                    let element = Box::new(self.ty()?);
                    return Ok(if sequence {
                        TypeBody::SequenceOf(element)
                    } else {
                        TypeBody::SetOf(element)
                    });
                }

                let kind = if sequence {
                    CompoundKind::Sequence
                } else {
                    CompoundKind::Set
                };
                return Ok(TypeBody::Structured(kind, self.component_lists(kind)?));
            }
            TokenKind::KwChoice => {
                let lists = self.component_lists(CompoundKind::Choice)?;
                return Ok(TypeBody::Structured(CompoundKind::Choice, lists));
            }
            got => {
                return Err(ParserError::Expected {
                    kind: TYPE_BODY_START.into(),
                    got,
                    offset: tok.offset,
                    id: tok.file,
                })
            }
        };

        Ok(TypeBody::Builtin(builtin))
    }

    /// "{" ComponentTypeLists "}" | "{" "}"
    ///
    /// ComponentTypeLists ::=
    ///     RootComponentTypeList
    ///     | RootComponentTypeList "," ExtensionAndException ExtensionAdditions
    ///         OptionalExtensionMarker
    ///     | RootComponentTypeList "," ExtensionAndException ExtensionAdditions
    ///         ExtensionEndMarker "," RootComponentTypeList
    ///     | ExtensionAndException ExtensionAdditions ExtensionEndMarker ","
    ///         RootComponentTypeList
    ///     | ExtensionAndException ExtensionAdditions OptionalExtensionMarker
    ///
    /// The alternatives of a CHOICE follow the same rules, except that the root
    /// list must contain an alternative and there is no second root list.
    fn component_lists(&mut self, kind: CompoundKind) -> Result<ComponentListsAst> {
        self.next(&[TokenKind::LeftCurly])?;

        let mut lists = ComponentListsAst::default();

        let first: &'static [TokenKind] = match kind {
            CompoundKind::Choice => &[TokenKind::Identifier],
            _ => &[
                TokenKind::Identifier,
                TokenKind::KwComponents,
                TokenKind::Ellipsis,
                TokenKind::RightCurly,
            ],
        };
        if self.peek(first)?.kind == TokenKind::RightCurly {
            self.next(&[TokenKind::RightCurly])?;
            return Ok(lists);
        }

        let mut markers = 0;
        loop {
            let expected: &'static [TokenKind] = match (kind, markers) {
                (CompoundKind::Choice, 0) => &[TokenKind::Identifier, TokenKind::Ellipsis],
                (CompoundKind::Choice, 1) => &[
                    TokenKind::Identifier,
                    TokenKind::LeftVersionBrackets,
                    TokenKind::Ellipsis,
                ],
                (CompoundKind::Choice, _) => &[TokenKind::Identifier],
                (_, 0) => &[
                    TokenKind::Identifier,
                    TokenKind::KwComponents,
                    TokenKind::Ellipsis,
                ],
                (_, 1) => &[
                    TokenKind::Identifier,
                    TokenKind::KwComponents,
                    TokenKind::LeftVersionBrackets,
                    TokenKind::Ellipsis,
                ],
                _ => &[TokenKind::Identifier, TokenKind::KwComponents],
            };

            let tok = self.peek(expected)?;
            match tok.kind {
                TokenKind::Ellipsis if markers == 0 => {
                    markers += 1;
                    lists.extension = Some(self.extension_and_exception()?);
                }
                TokenKind::Ellipsis => {
                    markers += 1;
                    self.next(&[TokenKind::Ellipsis])?;
                }
                TokenKind::LeftVersionBrackets => {
                    let group = self.extension_group(kind)?;
                    if let Some(extension) = &mut lists.extension {
                        extension.additions.push(group);
                    }
                }
                _ if kind == CompoundKind::Choice && markers == 2 => {
                    return Err(ParserError::Restriction {
                        message: "CHOICE types cannot have alternatives after the extension end marker",
                        offset: tok.offset,
                        id: tok.file,
                    });
                }
                _ => {
                    let component = self.component(kind)?;
                    match (markers, &mut lists.extension) {
                        (0, _) => lists.root_before.push(component),
                        (1, Some(extension)) => {
                            extension.additions.push(AdditionAst::Component(component))
                        }
                        _ => lists.root_after.push(component),
                    }
                }
            }

            let tok = self.next(&[TokenKind::Comma, TokenKind::RightCurly])?;
            if tok.kind == TokenKind::RightCurly {
                break;
            }
        }

        Ok(lists)
    }

    /// ExtensionAndException ::= "..." | "..." ExceptionSpec
    fn extension_and_exception(&mut self) -> Result<ExtensionAst> {
        let tok = self.next(&[TokenKind::Ellipsis])?;
        let loc = self.loc_of(tok);

        let next = self.peek(&[
            TokenKind::Exclamation,
            TokenKind::Comma,
            TokenKind::RightCurly,
        ])?;
        let exception = if next.kind == TokenKind::Exclamation {
            Some(self.exception_spec()?)
        } else {
            None
        };

        Ok(ExtensionAst {
            exception,
            additions: vec![],
            loc,
        })
    }

    /// ExceptionSpec ::= "!" ExceptionIdentification
    ///
    /// ExceptionIdentification ::= SignedNumber | DefinedValue | Type ":" Value
    fn exception_spec(&mut self) -> Result<ExceptionAst> {
        let start = self.next(&[TokenKind::Exclamation])?.offset;

        let tok = self.peek(EXCEPTION_START)?;
        let ty = match tok.kind {
            TokenKind::Number | TokenKind::Hyphen | TokenKind::Identifier => None,
            _ => {
                let ty = self.ty()?;
                self.next(&[TokenKind::Colon])?;
                Some(Box::new(ty))
            }
        };

        let value = self.value()?;

        Ok(ExceptionAst {
            ty,
            value,
            loc: self.loc_from(start),
        })
    }

    /// ExtensionAdditionGroup ::= "[[" VersionNumber ComponentTypeList "]]"
    ///
    /// VersionNumber ::= empty | number ":"
    fn extension_group(&mut self, kind: CompoundKind) -> Result<AdditionAst> {
        let start = self.next(&[TokenKind::LeftVersionBrackets])?.offset;

        let tok = self.peek(&[
            TokenKind::Number,
            TokenKind::Identifier,
            TokenKind::KwComponents,
        ])?;
        let version = if tok.kind == TokenKind::Number {
            let version = self.value()?;
            self.next(&[TokenKind::Colon])?;
            Some(version)
        } else {
            None
        };

        let mut components = vec![];
        loop {
            components.push(self.component(kind)?);

            let tok = self.next(&[TokenKind::Comma, TokenKind::RightVersionBrackets])?;
            if tok.kind == TokenKind::RightVersionBrackets {
                break;
            }
        }

        Ok(AdditionAst::Group {
            version,
            components,
            loc: self.loc_from(start),
        })
    }

    /// ComponentType ::=
    ///     NamedType
    ///     | NamedType OPTIONAL
    ///     | NamedType DEFAULT Value
    ///     | COMPONENTS OF Type
    ///
    /// NamedType ::= identifier Type
    fn component(&mut self, kind: CompoundKind) -> Result<ComponentAst> {
        let expected: &'static [TokenKind] = match kind {
            CompoundKind::Choice => &[TokenKind::Identifier],
            _ => &[TokenKind::Identifier, TokenKind::KwComponents],
        };
        let tok = self.next(expected)?;

        if tok.kind == TokenKind::KwComponents {
            self.next(&[TokenKind::KwOf])?;
            let ty = self.ty()?;
            return Ok(ComponentAst::ComponentsOf {
                ty,
                loc: self.loc_from(tok.offset),
            });
        }

        let ty = self.ty()?;

        let mut optional = false;
        let mut default = None;
        if kind != CompoundKind::Choice {
            let next = self.peek(&[
                TokenKind::KwOptional,
                TokenKind::KwDefault,
                TokenKind::Comma,
                TokenKind::RightCurly,
                TokenKind::RightVersionBrackets,
            ])?;

            match next.kind {
                TokenKind::KwOptional => {
                    self.next(&[TokenKind::KwOptional])?;
                    optional = true;
                }
                TokenKind::KwDefault => {
                    self.next(&[TokenKind::KwDefault])?;
                    default = Some(self.value()?);
                }
                _ => (),
            }
        }

        Ok(ComponentAst::Named {
            name: tok.value.to_string(),
            name_loc: self.loc_of(tok),
            ty,
            optional,
            default,
            loc: self.loc_from(tok.offset),
        })
    }
}
