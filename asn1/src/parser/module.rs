use crate::{
    ast::{Assignment, AssignmentKind, ModuleDefinition, TagDefault},
    token::TokenKind,
};

use super::{Parser, Result};

impl<'a> Parser<'a> {
    /// Parse a single ASN.1 module definition
    ///
    /// ModuleDefinition ::=
    ///     ModuleIdentifier
    ///     DEFINITIONS
    ///     TagDefault
    ///     ExtensionDefault
    ///     "::="
    ///     BEGIN
    ///     AssignmentList
    ///     END
    pub(super) fn module_definition(&mut self) -> Result<ModuleDefinition> {
        let name = self.next(&[TokenKind::TypeReference])?;

        let tok = self.peek(&[TokenKind::LeftCurly, TokenKind::KwDefinitions])?;
        if tok.kind == TokenKind::LeftCurly {
            self.definitive_oid()?;
        }

        self.next(&[TokenKind::KwDefinitions])?;
        let tag_default = self.tag_default()?;
        let extensibility_implied = self.extension_default()?;
        self.next(&[TokenKind::Assignment])?;
        self.next(&[TokenKind::KwBegin])?;

        // ensure there is at least one assignment before the end token
        self.peek(&[TokenKind::TypeReference, TokenKind::Identifier])?;

        let mut assignments = vec![];
        loop {
            let tok = self.peek(&[
                TokenKind::TypeReference,
                TokenKind::Identifier,
                TokenKind::KwEnd,
            ])?;
            if tok.kind == TokenKind::KwEnd {
                break;
            }

            assignments.push(self.assignment()?);
        }

        self.next(&[TokenKind::KwEnd])?;

        Ok(ModuleDefinition {
            name: name.value.to_string(),
            loc: self.loc_of(name),
            tag_default,
            extensibility_implied,
            assignments,
        })
    }

    /// Object identifier after the name of a module.  It is not needed for
    /// analysis so is only checked for syntax.
    ///
    /// DefinitiveOID ::= "{" DefinitiveObjIdComponent+ "}"
    fn definitive_oid(&mut self) -> Result {
        self.next(&[TokenKind::LeftCurly])?;

        loop {
            let tok = self.next(&[TokenKind::Identifier, TokenKind::Number])?;

            if tok.kind == TokenKind::Identifier {
                let tok = self.peek(&[
                    TokenKind::LeftParen,
                    TokenKind::Identifier,
                    TokenKind::Number,
                    TokenKind::RightCurly,
                ])?;
                if tok.kind == TokenKind::LeftParen {
                    self.next(&[TokenKind::LeftParen])?;
                    self.next(&[TokenKind::Number])?;
                    self.next(&[TokenKind::RightParen])?;
                }
            }

            let tok = self.peek(&[
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::RightCurly,
            ])?;
            if tok.kind == TokenKind::RightCurly {
                self.next(&[TokenKind::RightCurly])?;
                return Ok(());
            }
        }
    }

    /// TagDefault ::= EXPLICIT TAGS | IMPLICIT TAGS | AUTOMATIC TAGS | empty
    fn tag_default(&mut self) -> Result<TagDefault> {
        let tok = self.peek(&[
            TokenKind::KwExplicit,
            TokenKind::KwImplicit,
            TokenKind::KwAutomatic,
            TokenKind::KwExtensibility,
            TokenKind::Assignment,
        ])?;

        let default = match tok.kind {
            TokenKind::KwExplicit => TagDefault::Explicit,
            TokenKind::KwImplicit => TagDefault::Implicit,
            TokenKind::KwAutomatic => TagDefault::Automatic,
            _ => return Ok(TagDefault::default()),
        };

        self.next(vec![tok.kind])?;
        self.next(&[TokenKind::KwTags])?;

        Ok(default)
    }

    /// ExtensionDefault ::= EXTENSIBILITY IMPLIED | empty
    fn extension_default(&mut self) -> Result<bool> {
        let tok = self.peek(&[TokenKind::KwExtensibility, TokenKind::Assignment])?;
        if tok.kind == TokenKind::Assignment {
            return Ok(false);
        }

        self.next(&[TokenKind::KwExtensibility])?;
        self.next(&[TokenKind::KwImplied])?;
        Ok(true)
    }

    /// Assignment ::= TypeAssignment | ValueAssignment
    ///
    /// TypeAssignment ::= typereference "::=" Type
    /// ValueAssignment ::= valuereference Type "::=" Value
    fn assignment(&mut self) -> Result<Assignment> {
        let name = self.next(&[TokenKind::TypeReference, TokenKind::Identifier])?;

        let kind = if name.kind == TokenKind::TypeReference {
            self.next(&[TokenKind::Assignment])?;
            AssignmentKind::Type(self.ty()?)
        } else {
            let ty = self.ty()?;
            self.next(&[TokenKind::Assignment])?;
            let value = self.value()?;
            AssignmentKind::Value { ty, value }
        };

        Ok(Assignment {
            name: name.value.to_string(),
            loc: self.loc_of(name),
            kind,
        })
    }
}
