mod error;
mod module;
mod ty;
mod value;

use crate::{
    ast::ModuleDefinition,
    lexer::Lexer,
    token::{Token, TokenKind},
    types::Location,
    util::CowVec,
};

pub use self::error::{ParserError, Result};

/// Maximum nesting of types and values before the parser gives up
const MAX_DEPTH: usize = 100;

/// Parser for ASN.1 definition files
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    /// Lexer to get tokens from a source file
    lexer: Lexer<'a>,

    /// Byte offset of the end of the last consumed token
    last_end: usize,

    /// Current recursion depth of the parser
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser from a lexer
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            last_end: 0,
            depth: 0,
        }
    }

    /// Run the parser to produce a set of ASN.1 module definitions
    pub fn run(mut self) -> Result<Vec<ModuleDefinition>> {
        let mut modules = vec![];

        while !self.lexer.is_eof()? {
            modules.push(self.module_definition()?);
        }

        Ok(modules)
    }

    /// Consume a token of the given kind or return an error.  Ignores any comment tokens.
    /// If an empty list is given, returns any token.
    fn next(&mut self, kind: impl Into<CowVec<TokenKind>>) -> Result<Token<'a>> {
        self.peek(kind)?;

        loop {
            let tok = self.lexer.next_token()?;

            if tok.kind != TokenKind::SingleComment && tok.kind != TokenKind::MultiComment {
                self.last_end = tok.end();
                return Ok(tok);
            }
        }
    }

    /// Peek a token without consuming it or return an error if the token is not
    /// of one of the provided kinds. If an empty list is given, returns any token.
    fn peek(&mut self, kind: impl Into<CowVec<TokenKind>>) -> Result<Token<'a>> {
        let kind = kind.into();

        let peek = self.lexer.peek()?;

        if kind.contains(&peek.kind) || kind.is_empty() {
            Ok(peek)
        } else {
            Err(ParserError::Expected {
                kind,
                got: peek.kind,
                offset: peek.offset,
                id: peek.file,
            })
        }
    }

    /// Enter a nested construct, failing if nesting is too deep
    fn start_node(&mut self) -> Result {
        if self.depth >= MAX_DEPTH {
            return Err(ParserError::ParserDepthExceeded {
                offset: self.lexer.offset(),
                id: self.lexer.file,
            });
        }

        self.depth += 1;
        Ok(())
    }

    /// Leave the most recent nested construct
    fn end_node(&mut self) {
        self.depth -= 1;
    }

    /// Location from the given offset to the end of the last consumed token
    fn loc_from(&self, start: usize) -> Location {
        Location::new(self.lexer.file, start..self.last_end.max(start))
    }

    /// Location of a single token
    fn loc_of(&self, tok: Token) -> Location {
        Location::new(tok.file, tok.offset..tok.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{AdditionAst, AssignmentKind, ComponentAst, TagDefault, TagNumberAst, TypeBody},
        compiler::{Features, SourceId},
        types::{Builtin, CompoundKind, TagClass, TagPlicit, ValueKind},
    };

    fn parse(source: &str) -> Result<Vec<ModuleDefinition>> {
        Parser::new(Lexer::new(SourceId(0), source, Features::default())).run()
    }

    fn single_type(source: &str) -> crate::ast::TypeAst {
        let text = format!("M DEFINITIONS ::= BEGIN T ::= {source} END");
        let mut modules = parse(&text).unwrap();
        let assignment = modules.remove(0).assignments.remove(0);
        match assignment.kind {
            AssignmentKind::Type(ty) => ty,
            other => panic!("expected type assignment, got {other:?}"),
        }
    }

    #[test]
    fn module_header() {
        let modules = parse(
            "Mod { iso(1) standard 8571 } DEFINITIONS AUTOMATIC TAGS EXTENSIBILITY IMPLIED ::= \
             BEGIN A ::= INTEGER a A ::= 5 END \
             Other DEFINITIONS ::= BEGIN B ::= BOOLEAN END",
        )
        .unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "Mod");
        assert_eq!(modules[0].tag_default, TagDefault::Automatic);
        assert!(modules[0].extensibility_implied);
        assert_eq!(modules[0].assignments.len(), 2);
        assert_eq!(modules[1].tag_default, TagDefault::Explicit);
        assert!(!modules[1].extensibility_implied);

        match &modules[0].assignments[1].kind {
            AssignmentKind::Value { value, .. } => assert_eq!(value.kind, ValueKind::Integer(5)),
            other => panic!("expected value assignment, got {other:?}"),
        }
    }

    #[test]
    fn tagged_types() {
        let ty = single_type("[APPLICATION 3] IMPLICIT [id] OCTET STRING");

        assert_eq!(ty.tags.len(), 2);
        assert_eq!(ty.tags[0].class, TagClass::Application);
        assert_eq!(ty.tags[0].plicit, TagPlicit::Implicit);
        assert!(matches!(ty.tags[0].number, TagNumberAst::Number(3)));
        assert_eq!(ty.tags[1].class, TagClass::Context);
        assert_eq!(ty.tags[1].plicit, TagPlicit::Default);
        assert!(matches!(&ty.tags[1].number, TagNumberAst::Reference(r) if r == "id"));
        assert!(matches!(ty.body, TypeBody::Builtin(Builtin::OctetString)));
    }

    #[test]
    fn component_lists() {
        let ty = single_type(
            "SEQUENCE { a INTEGER, COMPONENTS OF B, ... ! INTEGER : 5, \
             c BOOLEAN, [[ 2: d NULL, e IA5String ]], ..., f REAL OPTIONAL, g INTEGER DEFAULT -1 }",
        );

        let TypeBody::Structured(CompoundKind::Sequence, lists) = ty.body else {
            panic!("expected a SEQUENCE");
        };

        assert_eq!(lists.root_before.len(), 2);
        assert!(matches!(lists.root_before[1], ComponentAst::ComponentsOf { .. }));

        let extension = lists.extension.unwrap();
        assert!(extension.exception.as_ref().is_some_and(|e| e.ty.is_some()));
        assert_eq!(extension.additions.len(), 2);
        match &extension.additions[1] {
            AdditionAst::Group {
                version,
                components,
                ..
            } => {
                assert_eq!(version.as_ref().map(|v| &v.kind), Some(&ValueKind::Integer(2)));
                assert_eq!(components.len(), 2);
            }
            other => panic!("expected a group, got {other:?}"),
        }

        assert_eq!(lists.root_after.len(), 2);
        assert!(matches!(
            &lists.root_after[0],
            ComponentAst::Named { optional: true, .. }
        ));
        assert!(matches!(
            &lists.root_after[1],
            ComponentAst::Named { default: Some(v), .. } if v.kind == ValueKind::Integer(-1)
        ));
    }

    #[test]
    fn choice_restrictions() {
        let empty = parse("M DEFINITIONS ::= BEGIN T ::= CHOICE { } END");
        assert!(matches!(empty, Err(ParserError::Expected { .. })));

        let second_root = parse("M DEFINITIONS ::= BEGIN T ::= CHOICE { a NULL, ..., ..., b NULL } END");
        assert!(matches!(second_root, Err(ParserError::Restriction { .. })));

        let optional = parse("M DEFINITIONS ::= BEGIN T ::= CHOICE { a NULL OPTIONAL } END");
        assert!(matches!(optional, Err(ParserError::Expected { .. })));

        let components_of = parse("M DEFINITIONS ::= BEGIN T ::= CHOICE { COMPONENTS OF U } END");
        assert!(matches!(components_of, Err(ParserError::Expected { .. })));

        let end_marker = parse("M DEFINITIONS ::= BEGIN T ::= CHOICE { a NULL, ..., ... } END");
        assert!(end_marker.is_ok());
    }

    #[test]
    fn braced_values_are_skipped() {
        let modules =
            parse("M DEFINITIONS ::= BEGIN v SEQUENCE { a INTEGER } ::= { a { 1, { 2 } } } END")
                .unwrap();
        match &modules[0].assignments[0].kind {
            AssignmentKind::Value { value, .. } => assert_eq!(value.kind, ValueKind::Braced),
            other => panic!("expected value assignment, got {other:?}"),
        }
    }

    #[test]
    fn depth_limit() {
        let mut ty = String::from("INTEGER");
        for _ in 0..MAX_DEPTH + 1 {
            ty = format!("SEQUENCE OF {ty}");
        }

        let result = parse(&format!("M DEFINITIONS ::= BEGIN T ::= {ty} END"));
        assert!(matches!(result, Err(ParserError::ParserDepthExceeded { .. })));
    }
}
