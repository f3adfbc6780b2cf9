use asn1_sema::{
    types::{Tag, TagClass, TagPlicit, TypeId},
    AnalysisContext, AsnCompiler, Diagnostic, Features, Level,
};

fn analyse_with<T>(
    features: Features,
    sources: &[&str],
    check: impl FnOnce(&mut AnalysisContext<'_>) -> T,
) -> T {
    let mut compiler = AsnCompiler::new();
    *compiler = features;

    for (i, source) in sources.iter().enumerate() {
        compiler
            .add_file(format!("test{i}.asn"), source.to_string())
            .unwrap();
    }

    let mut ctx = compiler.analysis().unwrap();
    check(&mut ctx)
}

fn analyse<T>(source: &str, check: impl FnOnce(&mut AnalysisContext<'_>) -> T) -> T {
    analyse_with(Features::default(), &[source], check)
}

fn errors(ctx: &AnalysisContext) -> Vec<String> {
    ctx.diagnostics()
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.error_code.clone())
        .collect()
}

fn ty(ctx: &AnalysisContext, name: &str) -> TypeId {
    ctx.type_named("M", name).unwrap()
}

fn names(ctx: &AnalysisContext, name: &str) -> Vec<String> {
    let arena = ctx.types();
    arena
        .components(ty(ctx, name))
        .unwrap()
        .flattened_fields()
        .iter()
        .map(|&f| arena.field(f).name.to_string())
        .collect()
}

/// Outermost tag of a field of a type assignment
fn field_tag(ctx: &mut AnalysisContext, name: &str, field: &str) -> Tag {
    let field = ctx.field_named(ty(ctx, name), field).unwrap().unwrap();
    ctx.types().tag(ctx.types().field(field).ty)
}

fn module(tags: &str, body: &str) -> String {
    format!("M DEFINITIONS {tags} ::= BEGIN {body} END")
}

#[test]
fn components_of_includes_root_components() {
    let source = module(
        "",
        "A ::= SEQUENCE { x INTEGER, ..., e BOOLEAN, ..., z NULL } \
         B ::= SEQUENCE { a NULL OPTIONAL, COMPONENTS OF A, b REAL }",
    );

    analyse(&source, |ctx| {
        assert!(errors(ctx).is_empty(), "{:?}", ctx.diagnostics());
        assert_eq!(names(ctx, "A"), ["x", "e", "z"]);
        assert_eq!(names(ctx, "B"), ["a", "x", "z", "b"]);

        let b = ty(ctx, "B");
        assert_eq!(ctx.field_count(b).unwrap(), 4);

        let original = ctx.field_named(ty(ctx, "A"), "x").unwrap().unwrap();
        let copy = ctx.field_at(b, 1).unwrap();
        assert_ne!(original, copy);
        assert_ne!(ctx.types().field(original).ty, ctx.types().field(copy).ty);
        assert_eq!(ctx.types().get(ctx.types().field(copy).ty).genname, "B_x");
        assert_eq!(ctx.types().get(ctx.types().field(original).ty).genname, "A_x");
    });
}

#[test]
fn components_of_kind_mismatch() {
    let source = module(
        "",
        "A ::= SET { x INTEGER } \
         B ::= SEQUENCE { y BOOLEAN, COMPONENTS OF A } \
         C ::= SET { COMPONENTS OF INTEGER }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0300", "0300"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "COMPONENTS OF in a SEQUENCE type shall refer to another SEQUENCE type instead of `SET'"
        );
        assert_eq!(names(ctx, "B"), ["y"]);
        assert!(names(ctx, "C").is_empty());
    });
}

#[test]
fn components_of_cycle() {
    let source = module(
        "",
        "A ::= SEQUENCE { a INTEGER, COMPONENTS OF B } \
         B ::= SEQUENCE { COMPONENTS OF A }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0301"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Circular reference in COMPONENTS OF: `A' -> `B' -> `A'"
        );
        assert_eq!(names(ctx, "A"), ["a"]);
        assert!(names(ctx, "B").is_empty());
    });
}

#[test]
fn components_of_within_own_component() {
    let source = module(
        "",
        "A ::= SEQUENCE { n INTEGER, x SEQUENCE { COMPONENTS OF A } OPTIONAL }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0301"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Circular reference in COMPONENTS OF: `A' -> `A_x' -> `A'"
        );
        assert_eq!(names(ctx, "A"), ["n", "x"]);
    });
}

#[test]
fn components_of_through_nested_copy() {
    let source = module(
        "",
        "A ::= SEQUENCE { n INTEGER, x SEQUENCE { COMPONENTS OF B } OPTIONAL } \
         B ::= SEQUENCE { COMPONENTS OF A }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0301", "0301"]);
        assert_eq!(names(ctx, "A"), ["n", "x"]);
        assert_eq!(names(ctx, "B"), ["n", "x"]);
    });
}

#[test]
fn duplicate_identifiers() {
    let source = module(
        "",
        "A ::= SEQUENCE { a INTEGER } \
         B ::= SEQUENCE { a BOOLEAN, COMPONENTS OF A } \
         C ::= CHOICE { c INTEGER, c BOOLEAN }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0200", "0200"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Duplicate component identifier in SEQUENCE: `a'"
        );
        assert_eq!(ctx.diagnostics()[0].labels.len(), 2);
        assert_eq!(
            ctx.diagnostics()[1].name,
            "Duplicate alternative identifier in CHOICE: `c'"
        );

        // both fields are kept, the first one is found by name
        let b = ty(ctx, "B");
        assert_eq!(ctx.field_count(b).unwrap(), 2);
        let first = ctx.field_named(b, "a").unwrap();
        assert_eq!(first, Some(ctx.field_at(b, 0).unwrap()));
    });
}

#[test]
fn unreachable_identifier_is_a_warning() {
    let source = module("", "A ::= SEQUENCE { a$b INTEGER }");

    analyse(&source, |ctx| {
        assert!(!ctx.has_errors());
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].error_code, "0201");
        assert_eq!(
            ctx.diagnostics()[0].name,
            "The identifier `a$b' is not reachable from TTCN-3"
        );
    });
}

#[test]
fn automatic_tags_follow_declaration_order() {
    let source = module(
        "AUTOMATIC TAGS",
        "S ::= SEQUENCE { a INTEGER, b BOOLEAN, ..., c NULL, ..., d REAL } \
         C ::= CHOICE { x INTEGER, y INTEGER, ..., z BOOLEAN }",
    );

    analyse(&source, |ctx| {
        assert!(errors(ctx).is_empty(), "{:?}", ctx.diagnostics());

        for (i, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
            let tag = field_tag(ctx, "S", name);
            assert_eq!(tag, Tag::new(TagClass::Context, i as u32), "component {name}");
            assert!(tag.automatic);
            assert_eq!(tag.plicit, TagPlicit::Implicit);
        }

        for (i, name) in ["x", "y", "z"].into_iter().enumerate() {
            assert_eq!(field_tag(ctx, "C", name), Tag::automatic(i as u32));
        }
    });
}

#[test]
fn tagged_root_disables_automatic_tags() {
    let source = module(
        "AUTOMATIC TAGS",
        "S ::= SEQUENCE { a [5] INTEGER, b BOOLEAN }",
    );

    analyse(&source, |ctx| {
        assert!(errors(ctx).is_empty(), "{:?}", ctx.diagnostics());
        assert_eq!(field_tag(ctx, "S", "a"), Tag::new(TagClass::Context, 5));

        let b = field_tag(ctx, "S", "b");
        assert_eq!(b, Tag::universal(1));
        assert!(!b.automatic);
    });
}

#[test]
fn tagged_extension_addition() {
    let source = module(
        "AUTOMATIC TAGS",
        "S ::= SEQUENCE { a INTEGER, ..., b [3] BOOLEAN }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0404"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Extension addition `b' cannot have tags because the extension root has no tags"
        );
        assert_eq!(field_tag(ctx, "S", "a"), Tag::universal(2));
    });
}

#[test]
fn included_components_are_tagged_again() {
    let source = module(
        "AUTOMATIC TAGS",
        "A ::= SEQUENCE { x INTEGER, y BOOLEAN } \
         B ::= SEQUENCE { z NULL, COMPONENTS OF A }",
    );

    analyse(&source, |ctx| {
        assert!(errors(ctx).is_empty(), "{:?}", ctx.diagnostics());
        assert_eq!(field_tag(ctx, "A", "x"), Tag::automatic(0));
        assert_eq!(field_tag(ctx, "B", "z"), Tag::automatic(0));
        assert_eq!(field_tag(ctx, "B", "x"), Tag::automatic(1));
        assert_eq!(field_tag(ctx, "B", "y"), Tag::automatic(2));

        // a single automatic tag, the one from A was removed
        let x = ctx.field_named(ty(ctx, "B"), "x").unwrap().unwrap();
        assert_eq!(ctx.types().get(ctx.types().field(x).ty).tags.len(), 1);
    });
}

#[test]
fn choice_alternatives_need_distinct_tags() {
    let source = module(
        "",
        "C ::= CHOICE { x INTEGER, y INTEGER } \
         Inner ::= CHOICE { i INTEGER, b BOOLEAN } \
         Outer ::= CHOICE { n Inner, z INTEGER }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0400", "0400"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Alternative `y' in CHOICE has non-distinct tag"
        );
        assert_eq!(
            ctx.diagnostics()[1].name,
            "Alternative `z' in CHOICE has non-distinct tag"
        );
    });
}

#[test]
fn extension_additions_are_ordered() {
    let source = module(
        "",
        "C ::= CHOICE { a [0] INTEGER, ..., b [2] INTEGER, c [1] INTEGER } \
         S ::= SET { a INTEGER, ..., b BOOLEAN, c [1] NULL, d [1] REAL }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0401", "0400", "0401"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Alternative `c' must have canonically greater tag than all previously added \
             extension alternatives"
        );
        assert_eq!(
            ctx.diagnostics()[1].name,
            "Component `d' in SET has non-distinct tag"
        );
    });
}

#[test]
fn sequence_tag_windows() {
    let source = module(
        "",
        "A ::= SEQUENCE { a INTEGER OPTIONAL, b INTEGER } \
         B ::= SEQUENCE { a INTEGER, b INTEGER } \
         C ::= SEQUENCE { a INTEGER OPTIONAL, b BOOLEAN, c INTEGER }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0402"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Tag of component `b' is not allowed in this context of SEQUENCE type"
        );
    });
}

#[test]
fn sequence_tag_windows_with_extension() {
    let source = module(
        "",
        "S ::= SEQUENCE { a INTEGER OPTIONAL, ..., e BOOLEAN, ..., c INTEGER } \
         T ::= SEQUENCE { \
             a INTEGER, ..., \
             b BOOLEAN OPTIONAL, c BOOLEAN, d INTEGER OPTIONAL, e BOOLEAN OPTIONAL, \
             ..., z INTEGER \
         }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0402", "0402", "0402"]);

        let messages: Vec<_> = ctx.diagnostics().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Tag of component `c' is not allowed in this context of SEQUENCE type",
                "Tag of component `c' is not allowed in this context of SEQUENCE type",
                "Tag of component `d' is not allowed in this context of SEQUENCE type",
            ]
        );
    });
}

#[test]
fn untagged_choice_extension_additions() {
    let source = module(
        "",
        "C ::= CHOICE { a [0] INTEGER, ..., b [5] BOOLEAN, c D, e E } \
         D ::= CHOICE { p [3] NULL, q [7] NULL } \
         E ::= CHOICE { r [7] NULL, s [9] NULL }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0401", "0400"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Alternative `c' must have canonically greater tag(s) than all previously added \
             extension alternatives"
        );
        assert_eq!(
            ctx.diagnostics()[1].name,
            "Alternative `e' in CHOICE has non-distinct tag(s)"
        );
    });
}

#[test]
fn extensible_choice_as_extension_addition() {
    let source = module(
        "",
        "C ::= CHOICE { a [0] INTEGER, ..., b [1] BOOLEAN, c D } \
         D ::= CHOICE { p [5] NULL, ... } \
         S ::= SET { a [0] INTEGER, ..., c D }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0403", "0403"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Illegal use of extensibility notation (possible tag conflict)"
        );
    });
}

#[test]
fn set_components_need_distinct_tags() {
    let source = module(
        "",
        "S ::= SET { a INTEGER, b INTEGER } \
         X ::= CHOICE { x INTEGER, ... } \
         Y ::= CHOICE { y BOOLEAN, ... } \
         T ::= SET { a X, b Y }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0400", "0403"]);
        assert_eq!(
            ctx.diagnostics()[0].name,
            "Component `b' in SET has non-distinct tag"
        );

        let labels: Vec<_> = ctx.diagnostics()[1]
            .labels
            .iter()
            .map(|l| l.message.as_str())
            .collect();
        assert!(labels.contains(&"While checking tags of `b'"), "{labels:?}");
    });
}

#[test]
fn implicit_tag_on_choice() {
    let source = module(
        "IMPLICIT TAGS",
        "C ::= CHOICE { a INTEGER, b BOOLEAN } \
         T ::= [1] IMPLICIT C \
         U ::= [2] C \
         V ::= [3] IMPLICIT ANY",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0103", "0103"]);
        assert_eq!(ctx.diagnostics()[0].name, "Type cannot have IMPLICIT tag");

        for name in ["T", "U", "V"] {
            let tag = ctx.types().tag(ty(ctx, name));
            assert_eq!(tag.plicit, TagPlicit::Explicit, "type {name}");
        }
    });
}

#[test]
fn tag_numbers_from_values() {
    let source = module(
        "",
        "T ::= [num] INTEGER \
         U ::= [flag] INTEGER \
         V ::= [missing] INTEGER \
         num INTEGER ::= seven \
         seven INTEGER ::= 7 \
         flag BOOLEAN ::= TRUE",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0102", "0100"]);
        assert_eq!(ctx.types().tag(ty(ctx, "T")), Tag::new(TagClass::Context, 7));
        assert_eq!(ctx.types().tag(ty(ctx, "U")).class, TagClass::Error);
        assert_eq!(
            ctx.diagnostics()[1].name,
            "There is no assignment with name `missing' in module `M'"
        );
    });
}

#[test]
fn names_are_resolved_within_the_module() {
    let source = module(
        "",
        "S ::= SEQUENCE { a Missing, b INTEGER } \
         A ::= B \
         B ::= A \
         A ::= NULL",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0105", "0100", "0101"]);
        assert_eq!(
            ctx.diagnostics()[2].name,
            "Circular type reference: `A' -> `B' -> `A'"
        );
        assert!(ctx.types().is_error(ty(ctx, "A")));
    });
}

#[test]
fn duplicate_modules() {
    let first = module("", "A ::= INTEGER");
    let second = module("", "B ::= BOOLEAN");

    analyse_with(Features::default(), &[&first, &second], |ctx| {
        assert_eq!(errors(ctx), ["0104"]);
        assert_eq!(ctx.modules().len(), 2);
        assert_eq!(ctx.diagnostics()[0].labels.len(), 2);
    });
}

#[test]
fn default_values() {
    let source = module(
        "",
        "S ::= SEQUENCE { a INTEGER DEFAULT five, b BOOLEAN DEFAULT 1, c NULL } \
         five INTEGER ::= 5 \
         v OCTET STRING ::= 'CAFE'H",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0500"]);

        let diagnostic = &ctx.diagnostics()[0];
        assert_eq!(diagnostic.name, "BOOLEAN value was expected instead of 1");
        assert!(diagnostic
            .labels
            .iter()
            .any(|l| l.message == "In default value of SEQUENCE component `b'"));

        let constants: Vec<_> = ctx.default_constants().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(constants, ["const_S_a_defval_", "const_S_b_defval_"]);
    });

    let features = Features {
        semantic_check_only: true,
        ..Default::default()
    };
    analyse_with(features, &[&source], |ctx| {
        assert!(ctx.default_constants().is_empty());
    });
}

#[test]
fn value_assignments_are_checked() {
    let source = module(
        "",
        "a INTEGER ::= TRUE \
         b INTEGER ::= c \
         c INTEGER ::= b \
         d IA5String ::= \"text\"",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0500", "0101", "0101"]);
        assert!(ctx.diagnostics()[0]
            .labels
            .iter()
            .any(|l| l.message == "In value assignment `a'"));
    });
}

#[test]
fn exception_specifications() {
    let source = module(
        "",
        "S ::= SEQUENCE { a INTEGER, ... ! BOOLEAN : 5 } \
         C ::= CHOICE { b INTEGER, ... ! 7 }",
    );

    analyse(&source, |ctx| {
        assert_eq!(errors(ctx), ["0500"]);

        let labels: Vec<_> = ctx.diagnostics()[0]
            .labels
            .iter()
            .map(|l| l.message.as_str())
            .collect();
        assert!(labels.contains(&"In exception specification"), "{labels:?}");
    });
}

#[test]
fn extensibility_implied() {
    let source = "M DEFINITIONS EXTENSIBILITY IMPLIED ::= BEGIN \
                  S ::= SEQUENCE { a INTEGER } \
                  C ::= CHOICE { x INTEGER, ... } END";

    analyse(source, |ctx| {
        assert!(errors(ctx).is_empty(), "{:?}", ctx.diagnostics());

        for name in ["S", "C"] {
            let components = ctx.types().components(ty(ctx, name)).unwrap();
            assert!(components.has_ellipsis(), "type {name}");
            assert_eq!(components.extension_fields().count(), 0);
        }
    });
}

#[test]
fn repeated_checks_change_nothing() {
    let source = module(
        "AUTOMATIC TAGS",
        "A ::= SEQUENCE { x INTEGER } \
         B ::= SEQUENCE { a INTEGER, a BOOLEAN, COMPONENTS OF A, ..., e NULL }",
    );

    analyse(&source, |ctx| {
        let b = ty(ctx, "B");
        let diagnostics = ctx.diagnostics().len();
        let before = names(ctx, "B");

        ctx.resolve_components_of(b).unwrap();
        ctx.assign_auto_tags(b).unwrap();
        ctx.flatten_and_check(b).unwrap();
        ctx.check_tags(b).unwrap();
        ctx.check_type(b).unwrap();

        assert_eq!(ctx.diagnostics().len(), diagnostics);
        assert_eq!(names(ctx, "B"), before);

        let e = ctx.field_named(b, "e").unwrap().unwrap();
        assert_eq!(ctx.types().get(ctx.types().field(e).ty).tags, [Tag::automatic(3)]);
    });
}

#[test]
fn dump_lists_components_and_tags() {
    let source = module(
        "AUTOMATIC TAGS",
        "S ::= SEQUENCE { a INTEGER, b BOOLEAN OPTIONAL, ..., c NULL } \
         I ::= INTEGER",
    );

    analyse(&source, |ctx| {
        assert_eq!(
            ctx.dump_components(),
            "M.S ::= SEQUENCE\n\
             \x20 a [0] IMPLICIT INTEGER\n\
             \x20 b [1] IMPLICIT BOOLEAN OPTIONAL\n\
             \x20 ...\n\
             \x20 c [2] IMPLICIT NULL\n"
        );
    });
}

#[test]
fn parse_errors_become_diagnostics() {
    let mut compiler = AsnCompiler::new();
    let source = module("", "C ::= CHOICE { }");

    let err = compiler.add_file("bad.asn".to_string(), source).unwrap_err();
    let diagnostic = Diagnostic::from(&err);

    assert_eq!(diagnostic.error_code, "0001");
    assert_eq!(diagnostic.level, Level::Error);
    assert!(diagnostic.primary_location().is_some());
}
