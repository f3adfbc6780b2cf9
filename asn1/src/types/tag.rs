use std::{cmp::Ordering, collections::BTreeSet, fmt::Display};

use super::Location;

/// Class of an ASN.1 tag, in canonical order.
///
/// `Error`, `None` and `All` never appear in source text.  `Error` tags are
/// given to erroneous types and never clash with anything, `All` is the tag
/// of `ANY` and clashes with everything, `None` sorts below every real tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagClass {
    Error,
    None,
    All,
    Universal,
    Application,
    Context,
    Private,
}

/// How a tag is applied to the underlying type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagPlicit {
    /// Not written, decided by the module's tag default
    Default,
    Explicit,
    Implicit,
}

/// A single ASN.1 tag.  Equality and ordering only consider the class and
/// number of the tag.
#[derive(Debug, Clone)]
pub struct Tag {
    pub plicit: TagPlicit,
    pub class: TagClass,
    pub number: u32,

    /// Was this tag added by automatic tagging
    pub automatic: bool,

    /// Where the tag was written, not present for implied tags
    pub loc: Option<Location>,
}

/// A set of tags, used to check tags of components are distinct.
#[derive(Debug, Clone, Default)]
pub struct TagCollection {
    tags: BTreeSet<Tag>,

    /// Contains the tag of an `ANY` type
    has_all: bool,

    /// An extension marker was found
    extensible: bool,
}

impl Tag {
    /// Create a tag with the default plicitness
    pub fn new(class: TagClass, number: u32) -> Self {
        Tag {
            plicit: TagPlicit::Default,
            class,
            number,
            automatic: false,
            loc: None,
        }
    }

    /// Tag of a builtin type
    pub fn universal(number: u32) -> Self {
        Tag::new(TagClass::Universal, number)
    }

    /// Context specific tag assigned by automatic tagging
    pub fn automatic(number: u32) -> Self {
        Tag {
            automatic: true,
            ..Tag::new(TagClass::Context, number)
        }
    }

    /// The tag of an `ANY` type
    pub fn all() -> Self {
        Tag::new(TagClass::All, 0)
    }

    /// The tag of an erroneous type
    pub fn error() -> Self {
        Tag::new(TagClass::Error, 0)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.number == other.number
    }
}

impl Eq for Tag {}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.class
            .cmp(&other.class)
            .then(self.number.cmp(&other.number))
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.class {
            TagClass::Error => return write!(f, "<error>"),
            TagClass::None => return write!(f, "<none>"),
            TagClass::All => return write!(f, "<all>"),
            TagClass::Universal => write!(f, "[UNIVERSAL {}]", self.number)?,
            TagClass::Application => write!(f, "[APPLICATION {}]", self.number)?,
            TagClass::Context => write!(f, "[{}]", self.number)?,
            TagClass::Private => write!(f, "[PRIVATE {}]", self.number)?,
        }

        match self.plicit {
            TagPlicit::Default => Ok(()),
            TagPlicit::Explicit => write!(f, " EXPLICIT"),
            TagPlicit::Implicit => write!(f, " IMPLICIT"),
        }
    }
}

impl TagCollection {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a tag to the collection, error tags are ignored
    pub fn add_tag(&mut self, tag: &Tag) {
        match tag.class {
            TagClass::Error => (),
            TagClass::All => self.has_all = true,
            _ => {
                self.tags.insert(tag.clone());
            }
        }
    }

    /// Does adding the tag clash with the tags already in the collection
    pub fn has_tag(&self, tag: &Tag) -> bool {
        match tag.class {
            TagClass::Error => false,
            _ if self.has_all => true,
            TagClass::All => !self.tags.is_empty(),
            _ => self.tags.contains(tag),
        }
    }

    /// Add all tags of another collection, including its extensibility.
    /// Returns false if both collections were extensible.
    #[must_use]
    pub fn add_tags(&mut self, other: &TagCollection) -> bool {
        self.tags.extend(other.tags.iter().cloned());
        self.has_all |= other.has_all;

        !other.extensible || self.set_extensible()
    }

    /// Does any tag of another collection clash with this collection
    pub fn has_tags(&self, other: &TagCollection) -> bool {
        if other.has_all {
            return self.has_all || !self.tags.is_empty();
        }

        other.tags.iter().any(|tag| self.has_tag(tag))
    }

    /// Mark the collection as containing an extension marker.  Returns false
    /// if the collection was already extensible, which means an extensible
    /// type was added in a place where its unknown tags could clash.
    #[must_use]
    pub fn set_extensible(&mut self) -> bool {
        !std::mem::replace(&mut self.extensible, true)
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Empty collections do not contain any tag, the `ALL` tag, or unknown
    /// tags from extensions
    pub fn is_empty(&self) -> bool {
        !self.has_all && !self.extensible && self.tags.is_empty()
    }

    /// Canonically smallest tag in the collection
    pub fn smallest_tag(&self) -> Option<&Tag> {
        self.tags.first()
    }

    /// Canonically greatest tag in the collection
    pub fn greatest_tag(&self) -> Option<&Tag> {
        self.tags.last()
    }

    /// Iterate the tags in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> + '_ {
        self.tags.iter()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.has_all = false;
        self.extensible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order() {
        let universal = Tag::universal(30);
        let application = Tag::new(TagClass::Application, 0);
        let context = Tag::new(TagClass::Context, 5);
        let private = Tag::new(TagClass::Private, 0);

        assert!(Tag::new(TagClass::None, 0) < universal);
        assert!(universal < application);
        assert!(application < context);
        assert!(context < private);
        assert!(Tag::new(TagClass::Context, 1) < Tag::new(TagClass::Context, 2));
    }

    #[test]
    fn equality_ignores_plicit() {
        let mut explicit = Tag::new(TagClass::Context, 3);
        explicit.plicit = TagPlicit::Explicit;
        assert_eq!(explicit, Tag::automatic(3));
    }

    #[test]
    fn collection_membership() {
        let mut coll = TagCollection::new();
        assert!(coll.is_empty());

        coll.add_tag(&Tag::new(TagClass::Context, 1));
        coll.add_tag(&Tag::new(TagClass::Context, 0));
        coll.add_tag(&Tag::error());

        assert!(coll.has_tag(&Tag::new(TagClass::Context, 1)));
        assert!(!coll.has_tag(&Tag::new(TagClass::Context, 2)));
        assert!(!coll.has_tag(&Tag::error()));
        assert!(coll.has_tag(&Tag::all()));
        assert_eq!(coll.smallest_tag(), Some(&Tag::new(TagClass::Context, 0)));
        assert_eq!(coll.greatest_tag(), Some(&Tag::new(TagClass::Context, 1)));
    }

    #[test]
    fn all_tag_clashes_with_everything() {
        let mut coll = TagCollection::new();
        assert!(!coll.has_tag(&Tag::all()));

        coll.add_tag(&Tag::all());
        assert!(!coll.is_empty());
        assert!(coll.has_tag(&Tag::universal(2)));
        assert_eq!(coll.smallest_tag(), None);
    }

    #[test]
    fn extensibility() {
        let mut coll = TagCollection::new();
        assert!(coll.set_extensible());
        assert!(!coll.is_empty());
        assert!(!coll.set_extensible());

        let mut other = TagCollection::new();
        assert!(other.add_tags(&coll));
        assert!(other.is_extensible());
        assert!(!other.add_tags(&coll));

        other.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn collection_clashes() {
        let mut a = TagCollection::new();
        a.add_tag(&Tag::universal(2));

        let mut b = TagCollection::new();
        b.add_tag(&Tag::universal(1));
        assert!(!a.has_tags(&b));

        b.add_tag(&Tag::universal(2));
        assert!(a.has_tags(&b));
    }
}
