//! HTML tag → document tree mapping table.
//!
//! Shared by the HTML input converter and by the Markdown converter's
//! embedded-HTML passthrough, so both agree on which tags are kept, which
//! are dropped with their content, and which are unwrapped.

use crate::tree::QName;

/// How a (lowercased) HTML tag maps into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagClass {
    /// Explicitly unsupported: the tag is dropped together with its content.
    Drop,
    /// Unrecognized but harmless: the tag is dropped, its content kept and
    /// still processed.
    Unwrap,
    /// `<br>`: a void `line-break` element.
    LineBreak,
    /// `<hr>`: a `separator` element.
    Separator,
    /// An inline element with a direct tree equivalent.
    Inline(ElementSpec),
    /// `<a>`: link, href classified into `xlink:href`.
    Link,
    /// `<img>`: transclusion or external object depending on the src.
    Image,
    /// `<h1>`..`<h6>`: `h` with an outline level.
    Heading(u8),
    /// A block element with a direct tree equivalent.
    Block(ElementSpec),
    /// `<ul>`/`<ol>`/`<dl>`.
    List(ListKind),
    /// `<li>`/`<dt>`/`<dd>`.
    ListItem(ItemKind),
    /// Table structure tags.
    Table(TablePart),
}

/// Target element plus the attributes the mapping fixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    /// Local name in the structural namespace.
    pub name: &'static str,
    /// Original tag recorded in the `html-tag` attribute, for tags whose
    /// identity matters when rendering back out (`<i>` vs `<em>`).
    pub html_tag: Option<&'static str>,
    /// Fixed `html:class` value (`<big>` becomes a `moin-big` span).
    pub class: Option<&'static str>,
}

impl ElementSpec {
    const fn plain(name: &'static str) -> Self {
        Self {
            name,
            html_tag: None,
            class: None,
        }
    }

    const fn tagged(name: &'static str, html_tag: &'static str) -> Self {
        Self {
            name,
            html_tag: Some(html_tag),
            class: None,
        }
    }

    pub fn element_name(&self) -> QName {
        QName::page(self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
    Definition,
}

impl ListKind {
    /// Value of the `item-label-generate` attribute, if any.
    pub fn label_generate(self) -> Option<&'static str> {
        match self {
            ListKind::Unordered => Some("unordered"),
            ListKind::Ordered => Some("ordered"),
            ListKind::Definition => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// `<li>`/`<dd>`: wrapped as `list-item`/`list-item-body`.
    Body,
    /// `<dt>`: wrapped as `list-item`/`list-item-label`.
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePart {
    Table,
    Header,
    Body,
    Row,
    Cell,
    HeadCell,
}

impl TablePart {
    pub fn element_name(self) -> QName {
        QName::page(match self {
            TablePart::Table => "table",
            TablePart::Header => "table-header",
            TablePart::Body => "table-body",
            TablePart::Row => "table-row",
            TablePart::Cell => "table-cell",
            TablePart::HeadCell => "table-cell-head",
        })
    }
}

/// Classify a lowercased HTML tag name.
pub fn classify(tag: &str) -> TagClass {
    match tag {
        // Explicitly unsupported tags lose their content too.
        "script" | "style" | "button" | "input" | "select" | "option" | "optgroup"
        | "textarea" | "iframe" | "frame" | "frameset" | "noframes" | "noscript" | "applet"
        | "embed" | "param" | "form" | "label" | "legend" | "fieldset" | "canvas" | "map"
        | "area" | "object" | "video" | "audio" | "source" | "track" | "head" | "meta"
        | "link" | "base" | "title" => TagClass::Drop,

        "br" => TagClass::LineBreak,
        "hr" => TagClass::Separator,
        "a" => TagClass::Link,
        "img" => TagClass::Image,

        "em" => TagClass::Inline(ElementSpec::plain("emphasis")),
        "i" => TagClass::Inline(ElementSpec::tagged("emphasis", "i")),
        "dfn" => TagClass::Inline(ElementSpec::tagged("emphasis", "dfn")),
        "strong" => TagClass::Inline(ElementSpec::plain("strong")),
        "b" => TagClass::Inline(ElementSpec::tagged("strong", "b")),
        "code" => TagClass::Inline(ElementSpec::plain("code")),
        "tt" => TagClass::Inline(ElementSpec::plain("literal")),
        "q" => TagClass::Inline(ElementSpec::plain("quote")),
        "u" => TagClass::Inline(ElementSpec::plain("u")),
        "ins" => TagClass::Inline(ElementSpec::plain("ins")),
        "del" => TagClass::Inline(ElementSpec::plain("del")),
        "s" => TagClass::Inline(ElementSpec::plain("s")),
        // Deprecated since HTML 4.1.
        "strike" => TagClass::Inline(ElementSpec::plain("s")),
        "sub" => TagClass::Inline(ElementSpec::plain("sub")),
        "sup" => TagClass::Inline(ElementSpec::plain("sup")),
        "kbd" => TagClass::Inline(ElementSpec::plain("kbd")),
        "samp" => TagClass::Inline(ElementSpec::plain("samp")),
        "span" => TagClass::Inline(ElementSpec::plain("span")),
        "big" => TagClass::Inline(ElementSpec {
            name: "span",
            html_tag: None,
            class: Some("moin-big"),
        }),
        "small" => TagClass::Inline(ElementSpec::tagged("span", "small")),
        "abbr" => TagClass::Inline(ElementSpec::tagged("span", "abbr")),
        // In HTML5, <acronym> is deprecated in favour of <abbr>.
        "acronym" => TagClass::Inline(ElementSpec::tagged("span", "abbr")),

        "h1" => TagClass::Heading(1),
        "h2" => TagClass::Heading(2),
        "h3" => TagClass::Heading(3),
        "h4" => TagClass::Heading(4),
        "h5" => TagClass::Heading(5),
        "h6" => TagClass::Heading(6),

        "p" => TagClass::Block(ElementSpec::plain("p")),
        "div" => TagClass::Block(ElementSpec::plain("div")),
        "blockquote" => TagClass::Block(ElementSpec::plain("blockquote")),
        "pre" => TagClass::Block(ElementSpec::plain("blockcode")),
        "address" | "article" | "aside" | "footer" | "header" | "main" | "nav" | "section"
        | "figure" | "figcaption" | "details" | "summary" => TagClass::Block(ElementSpec {
            name: "div",
            html_tag: generic_block_tag(tag),
            class: None,
        }),

        "ul" => TagClass::List(ListKind::Unordered),
        "ol" => TagClass::List(ListKind::Ordered),
        "dl" => TagClass::List(ListKind::Definition),
        "li" | "dd" => TagClass::ListItem(ItemKind::Body),
        "dt" => TagClass::ListItem(ItemKind::Label),

        "table" => TagClass::Table(TablePart::Table),
        "thead" => TagClass::Table(TablePart::Header),
        "tbody" | "tfoot" => TagClass::Table(TablePart::Body),
        "tr" => TagClass::Table(TablePart::Row),
        "td" => TagClass::Table(TablePart::Cell),
        "th" => TagClass::Table(TablePart::HeadCell),

        _ => TagClass::Unwrap,
    }
}

/// Static names for the `html-tag` attribute of generic block containers.
fn generic_block_tag(tag: &str) -> Option<&'static str> {
    Some(match tag {
        "address" => "address",
        "article" => "article",
        "aside" => "aside",
        "footer" => "footer",
        "header" => "header",
        "main" => "main",
        "nav" => "nav",
        "section" => "section",
        "figure" => "figure",
        "figcaption" => "figcaption",
        "details" => "details",
        "summary" => "summary",
        _ => return None,
    })
}

/// Whether a tag is block-level for the purposes of embedded-HTML handling
/// in line-oriented input formats.
pub fn is_block_tag(tag: &str) -> bool {
    matches!(
        classify(tag),
        TagClass::Separator
            | TagClass::Heading(_)
            | TagClass::Block(_)
            | TagClass::List(_)
            | TagClass::ListItem(_)
            | TagClass::Table(_)
    ) || matches!(tag, "script" | "style" | "form" | "iframe" | "fieldset")
}

/// The standard attributes every kept element retains, moved into the
/// `html:` namespace.
pub const STANDARD_ATTRS: &[&str] = &["title", "class", "style", "alt"];
