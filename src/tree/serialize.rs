//! XML-style serialization of the document tree.
//!
//! Used by the test suite for structural comparison and by the DocBook
//! serializer for escaping. The format is the conventional one: structural
//! elements unprefixed, `xlink:`/`xinclude:`/`html:` prefixes for the other
//! namespaces, no xmlns declarations, empty elements self-closed with a
//! space before the slash.

use super::{NodeData, NodeId, Tree};

/// Escape text content for XML output.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for double-quoted XML output.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl Tree {
    /// Serialize the whole tree.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_xml(NodeId::ROOT, &mut out);
        out
    }

    /// Serialize a single subtree.
    pub fn subtree_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_xml(id, &mut out);
        out
    }

    fn write_xml(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { name, attrs } => {
                out.push('<');
                out.push_str(&name.to_string());
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(&key.to_string());
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str(" />");
                } else {
                    out.push('>');
                    for &child in children {
                        self.write_xml(child, out);
                    }
                    out.push_str("</");
                    out.push_str(&name.to_string());
                    out.push('>');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::{QName, Tree};

    #[test]
    fn test_serialize_prefixes_and_order() {
        let mut tree = Tree::new();
        let p = tree.append_element(tree.body(), QName::page("p"));
        let a = tree.append_element(p, QName::page("a"));
        tree.set_attr(a, QName::xlink_href(), "wiki.local:Some%20Page");
        tree.set_attr(a, QName::html("title"), "t");
        tree.set_attr(a, QName::page("title"), "t");
        tree.append_text(a, "label");
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p><a title=\"t\" html:title=\"t\" \
             xlink:href=\"wiki.local:Some%20Page\">label</a></p></body></page>"
        );
    }

    #[test]
    fn test_serialize_self_closing() {
        let mut tree = Tree::new();
        let sep = tree.append_element(tree.body(), QName::page("separator"));
        tree.set_attr(sep, QName::page("class"), "moin-hr3");
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><separator class=\"moin-hr3\" /></body></page>"
        );
    }

    #[test]
    fn test_serialize_escapes() {
        let mut tree = Tree::new();
        let p = tree.append_element(tree.body(), QName::page("p"));
        tree.append_text(p, "one < two & three");
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p>one &lt; two &amp; three</p></body></page>"
        );
    }
}
