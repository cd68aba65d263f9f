//! Smiley substitution.
//!
//! Replaces whitespace-delimited smiley tokens in text nodes with icon
//! spans, leaving the original token as the span's text so text-only
//! renderings stay readable. Text inside `code` and `blockcode` is never
//! touched.

use crate::tree::{NodeId, QName, Tree};

/// Recognized tokens and their icon names.
const SMILEYS: &[(&str, &str)] = &[
    (":-)", "smile"),
    (":)", "smile"),
    (":-(", "frown"),
    (":(", "frown"),
    (";-)", "wink"),
    (";)", "wink"),
    (":-D", "grin"),
    (":D", "grin"),
    (":-P", "tongue"),
    (":-O", "surprise"),
    (":-|", "neutral"),
    ("B-)", "cool"),
    ("X-(", "angry"),
    ("<!>", "attention"),
    ("<:(", "sad"),
    ("|-)", "tired"),
];

/// Substitute smiley tokens in all eligible text nodes.
pub fn substitute_smileys(tree: &mut Tree) {
    let mut eligible: Vec<NodeId> = Vec::new();
    collect_text(tree, tree.root(), false, &mut eligible);

    for node in eligible {
        let Some(text) = tree.text(node) else {
            continue;
        };
        let Some(pieces) = split_tokens(text) else {
            continue;
        };
        let mut replacements: Vec<NodeId> = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Text(t) => replacements.push(tree.new_text(&t)),
                Piece::Smiley(token, name) => {
                    let span = tree.new_element(QName::page("span"));
                    tree.set_attr(
                        span,
                        QName::page("class"),
                        format!("moin-text-icon moin-{name}"),
                    );
                    tree.append_text(span, token);
                    replacements.push(span);
                }
            }
        }
        tree.replace(node, &replacements);
    }
}

fn collect_text(tree: &Tree, node: NodeId, in_code: bool, out: &mut Vec<NodeId>) {
    let in_code =
        in_code || tree.is_page_element(node, "code") || tree.is_page_element(node, "blockcode");
    for &child in tree.children(node) {
        if tree.text(child).is_some() {
            if !in_code {
                out.push(child);
            }
        } else {
            collect_text(tree, child, in_code, out);
        }
    }
}

enum Piece {
    Text(String),
    Smiley(&'static str, &'static str),
}

/// Split `text` around smiley tokens; `None` when nothing matches.
fn split_tokens(text: &str) -> Option<Vec<Piece>> {
    let mut pieces: Vec<Piece> = Vec::new();
    let mut plain = String::new();
    let mut found = false;
    let mut rest = text;
    while !rest.is_empty() {
        let word_start = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        plain.push_str(&rest[..word_start]);
        rest = &rest[word_start..];
        if rest.is_empty() {
            break;
        }
        let word_end = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        let word = &rest[..word_end];
        match SMILEYS.iter().find(|(token, _)| *token == word) {
            Some(&(token, name)) => {
                found = true;
                if !plain.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut plain)));
                }
                pieces.push(Piece::Smiley(token, name));
            }
            None => plain.push_str(word),
        }
        rest = &rest[word_end..];
    }
    if !found {
        return None;
    }
    if !plain.is_empty() {
        pieces.push(Piece::Text(plain));
    }
    Some(pieces)
}
