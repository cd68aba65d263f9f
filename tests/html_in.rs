//! HTML input conformance tests.

use wikivert::{ConvertOptions, HtmlConverter, InputConverter};

fn check(input: &str, expected_body: &str) {
    let tree = HtmlConverter.convert(input, &ConvertOptions::default());
    let expected = format!("<page><body>{expected_body}</body></page>");
    assert_eq!(tree.to_xml_string(), expected, "input: {input:?}");
}

#[test]
fn test_paragraphs() {
    check("<p>one</p><p>two</p>", "<p>one</p><p>two</p>");
}

#[test]
fn test_inline_mapping_table() {
    check("<p><em>Emphasis</em></p>", "<p><emphasis>Emphasis</emphasis></p>");
    check(
        "<p><i>alternate voice</i></p>",
        "<p><emphasis html-tag=\"i\">alternate voice</emphasis></p>",
    );
    check("<p><strong>Strong</strong></p>", "<p><strong>Strong</strong></p>");
    check(
        "<p><b>bold</b></p>",
        "<p><strong html-tag=\"b\">bold</strong></p>",
    );
    check("<p><tt>literal</tt></p>", "<p><literal>literal</literal></p>");
    check("<p><strike>old</strike></p>", "<p><s>old</s></p>");
    check("<p><q>quoted</q></p>", "<p><quote>quoted</quote></p>");
    check(
        "<p><big>larger</big></p>",
        "<p><span html:class=\"moin-big\">larger</span></p>",
    );
    check(
        "<p><acronym>AC/DC</acronym></p>",
        "<p><span html-tag=\"abbr\">AC/DC</span></p>",
    );
}

#[test]
fn test_headings_and_structure() {
    check("<h1>Top</h1>", "<h outline-level=\"1\">Top</h>");
    check("<h6>Deep</h6>", "<h outline-level=\"6\">Deep</h>");
    check("<hr>", "<separator html:class=\"moin-hr3\" />");
    check("<pre>raw text</pre>", "<blockcode>raw text</blockcode>");
    check(
        "<blockquote><p>wisdom</p></blockquote>",
        "<blockquote><p>wisdom</p></blockquote>",
    );
    check(
        "<address>webmaster@example.org</address>",
        "<div html-tag=\"address\">webmaster@example.org</div>",
    );
}

#[test]
fn test_links() {
    check(
        "<p><a href=\"subitem\">link text</a></p>",
        "<p><a xlink:href=\"wiki.local:subitem\">link text</a></p>",
    );
    check(
        "<p><a href=\"https://moinmo.in/\">site</a></p>",
        "<p><a xlink:href=\"https://moinmo.in/\">site</a></p>",
    );
    // Script schemes never survive as live links.
    check(
        "<p><a href=\"javascript:alert(1)\">x</a></p>",
        "<p><a xlink:href=\"wiki.local:javascript:alert%281%29\">x</a></p>",
    );
}

#[test]
fn test_images() {
    check(
        "<p><img src=\"diagram.png\" alt=\"A diagram\"></p>",
        "<p><xinclude:include html:alt=\"A diagram\" \
         xinclude:href=\"wiki.local:diagram.png\" /></p>",
    );
    check(
        "<p><img src=\"http://example.org/x.png\" alt=\"remote\"></p>",
        "<p><object html:alt=\"remote\" \
         xlink:href=\"http://example.org/x.png\" /></p>",
    );
    // An empty alt is omitted, not emitted as an empty string.
    check(
        "<p><img src=\"x.png\" alt=\"\"></p>",
        "<p><xinclude:include xinclude:href=\"wiki.local:x.png\" /></p>",
    );
}

#[test]
fn test_lists() {
    check(
        "<ul><li>One</li><li>Two</li></ul>",
        "<list item-label-generate=\"unordered\">\
         <list-item><list-item-body>One</list-item-body></list-item>\
         <list-item><list-item-body>Two</list-item-body></list-item></list>",
    );
    check(
        "<ol><li>First</li></ol>",
        "<list item-label-generate=\"ordered\">\
         <list-item><list-item-body>First</list-item-body></list-item></list>",
    );
    check(
        "<dl><dt>term</dt><dd>definition</dd></dl>",
        "<list><list-item><list-item-label>term</list-item-label></list-item>\
         <list-item><list-item-body>definition</list-item-body></list-item></list>",
    );
}

#[test]
fn test_tables() {
    check(
        "<table><thead><tr><th>H</th></tr></thead>\
         <tbody><tr><td>c</td></tr></tbody></table>",
        "<table><table-header><table-row>\
         <table-cell-head>H</table-cell-head></table-row></table-header>\
         <table-body><table-row><table-cell>c</table-cell></table-row>\
         </table-body></table>",
    );
}

#[test]
fn test_drop_and_unwrap() {
    check("<p>keep<script>alert(1)</script></p>", "<p>keep</p>");
    check("<p><font color=\"red\">text</font></p>", "<p>text</p>");
    check("<p><custom>inner</custom></p>", "<p>inner</p>");
}

#[test]
fn test_standard_attrs_survive() {
    check(
        "<p><span class=\"note\" title=\"hint\" data-x=\"dropped\">x</span></p>",
        "<p><span html:class=\"note\" html:title=\"hint\">x</span></p>",
    );
}

#[test]
fn test_malformed_html_never_fails() {
    // Unterminated and misnested input still produces a tree.
    let tree = HtmlConverter.convert("<u>underline", &ConvertOptions::default());
    assert_eq!(
        tree.to_xml_string(),
        "<page><body><u>underline</u></body></page>"
    );
    let tree = HtmlConverter.convert("<b><i>x</b></i>", &ConvertOptions::default());
    assert!(tree.to_xml_string().contains('x'));
}
