//! Markup parsing for content documents.
//!
//! Documents are parsed with html5ever's HTML tree builder into a [`Dom`].
//! The parser is lenient, with one XHTML concession: `<a id="p1"/>` and other
//! self-closed non-void elements are closed on the spot instead of swallowing
//! the markup after them.

mod arena;
mod tree_sink;

pub use arena::{Children, Descendants, Dom, ElementData, Node, NodeId, NodeKind};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::tree_builder::{TreeBuilder, TreeBuilderOpts, TreeSink};
use html5ever::{LocalName, TokenizerResult};

use tree_sink::DomSink;

/// Parse an HTML/XHTML document.
pub fn parse_html(html: &str) -> Dom {
    let builder = TreeBuilder::new(DomSink::default(), TreeBuilderOpts::default());
    let tokenizer = Tokenizer::new(SelfClosingTags(builder), TokenizerOpts::default());

    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    while !matches!(tokenizer.feed(&input), TokenizerResult::Done) {}
    tokenizer.end();

    tokenizer.sink.0.sink.finish()
}

/// Elements that never have content, so `/>` on them changes nothing.
fn is_void(name: &LocalName) -> bool {
    matches!(
        name.as_ref(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Token filter that follows every self-closed HTML start tag with its end
/// tag. The HTML tree builder ignores `/>` outside foreign content.
struct SelfClosingTags<S>(S);

impl<S: TokenSink> TokenSink for SelfClosingTags<S> {
    type Handle = S::Handle;

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<S::Handle> {
        let end = match &token {
            Token::TagToken(tag)
                if matches!(tag.kind, TagKind::StartTag)
                    && tag.self_closing
                    && !is_void(&tag.name)
                    && !matches!(tag.name.as_ref(), "svg" | "math")
                    && !self.0.adjusted_current_node_present_but_not_in_html_namespace() =>
            {
                let mut end = tag.clone();
                end.kind = TagKind::EndTag;
                end.self_closing = false;
                end.attrs.clear();
                Some(end)
            }
            _ => None,
        };
        let Some(end) = end else {
            return self.0.process_token(token, line_number);
        };

        // The start tag may ask for a raw text state (`<title/>`), which the
        // end tag immediately leaves again.
        let _ = self.0.process_token(token, line_number);
        self.0.process_token(Token::TagToken(end), line_number)
    }

    fn end(&self) {
        self.0.end();
    }

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        self.0.adjusted_current_node_present_but_not_in_html_namespace()
    }
}

/// Heading level of an element name (`h1`..`h6`).
pub fn heading_level(local_name: &LocalName) -> Option<u8> {
    match local_name.as_ref() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

impl Dom {
    /// The `body` element. The HTML tree builder always creates one.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.children(self.root()).find(|&id| self.is_tag(id, "html"))?;
        self.children(html).find(|&id| self.is_tag(id, "body"))
    }
}
