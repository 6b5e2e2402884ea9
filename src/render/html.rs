//! HTML post-processing on an `html5ever` DOM
//!
//! Pages are parsed with the HTML5 tree builder and the selected nodes are serialized
//! back out. Tag names therefore match case-insensitively, and markup inside comments
//! or `<script>` text never counts as an element. Re-serializing also turns the XHTML
//! the diagram service answers with into plain HTML.

use html5ever::serialize::{SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{ns, parse_document, serialize, Attribute, LocalName, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::RenderError;

fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    match &handle.data {
        NodeData::Element { name, .. } => (&*name.local).eq_ignore_ascii_case(tag),
        _ => false,
    }
}

/// First element named `tag`, in document order
fn find(handle: &Handle, tag: &str) -> Option<Handle> {
    if is_element(handle, tag) {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find(child, tag))
}

fn find_or_missing(dom: &RcDom, tag: &str) -> Result<Handle, RenderError> {
    find(&dom.document, tag).ok_or_else(|| RenderError::MissingTag(tag.to_string()))
}

fn write(handle: &Handle, traversal_scope: TraversalScope) -> Result<String, RenderError> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };
    serialize(&mut output, &SerializableHandle::from(handle.clone()), opts)
        .map_err(|e| RenderError::Html(e.to_string()))?;
    String::from_utf8(output).map_err(|e| RenderError::Html(e.to_string()))
}

fn children_scope(handle: &Handle) -> TraversalScope {
    match &handle.data {
        NodeData::Element { name, .. } => TraversalScope::ChildrenOnly(Some(name.clone())),
        _ => TraversalScope::ChildrenOnly(None),
    }
}

/// The first `<tag>` element, tags included
pub fn extract_tag(html: &str, tag: &str) -> Result<String, RenderError> {
    let dom = parse(html);
    let element = find_or_missing(&dom, tag)?;
    write(&element, TraversalScope::IncludeNode)
}

/// Contents of the first `<tag>` element, tags excluded
pub fn inner_tag(html: &str, tag: &str) -> Result<String, RenderError> {
    let dom = parse(html);
    let element = find_or_missing(&dom, tag)?;
    write(&element, children_scope(&element))
}

/// Contents of the first `<tag>` element up to its first `<stop>` child
pub fn inner_tag_before(html: &str, tag: &str, stop: &str) -> Result<String, RenderError> {
    let dom = parse(html);
    let element = find_or_missing(&dom, tag)?;
    let mut out = String::new();
    for child in element.children.borrow().iter() {
        if is_element(child, stop) {
            break;
        }
        out.push_str(&write(child, TraversalScope::IncludeNode)?);
    }
    Ok(out)
}

/// Re-serialize an XHTML page as HTML
pub fn xhtml_to_html(xhtml: &str) -> Result<String, RenderError> {
    let dom = parse(xhtml);
    let mut out = String::new();
    for child in dom.document.children.borrow().iter() {
        // The HTML parser reads an XML declaration as a bogus comment
        if let NodeData::Comment { contents } = &child.data {
            if contents.starts_with("?xml") {
                continue;
            }
        }
        out.push_str(&write(child, TraversalScope::IncludeNode)?);
    }
    Ok(out)
}

/// `<pre class="ebnf">` element holding `text`
pub fn listing(text: &str) -> Result<String, RenderError> {
    let pre = Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: QualName::new(None, ns!(html), LocalName::from("pre")),
            attrs: RefCell::new(vec![Attribute {
                name: QualName::new(None, ns!(), LocalName::from("class")),
                value: "ebnf".into(),
            }]),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    });
    let contents = Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    });
    pre.children.borrow_mut().push(contents);
    write(&pre, TraversalScope::IncludeNode)
}
