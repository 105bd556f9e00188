//! Bridges `roxmltree` documents to the core element tree.

use svgreader_core::{Element, MAX_TREE_DEPTH};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Parses SVG markup into an [`Element`] tree rooted at the document element.
///
/// A `<!DOCTYPE svg ...>` declaration is accepted; editors routinely write one.
pub fn element_tree(svg: &str) -> Result<Element, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(svg, options)?;
    Ok(convert(doc.root_element(), 0))
}

fn is_svg_element(node: &roxmltree::Node<'_, '_>) -> bool {
    node.is_element() && matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

fn convert(node: roxmltree::Node<'_, '_>, depth: usize) -> Element {
    let mut el = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        match attr.namespace() {
            None => {
                el.attributes.insert(attr.name().to_string(), attr.value().to_string());
            }
            Some(XLINK_NS) => {
                el.attributes
                    .insert(format!("xlink:{}", attr.name()), attr.value().to_string());
            }
            Some(_) => {}
        }
    }
    // One level past the walker's limit is enough for it to notice and report the cut.
    if depth <= MAX_TREE_DEPTH {
        el.children = node
            .children()
            .filter(is_svg_element)
            .map(|child| convert(child, depth + 1))
            .collect();
    }
    el
}
