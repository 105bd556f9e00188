//! Depth-first traversal with style and transform inheritance.

use crate::assemble::{Assembler, ParseOutput, Raster};
use crate::geom::{Transform, apply, apply_linear, compose, extract_scale};
use crate::notify::{Notifier, Severity};
use crate::path::{Subpath, add_path, add_path_data};
use crate::shapes::{ShapeKind, image_placement, shape_path};
use crate::style::{StyleProperty, StyleState};
use crate::transform_list::parse_transform_list;
use crate::tree::Element;
use crate::units::ToleranceProfile;

/// Nesting deeper than this is reported and the subtree skipped.
pub const MAX_TREE_DEPTH: usize = 512;

/// What a tag contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    /// Containers: children inherit, no own geometry (`svg`, `g`, anything unknown).
    Container,
    Path,
    Shape(ShapeKind),
    Image,
    /// Non-rendered content; the subtree is skipped.
    Pruned,
}

impl Tag {
    fn from_name(name: &str) -> Self {
        match name {
            "path" => Tag::Path,
            "rect" => Tag::Shape(ShapeKind::Rect),
            "circle" => Tag::Shape(ShapeKind::Circle),
            "ellipse" => Tag::Shape(ShapeKind::Ellipse),
            "line" => Tag::Shape(ShapeKind::Line),
            "polyline" => Tag::Shape(ShapeKind::Polyline),
            "polygon" => Tag::Shape(ShapeKind::Polygon),
            "image" => Tag::Image,
            "defs" | "pattern" | "clipPath" | "mask" | "marker" | "symbol" | "metadata"
            | "style" | "script" | "title" | "desc" | "text" => Tag::Pruned,
            _ => Tag::Container,
        }
    }
}

/// Attributes with a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Id,
    Transform,
    Style,
    Presentation(StyleProperty),
}

impl Attribute {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Attribute::Id),
            "transform" => Some(Attribute::Transform),
            "style" => Some(Attribute::Style),
            _ => StyleProperty::from_name(name).map(Attribute::Presentation),
        }
    }
}

/// Per-element state. Starts as a copy of the parent's inherited context.
#[derive(Debug, Clone)]
struct TraversalNode<'a> {
    id: Option<&'a str>,
    style: StyleState,
    local: Transform,
    world: Transform,
    subpaths: Vec<Subpath>,
}

/// Inherited context handed to children; never mutated by them.
#[derive(Debug, Clone)]
struct Context {
    style: StyleState,
    world: Transform,
}

pub(crate) struct Walker<'n> {
    tolerances: ToleranceProfile,
    assembler: Assembler,
    notifier: &'n mut dyn Notifier,
}

impl<'n> Walker<'n> {
    pub(crate) fn new(tolerances: ToleranceProfile, notifier: &'n mut dyn Notifier) -> Self {
        Self {
            tolerances,
            assembler: Assembler::new(tolerances),
            notifier,
        }
    }

    /// Walks `root` and everything below it.
    pub(crate) fn walk(&mut self, root: &Element) {
        let context = Context {
            style: StyleState::default(),
            world: Transform::identity(),
        };
        self.visit(root, &context, 0);
    }

    pub(crate) fn finish(self, optimize: bool) -> ParseOutput {
        tracing::debug!(joins = self.assembler.join_count(), "traversal done");
        self.assembler.finish(optimize, self.notifier)
    }

    fn visit(&mut self, el: &Element, parent: &Context, depth: usize) {
        let tag = Tag::from_name(&el.tag);
        if tag == Tag::Pruned {
            tracing::trace!(tag = %el.tag, "skipping non-rendered subtree");
            return;
        }
        if depth >= MAX_TREE_DEPTH {
            self.notifier.notify(
                Severity::Error,
                &format!("elements nested deeper than {MAX_TREE_DEPTH} levels are skipped"),
            );
            return;
        }

        let mut node = TraversalNode {
            id: None,
            style: parent.style.clone(),
            local: Transform::identity(),
            world: parent.world,
            subpaths: Vec::new(),
        };
        self.apply_attributes(el, &mut node);
        node.world = compose(&parent.world, &node.local);

        if !node.style.is_displayed() {
            return;
        }
        if node.style.is_visible() {
            self.emit_geometry(el, tag, &mut node);
        }

        let context = Context {
            style: node.style,
            world: node.world,
        };
        for child in &el.children {
            self.visit(child, &context, depth + 1);
        }
    }

    fn apply_attributes<'a>(&mut self, el: &'a Element, node: &mut TraversalNode<'a>) {
        for (name, value) in &el.attributes {
            if value.is_empty() {
                continue;
            }
            match Attribute::from_name(name) {
                Some(Attribute::Id) => node.id = Some(value.as_str()),
                Some(Attribute::Transform) => {
                    let (local, errors) = parse_transform_list(value);
                    for error in errors {
                        self.notifier.notify(Severity::Warning, &error.to_string());
                    }
                    node.local = local;
                }
                Some(Attribute::Style) => node.style.apply_declarations(value, self.notifier),
                Some(Attribute::Presentation(property)) => {
                    node.style.apply(property, value, self.notifier)
                }
                None => {}
            }
        }
    }

    /// Tessellation tolerance in local units, so the world-space deviation stays within bounds.
    fn local_tolerance2(&self, world: &Transform) -> f64 {
        let scale = extract_scale(world);
        if scale > 0.0 {
            self.tolerances.tol2_px / (scale * scale)
        } else {
            self.tolerances.tol2_px
        }
    }

    fn emit_geometry(&mut self, el: &Element, tag: Tag, node: &mut TraversalNode<'_>) {
        let tolerance2 = self.local_tolerance2(&node.world);
        let dpi = self.tolerances.dpi;
        let result = match tag {
            Tag::Path => match el.attr("d") {
                Some(d) => add_path_data(d, tolerance2, &mut node.subpaths).map_err(|e| e.to_string()),
                None => Ok(()),
            },
            Tag::Shape(kind) => match shape_path(kind, el, dpi) {
                Ok(Some(tokens)) => add_path(&tokens, tolerance2, &mut node.subpaths).map_err(|e| e.to_string()),
                Ok(None) => Ok(()),
                Err(e) => Err(e.to_string()),
            },
            Tag::Image => {
                if let Some(image) = image_placement(el, dpi) {
                    let px_to_mm = self.tolerances.px_to_mm();
                    self.assembler.push_raster(Raster {
                        position: apply(&node.world, image.position) * px_to_mm,
                        size: apply_linear(&node.world, image.size) * px_to_mm,
                        reference: image.reference,
                    });
                }
                Ok(())
            }
            Tag::Container | Tag::Pruned => Ok(()),
        };
        if let Err(message) = result {
            let location = match node.id {
                Some(id) => format!("<{} id=\"{id}\">", el.tag),
                None => format!("<{}>", el.tag),
            };
            self.notifier.notify(Severity::Error, &format!("in {location}: {message}"));
        }
        self.fold(node);
    }

    /// Maps the node's local subpaths to world mm and hands them to the assembler.
    fn fold(&mut self, node: &mut TraversalNode<'_>) {
        if node.subpaths.is_empty() {
            return;
        }
        let key = node.style.stroke_key();
        let px_to_mm = self.tolerances.px_to_mm();
        for subpath in node.subpaths.drain(..) {
            let mapped = subpath
                .into_iter()
                .map(|p| apply(&node.world, p) * px_to_mm)
                .collect();
            self.assembler.fold_subpath(&key, mapped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;
    use crate::notify::Diagnostics;

    fn walk(root: &Element, dpi: f64) -> (ParseOutput, Diagnostics) {
        let mut notes = Diagnostics::new();
        let output = {
            let mut walker = Walker::new(ToleranceProfile::new(dpi, 0.1), &mut notes);
            walker.walk(root);
            walker.finish(false)
        };
        (output, notes)
    }

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Element {
        Element::new("line")
            .with_attr("x1", x1.to_string())
            .with_attr("y1", y1.to_string())
            .with_attr("x2", x2.to_string())
            .with_attr("y2", y2.to_string())
    }

    fn svg() -> Element {
        Element::new("svg")
    }

    #[test]
    fn geometry_is_scaled_to_millimeters() {
        let (out, _) = walk(&svg().with_child(line(0.0, 0.0, 25.4, 0.0)), 25.4);
        assert_eq!(out.boundaries["#000000"], vec![vec![point(0.0, 0.0), point(25.4, 0.0)]]);
    }

    #[test]
    fn transforms_accumulate_parent_first() {
        let root = svg().with_child(
            Element::new("g")
                .with_attr("transform", "translate(10 0)")
                .with_child(line(0.0, 0.0, 1.0, 0.0).with_attr("transform", "scale(2)")),
        );
        let (out, _) = walk(&root, 25.4);
        assert_eq!(out.boundaries["#000000"], vec![vec![point(10.0, 0.0), point(12.0, 0.0)]]);
    }

    #[test]
    fn stroke_inherits_and_children_can_override() {
        let root = svg().with_child(
            Element::new("g")
                .with_attr("stroke", "#ff0000")
                .with_child(line(0.0, 0.0, 1.0, 0.0))
                .with_child(line(5.0, 5.0, 6.0, 5.0).with_attr("style", "stroke:#0000ff")),
        );
        let (out, _) = walk(&root, 25.4);
        assert_eq!(out.boundaries.keys().collect::<Vec<_>>(), vec!["#0000ff", "#ff0000"]);
    }

    #[test]
    fn siblings_do_not_leak_state() {
        let root = svg()
            .with_child(
                Element::new("g")
                    .with_attr("stroke", "#ff0000")
                    .with_attr("transform", "translate(100 100)"),
            )
            .with_child(line(0.0, 0.0, 1.0, 0.0));
        let (out, _) = walk(&root, 25.4);
        assert_eq!(out.boundaries["#000000"], vec![vec![point(0.0, 0.0), point(1.0, 0.0)]]);
        assert!(!out.boundaries.contains_key("#ff0000"));
    }

    #[test]
    fn display_none_prunes_the_subtree() {
        let root = svg().with_child(
            Element::new("g")
                .with_attr("display", "none")
                .with_child(line(0.0, 0.0, 1.0, 0.0).with_attr("display", "inline")),
        );
        let (out, _) = walk(&root, 25.4);
        assert!(out.boundaries.is_empty());
    }

    #[test]
    fn hidden_elements_keep_visible_children() {
        let root = svg().with_child(
            Element::new("g")
                .with_attr("visibility", "hidden")
                .with_child(line(0.0, 0.0, 1.0, 0.0))
                .with_child(line(5.0, 5.0, 6.0, 5.0).with_attr("visibility", "visible")),
        );
        let (out, _) = walk(&root, 25.4);
        assert_eq!(out.boundaries["#000000"], vec![vec![point(5.0, 5.0), point(6.0, 5.0)]]);
    }

    #[test]
    fn defs_are_not_rendered() {
        let root = svg().with_child(Element::new("defs").with_child(line(0.0, 0.0, 1.0, 0.0)));
        let (out, _) = walk(&root, 25.4);
        assert!(out.boundaries.is_empty());
    }

    #[test]
    fn element_errors_are_reported_with_their_id() {
        let root = svg()
            .with_child(
                Element::new("polyline")
                    .with_attr("id", "bad")
                    .with_attr("points", "0,0 1,1 2"),
            )
            .with_child(Element::new("path").with_attr("d", "M 0 0 L 1 1 L 2"))
            .with_child(line(0.0, 0.0, 1.0, 0.0));
        let (out, notes) = walk(&root, 25.4);
        let errors: Vec<_> = notes.with_severity(Severity::Error).map(|d| d.message.clone()).collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("in <polyline id=\"bad\">:"), "{}", errors[0]);
        assert!(errors[1].starts_with("in <path>:"), "{}", errors[1]);
        // The path keeps what it drew before the error.
        assert_eq!(out.vertex_count(), 2 + 2);
    }

    #[test]
    fn bad_transforms_warn_and_keep_the_rest() {
        let root = svg().with_child(line(0.0, 0.0, 1.0, 0.0).with_attr("transform", "translate(3) wobble(1)"));
        let (out, notes) = walk(&root, 25.4);
        assert_eq!(notes.with_severity(Severity::Warning).count(), 1);
        assert_eq!(out.boundaries["#000000"], vec![vec![point(3.0, 0.0), point(4.0, 0.0)]]);
    }

    #[test]
    fn images_are_placed_in_millimeters() {
        let root = svg().with_child(
            Element::new("image")
                .with_attr("transform", "scale(2)")
                .with_attr("href", "photo.png")
                .with_attr("x", "10")
                .with_attr("y", "5")
                .with_attr("width", "20")
                .with_attr("height", "30"),
        );
        let (out, _) = walk(&root, 25.4);
        assert_eq!(
            out.rasters,
            vec![Raster {
                position: point(20.0, 10.0),
                size: crate::geom::vector(40.0, 60.0),
                reference: "photo.png".to_string(),
            }]
        );
    }

    #[test]
    fn deep_nesting_is_cut_off() {
        let mut el = line(0.0, 0.0, 1.0, 0.0);
        for _ in 0..MAX_TREE_DEPTH + 10 {
            el = Element::new("g").with_child(el);
        }
        let (out, notes) = walk(&el, 25.4);
        assert!(out.boundaries.is_empty());
        assert!(notes.has_errors());
    }

    #[test]
    fn scaled_groups_tessellate_finer() {
        let circle = Element::new("circle").with_attr("r", "1");
        let plain = walk(&svg().with_child(circle.clone()), 90.0).0.vertex_count();
        let zoomed = walk(
            &svg().with_child(Element::new("g").with_attr("transform", "scale(50)").with_child(circle)),
            90.0,
        )
        .0
        .vertex_count();
        assert!(zoomed > plain, "{zoomed} <= {plain}");
    }
}
