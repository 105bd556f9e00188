//! Inherited presentation state.
//!
//! Supports presentation attributes and the `style` attribute
//! (<https://www.w3.org/TR/SVG11/styling.html#UsingPresentationAttributes>); style sheets are not
//! cascaded.

use crate::notify::{Notifier, Severity};
use svgtypes::Paint;

/// Bucket key for geometry whose stroke is not a plain RGB color.
pub const FALLBACK_COLOR_KEY: &str = "#000000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    Rgb([u8; 3]),
    /// The `none` keyword.
    NoPaint,
    /// A value this reader cannot resolve (ICC colors, `context-stroke`, typos).
    Unresolved(String),
}

impl Color {
    pub fn hex(&self) -> Option<String> {
        match self {
            Color::Rgb([r, g, b]) => Some(format!("#{r:02x}{g:02x}{b:02x}")),
            Color::NoPaint | Color::Unresolved(_) => None,
        }
    }
}

/// Presentation properties this reader tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleProperty {
    Opacity,
    Display,
    Visibility,
    Fill,
    Stroke,
    Color,
    FillOpacity,
    StrokeOpacity,
}

impl StyleProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "opacity" => Self::Opacity,
            "display" => Self::Display,
            "visibility" => Self::Visibility,
            "fill" => Self::Fill,
            "stroke" => Self::Stroke,
            "color" => Self::Color,
            "fill-opacity" => Self::FillOpacity,
            "stroke-opacity" => Self::StrokeOpacity,
            _ => return None,
        })
    }
}

/// Style state of one traversal node. Every field starts as the parent's value.
///
/// `None` colors are "absent": the value was an unsupported reference or a SMIL keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleState {
    pub opacity: f64,
    pub display: String,
    pub visibility: String,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub color: Option<Color>,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            display: "inline".to_string(),
            visibility: "visible".to_string(),
            fill: Some(Color::Rgb([0, 0, 0])),
            stroke: Some(Color::Rgb([0, 0, 0])),
            color: Some(Color::Rgb([0, 0, 0])),
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

enum ColorValue {
    Inherit,
    Set(Option<Color>),
}

impl StyleState {
    /// Output bucket for this node's geometry. Only the stroke decides; fill is tracked but
    /// never groups cut paths.
    pub fn stroke_key(&self) -> String {
        self.stroke
            .as_ref()
            .and_then(Color::hex)
            .unwrap_or_else(|| FALLBACK_COLOR_KEY.to_string())
    }

    pub fn is_displayed(&self) -> bool {
        self.display != "none"
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.visibility.as_str(), "hidden" | "collapse")
    }

    pub fn apply(&mut self, property: StyleProperty, value: &str, notifier: &mut dyn Notifier) {
        let value = value.trim();
        match property {
            StyleProperty::Opacity => set_unit_interval(&mut self.opacity, value),
            StyleProperty::FillOpacity => set_unit_interval(&mut self.fill_opacity, value),
            StyleProperty::StrokeOpacity => set_unit_interval(&mut self.stroke_opacity, value),
            StyleProperty::Display => {
                if value != "inherit" {
                    self.display = value.to_string();
                }
            }
            StyleProperty::Visibility => {
                if value != "inherit" {
                    self.visibility = value.to_string();
                }
            }
            StyleProperty::Fill => {
                if let ColorValue::Set(c) = parse_color(value, &self.color, notifier) {
                    self.fill = c;
                }
            }
            StyleProperty::Stroke => {
                if let ColorValue::Set(c) = parse_color(value, &self.color, notifier) {
                    self.stroke = c;
                }
            }
            StyleProperty::Color => {
                if let ColorValue::Set(c) = parse_color(value, &self.color, notifier) {
                    self.color = c;
                }
            }
        }
    }

    /// Applies a `style="k: v; ..."` attribute. Unknown properties are ignored.
    pub fn apply_declarations(&mut self, style: &str, notifier: &mut dyn Notifier) {
        for declaration in style.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(property) = StyleProperty::from_name(name.trim()) {
                self.apply(property, value, notifier);
            }
        }
    }
}

fn set_unit_interval(slot: &mut f64, value: &str) {
    if let Ok(v) = value.parse::<f64>() {
        if !v.is_nan() {
            *slot = v.clamp(0.0, 1.0);
        }
    }
}

fn parse_color(value: &str, current: &Option<Color>, notifier: &mut dyn Notifier) -> ColorValue {
    match value {
        "inherit" => return ColorValue::Inherit,
        // SMIL animation keywords.
        "freeze" | "remove" => return ColorValue::Set(None),
        _ => {}
    }
    match Paint::from_str(value) {
        Ok(Paint::None) => ColorValue::Set(Some(Color::NoPaint)),
        Ok(Paint::Inherit) => ColorValue::Inherit,
        Ok(Paint::CurrentColor) => ColorValue::Set(current.clone()),
        Ok(Paint::Color(c)) => ColorValue::Set(Some(Color::Rgb([c.red, c.green, c.blue]))),
        Ok(Paint::FuncIRI(..)) => {
            notifier.notify(
                Severity::Error,
                &format!("paint server references are not supported: {value}"),
            );
            ColorValue::Set(None)
        }
        _ => ColorValue::Set(Some(Color::Unresolved(value.to_string()))),
    }
}
