//! Minimal SVG 1.1 writer.
//!
//! Output is a pure function of the document. Attributes keep insertion order
//! and numbers use Rust's shortest round-trip formatting, so re-rendering the
//! same document yields the same bytes.

use std::borrow::Cow;
use std::fmt::{self, Display};
use std::io::{self, Write};

use geo::Rect;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// `viewBox` of the root element, in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// From projected bounds, scaled and with the y axis pointing down.
    pub fn from_bounds(bounds: Rect<f64>, scale: f64) -> Self {
        Self {
            min_x: bounds.min().x * scale,
            min_y: -bounds.max().y * scale,
            width: bounds.width() * scale,
            height: bounds.height() * scale,
        }
    }
}

impl Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            Num(self.min_x),
            Num(self.min_y),
            Num(self.width),
            Num(self.height)
        )
    }
}

/// Formats a float without a negative zero.
#[derive(Debug, Clone, Copy)]
pub struct Num(pub f64);

impl Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            f.write_str("0")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Element id from a label: spaces become `_`, parentheses are dropped.
pub fn sanitize_id(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Element id from a feature name: spaces become `_`, nothing is dropped.
pub fn feature_id(name: &str) -> String {
    name.replace(' ', "_")
}

fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(&'static str, String)>);

impl Attributes {
    /// Set `name`, replacing an earlier value in place.
    pub fn set(&mut self, name: &'static str, value: impl Display) {
        let value = value.to_string();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (name, value) in &self.0 {
            write!(w, " {}=\"{}\"", name, escape(value))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Polygon,
    Polyline,
}

/// `<polygon>` or `<polyline>` with its vertex list.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    points: Vec<(f64, f64)>,
    attrs: Attributes,
}

impl Shape {
    pub fn polygon(points: Vec<(f64, f64)>) -> Self {
        Self {
            kind: ShapeKind::Polygon,
            points,
            attrs: Attributes::default(),
        }
    }

    pub fn polyline(points: Vec<(f64, f64)>) -> Self {
        Self {
            kind: ShapeKind::Polyline,
            points,
            attrs: Attributes::default(),
        }
    }

    pub fn set(mut self, name: &'static str, value: impl Display) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let tag = match self.kind {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Polyline => "polyline",
        };
        write!(w, "<{tag}")?;
        self.attrs.write_to(w)?;
        w.write_all(b" points=\"")?;
        for (i, &(x, y)) in self.points.iter().enumerate() {
            if i > 0 {
                w.write_all(b" ")?;
            }
            write!(w, "{},{}", Num(x), Num(y))?;
        }
        w.write_all(b"\"/>\n")
    }
}

/// `<image>` referencing an external or data URI.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    href: String,
    attrs: Attributes,
}

impl Image {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            attrs: Attributes::default(),
        }
    }

    pub fn set(mut self, name: &'static str, value: impl Display) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "<image xlink:href=\"{}\"", escape(&self.href))?;
        self.attrs.write_to(w)?;
        w.write_all(b"/>\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Group(Group),
    Shape(Shape),
    Image(Image),
}

impl Element {
    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Element::Group(g) => g.write_to(w),
            Element::Shape(s) => s.write_to(w),
            Element::Image(i) => i.write_to(w),
        }
    }
}

impl From<Group> for Element {
    fn from(g: Group) -> Self {
        Element::Group(g)
    }
}

impl From<Shape> for Element {
    fn from(s: Shape) -> Self {
        Element::Shape(s)
    }
}

impl From<Image> for Element {
    fn from(i: Image) -> Self {
        Element::Image(i)
    }
}

/// `<g>` container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attrs: Attributes,
    children: Vec<Element>,
}

impl Group {
    /// Group whose `id` is `sanitize_id(name)`.
    pub fn with_id(name: &str) -> Self {
        let mut g = Self::default();
        g.attrs.set("id", sanitize_id(name));
        g
    }

    /// Group whose `id` is `feature_id(name)`.
    pub fn for_feature(name: &str) -> Self {
        let mut g = Self::default();
        g.attrs.set("id", feature_id(name));
        g
    }

    pub fn set(mut self, name: &'static str, value: impl Display) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn add(&mut self, element: impl Into<Element>) {
        self.children.push(element.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"<g")?;
        self.attrs.write_to(w)?;
        if self.children.is_empty() {
            return w.write_all(b"/>\n");
        }
        w.write_all(b">\n")?;
        for child in &self.children {
            child.write_to(w)?;
        }
        w.write_all(b"</g>\n")
    }
}

/// Root `<svg>` element and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    view_box: ViewBox,
    attrs: Attributes,
    children: Vec<Element>,
}

impl SvgDocument {
    pub fn new(view_box: ViewBox) -> Self {
        let mut attrs = Attributes::default();
        attrs.set("height", "100%");
        attrs.set("width", "100%");
        Self {
            view_box,
            attrs,
            children: Vec::new(),
        }
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn set(&mut self, name: &'static str, value: impl Display) {
        self.attrs.set(name, value);
    }

    pub fn add(&mut self, element: impl Into<Element>) {
        self.children.push(element.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n")?;
        write!(
            w,
            "<svg xmlns=\"{SVG_NS}\" xmlns:xlink=\"{XLINK_NS}\" version=\"1.1\" baseProfile=\"full\" viewBox=\"{}\"",
            self.view_box
        )?;
        self.attrs.write_to(w)?;
        w.write_all(b">\n")?;
        for child in &self.children {
            child.write_to(w)?;
        }
        w.write_all(b"</svg>\n")
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
