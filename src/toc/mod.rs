//! Table-of-contents builders.
//!
//! The same [`Outline`] feeds two renderings with different structure:
//!
//! - [`NavMap`]: a nested tree of [`NavPoint`]s with a play order that is
//!   global across documents, serialized into the NCX navigation map.
//! - [`linear`]: a flat, indented listing used for the generated TOC page.

pub mod linear;

use crate::outline::{HeadingNode, Outline};

pub use linear::render_linear_toc;

/// Allocator for navigation play order.
///
/// One counter is shared by every document of a run, so values are unique
/// and strictly increasing across the whole navigation map.
#[derive(Debug, Clone)]
pub struct PlayOrder {
    next: usize,
}

impl PlayOrder {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next value.
    pub fn allocate(&mut self) -> usize {
        let value = self.next;
        self.next += 1;
        value
    }

    /// Number of values handed out so far.
    pub fn allocated(&self) -> usize {
        self.next - 1
    }
}

impl Default for PlayOrder {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of the navigation map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub play_order: usize,
    /// Level of the heading this point was built from.
    pub level: u8,
    pub label: String,
    /// `document#anchor` or the bare document path.
    pub href: String,
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    fn from_heading(heading: &HeadingNode, play_order: usize) -> Self {
        Self {
            id: format!("nav{play_order}"),
            play_order,
            level: heading.level,
            label: heading.text.clone(),
            href: heading.href(),
            children: Vec::new(),
        }
    }

    /// Nesting depth of this point's subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(NavPoint::depth).max().unwrap_or(0)
    }

    /// This point and all its descendants, in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &NavPoint> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let point = stack.pop()?;
            stack.extend(point.children.iter().rev());
            Some(point)
        })
    }
}

/// Build the navigation forest of one document.
///
/// A heading becomes a descendant of the nearest preceding heading with a
/// strictly lower level; skipped levels nest directly. Each point takes its
/// play order from `order` as it is opened, so numbering follows document
/// order.
pub fn build_document_nav(headings: &[HeadingNode], order: &mut PlayOrder) -> Vec<NavPoint> {
    let mut forest = Vec::new();
    // Open points, outermost first. Levels strictly increase up the stack.
    let mut stack: Vec<NavPoint> = Vec::new();

    for heading in headings {
        while stack.last().is_some_and(|top| top.level >= heading.level) {
            close_top(&mut stack, &mut forest);
        }
        stack.push(NavPoint::from_heading(heading, order.allocate()));
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut forest);
    }

    forest
}

fn close_top(stack: &mut Vec<NavPoint>, forest: &mut Vec<NavPoint>) {
    let Some(done) = stack.pop() else {
        return;
    };
    match stack.last_mut() {
        Some(parent) => parent.children.push(done),
        None => forest.push(done),
    }
}

/// The navigation map of a book: every outlined document's forest,
/// concatenated in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavMap {
    points: Vec<NavPoint>,
}

impl NavMap {
    pub fn build(outline: &Outline) -> Self {
        let mut order = PlayOrder::new();
        let points = outline
            .documents()
            .iter()
            .flat_map(|doc| build_document_nav(&doc.headings, &mut order))
            .collect();
        Self { points }
    }

    /// Top-level points.
    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    /// All points in pre-order (which is play order).
    pub fn iter(&self) -> impl Iterator<Item = &NavPoint> {
        self.points.iter().flat_map(NavPoint::iter)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum nesting depth; 0 for an empty map.
    pub fn depth(&self) -> usize {
        self.points.iter().map(NavPoint::depth).max().unwrap_or(0)
    }
}
