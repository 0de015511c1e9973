//! The widget tree: a recursive leaf/split structure over
//! [`edge_buffer::EditorState`]'s open buffers. Leaves are `BufferWidget`s
//! (named buffer) or the buffers list; inner nodes split a region
//! horizontally or vertically among weighted children. Laying a tree out
//! against a terminal-sized [`LayoutRegion`] produces the flat list of
//! "output producers" `edge-render` iterates to draw each region.

pub mod layout;

pub use layout::LayoutRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One widget in the tree. Leaves name what to draw; `Split` recursively
/// divides its region among children in proportion to their weight.
#[derive(Debug, Clone)]
pub enum Widget {
    Buffer(String),
    BuffersList,
    Split {
        orientation: Orientation,
        children: Vec<(Widget, u16)>,
    },
}

impl Widget {
    pub fn buffer(name: impl Into<String>) -> Self {
        Widget::Buffer(name.into())
    }

    pub fn split(orientation: Orientation, children: Vec<(Widget, u16)>) -> Self {
        Widget::Split { orientation, children }
    }
}

/// A leaf widget paired with the concrete screen region it was assigned —
/// what the renderer actually draws into.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub region: LayoutRegion,
    pub widget: &'a Widget,
}

/// Recursively lay `widget` out across `region`, appending one
/// [`Placement`] per leaf to `out` in depth-first, left-to-right order.
pub fn place<'a>(widget: &'a Widget, region: LayoutRegion, out: &mut Vec<Placement<'a>>) {
    match widget {
        Widget::Buffer(_) | Widget::BuffersList => out.push(Placement { region, widget }),
        Widget::Split { orientation, children } => {
            if children.is_empty() {
                return;
            }
            let weights: Vec<u16> = children.iter().map(|(_, w)| *w).collect();
            match orientation {
                Orientation::Horizontal => {
                    let widths = layout::split_weighted(region.width, &weights);
                    let mut x = region.x;
                    for ((child, _), w) in children.iter().zip(widths) {
                        place(child, LayoutRegion::new(x, region.y, w, region.height), out);
                        x += w;
                    }
                }
                Orientation::Vertical => {
                    let heights = layout::split_weighted(region.height, &weights);
                    let mut y = region.y;
                    for ((child, _), h) in children.iter().zip(heights) {
                        place(child, LayoutRegion::new(region.x, y, region.width, h), out);
                        y += h;
                    }
                }
            }
        }
    }
}

/// Buffer names referenced by any `Widget::Buffer` leaf, in tree order.
/// Used by the editor loop to know which buffers need a render pass this
/// frame without walking the tree twice.
pub fn referenced_buffers(widget: &Widget) -> Vec<&str> {
    let mut names = Vec::new();
    fn walk<'a>(w: &'a Widget, names: &mut Vec<&'a str>) {
        match w {
            Widget::Buffer(name) => names.push(name.as_str()),
            Widget::BuffersList => {}
            Widget::Split { children, .. } => {
                for (child, _) in children {
                    walk(child, names);
                }
            }
        }
    }
    walk(widget, &mut names);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_buffer_widget_gets_the_whole_screen() {
        let widget = Widget::buffer("a.txt");
        let mut placements = Vec::new();
        place(&widget, LayoutRegion::full_screen(80, 24), &mut placements);
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].region, LayoutRegion::full_screen(80, 24));
    }

    #[test]
    fn vertical_split_stacks_children_top_to_bottom() {
        let widget = Widget::split(
            Orientation::Vertical,
            vec![(Widget::buffer("a.txt"), 1), (Widget::buffer("b.txt"), 1)],
        );
        let mut placements = Vec::new();
        place(&widget, LayoutRegion::full_screen(80, 24), &mut placements);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].region, LayoutRegion::new(0, 0, 80, 12));
        assert_eq!(placements[1].region, LayoutRegion::new(0, 12, 80, 12));
    }

    #[test]
    fn horizontal_split_divides_width_by_weight() {
        let widget = Widget::split(
            Orientation::Horizontal,
            vec![(Widget::buffer("a.txt"), 1), (Widget::buffer("b.txt"), 2)],
        );
        let mut placements = Vec::new();
        place(&widget, LayoutRegion::full_screen(90, 24), &mut placements);
        assert_eq!(placements[0].region, LayoutRegion::new(0, 0, 30, 24));
        assert_eq!(placements[1].region, LayoutRegion::new(30, 0, 60, 24));
    }

    #[test]
    fn nested_split_places_every_leaf() {
        let widget = Widget::split(
            Orientation::Horizontal,
            vec![
                (Widget::BuffersList, 1),
                (
                    Widget::split(
                        Orientation::Vertical,
                        vec![(Widget::buffer("a.txt"), 1), (Widget::buffer("b.txt"), 1)],
                    ),
                    3,
                ),
            ],
        );
        let mut placements = Vec::new();
        place(&widget, LayoutRegion::full_screen(80, 20), &mut placements);
        assert_eq!(placements.len(), 3);
    }

    #[test]
    fn referenced_buffers_collects_leaf_names_in_order() {
        let widget = Widget::split(
            Orientation::Horizontal,
            vec![(Widget::buffer("a.txt"), 1), (Widget::BuffersList, 1), (Widget::buffer("b.txt"), 1)],
        );
        assert_eq!(referenced_buffers(&widget), vec!["a.txt", "b.txt"]);
    }
}
