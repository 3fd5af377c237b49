/// Squarified treemap layout (Bruls, Huizing, van Wijk).
///
/// Turns a directory's sorted child list into rectangles whose areas are
/// proportional to aggregate sizes and whose aspect ratios are kept close
/// to square. Stateless: every resize or zoom calls [`layout`] fresh, and
/// identical inputs produce identical output lists.
use crate::model::{NodeIndex, SizeTree};
use thiserror::Error;

/// An axis-aligned rectangle in layout space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A laid-out rectangle paired with the node it was computed for,
/// so consumers can hit-test and build tooltips.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRect {
    pub node: NodeIndex,
    pub rect: Rect,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    /// Bounds with a negative dimension. Zero is fine (degenerate output),
    /// negative is a caller bug.
    #[error("layout bounds have a negative dimension")]
    InvalidInput,
}

/// Lay out the children of `parent` inside `bounds`.
///
/// Returns one rectangle per child, in child-list order (descending size).
/// An empty result means there was nothing to lay out (no children, or all
/// aggregate sizes are zero).
pub fn layout(
    tree: &SizeTree,
    parent: NodeIndex,
    bounds: Rect,
) -> Result<Vec<LayoutRect>, LayoutError> {
    let children = tree.children(parent);
    let sizes: Vec<u64> = children.iter().map(|&c| tree.node(c).size).collect();
    let rects = squarify(&sizes, bounds)?;
    Ok(children
        .iter()
        .zip(rects)
        .map(|(&node, rect)| LayoutRect { node, rect })
        .collect())
}

/// Partition `bounds` into one rectangle per input size.
///
/// `sizes` arrives in stored child-list order: descending, except that an
/// others bucket may sit last regardless of its rank. Rows are built
/// greedily along the shorter side of the remaining bounds, and a row
/// keeps growing while the next size does not worsen its worst aspect
/// ratio (ties grow the row, favoring fewer, larger rows).
///
/// Zero-sized entries receive zero-area rectangles anchored at the
/// unfilled corner rather than being omitted, so callers can still
/// associate every node with a rectangle.
pub fn squarify(sizes: &[u64], bounds: Rect) -> Result<Vec<Rect>, LayoutError> {
    if bounds.width < 0.0 || bounds.height < 0.0 {
        return Err(LayoutError::InvalidInput);
    }

    let total: u64 = sizes.iter().sum();
    if total == 0 {
        return Ok(Vec::new());
    }

    let scale = bounds.area() / total as f64;
    // (input position, target area), zero-sized entries left out of the
    // row building but restored below.
    let items: Vec<(usize, f64)> = sizes
        .iter()
        .enumerate()
        .filter(|(_, &s)| s > 0)
        .map(|(pos, &s)| (pos, s as f64 * scale))
        .collect();

    let mut rects: Vec<Option<Rect>> = vec![None; sizes.len()];
    let mut remaining = bounds;
    let mut i = 0;

    while i < items.len() && remaining.area() > 0.0 {
        let side = remaining.width.min(remaining.height);

        // Grow the row while the worst aspect ratio does not get worse.
        let row_start = i;
        let mut worst = worst_ratio(&items[row_start..=i], side);
        i += 1;
        while i < items.len() {
            let candidate = worst_ratio(&items[row_start..=i], side);
            if candidate <= worst {
                worst = candidate;
                i += 1;
            } else {
                break;
            }
        }

        let row = &items[row_start..i];
        let row_total: f64 = row.iter().map(|&(_, a)| a).sum();

        if remaining.width >= remaining.height {
            // Vertical strip at the left edge, rectangles top-to-bottom.
            let strip_w = row_total / remaining.height;
            let mut y = remaining.y;
            for &(pos, area) in row {
                let h = area / strip_w;
                rects[pos] = Some(Rect::new(remaining.x, y, strip_w, h));
                y += h;
            }
            remaining.x += strip_w;
            remaining.width = (remaining.width - strip_w).max(0.0);
        } else {
            // Horizontal strip at the top edge, rectangles left-to-right.
            let strip_h = row_total / remaining.width;
            let mut x = remaining.x;
            for &(pos, area) in row {
                let w = area / strip_h;
                rects[pos] = Some(Rect::new(x, remaining.y, w, strip_h));
                x += w;
            }
            remaining.y += strip_h;
            remaining.height = (remaining.height - strip_h).max(0.0);
        }
    }

    // Everything unplaced — zero-sized entries, or any entry when the
    // bounds themselves have zero area — gets a degenerate rectangle at
    // the unfilled corner.
    Ok(rects
        .into_iter()
        .map(|r| r.unwrap_or(Rect::new(remaining.x, remaining.y, 0.0, 0.0)))
        .collect())
}

/// Worst aspect ratio over a row of `(position, area)` items laid into a
/// strip along `side`.
fn worst_ratio(row: &[(usize, f64)], side: f64) -> f64 {
    let total: f64 = row.iter().map(|&(_, a)| a).sum();
    if side <= 0.0 || total <= 0.0 {
        return f64::MAX;
    }
    let breadth = total / side;
    let mut worst = 0.0f64;
    for &(_, area) in row {
        let depth = area / breadth;
        let ratio = if depth > 0.0 {
            (breadth / depth).max(depth / breadth)
        } else {
            f64::MAX
        };
        worst = worst.max(ratio);
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: &Rect, b: &Rect) -> bool {
        a.x < b.x + b.width
            && b.x < a.x + a.width
            && a.y < b.y + b.height
            && b.y < a.y + a.height
    }

    #[test]
    fn proportional_split_of_wide_bounds() {
        // 300 + 100 bytes into 400×100: areas 30000 and 10000.
        let rects = squarify(&[300, 100], Rect::new(0.0, 0.0, 400.0, 100.0)).unwrap();
        assert_eq!(rects.len(), 2);
        assert!((rects[0].area() - 30_000.0).abs() < 1e-6);
        assert!((rects[1].area() - 10_000.0).abs() < 1e-6);
        assert_eq!(rects[0], Rect::new(0.0, 0.0, 300.0, 100.0));
        assert_eq!(rects[1], Rect::new(300.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn single_child_fills_bounds() {
        let bounds = Rect::new(5.0, 7.0, 120.0, 90.0);
        let rects = squarify(&[42], bounds).unwrap();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0], bounds);
    }

    #[test]
    fn all_zero_sizes_yield_empty_layout() {
        let rects = squarify(&[0, 0, 0], Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(rects.is_empty());
        let rects = squarify(&[], Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(rects.is_empty());
    }

    #[test]
    fn zero_area_bounds_yield_degenerate_rects() {
        let rects = squarify(&[10, 5, 1], Rect::new(3.0, 4.0, 0.0, 50.0)).unwrap();
        assert_eq!(rects.len(), 3);
        for r in &rects {
            assert_eq!(r.width, 0.0);
            assert_eq!(r.height, 0.0);
        }
    }

    #[test]
    fn zero_sized_tail_entries_get_zero_rects() {
        let rects = squarify(&[10, 5, 0, 0], Rect::new(0.0, 0.0, 30.0, 10.0)).unwrap();
        assert_eq!(rects.len(), 4);
        assert!(rects[0].area() > 0.0);
        assert!(rects[1].area() > 0.0);
        assert_eq!(rects[2].area(), 0.0);
        assert_eq!(rects[3].area(), 0.0);
    }

    #[test]
    fn trailing_bucket_larger_than_tail_is_still_placed() {
        // Child lists are descending except for the others bucket, which is
        // pinned last regardless of rank — even after zero-sized entries.
        let sizes = [10, 5, 0, 7];
        let bounds = Rect::new(0.0, 0.0, 22.0, 10.0);
        let rects = squarify(&sizes, bounds).unwrap();
        assert_eq!(rects.len(), 4);
        assert!((rects[0].area() - 100.0).abs() < 1e-9);
        assert!((rects[1].area() - 50.0).abs() < 1e-9);
        assert_eq!(rects[2].area(), 0.0);
        assert!((rects[3].area() - 70.0).abs() < 1e-9);

        let sum: f64 = rects.iter().map(Rect::area).sum();
        assert!((sum - bounds.area()).abs() < 1e-9);
    }

    #[test]
    fn negative_bounds_are_rejected() {
        assert!(matches!(
            squarify(&[1], Rect::new(0.0, 0.0, -1.0, 10.0)),
            Err(LayoutError::InvalidInput)
        ));
    }

    #[test]
    fn areas_are_conserved_and_disjoint() {
        let sizes = [500, 300, 200, 120, 90, 55, 30, 14, 9, 3];
        let bounds = Rect::new(0.0, 0.0, 640.0, 480.0);
        let rects = squarify(&sizes, bounds).unwrap();
        assert_eq!(rects.len(), sizes.len());

        let sum: f64 = rects.iter().map(Rect::area).sum();
        assert!((sum - bounds.area()).abs() < 1e-6 * bounds.area());

        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
            }
            // Every rectangle stays inside the bounds.
            assert!(a.x >= bounds.x - 1e-9 && a.y >= bounds.y - 1e-9);
            assert!(a.x + a.width <= bounds.x + bounds.width + 1e-6);
            assert!(a.y + a.height <= bounds.y + bounds.height + 1e-6);
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let sizes = [977, 610, 377, 233, 144, 89, 55, 34, 21, 13, 8, 5];
        let bounds = Rect::new(10.0, 20.0, 1024.0, 768.0);
        let first = squarify(&sizes, bounds).unwrap();
        let second = squarify(&sizes, bounds).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn aspect_ratios_are_reasonable() {
        // Equal sizes in a square should come out square-ish, never slivers.
        let sizes = [100u64; 9];
        let rects = squarify(&sizes, Rect::new(0.0, 0.0, 300.0, 300.0)).unwrap();
        for r in &rects {
            let ratio = (r.width / r.height).max(r.height / r.width);
            assert!(ratio < 3.0, "sliver: {r:?}");
        }
    }
}
