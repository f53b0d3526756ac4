//! Grid partitioning.
//!
//! [`GridShape`] decides how many rows and columns a set of `N` windows
//! occupies, and [`partition`] turns an ordered window list plus the output
//! workarea into a per-window [`Placement`]: the grid cell, and the
//! [`Transform`] that fits the window (and each of its transient children)
//! into that cell.
//!
//! The shape keeps the grid roughly square without ever leaving a row
//! empty: `rows = ⌊√(N+1)⌋`, `cols = ⌈N / rows⌉`, and the last row holds
//! whatever is left over.
//!
//! Everything here is pure; the [`ScaleSession`](crate::session::ScaleSession)
//! feeds the result into the animation engine.

use crate::animation::Transform;
use crate::command::{Rect, WindowId};

/// Rows and columns of an overview grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns in every row except the last.
    pub cols: usize,
    /// Number of columns in the last row (`1..=cols`).
    pub last_row_cols: usize,
}

/// Integer square root (largest `r` with `r * r <= n`).
fn isqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r > 0 && r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

impl GridShape {
    /// Shape for `n` windows, or `None` when there is nothing to show.
    pub fn for_count(n: usize) -> Option<Self> {
        if n == 0 {
            return None;
        }
        let rows = isqrt(n + 1).max(1);
        let cols = n.div_ceil(rows);
        let last_row_cols = cols.min(n - (rows - 1) * cols);
        Some(Self {
            rows,
            cols,
            last_row_cols,
        })
    }

    /// Number of columns in `row`.
    pub fn cols_in_row(&self, row: usize) -> usize {
        if row + 1 == self.rows {
            self.last_row_cols
        } else {
            self.cols
        }
    }

    /// Whether `(row, col)` is a cell of this grid.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols_in_row(row)
    }

    /// Total number of cells (equals the window count the shape was built for).
    pub fn cell_count(&self) -> usize {
        (self.rows - 1) * self.cols + self.last_row_cols
    }
}

/// Tuning knobs for [`partition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Area the grid may cover.
    pub workarea: Rect,
    /// Gap around and between cells, in pixels.
    pub spacing: f64,
    /// Allow windows smaller than their cell to be scaled up.
    pub allow_scale_up: bool,
    /// Largest scale a window may get when scaling up is disallowed.
    pub max_scale_factor: f64,
    /// Largest scale of a child relative to its parent when scaling up is
    /// disallowed.  `0` leaves children unconstrained.
    pub max_scale_child: f64,
    /// Opacity of every window except the focused one.
    pub inactive_alpha: f64,
}

impl LayoutParams {
    pub fn new(workarea: Rect) -> Self {
        Self {
            workarea,
            spacing: 50.0,
            allow_scale_up: false,
            max_scale_factor: 1.0,
            max_scale_child: 1.0,
            inactive_alpha: 0.75,
        }
    }
}

/// What [`partition`] is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Fit every window into its cell.  `focused` (and its children) get
    /// full opacity, everything else the inactive opacity.
    Scaled { focused: Option<WindowId> },
    /// Tear-down: every target is the identity transform at full opacity.
    Restore,
}

/// A top-level window to place, with its natural geometry and that of its
/// transient children.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWindow {
    pub id: WindowId,
    pub geometry: Rect,
    pub children: Vec<(WindowId, Rect)>,
}

impl GridWindow {
    pub fn new(id: WindowId, geometry: Rect) -> Self {
        Self {
            id,
            geometry,
            children: Vec::new(),
        }
    }
}

/// Where one window (top-level or child) goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: WindowId,
    /// The top-level window this child belongs to; `None` for top-levels.
    pub parent: Option<WindowId>,
    pub row: usize,
    pub col: usize,
    /// The grid cell (spacing already removed).
    pub cell: Rect,
    /// Target transform, including target opacity.
    pub target: Transform,
}

/// Result of a layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub shape: GridShape,
    /// Top-level placements in row-major order, each followed by its
    /// children's placements.
    pub placements: Vec<Placement>,
}

impl Layout {
    /// Placement of window `id`, if it is part of this layout.
    pub fn placement(&self, id: WindowId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id == id)
    }

    /// The top-level placements only.
    pub fn toplevels(&self) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(|p| p.parent.is_none())
    }
}

/// Uniform scale that fits `size` into `cell`.
fn fit_scale(cell: &Rect, size: &Rect) -> f64 {
    let fit = |avail: f64, len: f64| if len > 0.0 { avail / len } else { f64::INFINITY };
    let scale = fit(cell.width, size.width).min(fit(cell.height, size.height));
    if scale.is_finite() {
        scale
    } else {
        1.0
    }
}

/// Translation that moves the centre of `geometry` onto the centre of `cell`.
fn centring_translation(cell: &Rect, geometry: &Rect) -> (f64, f64) {
    (
        cell.x - geometry.x + (cell.width - geometry.width) / 2.0,
        cell.y - geometry.y + (cell.height - geometry.height) / 2.0,
    )
}

/// Lay `windows` out in a grid covering `params.workarea`.
///
/// Windows are sorted by id first so the same set always produces the same
/// assignment regardless of the order it was enumerated in.  Returns `None`
/// for an empty list: the caller should tear down rather than show an empty
/// grid.
pub fn partition(windows: &[GridWindow], params: &LayoutParams, mode: LayoutMode) -> Option<Layout> {
    let shape = GridShape::for_count(windows.len())?;

    let mut sorted: Vec<&GridWindow> = windows.iter().collect();
    sorted.sort_by_key(|w| w.id);

    let wa = params.workarea;
    let spacing = params.spacing.max(0.0);
    let height = ((wa.height - (shape.rows + 1) as f64 * spacing) / shape.rows as f64).max(0.0);

    let mut placements = Vec::with_capacity(windows.len());
    let mut windows_iter = sorted.into_iter();
    let mut y = wa.y + spacing;

    for row in 0..shape.rows {
        let n = shape.cols_in_row(row);
        let width = ((wa.width - (n + 1) as f64 * spacing) / n as f64).max(0.0);
        let mut x = wa.x + spacing;

        for col in 0..n {
            let Some(window) = windows_iter.next() else {
                break;
            };
            let cell = Rect::new(x, y, width, height);

            let mut scale = fit_scale(&cell, &window.geometry);
            if !params.allow_scale_up {
                scale = scale.min(params.max_scale_factor);
            }

            let alpha = match mode {
                LayoutMode::Scaled { focused } if focused != Some(window.id) => params.inactive_alpha,
                _ => 1.0,
            };
            let target_for = |scale: f64, geometry: &Rect| match mode {
                LayoutMode::Restore => Transform::IDENTITY,
                LayoutMode::Scaled { .. } => {
                    let (tx, ty) = centring_translation(&cell, geometry);
                    Transform {
                        scale_x: scale,
                        scale_y: scale,
                        translation_x: tx,
                        translation_y: ty,
                        alpha,
                    }
                }
            };

            placements.push(Placement {
                id: window.id,
                parent: None,
                row,
                col,
                cell,
                target: target_for(scale, &window.geometry),
            });

            for (child_id, child_geometry) in &window.children {
                let mut child_scale = fit_scale(&cell, child_geometry);
                if !params.allow_scale_up {
                    child_scale = child_scale.min(params.max_scale_factor);
                    if params.max_scale_child > 0.0 && child_scale > params.max_scale_child * scale {
                        child_scale = params.max_scale_child * scale;
                    }
                }
                placements.push(Placement {
                    id: *child_id,
                    parent: Some(window.id),
                    row,
                    col,
                    cell,
                    target: target_for(child_scale, child_geometry),
                });
            }

            x += width + spacing;
        }
        y += height + spacing;
    }

    Some(Layout { shape, placements })
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn params() -> LayoutParams {
        LayoutParams {
            spacing: 20.0,
            ..LayoutParams::new(Rect::new(0.0, 0.0, 1920.0, 1080.0))
        }
    }

    fn windows(n: u64) -> Vec<GridWindow> {
        (1..=n)
            .map(|i| {
                GridWindow::new(
                    WindowId(i),
                    Rect::new(
                        (i * 37 % 500) as f64,
                        (i * 53 % 300) as f64,
                        400.0 + (i * 71 % 900) as f64,
                        300.0 + (i * 29 % 600) as f64,
                    ),
                )
            })
            .collect()
    }

    #[test]
    fn zero_windows_has_no_shape() {
        assert_eq!(GridShape::for_count(0), None);
        assert!(partition(&[], &params(), LayoutMode::Restore).is_none());
    }

    #[test]
    fn single_window_is_one_cell() {
        let s = GridShape::for_count(1).unwrap();
        assert_eq!((s.rows, s.cols, s.last_row_cols), (1, 1, 1));
    }

    #[test]
    fn five_windows_shape() {
        let s = GridShape::for_count(5).unwrap();
        assert_eq!((s.rows, s.cols, s.last_row_cols), (2, 3, 2));
    }

    #[test]
    fn fifth_window_lands_in_second_row() {
        let layout = partition(&windows(5), &params(), LayoutMode::Scaled { focused: None }).unwrap();
        let p = layout.placement(WindowId(5)).unwrap();
        assert_eq!((p.row, p.col), (1, 1));
    }

    #[test]
    fn shape_formula_holds_for_many_counts() {
        for n in 1..=200usize {
            let s = GridShape::for_count(n).unwrap();
            assert_eq!(s.rows, ((n + 1) as f64).sqrt().floor() as usize, "n={n}");
            assert!(s.rows * s.cols >= n, "n={n}");
            assert_eq!(s.last_row_cols, n - (s.rows - 1) * s.cols, "n={n}");
            assert!(s.last_row_cols >= 1 && s.last_row_cols <= s.cols, "n={n}");
            assert_eq!(s.cell_count(), n);
        }
    }

    #[test]
    fn every_window_gets_a_unique_valid_cell() {
        for n in 1..=40 {
            let layout =
                partition(&windows(n), &params(), LayoutMode::Scaled { focused: None }).unwrap();
            let mut seen = HashSet::new();
            for p in layout.toplevels() {
                assert!(layout.shape.contains(p.row, p.col), "n={n}: {:?}", (p.row, p.col));
                assert!(seen.insert((p.row, p.col)), "n={n}: duplicate cell");
            }
            assert_eq!(seen.len(), n as usize);
        }
    }

    #[test]
    fn scaled_windows_stay_inside_their_cells() {
        for n in 1..=30 {
            let ws = windows(n);
            let layout = partition(&ws, &params(), LayoutMode::Scaled { focused: None }).unwrap();
            for w in &ws {
                let p = layout.placement(w.id).unwrap();
                let shown = p.target.apply_to(&w.geometry);
                assert!(
                    p.cell.contains_rect(&shown, 1e-6),
                    "n={n} {}: {shown:?} not in {:?}",
                    w.id,
                    p.cell
                );
            }
        }
    }

    #[test]
    fn cells_do_not_overlap_and_fit_the_workarea() {
        let p = params();
        for n in 1..=30 {
            let layout = partition(&windows(n), &p, LayoutMode::Scaled { focused: None }).unwrap();
            let cells: Vec<Rect> = layout.toplevels().map(|pl| pl.cell).collect();
            for (i, a) in cells.iter().enumerate() {
                assert!(p.workarea.contains_rect(a, 1e-6));
                for b in &cells[i + 1..] {
                    assert!(!a.overlaps(b), "n={n}: {a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn layout_is_idempotent_and_order_independent() {
        let ws = windows(7);
        let mode = LayoutMode::Scaled {
            focused: Some(WindowId(3)),
        };
        let first = partition(&ws, &params(), mode).unwrap();
        let second = partition(&ws, &params(), mode).unwrap();
        assert_eq!(first, second);

        let mut reversed = ws.clone();
        reversed.reverse();
        assert_eq!(partition(&reversed, &params(), mode).unwrap(), first);
    }

    #[test]
    fn scale_up_is_capped_unless_allowed() {
        let small = vec![GridWindow::new(WindowId(1), Rect::new(0.0, 0.0, 100.0, 100.0))];
        let capped = partition(&small, &params(), LayoutMode::Scaled { focused: None }).unwrap();
        assert_eq!(capped.placements[0].target.scale_x, 1.0);

        let zoom = LayoutParams {
            allow_scale_up: true,
            ..params()
        };
        let zoomed = partition(&small, &zoom, LayoutMode::Scaled { focused: None }).unwrap();
        assert!(zoomed.placements[0].target.scale_x > 1.0);
        let t = zoomed.placements[0].target;
        assert_eq!(t.scale_x, t.scale_y);
    }

    #[test]
    fn focused_window_is_opaque_others_inactive() {
        let layout = partition(
            &windows(3),
            &params(),
            LayoutMode::Scaled {
                focused: Some(WindowId(2)),
            },
        )
        .unwrap();
        assert_eq!(layout.placement(WindowId(2)).unwrap().target.alpha, 1.0);
        assert_eq!(layout.placement(WindowId(1)).unwrap().target.alpha, 0.75);
        assert_eq!(layout.placement(WindowId(3)).unwrap().target.alpha, 0.75);
    }

    #[test]
    fn restore_mode_targets_identity() {
        let layout = partition(&windows(4), &params(), LayoutMode::Restore).unwrap();
        for p in &layout.placements {
            assert_eq!(p.target, Transform::IDENTITY);
        }
        let p = layout.placement(WindowId(4)).unwrap();
        assert_eq!((p.row, p.col), (1, 1));
    }

    #[test]
    fn child_scale_never_exceeds_parent_scale() {
        let mut parent = GridWindow::new(WindowId(1), Rect::new(0.0, 0.0, 2400.0, 1400.0));
        parent
            .children
            .push((WindowId(10), Rect::new(700.0, 400.0, 300.0, 200.0)));
        let layout = partition(&[parent], &params(), LayoutMode::Scaled { focused: Some(WindowId(1)) })
            .unwrap();
        let p = layout.placement(WindowId(1)).unwrap();
        let c = layout.placement(WindowId(10)).unwrap();
        assert!(p.target.scale_x < 1.0);
        assert_eq!(c.target.scale_x, p.target.scale_x);
        assert_eq!(c.parent, Some(WindowId(1)));
        assert_eq!((c.row, c.col), (p.row, p.col));
        assert_eq!(c.target.alpha, 1.0);
        let shown = c.target.apply_to(&Rect::new(700.0, 400.0, 300.0, 200.0));
        assert!(c.cell.contains_rect(&shown, 1e-6));
    }

    #[test]
    fn degenerate_geometry_does_not_produce_nan() {
        let ws = vec![GridWindow::new(WindowId(1), Rect::new(0.0, 0.0, 0.0, 0.0))];
        let layout = partition(&ws, &params(), LayoutMode::Scaled { focused: None }).unwrap();
        let t = layout.placements[0].target;
        assert!(t.scale_x.is_finite() && t.translation_x.is_finite());
    }
}
