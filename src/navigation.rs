//! Keyboard and pointer navigation of the overview grid.
//!
//! [`step`] is the pure grid arithmetic; the `impl` block below extends
//! [`ScaleSession`] with the input handling that uses it.

use crate::command::{Direction, InputEvent, Key, MouseButton, PressState, WindowId};
use crate::grid::GridShape;
use crate::session::ScaleSession;
use crate::traits::WindowHost;
use log::debug;

/// Cell reached from `(row, col)` by one step in `dir`, wrapping at every
/// edge.
///
/// When the last row is shorter than the others, moving into or out of it
/// rescales the column so the focus lands on the visually nearest cell:
/// entering maps `col` from `0..cols` onto `0..last_row_cols` proportionally
/// to the column's position (`col / (cols - 1)`), leaving maps it back using
/// the column's centre (`(col + 0.5) / last_row_cols`).  The two mappings are
/// not inverses, so a down-then-up round trip can land one column over.  A
/// full last row keeps the column as is.
pub fn step(shape: &GridShape, row: usize, col: usize, dir: Direction) -> (usize, usize) {
    let rows = shape.rows as isize;
    let cols = shape.cols as isize;
    let last = shape.last_row_cols as isize;
    let (mut row, mut col) = (row as isize, col as isize);

    match dir {
        Direction::Up => row -= 1,
        Direction::Down => row += 1,
        Direction::Left => col -= 1,
        Direction::Right => col += 1,
    }

    if rows > 1 && last > 1 && last < cols {
        let entering_last =
            (dir == Direction::Down && row == rows - 1) || (dir == Direction::Up && row == -1);
        let leaving_last =
            (dir == Direction::Up && row == rows - 2) || (dir == Direction::Down && row == rows);
        if entering_last {
            let p = col as f64 / (cols - 1) as f64;
            col = ((p * (last - 1) as f64) as isize).clamp(0, last - 1);
        } else if leaving_last {
            let p = (col as f64 + 0.5) / last as f64;
            col = ((p * cols as f64) as isize).clamp(0, cols - 1);
        }
    }

    if row < 0 {
        row = rows - 1;
    }
    if row >= rows {
        row = 0;
    }

    let row_cols = if row == rows - 1 { last } else { cols };
    if col < 0 {
        col = row_cols - 1;
    }
    if col >= row_cols {
        col = 0;
    }

    (row as usize, col as usize)
}

impl<H: WindowHost> ScaleSession<H> {
    /// Feed one raw input event to the session.
    ///
    /// Returns `true` if the session consumed it: keys only while the input
    /// grab is held, buttons also while listening in interact mode.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Key {
                key,
                state,
                modifiers,
            } => {
                if !self.grabbed {
                    return false;
                }
                self.process_key(key, state, modifiers);
            }
            InputEvent::Button { button, state } => {
                if !self.grabbed && !self.button_connected {
                    return false;
                }
                self.process_button(button, state);
            }
        }
        true
    }

    /// The overview already ended; the key or button that ended it has
    /// now been released.
    fn finish_input(&mut self) {
        self.input_release_pending = false;
        self.release_grab();
        if !self.animation_running() {
            self.finalize();
        }
    }

    fn process_key(&mut self, key: Key, state: PressState, modifiers: bool) {
        if !self.is_active() {
            self.finish_input();
            return;
        }

        let Some(view) = self.host.active_window() else {
            if let Some(current) = self.current_focus {
                self.fade_out_all_except(current);
                self.fade_in(current);
                self.host.focus(current);
            }
            return;
        };
        if !self.is_scale_view(view) && !self.host.is_toplevel(view) {
            return;
        }

        if state == PressState::Released && matches!(key, Key::Enter | Key::Escape) {
            self.input_release_pending = false;
        }
        if state != PressState::Pressed || modifiers {
            return;
        }

        match key {
            Key::Enter => {
                debug!("selecting {:?}", self.current_focus);
                self.input_release_pending = true;
                self.deactivate();
                if let Some(current) = self.current_focus {
                    self.select_view(current);
                }
            }
            Key::Escape => {
                debug!("cancelling overview");
                self.input_release_pending = true;
                let initial = self.initial_focus.take();
                self.deactivate();
                if let Some(w) = initial.filter(|w| self.host.exists(*w)) {
                    self.host.focus(w);
                }
                self.host.request_workspace(self.initial_workspace);
            }
            _ => {
                let Some(dir) = key.direction() else {
                    return;
                };
                let (Some(shape), Some(slot)) = (self.shape, self.slots.get(&view)) else {
                    return;
                };
                let (row, col) = step(&shape, slot.row, slot.col, dir);
                let Some(next) = self.find_view_in_grid(row, col) else {
                    return;
                };
                debug!("go {} to {} at ({}, {})", dir, next, row, col);

                if self.current_focus != Some(next) {
                    self.fade_out_all_except(next);
                }
                self.current_focus = Some(next);
                self.host.focus(next);
                self.fade_in(next);
            }
        }
    }

    /// Top-level window in cell `(row, col)`, falling back to the first
    /// eligible window when the cell is empty.
    fn find_view_in_grid(&self, row: usize, col: usize) -> Option<WindowId> {
        self.slots
            .iter()
            .find(|(_, slot)| {
                !slot.retired && slot.parent.is_none() && slot.row == row && slot.col == col
            })
            .map(|(id, _)| *id)
            .or_else(|| self.eligible().first().copied())
    }

    fn process_button(&mut self, button: MouseButton, state: PressState) {
        if !self.is_active() {
            self.finish_input();
            return;
        }

        if button == MouseButton::Left || state == PressState::Released {
            self.input_release_pending = false;
        }
        if state != PressState::Pressed {
            return;
        }

        match button {
            MouseButton::Left => {}
            MouseButton::Middle if self.config.middle_click_close => {
                if let Some(w) = self.host.window_at_cursor() {
                    debug!("closing {}", w);
                    self.host.close_window(w);
                }
                return;
            }
            _ => return,
        }

        let Some(view) = self.host.window_at_cursor() else {
            return;
        };
        if !self.is_scale_view(view) && !self.host.is_toplevel(view) {
            return;
        }

        self.current_focus = Some(view);
        self.host.focus(view);
        self.fade_out_all_except(view);
        self.fade_in(view);

        if self.config.interact {
            return;
        }

        self.input_release_pending = true;
        self.initial_focus = None;
        self.deactivate();
        self.select_view(view);
    }
}

//  Tests
