//! [`WindowHost`] implementation backed by an in-memory window table.
//!
//! Window geometry is stored in absolute coordinates on the workspace
//! plane: workspace `(x, y)` covers the output-sized viewport starting at
//! `(x * width, y * height)`.  Everything reported through [`WindowHost`]
//! is relative to the current workspace.

use crate::animation::Transform;
use crate::command::{Point, Rect, Scope, WindowId, WorkspaceCoord};
use crate::config::{HeadlessConfig, SeedWindow};
use crate::traits::{HostEvent, WindowHost};
use log::{debug, warn};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// What kind of surface a window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    /// Ordinary application window.
    Toplevel,
    /// Shell surface (bar, dock, background); never part of the grid.
    Panel,
}

/// One entry of the window table.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    /// Absolute geometry on the workspace plane.
    pub geometry: Rect,
    pub parent: Option<WindowId>,
    pub role: WindowRole,
    pub mapped: bool,
    pub minimized: bool,
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    /// Stepped explicitly with [`HeadlessHost::advance`].
    Manual(Duration),
    System(Instant),
}

/// An in-memory window host.
///
/// Mutations made through the inherent methods (opening, closing, moving
/// windows, …) queue the matching [`HostEvent`]s, which the session picks
/// up through [`WindowHost::poll_event`].
#[derive(Debug)]
pub struct HeadlessHost {
    output: Rect,
    workspace_cols: i32,
    workspace_rows: i32,
    workspace: WorkspaceCoord,
    windows: BTreeMap<WindowId, HeadlessWindow>,
    /// Bottom to top.
    stacking: Vec<WindowId>,
    next_id: u64,
    active: Option<WindowId>,
    cursor: Point,
    transforms: BTreeMap<WindowId, Transform>,
    plugin_active: bool,
    grabbed: bool,
    frame_hooks: bool,
    redraws: u64,
    events: VecDeque<HostEvent>,
    clock: Clock,
    /// Make [`WindowHost::activate_plugin`] fail.
    pub refuse_plugin: bool,
    /// Make [`WindowHost::grab_input`] fail.
    pub refuse_grab: bool,
}

impl HeadlessHost {
    /// An empty host with a manually stepped clock.
    pub fn new(config: &HeadlessConfig) -> Self {
        Self {
            output: Rect::new(0.0, 0.0, config.width as f64, config.height as f64),
            workspace_cols: config.workspace_cols.max(1) as i32,
            workspace_rows: config.workspace_rows.max(1) as i32,
            workspace: WorkspaceCoord::default(),
            windows: BTreeMap::new(),
            stacking: Vec::new(),
            next_id: 1,
            active: None,
            cursor: Point::default(),
            transforms: BTreeMap::new(),
            plugin_active: false,
            grabbed: false,
            frame_hooks: false,
            redraws: 0,
            events: VecDeque::new(),
            clock: Clock::Manual(Duration::ZERO),
            refuse_plugin: false,
            refuse_grab: false,
        }
    }

    /// Switch to the wall clock.
    pub fn with_system_clock(mut self) -> Self {
        self.clock = Clock::System(Instant::now());
        self
    }

    /// Step a manual clock forward.  No-op on the wall clock.
    pub fn advance(&mut self, by: Duration) {
        if let Clock::Manual(now) = &mut self.clock {
            *now += by;
        }
    }

    /// Map the seed windows from the configuration, in order.  Returns the
    /// ids they were given.
    pub fn seed(&mut self, windows: &[SeedWindow]) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = Vec::with_capacity(windows.len());
        for (i, w) in windows.iter().enumerate() {
            let parent = match w.parent {
                Some(p) if p < ids.len() => Some(ids[p]),
                Some(p) => {
                    warn!("seed window {} names parent {} which is not an earlier window", i, p);
                    None
                }
                None => None,
            };
            ids.push(self.open_window(Rect::new(w.x, w.y, w.width, w.height), parent));
        }
        ids
    }

    //  Scene changes

    /// Map a new application window and focus it.  `geometry` is absolute.
    pub fn open_window(&mut self, geometry: Rect, parent: Option<WindowId>) -> WindowId {
        let parent = parent.filter(|p| {
            let known = self.windows.contains_key(p);
            if !known {
                warn!("parent {} does not exist, mapping as top-level", p);
            }
            known
        });
        let id = self.insert(geometry, parent, WindowRole::Toplevel);
        self.focus(id);
        id
    }

    /// Map a shell surface.  Panels are never focused or scaled.
    pub fn open_panel(&mut self, geometry: Rect) -> WindowId {
        self.insert(geometry, None, WindowRole::Panel)
    }

    fn insert(&mut self, geometry: Rect, parent: Option<WindowId>, role: WindowRole) -> WindowId {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        self.windows.insert(
            id,
            HeadlessWindow {
                geometry,
                parent,
                role,
                mapped: true,
                minimized: false,
            },
        );
        self.stacking.push(id);
        debug!("mapped {} at {:?}", id, geometry);
        self.events.push_back(HostEvent::Attached(id));
        id
    }

    /// Destroy a window, its children first.
    pub fn destroy_window(&mut self, window: WindowId) {
        if !self.windows.contains_key(&window) {
            return;
        }
        for child in self.children(window) {
            self.destroy_window(child);
        }
        self.windows.remove(&window);
        self.stacking.retain(|w| *w != window);
        self.transforms.remove(&window);
        if self.active == Some(window) {
            self.active = None;
        }
        debug!("destroyed {}", window);
        self.events.push_back(HostEvent::Detached(window));
    }

    pub fn set_minimized(&mut self, window: WindowId, minimized: bool) {
        let Some(w) = self.windows.get_mut(&window) else {
            return;
        };
        if w.minimized == minimized {
            return;
        }
        w.minimized = minimized;
        if minimized && self.active == Some(window) {
            self.active = None;
        }
        self.events
            .push_back(HostEvent::Minimized { window, minimized });
    }

    /// Unmap a window without destroying it.
    pub fn unmap(&mut self, window: WindowId) {
        let Some(w) = self.windows.get_mut(&window) else {
            return;
        };
        if !w.mapped {
            return;
        }
        w.mapped = false;
        if self.active == Some(window) {
            self.active = None;
        }
        self.events.push_back(HostEvent::Unmapped(window));
    }

    /// Give a window new absolute geometry.
    pub fn move_window(&mut self, window: WindowId, geometry: Rect) {
        let Some(w) = self.windows.get_mut(&window) else {
            return;
        };
        w.geometry = geometry;
        self.events.push_back(HostEvent::GeometryChanged(window));
    }

    /// Move the pointer (output coordinates).
    pub fn set_cursor(&mut self, at: Point) {
        self.cursor = at;
    }

    //  Inspection

    pub fn window(&self, window: WindowId) -> Option<&HeadlessWindow> {
        self.windows.get(&window)
    }

    /// Window ids, bottom to top.
    pub fn stacking(&self) -> &[WindowId] {
        &self.stacking
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn transform(&self, window: WindowId) -> Option<Transform> {
        self.transforms.get(&window).copied()
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Where the window currently appears on the output.
    pub fn displayed_geometry(&self, window: WindowId) -> Option<Rect> {
        let geometry = self.natural_geometry(window)?;
        Some(match self.transforms.get(&window) {
            Some(t) => t.apply_to(&geometry),
            None => geometry,
        })
    }

    pub fn plugin_active(&self) -> bool {
        self.plugin_active
    }

    pub fn input_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn frame_hooks_registered(&self) -> bool {
        self.frame_hooks
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    fn workspace_origin(&self) -> Point {
        Point {
            x: self.workspace.x as f64 * self.output.width,
            y: self.workspace.y as f64 * self.output.height,
        }
    }

    fn is_shown(&self, w: &HeadlessWindow) -> bool {
        w.mapped && !w.minimized
    }

    /// Move `window` and its children to the top of the stack.
    fn raise(&mut self, window: WindowId) {
        let children = self.children(window);
        for id in std::iter::once(window).chain(children) {
            self.stacking.retain(|w| *w != id);
            self.stacking.push(id);
        }
    }
}

impl WindowHost for HeadlessHost {
    fn now(&self) -> Duration {
        match self.clock {
            Clock::Manual(now) => now,
            Clock::System(start) => start.elapsed(),
        }
    }

    fn eligible_windows(&self, scope: Scope) -> Vec<WindowId> {
        self.stacking
            .iter()
            .copied()
            .filter(|id| {
                let Some(w) = self.windows.get(id) else {
                    return false;
                };
                if w.role != WindowRole::Toplevel || w.parent.is_some() || !self.is_shown(w) {
                    return false;
                }
                match scope {
                    Scope::AllWorkspaces => true,
                    Scope::CurrentWorkspace => self
                        .natural_geometry(*id)
                        .is_some_and(|g| self.output.contains(g.center())),
                }
            })
            .collect()
    }

    fn exists(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    fn is_toplevel(&self, window: WindowId) -> bool {
        self.windows
            .get(&window)
            .is_some_and(|w| w.role == WindowRole::Toplevel)
    }

    fn is_mapped(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.mapped)
    }

    fn is_minimized(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.minimized)
    }

    fn natural_geometry(&self, window: WindowId) -> Option<Rect> {
        let w = self.windows.get(&window)?;
        let origin = self.workspace_origin();
        Some(Rect::new(
            w.geometry.x - origin.x,
            w.geometry.y - origin.y,
            w.geometry.width,
            w.geometry.height,
        ))
    }

    fn parent(&self, window: WindowId) -> Option<WindowId> {
        self.windows.get(&window)?.parent
    }

    fn children(&self, window: WindowId) -> Vec<WindowId> {
        self.stacking
            .iter()
            .copied()
            .filter(|id| self.windows.get(id).is_some_and(|w| w.parent == Some(window)))
            .collect()
    }

    fn workarea(&self) -> Rect {
        self.output
    }

    fn output_geometry(&self) -> Rect {
        self.output
    }

    fn current_workspace(&self) -> WorkspaceCoord {
        self.workspace
    }

    fn request_workspace(&mut self, workspace: WorkspaceCoord) {
        let target = WorkspaceCoord::new(
            workspace.x.clamp(0, self.workspace_cols - 1),
            workspace.y.clamp(0, self.workspace_rows - 1),
        );
        if target == self.workspace {
            return;
        }
        debug!("workspace {} -> {}", self.workspace, target);
        self.workspace = target;
        self.events.push_back(HostEvent::WorkspaceChanged(target));
        // Every mapped window moved relative to the viewport.
        let moved: Vec<WindowId> = self
            .stacking
            .iter()
            .copied()
            .filter(|id| self.windows.get(id).is_some_and(|w| w.mapped))
            .collect();
        self.events
            .extend(moved.into_iter().map(HostEvent::GeometryChanged));
    }

    fn active_window(&self) -> Option<WindowId> {
        self.active
    }

    fn focus(&mut self, window: WindowId) {
        if !self.windows.contains_key(&window) {
            return;
        }
        self.raise(window);
        if self.active != Some(window) {
            self.active = Some(window);
            self.events.push_back(HostEvent::Focused(window));
        }
    }

    fn window_at_cursor(&self) -> Option<WindowId> {
        self.stacking.iter().rev().copied().find(|id| {
            self.windows.get(id).is_some_and(|w| self.is_shown(w))
                && self
                    .displayed_geometry(*id)
                    .is_some_and(|g| g.contains(self.cursor))
        })
    }

    fn close_window(&mut self, window: WindowId) {
        self.destroy_window(window);
    }

    fn activate_plugin(&mut self) -> bool {
        if self.refuse_plugin {
            return false;
        }
        self.plugin_active = true;
        true
    }

    fn deactivate_plugin(&mut self) {
        self.plugin_active = false;
    }

    fn grab_input(&mut self) -> bool {
        if self.refuse_grab {
            return false;
        }
        self.grabbed = true;
        true
    }

    fn release_input(&mut self) {
        self.grabbed = false;
    }

    fn attach_transform(&mut self, window: WindowId) -> bool {
        if !self.windows.contains_key(&window) || self.transforms.contains_key(&window) {
            return false;
        }
        self.transforms.insert(window, Transform::IDENTITY);
        true
    }

    fn detach_transform(&mut self, window: WindowId) {
        self.transforms.remove(&window);
    }

    fn has_transform(&self, window: WindowId) -> bool {
        self.transforms.contains_key(&window)
    }

    fn set_transform(&mut self, window: WindowId, transform: Transform) {
        if let Some(t) = self.transforms.get_mut(&window) {
            *t = transform;
        }
    }

    fn add_frame_hooks(&mut self) {
        self.frame_hooks = true;
    }

    fn remove_frame_hooks(&mut self) {
        self.frame_hooks = false;
    }

    fn schedule_redraw(&mut self) {
        self.redraws += 1;
    }

    fn poll_event(&mut self) -> Option<HostEvent> {
        self.events.pop_front()
    }
}

//  Tests
