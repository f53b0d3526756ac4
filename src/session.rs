//! The overview session: the state machine that ties the grid partitioner,
//! the animation engine and the window host together.
//!
//! [`ScaleSession`] owns one [`Slot`] per window shown in the grid and
//! keeps it 1:1 with the transforms attached in the host.  It reacts to
//! [`HostEvent`]s by re-reading the eligible window set and laying the grid
//! out again, and it is driven frame by frame through
//! [`pre_frame`](ScaleSession::pre_frame) / [`post_frame`](ScaleSession::post_frame)
//! while any animation is running.
//!
//! # Lifecycle
//!
//! ```text
//! Inactive ──activate──▶ Activating ──animations done──▶ Active
//!    ▲                       │  ▲                          │
//!    │                       ▼  └───────activate───────┐   ▼
//!    └──animations done── Deactivating ◀──deactivate───┴───┘
//! ```
//!
//! [`finalize`](ScaleSession::finalize) tears everything down synchronously
//! from any state.

use crate::animation::{ScaleAnimation, Transform, Transition};
use crate::bezier::CubicBezier;
use crate::command::{Point, Rect, Scope, WindowId, WorkspaceCoord};
use crate::config::ScaleConfig;
use crate::grid::{partition, GridShape, GridWindow, LayoutMode, LayoutParams};
use crate::traits::{HostEvent, WindowHost};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

/// Largest scale a window gets when zooming is disabled.
const MAX_SCALE_FACTOR: f64 = 1.0;
/// Largest scale of a child relative to its parent when zooming is disabled.
const MAX_SCALE_CHILD: f64 = 1.0;

/// Why an activation did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("overview is already active")]
    AlreadyActive,
    #[error("host refused to hand over the output")]
    PluginRefused,
    #[error("no windows to show")]
    NoWindows,
    #[error("input grab refused")]
    GrabRefused,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inactive,
    /// Active, entry animation still running.
    Activating,
    /// Active and settled.
    Active,
    /// Animating back to the original placement.
    Deactivating,
}

/// Per-window grid position and in-flight animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
    /// Top-level window this one is a transient child of.
    pub parent: Option<WindowId>,
    pub animation: ScaleAnimation,
    pub fade: Transition,
    /// No longer part of the grid; animating back to identity and removed
    /// once that finishes.
    pub retired: bool,
}

impl Slot {
    fn new(parent: Option<WindowId>, at: &Transform) -> Self {
        Self {
            row: 0,
            col: 0,
            parent,
            animation: ScaleAnimation::new(at),
            fade: Transition::settled(at.alpha),
            retired: false,
        }
    }

    /// The transform displayed at `now`.
    pub fn current(&self, now: Duration) -> Transform {
        self.animation.sample(now, self.fade.sample(now))
    }

    /// The transform this slot is heading towards.
    pub fn target(&self) -> Transform {
        self.animation.target(self.fade.target())
    }

    pub fn is_running(&self, now: Duration) -> bool {
        self.animation.is_running(now) || self.fade.is_running(now)
    }
}

/// Workspace holding `center`, given the current workspace and the output
/// geometry (one workspace per output-sized viewport, coordinates relative
/// to the current one).
pub fn workspace_containing(center: Point, current: WorkspaceCoord, output: &Rect) -> WorkspaceCoord {
    let offset = |pos: f64, origin: f64, len: f64| {
        if len > 0.0 {
            ((pos - origin) / len).floor() as i32
        } else {
            0
        }
    };
    WorkspaceCoord {
        x: current.x + offset(center.x, output.x, output.width),
        y: current.y + offset(center.y, output.y, output.height),
    }
}

/// The overview state machine.
///
/// The session is generic over any [`WindowHost`], which it owns and
/// threads through every operation.
///
/// # Typical usage
///
/// ```ignore
/// let mut session = ScaleSession::new(host, config.scale);
/// session.toggle(false);
/// loop {
///     session.dispatch_pending();
///     if session.wants_frames() {
///         session.frame();
///     }
/// }
/// ```
pub struct ScaleSession<H: WindowHost> {
    pub(crate) host: H,
    pub(crate) config: ScaleConfig,
    curve: CubicBezier,
    pub(crate) phase: Phase,
    pub(crate) all_workspaces: bool,
    pub(crate) initial_workspace: WorkspaceCoord,
    /// Window focused before the overview started.
    pub(crate) initial_focus: Option<WindowId>,
    /// Window currently highlighted in the grid.
    pub(crate) current_focus: Option<WindowId>,
    pub(crate) shape: Option<GridShape>,
    pub(crate) slots: BTreeMap<WindowId, Slot>,
    /// A key / button that ended the overview has not been released yet;
    /// keep the grab so the release does not reach a client.
    pub(crate) input_release_pending: bool,
    pub(crate) grabbed: bool,
    hooks_set: bool,
    /// Listening for structural / focus events.
    subscribed: bool,
    /// Listening for pointer buttons without a grab (interact mode).
    pub(crate) button_connected: bool,
}

impl<H: WindowHost> ScaleSession<H> {
    pub fn new(host: H, config: ScaleConfig) -> Self {
        let curve = config.easing.curve();
        Self {
            host,
            config,
            curve,
            phase: Phase::Inactive,
            all_workspaces: false,
            initial_workspace: WorkspaceCoord::default(),
            initial_focus: None,
            current_focus: None,
            shape: None,
            slots: BTreeMap::new(),
            input_release_pending: false,
            grabbed: false,
            hooks_set: false,
            subscribed: false,
            button_connected: false,
        }
    }

    //  Accessors

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Activating | Phase::Active)
    }

    /// Whether the session shows windows from every workspace.
    pub fn all_workspaces(&self) -> bool {
        self.all_workspaces
    }

    /// Shape of the most recent layout pass.
    pub fn shape(&self) -> Option<GridShape> {
        self.shape
    }

    pub fn slot(&self, window: WindowId) -> Option<&Slot> {
        self.slots.get(&window)
    }

    pub fn slots(&self) -> impl Iterator<Item = (WindowId, &Slot)> {
        self.slots.iter().map(|(id, slot)| (*id, slot))
    }

    pub fn initial_workspace(&self) -> WorkspaceCoord {
        self.initial_workspace
    }

    pub fn initial_focus(&self) -> Option<WindowId> {
        self.initial_focus
    }

    pub fn current_focus(&self) -> Option<WindowId> {
        self.current_focus
    }

    pub fn input_release_pending(&self) -> bool {
        self.input_release_pending
    }

    /// Whether the per-frame hooks are registered, i.e. the host should
    /// call [`frame`](Self::frame) (or the pre / post halves) every frame.
    pub fn wants_frames(&self) -> bool {
        self.hooks_set
    }

    pub(crate) fn scope(&self) -> Scope {
        if self.all_workspaces {
            Scope::AllWorkspaces
        } else {
            Scope::CurrentWorkspace
        }
    }

    pub(crate) fn eligible(&self) -> Vec<WindowId> {
        self.host.eligible_windows(self.scope())
    }

    /// Whether `window` belongs in the grid right now.
    pub(crate) fn is_scale_view(&self, window: WindowId) -> bool {
        self.eligible().contains(&window)
    }

    /// Walk up the parent chain to the top-level window.
    pub(crate) fn toplevel_of(&self, window: WindowId) -> WindowId {
        let mut w = window;
        // The tree is at most two levels deep; the bound only guards
        // against a misbehaving host.
        for _ in 0..8 {
            match self.host.parent(w) {
                Some(p) => w = p,
                None => break,
            }
        }
        w
    }

    fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            workarea: self.host.workarea(),
            spacing: self.config.spacing as f64,
            allow_scale_up: self.config.allow_zoom,
            max_scale_factor: MAX_SCALE_FACTOR,
            max_scale_child: MAX_SCALE_CHILD,
            inactive_alpha: self.config.inactive_alpha(),
        }
    }

    //  Activation

    /// Show the overview for `scope`.  Returns `false` (leaving the session
    /// untouched) if it is already active, the host refuses, or there is
    /// nothing to show.
    pub fn activate(&mut self, scope: Scope) -> bool {
        match self.try_activate(scope) {
            Ok(()) => true,
            Err(e) => {
                debug!("not activating: {}", e);
                false
            }
        }
    }

    /// [`activate`](Self::activate) with the reason for a refusal.
    pub fn try_activate(&mut self, scope: Scope) -> Result<(), ActivationError> {
        if self.is_active() {
            return Err(ActivationError::AlreadyActive);
        }
        if !self.host.activate_plugin() {
            return Err(ActivationError::PluginRefused);
        }

        let views = self.host.eligible_windows(scope);
        if views.is_empty() {
            if self.phase == Phase::Inactive {
                self.host.deactivate_plugin();
            }
            return Err(ActivationError::NoWindows);
        }

        if !self.config.interact && !self.grabbed {
            if !self.host.grab_input() {
                if self.phase == Phase::Inactive {
                    self.host.deactivate_plugin();
                }
                return Err(ActivationError::GrabRefused);
            }
            self.grabbed = true;
        }

        self.all_workspaces = scope == Scope::AllWorkspaces;
        self.initial_workspace = self.host.current_workspace();
        self.initial_focus = self.host.active_window();
        if !self.config.interact {
            if let Some(w) = self.initial_focus {
                self.host.focus(w);
            }
        }

        info!(
            "activating overview ({} windows, {:?})",
            views.len(),
            scope
        );
        self.phase = Phase::Activating;
        self.layout_slots(views, false);

        if self.config.interact {
            self.button_connected = true;
        }
        self.subscribed = true;

        if let Some(keep) = self.initial_focus {
            let others: Vec<WindowId> = self
                .slots
                .iter()
                .filter(|(id, slot)| !slot.retired && **id != keep && slot.parent != Some(keep))
                .map(|(id, _)| *id)
                .collect();
            let alpha = self.config.inactive_alpha();
            for id in others {
                self.fade_to(id, alpha);
            }
        }
        Ok(())
    }

    /// Toggle the overview.
    ///
    /// While active, toggling with the scope already shown (or when both
    /// scopes would show the same windows) deactivates; toggling with the
    /// other scope switches to it in place.  While inactive it activates.
    pub fn toggle(&mut self, all_workspaces: bool) -> bool {
        if self.is_active()
            && (self.all_same_as_current_workspace() || all_workspaces == self.all_workspaces)
        {
            self.deactivate();
            return true;
        }

        if self.is_active() {
            self.all_workspaces = all_workspaces;
            self.switch_scope();
            true
        } else {
            let scope = if all_workspaces {
                Scope::AllWorkspaces
            } else {
                Scope::CurrentWorkspace
            };
            self.activate(scope)
        }
    }

    fn all_same_as_current_workspace(&self) -> bool {
        self.host.eligible_windows(Scope::AllWorkspaces).len()
            == self.host.eligible_windows(Scope::CurrentWorkspace).len()
    }

    /// Re-lay-out after the scope changed.  Windows that fell out of scope
    /// retire and animate back to their place.
    fn switch_scope(&mut self) {
        debug!("switching overview scope to {:?}", self.scope());
        let views = self.eligible();
        self.layout_slots(views, true);
    }

    /// Start animating back to the original placement.
    ///
    /// Structural events stop being handled, but frames keep running until
    /// every animation has finished, at which point the session finalizes.
    pub fn deactivate(&mut self) {
        if self.phase == Phase::Inactive {
            return;
        }
        info!("deactivating overview");
        self.phase = Phase::Deactivating;
        self.set_hook();
        self.subscribed = false;

        if !self.input_release_pending {
            self.release_grab();
            self.host.deactivate_plugin();
        }

        let now = self.host.now();
        let duration = self.config.duration();
        let fade_duration = self.config.fade_duration();
        for slot in self.slots.values_mut() {
            slot.animation
                .animate_to(now, &Transform::IDENTITY, duration, self.curve);
            slot.fade.retarget(now, 1.0, fade_duration, self.curve);
        }

        self.refocus();
    }

    /// Tear everything down immediately: detach all transforms, forget all
    /// slots, drop every subscription and release the grab.  Safe to call
    /// from any state, any number of times.
    pub fn finalize(&mut self) {
        if self.phase != Phase::Inactive || !self.slots.is_empty() {
            info!("overview finalized");
        }
        self.phase = Phase::Inactive;
        self.input_release_pending = false;

        self.unset_hook();
        for id in self.slots.keys() {
            self.host.detach_transform(*id);
        }
        self.slots.clear();
        self.release_grab();
        self.button_connected = false;
        self.subscribed = false;
        self.host.deactivate_plugin();

        self.shape = None;
        self.current_focus = None;
        self.initial_focus = None;
    }

    /// Apply a new configuration.  While active, switching `interact`
    /// swaps the grab for button passthrough (or back), and layout-affecting
    /// options re-lay-out the grid.
    pub fn reconfigure(&mut self, config: ScaleConfig) {
        let old = std::mem::replace(&mut self.config, config);
        self.curve = self.config.easing.curve();
        if !self.is_active() {
            return;
        }

        if old.interact != self.config.interact {
            if self.config.interact {
                self.release_grab();
                self.button_connected = true;
            } else {
                if !self.grabbed && self.host.grab_input() {
                    self.grabbed = true;
                }
                self.button_connected = false;
            }
        }

        if old.allow_zoom != self.config.allow_zoom
            || old.spacing != self.config.spacing
            || old.inactive_alpha != self.config.inactive_alpha
        {
            self.relayout();
        }
    }

    pub(crate) fn release_grab(&mut self) {
        if self.grabbed {
            self.host.release_input();
            self.grabbed = false;
        }
    }

    /// Put focus back where the user expects it after the overview ends.
    fn refocus(&mut self) {
        if self.initial_focus.is_none() {
            return;
        }

        if let Some(current) = self.current_focus.filter(|w| self.host.exists(*w)) {
            self.host.focus(current);
            self.select_view(current);
            return;
        }

        let next = self
            .host
            .eligible_windows(Scope::CurrentWorkspace)
            .into_iter()
            .find(|w| self.host.is_mapped(*w));
        if let Some(next) = next {
            self.host.focus(next);
        }
    }

    /// Switch to the workspace holding `window`'s top-level ancestor.
    pub(crate) fn select_view(&mut self, window: WindowId) {
        let root = self.toplevel_of(window);
        let Some(geometry) = self.host.natural_geometry(root) else {
            return;
        };
        let ws = workspace_containing(
            geometry.center(),
            self.host.current_workspace(),
            &self.host.output_geometry(),
        );
        debug!("selecting {} on workspace {}", root, ws);
        self.host.request_workspace(ws);
    }

    //  Layout

    pub(crate) fn relayout(&mut self) {
        let views = self.eligible();
        self.layout_slots(views, false);
    }

    /// The eligible set went empty while active.
    fn heal_empty(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.slots.is_empty() {
            self.finalize();
        } else {
            self.deactivate();
        }
    }

    /// Compute the grid for `views` and retarget every slot's animation.
    ///
    /// Slots that are not part of the new grid are dropped on the spot,
    /// unless `retire` is set: then they animate home first and are pruned
    /// once settled.
    fn layout_slots(&mut self, views: Vec<WindowId>, retire: bool) {
        if views.is_empty() {
            self.heal_empty();
            return;
        }

        let active = self.is_active();
        let mut focused = None;
        if active {
            let focus = self
                .host
                .active_window()
                .map(|w| self.toplevel_of(w))
                .filter(|w| views.contains(w))
                .unwrap_or(views[0]);
            self.current_focus = Some(focus);
            if self.initial_focus.is_none() {
                self.initial_focus = Some(focus);
            }
            if self.all_workspaces {
                self.host.focus(focus);
            }
            focused = Some(focus);
        }

        let windows: Vec<GridWindow> = views
            .iter()
            .filter_map(|&id| {
                let geometry = self.host.natural_geometry(id)?;
                let children = self
                    .host
                    .children(id)
                    .into_iter()
                    .filter(|c| self.host.is_mapped(*c))
                    .filter_map(|c| Some((c, self.host.natural_geometry(c)?)))
                    .collect();
                Some(GridWindow {
                    id,
                    geometry,
                    children,
                })
            })
            .collect();

        let mode = if active {
            LayoutMode::Scaled { focused }
        } else {
            LayoutMode::Restore
        };
        let Some(layout) = partition(&windows, &self.layout_params(), mode) else {
            self.heal_empty();
            return;
        };
        debug!(
            "layout: {} windows in {}x{} (last row {})",
            windows.len(),
            layout.shape.rows,
            layout.shape.cols,
            layout.shape.last_row_cols
        );
        self.shape = Some(layout.shape);

        let now = self.host.now();
        let duration = self.config.duration();
        let fade_duration = self.config.fade_duration();

        let leaving: Vec<WindowId> = self
            .slots
            .iter()
            .filter(|(id, slot)| !slot.retired && layout.placement(**id).is_none())
            .map(|(id, _)| *id)
            .collect();
        for id in leaving {
            if retire {
                let Some(slot) = self.slots.get_mut(&id) else {
                    continue;
                };
                debug!("{} retires from the grid", id);
                slot.retired = true;
                slot.animation
                    .animate_to(now, &Transform::IDENTITY, duration, self.curve);
                slot.fade.retarget(now, 1.0, fade_duration, self.curve);
            } else if self.slots.contains_key(&id) {
                debug!("{} left the grid", id);
                self.remove_view(id);
            }
        }

        for placement in &layout.placements {
            // A child appearing mid-session starts where its parent is.
            let start = match placement.parent {
                Some(parent) if !self.slots.contains_key(&placement.id) => self
                    .slots
                    .get(&parent)
                    .map(|p| {
                        let at = p.current(now);
                        Transform {
                            translation_x: at.translation_x,
                            translation_y: at.translation_y,
                            ..Transform::IDENTITY
                        }
                    })
                    .unwrap_or(Transform::IDENTITY),
                _ => Transform::IDENTITY,
            };
            if !self.ensure_slot(placement.id, placement.parent, &start) {
                continue;
            }
            if let Some(slot) = self.slots.get_mut(&placement.id) {
                slot.row = placement.row;
                slot.col = placement.col;
                slot.parent = placement.parent;
                slot.retired = false;
                slot.animation
                    .animate_to(now, &placement.target, duration, self.curve);
                slot.fade
                    .retarget(now, placement.target.alpha, fade_duration, self.curve);
            }
        }

        self.set_hook();
        self.transform_views();
    }

    /// Make sure `window` has a slot and an attached transform.
    fn ensure_slot(&mut self, window: WindowId, parent: Option<WindowId>, start: &Transform) -> bool {
        if self.slots.contains_key(&window) {
            if !self.host.has_transform(window) {
                self.host.attach_transform(window);
            }
            return true;
        }
        if !self.host.attach_transform(window) {
            warn!("{} already carries a transform, leaving it out of the grid", window);
            return false;
        }
        self.slots.insert(window, Slot::new(parent, start));
        true
    }

    /// Drop `window` (and its children) from the grid right away.
    fn remove_view(&mut self, window: WindowId) {
        let children: Vec<WindowId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.parent == Some(window))
            .map(|(id, _)| *id)
            .collect();
        for id in std::iter::once(window).chain(children) {
            self.check_focus_view(id);
            self.host.detach_transform(id);
            self.slots.remove(&id);
        }
    }

    /// Forget `window` as a focus target.
    fn check_focus_view(&mut self, window: WindowId) {
        if self.current_focus == Some(window) {
            self.current_focus = self.host.active_window().filter(|w| *w != window);
        }
        if self.initial_focus == Some(window) {
            self.initial_focus = None;
        }
    }

    //  Fading

    pub(crate) fn fade_to(&mut self, window: WindowId, alpha: f64) {
        let now = self.host.now();
        let duration = self.config.fade_duration();
        let curve = self.curve;
        let Some(slot) = self.slots.get_mut(&window) else {
            return;
        };
        if slot.retired || slot.fade.target() == alpha {
            return;
        }
        slot.fade.retarget(now, alpha, duration, curve);
        self.set_hook();
    }

    /// Bring `window` and its children to full opacity.
    pub(crate) fn fade_in(&mut self, window: WindowId) {
        let children: Vec<WindowId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.parent == Some(window))
            .map(|(id, _)| *id)
            .collect();
        self.fade_to(window, 1.0);
        for child in children {
            self.fade_to(child, 1.0);
        }
    }

    /// Dim every slot except `window`, its parent and its children.
    pub(crate) fn fade_out_all_except(&mut self, window: WindowId) {
        let parent = self.host.parent(window);
        let dim: Vec<WindowId> = self
            .slots
            .iter()
            .filter(|(id, slot)| {
                **id != window && Some(**id) != parent && slot.parent != Some(window)
            })
            .map(|(id, _)| *id)
            .collect();
        let alpha = self.config.inactive_alpha();
        for id in dim {
            self.fade_to(id, alpha);
        }
    }

    //  Events

    /// Handle every event the host has queued, in order.
    pub fn dispatch_pending(&mut self) {
        while let Some(event) = self.host.poll_event() {
            self.handle_event(event);
        }
    }

    /// React to one host event.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            // Detach is honoured until finalization so no slot outlives its
            // window, even while animating out.
            HostEvent::Detached(w) if self.phase != Phase::Inactive => self.on_detached(w),
            _ if !self.subscribed => {}
            HostEvent::Attached(w) => self.on_attached(w),
            HostEvent::Minimized { window, minimized } => self.on_minimized(window, minimized),
            HostEvent::GeometryChanged(w) => {
                if self.slots.contains_key(&w) || self.is_scale_view(w) {
                    self.on_geometry_changed();
                }
            }
            HostEvent::WorkspaceChanged(_) => {
                if let Some(current) = self.current_focus {
                    self.host.focus(current);
                }
            }
            HostEvent::Focused(w) => self.on_focused(w),
            HostEvent::Unmapped(w) => self.check_focus_view(w),
            HostEvent::Detached(_) => {}
        }
    }

    fn on_attached(&mut self, window: WindowId) {
        if let Some(parent) = self.host.parent(window) {
            if self.slots.contains_key(&parent) {
                self.relayout();
                return;
            }
        }
        if !self.is_scale_view(window) {
            return;
        }

        let root = self.toplevel_of(window);
        self.current_focus = Some(root);
        self.host.focus(root);

        if self.slots.contains_key(&window) && self.host.has_transform(window) {
            return;
        }
        self.relayout();
    }

    fn on_detached(&mut self, window: WindowId) {
        let Some(slot) = self.slots.get(&window) else {
            return;
        };
        let is_child = slot.parent.is_some_and(|p| self.slots.contains_key(&p));
        debug!("{} detached", window);
        self.remove_view(window);

        let views = self.eligible();
        if views.is_empty() {
            self.finalize();
            return;
        }
        if !is_child {
            self.layout_slots(views, false);
        }
    }

    fn on_minimized(&mut self, window: WindowId, minimized: bool) {
        if minimized {
            self.remove_view(window);
            if self.slots.is_empty() {
                self.heal_empty();
                return;
            }
        } else if !self.is_scale_view(window) {
            return;
        }
        self.relayout();
    }

    fn on_geometry_changed(&mut self) {
        let views = self.eligible();
        if views.is_empty() {
            self.heal_empty();
            return;
        }
        self.layout_slots(views, false);
    }

    /// Keep the highlighted window focused.
    fn on_focused(&mut self, window: WindowId) {
        self.fade_out_all_except(window);
        self.fade_in(window);

        if Some(window) == self.current_focus || Some(window) == self.host.active_window() {
            if let Some(current) = self.current_focus.filter(|c| *c != window) {
                let root = self.toplevel_of(current);
                if root == window || self.host.is_minimized(root) || !self.host.is_mapped(root) {
                    return;
                }
                self.current_focus = Some(root);
                self.host.focus(root);
            }
            return;
        }

        let Some(current) = self.current_focus else {
            return;
        };
        if self.host.is_minimized(current) || !self.host.is_mapped(current) {
            return;
        }
        if self.all_workspaces {
            self.host.focus(current);
        }
        self.relayout();
    }

    //  Frames

    pub(crate) fn animation_running(&self) -> bool {
        let now = self.host.now();
        self.slots.values().any(|slot| slot.is_running(now))
    }

    fn set_hook(&mut self) {
        if self.hooks_set {
            return;
        }
        self.host.add_frame_hooks();
        self.host.schedule_redraw();
        self.hooks_set = true;
    }

    fn unset_hook(&mut self) {
        if !self.hooks_set {
            return;
        }
        self.host.remove_frame_hooks();
        self.hooks_set = false;
    }

    /// Push every slot's current values into its transform.
    fn transform_views(&mut self) {
        let stale: Vec<WindowId> = self
            .slots
            .keys()
            .copied()
            .filter(|id| !self.host.exists(*id))
            .collect();
        for id in stale {
            debug!("pruning stale slot {}", id);
            self.remove_view(id);
        }

        let now = self.host.now();
        for (id, slot) in &self.slots {
            if self.host.has_transform(*id) {
                self.host.set_transform(*id, slot.current(now));
            }
        }
    }

    /// Pre-render half of a frame.
    pub fn pre_frame(&mut self) {
        self.transform_views();
    }

    /// Post-render half of a frame: keep frames coming while anything
    /// animates, then unhook and, if the overview has ended, finalize.
    pub fn post_frame(&mut self) {
        self.host.schedule_redraw();

        let now = self.host.now();
        let finished: Vec<WindowId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.retired && !slot.is_running(now))
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            self.host.detach_transform(id);
            self.slots.remove(&id);
        }

        if self.animation_running() {
            return;
        }
        self.unset_hook();

        match self.phase {
            Phase::Activating => self.phase = Phase::Active,
            Phase::Active => {}
            Phase::Deactivating | Phase::Inactive => self.finalize(),
        }
    }

    /// One full frame.
    pub fn frame(&mut self) {
        self.pre_frame();
        self.post_frame();
    }
}

//  Tests
