//! Core traits that decouple scalegrid from any specific compositor or
//! transport mechanism.
//!
//! The [`ScaleSession`](crate::session::ScaleSession) only talks to the
//! outside world through [`WindowHost`]; every concrete backend (the
//! [`HeadlessHost`](crate::headless::host::HeadlessHost), a compositor
//! plugin shim, a test double, …) implements it.

use crate::animation::Transform;
use crate::command::{Command, Rect, Scope, WindowId, WorkspaceCoord};
use std::sync::mpsc;
use std::time::Duration;

/// Something that happened to the window set, delivered by the host in
/// order and handled synchronously by
/// [`ScaleSession::handle_event`](crate::session::ScaleSession::handle_event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A window was mapped on (or moved onto) the output.
    Attached(WindowId),
    /// A window was destroyed or moved to another output.
    Detached(WindowId),
    /// A window was minimized or restored.
    Minimized { window: WindowId, minimized: bool },
    /// A window's geometry changed.
    GeometryChanged(WindowId),
    /// The output switched to another workspace.
    WorkspaceChanged(WorkspaceCoord),
    /// A window received keyboard focus.
    Focused(WindowId),
    /// A window was unmapped (it may still be mapped again later).
    Unmapped(WindowId),
}

/// The services an overview session needs from the windowing environment.
///
/// Every query must tolerate being asked about a window that no longer
/// exists (returning `None`, `false` or an empty list); mutations on such
/// windows are no-ops.
pub trait WindowHost {
    //  Clock

    /// Monotonic time since an arbitrary epoch.
    fn now(&self) -> Duration;

    //  Window tree

    /// Mapped, non-minimized top-level windows in `scope`, in the host's
    /// stacking order.  For [`Scope::CurrentWorkspace`] only windows whose
    /// centre lies on the current workspace are returned.
    fn eligible_windows(&self, scope: Scope) -> Vec<WindowId>;

    /// Whether the window still exists.
    fn exists(&self, window: WindowId) -> bool;

    /// Whether the window is an ordinary application window (as opposed to
    /// a panel, background or other shell surface).
    fn is_toplevel(&self, window: WindowId) -> bool;

    fn is_mapped(&self, window: WindowId) -> bool;

    fn is_minimized(&self, window: WindowId) -> bool;

    /// Untransformed geometry, relative to the current workspace.
    fn natural_geometry(&self, window: WindowId) -> Option<Rect>;

    fn parent(&self, window: WindowId) -> Option<WindowId>;

    fn children(&self, window: WindowId) -> Vec<WindowId>;

    //  Output

    /// Area available to the grid (output minus panels).
    fn workarea(&self) -> Rect;

    /// Full output geometry; one workspace is one output-sized viewport.
    fn output_geometry(&self) -> Rect;

    fn current_workspace(&self) -> WorkspaceCoord;

    fn request_workspace(&mut self, workspace: WorkspaceCoord);

    //  Focus and input

    fn active_window(&self) -> Option<WindowId>;

    fn focus(&mut self, window: WindowId);

    /// The window whose displayed (transformed) bounds are under the
    /// pointer.
    fn window_at_cursor(&self) -> Option<WindowId>;

    /// Ask a window to close.
    fn close_window(&mut self, window: WindowId);

    /// Claim the output for the overview.  Returns `false` if another
    /// exclusive mode holds it.  Succeeds if already claimed.
    fn activate_plugin(&mut self) -> bool;

    fn deactivate_plugin(&mut self);

    /// Take the exclusive keyboard / pointer grab.
    fn grab_input(&mut self) -> bool;

    /// Release the grab.  Harmless when not grabbed.
    fn release_input(&mut self);

    //  Transforms and rendering

    /// Attach an (identity) overview transform.  Returns `false` if one is
    /// already attached or the window is gone.
    fn attach_transform(&mut self, window: WindowId) -> bool;

    /// Detach the overview transform.  Harmless when none is attached.
    fn detach_transform(&mut self, window: WindowId);

    fn has_transform(&self, window: WindowId) -> bool;

    /// Push new transform values and damage the window.  Ignored if no
    /// transform is attached.
    fn set_transform(&mut self, window: WindowId, transform: Transform);

    /// Register the per-frame pre/post render hooks.
    fn add_frame_hooks(&mut self);

    fn remove_frame_hooks(&mut self);

    fn schedule_redraw(&mut self);

    //  Events

    /// Next pending event, in delivery order.
    fn poll_event(&mut self) -> Option<HostEvent>;
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an in-memory
/// channel) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
