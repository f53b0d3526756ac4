//! Applies [`Command`]s to a session running on the headless host.

use crate::command::{Command, InputEvent, Key, MouseButton, Point, PressState, WorkspaceCoord};
use crate::headless::host::HeadlessHost;
use crate::session::ScaleSession;
use crate::traits::WindowHost;
use log::{debug, info};

/// Owns the session and translates daemon commands into host mutations
/// and input events.
pub struct Driver {
    session: ScaleSession<HeadlessHost>,
}

impl Driver {
    pub fn new(session: ScaleSession<HeadlessHost>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ScaleSession<HeadlessHost> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScaleSession<HeadlessHost> {
        &mut self.session
    }

    /// Whether [`tick`](Self::tick) has animation work to do.
    pub fn wants_frames(&self) -> bool {
        self.session.wants_frames()
    }

    /// Apply one command, then let the session handle whatever events it
    /// caused.
    pub fn handle(&mut self, cmd: Command) {
        debug!("handling {:?}", cmd);
        match cmd {
            Command::Toggle => self.toggle(false),
            Command::ToggleAll => self.toggle(true),
            Command::Key(key) => self.key(key),
            Command::Click(button) => self.click(button),
            Command::PointerMotion { x, y } => self.session.host_mut().set_cursor(Point { x, y }),
            Command::Open { geometry, parent } => {
                let id = self.session.host_mut().open_window(geometry, parent);
                info!("opened {}", id);
            }
            Command::Close(window) => self.session.host_mut().destroy_window(window),
            Command::Minimize { window, minimized } => {
                self.session.host_mut().set_minimized(window, minimized)
            }
            Command::Move { window, geometry } => {
                self.session.host_mut().move_window(window, geometry)
            }
            Command::Focus(window) => self.session.host_mut().focus(window),
            Command::SwitchWorkspace { x, y } => self
                .session
                .host_mut()
                .request_workspace(WorkspaceCoord::new(x, y)),
        }
        self.session.dispatch_pending();
    }

    /// Run one frame if the session wants it.  Returns whether it did.
    pub fn tick(&mut self) -> bool {
        self.session.dispatch_pending();
        if !self.session.wants_frames() {
            return false;
        }
        self.session.frame();
        true
    }

    fn toggle(&mut self, all_workspaces: bool) {
        if !self.session.toggle(all_workspaces) {
            info!("nothing to show");
        }
    }

    fn key(&mut self, key: Key) {
        for state in [PressState::Pressed, PressState::Released] {
            let event = InputEvent::Key {
                key,
                state,
                modifiers: false,
            };
            if !self.session.handle_input(event) {
                debug!("{:?} {:?} passed through", key, state);
            }
            self.session.dispatch_pending();
        }
    }

    fn click(&mut self, button: MouseButton) {
        for state in [PressState::Pressed, PressState::Released] {
            if !self.session.handle_input(InputEvent::Button { button, state }) {
                debug!("{:?} {:?} passed through", button, state);
            }
            self.session.dispatch_pending();
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Rect, WindowId};
    use crate::config::{HeadlessConfig, ScaleConfig};
    use crate::session::Phase;
    use std::time::Duration;

    fn driver(n: usize) -> Driver {
        let mut host = HeadlessHost::new(&HeadlessConfig::default());
        for i in 0..n {
            host.open_window(Rect::new(60.0 * i as f64, 60.0, 640.0, 480.0), None);
        }
        let mut d = Driver::new(ScaleSession::new(host, ScaleConfig::default()));
        d.tick();
        d
    }

    fn run_frames(d: &mut Driver) {
        for _ in 0..200 {
            d.session_mut().host_mut().advance(Duration::from_millis(16));
            if !d.tick() {
                return;
            }
        }
        panic!("animations never settled");
    }

    fn parse(json: &str) -> Command {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn toggle_then_enter_round_trip() {
        let mut d = driver(4);
        d.handle(parse(r#""Toggle""#));
        assert!(d.session().is_active());
        run_frames(&mut d);
        assert_eq!(d.session().phase(), Phase::Active);

        d.handle(parse(r#"{"Key":"left"}"#));
        assert_eq!(d.session().current_focus(), Some(WindowId(3)));
        d.handle(parse(r#"{"Key":"Return"}"#));
        assert_eq!(d.session().phase(), Phase::Deactivating);
        assert!(!d.session().host().input_grabbed());

        run_frames(&mut d);
        assert_eq!(d.session().phase(), Phase::Inactive);
        assert_eq!(d.session().host().active_window(), Some(WindowId(3)));
        assert_eq!(d.session().host().transform_count(), 0);
    }

    #[test]
    fn toggle_with_nothing_to_show() {
        let mut d = driver(0);
        d.handle(Command::Toggle);
        assert_eq!(d.session().phase(), Phase::Inactive);
        assert!(!d.wants_frames());
    }

    #[test]
    fn windows_opened_during_overview_join_grid() {
        let mut d = driver(2);
        d.handle(Command::Toggle);
        d.handle(parse(
            r#"{"Open":{"geometry":{"x":300,"y":300,"width":500,"height":400}}}"#,
        ));
        assert_eq!(d.session().slots().count(), 3);
        d.handle(Command::Close(WindowId(1)));
        assert_eq!(d.session().slots().count(), 2);
        assert!(d.session().is_active());
    }

    #[test]
    fn click_on_window_selects_it() {
        let mut d = driver(2);
        d.handle(Command::Toggle);
        run_frames(&mut d);
        let shown = d.session().host().displayed_geometry(WindowId(1)).unwrap();
        let c = shown.center();
        d.handle(Command::PointerMotion { x: c.x, y: c.y });
        d.handle(parse(r#"{"Click":"left"}"#));
        assert_eq!(d.session().phase(), Phase::Deactivating);
        run_frames(&mut d);
        assert_eq!(d.session().host().active_window(), Some(WindowId(1)));
    }

    #[test]
    fn tick_is_idle_without_animation() {
        let mut d = driver(1);
        assert!(!d.tick());
        let before = d.session().host().redraw_count();
        d.tick();
        assert_eq!(d.session().host().redraw_count(), before);
    }
}
