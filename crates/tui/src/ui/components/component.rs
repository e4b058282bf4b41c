//! Component trait shared by the panels of the main view.
//!
//! Panels keep no state of their own beyond what lives on [`App`]; they react
//! to keys routed to them while focused and draw themselves into a `Rect`.

use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use crate::app::{App, Effect};

pub(crate) trait Component {
    /// Handle a key routed to this panel while it has focus.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);
}
