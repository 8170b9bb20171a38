// engine.rs

use ratatui::Frame;

use super::input::EvalInput;

pub trait Engine {
    /// Returns true once the loop should stop.
    fn tick(&mut self, input: Option<EvalInput>) -> anyhow::Result<bool>;
    fn render_frame(&self, frame: &mut Frame);
}
