use std::io::{self, stdout, Stdout};

use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Owns the terminal while the dashboard is up.
#[derive(Debug)]
pub struct RenderEngine {
    terminal: Tui,
}

impl RenderEngine {
    pub fn init_render_engine() -> io::Result<RenderEngine> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(RenderEngine { terminal })
    }

    pub fn deinit_render_engine(self) -> io::Result<()> {
        disable_raw_mode()?;
        stdout().execute(LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn render<F>(&mut self, render_fn: F) -> io::Result<CompletedFrame>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(render_fn)
    }
}
