use common::{observe_error_message, project, Indicator, ProgressView, StageDisplay, StatusSnapshot};
use poller::EngineState;
use std::io::{self, Write};
use tracing::warn;

const BAR_WIDTH: usize = 30;

/// Dibuja los estados del motor como líneas de texto.
///
/// Sólo redibuja cuando la vista cambia; los errores transitorios se loguean
/// y dejan la última vista como está.
pub struct TerminalRenderer<W: Write> {
    out: W,
    display: StageDisplay,
    last: Option<ProgressView>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, display: StageDisplay) -> Self {
        Self {
            out,
            display,
            last: None,
        }
    }

    pub fn render(&mut self, state: &EngineState) -> io::Result<()> {
        match state {
            EngineState::Idle => Ok(()),
            EngineState::Observing(snapshot) | EngineState::Terminal(snapshot) => {
                self.draw_snapshot(snapshot)
            }
            EngineState::Degraded {
                error,
                consecutive_errors,
            } => {
                warn!(
                    "no se pudo obtener el estado ({} seguidos): {}",
                    consecutive_errors, error
                );
                Ok(())
            }
            EngineState::Failed(error) => {
                writeln!(self.out, "{}", observe_error_message(error))?;
                self.out.flush()
            }
        }
    }

    pub fn draw_snapshot(&mut self, snapshot: &StatusSnapshot) -> io::Result<()> {
        let view = project(snapshot, &self.display);
        if self.last.as_ref() == Some(&view) {
            return Ok(());
        }

        writeln!(self.out, "{}", view.title)?;
        for indicator in &view.indicators {
            match indicator {
                Indicator::Indeterminate => {
                    writeln!(self.out, "  {:<12} [{}]", "", "~".repeat(BAR_WIDTH))?;
                }
                Indicator::Determinate { name, percent } => {
                    let filled = (((percent / 100.0) * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
                    writeln!(
                        self.out,
                        "  {:<12} [{}{}] {}%",
                        name,
                        "#".repeat(filled),
                        " ".repeat(BAR_WIDTH - filled),
                        percent
                    )?;
                }
            }
        }
        self.out.flush()?;

        self.last = Some(view);
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
