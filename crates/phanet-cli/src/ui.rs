use indicatif::{ProgressBar, ProgressStyle};
use phanet::engine::progress::{Progress, ProgressCallback};
use std::sync::Mutex;
use std::time::Duration;

/// Renders core progress events as an indicatif spinner on stderr.
pub struct CliProgressHandler {
    state: Mutex<BarState>,
}

#[derive(Default)]
struct BarState {
    active_bar: Option<ProgressBar>,
    phase: String,
    sweeps: u64,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BarState::default()),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'_> {
        Box::new(move |event| self.handle(event))
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn handle(&self, event: Progress) {
        let mut state = self.state.lock().unwrap();
        match event {
            Progress::PhaseStart { name } => {
                if let Some(bar) = state.active_bar.take() {
                    bar.finish_and_clear();
                }
                let bar = ProgressBar::new_spinner();
                bar.enable_steady_tick(Duration::from_millis(80));
                bar.set_style(Self::spinner_style());
                bar.set_message(name.to_string());
                state.phase = name.to_string();
                state.sweeps = 0;
                state.active_bar = Some(bar);
            }
            Progress::PhaseFinish => {
                if let Some(bar) = state.active_bar.take() {
                    bar.finish_and_clear();
                }
            }
            Progress::SweepStart { .. } => {
                state.sweeps += 1;
            }
            Progress::SweepFinish { mean_shift } => {
                let (phase, sweeps) = (state.phase.clone(), state.sweeps);
                if let Some(bar) = &state.active_bar {
                    bar.set_message(format!(
                        "{phase}: sweep {sweeps}, mean shift {mean_shift:.6}"
                    ));
                }
            }
            Progress::Message(message) => {
                if let Some(bar) = &state.active_bar {
                    bar.println(message);
                } else {
                    eprintln!("{message}");
                }
            }
        }
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
