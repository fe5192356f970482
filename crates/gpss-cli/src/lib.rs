//! Driver surface for the GPSS engine.
//!
//! A [`Session`] holds a run configuration, takes model text, runs it to
//! completion and keeps the last report (or the reason the model was
//! rejected) for printing.

use gpss_core::engine::Simulation;
use gpss_core::sim::SimConfig;
use gpss_model::{ConfigError, ParseErrors, parse_deck};
use gpss_report::Report;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseErrors),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("termination count must be positive, got {0}")]
    TerminationCount(i64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Runs models and keeps the outcome of the last one.
#[derive(Debug, Default)]
pub struct Session {
    config: SimConfig,
    report: Option<Report>,
    rejection: Option<String>,
}

impl Session {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            report: None,
            rejection: None,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Parse and run `model_text` with the given termination count.
    /// Returns `false` if the model was rejected; the reasons are in
    /// [`report`](Self::report).
    pub fn simulate(&mut self, model_text: &str, termination_count: i64) -> bool {
        self.run(model_text, Some(termination_count)).is_ok()
    }

    /// Parse and run a deck. The termination count comes from the argument,
    /// then the deck's START statement, then the configuration.
    pub fn run(&mut self, model_text: &str, termination_count: Option<i64>) -> Result<&Report, SessionError> {
        match self.execute(model_text, termination_count) {
            Ok(report) => {
                self.rejection = None;
                Ok(&*self.report.insert(report))
            }
            Err(err) => {
                warn!(error = %err, "model rejected");
                self.report = None;
                self.rejection = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn execute(&self, model_text: &str, termination_count: Option<i64>) -> Result<Report, SessionError> {
        let deck = parse_deck(model_text)?;
        let count = termination_count
            .or(deck.start)
            .unwrap_or(self.config.termination_count);
        if count <= 0 {
            return Err(SessionError::TerminationCount(count));
        }
        let config = SimConfig {
            termination_count: count,
            ..self.config.clone()
        };
        let target = config.target_time;
        let mut sim = Simulation::new(deck.model, config);
        let summary = sim.simulate(target);
        info!(
            clock = summary.clock,
            reason = ?summary.stop_reason,
            degraded = summary.is_degraded(),
            "run complete"
        );
        Ok(Report::capture(&sim))
    }

    /// The last report, if the last model ran.
    pub fn last_report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Text of the last outcome: the report, or why the model was rejected.
    pub fn report(&self) -> String {
        match (&self.report, &self.rejection) {
            (Some(report), _) => report.render_text(),
            (None, Some(reason)) => format!("MODEL REJECTED\n{reason}\n"),
            (None, None) => "NO RUN\n".to_string(),
        }
    }
}
