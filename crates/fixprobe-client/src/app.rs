//! Main application runner.
//!
//! Wires the simulated gateway, the send queue and the workflow controller,
//! then waits until the controller signals termination or the process is
//! interrupted.

use std::future::Future;
use std::sync::Arc;

use fixprobe_executor::SendQueue;
use fixprobe_telemetry::Metrics;
use fixprobe_workflow::{WorkflowController, EXIT_SUCCESS};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::simulator::SimulatedGateway;

/// Exit status after an interrupt (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Probe sequence completed.
    Completed { exit_code: u8 },
    /// Stopped by an external interrupt before completion.
    Interrupted,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed { exit_code } => *exit_code,
            RunOutcome::Interrupted => EXIT_INTERRUPTED,
        }
    }
}

/// Main application.
pub struct App {
    config: AppConfig,
}

impl App {
    /// Create a new application. Fails on invalid configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run until completion or Ctrl-C.
    pub async fn run(self) -> AppResult<RunOutcome> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until completion or until `interrupt` resolves.
    pub async fn run_until(self, interrupt: impl Future<Output = ()>) -> AppResult<RunOutcome> {
        let AppConfig {
            workflow,
            sessions,
            gateway,
            ..
        } = self.config;

        info!(
            sessions = ?sessions.session_ids(),
            pacing_ms = workflow.pacing_ms,
            symbol = %workflow.order.symbol,
            "Starting fixprobe"
        );

        let engine = Arc::new(SimulatedGateway::new(gateway, sessions.clone()));
        let queue = Arc::new(SendQueue::spawn(engine.clone(), workflow.pacing()));
        let controller = Arc::new(WorkflowController::new(workflow, sessions, queue.clone()));
        let shutdown = controller.shutdown_token();

        engine.start(controller.clone());

        let outcome = tokio::select! {
            _ = shutdown.cancelled() => RunOutcome::Completed {
                exit_code: controller.exit_code().unwrap_or(EXIT_SUCCESS),
            },
            _ = interrupt => {
                info!("Shutdown signal received");
                RunOutcome::Interrupted
            }
        };

        // Cleanup
        info!(?outcome, phase = %controller.phase(), "Shutting down");
        queue.drain().await;
        engine.shutdown().await;

        match Metrics::snapshot() {
            Ok(snapshot) => debug!(%snapshot, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }

        Ok(outcome)
    }
}
