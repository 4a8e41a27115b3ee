//! Message-passing runtime around the sizing engine
//!
//! The runtime is the single writer of engine state. Collaborators push
//! [`EngineEvent`]s into an inbound queue and read [`EngineOutput`]s from an
//! outbound queue; nothing else touches the engine.

use crate::core::engine::{ReversalEvent, SizingEngine};
use crate::models::decision::Decision;
use crate::models::market::{PriceTick, SignalEvent};
use crate::models::outcome::TradeOutcome;
use crate::models::risk::RiskBudget;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Inputs from market-data, signal-source and execution collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Tick(PriceTick),
    Signal(SignalEvent),
    Outcome {
        instrument: String,
        outcome: TradeOutcome,
    },
    Budget(RiskBudget),
    Atr {
        instrument: String,
        value: f64,
    },
    Evaluate {
        instrument: String,
        #[serde(default)]
        success_probability: Option<f64>,
    },
    SessionReset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineOutput {
    Decision {
        instrument: String,
        decision: Decision,
    },
    Reversal(ReversalEvent),
    SignalExpired(SignalEvent),
}

pub struct EngineRuntime {
    engine: SizingEngine,
}

impl EngineRuntime {
    pub fn new(engine: SizingEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SizingEngine {
        &self.engine
    }

    /// Apply one event and collect what it produced.
    pub fn handle(&mut self, event: EngineEvent) -> Vec<EngineOutput> {
        match event {
            EngineEvent::Tick(tick) => {
                let report = self.engine.on_tick(&tick);
                report
                    .reversals
                    .into_iter()
                    .map(EngineOutput::Reversal)
                    .chain(report.expired.into_iter().map(EngineOutput::SignalExpired))
                    .collect()
            }
            EngineEvent::Signal(signal) => {
                self.engine.add_signal(signal);
                Vec::new()
            }
            EngineEvent::Outcome { instrument, outcome } => {
                self.engine.record_outcome(&instrument, outcome);
                Vec::new()
            }
            EngineEvent::Budget(budget) => {
                self.engine.update_budget(budget);
                Vec::new()
            }
            EngineEvent::Atr { instrument, value } => {
                self.engine.set_atr(&instrument, value);
                Vec::new()
            }
            EngineEvent::Evaluate {
                instrument,
                success_probability,
            } => {
                let decision = self.engine.evaluate(&instrument, success_probability);
                vec![EngineOutput::Decision { instrument, decision }]
            }
            EngineEvent::SessionReset => {
                self.engine.reset_session();
                Vec::new()
            }
        }
    }

    /// Run on a tokio task until the inbound queue closes.
    ///
    /// The handle resolves to the engine so callers can inspect final state.
    pub fn spawn(
        self,
        inbound: mpsc::Receiver<EngineEvent>,
        outbound: mpsc::Sender<EngineOutput>,
    ) -> JoinHandle<SizingEngine> {
        tokio::spawn(self.run(inbound, outbound))
    }

    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<EngineEvent>,
        outbound: mpsc::Sender<EngineOutput>,
    ) -> SizingEngine {
        info!("EngineRuntime: started");

        while let Some(event) = inbound.recv().await {
            for output in self.handle(event) {
                if outbound.send(output).await.is_err() {
                    warn!("EngineRuntime: output channel closed, stopping");
                    return self.engine;
                }
            }
        }

        info!("EngineRuntime: inbound channel closed, stopping");
        self.engine
    }
}
