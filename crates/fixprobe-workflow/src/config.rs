//! Workflow configuration.

use std::time::Duration;

use fixprobe_core::Quantity;
use fixprobe_executor::OrderParams;
use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

/// Parameters of the invalid new-order probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidOrderParams {
    /// Quantity the gateway must refuse. Default: "10000000000000".
    #[serde(default = "default_invalid_quantity")]
    pub quantity: String,
}

fn default_invalid_quantity() -> String {
    "10000000000000".to_string()
}

impl Default for InvalidOrderParams {
    fn default() -> Self {
        Self {
            quantity: default_invalid_quantity(),
        }
    }
}

/// Workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Delay before each outbound send in milliseconds. Default: 2000.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// The order created, queried and cancelled.
    #[serde(default)]
    pub order: OrderParams,

    /// Overrides applied to `order` for the invalid-create probe.
    #[serde(default)]
    pub invalid_order: InvalidOrderParams,
}

fn default_pacing_ms() -> u64 {
    2_000
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            order: OrderParams::default(),
            invalid_order: InvalidOrderParams::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Parameters of the invalid-create probe order.
    pub fn invalid_order_params(&self) -> OrderParams {
        self.order.with_quantity(self.invalid_order.quantity.as_str())
    }

    /// Check that the primary order can be built.
    ///
    /// The invalid-order quantity is not checked: an unbuildable probe is a
    /// legitimate configuration and is logged when it fires.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.order.symbol.trim().is_empty() {
            return Err(WorkflowError::Config("order.symbol is empty".to_string()));
        }
        Quantity::parse(&self.order.quantity)?;
        if self.order.order_type.requires_price() {
            fixprobe_core::Price::parse(&self.order.price)?;
        }
        Ok(())
    }
}
