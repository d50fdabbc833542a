//! Runs exactly one handler per validated tool call.

use std::sync::Arc;

use tracing::{info, warn};

use chatrelay_chat::{FunctionCall, FunctionSpec};
use chatrelay_core::Result;

use crate::price::{PriceQuote, PriceSource, PriceStatus};
use crate::schema::{price_tool_spec, ToolCall};

/// Serialized result of a tool, ready to be sent back as a function message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub name: String,
    pub content: String,
}

pub struct ToolDispatcher {
    prices: Arc<dyn PriceSource>,
}

impl ToolDispatcher {
    pub fn new(prices: Arc<dyn PriceSource>) -> Self {
        Self { prices }
    }

    /// Schemas to declare on every first-turn completion.
    pub fn descriptors(&self) -> Vec<FunctionSpec> {
        vec![price_tool_spec()]
    }

    /// Validate a model-requested call and run it.
    pub async fn dispatch_call(&self, call: &FunctionCall) -> Result<ToolOutput> {
        let tool = ToolCall::parse(call)?;
        self.dispatch(&tool).await
    }

    pub async fn dispatch(&self, tool: &ToolCall) -> Result<ToolOutput> {
        info!("Running tool {}", tool.name());
        let content = match tool {
            ToolCall::GetCryptoPrice { currency } => {
                let quote = self.quote(currency).await;
                serde_json::to_string(&quote)?
            }
        };
        Ok(ToolOutput {
            name: tool.name().to_string(),
            content,
        })
    }

    async fn quote(&self, currency: &str) -> PriceQuote {
        let price = match self.prices.usd_price(currency).await {
            Ok(Some(usd)) => PriceStatus::Available(usd),
            Ok(None) => {
                warn!("No USD price known for {}", currency);
                PriceStatus::Unavailable
            }
            Err(e) => {
                warn!("Price lookup for {} failed: {}", currency, e);
                PriceStatus::Unavailable
            }
        };
        PriceQuote {
            currency: currency.to_string(),
            price,
        }
    }
}
