//! chatrelay tools: the functions the model may ask us to run.
//!
//! Tool names map to a closed `ToolCall` enum; arguments are checked
//! against the declared schema before any handler runs.

pub mod dispatcher;
pub mod price;
pub mod schema;

pub use dispatcher::{ToolDispatcher, ToolOutput};
pub use price::{CoinGeckoClient, PriceQuote, PriceSource, PriceStatus};
pub use schema::{ToolCall, PRICE_TOOL_NAME};
