//! Declared tool schemas and argument validation.

use serde::Deserialize;
use serde_json::json;

use chatrelay_chat::{FunctionCall, FunctionSpec};
use chatrelay_core::{Error, Result};

pub const PRICE_TOOL_NAME: &str = "get_crypto_price";

/// Schema for the price tool as declared to the completion API.
pub fn price_tool_spec() -> FunctionSpec {
    FunctionSpec {
        name: PRICE_TOOL_NAME.to_string(),
        description: "Get the current price of a cryptocurrency in USD".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "currency": {
                    "type": "string",
                    "description": "The cryptocurrency id, e.g. bitcoin or ethereum"
                }
            },
            "required": ["currency"]
        }),
    }
}

/// Every tool this server can run, with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetCryptoPrice { currency: String },
}

#[derive(Deserialize)]
struct PriceArgs {
    currency: String,
}

impl ToolCall {
    /// Map a model-requested call onto a known tool.
    pub fn parse(call: &FunctionCall) -> Result<Self> {
        match call.name.as_str() {
            PRICE_TOOL_NAME => {
                let args: PriceArgs = serde_json::from_str(&call.arguments).map_err(|e| {
                    Error::Tool(format!("Invalid arguments for {}: {}", PRICE_TOOL_NAME, e))
                })?;
                let currency = args.currency.trim().to_lowercase();
                if currency.is_empty() {
                    return Err(Error::Tool("currency must not be empty".into()));
                }
                Ok(ToolCall::GetCryptoPrice { currency })
            }
            other => Err(Error::Tool(format!("Unknown tool: {}", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetCryptoPrice { .. } => PRICE_TOOL_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &str) -> FunctionCall {
        FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn test_parse_price_call() {
        let parsed = ToolCall::parse(&call(PRICE_TOOL_NAME, r#"{"currency": " Bitcoin "}"#)).unwrap();
        assert_eq!(
            parsed,
            ToolCall::GetCryptoPrice {
                currency: "bitcoin".into()
            }
        );
        assert_eq!(parsed.name(), PRICE_TOOL_NAME);
    }

    #[test]
    fn test_rejects_unknown_tool() {
        let err = ToolCall::parse(&call("delete_everything", "{}")).unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        for args in ["{}", r#"{"currency": 5}"#, "not json", r#"{"currency": ""}"#] {
            let result = ToolCall::parse(&call(PRICE_TOOL_NAME, args));
            assert!(matches!(result, Err(Error::Tool(_))), "accepted {}", args);
        }
    }

    #[test]
    fn test_spec_requires_currency() {
        let spec = price_tool_spec();
        assert_eq!(spec.name, PRICE_TOOL_NAME);
        assert_eq!(spec.parameters["required"][0], "currency");
        assert_eq!(spec.parameters["properties"]["currency"]["type"], "string");
    }
}
