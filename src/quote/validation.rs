//! Synchronous input validation for quote requests

use crate::error::SwapError;
use crate::types::QuoteRequest;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Raw form values as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteInput {
    pub amount: String,
    pub from_token: String,
    pub to_token: String,
    pub slippage: String,
}

impl QuoteInput {
    pub fn new(
        amount: impl Into<String>,
        from_token: impl Into<String>,
        to_token: impl Into<String>,
        slippage: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            from_token: from_token.into(),
            to_token: to_token.into(),
            slippage: slippage.into(),
        }
    }
}

/// Parse a strictly positive amount
pub fn parse_amount(raw: &str) -> Result<Decimal, SwapError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SwapError::InvalidAmount("empty".to_string()));
    }
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| SwapError::InvalidAmount(trimmed.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(SwapError::InvalidAmount(trimmed.to_string()));
    }
    Ok(amount)
}

/// Slippage in percent, 0 inclusive to 100 exclusive
pub fn parse_slippage(raw: &str) -> Result<Decimal, SwapError> {
    let trimmed = raw.trim();
    let slippage = Decimal::from_str(trimmed)
        .map_err(|_| SwapError::InvalidAmount(format!("slippage {}", trimmed)))?;
    if slippage < Decimal::ZERO || slippage >= Decimal::ONE_HUNDRED {
        return Err(SwapError::InvalidAmount(format!("slippage {}", trimmed)));
    }
    Ok(slippage)
}

/// Turn form input into a request, or the validation error that blocks it
pub fn validate(input: &QuoteInput) -> Result<QuoteRequest, SwapError> {
    let from_token = input.from_token.trim();
    let to_token = input.to_token.trim();
    if from_token.is_empty() || to_token.is_empty() {
        return Err(SwapError::InvalidAmount("token not selected".to_string()));
    }
    if from_token == to_token {
        return Err(SwapError::SameToken);
    }

    Ok(QuoteRequest {
        from_token: from_token.to_string(),
        to_token: to_token.to_string(),
        amount: parse_amount(&input.amount)?,
        slippage: parse_slippage(&input.slippage)?,
    })
}
