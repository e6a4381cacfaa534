//! Output formatting for the CLI.

use serde::Serialize;
use topup_core::Money;

/// Prints either human-readable text or pretty JSON.
#[derive(Debug, Clone)]
pub struct Output {
    json: bool,
    currency_symbol: String,
}

impl Output {
    pub fn new(json: bool, currency_symbol: impl Into<String>) -> Self {
        Output {
            json,
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Formats an amount with the configured currency symbol.
    pub fn money(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }

    /// Prints a value as JSON.
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", msg);
        println!("{}", "─".repeat(msg.chars().count()));
    }

    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("✓ {}", msg);
    }

    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("  {}", msg);
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {:<16} {}", format!("{}:", key), value);
    }

    /// Prints an error to stderr, as `{"error": ...}` in JSON mode.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("✗ {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_uses_configured_symbol() {
        let out = Output::new(false, "IDR");
        assert_eq!(out.money(Money::from_units(150_000)), "IDR 150.000");
    }
}
