use serde::{Deserialize, Serialize};

/// Per-token prices (USD) for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_token: f64,
    pub output_per_token: f64,
}

impl ModelPricing {
    /// Fallback pair for models missing from the table
    pub const DEFAULT: ModelPricing = ModelPricing {
        input_per_token: 0.00035 / 1000.0,
        output_per_token: 0.0014 / 1000.0,
    };

    pub fn for_model(model_id: &str) -> Self {
        let id = model_id.to_lowercase();
        let (input_per_m, output_per_m) = if id.contains("claude-3-5-haiku") {
            (0.80, 4.00)
        } else if id.contains("claude-3-haiku") {
            (0.25, 1.25)
        } else if id.contains("claude-3-5-sonnet") || id.contains("claude-3-sonnet") {
            (3.00, 15.00)
        } else if id.contains("nova-micro") {
            (0.035, 0.14)
        } else if id.contains("nova-lite") {
            (0.06, 0.24)
        } else if id.contains("nova-pro") {
            (0.80, 3.20)
        } else {
            return Self::DEFAULT;
        };

        Self {
            input_per_token: input_per_m / 1_000_000.0,
            output_per_token: output_per_m / 1_000_000.0,
        }
    }

    /// Cost of one call, estimating tokens as characters / 4
    pub fn estimate(&self, input_chars: usize, output_chars: usize) -> f64 {
        estimate_tokens(input_chars) * self.input_per_token
            + estimate_tokens(output_chars) * self.output_per_token
    }
}

pub fn estimate_tokens(chars: usize) -> f64 {
    chars as f64 / 4.0
}

/// Running oracle usage for one process
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostLedger {
    pub calls: u64,
    pub accumulated_cost: f64,
}

impl CostLedger {
    pub fn record(&mut self, cost: f64) {
        self.calls += 1;
        self.accumulated_cost += cost.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pricing_for_unknown_model() {
        let pricing = ModelPricing::for_model("some-vendor.unknown-model-v1");
        assert_eq!(pricing, ModelPricing::DEFAULT);
    }

    #[test]
    fn test_haiku_pricing() {
        let pricing = ModelPricing::for_model("anthropic.claude-3-haiku-20240307-v1:0");
        assert!((pricing.input_per_token - 0.25 / 1_000_000.0).abs() < 1e-15);
        assert!((pricing.output_per_token - 1.25 / 1_000_000.0).abs() < 1e-15);
    }

    #[test]
    fn test_estimate_uses_quarter_char_tokens() {
        let pricing = ModelPricing::DEFAULT;
        let cost = pricing.estimate(4000, 400);
        let expected = 1000.0 * 0.00035 / 1000.0 + 100.0 * 0.0014 / 1000.0;
        assert!((cost - expected).abs() < 1e-12);
    }

    #[test]
    fn test_failed_call_costs_only_input() {
        let pricing = ModelPricing::DEFAULT;
        assert!((pricing.estimate(400, 0) - 100.0 * pricing.input_per_token).abs() < 1e-15);
    }

    #[test]
    fn test_ledger_is_monotonic() {
        let mut ledger = CostLedger::default();
        ledger.record(0.01);
        ledger.record(0.0);
        ledger.record(-5.0);

        assert_eq!(ledger.calls, 3);
        assert!((ledger.accumulated_cost - 0.01).abs() < 1e-12);
    }
}
