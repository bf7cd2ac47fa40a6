//! Generation parameters.

use serde::{Deserialize, Serialize};

/// Sampling parameters for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SampleParams {
    /// Maximum number of tokens to sample.
    pub max_tokens: usize,

    /// Softmax temperature.
    pub temperature: f64,

    /// Nucleus sampling probability.
    pub top_p: f64,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let params = SampleParams {
            max_tokens: 128,
            temperature: 0.2,
            top_p: 0.95,
        };
        let json = serde_json::to_string(&params).unwrap();
        let parsed: SampleParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }
}
