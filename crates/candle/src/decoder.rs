//! Incremental token decoding.
//!
//! Decoding token-by-token can split multi-byte characters, so text is
//! only released once the tail of the sequence decodes cleanly past the
//! previous boundary.

use anyhow::Result;
use std::sync::Arc;

/// Streams decoded text out of a growing token sequence.
pub struct Decoder {
    tokenizer: Arc<tokenizers::Tokenizer>,
    tokens: Vec<u32>,
    prev_index: usize,
    current_index: usize,
}

impl Decoder {
    /// Create an empty decoder over the given tokenizer.
    pub fn new(tokenizer: Arc<tokenizers::Tokenizer>) -> Self {
        Self {
            tokenizer,
            tokens: Vec::new(),
            prev_index: 0,
            current_index: 0,
        }
    }

    /// Push a sampled token, returning any newly decodable text.
    pub fn push(&mut self, token: u32) -> Result<Option<String>> {
        let prev_text = self.decode(&self.tokens[self.prev_index..self.current_index])?;
        self.tokens.push(token);

        let text = self.decode(&self.tokens[self.prev_index..])?;
        if text.len() > prev_text.len() && !text.ends_with('\u{fffd}') {
            let fresh = text[prev_text.len()..].to_owned();
            self.prev_index = self.current_index;
            self.current_index = self.tokens.len();
            Ok(Some(fresh))
        } else {
            Ok(None)
        }
    }

    /// Decode anything still held back.
    pub fn flush(&mut self) -> Result<Option<String>> {
        let prev_text = self.decode(&self.tokens[self.prev_index..self.current_index])?;
        let text = self.decode(&self.tokens[self.prev_index..])?;
        if text.len() > prev_text.len() {
            Ok(Some(text[prev_text.len()..].to_owned()))
        } else {
            Ok(None)
        }
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| anyhow::anyhow!("decode failed: {e}"))
    }
}
