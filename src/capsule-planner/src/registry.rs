//! Token list backed registry.

use std::collections::HashMap;

use capsule_types::{AssetId, Token, TokenRegistry};
use serde::Deserialize;

use crate::errors::RegistryError;

/// `{ "tokens": [...] }`, the Uniswap token-list shape.
#[derive(Deserialize)]
struct TokenListFile {
    tokens: Vec<Token>,
}

/// In-memory token registry. The native token is always present.
#[derive(Clone, Debug)]
pub struct TokenList {
    tokens: HashMap<AssetId, Token>,
}

impl Default for TokenList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TokenList {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut by_id: HashMap<AssetId, Token> = tokens
            .into_iter()
            .map(|token| (token.address, token))
            .collect();
        by_id.entry(AssetId::Native).or_insert_with(Token::native);
        Self { tokens: by_id }
    }

    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let file: TokenListFile = serde_json::from_str(raw)?;
        Ok(Self::new(file.tokens))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenRegistry for TokenList {
    fn lookup(&self, id: &AssetId) -> Option<Token> {
        self.tokens.get(id).cloned()
    }
}
