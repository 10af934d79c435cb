use std::sync::Arc;

use autoos_config::ocr::OcrConfig;
use autoos_types::{MatchResult, OcrToken};

use crate::capture::CapturedImage;
use crate::error::{Error, Result};
use crate::recognizer::{TesseractCli, TextRecognizer};
use crate::resolver::DependencyResolver;

/// Finds text on a captured image, one recognized token at a time.
///
/// Matching never spans tokens: a phrase the engine split into two words
/// will not match even though it is visible.
pub struct TextLocator {
    recognizer: Arc<dyn TextRecognizer>,
}

impl TextLocator {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn tesseract(config: &OcrConfig) -> Self {
        Self::new(Arc::new(TesseractCli::new(config)))
    }

    /// Tokens in reading order. Fails with `DependencyUnavailable` unless
    /// the resolver has verified the engine.
    pub async fn tokens(
        &self,
        resolver: &DependencyResolver,
        image: &CapturedImage,
    ) -> Result<Vec<OcrToken>> {
        let engine = resolver.executable().ok_or(Error::DependencyUnavailable)?;

        if image.is_empty() {
            tracing::debug!("Empty capture, nothing to recognize");
            return Ok(Vec::new());
        }

        let tokens = self.recognizer.recognize(engine, &image.pixels).await?;
        tracing::debug!("Recognized {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Tokens whose text contains `query`, ignoring case. No match is an empty result.
    pub async fn locate(
        &self,
        resolver: &DependencyResolver,
        image: &CapturedImage,
        query: &str,
    ) -> Result<Vec<MatchResult>> {
        let tokens = self.tokens(resolver, image).await?;
        let matches = match_tokens(&tokens, query);
        tracing::info!("Found {} match(es) for '{}'", matches.len(), query);
        Ok(matches)
    }

    /// Whole-image text as laid out by the engine
    pub async fn text(&self, resolver: &DependencyResolver, image: &CapturedImage) -> Result<String> {
        let engine = resolver.executable().ok_or(Error::DependencyUnavailable)?;
        if image.is_empty() {
            return Ok(String::new());
        }

        let text = self.recognizer.read_text(engine, &image.pixels).await?;
        tracing::info!("Extracted {} chars of text", text.len());
        Ok(text)
    }
}

/// Case-insensitive substring test per token, preserving token order
pub fn match_tokens(tokens: &[OcrToken], query: &str) -> Vec<MatchResult> {
    let needle = query.to_lowercase();

    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| !token.text.is_empty() && token.text.to_lowercase().contains(&needle))
        .map(|(index, token)| MatchResult {
            index,
            token: token.clone(),
        })
        .collect()
}
