//! Article content extraction
//!
//! This module turns an arbitrary news-site HTML document into an ordered
//! sequence of typed content blocks.
//!
//! - [`dom`] - read-only document tree and traversals
//! - [`locator`] - finds the article body container
//! - [`blocks`] - classifies body children into text/image blocks
//! - [`inline`] - bold/italic run tokenizer for text blocks
//!
//! Extraction never fails: a document without a recognizable body yields a
//! single placeholder block.

pub mod blocks;
pub mod dom;
pub mod inline;
pub mod locator;

pub use blocks::{BlockExtractor, ContentBlock, ExtractionResult, ImageBlock, TextBlock};
pub use dom::{parse_document, DocumentNode, Element};
pub use inline::{tokenize, InlineRun, RunStyle};
pub use locator::ContentLocator;

use crate::config::ExtractionSettings;

/// Full extraction pipeline: parse, locate, extract
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    locator: ContentLocator,
    blocks: BlockExtractor,
}

impl ContentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an extractor from configuration
    pub fn from_settings(settings: &ExtractionSettings) -> Self {
        Self {
            locator: ContentLocator::with_signatures(settings.content_signatures.iter().cloned()),
            blocks: BlockExtractor::with_settings(
                settings.gallery_marker.clone(),
                settings.placeholder.clone(),
            ),
        }
    }

    pub fn locator(&self) -> &ContentLocator {
        &self.locator
    }

    /// Extract content blocks from raw HTML
    ///
    /// # Examples
    ///
    /// ```
    /// use vnews::parser::{ContentExtractor, InlineRun};
    ///
    /// let html = r#"<div class="fck_detail"><p>Hello <b>World</b></p></div>"#;
    /// let result = ContentExtractor::new().extract(html);
    ///
    /// let block = result.text_blocks().next().unwrap();
    /// assert_eq!(block.plain_text, "Hello World");
    /// assert_eq!(block.runs, vec![InlineRun::plain("Hello "), InlineRun::bold("World")]);
    /// ```
    pub fn extract(&self, html: &str) -> ExtractionResult {
        let root = parse_document(html);
        self.extract_tree(&root)
    }

    /// Extract content blocks from an already parsed document
    pub fn extract_tree(&self, root: &DocumentNode) -> ExtractionResult {
        let body = self.locator.locate(root);
        let result = self.blocks.extract(body);

        let fallback = body.is_none() || self.is_placeholder(&result);
        crate::metrics::record_extraction(&result, fallback);

        tracing::debug!(
            found = body.is_some(),
            blocks = result.blocks.len(),
            fallback,
            "Extracted article content"
        );

        result
    }

    /// Whether `result` is the placeholder emitted when nothing was found
    pub fn is_placeholder(&self, result: &ExtractionResult) -> bool {
        matches!(
            result.blocks.as_slice(),
            [ContentBlock::Text(block)] if block.plain_text == self.blocks.placeholder()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_hello_world() {
        let html = r#"<div class="fck_detail"><p>Hello <b>World</b></p></div>"#;
        let result = ContentExtractor::new().extract(html);

        assert_eq!(
            result.blocks,
            vec![ContentBlock::Text(TextBlock {
                plain_text: "Hello World".to_string(),
                runs: vec![InlineRun::plain("Hello "), InlineRun::bold("World")],
            })]
        );
    }

    #[test]
    fn test_not_found_is_placeholder() {
        let extractor = ContentExtractor::new();
        let result = extractor.extract("<html><body><p>orphan</p></body></html>");
        assert!(extractor.is_placeholder(&result));
    }

    #[test]
    fn test_idempotent() {
        let html = r#"<article class="article__body"><h2>H</h2><figure><img src="x"></figure></article>"#;
        let extractor = ContentExtractor::new();
        assert_eq!(extractor.extract(html), extractor.extract(html));
    }

    #[test]
    fn test_from_settings() {
        let settings = ExtractionSettings {
            content_signatures: vec!["story".to_string()],
            gallery_marker: "slides".to_string(),
            placeholder: "none".to_string(),
        };
        let extractor = ContentExtractor::from_settings(&settings);

        let result = extractor.extract(r#"<div class="fck_detail"><p>x</p></div>"#);
        assert_eq!(result.first_text(), Some("none"));

        let result = extractor.extract(r#"<div class="story"><p>x</p></div>"#);
        assert_eq!(result.first_text(), Some("x"));
    }
}
