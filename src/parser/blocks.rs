//! Block extraction from a located article body
//!
//! Walks the direct element children of the body in document order and turns
//! each into zero or more [`ContentBlock`]s:
//!
//! | Child | Result |
//! |-------|--------|
//! | `p`, `h1`, `h2`, `h3` | one text block, if its text is non-empty |
//! | `figure` | one image block from the first `img` + first `figcaption` |
//! | `div` with the gallery marker class | one image block per `img`, shared caption |
//! | anything else | ignored, not recursed into |
//!
//! An empty result, or a missing body, always collapses to a single
//! placeholder text block.

use serde::{Deserialize, Serialize};

use super::dom::Element;
use super::inline::{tokenize, InlineRun};

/// Class marker of inline photo galleries
pub const DEFAULT_GALLERY_MARKER: &str = "VCSortableInPreviewMode";

/// Text of the single block emitted when no content could be extracted
pub const DEFAULT_PLACEHOLDER: &str = "Không tìm thấy nội dung bài viết.";

const TEXT_TAGS: &[&str] = &["p", "h1", "h2", "h3"];

/// Figure image source attributes, in priority order
const FIGURE_SOURCE_ATTRS: &[&str] = &["data-src", "data-original", "src"];

/// Gallery image source attributes, in priority order
const GALLERY_SOURCE_ATTRS: &[&str] = &["data-original", "src"];

/// A paragraph or heading with inline styling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub plain_text: String,
    pub runs: Vec<InlineRun>,
}

/// An image with an optional caption (empty when absent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub source_url: String,
    pub caption: String,
}

/// One unit of normalized article content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text(TextBlock),
    Image(ImageBlock),
}

impl ContentBlock {
    /// Text block with a single plain run
    pub fn plain_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::Text(TextBlock {
            runs: vec![InlineRun::plain(text.clone())],
            plain_text: text,
        })
    }

    pub fn image(source_url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::Image(ImageBlock {
            source_url: source_url.into(),
            caption: caption.into(),
        })
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Self::Text(block) => Some(block),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageBlock> {
        match self {
            Self::Image(block) => Some(block),
            Self::Text(_) => None,
        }
    }
}

/// Ordered blocks extracted from one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub blocks: Vec<ContentBlock>,
}

impl ExtractionResult {
    /// Single-block result carrying only `text`
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![ContentBlock::plain_text(text)],
        }
    }

    /// Plain text of the first text block, usable as a title fallback
    pub fn first_text(&self) -> Option<&str> {
        self.blocks
            .iter()
            .find_map(ContentBlock::as_text)
            .map(|block| block.plain_text.as_str())
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter().filter_map(ContentBlock::as_text)
    }

    pub fn image_blocks(&self) -> impl Iterator<Item = &ImageBlock> {
        self.blocks.iter().filter_map(ContentBlock::as_image)
    }
}

/// Classifies body children into content blocks
#[derive(Debug, Clone)]
pub struct BlockExtractor {
    gallery_marker: String,
    placeholder: String,
}

impl BlockExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_GALLERY_MARKER, DEFAULT_PLACEHOLDER)
    }

    pub fn with_settings(gallery_marker: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            gallery_marker: gallery_marker.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Extract blocks from the located body, or the placeholder when absent
    pub fn extract(&self, body: Option<&Element>) -> ExtractionResult {
        let Some(body) = body else {
            return self.fallback();
        };

        let mut blocks = Vec::new();
        for child in body.element_children() {
            self.classify(child, &mut blocks);
        }

        if blocks.is_empty() {
            tracing::debug!(tag = body.tag_name(), "Body matched but produced no blocks");
            return self.fallback();
        }

        blocks.into()
    }

    fn fallback(&self) -> ExtractionResult {
        ExtractionResult::placeholder(self.placeholder.clone())
    }

    fn classify(&self, element: &Element, out: &mut Vec<ContentBlock>) {
        let tag = element.tag_name();

        if TEXT_TAGS.contains(&tag) {
            out.extend(text_block(element));
        } else if tag == "figure" {
            out.extend(figure_block(element));
        } else if tag == "div" && element.class_contains(&self.gallery_marker) {
            out.extend(gallery_blocks(element));
        }
    }
}

impl Default for BlockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<ContentBlock>> for ExtractionResult {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self { blocks }
    }
}

fn text_block(element: &Element) -> Option<ContentBlock> {
    let plain_text = element.text().trim().to_string();
    if plain_text.is_empty() {
        return None;
    }

    Some(ContentBlock::Text(TextBlock {
        runs: tokenize(&element.inner_markup()),
        plain_text,
    }))
}

fn figure_block(figure: &Element) -> Option<ContentBlock> {
    let source = figure
        .find_first("img")
        .and_then(|img| resolve_source(img, FIGURE_SOURCE_ATTRS))?;

    Some(ContentBlock::image(source, caption_of(figure)))
}

fn gallery_blocks(gallery: &Element) -> Vec<ContentBlock> {
    let caption = caption_of(gallery);

    gallery
        .find_all("img")
        .into_iter()
        .filter_map(|img| resolve_source(img, GALLERY_SOURCE_ATTRS))
        .map(|source| ContentBlock::image(source, caption.clone()))
        .collect()
}

fn resolve_source(img: &Element, attrs: &[&str]) -> Option<String> {
    attrs
        .iter()
        .find_map(|name| img.non_empty_attr(name))
        .map(|value| value.trim().to_string())
}

fn caption_of(element: &Element) -> String {
    element
        .find_first("figcaption")
        .map(|caption| caption.text().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::parse_document;

    fn extract_body(html: &str) -> ExtractionResult {
        let root = parse_document(html);
        let body = root.locate(|el| el.class_contains("body-under-test"));
        BlockExtractor::new().extract(body)
    }

    #[test]
    fn test_missing_body_yields_placeholder() {
        let result = BlockExtractor::new().extract(None);
        assert_eq!(result, ExtractionResult::placeholder(DEFAULT_PLACEHOLDER));
    }

    #[test]
    fn test_text_blocks_keep_order_and_skip_empty() {
        let result = extract_body(
            r#"<div class="body-under-test">
                <h1>Title</h1>
                <p>   </p>
                <p>First <em>para</em></p>
                <h2>Sub</h2>
                <h4>ignored heading</h4>
                <p>Last</p>
            </div>"#,
        );

        let texts: Vec<_> = result.text_blocks().map(|b| b.plain_text.as_str()).collect();
        assert_eq!(texts, vec!["Title", "First para", "Sub", "Last"]);

        let first_para = result.text_blocks().nth(1).unwrap();
        assert_eq!(
            first_para.runs,
            vec![InlineRun::plain("First "), InlineRun::italic("para")]
        );
    }

    #[test]
    fn test_figure_source_priority() {
        let result = extract_body(
            r#"<div class="body-under-test">
                <figure><img src="a" data-src="b"><figcaption> Caption </figcaption></figure>
                <figure><img src="c" data-original="d"></figure>
                <figure><img src="e"></figure>
            </div>"#,
        );

        let images: Vec<_> = result
            .image_blocks()
            .map(|b| (b.source_url.as_str(), b.caption.as_str()))
            .collect();
        assert_eq!(images, vec![("b", "Caption"), ("d", ""), ("e", "")]);
    }

    #[test]
    fn test_empty_data_src_falls_through() {
        let result = extract_body(
            r#"<div class="body-under-test"><figure><img data-src="" src="real.jpg"></figure></div>"#,
        );
        assert_eq!(result.image_blocks().next().unwrap().source_url, "real.jpg");
    }

    #[test]
    fn test_figure_without_source_is_skipped() {
        let result = extract_body(
            r#"<div class="body-under-test"><figure><img alt="x"></figure><p>text</p></div>"#,
        );
        assert_eq!(result.blocks, vec![ContentBlock::plain_text("text")]);
    }

    #[test]
    fn test_gallery_emits_one_block_per_image_with_shared_caption() {
        let result = extract_body(
            r#"<div class="body-under-test">
                <div class="VCSortableInPreviewMode gallery">
                    <div><img data-original="g1" src="ignored"></div>
                    <img src="g2">
                    <img data-src="only-data-src">
                    <figcaption>Shared</figcaption>
                </div>
            </div>"#,
        );

        let images: Vec<_> = result
            .image_blocks()
            .map(|b| (b.source_url.as_str(), b.caption.as_str()))
            .collect();
        assert_eq!(images, vec![("g1", "Shared"), ("g2", "Shared")]);
    }

    #[test]
    fn test_plain_div_and_unknown_tags_are_ignored() {
        let result = extract_body(
            r#"<div class="body-under-test"><div><p>nested</p></div><table><tr><td>t</td></tr></table></div>"#,
        );
        assert_eq!(result, ExtractionResult::placeholder(DEFAULT_PLACEHOLDER));
    }

    #[test]
    fn test_custom_placeholder() {
        let extractor = BlockExtractor::with_settings("gallery", "nothing here");
        assert_eq!(extractor.extract(None).first_text(), Some("nothing here"));
    }

    #[test]
    fn test_block_serialization_shape() {
        let json = serde_json::to_value(ContentBlock::image("u", "c")).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source_url"], "u");

        let json = serde_json::to_value(ContentBlock::plain_text("t")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["runs"][0]["style"], "plain");
    }
}
