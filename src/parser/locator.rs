//! Article body locator
//!
//! News sites wrap the narrative body in a container whose `class` carries a
//! template-specific marker. The locator walks the document in pre-order and
//! returns the first element whose class contains any known marker, so ties
//! are broken by document position, never by marker priority.

use super::dom::{DocumentNode, Element};

/// Class markers of known site templates, highest priority first
pub const DEFAULT_CONTENT_SIGNATURES: &[&str] = &[
    "fck_detail",
    "detail-content",
    "article__body",
    "singular-content",
    "maincontent",
    "e-magazine__body",
];

/// Finds the single element holding the article body
#[derive(Debug, Clone)]
pub struct ContentLocator {
    signatures: Vec<String>,
}

impl ContentLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_signatures(DEFAULT_CONTENT_SIGNATURES.iter().copied())
    }

    /// Build a locator from a custom signature list (priority order)
    pub fn with_signatures<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            signatures: signatures
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    /// The highest-priority signature contained in the element's class, if any
    pub fn matching_signature(&self, element: &Element) -> Option<&str> {
        let class = element.attr("class")?;
        self.signatures
            .iter()
            .find(|signature| class.contains(signature.as_str()))
            .map(String::as_str)
    }

    /// First element in pre-order whose class matches any signature
    pub fn locate<'a>(&self, root: &'a DocumentNode) -> Option<&'a Element> {
        let found = root.locate(|element| self.matching_signature(element).is_some());

        match found {
            Some(element) => tracing::debug!(
                tag = element.tag_name(),
                signature = self.matching_signature(element).unwrap_or_default(),
                "Located content container"
            ),
            None => tracing::debug!("No content container matched"),
        }

        found
    }
}

impl Default for ContentLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::parse_document;

    #[test]
    fn test_locates_known_container() {
        let root = parse_document(
            r#"<div class="header">menu</div><article class="fck_detail width_common"><p>x</p></article>"#,
        );
        let body = ContentLocator::new().locate(&root).unwrap();
        assert!(body.is("article"));
        assert_eq!(body.text(), "x");
    }

    #[test]
    fn test_first_match_in_document_order_wins_over_priority() {
        // "maincontent" ranks below "fck_detail" but appears first.
        let root = parse_document(
            r#"<div class="maincontent"><p>first</p></div><div class="fck_detail"><p>second</p></div>"#,
        );
        let body = ContentLocator::new().locate(&root).unwrap();
        assert_eq!(body.text(), "first");
    }

    #[test]
    fn test_outer_container_wins_over_nested_one() {
        let root = parse_document(
            r#"<div class="detail-content"><div class="fck_detail"><p>inner</p></div></div>"#,
        );
        let body = ContentLocator::new().locate(&root).unwrap();
        assert_eq!(body.attr("class"), Some("detail-content"));
    }

    #[test]
    fn test_class_containment_is_substring_based() {
        let root = parse_document(r#"<section class="page-maincontent-wrapper">ok</section>"#);
        assert!(ContentLocator::new().locate(&root).is_some());
    }

    #[test]
    fn test_not_found() {
        let root = parse_document(r#"<div class="sidebar"><p>nothing</p></div><p class="">x</p>"#);
        assert!(ContentLocator::new().locate(&root).is_none());
    }

    #[test]
    fn test_custom_signatures() {
        let locator = ContentLocator::with_signatures(["story-body", ""]);
        assert_eq!(locator.signatures(), &["story-body".to_string()]);

        let root = parse_document(r#"<div class="story-body"><p>x</p></div>"#);
        assert!(locator.locate(&root).is_some());
    }

    #[test]
    fn test_matching_signature_reports_priority() {
        let element = Element::new("div").with_attr("class", "maincontent fck_detail");
        assert_eq!(
            ContentLocator::new().matching_signature(&element),
            Some("fck_detail")
        );
    }

    #[test]
    fn test_deterministic() {
        let html = r#"<div class="a"><div class="article__body"><p>1</p></div></div>"#;
        let root = parse_document(html);
        let locator = ContentLocator::new();
        assert_eq!(locator.locate(&root), locator.locate(&parse_document(html)));
    }
}
