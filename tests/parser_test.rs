//! Content extraction tests using HTML fixture files
//!
//! Covers the three site templates seen in production (VnExpress, Dân trí,
//! Tuổi Trẻ) plus documents without a usable body.

use proptest::prelude::*;
use std::fs;
use vnews::parser::blocks::DEFAULT_PLACEHOLDER;
use vnews::parser::inline::runs_text;
use vnews::parser::{ContentBlock, ContentExtractor, ExtractionResult, InlineRun};

/// Test fixture paths
const FIXTURES_DIR: &str = "tests/fixtures/html";

fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

fn extract_fixture(filename: &str) -> ExtractionResult {
    ContentExtractor::new().extract(&load_fixture(filename))
}

fn texts(result: &ExtractionResult) -> Vec<&str> {
    result.text_blocks().map(|b| b.plain_text.as_str()).collect()
}

// ============================================================================
// Site templates
// ============================================================================

#[test]
fn test_vnexpress_article() {
    let result = extract_fixture("vnexpress_article.html");

    assert_eq!(result.blocks.len(), 6);
    assert_eq!(
        texts(&result),
        vec![
            "Liên Bộ Công Thương - Tài chính vừa điều chỉnh giá bán lẻ xăng dầu trong kỳ điều hành hôm nay.",
            "Theo đó, giá xăng RON 95-III còn 21.570 đồng một lít & E5 RON 92 còn 20.650 đồng.",
            "Quỹ bình ổn không được trích lập",
            "Trong kỳ này, cơ quan điều hành không trích lập và không chi sử dụng Quỹ bình ổn.",
            "Anh Minh",
        ]
    );

    // The figure sits between the second paragraph and the heading.
    let image = result.blocks[2].as_image().expect("third block is the figure");
    assert_eq!(
        image.source_url,
        "https://i1-kinhdoanh.vnecdn.net/2024/xang-dau.jpg"
    );
    assert_eq!(
        image.caption,
        "Khách hàng đổ xăng tại một cửa hàng ở TP HCM. Ảnh: Quỳnh Trần"
    );
}

#[test]
fn test_vnexpress_inline_styles() {
    let result = extract_fixture("vnexpress_article.html");
    let paragraphs: Vec<_> = result.text_blocks().collect();

    assert_eq!(
        paragraphs[0].runs,
        vec![
            InlineRun::plain("Liên Bộ Công Thương - Tài chính vừa điều chỉnh giá bán lẻ "),
            InlineRun::bold("xăng dầu"),
            InlineRun::plain(" trong kỳ điều hành hôm nay."),
        ]
    );
    assert_eq!(
        paragraphs[1].runs,
        vec![
            InlineRun::plain("Theo đó, giá xăng "),
            InlineRun::italic("RON 95-III"),
            InlineRun::plain(" còn 21.570 đồng một lít & E5 RON 92 còn 20.650 đồng."),
        ]
    );
    assert_eq!(paragraphs[4].runs, vec![InlineRun::bold("Anh Minh")]);
}

#[test]
fn test_dantri_gallery() {
    let result = extract_fixture("dantri_gallery.html");

    let caption = "Hoa ban trên đường lên đèo Pha Đin (Ảnh: Hữu Nghị).";
    assert_eq!(
        result.blocks,
        vec![
            ContentBlock::plain_text("Mùa hoa ban năm nay đến sớm hơn mọi năm."),
            ContentBlock::image("https://cdn.dantri.com.vn/hoa-ban-1.jpg", caption),
            ContentBlock::image("https://cdn.dantri.com.vn/hoa-ban-2.jpg", caption),
            ContentBlock::plain_text("Du khách có thể ngắm hoa đến hết tháng tư."),
        ]
    );
}

#[test]
fn test_tuoitre_detail() {
    let result = extract_fixture("tuoitre_detail.html");

    assert_eq!(
        texts(&result),
        vec![
            "Hiệp một",
            "Phút 12, tiền đạo Tiến Linh mở tỉ số.",
            "Hiệp hai",
            "Hai bàn thắng còn lại đến ở phút 67 và phút 88.",
        ]
    );

    // A figure is a figure even when it carries the gallery class.
    let images: Vec<_> = result.image_blocks().collect();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].source_url, "https://cdn.tuoitre.vn/ban-thang.jpg");
    assert_eq!(images[0].caption, "Tiến Linh ăn mừng bàn thắng");

    let paragraphs: Vec<_> = result.text_blocks().collect();
    assert_eq!(
        paragraphs[1].runs,
        vec![
            InlineRun::plain("Phút 12, tiền đạo "),
            InlineRun::bold("Tiến Linh"),
            InlineRun::plain(" mở tỉ số."),
        ]
    );
    assert_eq!(
        paragraphs[3].runs,
        vec![
            InlineRun::plain("Hai bàn thắng còn lại đến ở "),
            InlineRun::italic("phút 67"),
            InlineRun::plain(" và "),
            InlineRun::italic("phút 88"),
            InlineRun::plain("."),
        ]
    );
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn test_page_without_body_falls_back() {
    let result = extract_fixture("no_body.html");
    assert_eq!(result, ExtractionResult::placeholder(DEFAULT_PLACEHOLDER));
}

#[test]
fn test_container_without_blocks_falls_back() {
    let result = extract_fixture("empty_container.html");
    assert_eq!(result, ExtractionResult::placeholder(DEFAULT_PLACEHOLDER));
}

#[test]
fn test_empty_and_garbage_input_fall_back() {
    let extractor = ContentExtractor::new();
    for input in ["", "   ", "not html at all", "<<<>>>", "<div class=", "\u{0}\u{1}"] {
        let result = extractor.extract(input);
        assert!(extractor.is_placeholder(&result), "input {input:?}");
    }
}

#[test]
fn test_unterminated_markup_degrades_to_plain_text() {
    let result = ContentExtractor::new()
        .extract(r#"<div class="fck_detail"><p>Giá <b>tăng mạnh</p></div>"#);
    let block = result.text_blocks().next().unwrap();

    // The parser closes the dangling <b>, so the run is still bold.
    assert_eq!(block.plain_text, "Giá tăng mạnh");
    assert_eq!(runs_text(&block.runs), "Giá tăng mạnh");
}

#[test]
fn test_nested_same_style_tags_form_one_run() {
    let result = ContentExtractor::new()
        .extract(r#"<div class="fck_detail"><p><strong>a <b>b</b> c</strong> d</p></div>"#);
    let block = result.text_blocks().next().unwrap();

    assert_eq!(block.plain_text, "a b c d");
    assert_eq!(
        block.runs,
        vec![InlineRun::bold("a b c"), InlineRun::plain(" d")]
    );
}

#[test]
fn test_deeply_nested_paragraph_is_extracted() {
    let depth = 100_000;
    let html = format!(
        r#"<div class="fck_detail"><p>{}deep{}</p></div>"#,
        "<span>".repeat(depth),
        "</span>".repeat(depth)
    );

    let result = ContentExtractor::new().extract(&html);

    assert_eq!(texts(&result), vec!["deep"]);
    assert_eq!(
        result.text_blocks().next().unwrap().runs,
        vec![InlineRun::plain("deep")]
    );
}

// ============================================================================
// Properties
// ============================================================================

fn paragraph_document(paragraphs: &[String]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(r#"<html><body><div class="fck_detail">{body}</div></body></html>"#)
}

proptest! {
    #[test]
    fn prop_extraction_is_idempotent(input in ".{0,200}") {
        let extractor = ContentExtractor::new();
        prop_assert_eq!(extractor.extract(&input), extractor.extract(&input));
    }

    #[test]
    fn prop_extraction_never_returns_empty(input in ".{0,200}") {
        let result = ContentExtractor::new().extract(&input);
        prop_assert!(!result.blocks.is_empty());
    }

    #[test]
    fn prop_paragraph_order_is_preserved(
        paragraphs in prop::collection::vec("[a-zA-Z0-9]{1,12}", 1..20)
    ) {
        let result = ContentExtractor::new().extract(&paragraph_document(&paragraphs));
        let extracted: Vec<String> = result
            .text_blocks()
            .map(|b| b.plain_text.clone())
            .collect();
        prop_assert_eq!(extracted, paragraphs);
    }

    #[test]
    fn prop_runs_reconstruct_plain_text(
        segments in prop::collection::vec(("[a-z]{1,8}", 0u8..6), 1..8)
    ) {
        let markup: String = segments
            .iter()
            .map(|(text, style)| match style {
                0 => format!("{text} "),
                1 => format!("<strong>{text}</strong> "),
                2 => format!("<em>{text}</em> "),
                3 => format!("<strong>{text} <b>{text}</b></strong> "),
                4 => format!("<b>{text} <i>{text}</i></b> "),
                _ => format!("<em><strong>{text}</strong> {text}</em> "),
            })
            .collect();
        let html = format!(r#"<div class="fck_detail"><p>{}</p></div>"#, markup.trim_end());

        let result = ContentExtractor::new().extract(&html);
        let block = result.text_blocks().next().unwrap();
        prop_assert_eq!(runs_text(&block.runs), block.plain_text.clone());
        for run in &block.runs {
            prop_assert!(!run.text.contains(['<', '>']), "markup leaked into {:?}", run);
        }
    }
}
