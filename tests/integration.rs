use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use ocrmatch::core::geometry::{to_absolute, to_percentage, PercentBox, Rect};
use ocrmatch::core::model::{GroundTruthBox, Match, MatchBox, PageTokens, PredictionBox, Token};
use ocrmatch::eval::annotations::preprocess_dir;
use ocrmatch::eval::{average_precision, evaluate_page, EvalConfig};
use ocrmatch::locate::Highlighter;
use ocrmatch::ocr::parse_tsv;
use ocrmatch::pipeline::{build_report, export_report, PipelineConfig, StoredPredictor, TableSelection};

fn temp_dir(prefix: &str) -> PathBuf {
    let mut out = std::env::temp_dir();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis();
    out.push(format!("{}-{}-{}", prefix, std::process::id(), now));
    out
}

fn page(tokens: Vec<Token>) -> PageTokens {
    PageTokens {
        width: 612.0,
        height: 792.0,
        tokens,
    }
}

/// Scenario: two adjacent OCR words form the queried sentence
#[test]
fn test_locates_sentence_across_tokens() {
    let tokens = vec![
        Token::new("total", Rect::new(0.0, 0.0, 40.0, 10.0), 90),
        Token::new("assets", Rect::new(42.0, 0.0, 90.0, 10.0), 90),
    ];
    let rects = Highlighter::default().locate(&tokens, "Total Assets", None);
    assert_eq!(rects, vec![Rect::new(0.0, 0.0, 90.0, 10.0)]);
}

/// Every queried sentence gets an entry, found or not
#[test]
fn test_not_found_sentences_keep_empty_entries() -> Result<()> {
    let p = page(vec![
        Token::new("Revenue", Rect::new(100.0, 200.0, 160.0, 212.0), 88),
        Token::new("27017", Rect::new(300.0, 200.0, 340.0, 212.0), 88),
    ]);
    let sentences = vec!["Revenue".to_string(), "270.7".to_string(), "Net income".to_string()];
    let matches = Highlighter::default().highlight(&p, &sentences, None);

    assert_eq!(matches.len(), 3);
    assert!(!matches[0].bbox.is_empty());
    assert_eq!(matches[1], Match::not_found("270.7"));
    assert_eq!(matches[2], Match::not_found("Net income"));

    let json = serde_json::to_value(&matches)?;
    assert_eq!(json[1]["bbox"], serde_json::json!({}));
    assert!(json[0]["bbox"]["width"].is_number());
    Ok(())
}

/// TSV from the OCR engine flows through table-scoped localization
#[test]
fn test_tsv_tokens_with_table_region() -> Result<()> {
    let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
5\t1\t1\t1\t1\t1\t100\t100\t140\t24\t93\tRevenue\n\
5\t1\t2\t1\t1\t1\t100\t900\t140\t24\t91\tRevenue\n\
5\t1\t2\t1\t1\t2\t260\t900\t80\t24\t12\tnoise\n";
    let tokens = parse_tsv(tsv, 0.5)?;
    assert_eq!(tokens.len(), 3);

    let dir = temp_dir("ocrmatch-tables");
    fs::create_dir_all(&dir)?;
    let tables = dir.join("tables.json");
    // bottom-left origin: t=392 -> 400, b=292 -> 500 on a 792pt page
    fs::write(
        &tables,
        r#"[{"page": 1, "bbox": {"l": 0, "t": 392, "r": 612, "b": 292}, "coord_origin": "BOTTOMLEFT"}]"#,
    )?;
    let region = TableSelection { path: tables, index: 0 }.region(1, 792.0)?;
    assert_eq!(region, Some(Rect::new(0.0, 400.0, 612.0, 500.0)));

    let rects = Highlighter::default().locate(&tokens, "Revenue", region.as_ref());
    assert_eq!(rects, vec![Rect::new(50.0, 450.0, 120.0, 462.0)]);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

/// Perfect prediction on a single annotation scores exactly one
#[test]
fn test_perfect_prediction_scores_one() {
    let truth = GroundTruthBox {
        text: "Revenue".to_string(),
        rect: PercentBox { x: 50.0, y: 50.0, width: 10.0, height: 10.0 },
        page_width: 612.0,
        page_height: 792.0,
    };
    let pred = PredictionBox {
        sentence: "Revenue".to_string(),
        rect: truth.absolute(),
        confidence: 1.0,
    };
    assert_eq!(average_precision(&[pred], &[truth], 0.5), 1.0);
}

/// One of two annotations found: precision 1.0 up to recall 0.5
#[test]
fn test_half_recall_page() {
    let truth: Vec<GroundTruthBox> = [(10.0, 10.0), (60.0, 70.0)]
        .iter()
        .map(|&(x, y)| GroundTruthBox {
            text: "row".to_string(),
            rect: PercentBox { x, y, width: 20.0, height: 5.0 },
            page_width: 1000.0,
            page_height: 1000.0,
        })
        .collect();
    let first = to_absolute(&truth[0].rect, 1000.0, 1000.0);
    // shave 10% off the height: IoU 0.9
    let shaved = Rect::new(first.left, first.top, first.right, first.bottom - 5.0);
    let m = Match {
        sentence: "row".to_string(),
        bbox: MatchBox::Percent(to_percentage(&shaved, 1000.0, 1000.0)),
        confidence: None,
    };
    let score = evaluate_page(4, &[m, Match::not_found("row")], &truth, 0.5);
    assert!((score.average_precision - 6.0 / 11.0).abs() < 1e-9);
    assert_eq!(score.invalid_predictions, 1);
}

/// Stored absolute corners equal to the annotated box score exactly one
#[test]
fn test_absolute_corner_predictions_are_not_percentages() -> Result<()> {
    let truth = GroundTruthBox {
        text: "Revenue".to_string(),
        rect: PercentBox { x: 50.0, y: 50.0, width: 10.0, height: 10.0 },
        page_width: 612.0,
        page_height: 792.0,
    };
    let m: Match =
        serde_json::from_str(r#"{"sentence": "Revenue", "bbox": [306, 396, 367.2, 475.2]}"#)?;
    assert!(matches!(m.bbox, MatchBox::Absolute(_)));

    let score = evaluate_page(1, &[m], &[truth], 0.75);
    assert_eq!(score.average_precision, 1.0);
    assert_eq!(score.invalid_predictions, 0);
    Ok(())
}

/// Raw annotation export -> ground truth -> stored predictions -> report files
#[test]
fn test_preprocess_and_evaluate_stored_predictions() -> Result<()> {
    let root = temp_dir("ocrmatch-eval");
    let raw = root.join("raw");
    let gt = root.join("gt");
    let preds = root.join("preds");
    let out = root.join("out");
    fs::create_dir_all(&raw)?;
    fs::create_dir_all(&preds)?;

    fs::write(
        raw.join("annual.json"),
        r#"[{"file_upload": "f00d-annual_page_02.png", "annotations": [{"result": [
            {"id": "a", "type": "rectangle", "original_width": 600, "original_height": 800,
             "value": {"x": 10, "y": 10, "width": 20, "height": 2}},
            {"id": "a", "type": "textarea", "original_width": 600, "original_height": 800,
             "value": {"text": ["Total Assets"]}}
        ]}]}]"#,
    )?;
    assert_eq!(preprocess_dir(&raw, &gt)?, 1);

    fs::write(
        preds.join("annual.json"),
        r#"[{"page_number": 2, "matches": [
            {"sentence": "Total Assets", "bbox": {"x": 10, "y": 10, "width": 20, "height": 2}, "confidence": 0.9},
            {"sentence": "Total Assets", "bbox": [0, 0, 5]}
        ]}]"#,
    )?;

    let config = PipelineConfig::new(gt, out.clone(), EvalConfig::default());
    let predictor = StoredPredictor::load(&preds)?;
    let report = build_report(&config, &predictor)?;
    export_report(&report, &out)?;

    assert_eq!(report.total_pages, 1);
    assert_eq!(report.overall_score, 1.0);
    let page = &report.per_document_scores[0].per_page_scores[0];
    assert_eq!(page.page_number, 2);
    assert_eq!(page.invalid_predictions, 1);

    assert_eq!(report.per_page_scores.len(), 1);
    assert_eq!(report.per_page_scores[0].document, "annual");
    assert_eq!(report.per_page_scores[0].page_number, 2);

    let contents = fs::read_to_string(out.join("report.json"))?;
    assert!(contents.contains("\"overall_score\": 1.0"));
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    assert_eq!(json["per_page_scores"][0]["average_precision"], 1.0);
    assert!(fs::read_to_string(out.join("report.txt"))?.contains("OVERALL_MEAN"));

    let _ = fs::remove_dir_all(&root);
    Ok(())
}
