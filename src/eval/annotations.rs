use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::error::InputError;
use crate::core::geometry::PercentBox;
use crate::core::model::GroundTruthBox;

/// Annotated sentences of one page. `file_name` is `<page number>.<ext>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundTruthPage {
    pub file_name: String,
    pub results: Vec<GroundTruthBox>,
}

impl GroundTruthPage {
    pub fn page_number(&self) -> Result<u32, InputError> {
        let stem = self.file_name.split('.').next().unwrap_or_default();
        stem.trim()
            .parse()
            .map_err(|_| InputError::PageNumber(self.file_name.clone()))
    }

    pub fn sentences(&self) -> Vec<String> {
        self.results.iter().map(|r| r.text.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct DocumentGroundTruth {
    pub name: String,
    pub pages: Vec<GroundTruthPage>,
}

pub fn load_document(path: &Path) -> Result<DocumentGroundTruth> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {}", path.display()))?;
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read annotations {}", path.display()))?;
    let pages: Vec<GroundTruthPage> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse annotations {}", path.display()))?;
    Ok(DocumentGroundTruth { name, pages })
}

/// Every `*.json` file in `dir`, sorted by file name.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn load_ground_truth_dir(dir: &Path) -> Result<Vec<DocumentGroundTruth>> {
    json_files(dir)?.iter().map(|p| load_document(p)).collect()
}

// Label Studio export format

#[derive(Debug, Clone, Deserialize)]
pub struct ExportItem {
    #[serde(default)]
    pub file_upload: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub result: Vec<AnnotationResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub original_width: Option<f64>,
    #[serde(default)]
    pub original_height: Option<f64>,
}

#[derive(Debug, Default)]
struct PendingBox {
    rect: Option<PercentBox>,
    text: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
}

/// Maps an uploaded image name like `report_page_003.png` to `3.png`.
pub fn page_file_name(file_upload: &str) -> Result<Option<String>, InputError> {
    let Some(part) = ["page_", "page-"]
        .iter()
        .find_map(|marker| file_upload.split_once(marker).map(|(_, rest)| rest))
    else {
        return Ok(None);
    };

    let (number, ext) = part.split_once('.').unwrap_or((part, "png"));
    let number: u32 = number
        .parse()
        .map_err(|_| InputError::PageNumber(file_upload.to_string()))?;
    Ok(Some(format!("{number}.{ext}")))
}

/// Groups a raw annotation export into per-page ground truth.
///
/// Results sharing an `id` are merged: the `rectangle` result supplies the box, the
/// `textarea` result the text. Entries missing either are dropped.
pub fn clean_export(items: &[ExportItem]) -> Result<Vec<GroundTruthPage>, InputError> {
    let mut pages: IndexMap<String, GroundTruthPage> = IndexMap::new();

    for item in items {
        let Some(upload) = item.file_upload.as_deref() else {
            continue;
        };
        let Some(file_name) = page_file_name(upload)? else {
            continue;
        };
        let page = pages
            .entry(file_name.clone())
            .or_insert_with(|| GroundTruthPage {
                file_name,
                results: Vec::new(),
            });

        for annotation in &item.annotations {
            let mut grouped: IndexMap<&str, PendingBox> = IndexMap::new();
            for result in &annotation.result {
                let (Some(id), Some(value)) = (result.id.as_deref(), result.value.as_ref()) else {
                    continue;
                };
                let pending = grouped.entry(id).or_insert_with(|| PendingBox {
                    width: result.original_width,
                    height: result.original_height,
                    ..Default::default()
                });
                match result.kind.as_str() {
                    "rectangle" => {
                        pending.rect = Some(serde_json::from_value(value.clone())?);
                    }
                    "textarea" => {
                        if let Some(texts) = value.get("text").and_then(|t| t.as_array()) {
                            let first = texts.first().and_then(|t| t.as_str()).unwrap_or_default();
                            pending.text = Some(first.to_string());
                        }
                    }
                    _ => {}
                }
            }

            for (id, pending) in grouped {
                let (Some(text), Some(rect)) = (pending.text, pending.rect) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                let (Some(page_width), Some(page_height)) = (pending.width, pending.height) else {
                    log::warn!("{}: annotation {id} has no page size, dropped", page.file_name);
                    continue;
                };
                page.results.push(GroundTruthBox {
                    text,
                    rect,
                    page_width,
                    page_height,
                });
            }
        }
    }

    Ok(pages.into_values().collect())
}

/// Cleans every export in `input` and writes the result under the same name in `output`.
pub fn preprocess_dir(input: &Path, output: &Path) -> Result<usize> {
    fs::create_dir_all(output)?;
    let files = json_files(input)?;
    for path in &files {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read export {}", path.display()))?;
        let items: Vec<ExportItem> = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse export {}", path.display()))?;
        let pages = clean_export(&items)
            .with_context(|| format!("failed to clean export {}", path.display()))?;

        let name = path.file_name().context("export path has no file name")?;
        fs::write(output.join(name), serde_json::to_string_pretty(&pages)?)?;
        log::info!("processed {} -> {} pages", path.display(), pages.len());
    }
    Ok(files.len())
}
