use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::error::InputError;
use crate::core::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordOrigin {
    TopLeft,
    BottomLeft,
}

impl CoordOrigin {
    pub fn parse(value: &str) -> Result<Self, InputError> {
        match value.to_ascii_uppercase().as_str() {
            "TOPLEFT" => Ok(CoordOrigin::TopLeft),
            "BOTTOMLEFT" => Ok(CoordOrigin::BottomLeft),
            _ => Err(InputError::UnknownOrigin(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TableBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

/// One detected table as written by the structure detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    #[serde(default)]
    pub page: Option<u32>,
    pub bbox: TableBox,
    #[serde(default)]
    pub coord_origin: Option<String>,
}

impl TableRecord {
    /// Table bounds in top-left, Y-down page coordinates.
    pub fn region(&self, page_height: f64) -> Result<Rect, InputError> {
        let origin = match &self.coord_origin {
            Some(o) => CoordOrigin::parse(o)?,
            None => CoordOrigin::TopLeft,
        };
        let TableBox { l, t, r, b } = self.bbox;
        let (t, b) = match origin {
            CoordOrigin::TopLeft => (t, b),
            CoordOrigin::BottomLeft => (page_height - t, page_height - b),
        };
        Ok(Rect::new(l.min(r), t.min(b), l.max(r), t.max(b)))
    }
}

pub fn load_tables(path: &Path) -> Result<Vec<TableRecord>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read table metadata {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse table metadata {}", path.display()))
}

/// Regions of the tables on `page_number`, ordered top to bottom then left to right.
///
/// Records without a page number are taken to belong to every page.
pub fn table_regions(
    records: &[TableRecord],
    page_number: u32,
    page_height: f64,
) -> Result<Vec<Rect>, InputError> {
    let mut regions = records
        .iter()
        .filter(|rec| rec.page.map_or(true, |p| p == page_number))
        .map(|rec| rec.region(page_height))
        .collect::<Result<Vec<_>, _>>()?;
    regions.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));
    Ok(regions)
}

/// Picks a table by index; an index past the end means "search the whole page".
pub fn select_table(regions: &[Rect], table_index: usize) -> Option<Rect> {
    let region = regions.get(table_index).copied();
    if region.is_none() {
        log::warn!(
            "table {table_index} requested but {} detected; searching whole page",
            regions.len()
        );
    }
    region
}
