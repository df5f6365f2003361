use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::model::{PageTokens, Token};
use crate::ocr::tsv::parse_tsv;

static SCRATCH_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Directory that lives exactly as long as one external OCR call.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(parent: &Path) -> Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = parent.join(format!("ocr-{}-{nanos}-{seq}", std::process::id()));
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create scratch dir {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("removed scratch dir {}", self.path.display()),
            Err(e) => log::warn!("failed to remove scratch dir {}: {e}", self.path.display()),
        }
    }
}

/// Runs the `tesseract` binary on a rendered page image.
#[derive(Debug, Clone)]
pub struct OcrBridge {
    work_dir: PathBuf,
    program: PathBuf,
    lang: String,
    scale: f64,
}

impl OcrBridge {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            program: PathBuf::from("tesseract"),
            lang: "eng".to_string(),
            scale: 1.0,
        }
    }

    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    /// Factor mapping image pixels to page units, e.g. 0.5 for a page rendered at 2x.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn run(&self, image_path: &Path) -> Result<Vec<Token>> {
        let scratch = ScratchDir::create(&self.work_dir)?;
        let base = scratch.path().join("page");

        let output = Command::new(&self.program)
            .arg(image_path)
            .arg(&base)
            .arg("-l")
            .arg(&self.lang)
            .arg("tsv")
            .output()
            .with_context(|| format!("failed to invoke {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("OCR failed on {}: {stderr}", image_path.display());
        }

        let tsv_path = base.with_extension("tsv");
        let tsv = fs::read_to_string(&tsv_path)
            .with_context(|| format!("missing OCR output {}", tsv_path.display()))?;
        let tokens = parse_tsv(&tsv, self.scale)
            .with_context(|| format!("failed to parse OCR output for {}", image_path.display()))?;
        log::info!("recognized {} words in {}", tokens.len(), image_path.display());
        Ok(tokens)
    }

    pub fn page_tokens(&self, image_path: &Path, width: f64, height: f64) -> Result<PageTokens> {
        Ok(PageTokens {
            width,
            height,
            tokens: self.run(image_path)?,
        })
    }
}
