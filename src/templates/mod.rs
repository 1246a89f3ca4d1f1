//! Page templates
//!
//! The error and directory-listing pages are compiled once per process and
//! rendered from plain serializable contexts.

use serde::Serialize;
use std::sync::OnceLock;
use tera::{Context, Tera};
use thiserror::Error;

const ERROR_TEMPLATE: &str = "error.html";
const DIR_TEMPLATE: &str = "dir.html";

static TEMPLATES: OnceLock<Result<Tera, String>> = OnceLock::new();

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("templates failed to compile: {0}")]
    Compile(String),
    #[error("failed to render {template}: {source}")]
    Render {
        template: &'static str,
        #[source]
        source: tera::Error,
    },
}

/// Context for the build error page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    pub stack: String,
    pub live_reload_path: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingFile {
    /// Link target relative to the listed directory; directories end in `/`
    pub href: String,
    /// `dir`, or the lowercase extension without the dot (may be empty)
    #[serde(rename = "type")]
    pub kind: String,
}

/// Context for the directory listing page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirContext {
    pub url: String,
    pub files: Vec<ListingFile>,
    pub live_reload_path: Option<String>,
}

fn compile() -> Result<Tera, String> {
    let mut tera = Tera::default();
    tera.add_raw_templates([
        (ERROR_TEMPLATE, include_str!("error.html")),
        (DIR_TEMPLATE, include_str!("dir.html")),
    ])
    .map_err(|e| format!("{e:?}"))?;
    Ok(tera)
}

fn templates() -> Result<&'static Tera, TemplateError> {
    TEMPLATES
        .get_or_init(compile)
        .as_ref()
        .map_err(|e| TemplateError::Compile(e.clone()))
}

fn render(template: &'static str, context: &impl Serialize) -> Result<String, TemplateError> {
    let context = Context::from_serialize(context)
        .map_err(|source| TemplateError::Render { template, source })?;
    templates()?
        .render(template, &context)
        .map_err(|source| TemplateError::Render { template, source })
}

pub fn render_error(context: &ErrorContext) -> Result<String, TemplateError> {
    render(ERROR_TEMPLATE, context)
}

pub fn render_dir(context: &DirContext) -> Result<String, TemplateError> {
    render(DIR_TEMPLATE, context)
}
