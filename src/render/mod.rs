//! Renderer module — trait-based format dispatch.

pub mod docx;
pub mod json;
pub mod markdown;

use crate::error::{Error, Result};
use crate::report::Report;
use std::path::Path;

/// Trait for rendering a Report into a specific output format.
pub trait Renderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
///
/// `docx` appends into `template`, which is opened here; the other formats
/// ignore it.
pub fn create_renderer(format: &str, template: Option<&Path>) -> Result<Box<dyn Renderer>> {
    match format {
        "docx" | "word" => {
            let path = template.ok_or_else(|| {
                Error::Validation("the docx format needs a template".to_string())
            })?;
            Ok(Box::new(docx::DocxRenderer::new(docx::Template::open(path)?)))
        }
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(Error::Validation(format!(
            "unknown format: {}. Use docx, markdown, or json",
            format
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected() {
        let err = create_renderer("pdf", None).err().unwrap();
        assert!(err.to_string().contains("unknown format: pdf"));
    }

    #[test]
    fn docx_requires_template() {
        let err = create_renderer("docx", None).err().unwrap();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn missing_template_is_reported() {
        let err = create_renderer("docx", Some(Path::new("/nonexistent/t.docx")))
            .err()
            .unwrap();
        assert!(matches!(err, Error::TemplateNotFound(_)));
    }

    #[test]
    fn text_formats_need_no_template() {
        assert_eq!(create_renderer("md", None).unwrap().file_extension(), "md");
        assert_eq!(create_renderer("json", None).unwrap().file_extension(), "json");
    }
}
