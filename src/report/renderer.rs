//! Document rendering for completed intake flows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RenderError;
use crate::report::summary;

/// Handle to a rendered document.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub id: Uuid,
    pub filename: String,
    pub path: PathBuf,
    pub bytes_written: usize,
    pub generated_at: DateTime<Utc>,
}

/// Turns a completed field map into a shareable document.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(
        &self,
        fields: &[(String, String)],
        filename: &str,
        title: &str,
    ) -> Result<ReportArtifact, RenderError>;
}

/// Renders markdown summaries into an output directory.
pub struct FileReportRenderer {
    output_dir: PathBuf,
}

impl FileReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Create the output directory if it doesn't exist yet.
    pub async fn ensure_dirs(&self) -> Result<(), RenderError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(RenderError::OutputDir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Build the summary document body: patient information, medical history,
/// current medications, signature line.
fn document_body(fields: &[(String, String)], title: &str) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("# {title}\n\n"));

    doc.push_str("## Patient Information\n\n");
    doc.push_str(&format!("- **DNI:** {}\n", summary::field(fields, "dni")));
    doc.push_str(&format!("- **Age:** {}\n\n", summary::field(fields, "edad")));

    doc.push_str("## Medical History\n\n");
    doc.push_str(&format!(
        "- **Operations:** {}\n",
        summary::field(fields, "operaciones")
    ));
    doc.push_str(&format!(
        "- **Allergies:** {}\n",
        summary::field(fields, "alergias")
    ));
    doc.push_str(&format!(
        "- **Chronic Diseases:** {}\n\n",
        summary::field(fields, "enfermedades_cronicas")
    ));

    doc.push_str("## Current Medications\n\n");
    doc.push_str(&format!(
        "{}\n\n",
        summary::field(fields, "medicamentos_actuales")
    ));

    doc.push_str("Firma del facultativo\n");
    doc
}

#[async_trait]
impl ReportRenderer for FileReportRenderer {
    async fn render(
        &self,
        fields: &[(String, String)],
        filename: &str,
        title: &str,
    ) -> Result<ReportArtifact, RenderError> {
        self.ensure_dirs().await?;

        let body = document_body(fields, title);
        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, body.as_bytes())
            .await
            .map_err(|source| RenderError::Write {
                filename: filename.to_string(),
                source,
            })?;

        let artifact = ReportArtifact {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            path,
            bytes_written: body.len(),
            generated_at: Utc::now(),
        };
        tracing::info!(
            artifact_id = %artifact.id,
            path = %artifact.path.display(),
            "Report rendered"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> Vec<(String, String)> {
        vec![
            ("start".to_string(), "Not provided".to_string()),
            ("dni".to_string(), "12345678".to_string()),
            ("edad".to_string(), "34".to_string()),
            ("operaciones".to_string(), "no".to_string()),
            ("alergias".to_string(), "polen".to_string()),
            ("enfermedades_cronicas".to_string(), "no".to_string()),
            ("medicamentos_actuales".to_string(), "ibuprofeno".to_string()),
            ("finish".to_string(), "Not provided".to_string()),
        ]
    }

    #[test]
    fn document_body_sections() {
        let body = document_body(&sample_fields(), "Medical Report Summary");
        assert!(body.starts_with("# Medical Report Summary"));
        assert!(body.contains("## Patient Information"));
        assert!(body.contains("**DNI:** 12345678"));
        assert!(body.contains("**Allergies:** polen"));
        assert!(body.contains("## Current Medications"));
        assert!(body.contains("ibuprofeno"));
        assert!(body.ends_with("Firma del facultativo\n"));
    }

    #[test]
    fn document_body_missing_fields_use_sentinel() {
        let body = document_body(&[], "Medical Report Summary");
        assert!(body.contains("**DNI:** Not provided"));
        assert!(body.contains("**Operations:** Not provided"));
    }

    #[tokio::test]
    async fn renders_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FileReportRenderer::new(dir.path());

        let artifact = renderer
            .render(
                &sample_fields(),
                "Medical_Report_34600000001.md",
                "Medical Report Summary",
            )
            .await
            .unwrap();

        assert_eq!(artifact.filename, "Medical_Report_34600000001.md");
        assert!(artifact.path.exists());
        assert!(artifact.bytes_written > 0);

        let written = tokio::fs::read_to_string(&artifact.path).await.unwrap();
        assert!(written.contains("**DNI:** 12345678"));
    }

    #[tokio::test]
    async fn ensure_dirs_creates_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/reports");
        let renderer = FileReportRenderer::new(&nested);
        renderer.ensure_dirs().await.unwrap();
        assert!(nested.is_dir());
    }
}
