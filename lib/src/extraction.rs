// lib/src/extraction.rs

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use models::{ClinicError, ClinicResult, Document, RecordId};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use security::Caller;
use serde::Deserialize;

use crate::config::ExtractionConfig;
use crate::service::ResourceService;

const SERVICE: &str = "extraction";

/// How the extraction service will treat an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Word,
    Other(String),
}

impl FileKind {
    /// Images are recognised by content type, everything else by extension.
    pub fn classify(content_type: Option<&str>, file_name: &str) -> Self {
        if content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/")) {
            return FileKind::Image;
        }
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => FileKind::Pdf,
            "doc" | "docx" => FileKind::Word,
            _ => FileKind::Other(extension),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FileKind::Other(_))
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Image => write!(f, "image"),
            FileKind::Pdf => write!(f, "pdf"),
            FileKind::Word => write!(f, "word"),
            FileKind::Other(ext) if ext.is_empty() => write!(f, "other"),
            FileKind::Other(ext) => write!(f, "other ({})", ext),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Unsupported,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync + 'static {
    async fn extract(&self, file_name: String, content_type: Option<String>, bytes: Vec<u8>) -> ClinicResult<Extraction>;
}

#[derive(Deserialize)]
struct ExtractedText {
    extracted_text: String,
}

/// Posts the file as multipart field `file` to the extraction service.
#[derive(Debug, Clone)]
pub struct HttpTextExtractor {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTextExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        HttpTextExtractor {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn post(&self, form: Form) -> ClinicResult<Extraction> {
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClinicError::external(SERVICE, e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let body: ExtractedText = response
                    .json()
                    .await
                    .map_err(|e| ClinicError::external(SERVICE, format!("malformed response: {}", e)))?;
                Ok(Extraction::Text(body.extracted_text))
            }
            StatusCode::BAD_REQUEST => Ok(Extraction::Unsupported),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(ClinicError::external(SERVICE, format!("HTTP {}: {}", status, detail)))
            }
        }
    }
}

#[async_trait]
impl TextExtractor for HttpTextExtractor {
    async fn extract(&self, file_name: String, content_type: Option<String>, bytes: Vec<u8>) -> ClinicResult<Extraction> {
        let mut part = Part::bytes(bytes).file_name(file_name);
        if let Some(ct) = content_type {
            part = part
                .mime_str(&ct)
                .map_err(|e| ClinicError::external(SERVICE, format!("bad content type {}: {}", ct, e)))?;
        }
        let form = Form::new().part("file", part);
        tokio::time::timeout(self.timeout, self.post(form))
            .await
            .map_err(|_| ClinicError::external(SERVICE, format!("timed out after {:?}", self.timeout)))?
    }
}

#[derive(Clone)]
pub struct ExtractionService {
    resources: ResourceService,
    extractor: Arc<dyn TextExtractor>,
}

impl ExtractionService {
    pub fn new(resources: ResourceService, extractor: Arc<dyn TextExtractor>) -> Self {
        ExtractionService { resources, extractor }
    }

    /// Extracts text from the uploaded content of a document the caller can
    /// read. Kinds the service cannot handle come back as `Unsupported`
    /// without contacting it.
    pub async fn extract_document_text(&self, caller: &Caller, document_id: RecordId, bytes: Vec<u8>) -> ClinicResult<Extraction> {
        let document: Document = self.resources.get(caller, document_id).await?;
        let kind = FileKind::classify(document.file_type.as_deref(), &document.file_name);
        if !kind.is_supported() {
            info!("Document {} is {}, skipping extraction", document.id, kind);
            return Ok(Extraction::Unsupported);
        }
        debug!("Extracting {} bytes of {} from document {}", bytes.len(), kind, document.id);
        let extraction = self
            .extractor
            .extract(document.file_name.clone(), document.file_type.clone(), bytes)
            .await?;
        if extraction == Extraction::Unsupported {
            warn!("Extraction service refused document {} ({})", document.id, kind);
        }
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::service::tests::account;
    use models::{ErrorKind, Role};
    use security::PolicyTable;

    #[test]
    fn kinds_follow_content_type_then_extension() {
        assert_eq!(FileKind::classify(Some("image/png"), "scan.bin"), FileKind::Image);
        assert_eq!(FileKind::classify(Some("application/pdf"), "Report.PDF"), FileKind::Pdf);
        assert_eq!(FileKind::classify(None, "letter.docx"), FileKind::Word);
        assert_eq!(FileKind::classify(None, "notes.txt"), FileKind::Other("txt".to_string()));
        assert_eq!(FileKind::classify(None, "README"), FileKind::Other(String::new()));
        assert!(!FileKind::classify(None, "README").is_supported());
    }

    #[tokio::test]
    async fn owner_gets_the_extracted_text() {
        let db = Database::in_memory();
        let owner = account(&db, "pat", Role::Patient).await;
        let mut document = Document::new(owner.id, "x-ray.png");
        document.file_type = Some("image/png".to_string());
        let document = db.insert(document).await.unwrap();

        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract()
            .withf(|name, ct, bytes| name == "x-ray.png" && ct.as_deref() == Some("image/png") && bytes.len() == 3)
            .times(1)
            .returning(|_, _, _| Ok(Extraction::Text("no fracture".to_string())));
        let service = ExtractionService::new(ResourceService::new(db.clone(), PolicyTable::default()), Arc::new(extractor));
        let caller = service.resources.caller_for(owner.id).await.unwrap();

        let extraction = service.extract_document_text(&caller, document.id, vec![1, 2, 3]).await.unwrap();
        assert_eq!(extraction, Extraction::Text("no fracture".to_string()));
    }

    #[tokio::test]
    async fn others_cannot_extract_and_odd_files_are_skipped() {
        let db = Database::in_memory();
        let owner = account(&db, "pat", Role::Patient).await;
        let doctor = account(&db, "doc", Role::Doctor).await;
        let text = db.insert(Document::new(owner.id, "notes.txt")).await.unwrap();

        let mut extractor = MockTextExtractor::new();
        extractor.expect_extract().never();
        let service = ExtractionService::new(ResourceService::new(db.clone(), PolicyTable::default()), Arc::new(extractor));

        let as_doctor = service.resources.caller_for(doctor.id).await.unwrap();
        let err = service.extract_document_text(&as_doctor, text.id, vec![]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let as_owner = service.resources.caller_for(owner.id).await.unwrap();
        let extraction = service.extract_document_text(&as_owner, text.id, vec![]).await.unwrap();
        assert_eq!(extraction, Extraction::Unsupported);
    }

    #[tokio::test]
    async fn service_errors_surface_as_external_failures() {
        let db = Database::in_memory();
        let owner = account(&db, "pat", Role::Patient).await;
        let document = db.insert(Document::new(owner.id, "labs.pdf")).await.unwrap();
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _, _| Err(ClinicError::external("extraction", "HTTP 500 Internal Server Error: boom")));
        let service = ExtractionService::new(ResourceService::new(db.clone(), PolicyTable::default()), Arc::new(extractor));
        let caller = service.resources.caller_for(owner.id).await.unwrap();

        let err = service.extract_document_text(&caller, document.id, b"%PDF".to_vec()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalService);
    }
}
