mod support;

use std::path::{Path, PathBuf};

use job_apply_submit::config::UploadConfig;
use job_apply_submit::models::{DocumentSource, DocumentType};
use job_apply_submit::services::document_handler::{GENERIC_FILE_INPUT, GENERIC_UPLOAD_BUTTON};
use job_apply_submit::{AppError, CustomDocumentHandler};
use support::{FakeElement, FakePage};

fn resume_page() -> FakePage {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&["button[aria-label*='resume' i]"]));
    page
}

fn cover_letter_page() -> FakePage {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&["button[aria-label*='cover' i]"]));
    page
}

#[tokio::test(start_paused = true)]
async fn custom_resume_uploads_on_first_attempt() {
    let page = resume_page();
    let custom = PathBuf::from("docs/resume_acme.pdf");

    let result = CustomDocumentHandler::default()
        .upload_custom_resume(&page, &DocumentSource::from(custom.clone()), None)
        .await;

    assert!(result.success);
    assert!(result.is_custom);
    assert_eq!(result.retry_count, 1);
    assert_eq!(result.document_type, DocumentType::Resume);
    assert_eq!(result.document_used, custom.display().to_string());
    assert!(result.error_message.is_none());

    let uploads = page.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].via_chooser);
}

#[tokio::test(start_paused = true)]
async fn cover_letter_falls_back_to_default_after_two_failures() {
    let page = cover_letter_page();
    let custom = PathBuf::from("docs/cover_acme.pdf");
    let default = PathBuf::from("docs/cover_generic.pdf");
    page.fail_uploads_of(&custom);

    let result = CustomDocumentHandler::default()
        .upload_custom_cover_letter(&page, &DocumentSource::from(custom), Some(&default))
        .await;

    assert!(result.success);
    assert!(!result.is_custom);
    assert_eq!(result.document_used, default.display().to_string());
    // 两次自定义尝试 + 一次默认文档
    assert_eq!(result.retry_count, 3);

    let uploads = page.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].path, default);
}

#[tokio::test(start_paused = true)]
async fn exhausting_retries_without_default_keeps_custom_flag() {
    let page = resume_page();
    let custom = PathBuf::from("docs/resume_acme.pdf");
    page.fail_uploads_of(&custom);

    let result = CustomDocumentHandler::default()
        .upload_custom_resume(&page, &DocumentSource::from(custom), None)
        .await;

    assert!(!result.success);
    assert!(result.is_custom);
    assert_eq!(result.retry_count, 3);
    assert!(result.error_message.is_some());
    assert!(page.uploads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovers_before_fallback() {
    let page = resume_page();
    page.fail_next_uploads(1);
    let default = PathBuf::from("docs/resume_generic.pdf");

    let result = CustomDocumentHandler::default()
        .upload_custom_resume(
            &page,
            &DocumentSource::from(Path::new("docs/resume_acme.pdf")),
            Some(&default),
        )
        .await;

    assert!(result.success);
    assert!(result.is_custom);
    assert_eq!(result.retry_count, 2);
}

#[tokio::test(start_paused = true)]
async fn byte_sources_use_a_temp_file_that_is_removed() {
    let page = resume_page();
    let source = DocumentSource::Bytes {
        data: b"%PDF-1.4 resume".to_vec(),
        file_name: "resume.pdf".to_string(),
    };

    let result = CustomDocumentHandler::default()
        .upload_custom_resume(&page, &source, None)
        .await;

    assert!(result.success);
    assert_eq!(result.document_used, "resume.pdf");

    let uploads = page.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].existed);
    assert_eq!(uploads[0].path.extension().and_then(|e| e.to_str()), Some("pdf"));
    assert!(!uploads[0].path.exists());
}

#[tokio::test(start_paused = true)]
async fn uses_visible_file_input_but_never_hidden_ones() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&["input[type='file'][name*='resume' i]"]));

    let handler = CustomDocumentHandler::default();
    let result = handler
        .upload_custom_resume(&page, &DocumentSource::from(Path::new("resume.pdf")), None)
        .await;
    assert!(result.success);
    assert!(!page.uploads()[0].via_chooser);

    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&[GENERIC_FILE_INPUT]).hidden());

    assert!(!handler.has_upload_control(&page, DocumentType::Resume).await);
    let result = handler
        .upload_custom_resume(&page, &DocumentSource::from(Path::new("resume.pdf")), None)
        .await;
    assert!(!result.success);
    assert!(page.uploads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn upload_controls_are_per_document_type() {
    let handler = CustomDocumentHandler::default();
    let page = resume_page();

    assert!(handler.has_upload_control(&page, DocumentType::Resume).await);
    assert!(!handler.has_upload_control(&page, DocumentType::CoverLetter).await);
}

#[test]
fn source_type_strings_are_validated() {
    let err = DocumentSource::from_parts("url", None, None, None).unwrap_err();
    assert!(matches!(err, AppError::UnknownSourceType { ref source_type } if source_type == "url"));

    let err = DocumentSource::from_parts("bytes", None, None, None).unwrap_err();
    assert!(matches!(err, AppError::MissingDocumentData { missing: "data", .. }));

    let source = DocumentSource::from_parts("path", Some(PathBuf::from("cv.pdf")), None, None);
    assert!(matches!(source, Ok(DocumentSource::Path(_))));
}

fn byte_source() -> DocumentSource {
    DocumentSource::Bytes {
        data: b"%PDF-1.4 resume".to_vec(),
        file_name: "resume.pdf".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn fallback_stays_within_retry_budget() {
    let page = resume_page();
    let custom = PathBuf::from("docs/resume_acme.pdf");
    let default = PathBuf::from("docs/resume_generic.pdf");
    page.fail_uploads_of(&custom);

    let handler = CustomDocumentHandler::new(UploadConfig {
        max_retries: 3,
        fallback_after_failures: 3,
        ..Default::default()
    });
    let result = handler
        .upload_custom_resume(&page, &DocumentSource::from(custom), Some(&default))
        .await;

    assert!(result.success);
    assert!(!result.is_custom);
    assert_eq!(result.retry_count, 3);
    assert_eq!(page.upload_attempts().len(), 3);
    assert_eq!(page.uploads()[0].path, default);
}

#[tokio::test(start_paused = true)]
async fn temp_file_is_removed_after_falling_back() {
    let page = resume_page();
    page.fail_next_uploads(2);
    let default = PathBuf::from("docs/resume_generic.pdf");

    let result = CustomDocumentHandler::default()
        .upload_custom_resume(&page, &byte_source(), Some(&default))
        .await;

    assert!(result.success);
    assert!(!result.is_custom);

    let attempts = page.upload_attempts();
    assert_eq!(attempts.len(), 3);
    assert_ne!(attempts[0], default);
    assert!(!attempts[0].exists());
}

#[tokio::test(start_paused = true)]
async fn temp_file_is_removed_after_exhausting_retries() {
    let page = resume_page();
    page.fail_next_uploads(3);

    let result = CustomDocumentHandler::default()
        .upload_custom_resume(&page, &byte_source(), None)
        .await;

    assert!(!result.success);
    assert!(result.is_custom);
    assert_eq!(result.retry_count, 3);

    let attempts = page.upload_attempts();
    assert_eq!(attempts.len(), 3);
    assert!(attempts.iter().all(|path| !path.exists()));
}

#[tokio::test(start_paused = true)]
async fn cover_letter_only_page_offers_no_resume_control() {
    let handler = CustomDocumentHandler::default();
    let page = FakePage::new("https://jobs.example.com/apply");
    let cover_button = page.add(FakeElement::new(&[
        "button[aria-label*='cover' i]",
        "button[aria-label*='upload' i]",
    ]));
    page.add(FakeElement::new(&[
        "input[type='file'][name*='cover' i]",
        "input[type='file']",
    ]));

    assert!(!handler.has_upload_control(&page, DocumentType::Resume).await);
    assert!(handler.has_upload_control(&page, DocumentType::CoverLetter).await);

    let result = handler
        .upload_custom_resume(&page, &DocumentSource::from(Path::new("resume.pdf")), None)
        .await;
    assert!(!result.success);
    assert!(page.uploads().is_empty());
    assert!(!page.was_clicked(cover_button));
}

#[tokio::test(start_paused = true)]
async fn generic_upload_button_still_serves_resume() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&[GENERIC_UPLOAD_BUTTON]));

    let handler = CustomDocumentHandler::default();
    assert!(handler.has_upload_control(&page, DocumentType::Resume).await);
    assert!(!handler.has_upload_control(&page, DocumentType::CoverLetter).await);
}
