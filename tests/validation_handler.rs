mod support;

use job_apply_submit::models::validation::UNKNOWN_FIELD;
use job_apply_submit::ValidationHandler;
use support::{FakeElement, FakePage};

#[tokio::test(start_paused = true)]
async fn corrects_email_and_refills_field() {
    let page = FakePage::new("https://jobs.example.com/apply");
    let email = page.add(FakeElement::new(&["input[name=\"email\"]"]).value(" Foo@BAR.com "));
    page.add(
        FakeElement::new(&[".error-message"])
            .text("Please enter a valid email address")
            .attr("data-field", "email"),
    );

    let handler = ValidationHandler::default();
    let errors = handler.check_for_errors(&page).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field_name, "email");
    assert_eq!(errors[0].error_message, "Please enter a valid email address");

    let current = handler.current_value(&page, "email", None).await.unwrap();
    let corrected = handler
        .suggest_correction("email", &current, &errors[0].error_message)
        .unwrap();
    assert_eq!(corrected, "foo@bar.com");

    assert!(handler.retry_field(&page, "email", &corrected, None).await);
    assert_eq!(page.value_of(email).as_deref(), Some("foo@bar.com"));
    assert!(page.was_clicked(email));
}

#[tokio::test(start_paused = true)]
async fn deduplicates_errors_by_field_name() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(
        FakeElement::new(&[".field-error"])
            .text("Phone number is invalid")
            .sibling_attr("name", "phone"),
    );
    page.add(
        FakeElement::new(&["input[aria-invalid='true']"])
            .attr("name", "phone")
            .sibling_text("Required"),
    );
    page.add(
        FakeElement::new(&["input.is-invalid"])
            .attr("id", "linkedin")
            .attr("aria-describedby", "linkedin-help"),
    );
    page.add(FakeElement::new(&["[id=\"linkedin-help\"]"]).text("Enter a full URL"));

    let errors = ValidationHandler::default().check_for_errors(&page).await;

    let fields: Vec<&str> = errors.iter().map(|e| e.field_name.as_str()).collect();
    assert_eq!(fields, vec!["phone", "linkedin"]);
    assert_eq!(errors[0].error_message, "Phone number is invalid");
    assert_eq!(errors[1].error_message, "Enter a full URL");
    assert!(errors.iter().all(|e| e.retry_count == 0 && !e.correction_attempted));
}

#[tokio::test(start_paused = true)]
async fn unattributed_messages_use_unknown_field() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&["[role='alert']"]).text("Something went wrong"));
    page.add(FakeElement::new(&[".error-message"]).text("Hidden error").hidden());

    let errors = ValidationHandler::default().check_for_errors(&page).await;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field_name, UNKNOWN_FIELD);
    assert!(errors[0].is_unknown_field());
}

#[tokio::test(start_paused = true)]
async fn retry_reports_missing_field() {
    let page = FakePage::new("https://jobs.example.com/apply");

    let handler = ValidationHandler::default();
    assert!(!handler.retry_field(&page, "phone", "(555) 123-4567", None).await);
    assert!(handler.current_value(&page, "phone", None).await.is_none());
}

#[test]
fn corrections_dispatch_on_field_name() {
    let handler = ValidationHandler::default();
    assert_eq!(
        handler.suggest_correction("mobile_phone", "555.123.4567", "invalid").as_deref(),
        Some("(555) 123-4567")
    );
    assert_eq!(
        handler.suggest_correction("portfolio", "me.dev", "invalid").as_deref(),
        Some("https://me.dev")
    );
    assert_eq!(handler.suggest_correction("first_name", "Ann", "invalid"), None);
}

#[tokio::test(start_paused = true)]
async fn error_message_comes_from_leaf_element_not_form_group() {
    let page = FakePage::new("https://jobs.example.com/apply");
    // 外层 .has-error 表单组只会被不带 :has 限制的宽泛选择器命中
    page.add(
        FakeElement::new(&["[class*='error']:not(input):not(select):not(textarea)"])
            .text("Email\nWe will contact you here\nEnter a valid email")
            .attr("data-field", "email"),
    );
    page.add(
        FakeElement::new(&["input[aria-invalid='true']"])
            .attr("name", "email")
            .sibling_text("Enter a valid email"),
    );

    let errors = ValidationHandler::default().check_for_errors(&page).await;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field_name, "email");
    assert_eq!(errors[0].error_message, "Enter a valid email");
}
