mod support;

use job_apply_submit::models::{NavigationButtonKind, PageIndicator};
use job_apply_submit::PageNavigator;
use support::{FakeElement, FakePage};

#[tokio::test(start_paused = true)]
async fn detects_step_counter_in_page_text() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.set_body_text("Contact details\nStep 2 of 5\nFirst name");
    page.add(FakeElement::new(&["button"]).text("Next"));

    let info = PageNavigator::default().detect_current_page(&page).await;

    assert_eq!(info.page_number, 2);
    assert_eq!(info.total_pages, Some(5));
    assert!(info.has_next);
    assert!(!info.is_final);
    assert_eq!(info.indicators, vec![PageIndicator::StepCounter]);
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_progress_bar_then_dots() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.set_body_text("Posted 12/2024");
    page.add(FakeElement::new(&["[role='progressbar']"]).attr("aria-valuetext", "3 of 6"));

    let info = PageNavigator::default().detect_current_page(&page).await;
    assert_eq!((info.page_number, info.total_pages), (3, Some(6)));
    assert_eq!(info.indicators, vec![PageIndicator::ProgressBar]);

    let page = FakePage::new("https://jobs.example.com/apply");
    for class in ["step done", "step done", "step active", "step"] {
        page.add(FakeElement::new(&[".wizard-steps > li"]).attr("class", class));
    }

    let info = PageNavigator::default().detect_current_page(&page).await;
    assert_eq!((info.page_number, info.total_pages), (3, Some(4)));
    assert_eq!(info.indicators, vec![PageIndicator::StepDots]);
}

#[tokio::test(start_paused = true)]
async fn unknown_position_defaults_to_first_page() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.set_body_text("Posted 12/2024");

    let info = PageNavigator::default().detect_current_page(&page).await;

    assert_eq!(info.page_number, 1);
    assert_eq!(info.total_pages, None);
    assert_eq!(info.indicators, vec![PageIndicator::ButtonInference]);
}

#[tokio::test(start_paused = true)]
async fn prefers_continue_over_submit() {
    let page = FakePage::new("https://jobs.example.com/apply");
    let submit = page.add(FakeElement::new(&["button"]).text("Submit application"));
    let cont = page.add(FakeElement::new(&["button"]).text("Continue"));

    let (button, kind) = PageNavigator::default().find_navigation_button(&page).await;

    assert_eq!(kind, NavigationButtonKind::Continue);
    assert_eq!(button, Some(cont));
    assert_ne!(button, Some(submit));
}

#[tokio::test(start_paused = true)]
async fn hidden_buttons_are_ignored() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&["button"]).text("Next").hidden());
    let submit = page.add(FakeElement::new(&["button"]).text("Submit"));

    let (button, kind) = PageNavigator::default().find_navigation_button(&page).await;

    assert_eq!(kind, NavigationButtonKind::Submit);
    assert_eq!(button, Some(submit));
}

#[tokio::test(start_paused = true)]
async fn no_button_yields_unknown_and_navigation_fails() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&["button"]).text("Back"));

    let navigator = PageNavigator::default();
    let (button, kind) = navigator.find_navigation_button(&page).await;
    assert!(button.is_none());
    assert_eq!(kind, NavigationButtonKind::Unknown);

    assert!(!navigator.navigate_to_next(&page).await);
    assert!(page.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigate_clicks_next_and_follows_url() {
    let page = FakePage::new("https://jobs.example.com/apply/1");
    let next = page.add(FakeElement::new(&["button"]).text("Next"));
    page.navigate_on_click(next, "https://jobs.example.com/apply/2");

    assert!(PageNavigator::default().navigate_to_next(&page).await);
    assert_eq!(page.clicks(), vec![next]);
}

#[tokio::test(start_paused = true)]
async fn single_page_app_step_counts_as_navigation() {
    let page = FakePage::new("https://jobs.example.com/apply");
    let next = page.add(FakeElement::new(&["button"]).text("Next"));
    let step_one = page.add(FakeElement::new(&["#step-1"]));
    let step_two = page.add(FakeElement::new(&["#step-2"]).hidden());
    page.hide_on_click(next, &[step_one]);
    page.show_on_click(next, &[step_two]);

    let navigator = PageNavigator::default();
    let settle = navigator.config().settle_delay();
    let started = tokio::time::Instant::now();

    assert!(navigator.navigate_to_next(&page).await);

    assert_eq!(page.clicks(), vec![next]);
    assert_eq!(page.current_url_now(), "https://jobs.example.com/apply");
    // 切换等待一次，URL 未变化再等待一次
    assert!(started.elapsed() >= settle * 2);
}

#[tokio::test(start_paused = true)]
async fn final_page_signals() {
    let navigator = PageNavigator::default();

    let page = FakePage::new("https://jobs.example.com/apply/review");
    assert!(navigator.is_final_page(&page).await);

    let page = FakePage::new("https://jobs.example.com/apply/4");
    page.set_body_text("Please review your application before sending.");
    assert!(navigator.is_final_page(&page).await);

    let page = FakePage::new("https://jobs.example.com/apply/4");
    page.add(FakeElement::new(&["button[aria-label*='submit' i]"]));
    assert!(navigator.is_final_page(&page).await);

    let page = FakePage::new("https://jobs.example.com/apply/2");
    page.set_body_text("Work history");
    assert!(!navigator.is_final_page(&page).await);
}

#[tokio::test(start_paused = true)]
async fn transition_wait_gives_up_on_stuck_loader() {
    let page = FakePage::new("https://jobs.example.com/apply");
    page.add(FakeElement::new(&[".spinner"]));

    let state = PageNavigator::default()
        .wait_for_page_transition(&page, std::time::Duration::from_secs(3))
        .await;

    assert!(state.network_idle);
    assert!(!state.loader_cleared);
}
