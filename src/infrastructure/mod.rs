pub mod chrome_page;
pub mod form_page;

pub use chrome_page::ChromePage;
pub use form_page::{first_visible, wait_for_visible, FormPage, Probe, POLL_INTERVAL};
