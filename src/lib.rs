//! # Rubric ("rubros") Editing Library
//!
//! This Rust library provides the grading-rubric logic of a school-administration system:
//! an editable draft of a subject's rubric list, conversion between the percentages shown
//! to teachers and the fractional weights stored by the backend, validation of the weight
//! total, and synchronization of the edited list with the REST backend.
//! The library utilizes the `reqwest` crate (blocking client) for HTTP requests.
//!
//! ## Core Features
//!
//! - **Credentials:** Loads the API URL and token from environment variables or the system keyring.
//! - **Draft Store:** `RubricDraft` keeps an isolated copy of the list while it is edited.
//! - **Weight Normalizer:** `weight::to_display` / `weight::from_display` convert 0.25 ⇄ 25%.
//! - **Sum Validator:** `validator::compute_sum` / `validator::is_valid` check the 100% total.
//! - **Sync Submitter:** `RubricClient` fetches lists and replaces them wholesale on save.
//!
//! Two rubric variants exist. Standard rubrics must total 100% before they can be saved.
//! Daily-work ("trabajos cotidianos") rubrics carry a due date and a late penalty per day,
//! and any total is accepted.
//!
//! ### Examples
//!
//! Editing a subject's rubrics:
//! ```no_run
//! use rubros_connector::{ApiCredentials, ApiSession, RubricClient, RubricField, StandardRubricEditor};
//!
//! let client = RubricClient::new(ApiSession::new(ApiCredentials::credentials()?)?);
//! let mut editor = StandardRubricEditor::new("MAT-101");
//! editor.open(&client.fetch_rubrics("MAT-101")?);
//!
//! let id = editor.add_blank()?;
//! editor.update_field(&id, RubricField::Name("Quiz".to_string()))?;
//! editor.update_field(&id, RubricField::WeightPercent("10".to_string()))?;
//! println!("{}", editor.banner().unwrap_or_default());
//!
//! match editor.save(&client) {
//!     Ok(()) => println!("Saved"),
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! # Ok::<(), rubros_connector::RubricError>(())
//! ```
mod connection; // HTTP requests to the backend.
pub mod credentials; // Storage and retrieval of the API credentials.
pub mod draft;
pub mod editor;
pub mod error;
pub mod rubric; // Rubric rows and their variants.
pub mod sync; // Fetch and whole-list sync endpoints.
pub mod validator;
pub mod weight;

// Exports key structures for external use.
pub use connection::{ApiSession, DEFAULT_TIMEOUT};
pub use credentials::ApiCredentials;
pub use draft::RubricDraft;
pub use editor::{DailyWorkRubricEditor, RubricEditor, StandardRubricEditor};
pub use error::{Result, RubricError};
pub use rubric::{
    DailyWork, RubricField, RubricId, RubricItem, RubricVariant, Standard, StandardRubricItem,
    TimeBoxedRubricItem,
};
pub use sync::{DailyWorkTarget, RubricClient};
pub use validator::{Informational, Strict, SumPolicy, WeightSummary};
