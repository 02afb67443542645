//! Session cache (spec.md §4.5): content-addressed, incrementally
//! persisted, crash-resumable storage for crawled pages. Grounded on the
//! teacher's `content_saver` module, generalized from citescrape's single
//! flat directory into the session-scoped `sessions/<id>/pages/` layout
//! spec.md §4.5 requires.

pub mod compression;
pub mod doctor;
pub mod load;
pub mod session;

pub use doctor::{doctor, DoctorReport, Finding, SessionDiagnosis};
pub use load::{delete_session, list_sessions, load_session};
pub use session::SessionWriter;
