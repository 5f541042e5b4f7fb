//! Domain models for the news curator.
//!
//! # Core Concepts
//!
//! ## Transient Records
//!
//! These live only for the duration of one curation run:
//!
//! - [`Candidate`]: A fetched article under consideration for selection.
//! - [`Selection`]: A model-chosen candidate with its score, category and reason.
//!
//! ## Persistent Entities
//!
//! - [`StoredArticle`]: A curated article, unique by URL. Re-curating a known URL
//!   returns the existing record untouched.
//! - [`Feedback`]: A liked/disliked judgment attached to a stored article.
//!   Deleted together with its article.
//! - [`Preferences`]: Typed view over the key/value preference store, with
//!   compiled-in defaults for every absent key.
//! - [`CurationSession`]: Create-only record of one successful curation run.

mod article;
mod candidate;
mod feedback;
mod preference;
mod session;

pub use article::*;
pub use candidate::*;
pub use feedback::*;
pub use preference::*;
pub use session::*;
