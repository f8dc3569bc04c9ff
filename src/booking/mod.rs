//! Booking state for a sales call
//!
//! Structure:
//! - `record`: The six booking fields, confirmation status, and update precedence
//! - `extractor`: Regex and fuzzy matching of utterances into field updates
//! - `confirmation`: Keyword, marker, and closing phrase detection
//! - `session`: Per-call aggregate fed with caller and assistant turns

pub mod catalog;
mod confirmation;
mod extractor;
mod record;
mod session;
pub mod similarity;

pub use confirmation::{
    contains_marker, is_closing, strip_marker, ConfirmationPolicy, CLOSING_PHRASES,
    CONFIRMATION_MARKER,
};
pub use extractor::{title_case, ExtractionContext, FieldExtractor, Speaker};
pub use record::{
    BookingField, BookingRecord, BookingSubmission, ConfirmationStatus, CustomerIdentity,
    FieldUpdate, UpdateSource,
};
pub use session::{BookingEvent, BookingSession};
