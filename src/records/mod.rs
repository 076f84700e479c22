//! Customer submissions and the store they are written to.

mod models;
mod store;

pub use models::{
    CallbackRequest, CallbackSubmission, Inquiry, InquirySubmission, NewCallbackRequest,
    NewInquiry, NewNotification, NewReview, Notification, NotificationKind, Review,
    ReviewFilter, ReviewQuery, ReviewSubmission,
};
pub use store::{MemoryStore, RecordStore};
