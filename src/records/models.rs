//! Submission records and their validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RiverdaleError};

/// Lowest accepted review rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted review rating.
pub const MAX_RATING: i64 = 5;

/// A stored customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub package_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_location: Option<String>,
    pub title: String,
    pub content: String,
    pub rating: u8,
    pub travel_date: Option<NaiveDate>,
    /// Reviews stay hidden until an admin approves them
    pub admin_approved: bool,
    pub verified: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// A review as posted by a customer, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSubmission {
    pub package_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_location: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i64>,
    pub travel_date: Option<NaiveDate>,
}

/// A validated review ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub package_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_location: Option<String>,
    pub title: String,
    pub content: String,
    pub rating: u8,
    pub travel_date: Option<NaiveDate>,
}

impl ReviewSubmission {
    /// Check required fields and the rating range.
    pub fn validate(self) -> Result<NewReview> {
        let rating = self.rating.filter(|r| *r != 0);
        let required = (
            present(self.customer_name),
            present(self.customer_email),
            present(self.title),
            present(self.content),
            rating,
        );
        let (Some(customer_name), Some(customer_email), Some(title), Some(content), Some(rating)) =
            required
        else {
            return Err(missing_fields());
        };

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(RiverdaleError::InvalidArgument(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        Ok(NewReview {
            package_id: present(self.package_id),
            customer_name,
            customer_email,
            customer_location: present(self.customer_location),
            title,
            content,
            rating: rating as u8,
            travel_date: self.travel_date,
        })
    }
}

/// A stored travel inquiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub package_id: Option<String>,
    pub destination: Option<String>,
    pub message: String,
    pub travel_date: Option<NaiveDate>,
    pub travelers: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// An inquiry as posted by a customer, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InquirySubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub package_id: Option<String>,
    pub destination: Option<String>,
    pub message: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub travelers: Option<u32>,
}

/// A validated inquiry ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub package_id: Option<String>,
    pub destination: Option<String>,
    pub message: String,
    pub travel_date: Option<NaiveDate>,
    pub travelers: Option<u32>,
}

impl InquirySubmission {
    /// Check required fields.
    pub fn validate(self) -> Result<NewInquiry> {
        let (Some(name), Some(email), Some(message)) = (
            present(self.name),
            present(self.email),
            present(self.message),
        ) else {
            return Err(missing_fields());
        };

        if self.travelers == Some(0) {
            return Err(RiverdaleError::InvalidArgument(
                "Travelers must be at least 1".to_string(),
            ));
        }

        Ok(NewInquiry {
            name,
            email,
            phone: present(self.phone),
            package_id: present(self.package_id),
            destination: present(self.destination),
            message,
            travel_date: self.travel_date,
            travelers: self.travelers,
        })
    }
}

/// A stored callback request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A callback request as posted by a customer, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackSubmission {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// A validated callback request ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCallbackRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: Option<String>,
}

impl CallbackSubmission {
    /// Check required fields.
    pub fn validate(self) -> Result<NewCallbackRequest> {
        let (Some(name), Some(phone), Some(email)) = (
            present(self.name),
            present(self.phone),
            present(self.email),
        ) else {
            return Err(missing_fields());
        };

        Ok(NewCallbackRequest {
            name,
            phone,
            email,
            message: present(self.message),
        })
    }
}

/// Kind of admin notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewReview,
    NewInquiry,
    NewCallbackRequest,
}

/// A queued admin notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub recipient_email: String,
    pub title: String,
    pub message: String,
    pub record_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A notification ready for queueing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub recipient_email: String,
    pub title: String,
    pub message: String,
    pub record_id: Uuid,
}

impl NewNotification {
    /// The notification queued when a review comes in.
    pub fn for_review(review: &Review, recipient_email: &str) -> Self {
        Self {
            kind: NotificationKind::NewReview,
            recipient_email: recipient_email.to_string(),
            title: "New Customer Review Submitted".to_string(),
            message: format!(
                "A new review has been submitted by {} for approval.",
                review.customer_name
            ),
            record_id: review.id,
        }
    }

    /// The notification queued when an inquiry comes in.
    pub fn for_inquiry(inquiry: &Inquiry, recipient_email: &str) -> Self {
        Self {
            kind: NotificationKind::NewInquiry,
            recipient_email: recipient_email.to_string(),
            title: "New Travel Inquiry".to_string(),
            message: format!("{} <{}> sent a travel inquiry.", inquiry.name, inquiry.email),
            record_id: inquiry.id,
        }
    }

    /// The notification queued when a callback is requested.
    pub fn for_callback(request: &CallbackRequest, recipient_email: &str) -> Self {
        Self {
            kind: NotificationKind::NewCallbackRequest,
            recipient_email: recipient_email.to_string(),
            title: "Callback Requested".to_string(),
            message: format!("{} asked to be called on {}.", request.name, request.phone),
            record_id: request.id,
        }
    }
}

/// Filters for listing public reviews.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub package_id: Option<String>,
    pub featured: bool,
    pub limit: Option<usize>,
}

/// Query string of `GET /api/reviews`, taken as raw strings.
///
/// Parameters that do not parse are ignored rather than rejected: only
/// `featured=true` filters, and a `limit` that is not a number lists
/// everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewQuery {
    pub package_id: Option<String>,
    pub featured: Option<String>,
    pub limit: Option<String>,
}

impl ReviewQuery {
    pub fn into_filter(self) -> ReviewFilter {
        ReviewFilter {
            package_id: present(self.package_id),
            featured: self.featured.as_deref() == Some("true"),
            limit: self.limit.and_then(|l| l.trim().parse().ok()),
        }
    }
}

/// Blank strings count as missing.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn missing_fields() -> RiverdaleError {
    RiverdaleError::InvalidArgument("Missing required fields".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_submission() -> ReviewSubmission {
        ReviewSubmission {
            package_id: Some("maasai-mara-3d".to_string()),
            customer_name: Some("Wanjiru".to_string()),
            customer_email: Some("wanjiru@example.com".to_string()),
            customer_location: None,
            title: Some("Unforgettable".to_string()),
            content: Some("Saw the migration crossing.".to_string()),
            rating: Some(5),
            travel_date: NaiveDate::from_ymd_opt(2026, 8, 14),
        }
    }

    #[test]
    fn test_valid_review() {
        let review = review_submission().validate().unwrap();
        assert_eq!(review.rating, 5);
        assert_eq!(review.customer_name, "Wanjiru");
        assert_eq!(review.package_id.as_deref(), Some("maasai-mara-3d"));
    }

    #[test]
    fn test_review_missing_fields() {
        let mut submission = review_submission();
        submission.title = Some("   ".to_string());
        let err = submission.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Missing required fields");

        let mut submission = review_submission();
        submission.rating = Some(0);
        assert!(submission.validate().is_err());

        assert!(ReviewSubmission::default().validate().is_err());
    }

    #[test]
    fn test_review_rating_range() {
        for rating in [-1, 6, 100] {
            let mut submission = review_submission();
            submission.rating = Some(rating);
            let err = submission.validate().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid argument: Rating must be between 1 and 5"
            );
        }
    }

    #[test]
    fn test_inquiry_validation() {
        let inquiry = InquirySubmission {
            name: Some("Tom".to_string()),
            email: Some("tom@example.com".to_string()),
            message: Some("Is July good for Amboseli?".to_string()),
            phone: Some(String::new()),
            travelers: Some(2),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(inquiry.phone, None);
        assert_eq!(inquiry.travelers, Some(2));

        let err = InquirySubmission {
            name: Some("Tom".to_string()),
            email: Some("tom@example.com".to_string()),
            message: Some("Hi".to_string()),
            travelers: Some(0),
            ..Default::default()
        }
        .validate();
        assert!(err.is_err());

        assert!(InquirySubmission::default().validate().is_err());
    }

    #[test]
    fn test_callback_validation() {
        let callback = CallbackSubmission {
            name: Some("Amina".to_string()),
            phone: Some("+254 700 000 000".to_string()),
            email: Some("amina@example.com".to_string()),
            message: None,
        }
        .validate()
        .unwrap();
        assert_eq!(callback.phone, "+254 700 000 000");

        let missing_phone = CallbackSubmission {
            name: Some("Amina".to_string()),
            email: Some("amina@example.com".to_string()),
            ..Default::default()
        };
        assert!(missing_phone.validate().is_err());
    }

    #[test]
    fn test_review_query_is_lenient() {
        let query = ReviewQuery {
            package_id: Some(String::new()),
            featured: Some("1".to_string()),
            limit: Some("abc".to_string()),
        };
        assert_eq!(query.into_filter(), ReviewFilter::default());

        let query = ReviewQuery {
            package_id: Some("amboseli-2d".to_string()),
            featured: Some("true".to_string()),
            limit: Some("3".to_string()),
        };
        assert_eq!(
            query.into_filter(),
            ReviewFilter {
                package_id: Some("amboseli-2d".to_string()),
                featured: true,
                limit: Some(3),
            }
        );
    }

    #[test]
    fn test_review_notification_text() {
        let review = Review {
            id: Uuid::new_v4(),
            package_id: None,
            customer_name: "Wanjiru".to_string(),
            customer_email: "wanjiru@example.com".to_string(),
            customer_location: None,
            title: "t".to_string(),
            content: "c".to_string(),
            rating: 4,
            travel_date: None,
            admin_approved: false,
            verified: false,
            featured: false,
            created_at: Utc::now(),
        };

        let notification = NewNotification::for_review(&review, "admin@example.com");
        assert_eq!(notification.kind, NotificationKind::NewReview);
        assert_eq!(notification.record_id, review.id);
        assert_eq!(
            notification.message,
            "A new review has been submitted by Wanjiru for approval."
        );
    }
}
