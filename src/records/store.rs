//! Record store trait and its in-process implementation.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::models::{
    CallbackRequest, Inquiry, NewCallbackRequest, NewInquiry, NewNotification, NewReview,
    Notification, Review, ReviewFilter,
};
use crate::error::{Result, RiverdaleError};

/// A persistent record store queryable by filters.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a review. New reviews are never approved, verified or featured.
    async fn insert_review(&self, review: NewReview) -> Result<Review>;

    /// Approved reviews matching `filter`, newest first.
    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>>;

    /// Insert a travel inquiry.
    async fn insert_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry>;

    /// Insert a callback request.
    async fn insert_callback_request(&self, request: NewCallbackRequest)
        -> Result<CallbackRequest>;

    /// Queue an admin notification.
    async fn enqueue_notification(&self, notification: NewNotification) -> Result<Notification>;
}

/// Record store held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    reviews: RwLock<Vec<Review>>,
    inquiries: RwLock<Vec<Inquiry>>,
    callback_requests: RwLock<Vec<CallbackRequest>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a review approved, and optionally featured.
    pub fn approve_review(&self, id: Uuid, featured: bool) -> Result<Review> {
        let mut reviews = self.reviews.write();
        let review = reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RiverdaleError::Store(format!("review {} not found", id)))?;
        review.admin_approved = true;
        review.featured = featured;
        Ok(review.clone())
    }

    /// Every stored inquiry.
    pub fn inquiries(&self) -> Vec<Inquiry> {
        self.inquiries.read().clone()
    }

    /// Every stored callback request.
    pub fn callback_requests(&self) -> Vec<CallbackRequest> {
        self.callback_requests.read().clone()
    }

    /// Every queued notification.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().clone()
    }

    /// Every stored review, approved or not.
    pub fn all_reviews(&self) -> Vec<Review> {
        self.reviews.read().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let review = Review {
            id: Uuid::new_v4(),
            package_id: review.package_id,
            customer_name: review.customer_name,
            customer_email: review.customer_email,
            customer_location: review.customer_location,
            title: review.title,
            content: review.content,
            rating: review.rating,
            travel_date: review.travel_date,
            admin_approved: false,
            verified: false,
            featured: false,
            created_at: Utc::now(),
        };
        self.reviews.write().push(review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>> {
        let reviews = self.reviews.read();
        // Insertion order is creation order
        let matching = reviews
            .iter()
            .rev()
            .filter(|r| r.admin_approved)
            .filter(|r| match &filter.package_id {
                Some(package_id) => r.package_id.as_ref() == Some(package_id),
                None => true,
            })
            .filter(|r| !filter.featured || r.featured)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    async fn insert_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry> {
        let inquiry = Inquiry {
            id: Uuid::new_v4(),
            name: inquiry.name,
            email: inquiry.email,
            phone: inquiry.phone,
            package_id: inquiry.package_id,
            destination: inquiry.destination,
            message: inquiry.message,
            travel_date: inquiry.travel_date,
            travelers: inquiry.travelers,
            created_at: Utc::now(),
        };
        self.inquiries.write().push(inquiry.clone());
        Ok(inquiry)
    }

    async fn insert_callback_request(
        &self,
        request: NewCallbackRequest,
    ) -> Result<CallbackRequest> {
        let request = CallbackRequest {
            id: Uuid::new_v4(),
            name: request.name,
            phone: request.phone,
            email: request.email,
            message: request.message,
            created_at: Utc::now(),
        };
        self.callback_requests.write().push(request.clone());
        Ok(request)
    }

    async fn enqueue_notification(&self, notification: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: notification.kind,
            recipient_email: notification.recipient_email,
            title: notification.title,
            message: notification.message,
            record_id: notification.record_id,
            created_at: Utc::now(),
        };
        self.notifications.write().push(notification.clone());
        Ok(notification)
    }
}
