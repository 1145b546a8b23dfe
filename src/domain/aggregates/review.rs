//! Review aggregate and purchase gating

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(skip)]
    pub goods_id: Uuid,
    pub review: String,
    pub star: f64,
    #[serde(serialize_with = "dotted_date")]
    pub created_at: DateTime<Utc>,
}

fn dotted_date<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&at.format("%Y.%m.%d").to_string())
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewReview {
    #[validate(length(min = 10, message = "Please register your review with at least 10 characters."))]
    pub review: String,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub star: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ReviewPatch {
    #[validate(length(min = 10, message = "Please register your review with at least 10 characters."))]
    pub review: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub star: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReviewDenied {
    #[error("Only users who have placed an order can leave a review.")]
    NotPurchased,
    #[error("I've already written a review.")]
    AlreadyReviewed,
}

/// A review may be written once the user has ordered the goods and has not
/// reviewed it yet. The purchase check wins when both fail.
pub fn check_eligibility(has_ordered: bool, has_reviewed: bool) -> Result<(), ReviewDenied> {
    if !has_ordered { return Err(ReviewDenied::NotPurchased); }
    if has_reviewed { return Err(ReviewDenied::AlreadyReviewed); }
    Ok(())
}

/// Heuristic shown on the detail page: true while the user's order count for
/// the goods is at least their review count.
pub fn is_ordered(order_count: i64, review_count: i64) -> bool { order_count >= review_count }

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_eligibility_matrix() {
        assert_eq!(check_eligibility(true, false), Ok(()));
        assert_eq!(check_eligibility(false, false), Err(ReviewDenied::NotPurchased));
        assert_eq!(check_eligibility(false, true), Err(ReviewDenied::NotPurchased));
        assert_eq!(check_eligibility(true, true), Err(ReviewDenied::AlreadyReviewed));
    }

    #[test]
    fn test_short_review_is_invalid() {
        let r = NewReview { review: "too short".into(), star: 4.0 };
        let errors = r.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("review"));
        assert!(NewReview { review: "Fresh and tasty noodles".into(), star: 4.0 }.validate().is_ok());
    }

    #[test]
    fn test_star_out_of_range_is_invalid() {
        assert!(NewReview { review: "Fresh and tasty noodles".into(), star: 6.0 }.validate().is_err());
    }

    #[test]
    fn test_patch_validates_only_present_fields() {
        assert!(ReviewPatch::default().validate().is_ok());
        assert!(ReviewPatch { review: Some("meh".into()), star: None }.validate().is_err());
    }

    #[test]
    fn test_is_ordered_heuristic() {
        assert!(is_ordered(0, 0));
        assert!(is_ordered(2, 1));
        assert!(!is_ordered(0, 1));
    }

    #[test]
    fn test_created_at_renders_dotted() {
        let r = Review {
            id: Uuid::nil(), user_id: Uuid::nil(), goods_id: Uuid::nil(), review: "Arrived quickly, well packed".into(), star: 5.0,
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["created_at"], "2024.03.09");
        assert!(v.get("goods_id").is_none());
    }
}
