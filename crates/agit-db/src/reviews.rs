//! Database operations for the `reviews` table.

use agit_core::{Review, ValidationError};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::areas::get_area;
use crate::DbError;

pub const MAX_COMMENT_CHARS: usize = 500;

/// A row from the `reviews` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub area_id: Uuid,
    pub user_id: Option<Uuid>,
    pub cleanliness: i16,
    pub is_available: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRow {
    #[must_use]
    pub fn into_review(self) -> Review {
        Review {
            id: self.id,
            area_id: self.area_id,
            user_id: self.user_id,
            cleanliness: self.cleanliness,
            is_available: self.is_available,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub cleanliness: i16,
    pub is_available: bool,
    pub comment: Option<String>,
}

impl NewReview {
    /// Range-check cleanliness, trim the comment, and drop it when blank.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Cleanliness`] outside 1..=5 or
    /// [`ValidationError::CommentTooLong`] past 500 characters.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&self.cleanliness) {
            return Err(ValidationError::Cleanliness(self.cleanliness));
        }
        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
        {
            return Err(ValidationError::CommentTooLong {
                max: MAX_COMMENT_CHARS,
            });
        }
        Ok(Self { comment, ..self })
    }
}

/// # Errors
///
/// Returns [`DbError::Validation`] for invalid input, [`DbError::NotFound`]
/// if the area does not exist, or [`DbError::Sqlx`] if the insert fails.
pub async fn create_review(
    pool: &PgPool,
    area_id: Uuid,
    user_id: Option<Uuid>,
    review: NewReview,
) -> Result<ReviewRow, DbError> {
    let review = review.validate()?;
    get_area(pool, area_id).await?;

    let row = sqlx::query_as::<_, ReviewRow>(
        "INSERT INTO reviews (area_id, user_id, cleanliness, is_available, comment) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, area_id, user_id, cleanliness, is_available, comment, created_at",
    )
    .bind(area_id)
    .bind(user_id)
    .bind(review.cleanliness)
    .bind(review.is_available)
    .bind(&review.comment)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Reviews for an area, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews(pool: &PgPool, area_id: Uuid) -> Result<Vec<ReviewRow>, DbError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, area_id, user_id, cleanliness, is_available, comment, created_at \
         FROM reviews \
         WHERE area_id = $1 \
         ORDER BY created_at DESC, id",
    )
    .bind(area_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(cleanliness: i16, comment: Option<&str>) -> NewReview {
        NewReview {
            cleanliness,
            is_available: true,
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn cleanliness_must_be_one_to_five() {
        assert!(review(1, None).validate().is_ok());
        assert!(review(5, None).validate().is_ok());
        assert_eq!(
            review(0, None).validate().unwrap_err(),
            ValidationError::Cleanliness(0)
        );
        assert!(review(6, None).validate().is_err());
    }

    #[test]
    fn blank_comment_becomes_none() {
        let validated = review(3, Some("   ")).validate().unwrap();
        assert!(validated.comment.is_none());
    }

    #[test]
    fn comment_over_limit_is_rejected() {
        let long = "가".repeat(MAX_COMMENT_CHARS + 1);
        assert!(matches!(
            review(3, Some(&long)).validate(),
            Err(ValidationError::CommentTooLong { max: 500 })
        ));
        let at_limit = "가".repeat(MAX_COMMENT_CHARS);
        assert!(review(3, Some(&at_limit)).validate().is_ok());
    }
}
