use rust_decimal::Decimal;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

const MAX_RESTAURANT_LEN: usize = 200;
const MAX_COMMENT_LEN: usize = 2000;

/// Checks that a star score lies within 1..=5.
pub fn validate_score(field: &str, score: i16) -> Result<i16, AppError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(AppError::ValidationError(format!(
            "{field} must be between {MIN_SCORE} and {MAX_SCORE}"
        )));
    }
    Ok(score)
}

pub fn validate_restaurant(restaurant: &str) -> Result<String, AppError> {
    let trimmed = restaurant.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(
            "Restaurant name is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_RESTAURANT_LEN {
        return Err(AppError::ValidationError(format!(
            "Restaurant name must be at most {MAX_RESTAURANT_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_total_cost(cost: Option<Decimal>) -> Result<Option<Decimal>, AppError> {
    match cost {
        Some(value) if value.is_sign_negative() => Err(AppError::ValidationError(
            "Total cost cannot be negative".to_string(),
        )),
        other => Ok(other),
    }
}

/// Empty or whitespace-only comments are stored as absent.
pub fn normalize_comment(comment: Option<String>) -> Result<Option<String>, AppError> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::ValidationError(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// Drops repeated ids, keeping the first occurrence.
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
