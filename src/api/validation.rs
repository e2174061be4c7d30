use super::ApiError;
use crate::domain::ItemId;

/// Path ids that are not positive integers cannot name a record, so they
/// get the same answer as a missing one.
pub fn parse_item_id(raw: &str) -> Result<ItemId, ApiError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(ItemId::new(id)),
        _ => Err(ApiError::not_found("Item")),
    }
}

pub fn parse_notification_id(raw: &str) -> Result<i32, ApiError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::not_found("Notification")),
    }
}
