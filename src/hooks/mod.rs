//! Cast, validation and stringify hooks
//!
//! Hooks are stored function values attached to a [`ColumnMapping`]. Cast
//! and validator hooks receive a [`HookContext`] explicitly, which is how
//! they reach the message templates.
//!
//! [`ColumnMapping`]: crate::model::ColumnMapping

pub mod casts;
pub mod formatters;
pub mod stringifiers;
pub mod validators;

use crate::messages::{MessageBuilder, MessageTemplates};
use crate::value::{CellValue, Value};
use std::sync::Arc;

/// Read-only context handed to every cast and validator call
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub templates: &'a MessageTemplates,
}

impl<'a> HookContext<'a> {
    pub fn new(templates: &'a MessageTemplates) -> Self {
        Self { templates }
    }
}

/// Result of a cast hook
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// Cast value; `Value::Null` leaves the field untouched
    Success(Value),
    /// Cast failed with a message for the row
    Failure(MessageBuilder),
    /// Plain type mismatch, reported generically by the row processor
    Invalid,
}

/// Result of a validator hook
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub valid: bool,
    pub message: Option<MessageBuilder>,
}

impl Validation {
    pub fn success() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn failure(message: MessageBuilder) -> Self {
        Self {
            valid: false,
            message: Some(message),
        }
    }

    /// Invalid without a specific message
    pub fn invalid() -> Self {
        Self {
            valid: false,
            message: None,
        }
    }
}

pub type CastFn = Arc<dyn Fn(&CellValue, &HookContext<'_>) -> CastOutcome + Send + Sync>;

pub type ValidatorFn = Arc<dyn Fn(&Value, &HookContext<'_>) -> Validation + Send + Sync>;

/// Returns `None` when the value cannot be rendered
pub type StringifierFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub fn cast<F>(f: F) -> CastFn
where
    F: Fn(&CellValue, &HookContext<'_>) -> CastOutcome + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn validator<F>(f: F) -> ValidatorFn
where
    F: Fn(&Value, &HookContext<'_>) -> Validation + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn stringifier<F>(f: F) -> StringifierFn
where
    F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(f)
}
