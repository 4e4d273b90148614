//! Validation gate
//!
//! A configured `Validator` sees the complete prospective attribute mapping
//! (current attributes merged with the proposal) before anything is
//! committed. A rejection leaves the model untouched.

use super::attributes::Attributes;
use super::store::Proposal;
use super::Model;
use crate::errors::{ModelError, Result, ValidationError};
use crate::events::ModelEvent;
use crate::model::Options;

/// Judges whether a complete attribute mapping is acceptable
pub trait Validator {
    /// # Errors
    ///
    /// Returns the reason the mapping is rejected.
    fn validate(&self, attrs: &Attributes) -> std::result::Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Attributes) -> std::result::Result<(), ValidationError>,
{
    fn validate(&self, attrs: &Attributes) -> std::result::Result<(), ValidationError> {
        self(attrs)
    }
}

/// Run the gate for a pending mutation
///
/// Silent mutations and models without a validator always pass. On
/// rejection the caller's error callback is invoked if present, otherwise an
/// `Error` event is published.
pub(crate) fn gate(model: &Model, proposal: &Proposal, options: &Options) -> Result<()> {
    if options.silent {
        return Ok(());
    }
    let Some(validator) = model.validator() else {
        return Ok(());
    };

    let prospective = model.with_store(|store| store.prospective(proposal));
    match validator.validate(&prospective) {
        Ok(()) => Ok(()),
        Err(rejection) => {
            tracing::debug!(
                client_id = %model.client_id(),
                attr = rejection.attribute.as_deref().unwrap_or(""),
                reason = %rejection.message,
                "validation rejected mutation"
            );
            let err = ModelError::Invalid(rejection);
            match &options.error {
                Some(callback) => callback(model, &err),
                None => model.publish(ModelEvent::Error(err.clone())),
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn non_negative_age(attrs: &Attributes) -> std::result::Result<(), ValidationError> {
        match attrs.get("age").and_then(|v| v.as_i64()) {
            Some(age) if age < 0 => Err(ValidationError::for_attribute("age", "must be >= 0")),
            _ => Ok(()),
        }
    }

    #[test]
    fn test_closure_validator() {
        let validator = non_negative_age;
        assert!(validator
            .validate(&Attributes::new().with("age", 3))
            .is_ok());
        assert!(validator
            .validate(&Attributes::new().with("age", -1))
            .is_err());
    }

    #[test]
    fn test_gate_sees_merged_mapping() {
        let model = Model::builder()
            .attributes(Attributes::new().with("min", 5))
            .validator(|attrs: &Attributes| {
                let min = attrs.get("min").and_then(|v| v.as_i64()).unwrap_or(0);
                let max = attrs.get("max").and_then(|v| v.as_i64()).unwrap_or(i64::MAX);
                if min > max {
                    Err(ValidationError::new("min exceeds max"))
                } else {
                    Ok(())
                }
            })
            .build()
            .unwrap();

        let rejected = Proposal::new(Attributes::new().with("max", 1), false);
        assert!(gate(&model, &rejected, &Options::new().on_error(|_, _| {})).is_err());

        let accepted = Proposal::new(Attributes::new().with("max", 9), false);
        assert!(gate(&model, &accepted, &Options::new()).is_ok());
        assert_eq!(model.get("max"), None);
        assert_eq!(model.get("min"), Some(json!(5)));
    }

    #[test]
    fn test_gate_skipped_when_silent() {
        let model = Model::builder()
            .validator(non_negative_age)
            .build()
            .unwrap();

        let proposal = Proposal::new(Attributes::new().with("age", -4), false);
        assert!(gate(&model, &proposal, &Options::new().silent()).is_ok());
    }
}
