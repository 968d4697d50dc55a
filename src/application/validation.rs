//! Request checks shared by the use cases

use validator::{Validate, ValidationErrors};

use crate::application::dto::{CompositionRequest, LegalRequest};
use crate::application::errors::ComposeError;
use crate::application::use_cases::LegalError;
use crate::domain::value_objects::BackgroundKind;

/// Flatten validator output into a single readable line
pub fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .errors()
        .iter()
        .map(|(field, kind)| format!("{}: {}", field, kind_summary(kind)))
        .collect();
    parts.sort();
    parts.join(", ")
}

fn kind_summary(kind: &validator::ValidationErrorsKind) -> String {
    match kind {
        validator::ValidationErrorsKind::Field(errors) => errors
            .iter()
            .map(|e| e.code.to_string())
            .collect::<Vec<_>>()
            .join("|"),
        validator::ValidationErrorsKind::Struct(inner) => describe(inner),
        validator::ValidationErrorsKind::List(items) => items
            .values()
            .map(|inner| describe(inner))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Validate a composition request before any file is touched
pub fn validate_composition(request: &CompositionRequest) -> Result<(), ComposeError> {
    request
        .validate()
        .map_err(|e| ComposeError::InvalidRequest(describe(&e)))?;

    let image = &request.image;
    if !image.zoom.is_finite() {
        return Err(ComposeError::InvalidRequest(
            "zoom must be a finite number".to_string(),
        ));
    }
    if !image.pos.x.is_finite() || !image.pos.y.is_finite() {
        return Err(ComposeError::InvalidRequest(
            "crop offset must be finite".to_string(),
        ));
    }
    if image.kind == BackgroundKind::Custom
        && image.name.as_deref().map_or(true, |n| n.trim().is_empty())
    {
        return Err(ComposeError::InvalidRequest(
            "custom background requires an uploaded file name".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_legal(request: &LegalRequest) -> Result<(), LegalError> {
    request
        .validate()
        .map_err(|e| LegalError::InvalidRequest(describe(&e)))?;
    if request.photographer.trim().is_empty() {
        return Err(LegalError::InvalidRequest(
            "photographer cannot be empty".to_string(),
        ));
    }
    Ok(())
}
