use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::models::EntityId;

const MIN_NAME_CHARS: usize = 3;
const MIN_TELEPHONE_CHARS: usize = 6;
const MIN_SOCIAL_MEDIA_CHARS: usize = 3;

/// Supplier aggregate. Invariants are enforced on construction and on every
/// mutator, so an instance can never hold invalid field values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supplier {
    id: EntityId,
    name: String,
    telephone: String,
    social_media: String,
    is_active: bool,
}

impl Supplier {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        telephone: impl Into<String>,
        social_media: impl Into<String>,
        is_active: bool,
    ) -> Result<Self, ServiceError> {
        let name = name.into();
        let telephone = telephone.into();
        let social_media = social_media.into();

        validate_min_chars("name", &name, MIN_NAME_CHARS)?;
        validate_min_chars("telephone", &telephone, MIN_TELEPHONE_CHARS)?;
        validate_min_chars("social media", &social_media, MIN_SOCIAL_MEDIA_CHARS)?;

        Ok(Self {
            id,
            name,
            telephone,
            social_media,
            is_active,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn telephone(&self) -> &str {
        &self.telephone
    }

    pub fn social_media(&self) -> &str {
        &self.social_media
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Renames the supplier. A failed validation leaves the aggregate unchanged.
    pub fn change_name(&mut self, name: impl Into<String>) -> Result<(), ServiceError> {
        let name = name.into();
        validate_min_chars("name", &name, MIN_NAME_CHARS)?;
        self.name = name;
        Ok(())
    }

    pub fn change_telephone(&mut self, telephone: impl Into<String>) -> Result<(), ServiceError> {
        let telephone = telephone.into();
        validate_min_chars("telephone", &telephone, MIN_TELEPHONE_CHARS)?;
        self.telephone = telephone;
        Ok(())
    }

    pub fn change_social_media(
        &mut self,
        social_media: impl Into<String>,
    ) -> Result<(), ServiceError> {
        let social_media = social_media.into();
        validate_min_chars("social media", &social_media, MIN_SOCIAL_MEDIA_CHARS)?;
        self.social_media = social_media;
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

// Lengths are counted in characters so multibyte names validate like the
// user typed them, not like the bytes landed.
fn validate_min_chars(field: &str, value: &str, min: usize) -> Result<(), ServiceError> {
    if value.chars().count() < min {
        return Err(ServiceError::ValidationError(format!(
            "Supplier {} must be at least {} characters",
            field, min
        )));
    }
    Ok(())
}

/// Filter payload accepted by supplier search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierFilter {
    /// Case-insensitive substring match on the supplier name.
    pub name: Option<String>,
    /// Exact match on the active flag.
    pub is_active: Option<bool>,
}
