//! Genre model and form

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{self, FieldError, FormInput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }

    pub fn view(&self) -> GenreView<'_> {
        GenreView {
            genre: self,
            url: self.url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenreView<'a> {
    #[serde(flatten)]
    pub genre: &'a Genre,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GenreForm {
    #[serde(default)]
    #[validate(length(min = 3, message = "Name must contains at least 3 characters"))]
    pub name: String,
}

impl FormInput for GenreForm {
    /// Sanitized genre name
    type Output = String;

    const FIELDS: &'static [&'static str] = &["name"];

    fn trim(mut self) -> Self {
        self.name = validation::trimmed(self.name);
        self
    }

    fn escape(mut self) -> Self {
        self.name = validation::escaped(self.name);
        self
    }

    fn build(&self) -> Result<String, Vec<FieldError>> {
        Ok(self.name.clone())
    }
}
