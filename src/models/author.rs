//! Author model and form

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{self, Collector, FieldError, FormInput, ALPHANUMERIC};

use super::format_date;

/// Full author record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Family, First"
    pub fn name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }

    /// e.g. "Jan 3, 1892 - Sep 2, 1973"; either side may be blank
    pub fn lifespan(&self) -> String {
        let birth = self.date_of_birth.map(format_date).unwrap_or_default();
        let death = self.date_of_death.map(format_date).unwrap_or_default();
        if birth.is_empty() && death.is_empty() {
            String::new()
        } else {
            format!("{} - {}", birth, death)
        }
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }

    pub fn view(&self) -> AuthorView<'_> {
        AuthorView {
            author: self,
            name: self.name(),
            lifespan: self.lifespan(),
            url: self.url(),
        }
    }
}

/// Author with its derived display fields
#[derive(Debug, Serialize)]
pub struct AuthorView<'a> {
    #[serde(flatten)]
    pub author: &'a Author,
    pub name: String,
    pub lifespan: String,
    pub url: String,
}

/// Validated author data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl NewAuthor {
    pub fn into_author(self, id: Uuid) -> Author {
        Author {
            id,
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

/// Author create/update form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AuthorForm {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "First name must be specified."),
        regex(path = *ALPHANUMERIC, message = "First name has non-alphanumeric characters.")
    )]
    pub first_name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Family name must be specified."),
        regex(path = *ALPHANUMERIC, message = "Family name has non-alphanumeric characters.")
    )]
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub date_of_death: String,
}

impl FormInput for AuthorForm {
    type Output = NewAuthor;

    const FIELDS: &'static [&'static str] =
        &["first_name", "family_name", "date_of_birth", "date_of_death"];

    fn trim(mut self) -> Self {
        self.first_name = validation::trimmed(self.first_name);
        self.family_name = validation::trimmed(self.family_name);
        self.date_of_birth = validation::trimmed(self.date_of_birth);
        self.date_of_death = validation::trimmed(self.date_of_death);
        self
    }

    fn escape(mut self) -> Self {
        self.first_name = validation::escaped(self.first_name);
        self.family_name = validation::escaped(self.family_name);
        self
    }

    fn build(&self) -> Result<NewAuthor, Vec<FieldError>> {
        let mut errors = Collector::default();
        let date_of_birth = errors.take(validation::optional_date(
            "date_of_birth",
            &self.date_of_birth,
            "Invalid date of birth",
        ));
        let date_of_death = errors.take(validation::optional_date(
            "date_of_death",
            &self.date_of_death,
            "Invalid date of death",
        ));

        errors.finish(NewAuthor {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth,
            date_of_death,
        })
    }
}
