// person.rs
use crate::document::DocumentBlob;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passport {
  pub series: String,
  pub number: String,
  pub issued_by: String,
  pub issue_date: NaiveDate,
  pub department_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub name: String,
  pub surname: String,
  #[serde(default)]
  pub patronymic: Option<String>,
  #[serde(default)]
  pub person_type: String,
  pub birth_date: NaiveDate,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub registration_address: String,
  #[serde(default)]
  pub actual_address: String,
  #[serde(default)]
  pub postal_address: String,
  pub passport: Passport,
  #[serde(default)]
  pub citizenship_country_code: Option<String>,
  #[serde(default)]
  pub migration_card_number: Option<String>,
  #[serde(default)]
  pub residence_permit_number: Option<String>,
  #[serde(default)]
  pub documents: Vec<DocumentBlob>,
}

impl Person {
  /// Años cumplidos en `on`.
  pub fn age_on(&self, on: NaiveDate) -> i32 {
    let mut age = on.year() - self.birth_date.year();
    if (on.month(), on.day()) < (self.birth_date.month(), self.birth_date.day()) {
      age -= 1;
    }
    age
  }

  /// Copia del perfil sin los documentos adjuntos (lo que se persiste como
  /// fila de persona o de cliente).
  pub fn profile(&self) -> Person {
    Person { documents: Vec::new(), ..self.clone() }
  }
}

/// Persona asegurada de una póliza. Si falta, se omiten todos los
/// sub-pasos de persona.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuredPerson {
  #[default]
  Absent,
  Present(Person),
}

impl InsuredPerson {
  pub fn as_person(&self) -> Option<&Person> {
    match self {
      InsuredPerson::Absent => None,
      InsuredPerson::Present(p) => Some(p),
    }
  }
}

impl From<Option<Person>> for InsuredPerson {
  fn from(p: Option<Person>) -> Self {
    match p {
      Some(p) => InsuredPerson::Present(p),
      None => InsuredPerson::Absent,
    }
  }
}
