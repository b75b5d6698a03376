//! CRM business entities the search subsystem works over: companies and
//! their directly related rows.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub legal_name: Option<String>,
    /// Tax identifier (ИНН).
    pub tax_id: Option<String>,
    /// Identifier in the CRM this record was migrated from.
    pub external_id: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub schedule: Option<String>,
    pub primary_phone: Option<String>,
    pub primary_email: Option<String>,
    pub secondary_email: Option<String>,
    /// Raw payload captured during migration, stored as JSON text.
    pub raw_import: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CompanyPhone {
    pub id: i32,
    pub company_id: i32,
    pub number: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CompanyEmail {
    pub id: i32,
    pub company_id: i32,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Contact {
    pub id: i32,
    pub company_id: i32,
    pub full_name: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContactPhone {
    pub id: i32,
    pub contact_id: i32,
    pub company_id: i32,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContactEmail {
    pub id: i32,
    pub contact_id: i32,
    pub company_id: i32,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Note {
    pub id: i32,
    pub company_id: i32,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    pub id: i32,
    pub company_id: i32,
    pub title: String,
    pub description: Option<String>,
}

/// Every related row of one company, the unit the index builder and the
/// explain engine consume. Loaded in bulk, never per-row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRelated {
    pub phones: Vec<CompanyPhone>,
    pub emails: Vec<CompanyEmail>,
    pub contacts: Vec<Contact>,
    pub contact_phones: Vec<ContactPhone>,
    pub contact_emails: Vec<ContactEmail>,
    pub notes: Vec<Note>,
    pub tasks: Vec<Task>,
}

impl CompanyRelated {
    pub fn phones_of(&self, contact_id: i32) -> impl Iterator<Item = &ContactPhone> {
        self.contact_phones
            .iter()
            .filter(move |p| p.contact_id == contact_id)
    }

    pub fn emails_of(&self, contact_id: i32) -> impl Iterator<Item = &ContactEmail> {
        self.contact_emails
            .iter()
            .filter(move |e| e.contact_id == contact_id)
    }
}
