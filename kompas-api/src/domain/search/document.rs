//! Index builder: turns a company and its related rows into the
//! denormalized [`SearchDocument`] the ranking service works over.

use crate::domain::company::{Company, CompanyRelated};

use super::text::{digits_only, fold, fold_glued, fold_punct_to_space};
use super::types::SearchDocument;

/// Upper bound on how much of the raw migration payload gets indexed.
const RAW_IMPORT_MAX_CHARS: usize = 1024;

/// Build the search document for one company. Pure and deterministic:
/// rebuilding from unchanged inputs produces an identical document.
pub fn build_document(company: &Company, related: &CompanyRelated) -> SearchDocument {
    let identifiers = identifiers_group(company);
    let names = names_group(company);
    let contacts = contacts_group(company, related);
    let other = other_group(company, related);

    let plain = fold(
        &[
            identifiers.as_str(),
            names.as_str(),
            contacts.as_str(),
            other.as_str(),
        ]
        .join("\n"),
    );

    SearchDocument {
        company_id: company.id,
        identifiers: fold(&identifiers),
        names: fold(&names),
        contacts: fold(&contacts),
        other: fold(&other),
        plain,
        digits: digits_blob(company, related),
        updated_at: company.updated_at,
    }
}

fn identifiers_group(company: &Company) -> String {
    let mut buf = String::new();
    push_line(&mut buf, "tax_id", company.tax_id.as_deref());
    push_line(&mut buf, "external_id", company.external_id.as_deref());
    buf
}

/// Names with their punctuation-normalized and glued variants, so quoted
/// and hyphenated names stay matchable however the user types them.
fn names_group(company: &Company) -> String {
    let mut buf = String::new();
    push_name_variants(&mut buf, "name", Some(&company.name));
    push_name_variants(&mut buf, "legal_name", company.legal_name.as_deref());
    buf
}

fn push_name_variants(buf: &mut String, label: &str, value: Option<&str>) {
    let Some(value) = value else { return };
    push_line(buf, label, Some(value));

    let normalized = fold_punct_to_space(value);
    if !normalized.is_empty() && normalized != fold(value) {
        push_line(buf, label, Some(&normalized));
    }
    if let Some(glued) = fold_glued(value) {
        push_line(buf, label, Some(&glued));
    }
}

fn contacts_group(company: &Company, related: &CompanyRelated) -> String {
    let mut buf = String::new();
    push_line(&mut buf, "email", company.primary_email.as_deref());
    push_line(&mut buf, "email", company.secondary_email.as_deref());
    for email in &related.emails {
        push_line(&mut buf, "email", Some(&email.address));
    }
    for contact in &related.contacts {
        push_line(&mut buf, "contact", Some(&contact.full_name));
        push_line(&mut buf, "title", contact.title.as_deref());
        push_line(&mut buf, "status", contact.status.as_deref());
        push_line(&mut buf, "note", contact.note.as_deref());
        for phone in related.phones_of(contact.id) {
            push_line(&mut buf, "phone", Some(&phone.number));
        }
        for email in related.emails_of(contact.id) {
            push_line(&mut buf, "email", Some(&email.address));
        }
    }
    buf
}

fn other_group(company: &Company, related: &CompanyRelated) -> String {
    let mut buf = String::new();
    push_line(&mut buf, "address", company.address.as_deref());
    push_line(&mut buf, "website", company.website.as_deref());
    push_line(&mut buf, "schedule", company.schedule.as_deref());
    for note in &related.notes {
        push_line(&mut buf, "note", Some(&note.body));
    }
    for task in &related.tasks {
        push_line(&mut buf, "task", Some(&task.title));
        push_line(&mut buf, "task", task.description.as_deref());
    }
    if let Some(raw) = company.raw_import.as_deref() {
        let bounded: String = raw.chars().take(RAW_IMPORT_MAX_CHARS).collect();
        push_line(&mut buf, "import", Some(&bounded));
    }
    buf
}

/// Digit projections of every phone- and ID-like field, space-joined, so a
/// phone query matches regardless of how the number was formatted.
fn digits_blob(company: &Company, related: &CompanyRelated) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut push_digits = |value: Option<&str>| {
        if let Some(value) = value {
            let digits = digits_only(value);
            if !digits.is_empty() {
                parts.push(digits);
            }
        }
    };

    push_digits(company.tax_id.as_deref());
    push_digits(company.external_id.as_deref());
    push_digits(company.primary_phone.as_deref());
    for phone in &related.phones {
        push_digits(Some(&phone.number));
    }
    for phone in &related.contact_phones {
        push_digits(Some(&phone.number));
    }

    parts.join(" ")
}

fn push_line(buf: &mut String, label: &str, value: Option<&str>) {
    let Some(value) = value.map(str::trim) else {
        return;
    };
    if value.is_empty() {
        return;
    }
    buf.push_str(label);
    buf.push_str(": ");
    buf.push_str(value);
    buf.push('\n');
}
