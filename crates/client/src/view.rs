//! Plain-text views of the listing, the form and the fault fallback.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use mercado_core::{DraftField, Product, ProductId};

use crate::boundary::Fault;
use crate::session::{EditSession, SessionMode};
use crate::store::Snapshot;

pub const LISTING_HEADING: &str = "Registered products";
pub const EMPTY_LISTING: &str = "No products registered yet.";

/// One listing row, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    /// Price with currency prefix and two decimals.
    pub price: String,
    pub stock: String,
    /// Last update time, normalized to RFC 3339 when parseable.
    pub updated: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price.display(),
            stock: format!("{} units", product.stock_quantity),
            updated: format_timestamp(&product.updated_at),
        }
    }
}

/// The form as it should be presented for the current session mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub heading: String,
    pub submit_label: &'static str,
    /// Cancel is only offered while editing.
    pub cancel_offered: bool,
    pub fields: [(DraftField, String); 3],
}

impl From<&EditSession> for FormView {
    fn from(session: &EditSession) -> Self {
        let (heading, submit_label, cancel_offered) = match session.mode() {
            SessionMode::Create => ("New product".to_string(), "Create", false),
            SessionMode::Editing(id) => (format!("Edit product #{id}"), "Update", true),
        };
        let draft = session.draft();

        Self {
            heading,
            submit_label,
            cancel_offered,
            fields: [DraftField::Name, DraftField::Price, DraftField::Stock]
                .map(|field| (field, draft.get(field).to_string())),
        }
    }
}

/// Normalize a service timestamp to RFC 3339 (UTC, whole seconds).
///
/// Unparseable text is returned as-is.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim()).map_or_else(
        |_| raw.to_string(),
        |t| {
            t.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        },
    )
}

/// Render the product listing.
#[must_use]
pub fn render_listing(snapshot: &Snapshot) -> String {
    let mut out = format!("{LISTING_HEADING}\n");
    if snapshot.is_empty() {
        out.push_str(EMPTY_LISTING);
        out.push('\n');
        return out;
    }

    for row in snapshot.products().iter().map(ProductRow::from) {
        let id = format!("#{}", row.id);
        let _ = write!(out, "{id:<6} {:<30} {:>12}  {:>10}", row.name, row.price, row.stock);
        if !row.updated.is_empty() {
            let _ = write!(out, "  updated {}", row.updated);
        }
        out.push('\n');
    }
    out
}

/// Render the create/edit form.
#[must_use]
pub fn render_form(session: &EditSession) -> String {
    let form = FormView::from(session);
    let mut out = format!("{}\n", form.heading);
    for (field, value) in &form.fields {
        let _ = writeln!(out, "  {field:<6} [{value}]");
    }

    let _ = write!(out, "  > submit ({})", form.submit_label);
    if form.cancel_offered {
        out.push_str("  > cancel");
    }
    out.push('\n');
    out
}

/// Render the whole interface: form, then listing.
#[must_use]
pub fn render_page(snapshot: &Snapshot, session: &EditSession) -> String {
    format!("{}\n{}", render_form(session), render_listing(snapshot))
}

/// Fallback shown in place of the interface once the boundary has faulted.
#[must_use]
pub fn render_fault(fault: &Fault) -> String {
    format!(
        "The application hit an unexpected error at {}.\n{}\n\
         Restart the console (or run `reload`) to continue.\n",
        fault
            .occurred_at()
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        fault.message()
    )
}
