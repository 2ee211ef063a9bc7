//! Filter construction for the read and write endpoints.
//!
//! Every function here is pure: absent or empty inputs widen the match instead of
//! failing, with the single exception of [`id_filter`], which has to parse the
//! store's native identifier.

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};

use crate::{
    error::AppError,
    models::{ADMIN_ROLE, ITEM_REPLACEABLE_FIELDS},
};

/// The two fixed catalog sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Club,
    Local,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Club => "club",
            Self::Local => "local",
        }
    }
}

/// Treats `Some("")` the same as `None`.
fn supplied(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Case-insensitive substring match on `title`.
///
/// The term is escaped, so `.` or `(` in a search box match themselves rather than
/// being interpreted by the store's regex engine.
fn title_search(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

/// Filter for the general catalog listing (GET /jerseys).
///
/// Provider email and title search are independent constraints and compose with AND.
pub fn item_filter(provider_email: Option<&str>, search: Option<&str>) -> Document {
    let mut filter = Document::new();
    if let Some(email) = supplied(provider_email) {
        filter.insert("providerEmail", email);
    }
    if let Some(term) = supplied(search) {
        filter.insert("title", title_search(term));
    }
    filter
}

/// Filter for the category listings. The category constraint is always present.
pub fn category_filter(category: Category, search: Option<&str>) -> Document {
    let mut filter = doc! { "category": category.as_str() };
    if let Some(term) = supplied(search) {
        filter.insert("title", title_search(term));
    }
    filter
}

/// Exact match on the `email` field. A missing email only matches documents whose
/// `email` is null or absent, never the whole collection.
pub fn email_filter(email: Option<&str>) -> Document {
    match email {
        Some(email) => doc! { "email": email },
        None => doc! { "email": Bson::Null },
    }
}

/// Filter for a shopper's cart (GET /carts?email=).
pub fn cart_filter(email: Option<&str>) -> Document {
    email_filter(email)
}

/// Parses a path identifier into `{_id: ObjectId}`.
///
/// Failures are logged once, when the error is rendered.
pub fn id_filter(raw: &str) -> Result<Document, AppError> {
    let oid = ObjectId::parse_str(raw)
        .map_err(|_| AppError::MalformedIdentifier(raw.to_string()))?;
    Ok(doc! { "_id": oid })
}

/// Builds the `$set` fields for replacing an item.
///
/// Only whitelisted fields are copied. A whitelisted field missing from the body is
/// set to null, so the update always rewrites the full whitelisted set.
pub fn item_replacement(body: &Document) -> Document {
    ITEM_REPLACEABLE_FIELDS
        .iter()
        .map(|&field| {
            let value = body.get(field).cloned().unwrap_or(Bson::Null);
            (field.to_string(), value)
        })
        .collect()
}

/// The `$set` fields for promoting a user.
pub fn admin_promotion() -> Document {
    doc! { "role": ADMIN_ROLE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_filter_empty_inputs_match_everything() {
        assert!(item_filter(None, None).is_empty());
        assert!(item_filter(Some(""), Some("")).is_empty());
    }

    #[test]
    fn test_item_filter_composes_email_and_search() {
        let filter = item_filter(Some("seller@x.com"), Some("ab"));

        assert_eq!(filter.get_str("providerEmail").unwrap(), "seller@x.com");
        let title = filter.get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), "ab");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_item_filter_email_only() {
        let filter = item_filter(Some("seller@x.com"), None);
        assert_eq!(filter, doc! { "providerEmail": "seller@x.com" });
    }

    #[test]
    fn test_search_term_is_escaped() {
        let filter = item_filter(None, Some("a.b(c"));
        let title = filter.get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"a\.b\(c");
    }

    #[test]
    fn test_category_filter_always_constrains_category() {
        assert_eq!(category_filter(Category::Club, None), doc! { "category": "club" });
        assert_eq!(category_filter(Category::Local, Some("")), doc! { "category": "local" });

        let filter = category_filter(Category::Local, Some("home"));
        assert_eq!(filter.get_str("category").unwrap(), "local");
        assert!(filter.get_document("title").is_ok());
    }

    #[test]
    fn test_cart_filter_without_email_matches_null() {
        assert_eq!(cart_filter(Some("a@x.com")), doc! { "email": "a@x.com" });
        assert_eq!(cart_filter(None), doc! { "email": Bson::Null });
    }

    #[test]
    fn test_id_filter() {
        let oid = ObjectId::new();
        assert_eq!(id_filter(&oid.to_hex()).unwrap(), doc! { "_id": oid });
        assert!(matches!(
            id_filter("not-an-id"),
            Err(AppError::MalformedIdentifier(raw)) if raw == "not-an-id"
        ));
    }

    #[test]
    fn test_item_replacement_whitelists_and_nulls() {
        let body = doc! {
            "title": "Away Kit",
            "price": 45,
            "providerEmail": "intruder@x.com",
            "_id": "ignored",
        };
        let fields = item_replacement(&body);

        assert_eq!(fields.len(), ITEM_REPLACEABLE_FIELDS.len());
        assert_eq!(fields.get_str("title").unwrap(), "Away Kit");
        assert_eq!(fields.get("price"), Some(&Bson::Int32(45)));
        assert_eq!(fields.get("gsm"), Some(&Bson::Null));
        assert!(fields.get("providerEmail").is_none());
        assert!(fields.get("_id").is_none());
    }

    #[test]
    fn test_admin_promotion() {
        assert_eq!(admin_promotion(), doc! { "role": "admin" });
    }
}
