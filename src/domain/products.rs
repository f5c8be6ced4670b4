//! Field rules for products.
//!
//! Every rule reports a [`FieldViolation`] instead of failing fast so callers
//! can return the full list of problems in one response.

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 3000;
pub const PRICE_MAX: f64 = 1_000_000_000.0;
pub const STOCK_MAX: i64 = 999_999;
pub const REASON_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn normalize_name(raw: &str) -> Result<String, FieldViolation> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if chars == 0 {
        return Err(FieldViolation::new("name", "is required"));
    }
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(FieldViolation::new(
            "name",
            format!("must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn normalize_description(raw: &str) -> Result<String, FieldViolation> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if chars == 0 {
        return Err(FieldViolation::new("description", "is required"));
    }
    if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&chars) {
        return Err(FieldViolation::new(
            "description",
            format!(
                "must be between {DESCRIPTION_MIN_CHARS} and {DESCRIPTION_MAX_CHARS} characters"
            ),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn check_price(price: f64) -> Result<f64, FieldViolation> {
    if !price.is_finite() {
        return Err(FieldViolation::new("price", "must be a finite number"));
    }
    if price < 0.0 {
        return Err(FieldViolation::new("price", "must not be negative"));
    }
    if price > PRICE_MAX {
        return Err(FieldViolation::new(
            "price",
            format!("must not exceed {PRICE_MAX}"),
        ));
    }
    Ok(price)
}

pub fn check_stock(stock: i64) -> Result<i32, FieldViolation> {
    if stock < 0 {
        return Err(FieldViolation::new("stock", "must not be negative"));
    }
    if stock > STOCK_MAX {
        return Err(FieldViolation::new(
            "stock",
            format!("must not exceed {STOCK_MAX}"),
        ));
    }
    i32::try_from(stock).map_err(|_| FieldViolation::new("stock", "is out of range"))
}

pub fn normalize_reason(raw: &str) -> Result<String, FieldViolation> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > REASON_MAX_CHARS {
        return Err(FieldViolation::new(
            "reason",
            format!("must not exceed {REASON_MAX_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// A fully validated set of product fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub is_active: bool,
}

impl ProductDraft {
    pub fn validate(
        name: &str,
        description: &str,
        price: f64,
        stock: i64,
        is_active: bool,
    ) -> Result<Self, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        let name = collect(normalize_name(name), &mut violations);
        let description = collect(normalize_description(description), &mut violations);
        let price = collect(check_price(price), &mut violations);
        let stock = collect(check_stock(stock), &mut violations);

        match (name, description, price, stock) {
            (Some(name), Some(description), Some(price), Some(stock)) => Ok(Self {
                name,
                description,
                price,
                stock,
                is_active,
            }),
            _ => Err(violations),
        }
    }
}

/// A validated partial update. At least one field is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    pub fn validate(
        name: Option<&str>,
        description: Option<&str>,
        price: Option<f64>,
        stock: Option<i64>,
        is_active: Option<bool>,
    ) -> Result<Self, Vec<FieldViolation>> {
        if name.is_none()
            && description.is_none()
            && price.is_none()
            && stock.is_none()
            && is_active.is_none()
        {
            return Err(vec![FieldViolation::new("body", "no fields to update")]);
        }

        let mut violations = Vec::new();
        let changes = Self {
            name: name.and_then(|v| collect(normalize_name(v), &mut violations)),
            description: description
                .and_then(|v| collect(normalize_description(v), &mut violations)),
            price: price.and_then(|v| collect(check_price(v), &mut violations)),
            stock: stock.and_then(|v| collect(check_stock(v), &mut violations)),
            is_active,
        };

        if violations.is_empty() {
            Ok(changes)
        } else {
            Err(violations)
        }
    }

    pub fn from_draft(draft: ProductDraft) -> Self {
        Self {
            name: Some(draft.name),
            description: Some(draft.description),
            price: Some(draft.price),
            stock: Some(draft.stock),
            is_active: Some(draft.is_active),
        }
    }
}

fn collect<T>(result: Result<T, FieldViolation>, sink: &mut Vec<FieldViolation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(violation) => {
            sink.push(violation);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_accepts_boundary_values() {
        let draft = ProductDraft::validate("Abc", "ten chars!", 0.0, STOCK_MAX, true)
            .expect("boundaries are inclusive");
        assert_eq!(draft.stock, 999_999);
        assert_eq!(draft.price, 0.0);
    }

    #[test]
    fn draft_reports_every_failing_field() {
        let violations =
            ProductDraft::validate("ab", "short", -1.0, -5, true).expect_err("invalid draft");
        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "description", "price", "stock"]);
    }

    #[test]
    fn description_length_is_measured_after_trimming() {
        assert!(normalize_description("   123456789   ").is_err());
        assert_eq!(
            normalize_description("  1234567890  ").expect("valid"),
            "1234567890"
        );
    }

    #[test]
    fn price_rejects_nan_and_excess() {
        assert!(check_price(f64::NAN).is_err());
        assert!(check_price(PRICE_MAX + 1.0).is_err());
        assert!(check_price(PRICE_MAX).is_ok());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let violations =
            ProductChanges::validate(None, None, None, None, None).expect_err("empty patch");
        assert_eq!(violations[0].message, "no fields to update");
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let changes = ProductChanges::validate(None, None, Some(12.5), None, Some(false))
            .expect("valid patch");
        assert_eq!(changes.price, Some(12.5));
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.name.is_none());

        let violations = ProductChanges::validate(Some("x"), None, None, Some(1_000_000), None)
            .expect_err("invalid patch");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn reason_is_bounded() {
        assert!(normalize_reason(&"r".repeat(REASON_MAX_CHARS)).is_ok());
        assert!(normalize_reason(&"r".repeat(REASON_MAX_CHARS + 1)).is_err());
    }
}
