use crate::models::user::{reject_nul, trim_field, trim_optional};
use crate::models::wallet::validate_money;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 50;
pub const MAX_IMAGES: usize = 10;
const MAX_PRICE: i64 = 1_000_000;

/// Physical condition of a listed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl ListingCondition {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "new" => Ok(ListingCondition::New),
            "like_new" => Ok(ListingCondition::LikeNew),
            "good" => Ok(ListingCondition::Good),
            "fair" => Ok(ListingCondition::Fair),
            "poor" => Ok(ListingCondition::Poor),
            _ => Err(format!("Invalid condition: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingCondition::New => "new",
            ListingCondition::LikeNew => "like_new",
            ListingCondition::Good => "good",
            ListingCondition::Fair => "fair",
            ListingCondition::Poor => "poor",
        }
    }
}

/// Listing lifecycle: active → reserved (pending order) → sold, or back to active on cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Reserved,
    Sold,
}

impl ListingStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "reserved" => Ok(ListingStatus::Reserved),
            "sold" => Ok(ListingStatus::Sold),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Reserved => "reserved",
            ListingStatus::Sold => "sold",
        }
    }
}

impl From<String> for ListingStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(ListingStatus::Active)
    }
}

/// Listing row joined with its seller's username and category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub seller_username: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub condition: String, // Stored as TEXT, use ListingCondition for type safety
    pub images: Value,     // JSONB array of URLs
    pub location: Option<String>,
    pub status: String, // Stored as TEXT, use ListingStatus for type safety
    pub views: i32,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Listing {
    /// Get images as a vector of strings
    pub fn images_vec(&self) -> Vec<String> {
        match &self.images {
            Value::Array(arr) => arr
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => vec![],
        }
    }

    /// Get status as an enum
    pub fn status_enum(&self) -> ListingStatus {
        ListingStatus::from_str(&self.status).unwrap_or(ListingStatus::Active)
    }
}

/// Sort orders accepted by the listing browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSort {
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    Popular,
}

impl ListingSort {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(ListingSort::Newest),
            "oldest" => Ok(ListingSort::Oldest),
            "price_asc" => Ok(ListingSort::PriceAsc),
            "price_desc" => Ok(ListingSort::PriceDesc),
            "popular" => Ok(ListingSort::Popular),
            _ => Err(format!("Invalid sort: {}", s)),
        }
    }

    /// ORDER BY clause; ties are broken by id so pagination is stable
    pub fn order_by(&self) -> &'static str {
        match self {
            ListingSort::Newest => "l.created_at DESC, l.id DESC",
            ListingSort::Oldest => "l.created_at ASC, l.id ASC",
            ListingSort::PriceAsc => "l.price ASC, l.id ASC",
            ListingSort::PriceDesc => "l.price DESC, l.id DESC",
            ListingSort::Popular => "l.views DESC, l.created_at DESC, l.id DESC",
        }
    }
}

/// Raw query string of `GET /api/listings`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub seller_id: Option<Uuid>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated, normalized listing filter
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub category_slug: Option<String>,
    pub condition: Option<ListingCondition>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub seller_id: Option<Uuid>,
    pub status: Option<ListingStatus>,
    pub sort: ListingSort,
    pub page: u32,
    pub limit: u32,
}

impl ListingFilter {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl TryFrom<ListingQuery> for ListingFilter {
    type Error = String;

    fn try_from(query: ListingQuery) -> Result<Self, Self::Error> {
        let condition = match trim_optional(query.condition) {
            Some(c) => Some(ListingCondition::from_str(&c)?),
            None => None,
        };

        // "all" lifts the default restriction to active listings
        let status = match trim_optional(query.status).as_deref() {
            None => Some(ListingStatus::Active),
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(ListingStatus::from_str(s)?),
        };

        let sort = match trim_optional(query.sort) {
            Some(s) => ListingSort::from_str(&s)?,
            None => ListingSort::Newest,
        };

        if let Some(min) = query.min_price {
            if min < Decimal::ZERO {
                return Err("min_price cannot be negative".to_string());
            }
        }
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err("min_price cannot exceed max_price".to_string());
            }
        }

        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Ok(Self {
            search: trim_optional(query.search),
            category_slug: trim_optional(query.category).map(|c| c.to_lowercase()),
            condition,
            min_price: query.min_price,
            max_price: query.max_price,
            seller_id: query.seller_id,
            status,
            sort,
            page,
            limit,
        })
    }
}

/// One page of listings
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl ListingPage {
    pub fn new(items: Vec<Listing>, total: i64, filter: &ListingFilter) -> Self {
        let limit = filter.limit as i64;
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            items,
            total,
            page: filter.page,
            limit: filter.limit,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub condition: ListingCondition,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub condition: Option<ListingCondition>,
    /// Absent leaves the category alone; `null` removes it
    #[serde(default, deserialize_with = "present_or_null")]
    pub category_id: Option<Option<Uuid>>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
    /// Reject the update if the listing has changed since this version was read
    pub expected_version: Option<i32>,
}

/// Wraps any present value, including `null`, in `Some`
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_title(title: &str) -> Result<(), String> {
    reject_nul(title, "Title")?;
    let len = title.chars().count();
    if !(3..=120).contains(&len) {
        return Err("Title must be between 3 and 120 characters".to_string());
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), String> {
    validate_money(price, "Price")?;
    if price > Decimal::from(MAX_PRICE) {
        return Err(format!("Price cannot exceed {}", MAX_PRICE));
    }
    Ok(())
}

fn normalize_images(images: Vec<String>) -> Result<Vec<String>, String> {
    let images: Vec<String> = images
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    for image in &images {
        reject_nul(image, "Image URL")?;
    }
    if images.len() > MAX_IMAGES {
        return Err(format!("At most {} images are allowed", MAX_IMAGES));
    }
    Ok(images)
}

impl CreateListingRequest {
    pub fn normalized(self) -> Result<Self, String> {
        let title = self.title.trim().to_string();
        validate_title(&title)?;
        validate_price(self.price)?;
        let description = trim_optional(self.description);
        let location = trim_optional(self.location);
        reject_nul(description.as_deref().unwrap_or_default(), "Description")?;
        reject_nul(location.as_deref().unwrap_or_default(), "Location")?;
        Ok(Self {
            title,
            description,
            price: self.price,
            condition: self.condition,
            category_id: self.category_id,
            images: normalize_images(self.images)?,
            location,
        })
    }
}

impl UpdateListingRequest {
    pub fn normalized(self) -> Result<Self, String> {
        let title = match self.title {
            Some(t) => {
                let t = t.trim().to_string();
                validate_title(&t)?;
                Some(t)
            }
            None => None,
        };
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        let images = match self.images {
            Some(images) => Some(normalize_images(images)?),
            None => None,
        };
        Ok(Self {
            title,
            description: trim_field(self.description, "Description")?,
            price: self.price,
            condition: self.condition,
            category_id: self.category_id,
            images,
            location: trim_field(self.location, "Location")?,
            expected_version: self.expected_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_filter_defaults() {
        let filter = ListingFilter::try_from(ListingQuery::default()).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.sort, ListingSort::Newest);
        assert_eq!(filter.status, Some(ListingStatus::Active));
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_filter_clamps_paging() {
        let filter = ListingFilter::try_from(ListingQuery {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);

        let filter = ListingFilter::try_from(ListingQuery {
            page: Some(3),
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn test_filter_rejects_inverted_price_range() {
        let result = ListingFilter::try_from(ListingQuery {
            min_price: Some(dec("50")),
            max_price: Some(dec("10")),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_parses_enums_and_trims() {
        let filter = ListingFilter::try_from(ListingQuery {
            search: Some("  calculus  ".into()),
            category: Some("TextBooks".into()),
            condition: Some("like_new".into()),
            status: Some("all".into()),
            sort: Some("price_desc".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.search.as_deref(), Some("calculus"));
        assert_eq!(filter.category_slug.as_deref(), Some("textbooks"));
        assert_eq!(filter.condition, Some(ListingCondition::LikeNew));
        assert_eq!(filter.status, None);
        assert_eq!(filter.sort, ListingSort::PriceDesc);

        assert!(ListingFilter::try_from(ListingQuery {
            sort: Some("cheapest".into()),
            ..Default::default()
        })
        .is_err());
        assert!(ListingFilter::try_from(ListingQuery {
            condition: Some("broken".into()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_page_math() {
        let filter = ListingFilter::try_from(ListingQuery {
            limit: Some(12),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ListingPage::new(vec![], 0, &filter).total_pages, 0);
        assert_eq!(ListingPage::new(vec![], 12, &filter).total_pages, 1);
        assert_eq!(ListingPage::new(vec![], 13, &filter).total_pages, 2);
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreateListingRequest {
            title: "  Calculus textbook ".into(),
            description: Some("".into()),
            price: dec("25.50"),
            condition: ListingCondition::Good,
            category_id: None,
            images: vec![" https://img/1.jpg ".into(), "".into()],
            location: None,
        };
        let normalized = valid.clone().normalized().unwrap();
        assert_eq!(normalized.title, "Calculus textbook");
        assert!(normalized.description.is_none());
        assert_eq!(normalized.images, vec!["https://img/1.jpg".to_string()]);

        let mut bad = valid.clone();
        bad.price = dec("0");
        assert!(bad.normalized().is_err());

        let mut bad = valid.clone();
        bad.price = dec("10.999");
        assert!(bad.normalized().is_err());

        let mut bad = valid.clone();
        bad.title = "ab".into();
        assert!(bad.normalized().is_err());

        let mut bad = valid;
        bad.title = "Lamp\u{0}x".into();
        assert_eq!(
            bad.normalized().unwrap_err(),
            "Title contains invalid characters"
        );
    }

    #[test]
    fn test_update_category_absent_null_or_set() {
        let update: UpdateListingRequest = serde_json::from_str(r#"{"price": "5.00"}"#).unwrap();
        assert_eq!(update.category_id, None);

        let update: UpdateListingRequest = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(update.category_id, Some(None));

        let id = Uuid::new_v4();
        let update: UpdateListingRequest =
            serde_json::from_str(&format!(r#"{{"category_id": "{}"}}"#, id)).unwrap();
        assert_eq!(update.category_id, Some(Some(id)));
    }

    #[test]
    fn test_update_keeps_empty_text_as_clear() {
        let update = UpdateListingRequest {
            description: Some("  ".into()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(update.description.as_deref(), Some(""));
        assert!(update.location.is_none());

        let update = UpdateListingRequest {
            location: Some("Dorm\u{0}".into()),
            ..Default::default()
        };
        assert!(update.normalized().is_err());
    }

    #[test]
    fn test_condition_serde_names() {
        let c: ListingCondition = serde_json::from_str("\"like_new\"").unwrap();
        assert_eq!(c, ListingCondition::LikeNew);
        assert_eq!(c.as_str(), "like_new");
    }
}
