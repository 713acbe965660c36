use serde::{Deserialize, Serialize};

use super::{BricklinkClient, BricklinkError};

pub const ITEMS_ENDPOINT: &str = "/items";
pub const COLORS_ENDPOINT: &str = "/colors";

/// Meta message the provider uses for a malformed item number
const INVALID_PARAMETER: &str = "PARAMETER_MISSING_OR_INVALID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub no: String,
    #[serde(default)]
    pub name: String,
    /// PART, SET, MINIFIG, BOOK, ...
    #[serde(rename = "type")]
    pub item_type: String,
    pub category_id: Option<i32>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub weight: Option<String>,
    pub year_released: Option<i32>,
    pub is_obsolete: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGuideItem {
    pub no: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGuide {
    pub item: PriceGuideItem,
    /// "N" or "U"
    pub new_or_used: Option<String>,
    pub currency_code: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub avg_price: Option<String>,
    pub qty_avg_price: Option<String>,
    pub unit_quantity: Option<i64>,
    pub total_quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub color_id: i32,
    pub color_name: String,
    #[serde(default)]
    pub color_code: String,
    #[serde(default)]
    pub color_type: String,
}

pub fn item_endpoint(item_type: &str, item_no: &str) -> String {
    format!(
        "{}/{}/{}",
        ITEMS_ENDPOINT,
        item_type.to_ascii_uppercase(),
        urlencoding::encode(item_no)
    )
}

/// Price guide over sold listings. Condition is omitted when empty and the
/// color when 0.
pub fn price_guide_endpoint(item_type: &str, item_no: &str, new_or_used: &str, color_id: i32) -> String {
    let mut params = Vec::new();
    if !new_or_used.is_empty() {
        params.push(format!("new_or_used={}", new_or_used));
    }
    if color_id > 0 {
        params.push(format!("color_id={}", color_id));
    }
    params.push("guide_type=sold".to_string());

    format!("{}/price?{}", item_endpoint(item_type, item_no), params.join("&"))
}

/// Maps a failed item lookup to the message shown to the user
fn item_lookup_error(err: BricklinkError, item_type: &str, item_no: &str) -> BricklinkError {
    let item_type = item_type.to_ascii_lowercase();
    let id = item_no.to_string();

    match err {
        BricklinkError::Api {
            code: 400,
            ref message,
            ref description,
        } if message == INVALID_PARAMETER || !description.is_empty() => {
            BricklinkError::InvalidItemId { item_type, id }
        }
        BricklinkError::Api { .. } => BricklinkError::ItemLookupFailed { item_type, id },
        other => other,
    }
}

impl BricklinkClient {
    pub async fn get_item(&self, item_type: &str, item_no: &str) -> Result<CatalogItem, BricklinkError> {
        let endpoint = item_endpoint(item_type, item_no);
        tracing::info!(item_type = %item_type, item_no = %item_no, endpoint = %endpoint, "Fetching catalog item");

        let response = match self.get(&endpoint).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(item_type = %item_type, item_no = %item_no, error = %e, "Catalog item request failed");
                return Err(item_lookup_error(e, item_type, item_no));
            }
        };

        let item: CatalogItem = response.data("catalog item")?;
        tracing::info!(item_no = %item.no, item_name = %item.name, "Fetched catalog item");
        Ok(item)
    }

    pub async fn get_price_guide(
        &self,
        item_type: &str,
        item_no: &str,
        new_or_used: &str,
        color_id: i32,
    ) -> Result<PriceGuide, BricklinkError> {
        let endpoint = price_guide_endpoint(item_type, item_no, new_or_used, color_id);
        tracing::info!(item_type = %item_type, item_no = %item_no, endpoint = %endpoint, "Fetching price guide");

        let response = self.get(&endpoint).await.inspect_err(|e| {
            tracing::error!(item_type = %item_type, item_no = %item_no, error = %e, "Price guide request failed");
        })?;

        response.data("price guide")
    }

    pub async fn get_colors(&self) -> Result<Vec<Color>, BricklinkError> {
        tracing::debug!(endpoint = COLORS_ENDPOINT, "Fetching colors");

        let response = self.get(COLORS_ENDPOINT).await.inspect_err(|e| {
            tracing::error!(error = %e, "Colors request failed");
        })?;

        let colors: Vec<Color> = response.data("colors")?;
        tracing::debug!(count = colors.len(), "Fetched colors");
        Ok(colors)
    }
}
