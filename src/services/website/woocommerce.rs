use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::sanitize::sanitize_text;
use super::shopify::id_string;
use super::{ScrapeError, DEFAULT_CURRENCY, MAX_IMAGES_PER_PRODUCT};
use crate::models::Product;
use crate::utils::lenient_f64;

/// Products from the WooCommerce REST API, or `None` when the store refuses
/// the request.
pub async fn api_products(
    client: &Client,
    site_url: &str,
    consumer_key: &str,
    consumer_secret: &str,
    per_page: usize,
) -> Result<Option<Vec<Product>>, ScrapeError> {
    let api_url = format!("{}/wp-json/wc/v3/products", site_url.trim_end_matches('/'));
    let response = client
        .get(&api_url)
        .basic_auth(consumer_key, Some(consumer_secret))
        .query(&[("per_page", per_page.to_string())])
        .send()
        .await?;

    if !response.status().is_success() {
        debug!("WooCommerce API returned {} for {}", response.status(), api_url);
        return Ok(None);
    }

    let body: Value = response.json().await?;
    Ok(Some(parse_products(&body)))
}

pub fn parse_products(products: &Value) -> Vec<Product> {
    products
        .as_array()
        .into_iter()
        .flatten()
        .map(|p| {
            let categories: Vec<&str> = p["categories"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|c| c["name"].as_str())
                .collect();

            Product {
                id: id_string(&p["id"]),
                name: sanitize_text(p["name"].as_str().unwrap_or("")),
                description: sanitize_text(p["description"].as_str().unwrap_or("")),
                price: lenient_f64(&p["price"]).unwrap_or(0.0),
                currency: DEFAULT_CURRENCY.to_string(),
                images: p["images"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|img| img["src"].as_str())
                    .filter(|src| !src.is_empty())
                    .take(MAX_IMAGES_PER_PRODUCT)
                    .map(str::to_string)
                    .collect(),
                category: (!categories.is_empty()).then(|| categories.join(", ")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_products() {
        let data = json!([{
            "id": 799,
            "name": "Ship Your Idea",
            "description": "<p>Pellentesque habitant morbi.</p>",
            "price": "21.99",
            "categories": [{"id": 9, "name": "Clothing"}, {"id": 14, "name": "T-shirts"}],
            "images": [{"src": "https://woo.test/wp-content/uploads/front.jpg"}]
        }, {
            "id": 800,
            "name": "Draft",
            "price": "",
            "categories": []
        }]);

        let products = parse_products(&data);

        assert_eq!(products[0].id, "799");
        assert_eq!(products[0].description, "Pellentesque habitant morbi.");
        assert_eq!(products[0].price, 21.99);
        assert_eq!(products[0].category.as_deref(), Some("Clothing, T-shirts"));
        assert_eq!(products[0].images, vec!["https://woo.test/wp-content/uploads/front.jpg".to_string()]);
        assert_eq!(products[1].price, 0.0);
        assert!(products[1].category.is_none());
    }

    #[test]
    fn test_non_array_body_yields_nothing() {
        assert!(parse_products(&json!({"code": "woocommerce_rest_cannot_view"})).is_empty());
    }
}
