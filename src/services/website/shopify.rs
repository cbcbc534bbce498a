use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::sanitize::sanitize_text;
use super::{ScrapeError, DEFAULT_CURRENCY, MAX_IMAGES_PER_PRODUCT};
use crate::models::{Product, SiteMeta};
use crate::utils::lenient_f64;

const ADMIN_API_VERSION: &str = "2023-10";
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Store origin used for API calls: the page URL with any path dropped and a
/// leading `www.` removed from the host.
pub fn store_base(url: &Url) -> Result<String, ScrapeError> {
    let host = url
        .host_str()
        .ok_or_else(|| ScrapeError::InvalidUrl(url.to_string()))?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Products and shop details from the Admin API. `Ok(None)` means the
/// products call was refused and the caller should try the public feed.
pub async fn admin_catalog(
    client: &Client,
    base: &str,
    access_token: &str,
) -> Result<Option<(Vec<Product>, SiteMeta)>, ScrapeError> {
    let products_url = format!("{}/admin/api/{}/products.json", base, ADMIN_API_VERSION);
    let response = client
        .get(&products_url)
        .header(ACCESS_TOKEN_HEADER, access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        debug!("Shopify Admin API returned {} for {}", response.status(), products_url);
        return Ok(None);
    }
    let body: Value = response.json().await?;
    let products = parse_products(&body["products"]);

    let shop_url = format!("{}/admin/api/{}/shop.json", base, ADMIN_API_VERSION);
    let shop_response = client
        .get(&shop_url)
        .header(ACCESS_TOKEN_HEADER, access_token)
        .send()
        .await?;
    let shop = if shop_response.status().is_success() {
        shop_response.json::<Value>().await?["shop"].take()
    } else {
        Value::Null
    };

    Ok(Some((products, parse_shop_meta(&shop))))
}

/// Products from the storefront's public `products.json` feed, or `None`
/// when the store does not expose it.
pub async fn public_products(client: &Client, base: &str) -> Result<Option<Vec<Product>>, ScrapeError> {
    let response = client.get(format!("{}/products.json", base)).send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    let body: Value = response.json().await?;
    Ok(Some(parse_products(&body["products"])))
}

pub fn parse_products(products: &Value) -> Vec<Product> {
    products
        .as_array()
        .into_iter()
        .flatten()
        .map(|p| {
            let images = p["images"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|img| img["src"].as_str().or_else(|| img.as_str()))
                .filter(|src| !src.is_empty())
                .take(MAX_IMAGES_PER_PRODUCT)
                .map(str::to_string)
                .collect();

            Product {
                id: id_string(&p["id"]),
                name: sanitize_text(p["title"].as_str().unwrap_or("")),
                description: sanitize_text(p["body_html"].as_str().unwrap_or("")),
                price: lenient_f64(&p["variants"][0]["price"]).unwrap_or(0.0),
                currency: DEFAULT_CURRENCY.to_string(),
                images,
                category: p["product_type"].as_str().map(str::to_string),
            }
        })
        .collect()
}

pub fn parse_shop_meta(shop: &Value) -> SiteMeta {
    SiteMeta {
        title: sanitize_text(shop["name"].as_str().unwrap_or("Shopify Store")),
        description: sanitize_text(shop["description"].as_str().unwrap_or("")),
        logo: shop["logo"]["url"].as_str().map(str::to_string),
        favicon: None,
        theme_colors: Vec::new(),
    }
}

pub(super) fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_base() {
        let url = Url::parse("https://www.acme.myshopify.com/collections/all?page=2").unwrap();
        assert_eq!(store_base(&url).unwrap(), "https://acme.myshopify.com");

        let local = Url::parse("http://127.0.0.1:4321/shop").unwrap();
        assert_eq!(store_base(&local).unwrap(), "http://127.0.0.1:4321");
    }

    #[test]
    fn test_parse_products() {
        let data = json!([
            {
                "id": 632910392,
                "title": "IPod Nano",
                "body_html": "<p>It's the <em>small</em> iPod</p>",
                "product_type": "Cult Products",
                "variants": [{"price": "199.00"}, {"price": "249.00"}],
                "images": [{"src": "https://cdn.shopify.test/1.png"}, {"src": "https://cdn.shopify.test/2.png"},
                           {"src": "https://cdn.shopify.test/3.png"}, {"src": "https://cdn.shopify.test/4.png"}]
            },
            {"id": "gid-7", "title": "Gift Card", "variants": [], "images": []}
        ]);

        let products = parse_products(&data);

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "632910392");
        assert_eq!(products[0].description, "It's the small iPod");
        assert_eq!(products[0].price, 199.0);
        assert_eq!(products[0].images.len(), 3);
        assert_eq!(products[0].category.as_deref(), Some("Cult Products"));
        assert_eq!(products[1].id, "gid-7");
        assert_eq!(products[1].price, 0.0);
    }

    #[test]
    fn test_parse_shop_meta() {
        let meta = parse_shop_meta(&json!({"name": "Acme", "logo": {"url": "https://cdn.test/logo.png"}}));
        assert_eq!(meta.title, "Acme");
        assert_eq!(meta.logo.as_deref(), Some("https://cdn.test/logo.png"));

        let defaulted = parse_shop_meta(&Value::Null);
        assert_eq!(defaulted.title, "Shopify Store");
        assert!(defaulted.logo.is_none());
    }
}
