//! Product and site metadata extraction from plain HTML pages.
//!
//! Products are looked for in JSON-LD first, then schema.org microdata, and
//! only when both come up empty in a handful of common storefront markup
//! patterns.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::sanitize::sanitize_text;
use super::{MAX_IMAGES_PER_PRODUCT, DEFAULT_CURRENCY};
use crate::models::{Product, SiteMeta};
use crate::utils::{lenient_f64, short_hash};

const MAX_ITEMS_PER_PATTERN: usize = 10;

const PRODUCT_CONTAINER_SELECTORS: [&str; 7] = [
    ".product",
    ".product-item",
    ".product-card",
    "[data-product]",
    ".woocommerce-product",
    ".shop-item",
    ".catalog-item",
];
const NAME_SELECTORS: [&str; 6] = ["h1", "h2", "h3", ".title", ".name", ".product-title"];
const DESCRIPTION_SELECTORS: [&str; 4] = [".description", ".summary", ".excerpt", "p"];
const PRICE_SELECTORS: [&str; 4] = [".price", ".cost", ".amount", "[data-price]"];

fn select_all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => root.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn select_first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    root.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn join_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

pub fn site_meta(html: &str, base: &Url) -> SiteMeta {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = select_first(root, "title")
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown Site".to_string());

    let description = select_first(root, r#"meta[name="description"]"#)
        .or_else(|| select_first(root, r#"meta[property="og:description"]"#))
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    let icon_href = select_first(root, r#"link[rel~="icon"]"#).and_then(|l| l.value().attr("href"));

    let logo = select_first(root, r#"meta[property="og:image"]"#)
        .and_then(|m| m.value().attr("content"))
        .or(icon_href)
        .and_then(|href| join_url(base, href));

    let favicon = icon_href.and_then(|href| join_url(base, href));

    let theme_colors = select_first(root, r#"meta[name="theme-color"]"#)
        .and_then(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| vec![c.to_string()])
        .unwrap_or_default();

    SiteMeta {
        title: sanitize_text(&title),
        description: sanitize_text(&description),
        logo,
        favicon,
        theme_colors,
    }
}

/// All products found on the page, in discovery order, without duplicates.
pub fn products(html: &str, base: &Url) -> Vec<Product> {
    let document = Html::parse_document(html);

    let mut found = json_ld_products(&document, base);
    found.extend(microdata_products(&document, base));
    if found.is_empty() {
        found = pattern_products(&document, base);
    }

    let mut seen = std::collections::HashSet::new();
    found.retain(|p| seen.insert(p.id.clone()));
    found
}

fn json_ld_products(document: &Html, base: &Url) -> Vec<Product> {
    let mut products = Vec::new();

    for script in select_all(document.root_element(), r#"script[type="application/ld+json"]"#) {
        let raw = script.text().collect::<String>();
        let data: Value = match serde_json::from_str(raw.trim()) {
            Ok(data) => data,
            Err(e) => {
                debug!("Failed to parse JSON-LD: {}", e);
                continue;
            }
        };

        let blocks = match data {
            Value::Array(items) => items,
            other => vec![other],
        };
        for block in &blocks {
            collect_json_ld(block, base, &mut products);
        }
    }

    products
}

fn collect_json_ld(block: &Value, base: &Url, products: &mut Vec<Product>) {
    match block["@type"].as_str() {
        Some("Product") => products.extend(parse_json_ld_product(block, base)),
        Some("ItemList") => {
            for item in block["itemListElement"].as_array().into_iter().flatten() {
                // Entries are either Products or ListItems wrapping one.
                let candidate = if item["@type"] == "ListItem" { &item["item"] } else { item };
                if candidate["@type"] == "Product" {
                    products.extend(parse_json_ld_product(candidate, base));
                }
            }
        }
        _ => {}
    }
}

fn parse_json_ld_product(data: &Value, base: &Url) -> Option<Product> {
    let name = data["name"].as_str().unwrap_or("").trim();
    if name.is_empty() {
        return None;
    }

    let offers = match &data["offers"] {
        Value::Array(list) => list.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };
    let price = lenient_f64(&offers["price"]).unwrap_or(0.0);
    let currency = offers["priceCurrency"]
        .as_str()
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();

    let images: Vec<String> = match &data["image"] {
        Value::String(url) => vec![url.clone()],
        Value::Array(list) => list
            .iter()
            .filter_map(|img| img.as_str().or_else(|| img["url"].as_str()))
            .map(str::to_string)
            .collect(),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(|u| vec![u.to_string()]).unwrap_or_default(),
        _ => Vec::new(),
    };

    Some(Product {
        id: format!("scraped_{}", short_hash(name)),
        name: sanitize_text(name),
        description: sanitize_text(data["description"].as_str().unwrap_or("")),
        price,
        currency,
        images: absolute_images(images.iter().map(String::as_str), base),
        category: data["category"].as_str().map(str::to_string),
    })
}

fn microdata_products(document: &Html, base: &Url) -> Vec<Product> {
    let mut products = Vec::new();

    for item in select_all(document.root_element(), r#"[itemtype*="Product"]"#) {
        let name = select_first(item, r#"[itemprop="name"]"#)
            .map(element_text)
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let description = select_first(item, r#"[itemprop="description"]"#)
            .map(element_text)
            .unwrap_or_default();

        let price = select_first(item, r#"[itemprop="price"]"#)
            .and_then(|el| {
                let text = el.value().attr("content").map(str::to_string).unwrap_or_else(|| element_text(el));
                let digits: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
                digits.parse::<f64>().ok()
            })
            .unwrap_or(0.0);

        let images: Vec<&str> = select_all(item, r#"img[itemprop="image"]"#)
            .into_iter()
            .filter_map(|img| img.value().attr("src"))
            .collect();

        products.push(Product {
            id: format!("microdata_{}", short_hash(&name)),
            name: sanitize_text(&name),
            description: sanitize_text(&description),
            price,
            currency: DEFAULT_CURRENCY.to_string(),
            images: absolute_images(images.into_iter(), base),
            category: None,
        });
    }

    products
}

fn pattern_products(document: &Html, base: &Url) -> Vec<Product> {
    for css in PRODUCT_CONTAINER_SELECTORS {
        let items = select_all(document.root_element(), css);
        if items.is_empty() {
            continue;
        }
        // First selector that matches anything wins.
        return items
            .into_iter()
            .take(MAX_ITEMS_PER_PATTERN)
            .filter_map(|item| parse_pattern_product(item, base))
            .collect();
    }
    Vec::new()
}

fn parse_pattern_product(item: ElementRef<'_>, base: &Url) -> Option<Product> {
    let name = NAME_SELECTORS
        .iter()
        .find_map(|css| select_first(item, css))
        .map(element_text)
        .unwrap_or_default();
    if name.is_empty() {
        return None;
    }

    let description = DESCRIPTION_SELECTORS
        .iter()
        .find_map(|css| select_first(item, css))
        .map(element_text)
        .unwrap_or_default();

    let number = Regex::new(r"[\d.]+").ok()?;
    let price = PRICE_SELECTORS
        .iter()
        .filter_map(|css| select_first(item, css))
        .find_map(|el| {
            let text = element_text(el);
            let text = if text.is_empty() {
                el.value().attr("data-price").unwrap_or("").to_string()
            } else {
                text
            };
            number.find(&text).and_then(|m| m.as_str().parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    let images: Vec<&str> = select_all(item, "img")
        .into_iter()
        .filter_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
        .collect();

    Some(Product {
        id: format!("pattern_{}", short_hash(&name)),
        name: sanitize_text(&name),
        description: sanitize_text(&description),
        price,
        currency: DEFAULT_CURRENCY.to_string(),
        images: absolute_images(images.into_iter(), base),
        category: None,
    })
}

/// Resolves image references against the page URL, dropping ones that do
/// not resolve, and keeps at most three.
fn absolute_images<'a>(sources: impl Iterator<Item = &'a str>, base: &Url) -> Vec<String> {
    sources
        .filter_map(|src| join_url(base, src))
        .take(MAX_IMAGES_PER_PRODUCT)
        .collect()
}
