//! HTML field extraction
//!
//! This module turns fetched HTML into structured data, including:
//! - Listing page parsing (detail page links)
//! - Detail page parsing (title, price, odometer, seller, images, plates, VIN)
//! - Text normalization helpers for numeric fields
//!
//! Extraction is infallible: a missing or malformed field yields that
//! field's default value, never an error, so one odd page layout cannot
//! fail the record.

use crate::storage::CarRecord;
use chrono::Utc;
use scraper::{Html, Selector};
use url::Url;

/// Extracts a full car record from a detail page
///
/// # Arguments
///
/// * `html` - The detail page body
/// * `url` - The page URL, stored as the record's natural key
///
/// # Returns
///
/// A `CarRecord` with every recognized field populated and defaults
/// (empty string or 0) for anything the page does not carry.
pub fn extract_car(html: &str, url: &str) -> CarRecord {
    let document = Html::parse_document(html);

    let title = select_text(&document, "h1");

    // Price markup differs between the two page layouts in the wild
    let price_raw = {
        let side = select_text(&document, "#sidePrice strong");
        if side.is_empty() {
            select_text(&document, ".price_value strong")
        } else {
            side
        }
    };

    let odometer_raw = select_text(&document, "#basicInfoTableMainInfo0 span");
    let username = select_text(&document, "#sellerInfoUserName span");
    let phone_raw = select_text(&document, ".button-main.mt-16 span");

    // Lazy-loaded galleries put the real URL in data-src
    let image_url = {
        let lazy = select_attr(&document, "span.picture img", "data-src");
        if lazy.is_empty() {
            select_attr(&document, "span.picture img", "src")
        } else {
            lazy
        }
    };

    let images_count = count_matches(&document, ".preview-gallery img");

    let car_number = select_text(&document, ".car-number.ua span");
    let car_vin = select_text(&document, "#badgesVin span");

    CarRecord {
        url: url.to_string(),
        title,
        price_usd: parse_price(&price_raw),
        odometer: parse_odometer(&odometer_raw),
        username,
        phone_number: only_digits(&phone_raw),
        image_url,
        images_count,
        car_number,
        car_vin,
        datetime_found: Utc::now(),
    }
}

/// Extracts detail page links from a listing page
///
/// Links are taken from `a.address[href]` anchors and resolved against the
/// listing URL, so relative hrefs come out absolute. Anchors whose href
/// cannot be resolved are skipped.
pub fn extract_listing_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a.address[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}

/// Strips everything but ASCII digits from the text
pub fn only_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses a price string like `"28 500 $"` into a number, defaulting to 0
pub fn parse_price(text: &str) -> i64 {
    only_digits(text).parse().unwrap_or(0)
}

/// Parses an odometer reading into kilometers
///
/// Detail pages abbreviate mileage in thousands ("95 тис. км"), so values
/// under 1000 are scaled up. Unparseable text yields 0, which the scaling
/// also applies to.
pub fn parse_odometer(text: &str) -> i64 {
    let n: i64 = only_digits(text).parse().unwrap_or(0);
    if n < 1000 {
        n * 1000
    } else {
        n
    }
}

/// Returns the trimmed text of the first element matching the selector
fn select_text(document: &Html, selector: &str) -> String {
    Selector::parse(selector)
        .ok()
        .and_then(|s| {
            document
                .select(&s)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default()
}

/// Returns the given attribute of the first element matching the selector
fn select_attr(document: &Html, selector: &str, attr: &str) -> String {
    Selector::parse(selector)
        .ok()
        .and_then(|s| {
            document
                .select(&s)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.to_string())
        })
        .unwrap_or_default()
}

/// Counts elements matching the selector
fn count_matches(document: &Html, selector: &str) -> i64 {
    Selector::parse(selector)
        .map(|s| document.select(&s).count() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html><body>
            <h1>Audi A6 2019</h1>
            <div id="sidePrice"><strong>28 500 $</strong></div>
            <div id="basicInfoTableMainInfo0"><span>95 тис. км</span></div>
            <div id="sellerInfoUserName"><span>Oleh</span></div>
            <div class="button-main mt-16"><span>+38 (067) 123-45-67</span></div>
            <span class="picture">
                <img src="https://cdn.example.com/placeholder.jpg"
                     data-src="https://cdn.example.com/real.jpg">
            </span>
            <div class="preview-gallery">
                <img src="1.jpg"><img src="2.jpg"><img src="3.jpg">
            </div>
            <div class="car-number ua"><span>AA 1234 BB</span></div>
            <div id="badgesVin"><span>WAUZZZ4G1KN000000</span></div>
        </body></html>
    "#;

    #[test]
    fn test_extract_car_all_fields() {
        let record = extract_car(DETAIL_PAGE, "https://auto.example.com/car/1");

        assert_eq!(record.url, "https://auto.example.com/car/1");
        assert_eq!(record.title, "Audi A6 2019");
        assert_eq!(record.price_usd, 28500);
        assert_eq!(record.odometer, 95000);
        assert_eq!(record.username, "Oleh");
        assert_eq!(record.phone_number, "380671234567");
        assert_eq!(record.image_url, "https://cdn.example.com/real.jpg");
        assert_eq!(record.images_count, 3);
        assert_eq!(record.car_number, "AA 1234 BB");
        assert_eq!(record.car_vin, "WAUZZZ4G1KN000000");
    }

    #[test]
    fn test_extract_car_missing_fields_default() {
        let record = extract_car("<html><body></body></html>", "https://a");

        assert_eq!(record.url, "https://a");
        assert_eq!(record.title, "");
        assert_eq!(record.price_usd, 0);
        assert_eq!(record.odometer, 0);
        assert_eq!(record.phone_number, "");
        assert_eq!(record.image_url, "");
        assert_eq!(record.images_count, 0);
    }

    #[test]
    fn test_extract_car_price_fallback_selector() {
        let html = r#"<div class="price_value"><strong>15 200 $</strong></div>"#;
        let record = extract_car(html, "https://a");
        assert_eq!(record.price_usd, 15200);
    }

    #[test]
    fn test_extract_car_image_src_fallback() {
        let html = r#"<span class="picture"><img src="https://cdn.example.com/only.jpg"></span>"#;
        let record = extract_car(html, "https://a");
        assert_eq!(record.image_url, "https://cdn.example.com/only.jpg");
    }

    #[test]
    fn test_parse_odometer_abbreviated_thousands() {
        assert_eq!(parse_odometer("95 тис. км"), 95_000);
    }

    #[test]
    fn test_parse_odometer_full_value() {
        assert_eq!(parse_odometer("152000 km"), 152_000);
    }

    #[test]
    fn test_parse_odometer_empty() {
        assert_eq!(parse_odometer(""), 0);
    }

    #[test]
    fn test_only_digits_phone() {
        assert_eq!(only_digits("+38 (067) 123-45-67"), "380671234567");
    }

    #[test]
    fn test_extract_listing_links_resolves_relative() {
        let html = r#"
            <a class="address" href="/car/1">First</a>
            <a class="address" href="https://auto.example.com/car/2">Second</a>
            <a class="other" href="/car/3">Ignored</a>
            <a class="address">No href</a>
        "#;
        let base = Url::parse("https://auto.example.com/search?page=1").unwrap();

        let links = extract_listing_links(html, &base);

        assert_eq!(
            links,
            vec![
                "https://auto.example.com/car/1".to_string(),
                "https://auto.example.com/car/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_listing_links_empty_page() {
        let base = Url::parse("https://auto.example.com/search").unwrap();
        assert!(extract_listing_links("<html></html>", &base).is_empty());
    }
}
