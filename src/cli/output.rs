//! Result rendering: console table, JSON, CSV.

use console::style;

use crate::models::{Availability, ScrapeStatus, ScrapingResult};
use crate::scrape::StatsSnapshot;

/// Human-readable result lines for the terminal.
pub fn render_table(results: &[ScrapingResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<12} {:<44} {:>9} {:>9} {:<8} {}\n",
        "SITE", "CODE", "TITLE", "PRICE", "OLD", "METHOD", "STATUS"
    ));
    for result in results {
        let (title, price, old_price) = match &result.product {
            Some(p) => (
                truncate(p.title.as_deref().unwrap_or("-"), 42),
                p.price.map(|v| format!("{v} ₴")).unwrap_or_else(|| "-".into()),
                p.old_price
                    .map(|v| format!("{v} ₴"))
                    .unwrap_or_else(|| "-".into()),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let method = result
            .method_used
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".into());
        let status = match result.status {
            ScrapeStatus::Success => style("ok").green().to_string(),
            ScrapeStatus::Stopped => style("stopped").yellow().to_string(),
            _ => style("error").red().to_string(),
        };
        out.push_str(&format!(
            "{:<10} {:<12} {:<44} {:>9} {:>9} {:<8} {}\n",
            result.site, result.code, title, price, old_price, method, status
        ));
        if let Some(message) = &result.error_message {
            out.push_str(&format!("           {}\n", style(message).dim()));
        }
    }
    out
}

/// One-line run summary for the terminal.
pub fn render_summary(snapshot: &StatsSnapshot) -> String {
    format!(
        "{} {} processed, {} ok, {} failed (fast: {}, browser: {}, avg {:.1}s)",
        style("→").cyan(),
        snapshot.processed,
        style(snapshot.successful).green(),
        style(snapshot.failed).red(),
        snapshot.fast_success,
        snapshot.browser_success,
        snapshot.avg_response_secs,
    )
}

pub fn to_json(results: &[ScrapingResult], snapshot: &StatsSnapshot) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "results": results,
        "statistics": snapshot,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

const CSV_HEADER: &str = "id,site,code,title,price,old_price,discount_percent,availability,\
article,url,image_url,material,brand,collection,color,composition,type,packaging,quantity,\
size,method_used,response_time,status,error_message,attempts";

pub fn to_csv(results: &[ScrapingResult]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for result in results {
        let row = csv_row(result);
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_row(result: &ScrapingResult) -> Vec<String> {
    let empty = crate::models::Product::default();
    let p = result.product.as_ref().unwrap_or(&empty);
    let c = &p.characteristics;
    let availability = match p.availability {
        Availability::Available => "available",
        Availability::OutOfStock => "out_of_stock",
        Availability::Unknown => "unknown",
    };
    vec![
        p.id.to_string(),
        csv_field(&result.site),
        csv_field(&result.code),
        csv_field(p.title.as_deref().unwrap_or("")),
        p.price.map(|v| v.to_string()).unwrap_or_default(),
        p.old_price.map(|v| v.to_string()).unwrap_or_default(),
        p.discount_percent.map(|v| v.to_string()).unwrap_or_default(),
        availability.to_string(),
        csv_field(p.article.as_deref().unwrap_or("")),
        csv_field(p.url.as_deref().unwrap_or("")),
        csv_field(p.image_url.as_deref().unwrap_or("")),
        csv_field(c.material.as_deref().unwrap_or("")),
        csv_field(c.brand.as_deref().unwrap_or("")),
        csv_field(c.collection.as_deref().unwrap_or("")),
        csv_field(c.color.as_deref().unwrap_or("")),
        csv_field(c.composition.as_deref().unwrap_or("")),
        csv_field(c.kind.as_deref().unwrap_or("")),
        csv_field(c.packaging.as_deref().unwrap_or("")),
        csv_field(c.quantity.as_deref().unwrap_or("")),
        csv_field(c.size.as_deref().unwrap_or("")),
        result
            .method_used
            .map(|m| m.to_string())
            .unwrap_or_default(),
        format!("{:.2}", result.response_time.as_secs_f64()),
        format!("{:?}", result.status).to_lowercase(),
        csv_field(result.error_message.as_deref().unwrap_or("")),
        result.attempts.to_string(),
    ]
}

/// Quote a field when it carries separators, quotes, or newlines.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::models::{Product, ScrapeMethod};

    use super::*;

    fn sample() -> ScrapingResult {
        let mut result = ScrapingResult::pending("123456", "rozetka");
        result.status = ScrapeStatus::Success;
        result.method_used = Some(ScrapeMethod::Fast);
        result.response_time = Duration::from_millis(1230);
        result.attempts = 1;
        result.product = Some(Product {
            id: 1,
            title: Some("Каструля, емальована \"Преміум\"".into()),
            price: Some(999),
            old_price: Some(1299),
            discount_percent: Some(23),
            availability: Availability::Available,
            site: "rozetka".into(),
            search_code: "123456".into(),
            ..Default::default()
        });
        result
    }

    #[test]
    fn csv_quotes_embedded_separators() {
        let csv = to_csv(&[sample()]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADER);
        let row = lines.next().unwrap();
        assert!(row.contains("\"Каструля, емальована \"\"Преміум\"\"\""));
        assert!(row.contains(",999,1299,23,available,"));
        assert!(row.ends_with(",fast,1.23,success,,1"));
    }

    #[test]
    fn json_embeds_results_and_statistics() {
        let snapshot = crate::scrape::Statistics::new(1).snapshot();
        let json = to_json(&[sample()], &snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results"][0]["code"], "123456");
        assert_eq!(value["statistics"]["total"], 1);
    }

    #[test]
    fn table_renders_every_result() {
        let table = render_table(&[sample()]);
        assert!(table.contains("rozetka"));
        assert!(table.contains("999 ₴"));
    }
}
