//! Product characteristic extraction.
//!
//! Two passes: structured markup (attribute tables, definition lists,
//! "key: value" list items) first, then free-text patterns over the card
//! body.
//! Structured values always win; free text only fills slots still empty.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::Characteristics;

/// Bilingual characteristic labels mapped to their slot.
///
/// Keys are lowercase; page labels are lowercased and trimmed of trailing
/// colons before lookup.
const KEY_MAP: &[(&str, Slot)] = &[
    ("матеріал", Slot::Material),
    ("материал", Slot::Material),
    ("material", Slot::Material),
    ("бренд", Slot::Brand),
    ("brand", Slot::Brand),
    ("виробник", Slot::Brand),
    ("производитель", Slot::Brand),
    ("торгова марка", Slot::Brand),
    ("колекція", Slot::Collection),
    ("коллекция", Slot::Collection),
    ("серія", Slot::Collection),
    ("серия", Slot::Collection),
    ("collection", Slot::Collection),
    ("колір", Slot::Color),
    ("цвет", Slot::Color),
    ("color", Slot::Color),
    ("склад", Slot::Composition),
    ("состав", Slot::Composition),
    ("composition", Slot::Composition),
    ("тип", Slot::Kind),
    ("вид", Slot::Kind),
    ("type", Slot::Kind),
    ("упаковка", Slot::Packaging),
    ("пакування", Slot::Packaging),
    ("packaging", Slot::Packaging),
    ("кількість", Slot::Quantity),
    ("количество", Slot::Quantity),
    ("кількість в упаковці", Slot::Quantity),
    ("quantity", Slot::Quantity),
    ("розмір", Slot::Size),
    ("размер", Slot::Size),
    ("розміри", Slot::Size),
    ("размеры", Slot::Size),
    ("габарити", Slot::Size),
    ("size", Slot::Size),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Material,
    Brand,
    Collection,
    Color,
    Composition,
    Kind,
    Packaging,
    Quantity,
    Size,
}

/// Free-text patterns for cards without structured characteristic markup.
static TEXT_PATTERNS: LazyLock<Vec<(Regex, Slot)>> = LazyLock::new(|| {
    [
        (r"(?i)матеріал[:\s]+([^,;.\n]{2,40})", Slot::Material),
        (r"(?i)материал[:\s]+([^,;.\n]{2,40})", Slot::Material),
        (r"(?i)бренд[:\s]+([^,;.\n]{2,40})", Slot::Brand),
        (r"(?i)виробник[:\s]+([^,;.\n]{2,40})", Slot::Brand),
        (r"(?i)колекція[:\s]+([^,;.\n]{2,40})", Slot::Collection),
        (r"(?i)коллекция[:\s]+([^,;.\n]{2,40})", Slot::Collection),
        (r"(?i)колір[:\s]+([^,;.\n]{2,40})", Slot::Color),
        (r"(?i)цвет[:\s]+([^,;.\n]{2,40})", Slot::Color),
        (r"(?i)склад[:\s]+([^,;.\n]{2,40})", Slot::Composition),
        (r"(?i)состав[:\s]+([^,;.\n]{2,40})", Slot::Composition),
        (r"(?i)упаковка[:\s]+([^,;.\n]{2,40})", Slot::Packaging),
        (r"(?i)кількість[:\s]+([^,;.\n]{2,40})", Slot::Quantity),
        (r"(?i)количество[:\s]+([^,;.\n]{2,40})", Slot::Quantity),
        (r"(?i)розмір(?:и)?[:\s]+([^,;.\n]{2,40})", Slot::Size),
        (r"(?i)размер(?:ы)?[:\s]+([^,;.\n]{2,40})", Slot::Size),
    ]
    .iter()
    .map(|(p, slot)| (Regex::new(p).unwrap(), *slot))
    .collect()
});

/// Extract characteristics from an element, structured markup first.
pub fn extract_characteristics(root: &ElementRef<'_>) -> Characteristics {
    let mut chars = structured(root);
    if !all_filled(&chars) {
        let text: String = root.text().collect::<Vec<_>>().join(" ");
        chars.fill_missing_from(free_text(&text));
    }
    chars
}

/// Extract characteristics from loose text (descriptions, snippets).
pub fn free_text(text: &str) -> Characteristics {
    let mut chars = Characteristics::default();
    for (pattern, slot) in TEXT_PATTERNS.iter() {
        if slot_ref(&mut chars, *slot).is_some() {
            continue;
        }
        if let Some(captures) = pattern.captures(text) {
            let value = captures[1].trim().to_string();
            if !value.is_empty() {
                *slot_ref_mut(&mut chars, *slot) = Some(value);
            }
        }
    }
    chars
}

fn structured(root: &ElementRef<'_>) -> Characteristics {
    let mut chars = Characteristics::default();

    // Attribute tables: <tr><td>key</td><td>value</td></tr>
    let row = Selector::parse("tr").unwrap();
    let cell = Selector::parse("td, th").unwrap();
    for tr in root.select(&row) {
        let cells: Vec<String> = tr
            .select(&cell)
            .map(|c| c.text().collect::<String>())
            .collect();
        if let [key, value] = cells.as_slice() {
            assign(&mut chars, key, value);
        }
    }

    // Definition lists: <dt>key</dt><dd>value</dd>
    let term = Selector::parse("dt").unwrap();
    let detail = Selector::parse("dd").unwrap();
    let terms: Vec<String> = root
        .select(&term)
        .map(|e| e.text().collect::<String>())
        .collect();
    let details: Vec<String> = root
        .select(&detail)
        .map(|e| e.text().collect::<String>())
        .collect();
    for (key, value) in terms.iter().zip(details.iter()) {
        assign(&mut chars, key, value);
    }

    // List items carrying "key: value"
    let item = Selector::parse("li").unwrap();
    for li in root.select(&item) {
        let text: String = li.text().collect::<String>();
        if let Some((key, value)) = text.split_once(':') {
            assign(&mut chars, key, value);
        }
    }

    chars
}

fn assign(chars: &mut Characteristics, key: &str, value: &str) {
    let key = key.trim().trim_end_matches(':').to_lowercase();
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    for (label, slot) in KEY_MAP {
        if key == *label {
            let slot = slot_ref_mut(chars, *slot);
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
            return;
        }
    }
}

fn all_filled(chars: &Characteristics) -> bool {
    chars.material.is_some()
        && chars.brand.is_some()
        && chars.collection.is_some()
        && chars.color.is_some()
        && chars.composition.is_some()
        && chars.kind.is_some()
        && chars.packaging.is_some()
        && chars.quantity.is_some()
        && chars.size.is_some()
}

fn slot_ref(chars: &mut Characteristics, slot: Slot) -> Option<&String> {
    slot_ref_mut(chars, slot).as_ref()
}

fn slot_ref_mut(chars: &mut Characteristics, slot: Slot) -> &mut Option<String> {
    match slot {
        Slot::Material => &mut chars.material,
        Slot::Brand => &mut chars.brand,
        Slot::Collection => &mut chars.collection,
        Slot::Color => &mut chars.color,
        Slot::Composition => &mut chars.composition,
        Slot::Kind => &mut chars.kind,
        Slot::Packaging => &mut chars.packaging,
        Slot::Quantity => &mut chars.quantity,
        Slot::Size => &mut chars.size,
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn parse_root(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    fn root_of(html: &Html) -> ElementRef<'_> {
        html.root_element()
    }

    #[test]
    fn table_rows_map_through_bilingual_keys() {
        let html = parse_root(
            r#"<table>
                <tr><td>Матеріал</td><td>Скло</td></tr>
                <tr><td>Бренд</td><td>Luminarc</td></tr>
                <tr><td>Вага</td><td>2 кг</td></tr>
            </table>"#,
        );
        let chars = extract_characteristics(&root_of(&html));
        assert_eq!(chars.material.as_deref(), Some("Скло"));
        assert_eq!(chars.brand.as_deref(), Some("Luminarc"));
        // "Вага" has no slot and never leaks through
        assert!(chars.size.is_none());
    }

    #[test]
    fn definition_lists_and_list_items() {
        let html = parse_root(
            r#"<div>
                <dl><dt>Колір</dt><dd>Чорний</dd></dl>
                <ul><li>Размер: 26 см</li></ul>
            </div>"#,
        );
        let chars = extract_characteristics(&root_of(&html));
        assert_eq!(chars.color.as_deref(), Some("Чорний"));
        assert_eq!(chars.size.as_deref(), Some("26 см"));
    }

    #[test]
    fn structured_beats_free_text() {
        let html = parse_root(
            r#"<div>
                <ul><li>Матеріал: Кераміка</li></ul>
                <p>Опис: матеріал: пластик, колір: білий</p>
            </div>"#,
        );
        let chars = extract_characteristics(&root_of(&html));
        assert_eq!(chars.material.as_deref(), Some("Кераміка"));
        // Free text still fills slots structured markup left empty
        assert_eq!(chars.color.as_deref(), Some("білий"));
    }

    #[test]
    fn free_text_patterns_are_bilingual() {
        let chars = free_text("Каструля, материал: нержавіюча сталь, цвет: сірий");
        assert_eq!(chars.material.as_deref(), Some("нержавіюча сталь"));
        assert_eq!(chars.color.as_deref(), Some("сірий"));
    }

    #[test]
    fn empty_markup_yields_empty_characteristics() {
        let html = parse_root("<div><p>Просто опис без характеристик</p></div>");
        assert!(extract_characteristics(&root_of(&html)).is_empty());
    }
}
