//! Helpers shared by every concrete provider for turning loosely typed
//! upstream nutrition data into `FoodRecord` fields.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

/// 1 kcal = 4.184 kJ.
pub const KJ_PER_KCAL: f64 = 4.184;

pub const UNIT_GRAMS: &str = "g";
pub const UNIT_MILLILITRES: &str = "ml";

lazy_static! {
    // en, de, es, fr, it, pt
    static ref LIQUID_WORDS: Regex = Regex::new(
        r"(?i)\b(?:juice|milk|drink|beverage|water|soda|smoothie|shake|milkshake|lemonade|tea|coffee|kefir|nectar|syrup|saft|milch|getränk|wasser|limonade|tee|kaffee|jugo|zumo|leche|bebida|agua|refresco|batido|jus|lait|boisson|eau|sirop|succo|latte|bevanda|acqua|suco|leite|água)s?\b"
    )
    .unwrap();
    // German compounds: "Orangensaft", "Buttermilch", "Mineralwasser"
    static ref LIQUID_COMPOUNDS: Regex =
        Regex::new(r"(?i)\w+(?:saft|milch|getränk|wasser|limonade)\b").unwrap();
    static ref POWDER_WORDS: Regex =
        Regex::new(r"(?i)(?:powder|pulver|poudre|polvo|\bpó\b)").unwrap();
}

/// True when a product name reads like something you drink.
pub fn is_liquid(name: &str) -> bool {
    if POWDER_WORDS.is_match(name) {
        return false;
    }
    LIQUID_WORDS.is_match(name) || LIQUID_COMPOUNDS.is_match(name)
}

/// Serving unit guessed from the product name when upstream states none.
pub fn default_serving_unit(name: &str) -> &'static str {
    if is_liquid(name) {
        UNIT_MILLILITRES
    } else {
        UNIT_GRAMS
    }
}

/// Maps an upstream unit spelling onto "g" / "ml", if it is one of them.
pub fn normalize_unit(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "g" | "gr" | "grm" | "gram" | "grams" | "100g" => Some(UNIT_GRAMS),
        "ml" | "mlt" | "millilitre" | "milliliter" | "100ml" => Some(UNIT_MILLILITRES),
        _ => None,
    }
}

pub fn kj_to_kcal(kj: f64) -> f64 {
    kj / KJ_PER_KCAL
}

/// Reads a JSON number or numeric string ("12,5" included). Negative
/// values clamp to zero; non-finite or unparsable values are absent.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.max(0.0))
}

pub fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Rounds to one decimal, enough for label values.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
