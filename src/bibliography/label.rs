//! Short bracket labels such as `[Ale14]` or `[ABCD+19]`.

use super::BibEntry;
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// Display label of an entry.
///
/// A single author contributes the first three characters of the surname;
/// several authors contribute the initial of every word of every surname.
/// Keys of five or more characters are cut to four plus `+`. The key is
/// folded to ASCII and followed by the last two digits of the year.
pub fn display_label(entry: &BibEntry) -> String {
    let surnames: Vec<&str> = entry.authors.iter().filter_map(|a| a.surname()).collect();

    let key: String = match surnames.as_slice() {
        [] => String::new(),
        [only] => only.chars().take(3).collect(),
        many => many
            .iter()
            .flat_map(|s| s.split_whitespace().filter_map(|w| w.chars().next()))
            .collect(),
    };

    let key = if key.chars().count() >= 5 {
        key.chars().take(4).chain(std::iter::once('+')).collect()
    } else {
        key
    };

    let mut label = fold_ascii(&key);
    if let Some(year) = entry.year.as_deref().and_then(|y| YEAR.find(y)) {
        label.push_str(&year.as_str()[2..]);
    }
    label
}

/// Transliterate common accented letters and drop anything outside
/// `[A-Za-z0-9+[]-]`.
pub fn fold_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_char(c) {
            Some(folded) => out.push_str(folded),
            None if c.is_ascii_alphanumeric() || matches!(c, '+' | '[' | ']' | '-') => out.push(c),
            None => {}
        }
    }
    out
}

fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' => "d",
        'Ď' | 'Đ' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'ğ' => "g",
        'Ğ' => "G",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ł' => "l",
        'Ł' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ő' | 'ō' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ő' | 'Ō' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ř' => "r",
        'Ř' => "R",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'Ś' | 'Š' | 'Ş' | 'Ș' => "S",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' => "t",
        'Ť' | 'Ţ' | 'Ț' => "T",
        'ù' | 'ú' | 'û' | 'ü' | 'ů' | 'ű' | 'ū' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ů' | 'Ű' | 'Ū' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ž' | 'ź' | 'ż' => "z",
        'Ž' | 'Ź' | 'Ż' => "Z",
        'þ' => "th",
        'Þ' => "Th",
        'ð' => "d",
        'Ð' => "D",
        _ => return None,
    };
    Some(folded)
}
