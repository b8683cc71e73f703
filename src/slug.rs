//! Title to URL slug conversion with Russian transliteration.

fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "yi",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        'є' => "ye",
        'ї' => "yi",
        'і' => "i",
        'ґ' => "g",
        _ => return None,
    };
    Some(s)
}

/// Lowercases, turns `&` into `and`, collapses whitespace and hyphen runs into
/// a single `-`, transliterates Cyrillic and drops everything else that is not
/// `[a-z0-9_]`.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase().replace("&amp;", " and ").replace('&', " and ");

    let mut out = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
            continue;
        }
        let piece = if c.is_ascii_alphanumeric() || c == '_' {
            Some(c.to_string())
        } else {
            transliterate(c).map(str::to_string)
        };
        let Some(piece) = piece else {
            continue;
        };
        if piece.is_empty() {
            continue;
        }
        if pending_dash && !out.is_empty() {
            out.push('-');
        }
        pending_dash = false;
        out.push_str(&piece);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn transliterates_cyrillic() {
        assert_eq!(slugify("Инопланетянин"), "inoplanetyanin");
        assert_eq!(slugify("Щит и меч"), "schit-i-mech");
    }

    #[test]
    fn ascii_titles() {
        assert_eq!(slugify("The Dark Knight"), "the-dark-knight");
        assert_eq!(slugify("  Mad Max:  Fury Road "), "mad-max-fury-road");
        assert_eq!(slugify("Fast & Furious"), "fast-and-furious");
        assert_eq!(slugify("Spider-Man -- Homecoming"), "spider-man-homecoming");
    }

    #[test]
    fn deterministic() {
        assert_eq!(slugify("Брат 2"), slugify("Брат 2"));
        assert_eq!(slugify("Брат 2"), "brat-2");
    }
}
