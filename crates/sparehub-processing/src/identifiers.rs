//! Slug and SKU derivation.
//!
//! Both carry a random suffix and are not checked against the store; the
//! `products` table enforces uniqueness and a collision surfaces as a row error.

use rand::Rng;

const SLUG_MAX_LEN: usize = 80;
const SLUG_SUFFIX_LEN: usize = 6;
const SKU_PREFIX: &str = "SP-";
const SKU_TOKEN_LEN: usize = 10;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// Crockford base32: no I, L, O or U, so tokens survive being read aloud or retyped
const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' | 'й' => "i",
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
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(s)
}

/// URL-safe lowercase form of a product name: ASCII letters, digits and single dashes
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    let mut push = |piece: &str, slug: &mut String| {
        for ch in piece.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(ch);
            } else {
                pending_dash = true;
            }
        }
    };

    for c in name.chars().flat_map(char::to_lowercase) {
        match transliterate(c) {
            Some(latin) => push(latin, &mut slug),
            None => {
                let mut buf = [0u8; 4];
                push(c.encode_utf8(&mut buf), &mut slug);
            }
        }
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }

    slug.truncate(SLUG_MAX_LEN);
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "product".to_string()
    } else {
        slug
    }
}

fn random_token<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Slug for a new product: `slugify(name)` plus a random base36 suffix
pub fn new_slug(name: &str) -> String {
    new_slug_with(&mut rand::rng(), name)
}

pub fn new_slug_with<R: Rng + ?Sized>(rng: &mut R, name: &str) -> String {
    format!(
        "{}-{}",
        slugify(name),
        random_token(rng, BASE36, SLUG_SUFFIX_LEN)
    )
}

/// SKU for a product the seller did not assign one to, e.g. `SP-7K2M9QX4TB`
pub fn new_sku() -> String {
    new_sku_with(&mut rand::rng())
}

pub fn new_sku_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}{}",
        SKU_PREFIX,
        random_token(rng, CROCKFORD, SKU_TOKEN_LEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_slugify_ascii() {
        assert_eq!(slugify("Oil Filter CAT C7"), "oil-filter-cat-c7");
        assert_eq!(slugify("  Boom / lift -- cylinder!! "), "boom-lift-cylinder");
    }

    #[test]
    fn test_slugify_cyrillic() {
        assert_eq!(slugify("Фильтр масляный"), "filtr-maslyanyi");
        assert_eq!(slugify("Щётка"), "schetka");
    }

    #[test]
    fn test_slugify_fallback_and_cap() {
        assert_eq!(slugify("!!!"), "product");
        assert_eq!(slugify("日本"), "product");
        let long = slugify(&"part ".repeat(40));
        assert!(long.len() <= SLUG_MAX_LEN);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn test_new_slug_has_random_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let slug = new_slug_with(&mut rng, "Hydraulic pump");
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "hydraulic-pump");
        assert_eq!(suffix.len(), SLUG_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_new_sku_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let sku = new_sku_with(&mut rng);
        assert!(sku.starts_with(SKU_PREFIX));
        let token = &sku[SKU_PREFIX.len()..];
        assert_eq!(token.len(), SKU_TOKEN_LEN);
        assert!(token.bytes().all(|b| CROCKFORD.contains(&b)));
    }

    #[test]
    fn test_skus_differ() {
        let a = new_sku();
        let b = new_sku();
        assert_ne!(a, b);
    }
}
