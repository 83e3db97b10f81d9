//! Random password generator.

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Characters that are easy to confuse with each other.
const LOOK_ALIKES: &str = "il1Lo0O";

/// Options for `generate`.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_look_alikes: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
            exclude_look_alikes: true,
        }
    }
}

/// Generate a random password.
///
/// At least one character of every selected class is included, so the
/// result may be longer than `length` when `length` is smaller than the
/// number of selected classes.  With no class selected, letters and
/// digits are used.
pub fn generate(opts: &GeneratorOptions) -> Zeroizing<String> {
    let mut classes: Vec<&str> = Vec::new();
    if opts.uppercase {
        classes.push(UPPERCASE);
    }
    if opts.lowercase {
        classes.push(LOWERCASE);
    }
    if opts.digits {
        classes.push(DIGITS);
    }
    if opts.symbols {
        classes.push(SYMBOLS);
    }

    let mut pool: Vec<char> = if classes.is_empty() {
        UPPERCASE.chars().chain(LOWERCASE.chars()).chain(DIGITS.chars()).collect()
    } else {
        classes.iter().flat_map(|c| c.chars()).collect()
    };
    if opts.exclude_look_alikes {
        pool.retain(|c| !LOOK_ALIKES.contains(*c));
    }

    let mut rng = rand::rng();
    let mut password: Vec<char> = Vec::with_capacity(opts.length.max(classes.len()));

    // Required characters come from the full class (look-alikes included).
    for class in &classes {
        let chars: Vec<char> = class.chars().collect();
        password.push(chars[rng.random_range(0..chars.len())]);
    }

    let remaining = opts.length.saturating_sub(classes.len());
    for _ in 0..remaining {
        password.push(pool[rng.random_range(0..pool.len())]);
    }

    password.shuffle(&mut rng);
    let out: String = password.iter().collect();
    password.iter_mut().for_each(|c| *c = '\0');
    Zeroizing::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_length_is_16() {
        assert_eq!(generate(&GeneratorOptions::default()).chars().count(), 16);
    }

    #[test]
    fn contains_every_selected_class() {
        for _ in 0..20 {
            let pw = generate(&GeneratorOptions::default());
            assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
            assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
            assert!(pw.chars().any(|c| c.is_ascii_digit()));
            assert!(pw.chars().any(|c| SYMBOLS.contains(c)));
        }
    }

    #[test]
    fn digits_only() {
        let opts = GeneratorOptions {
            length: 12,
            uppercase: false,
            lowercase: false,
            symbols: false,
            ..GeneratorOptions::default()
        };
        let pw = generate(&opts);
        assert_eq!(pw.len(), 12);
        assert!(pw.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn no_class_falls_back_to_alphanumerics() {
        let opts = GeneratorOptions {
            length: 24,
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
            exclude_look_alikes: false,
        };
        let pw = generate(&opts);
        assert_eq!(pw.len(), 24);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn short_length_still_covers_classes() {
        let opts = GeneratorOptions {
            length: 2,
            ..GeneratorOptions::default()
        };
        assert_eq!(generate(&opts).len(), 4);
    }
}
