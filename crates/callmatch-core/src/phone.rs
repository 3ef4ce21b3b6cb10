//! Phone number normalization
//!
//! Spreadsheets and the PBX log write the same subscriber in different
//! shapes: with or without the country code, with separators, or as a
//! composite caller ID (`"Name" <number>`). Numbers are reduced to digits
//! and expanded into a set of equivalent representations; two numbers are
//! the same subscriber when their sets intersect.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Country calling code used when none is configured
pub const DEFAULT_COUNTRY_PREFIX: &str = "995";

/// Length of a national subscriber number
pub const LOCAL_NUMBER_DIGITS: usize = 9;

/// Strip every non-digit character.
///
/// ```
/// use callmatch_core::phone::normalize;
///
/// assert_eq!(normalize("+995 (555) 12-34-56"), "995555123456");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Number embedded in a composite caller ID such as `"Jane" <555123456>`
pub fn caller_id_number(clid: &str) -> Option<&str> {
    let open = clid.find('<')?;
    let close = clid[open..].find('>')? + open;
    let inner = clid[open + 1..close].trim();
    (!inner.is_empty()).then_some(inner)
}

/// Digit string plus the set of representations it is equivalent to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedNumber {
    digits: String,
    variants: BTreeSet<String>,
}

impl NormalizedNumber {
    /// Digits-only form
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Equivalent representations (empty for an empty number)
    pub fn variants(&self) -> &BTreeSet<String> {
        &self.variants
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Whether both numbers share at least one representation.
    ///
    /// Empty numbers never match anything, including other empty numbers.
    pub fn matches(&self, other: &NormalizedNumber) -> bool {
        self.matches_any(&other.variants)
    }

    /// Whether any representation of this number is in `set`
    pub fn matches_any(&self, set: &BTreeSet<String>) -> bool {
        !self.is_empty() && self.variants.iter().any(|v| set.contains(v))
    }
}

/// Normalizer configured with the country prefix of the deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNormalizer {
    country_prefix: String,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_PREFIX)
    }
}

impl PhoneNormalizer {
    /// Create a normalizer; non-digits in the prefix are ignored
    pub fn new(country_prefix: &str) -> Self {
        Self {
            country_prefix: normalize(country_prefix),
        }
    }

    pub fn country_prefix(&self) -> &str {
        &self.country_prefix
    }

    /// Expand a number into its equivalent representations.
    ///
    /// The set holds the number itself, the number without the country
    /// prefix (when longer than a local number and prefixed), the number
    /// with the prefix (when local length or shorter and unprefixed), and
    /// the last nine digits (when at least nine long).
    ///
    /// ```
    /// use callmatch_core::PhoneNormalizer;
    ///
    /// let normalizer = PhoneNormalizer::default();
    /// let set = normalizer.expand("995555123456");
    /// assert!(set.contains("555123456"));
    /// assert!(normalizer.expand("").is_empty());
    /// ```
    pub fn expand(&self, number: &str) -> BTreeSet<String> {
        let digits = normalize(number);
        let mut set = BTreeSet::new();
        if digits.is_empty() {
            return set;
        }

        let prefix = self.country_prefix.as_str();
        let prefixed = !prefix.is_empty() && digits.starts_with(prefix);

        if digits.len() > LOCAL_NUMBER_DIGITS && prefixed {
            set.insert(digits[prefix.len()..].to_string());
        }

        if digits.len() <= LOCAL_NUMBER_DIGITS && !prefixed && !prefix.is_empty() {
            set.insert(format!("{}{}", prefix, digits));
        }

        if digits.len() >= LOCAL_NUMBER_DIGITS {
            set.insert(digits[digits.len() - LOCAL_NUMBER_DIGITS..].to_string());
        }

        set.insert(digits);
        set
    }

    /// Normalize and expand a raw number
    pub fn normalized(&self, raw: &str) -> NormalizedNumber {
        let digits = normalize(raw);
        let variants = self.expand(&digits);
        NormalizedNumber { digits, variants }
    }

    /// Union of the representations of every non-empty number
    pub fn expand_all<'a, I>(&self, numbers: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        numbers
            .into_iter()
            .flat_map(|n| self.expand(n))
            .collect()
    }
}
