//! Plural ("numerus") form selection per language.
//!
//! A numerus message carries one `<numerusform>` per plural category of the
//! target language, in the order the rule below lists its categories.

/// Plural rule families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumerusRule {
    /// No plural distinction (Japanese, Chinese, Turkish, Hungarian, Persian, ...)
    Single,
    /// `n != 1`
    OneOther,
    /// `n > 1`, zero takes the singular (French, Brazilian Portuguese)
    ZeroOneOther,
    /// Russian, Ukrainian, Belarusian, Serbian, Croatian, Bosnian
    EastSlavic,
    Polish,
    /// Czech, Slovak
    WestSlavic,
    Lithuanian,
    Latvian,
    Slovenian,
    Romanian,
    Irish,
    Arabic,
}

impl NumerusRule {
    /// Finds the rule for a locale code such as `ar`, `pt_BR` or `km-KH`.
    #[must_use]
    pub fn for_language(code: &str) -> Option<Self> {
        let normalized = code.replace('-', "_").to_ascii_lowercase();
        let (language, territory) =
            normalized.split_once('_').map_or((normalized.as_str(), ""), |(l, t)| (l, t));

        let rule = match language {
            "ja" | "zh" | "ko" | "km" | "vi" | "th" | "id" | "ms" | "lo" | "my" | "bo" | "ug"
            | "ka" | "dz" | "hu" | "tr" | "fa" => Self::Single,
            "fr" | "hy" | "tl" | "fil" | "oc" | "ln" => Self::ZeroOneOther,
            "pt" if territory == "br" => Self::ZeroOneOther,
            "ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::WestSlavic,
            "lt" => Self::Lithuanian,
            "lv" => Self::Latvian,
            "sl" => Self::Slovenian,
            "ro" | "mo" => Self::Romanian,
            "ga" => Self::Irish,
            "ar" => Self::Arabic,
            "en" | "de" | "nl" | "sv" | "da" | "nb" | "nn" | "no" | "fo" | "fi" | "et" | "it"
            | "es" | "pt" | "ca" | "gl" | "eu" | "el" | "bg" | "mn" | "he" | "az" | "kk"
            | "ky" | "uz" | "tk" | "sq" | "mk" | "af" | "eo" | "fy" | "is" | "ur" | "hi"
            | "bn" | "ta" | "te" | "kn" | "ml" | "mr" | "gu" | "pa" | "ne" | "si" | "sw"
            | "am" | "ps" | "ku" | "ast" => Self::OneOther,
            _ => return None,
        };
        Some(rule)
    }

    /// Number of `<numerusform>` entries a translation must carry.
    #[must_use]
    pub const fn form_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::OneOther | Self::ZeroOneOther => 2,
            Self::EastSlavic
            | Self::Polish
            | Self::WestSlavic
            | Self::Lithuanian
            | Self::Latvian
            | Self::Romanian
            | Self::Irish => 3,
            Self::Slovenian => 4,
            Self::Arabic => 6,
        }
    }

    /// Index of the form to use for count `n`.
    #[must_use]
    pub const fn form_index(self, n: u64) -> usize {
        let n10 = n % 10;
        let n100 = n % 100;
        match self {
            Self::Single => 0,
            Self::OneOther => usize_from(n != 1),
            Self::ZeroOneOther => usize_from(n > 1),
            Self::EastSlavic => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && n10 <= 4 && !(n100 >= 12 && n100 <= 14) {
                    1
                } else {
                    2
                }
            }
            Self::Polish => {
                if n == 1 {
                    0
                } else if n10 >= 2 && n10 <= 4 && !(n100 >= 12 && n100 <= 14) {
                    1
                } else {
                    2
                }
            }
            Self::WestSlavic => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
            Self::Lithuanian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && (n100 < 10 || n100 >= 20) {
                    1
                } else {
                    2
                }
            }
            Self::Latvian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            Self::Slovenian => match n100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            Self::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (n100 >= 1 && n100 <= 19) {
                    1
                } else {
                    2
                }
            }
            Self::Irish => match n {
                1 => 0,
                2 => 1,
                _ => 2,
            },
            Self::Arabic => match n {
                0 => 0,
                1 => 1,
                2 => 2,
                _ => {
                    if n100 >= 3 && n100 <= 10 {
                        3
                    } else if n100 >= 11 {
                        4
                    } else {
                        5
                    }
                }
            },
        }
    }
}

/// `bool` to `0`/`1` in const context.
const fn usize_from(flag: bool) -> usize {
    if flag { 1 } else { 0 }
}
