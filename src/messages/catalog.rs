use crate::models::notification::ActionType;

/// Languages with a full set of templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub const fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Map an `Accept-Language` style value to a supported language.
    ///
    /// Only the primary subtag of the first entry counts, so `ar-IQ` and
    /// `en-US,en;q=0.9` both resolve. Anything unsupported is `None`.
    pub fn from_code(raw: &str) -> Option<Self> {
        let first = raw.split(',').next().unwrap_or_default();
        let tag = first.split(';').next().unwrap_or_default();
        let primary = tag.split(['-', '_']).next().unwrap_or_default().trim();

        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    /// Like `from_code`, with `fallback` for unknown or empty values.
    pub fn resolve(raw: Option<&str>, fallback: Language) -> Self {
        raw.and_then(Self::from_code).unwrap_or(fallback)
    }
}

/// Template for an action. `%1` is the actor clause, `%2` the reference
/// content.
pub fn template(action: ActionType, language: Language) -> &'static str {
    match (action, language) {
        (ActionType::Like, Language::En) => "%1 liked your post: %2",
        (ActionType::Like, Language::Ar) => "أبدى %1 إعجاباً بمشاركتك: %2",
        (ActionType::Comment, Language::En) => "%1 commented on your post: %2",
        (ActionType::Comment, Language::Ar) => "علق %1 على مشاركتك: %2",
        (ActionType::Mention, Language::En) => "%1 mentioned you in a comment: %2",
        (ActionType::Mention, Language::Ar) => "أشار إليك %1: %2",
    }
}

/// Clause naming the last actor plus `others` more. `%1` is the name,
/// `%2` the count.
pub fn others_clause(language: Language, others: usize) -> &'static str {
    match language {
        Language::En => match others {
            1 => "%1 and 1 other",
            _ => "%1 and %2 others",
        },
        Language::Ar => match others {
            1 => "%1 وشخص آخر",
            2 => "%1 وشخصان آخران",
            3..=10 => "%1 و%2 أشخاص آخرين",
            _ => "%1 و%2 شخصاً آخر",
        },
    }
}

/// Prefix applied to a lone actor name.
pub fn single_actor_prefix(language: Language) -> &'static str {
    match language {
        Language::En => "",
        Language::Ar => "\u{200F}",
    }
}
