//! Course name casing and category tagging.

use std::fmt;

use serde::Serialize;

/// Abbreviations that title-casing mangles, fixed up in this order.
///
/// Replacements are plain substring swaps and later entries see the output of
/// earlier ones, so the order is part of the behavior.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Ap", "AP"),
    ("Cp", "CP"),
    ("Am", "AM"),
    ("Tv", "TV"),
    ("Ab", "AB"),
    ("Ai", "AI"),
    ("Bc", "BC"),
    ("Ib", "IB"),
    ("Ii", "II"),
    ("Iii", "III"),
    ("Iv", "IV"),
];

const LANGUAGES: &[&str] = &[
    "Language",
    "Spanish",
    "French",
    "German",
    "Chinese",
    "Japanese",
    "Arabic",
    "Russian",
    "Italian",
    "Portuguese",
    "Korean",
    "Latin",
    "Greek",
    "Hebrew",
    "Hindi",
];

/// Keyword rules checked against the cased title; first match wins.
const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["AP", "IB"], Category::Advanced),
    (
        &["Math", "Algebra", "Geometry", "Calculus", "Statistics", "Precalc"],
        Category::Math,
    ),
    (&["Science", "Biology", "Chemistry"], Category::Science),
    (&["History", "Geography"], Category::History),
    (&["English", "Literature"], Category::English),
    (&["Art", "Music"], Category::Arts),
    (&["Physical Education", "PE"], Category::PhysicalEducation),
    (&["Computer", "Programming"], Category::Computing),
    (LANGUAGES, Category::Language),
    (&["Biotechnology"], Category::Biotechnology),
    (&["Forensics"], Category::Forensics),
    (&["Economics"], Category::Economics),
    (&["Psychology"], Category::Psychology),
    (&["Engineering"], Category::Engineering),
    (&["Environmental Science"], Category::EnvironmentalScience),
    (&["Philosophy"], Category::Philosophy),
    (&["Business"], Category::Business),
    (&["Law"], Category::Law),
    (&["Medicine"], Category::Medicine),
    (&["Lunch"], Category::Lunch),
    (&["Study Hall"], Category::StudyHall),
    (&["Free"], Category::Free),
    (&["Assembly"], Category::Assembly),
    (&["Advisory"], Category::Advisory),
    (&["Homeroom"], Category::Homeroom),
    (&["Meeting"], Category::Meeting),
    (&["Break"], Category::Break),
];

/// Visual grouping of a course in the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// AP and IB courses
    Advanced,
    Math,
    Science,
    History,
    English,
    Arts,
    PhysicalEducation,
    Computing,
    Language,
    Biotechnology,
    Forensics,
    Economics,
    Psychology,
    Engineering,
    EnvironmentalScience,
    Philosophy,
    Business,
    Law,
    Medicine,
    Lunch,
    StudyHall,
    Free,
    Assembly,
    Advisory,
    Homeroom,
    Meeting,
    Break,
    /// Anything no rule matched
    General,
}

impl Category {
    /// Emoji shown in front of the event title
    pub fn tag(self) -> &'static str {
        match self {
            Self::Advanced | Self::StudyHall => "📚",
            Self::Math => "➗",
            Self::Science => "🔬",
            Self::History => "🌍",
            Self::English => "📝",
            Self::Arts => "🎨",
            Self::PhysicalEducation => "🏅",
            Self::Computing => "💻",
            Self::Language => "🌐",
            Self::Biotechnology => "🧬",
            Self::Forensics => "\u{1F575}\u{FE0F}\u{200D}\u{2642}\u{FE0F}",
            Self::Economics => "💹",
            Self::Psychology => "🧠",
            Self::Engineering => "\u{1F6E0}\u{FE0F}",
            Self::EnvironmentalScience => "🌱",
            Self::Philosophy => "🤔",
            Self::Business => "💼",
            Self::Law => "\u{2696}\u{FE0F}",
            Self::Medicine => "🩺",
            Self::Lunch => "🍴",
            Self::Free => "\u{1F570}\u{FE0F}",
            Self::Assembly => "🎉",
            Self::Advisory | Self::Meeting => "👥",
            Self::Homeroom => "🏠",
            Self::Break => "☕",
            Self::General => "🎓",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Title-case `name`, then restore the abbreviations title-casing breaks.
///
/// `"ap biology ii"` becomes `"AP Biology II"`.
pub fn title_case(name: &str) -> String {
    ABBREVIATIONS
        .iter()
        .fold(plain_title_case(name), |title, (from, to)| {
            title.replace(from, to)
        })
}

/// Category of an already cased title.
pub fn classify(title: &str) -> Category {
    CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| title.contains(k)))
        .map_or(Category::General, |(_, category)| *category)
}

/// Calendar title for a raw course name, e.g. `"📚 AP Biology"`.
pub fn event_title(course_name: &str) -> String {
    let title = title_case(course_name);
    format!("{} {}", classify(&title), title)
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
fn plain_title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;

    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_lowercase() || c.is_uppercase();
    }

    out
}
