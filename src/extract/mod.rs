//! Profile extraction with ordered fallback strategies
//!
//! Profile pages ship in several markup generations; extraction tries each
//! strategy in a fixed order and moves on only when the previous one did not
//! yield a name:
//!
//! 1. Social-preview metadata (`og:title` / `og:description`)
//! 2. The plain `<title>` element with the same delimiter heuristic
//! 3. Layout-specific markers (top-card heading/headline selectors)
//!
//! A record with an empty name is never returned; extraction reports
//! [`ExtractError::NoProfileData`] instead.

use scraper::{Html, Selector};

use crate::error::ExtractError;
use crate::models::ProfileRecord;

/// Sentence terminators that end a company mention in description text
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '|'];

/// Compiled selectors for the supported markup generations
struct ProfileSelectors {
    og_title: Selector,
    og_description: Selector,
    title: Selector,
    layout_name: Selector,
    layout_headline: Selector,
}

impl ProfileSelectors {
    fn new() -> Self {
        Self {
            og_title: Selector::parse(r#"meta[property="og:title"]"#).unwrap(),
            og_description: Selector::parse(r#"meta[property="og:description"]"#).unwrap(),
            title: Selector::parse("title").unwrap(),
            // Old public layout and the current authenticated layout
            layout_name: Selector::parse("h1.top-card-layout__title, h1.text-heading-xlarge")
                .unwrap(),
            layout_headline: Selector::parse(
                ".top-card-layout__headline, .text-body-medium.break-words",
            )
            .unwrap(),
        }
    }
}

/// Multi-strategy profile page extractor
pub struct ProfileExtractor {
    selectors: ProfileSelectors,
}

impl ProfileExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: ProfileSelectors::new(),
        }
    }

    /// Extract a [`ProfileRecord`] from fetched page HTML
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NoProfileData`] when no strategy produces a
    /// non-empty name. Callers must treat that as a fetch-level failure, not
    /// as a valid empty profile.
    pub fn extract(&self, html: &str, url: &str) -> Result<ProfileRecord, ExtractError> {
        let document = Html::parse_document(html);

        let parsed = self
            .from_metadata(&document)
            .or_else(|| self.from_title(&document))
            .or_else(|| self.from_layout(&document))
            .ok_or(ExtractError::NoProfileData)?;

        Ok(ProfileRecord {
            url: url.to_string(),
            name: parsed.name,
            title: parsed.role,
            company: parsed.company,
        })
    }

    /// Strategy 1: social-preview metadata tags
    fn from_metadata(&self, document: &Html) -> Option<ParsedHeading> {
        let og_title = document
            .select(&self.selectors.og_title)
            .next()
            .and_then(|el| el.value().attr("content"))?;

        let mut parsed = parse_heading(og_title)?;

        // The description mentions the employer as "... at Acme. ..."
        if let Some(description) = document
            .select(&self.selectors.og_description)
            .next()
            .and_then(|el| el.value().attr("content"))
        {
            if let Some(company) = company_from_description(description) {
                parsed.company = Some(company);
            }
        }

        Some(parsed)
    }

    /// Strategy 2: plain `<title>` element
    fn from_title(&self, document: &Html) -> Option<ParsedHeading> {
        let title = document
            .select(&self.selectors.title)
            .next()
            .map(|el| el.text().collect::<String>())?;

        parse_heading(&title)
    }

    /// Strategy 3: layout-specific markers
    fn from_layout(&self, document: &Html) -> Option<ParsedHeading> {
        let name = document
            .select(&self.selectors.layout_name)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty())?;

        let headline = document
            .select(&self.selectors.layout_headline)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());

        let (role, company) = match headline {
            Some(h) => split_role_at_company(&h),
            None => (None, None),
        };

        Some(ParsedHeading {
            name,
            role,
            company,
        })
    }
}

impl Default for ProfileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Intermediate result of the heading heuristic
struct ParsedHeading {
    name: String,
    role: Option<String>,
    company: Option<String>,
}

/// Delimiter heuristic shared by the metadata and `<title>` strategies
///
/// `"Jane Doe - Engineer at Acme | LinkedIn"` parses to name `Jane Doe`,
/// role `Engineer`, company `Acme`: the site suffix after `|` is dropped,
/// the name is the text before the first `-`, and the remainder splits on
/// `" at "`.
fn parse_heading(raw: &str) -> Option<ParsedHeading> {
    let before_pipe = raw.split('|').next().unwrap_or("");

    let (name_part, rest) = match before_pipe.split_once('-') {
        Some((name, rest)) => (name, Some(rest)),
        None => (before_pipe, None),
    };

    let name = collapse_whitespace(name_part);
    if name.is_empty() {
        return None;
    }

    let (role, company) = match rest {
        Some(r) => split_role_at_company(r),
        None => (None, None),
    };

    Some(ParsedHeading {
        name,
        role,
        company,
    })
}

/// Split a `"role at company"` headline into its parts
fn split_role_at_company(raw: &str) -> (Option<String>, Option<String>) {
    match raw.split_once(" at ") {
        Some((role, company)) => {
            let role = collapse_whitespace(role);
            let company = collapse_whitespace(company);
            (
                (!role.is_empty()).then_some(role),
                (!company.is_empty()).then_some(company),
            )
        }
        None => {
            let role = collapse_whitespace(raw);
            ((!role.is_empty()).then_some(role), None)
        }
    }
}

/// Company mention from description text: substring after `" at "`,
/// trimmed at the first sentence terminator
fn company_from_description(description: &str) -> Option<String> {
    let after = description.split_once(" at ")?.1;
    let company = after
        .split(SENTENCE_TERMINATORS)
        .next()
        .map(collapse_whitespace)?;
    (!company.is_empty()).then_some(company)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
