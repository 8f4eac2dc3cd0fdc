//! Deep links that open the chat with a canned question

use url::{form_urlencoded, Url};

/// Name of the query parameter that selects a canned question
pub const QUESTION_PARAM: &str = "question";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedQuestion {
    Admission,
    Courses,
    Fees,
    Scholarships,
}

impl CannedQuestion {
    pub fn all() -> [CannedQuestion; 4] {
        [
            CannedQuestion::Admission,
            CannedQuestion::Courses,
            CannedQuestion::Fees,
            CannedQuestion::Scholarships,
        ]
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            CannedQuestion::Admission => "admission",
            CannedQuestion::Courses => "courses",
            CannedQuestion::Fees => "fees",
            CannedQuestion::Scholarships => "scholarships",
        }
    }

    /// Exact match only; anything else is ignored
    pub fn from_param(value: &str) -> Option<Self> {
        Self::all().into_iter().find(|q| q.as_param() == value)
    }

    pub fn question(&self) -> &'static str {
        match self {
            CannedQuestion::Admission => "Tell me about the admission process",
            CannedQuestion::Courses => "What courses do you offer?",
            CannedQuestion::Fees => "What is the fee structure?",
            CannedQuestion::Scholarships => "Do you offer scholarships?",
        }
    }

    /// Read the `question` parameter from a full URL, a relative link
    /// (`/chat?question=fees`) or a bare query string (`question=fees`).
    /// The first occurrence wins.
    pub fn from_link(link: &str) -> Option<Self> {
        let query = match Url::parse(link) {
            Ok(url) => url.query()?.to_owned(),
            Err(_) => match link.split_once('?') {
                Some((_, query)) => query.to_owned(),
                None => link.to_owned(),
            },
        };

        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == QUESTION_PARAM)
            .and_then(|(_, value)| Self::from_param(&value))
    }
}
