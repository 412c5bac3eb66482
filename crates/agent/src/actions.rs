use std::sync::OnceLock;

use regex::Regex;

use dappazon_core::domain::action::{Action, ActionTag};

/// Kinds are ASCII word characters only.
const ACTION_TAG_PATTERN: &str = r"\[ACTION:([A-Za-z0-9_]+):?([^\]]*)\]";

fn action_tag_re() -> &'static Regex {
    static ACTION_TAG_RE: OnceLock<Regex> = OnceLock::new();
    ACTION_TAG_RE.get_or_init(|| Regex::new(ACTION_TAG_PATTERN).expect("action tag pattern"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// Input with every tag removed, trimmed at both ends.
    pub clean_text: String,
    /// Tags in order of appearance.
    pub tags: Vec<ActionTag>,
}

impl Extraction {
    pub fn actions(&self) -> Vec<Action> {
        self.tags.iter().cloned().map(Action::decode).collect()
    }
}

/// Pulls every `[ACTION:KIND]` / `[ACTION:KIND:PAYLOAD]` tag out of model text.
/// Kinds are not validated here.
pub fn extract(text: &str) -> Extraction {
    let re = action_tag_re();

    let tags = re
        .captures_iter(text)
        .map(|captures| {
            let kind = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let payload = captures
                .get(2)
                .map(|m| m.as_str())
                .filter(|payload| !payload.is_empty())
                .map(str::to_string);
            ActionTag::new(kind, payload)
        })
        .collect();

    let clean_text = re.replace_all(text, "").trim().to_string();

    Extraction { clean_text, tags }
}
