use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub const VIEW_PRODUCT: &str = "VIEW_PRODUCT";
pub const VIEW_CATEGORY: &str = "VIEW_CATEGORY";
pub const GO_HOME: &str = "GO_HOME";
pub const GO_CART: &str = "GO_CART";
pub const WEB_SEARCH: &str = "WEB_SEARCH";
pub const WEB_SEARCH_RESULTS: &str = "WEB_SEARCH_RESULTS";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Undecoded `[ACTION:KIND:PAYLOAD]` envelope as it appeared in model output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTag {
    pub kind: String,
    pub payload: Option<String>,
}

impl ActionTag {
    pub fn new(kind: impl Into<String>, payload: Option<String>) -> Self {
        Self { kind: kind.into(), payload }
    }
}

/// UI directive attached to a turn. Unrecognized kinds are carried through as
/// `Unknown` so the caller decides what to ignore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    ViewProduct(String),
    ViewCategory(String),
    GoHome,
    GoCart,
    WebSearch(String),
    WebSearchResults(Vec<SearchResult>),
    Unknown { kind: String, payload: Option<String> },
}

impl Action {
    pub fn decode(tag: ActionTag) -> Self {
        let ActionTag { kind, payload } = tag;
        match (kind.as_str(), payload) {
            (VIEW_PRODUCT, Some(id)) => Self::ViewProduct(id),
            (VIEW_CATEGORY, Some(category)) => Self::ViewCategory(category),
            (GO_HOME, _) => Self::GoHome,
            (GO_CART, _) => Self::GoCart,
            (WEB_SEARCH, Some(query)) => Self::WebSearch(query),
            (_, payload) => Self::Unknown { kind: kind.clone(), payload },
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::ViewProduct(_) => VIEW_PRODUCT,
            Self::ViewCategory(_) => VIEW_CATEGORY,
            Self::GoHome => GO_HOME,
            Self::GoCart => GO_CART,
            Self::WebSearch(_) => WEB_SEARCH,
            Self::WebSearchResults(_) => WEB_SEARCH_RESULTS,
            Self::Unknown { kind, .. } => kind,
        }
    }

    /// Query of a search request worth executing; blank queries are not.
    pub fn search_query(&self) -> Option<&str> {
        match self {
            Self::WebSearch(query) if !query.trim().is_empty() => Some(query.as_str()),
            _ => None,
        }
    }

    fn payload_value(&self) -> Value {
        match self {
            Self::ViewProduct(value) | Self::ViewCategory(value) | Self::WebSearch(value) => {
                Value::String(value.clone())
            }
            Self::GoHome | Self::GoCart => Value::Null,
            Self::WebSearchResults(results) => {
                serde_json::to_value(results).unwrap_or(Value::Array(Vec::new()))
            }
            Self::Unknown { payload, .. } => {
                payload.clone().map(Value::String).unwrap_or(Value::Null)
            }
        }
    }
}

#[derive(Serialize)]
struct WireAction<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: Value,
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WireAction { kind: self.kind(), payload: self.payload_value() }.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Action, ActionTag, SearchResult};

    #[test]
    fn decodes_known_kinds() {
        assert_eq!(
            Action::decode(ActionTag::new("VIEW_PRODUCT", Some("2".to_string()))),
            Action::ViewProduct("2".to_string())
        );
        assert_eq!(Action::decode(ActionTag::new("GO_HOME", None)), Action::GoHome);
        assert_eq!(Action::decode(ActionTag::new("GO_CART", None)), Action::GoCart);
        assert_eq!(
            Action::decode(ActionTag::new("VIEW_CATEGORY", Some("toys".to_string()))),
            Action::ViewCategory("toys".to_string())
        );
    }

    #[test]
    fn unknown_kinds_and_shape_mismatches_fall_through() {
        assert_eq!(
            Action::decode(ActionTag::new("DANCE", Some("salsa".to_string()))),
            Action::Unknown { kind: "DANCE".to_string(), payload: Some("salsa".to_string()) }
        );
        assert_eq!(
            Action::decode(ActionTag::new("VIEW_PRODUCT", None)),
            Action::Unknown { kind: "VIEW_PRODUCT".to_string(), payload: None }
        );
    }

    #[test]
    fn blank_search_query_is_not_executable() {
        assert_eq!(Action::WebSearch("  ".to_string()).search_query(), None);
        assert_eq!(Action::WebSearch("eth".to_string()).search_query(), Some("eth"));
        assert_eq!(Action::GoHome.search_query(), None);
    }

    #[test]
    fn serializes_to_type_payload_envelope() {
        let actions = vec![
            Action::ViewProduct("2".to_string()),
            Action::GoCart,
            Action::Unknown { kind: "DANCE".to_string(), payload: None },
            Action::WebSearchResults(vec![SearchResult {
                title: "ETH".to_string(),
                link: "https://example.org".to_string(),
                snippet: "price".to_string(),
            }]),
        ];

        let value = serde_json::to_value(&actions).expect("serialize");
        assert_eq!(
            value,
            json!([
                {"type": "VIEW_PRODUCT", "payload": "2"},
                {"type": "GO_CART", "payload": null},
                {"type": "DANCE", "payload": null},
                {"type": "WEB_SEARCH_RESULTS", "payload": [
                    {"title": "ETH", "link": "https://example.org", "snippet": "price"}
                ]},
            ])
        );
    }
}
