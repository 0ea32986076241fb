use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::vars::is_template_segment;

/// Reserved name of the folder that holds endpoints no longer present in a reference.
pub const RETIRED_FOLDER: &str = "_retired";

/// Key under `protocolProfileBehavior` used to tag newly added items.
pub const STATUS_KEY: &str = "x-status";

/// A request collection: ordered tree of folders and requests under a root.
///
/// Unknown top-level keys (`auth`, `event`, `variable`, ...) are kept in `extra`
/// and written back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub item: Vec<Item>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Present keys deserialize to `Some`, even an explicit `null`, so it is
/// written back instead of dropped.
fn keep_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One node of the collection tree.
///
/// Classification is structural: an object with an `item` array is a folder,
/// an object with a `request` key is a request. Anything else, or anything
/// whose typed shape does not fit, is kept as an opaque leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Folder(Folder),
    Request(RequestItem),
    Opaque(Value),
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Item::classify(value))
    }
}

impl Item {
    /// Classify a raw JSON node. Never fails: unrecognized shapes become `Opaque`.
    pub fn classify(value: Value) -> Item {
        let (is_folder, is_request) = match value.as_object() {
            Some(obj) => (
                obj.get("item").is_some_and(Value::is_array),
                obj.contains_key("request"),
            ),
            None => (false, false),
        };

        if is_folder {
            return match serde_json::from_value::<Folder>(value.clone()) {
                Ok(f) => Item::Folder(f),
                Err(_) => Item::Opaque(value),
            };
        }
        if is_request {
            return match serde_json::from_value::<RequestItem>(value.clone()) {
                Ok(r) => Item::Request(r),
                Err(_) => Item::Opaque(value),
            };
        }
        Item::Opaque(value)
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Folder(f) => &f.name,
            Item::Request(r) => &r.name,
            Item::Opaque(v) => v.get("name").and_then(Value::as_str).unwrap_or(""),
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Item::Folder(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Item::Folder(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&RequestItem> {
        match self {
            Item::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_request_mut(&mut self) -> Option<&mut RequestItem> {
        match self {
            Item::Request(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub item: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_retired(&self) -> bool {
        self.name == RETIRED_FOLDER
    }
}

/// A request leaf. `event`, `response` and item-level extras are human or
/// historical artifacts and are never touched by merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub request: Request,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    #[serde(
        rename = "protocolProfileBehavior",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub protocol_profile_behavior: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestItem {
    /// Status tag stored under `protocolProfileBehavior["x-status"]`, if any.
    pub fn status_tag(&self) -> Option<&str> {
        self.protocol_profile_behavior
            .as_ref()
            .and_then(|m| m.get(STATUS_KEY))
            .and_then(Value::as_str)
    }

    pub fn set_status_tag(&mut self, tag: &str) {
        self.protocol_profile_behavior
            .get_or_insert_with(Map::new)
            .insert(STATUS_KEY.to_string(), Value::String(tag.to_string()));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request headers: normally a key/value list, kept opaque otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderList {
    List(Vec<KeyValue>),
    Other(Value),
}

impl HeaderList {
    pub fn as_list(&self) -> Option<&[KeyValue]> {
        match self {
            HeaderList::List(l) => Some(l),
            HeaderList::Other(_) => None,
        }
    }
}

/// Key/value entry shared by headers, query params and path variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(Value::String(value.into())),
            extra: Map::new(),
        }
    }

    pub fn key_str(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Body {
    pub fn raw_text(&self) -> Option<&str> {
        self.raw.as_ref().and_then(Value::as_str)
    }

    pub fn is_raw_mode(&self) -> bool {
        self.mode.as_deref() == Some("raw")
    }
}

/// Plain text or a typed `{content, type}` wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Content(DescriptionContent),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Description {
    pub fn text(&self) -> &str {
        match self {
            Description::Text(s) => s,
            Description::Content(c) => c.content.as_deref().unwrap_or(""),
            Description::Other(_) => "",
        }
    }

    /// Build a description holding `text`, shaped like `like`.
    ///
    /// A wrapper keeps its other keys and defaults its `type` to `text/plain`.
    pub fn shaped_like(like: Option<&Description>, text: String) -> Description {
        match like {
            Some(Description::Content(c)) => Description::Content(DescriptionContent {
                content: Some(text),
                kind: c.kind.clone().or_else(|| Some("text/plain".to_string())),
                extra: c.extra.clone(),
            }),
            _ => Description::Text(text),
        }
    }
}

/// Request address in string, structured or unrecognized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Url {
    Raw(String),
    Structured(UrlObject),
    Other(Value),
}

impl Url {
    /// Best single-string form: the raw field when present, otherwise host and path joined.
    pub fn to_display_string(&self) -> String {
        match self {
            Url::Raw(s) => s.clone(),
            Url::Structured(o) => o.to_display_string(),
            Url::Other(v) => v.to_string(),
        }
    }

    /// Structured view of this URL; string forms are parsed, opaque forms yield `None`.
    pub fn to_structured(&self) -> Option<UrlObject> {
        match self {
            Url::Raw(s) => Some(UrlObject::parse_raw(s)),
            Url::Structured(o) => Some(o.expanded()),
            Url::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Segments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Segments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<Vec<KeyValue>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UrlObject {
    /// Split a raw address into protocol, host labels, path segments and query.
    ///
    /// Host detection follows [`split_address`], so the path kept here is the
    /// same one the normalizer keys on.
    pub fn parse_raw(raw: &str) -> UrlObject {
        let parts = split_address(raw);

        let mut extra = Map::new();
        if let Some(port) = parts.port {
            extra.insert("port".to_string(), Value::String(port.to_string()));
        }
        let host = parts
            .host
            .map(|h| Segments::List(h.split('.').map(str::to_string).collect()));
        let path: Vec<String> = parts
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let query = parts.query.filter(|q| !q.is_empty()).map(|q| {
            q.split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| match pair.split_once('=') {
                    Some((k, v)) => KeyValue::new(k, v),
                    None => KeyValue {
                        key: Some(pair.to_string()),
                        value: None,
                        extra: Map::new(),
                    },
                })
                .collect()
        });

        UrlObject {
            raw: Some(raw.to_string()),
            protocol: parts.protocol.map(str::to_string),
            host,
            path: if path.is_empty() { None } else { Some(Segments::List(path)) },
            query,
            variable: None,
            extra,
        }
    }

    /// Fill protocol, host, port, path and query from `raw` when the object
    /// carries nothing else.
    pub fn expanded(&self) -> UrlObject {
        let mut out = self.clone();
        let raw = match self.raw.as_deref() {
            Some(raw) if self.host.is_none() && self.path.is_none() => raw,
            _ => return out,
        };

        let parsed = UrlObject::parse_raw(raw);
        out.protocol = out.protocol.take().or(parsed.protocol);
        out.host = parsed.host;
        out.path = parsed.path;
        if out.query.is_none() {
            out.query = parsed.query;
        }
        for (k, v) in parsed.extra {
            out.extra.entry(k).or_insert(v);
        }
        out
    }

    pub fn to_display_string(&self) -> String {
        match self.raw.as_deref() {
            Some(raw) => raw.to_string(),
            None => self.compose_raw(),
        }
    }

    /// Build an address from protocol, host, port, path and enabled query
    /// params, ignoring any stored `raw`.
    pub fn compose_raw(&self) -> String {
        let host = match &self.host {
            Some(Segments::List(l)) => l.join("."),
            Some(Segments::Joined(s)) => s.clone(),
            None => String::new(),
        };
        let path = match &self.path {
            Some(Segments::List(l)) => l.join("/"),
            Some(Segments::Joined(s)) => s.trim_start_matches('/').to_string(),
            None => String::new(),
        };

        let mut out = String::new();
        if let Some(p) = self.protocol.as_deref() {
            out.push_str(p);
            out.push_str("://");
        }
        out.push_str(&host);
        if let Some(port) = self.extra.get("port").and_then(Value::as_str) {
            out.push(':');
            out.push_str(port);
        }
        if !path.is_empty() {
            out.push('/');
            out.push_str(&path);
        }

        let query: Vec<String> = self
            .query
            .iter()
            .flatten()
            .filter(|q| q.extra.get("disabled").and_then(Value::as_bool) != Some(true))
            .map(|q| match q.value_str() {
                Some(v) => format!("{}={v}", q.key_str()),
                None => q.key_str().to_string(),
            })
            .collect();
        if !query.is_empty() {
            out.push('?');
            out.push_str(&query.join("&"));
        }
        out
    }
}

/// A raw address cut into its parts. Everything borrows from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddressParts<'a> {
    pub protocol: Option<&'a str>,
    pub host: Option<&'a str>,
    pub port: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

/// Cut a raw address into scheme, host, port, path and query.
///
/// Without a `scheme://` prefix the first segment is only a host when it is a
/// `{{var}}` or a `name:port` pair (`{{baseUrl}}/v1`, `localhost:3000/v1`).
/// A bare `api/v1/x` is all path.
pub fn split_address(raw: &str) -> AddressParts<'_> {
    let raw = raw.trim();
    let without_fragment = raw.split('#').next().unwrap_or("");
    let (address, query) = match without_fragment.split_once('?') {
        Some((a, q)) => (a, Some(q)),
        None => (without_fragment, None),
    };

    let (protocol, rest) = match address.split_once("://") {
        Some((p, r)) if is_scheme(p) => (Some(p), r),
        _ => (None, address),
    };

    let (first, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    let (label, port) = match first.rsplit_once(':') {
        Some((h, p)) if !h.is_empty() && !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => {
            (h, Some(p))
        }
        _ => (first, None),
    };

    let is_host = protocol.is_some() || port.is_some() || is_template_segment(label);
    if !is_host {
        return AddressParts {
            path: rest,
            query,
            ..AddressParts::default()
        };
    }

    AddressParts {
        protocol,
        host: Some(label).filter(|h| !h.is_empty()),
        port,
        path,
        query,
    }
}

fn is_scheme(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c))
}

/// Host or path: a segment list, or a single joined string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segments {
    List(Vec<String>),
    Joined(String),
}

impl Segments {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Segments::List(l) => Some(l),
            Segments::Joined(_) => None,
        }
    }

    /// Iterate over every textual piece, whichever form is stored.
    pub fn pieces(&self) -> Vec<&str> {
        match self {
            Segments::List(l) => l.iter().map(String::as_str).collect(),
            Segments::Joined(s) => vec![s.as_str()],
        }
    }
}
