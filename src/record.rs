use crate::caller::CallSite;
use crate::level::Level;
use crate::value::Value;
use chrono::{DateTime, Local};
use indexmap::IndexMap;

/// Key used for an attribute value that arrived without a string key
pub const BAD_KEY: &str = "!BAD-KEY";

/// Record attributes. Keys are unique and the first writer wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs(IndexMap<String, Value>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key is already present. Returns whether it was inserted.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    /// Pair up alternating key/value arguments.
    ///
    /// A string followed by another argument is a key. Anything else (a
    /// non-string, or a trailing string with nothing after it) is kept as a
    /// value under [`BAD_KEY`] so the mistake shows up in the output.
    pub fn from_args(args: &[Value]) -> Self {
        let mut attrs = Self::new();
        let mut i = 0;
        while i < args.len() {
            match (&args[i], args.get(i + 1)) {
                (Value::Str(key), Some(value)) => {
                    attrs.insert(key.clone(), value.clone());
                    i += 2;
                }
                (other, _) => {
                    attrs.insert(BAD_KEY, other.clone());
                    i += 1;
                }
            }
        }
        attrs
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

/// One log event. Built by a facade, then only read.
#[derive(Debug, Clone)]
pub struct Record {
    time: DateTime<Local>,
    level: Level,
    message: String,
    attrs: Attrs,
    call_site: CallSite,
}

impl Record {
    /// A record stamped now, attributed to the caller.
    #[track_caller]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            message: message.into(),
            attrs: Attrs::new(),
            call_site: CallSite::caller(),
        }
    }

    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = call_site;
        self
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key, value);
        self
    }

    pub fn time(&self) -> &DateTime<Local> {
        &self.time
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }
}

/// Ambient values handed to `*_ctx` calls, the fatal hook and classic entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: IndexMap<String, Value>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
