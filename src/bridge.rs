//! Route the `log` crate's macros through a [`Handler`].

use crate::caller::CallSite;
use crate::error::LogError;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{Attrs, Context, Record};
use crate::value::Value;
use log::kv::{self, Key, VisitSource};
use log::{Log, Metadata};
use std::sync::Arc;

pub struct LogBridge {
    handler: Arc<Handler>,
}

impl LogBridge {
    pub fn new(handler: Arc<Handler>) -> Self {
        LogBridge { handler }
    }
}

struct AttrCollector<'a>(&'a mut Attrs);

impl<'kvs> VisitSource<'kvs> for AttrCollector<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.insert(key.as_str(), convert(&value));
        Ok(())
    }
}

fn convert(value: &kv::Value<'_>) -> Value {
    if let Some(b) = value.to_bool() {
        Value::Bool(b)
    } else if let Some(i) = value.to_i64() {
        Value::Int(i)
    } else if let Some(u) = value.to_u64() {
        Value::Uint(u)
    } else if let Some(f) = value.to_f64() {
        Value::Float(f)
    } else {
        Value::Str(value.to_string())
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.handler.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let call_site = match (record.file(), record.line()) {
            (Some(file), Some(line)) => CallSite::new(file, line),
            _ => CallSite::unknown(),
        };
        let mut attrs = Attrs::new();
        if let Err(e) = record.key_values().visit(&mut AttrCollector(&mut attrs)) {
            eprintln!("linelog: dropped key-values from '{}': {}", record.target(), e);
        }
        let event = Record::new(Level::from(record.level()), record.args().to_string())
            .with_call_site(call_site)
            .with_attrs(attrs);
        if let Err(e) = self.handler.handle(&Context::background(), &event) {
            eprintln!("linelog: write failed: {}", e);
        }
    }

    fn flush(&self) {
        let _ = self.handler.flush();
    }
}

/// Register `handler` as the `log` crate's global logger. Fails if a logger
/// is already registered.
pub fn install(handler: Arc<Handler>) -> Result<(), LogError> {
    let max_level = handler.level().to_level_filter();
    log::set_boxed_logger(Box::new(LogBridge::new(handler)))
        .map_err(|e| LogError::Bridge(e.to_string()))?;
    log::set_max_level(max_level);
    Ok(())
}
