// src/lib.rs
pub mod bridge;
pub mod buffer;
pub mod caller;
pub mod classic;
pub mod colors;
pub mod config;
pub mod error;
pub mod formatters;
pub mod global;
pub mod handler;
pub mod level;
pub mod logger;
pub mod mode;
pub mod record;
pub mod tty;
pub mod value;
pub mod writer;

pub use error::*;

pub use caller::{CallSite, ProjectRoot};
pub use classic::{Classic, ClassicEntry};
pub use colors::{ColorItem, ColorRepr, ColorScale, ColorSpec, HexColor, Rgb, Theme};
pub use config::{HandlerConfig, PaletteEntry};
pub use formatters::line::{FieldKind, LineFormatter};
pub use formatters::RecordFormatter;
pub use handler::{FatalHook, Handler};
pub use level::{level_name, Level};
pub use logger::Logger;
pub use mode::{Encoding, Mode, RenderMode};
pub use record::{Attrs, Context, Record};
pub use value::Value;
pub use writer::{Destination, RecordFile, SharedBuffer};
