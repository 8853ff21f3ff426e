use anyhow::{anyhow, Context as _};
use clap::{ArgAction, Parser};
use std::io::{self, BufRead};
use std::path::PathBuf;

use linelog::{
    Destination, Encoding, FieldKind, Handler, HandlerConfig, Level, Logger, RecordFile,
    RenderMode, Theme, Value,
};

#[derive(Parser)]
#[command(name = "linelog")]
#[command(about = "Write messages as structured log lines")]
#[command(version)]
struct Args {
    /// Messages to log; stdin lines are logged when none are given
    #[arg(value_name = "MESSAGE")]
    messages: Vec<String>,

    /// Level of every logged message
    #[arg(short = 'l', long, default_value = "info")]
    level: Level,

    /// Drop messages below this level
    #[arg(long, value_name = "LEVEL")]
    min_level: Option<Level>,

    /// Field order, e.g. "time,level,position"
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// simplified or detailed
    #[arg(short = 'm', long)]
    mode: Option<RenderMode>,

    /// text or json
    #[arg(short = 'e', long)]
    encoding: Option<Encoding>,

    /// Always color level tags
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Never color level tags
    #[arg(long)]
    no_color: bool,

    /// china, arco, ant or element
    #[arg(long)]
    theme: Option<String>,

    /// strftime layout for the time field
    #[arg(long, value_name = "LAYOUT")]
    time_format: Option<String>,

    /// Print absolute source paths
    #[arg(long)]
    abs_path: bool,

    #[arg(long)]
    separator: Option<char>,

    /// Attribute attached to every message
    #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE", action = ArgAction::Append)]
    attrs: Vec<String>,

    /// Exit status after a fatal message
    #[arg(long)]
    exit_code: Option<i32>,

    /// YAML or JSON handler configuration; flags override it
    #[arg(short = 'c', long = "config")]
    config_file: Option<PathBuf>,

    /// Append to DIR/records.log instead of stdout
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Also append messages to DIR/records.log
    #[arg(long, value_name = "DIR")]
    record_dir: Option<PathBuf>,

    /// Only messages at or above this level reach the record file
    #[arg(long, value_name = "LEVEL", requires = "record_dir")]
    record_level: Option<Level>,

    /// Printed on stderr by the fatal hook
    #[arg(long)]
    hook_message: Option<String>,

    /// Make the fatal hook fail
    #[arg(long)]
    hook_fail: bool,
}

impl Args {
    fn handler_config(&self) -> anyhow::Result<HandlerConfig> {
        let mut config = match &self.config_file {
            Some(path) => HandlerConfig::from_file(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => HandlerConfig {
                fields: vec![FieldKind::Time, FieldKind::Level],
                color: None,
                ..HandlerConfig::default()
            },
        };

        if let Some(fields) = &self.fields {
            config.fields = fields
                .iter()
                .filter(|f| !f.trim().is_empty())
                .map(|f| FieldKind::from(f.as_str()))
                .collect();
        }
        if let Some(level) = self.min_level {
            config.level = level;
        }
        if let Some(render) = self.mode {
            config.render = render;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if self.color {
            config.color = Some(true);
        } else if self.no_color {
            config.color = Some(false);
        }
        if let Some(theme) = &self.theme {
            config.theme = Theme::from_name(theme);
            config.palette.clear();
        }
        if let Some(layout) = &self.time_format {
            config.time_format = layout.clone();
        }
        if self.abs_path {
            config.abs_path = true;
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if let Some(code) = self.exit_code {
            config.exit_code = code;
        }
        if let Some(dir) = &self.output_dir {
            config.destination = Destination::File(dir.clone());
        }
        if let Some(dir) = &self.record_dir {
            config.record = Some(RecordFile::new(dir.clone(), self.record_level.unwrap_or(Level::Trace)));
        }
        Ok(config)
    }

    /// Alternating key/value arguments from the `--attr` flags.
    fn attr_args(&self) -> anyhow::Result<Vec<Value>> {
        let mut args = Vec::with_capacity(self.attrs.len() * 2);
        for attr in &self.attrs {
            let (key, value) = attr
                .split_once('=')
                .ok_or_else(|| anyhow!("Attribute '{}' is not KEY=VALUE", attr))?;
            args.push(Value::from(key));
            args.push(Value::from(value));
        }
        Ok(args)
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("linelog: error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = args.handler_config()?;
    let attrs = args.attr_args()?;

    let hook_message = args.hook_message.clone();
    let hook_fail = args.hook_fail;
    let handler = Handler::from_config(&config)?.with_fatal_hook(move |_, record| {
        if let Some(message) = &hook_message {
            eprintln!("{}", message);
        }
        if hook_fail {
            return Err(anyhow!("hook refused '{}'", record.message()));
        }
        Ok(())
    });
    let logger = Logger::new(handler);

    if args.messages.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("Failed to read stdin")?;
            if line.trim().is_empty() {
                continue;
            }
            logger.log(args.level, &line, &attrs)?;
        }
    } else {
        for message in &args.messages {
            logger.log(args.level, message, &attrs)?;
        }
    }

    logger.handler().flush()?;
    Ok(())
}
