//! `render` command - process a template against a JSON data file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tal_engine::{TalPlugin, Template};

use crate::error::CliError;

/// Arguments for the `render` command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Template file to render.
    pub template: PathBuf,

    /// JSON file with the template data (defaults to an empty object).
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Write output to a file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Enable info-level logging.
    #[arg(long, short)]
    pub verbose: bool,
}

impl RenderArgs {
    pub(crate) fn execute(&self) -> Result<(), CliError> {
        let source = fs::read_to_string(&self.template)?;

        let data = match &self.data {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => serde_json::Value::Object(serde_json::Map::new()),
        };

        let mut template = Template::parse(&source)?.with_plugin(TalPlugin::new());

        tracing::info!(template = %self.template.display(), "rendering template");
        template.process(&data)?;

        let rendered = template.to_xml();
        match &self.output {
            Some(path) => fs::write(path, rendered)?,
            None => print_output(&rendered),
        }
        Ok(())
    }
}

#[allow(clippy::print_stdout)] // the rendered document is the command's output
fn print_output(rendered: &str) {
    print!("{rendered}");
}
