//! Plain path listing
//!
//! One descendant path per line, depth-first pre-order. The start node
//! itself is never printed.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

use crate::error::VizError;
use crate::tree::{NodeId, SecretStore};

use super::config::OutputConfig;

/// Formatter for the path listing on a terminal.
pub struct TextFormatter {
    config: OutputConfig,
}

impl TextFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Listing as an uncolored string.
    pub fn format(&self, store: &SecretStore, node: NodeId) -> String {
        let mut out = NoColor::new(Vec::new());
        // Writing into a Vec cannot fail
        let _ = print_tree(&mut out, store, node);
        String::from_utf8_lossy(&out.into_inner()).into_owned()
    }

    /// Print the listing to stdout. Collections are highlighted when color
    /// is enabled.
    pub fn print(&self, store: &SecretStore, node: NodeId) -> io::Result<()> {
        let choice = if self.config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(choice);
        print_tree(&mut stdout, store, node)?;
        stdout.flush()
    }
}

/// Emit every descendant of `node`, one path per line.
pub fn print_tree<W: WriteColor>(out: &mut W, store: &SecretStore, node: NodeId) -> io::Result<()> {
    for &child in store.children(node) {
        let entry = store.node(child);
        if entry.is_leaf() {
            out.reset()?;
        } else {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        }
        write!(out, "{}", entry.path())?;
        out.reset()?;
        writeln!(out)?;
        print_tree(out, store, child)?;
    }
    Ok(())
}

/// Append every descendant of `node` to `destination`, creating it if
/// needed.
pub fn write_tree(store: &SecretStore, node: NodeId, destination: &Path) -> Result<(), VizError> {
    let io_err = |source| VizError::Io {
        path: destination.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)
        .map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_lines(&mut writer, store, node).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

fn write_lines<W: Write>(out: &mut W, store: &SecretStore, node: NodeId) -> io::Result<()> {
    for &child in store.children(node) {
        writeln!(out, "{}", store.node(child).path())?;
        write_lines(out, store, child)?;
    }
    Ok(())
}
