//! Sable - a modal terminal text editor
//! Main entry point

use tracing::Level;
use tracing_subscriber::EnvFilter;

use sable::config::Config;
use sable::editor::Editor;
use sable::term;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    if let Err(e) = term::init() {
        eprintln!("failed to initialize terminal: {}", e);
        std::process::exit(1);
    }

    let (width, height) = term::size();
    let mut editor = Editor::new(width, height, Config::default());
    let result = editor.run();

    let _ = term::shutdown();
    if let Err(e) = result {
        eprintln!("editor error: {}", e);
        std::process::exit(1);
    }
}
