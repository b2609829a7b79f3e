use anyhow::{Context, Result};
use maud::Render;
use readmekit::components::layout::{page_wrapper, readme_panel};
use readmekit::{Config, Document, ReadmeRenderer, decode_base64, decode_text};
use std::fs;
use std::io::{self, Read, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.verbose);
    config.validate()?;

    let raw = read_input(&config)?;
    debug!(bytes = raw.len(), "read input");

    let document = render(&config, &raw)?;
    info!(blocks = document.len(), "rendered document");

    let html = if config.standalone {
        page_wrapper(&config.title, readme_panel(&config.title, &document)).into_string()
    } else {
        document.render().into_string()
    };

    write_output(&config, &html)
}

/// Installs the stderr log subscriber.
///
/// `--verbose` forces debug level, otherwise RUST_LOG applies with a warn
/// default.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(config: &Config) -> Result<Vec<u8>> {
    match &config.input {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read input: {}", path.display()))
        }
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn render(config: &Config, raw: &[u8]) -> Result<Document> {
    let renderer = ReadmeRenderer::new();

    if config.base64 {
        let encoded = decode_text(raw).context("Invalid base64 input")?;
        let text = decode_base64(encoded).context("Invalid base64 input")?;
        return Ok(renderer.render(Some(&text)));
    }

    renderer.render_bytes(raw).context("Invalid input")
}

fn write_output(config: &Config, html: &str) -> Result<()> {
    match &config.output {
        Some(path) => {
            fs::write(path, html)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .context("Failed to write stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
