// Data Cassette host: send files (or URL instructions) over an audio
// channel via minimodem, and listen for incoming frames.

mod config;
mod modem;

use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::{info, warn};

use cassette_core::{
    encode_file_payload, encode_http_payload, transmit, Dispatcher, FetchError, Fetcher,
    FrameEncoder, FrameOutcome, FrameReceiver, RsCodec,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("cassette-cli {VERSION}");
        return Ok(());
    }

    let cfg = config::load();
    match args.iter().map(String::as_str).collect::<Vec<_>>()[..] {
        ["send", path] => send_file(&cfg, Path::new(path)),
        ["send-url", url, filename] => send_url(&cfg, url, filename),
        ["recv"] => recv(&cfg),
        _ => {
            eprintln!(
                "usage: cassette-cli send <file> | send-url <url> <filename> | recv | --version"
            );
            bail!("unrecognized arguments");
        }
    }
}

/// Frame a local file and play it through the modem. The wire filename is
/// the path's basename.
fn send_file(cfg: &config::Config, path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("path has no UTF-8 basename")?;
    let payload = encode_file_payload(filename, &data)?;
    play(cfg, &payload)
}

/// Frame a fetch instruction; the receiver downloads the URL itself.
fn send_url(cfg: &config::Config, url: &str, filename: &str) -> anyhow::Result<()> {
    let payload = encode_http_payload(filename, url)?;
    play(cfg, &payload)
}

fn play(cfg: &config::Config, payload: &[u8]) -> anyhow::Result<()> {
    let codec = RsCodec::new(cfg.redundancy)?;
    let frame = FrameEncoder::new(codec).build_frame(payload);
    info!("playing audio ({} bytes on the wire)...", frame.len());
    let (child, stdin) = modem::Modem::spawn_tx(cfg).context("spawning modem")?;
    transmit(stdin, &frame).context("handing frame to modem")?;
    child.wait().context("waiting for modem")?;
    info!("transmission complete");
    Ok(())
}

/// Listen for one frame, then dispatch it.
fn recv(cfg: &config::Config) -> anyhow::Result<()> {
    info!("listening");
    let codec = RsCodec::new(cfg.redundancy)?;
    let (child, stdout) = modem::Modem::spawn_rx(cfg).context("spawning modem")?;
    let outcome = FrameReceiver::new(codec).run(BufReader::new(stdout));
    // One capture per invocation; stop the modem regardless of outcome.
    if let Err(e) = child.kill() {
        warn!("failed to stop modem: {e}");
    }

    match outcome? {
        FrameOutcome::Payload { payload, stats } => {
            if stats.corrected_symbols > 0 {
                info!("recovered frame after {} corrections", stats.corrected_symbols);
            }
            let dispatcher = Dispatcher::new(&cfg.output_dir, HttpFetcher);
            let report = dispatcher.dispatch(&payload)?;
            info!("written `{}` ({} bytes)", report.path.display(), report.bytes);
        }
        FrameOutcome::UnknownAction { tag } => {
            warn!("frame carried unhandled action {:?}; nothing written", tag);
        }
    }
    Ok(())
}

/// Blocking GET for the HTTP action.
struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let body = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
        Ok(body.to_vec())
    }
}
