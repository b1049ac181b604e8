// crates/clipline-app/src/main.rs
//
// Headless driver: import files onto a fresh timeline, wait for previews and
// print the resulting layout as JSON on stdout. Status lines go to the log.
//
//   clipline [--config cfg.json] [--track N] [--zoom F] [--timeout SECS]
//            [--thumbs DIR] FILE...

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use clipline_app::{AppConfig, LayoutReport, Session};
use clipline_core::Thumbnail;
use clipline_media::SavePng;

#[derive(Debug, Default, PartialEq)]
struct Args {
    config:  Option<PathBuf>,
    /// Zero-based; given 1-based on the command line.
    track:   Option<usize>,
    zoom:    Option<f64>,
    timeout: Option<u64>,
    thumbs:  Option<PathBuf>,
    files:   Vec<PathBuf>,
}

impl Args {
    fn parse(mut argv: impl Iterator<Item = String>) -> Result<Self> {
        let mut args = Args::default();
        while let Some(arg) = argv.next() {
            let mut value = |flag: &str| argv.next().with_context(|| format!("{flag} needs a value"));
            match arg.as_str() {
                "--config"  => args.config  = Some(value("--config")?.into()),
                "--thumbs"  => args.thumbs  = Some(value("--thumbs")?.into()),
                "--zoom"    => args.zoom    = Some(value("--zoom")?.parse().context("--zoom")?),
                "--timeout" => args.timeout = Some(value("--timeout")?.parse().context("--timeout")?),
                "--track"   => {
                    let n: usize = value("--track")?.parse().context("--track")?;
                    if n == 0 {
                        bail!("--track is 1-based");
                    }
                    args.track = Some(n - 1);
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                file => args.files.push(file.into()),
            }
        }
        Ok(args)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    ffmpeg_the_third::init().context("FFmpeg init failed")?;

    let args   = Args::parse(std::env::args().skip(1))?;
    let config = AppConfig::load_or_default(args.config.as_deref())?;
    if args.files.is_empty() {
        bail!("usage: clipline [--config FILE] [--track N] [--zoom F] [--timeout SECS] [--thumbs DIR] FILE...");
    }

    let mut session = Session::with_ffmpeg(config);
    if let Some(z) = args.zoom {
        session.set_zoom(z);
    }
    for file in &args.files {
        if let Err(e) = session.add_media(file, args.track) {
            warn!("[session] skipped {}: {e}", file.display());
        }
    }
    drain_status(&session);

    let timeout = Duration::from_secs(args.timeout.unwrap_or(60));
    if !session.wait_for_probes(timeout) {
        warn!("[session] printing layout with previews still pending");
    }
    drain_status(&session);

    if let Some(dir) = &args.thumbs {
        export_thumbnails(&session, dir)?;
    }

    let report = LayoutReport::from_session(&session);
    println!("{}", serde_json::to_string_pretty(&report)?);
    session.shutdown();
    Ok(())
}

/// Log and discard queued status events so the channel does not grow.
fn drain_status(session: &Session) -> usize {
    session.status.try_iter().map(|event| info!("[status] {event}")).count()
}

/// Write every clip's thumbnail frames as `<clip-id>-<n>.png` into `dir`.
fn export_thumbnails(session: &Session, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = 0;
    for clip in session.timeline().clips() {
        let bitmaps = match clip.thumbnail() {
            Thumbnail::Pending                    => continue,
            Thumbnail::Frames(frames)             => frames.iter().collect::<Vec<_>>(),
            Thumbnail::Placeholder { bitmap, .. } => vec![bitmap],
        };
        for (i, bmp) in bitmaps.into_iter().enumerate() {
            let path = dir.join(format!("{}-{i}.png", clip.id()));
            match bmp.save_png(&path) {
                Ok(())  => written += 1,
                Err(e)  => warn!("[media] thumbnail export failed for {}: {e:#}", path.display()),
            }
        }
    }
    info!("[media] wrote {written} thumbnails to {}", dir.display());
    Ok(())
}
