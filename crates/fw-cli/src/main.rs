//! Firewatch command-line front end.
//!
//! One-shot batch detection (`image`, `video`, `url`) and a demo live
//! session (`live`) driven by the built-in test-pattern camera.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fw_capture::TestPatternDevice;
use fw_client::{DetectClient, DetectClientConfig, WsConnector};
use fw_models::{BatchInput, DetectionParameters, DetectionResult};
use fw_session::{SessionConfig, SessionController, SessionEvent};

const USAGE: &str = "\
Usage:
  firewatch image <path>  [--conf N] [--iou N] [--imgsz N] [--out PATH]
  firewatch video <path>  [--conf N] [--iou N] [--imgsz N]
  firewatch url   <url>   [--conf N] [--iou N] [--imgsz N] [--out PATH]
  firewatch live          [--conf N] [--iou N] [--imgsz N] [--duration SECS]

Service endpoints come from FIREWATCH_SERVICE_URL / FIREWATCH_STREAM_URL.";

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("fw=info".parse().expect("valid directive"))
        .add_directive("firewatch=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    if let Err(e) = run(std::env::args().skip(1).collect()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let Some(mode) = args.first() else {
        bail!("{USAGE}");
    };
    let opts = Options::parse(&args[1..])?;
    let params = opts.params()?;

    match mode.as_str() {
        "image" => {
            let path = opts.positional.first().context("missing image path")?;
            let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
            let client = DetectClient::from_env()?;
            let result = client.submit(&BatchInput::Image(bytes), &params).await?;
            write_annotated(result, opts.out_path(path))
        }
        "video" => {
            let path = opts.positional.first().context("missing video path")?;
            let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
            let client = DetectClient::from_env()?;
            let result = client.submit(&BatchInput::Video(bytes), &params).await?;
            let DetectionResult::VideoAnnotation { entries, .. } = result else {
                bail!("service returned a non-video result");
            };
            println!("{}", serde_json::to_string_pretty(&entries)?);
            info!(frames = entries.len(), "video detection complete");
            Ok(())
        }
        "url" => {
            let url = opts.positional.first().context("missing url")?.clone();
            let client = DetectClient::from_env()?;
            let result = client.submit(&BatchInput::RemoteUrl(url), &params).await?;
            write_annotated(result, opts.out_path("remote"))
        }
        "live" => run_live(params, opts.duration).await,
        other => bail!("unknown mode `{other}`\n{USAGE}"),
    }
}

fn write_annotated(result: DetectionResult, out: PathBuf) -> anyhow::Result<()> {
    let DetectionResult::AnnotatedImage { bytes, .. } = result else {
        bail!("service returned a non-image result");
    };
    std::fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    info!(path = %out.display(), bytes = bytes.len(), "annotated image written");
    Ok(())
}

/// Run a live session against the service using the test-pattern camera,
/// until Ctrl-C or the optional duration elapses.
async fn run_live(params: DetectionParameters, duration: Option<Duration>) -> anyhow::Result<()> {
    let client_config = DetectClientConfig::from_env();
    let mut controller = SessionController::new(
        Arc::new(TestPatternDevice::default()),
        Arc::new(WsConnector::new(client_config.stream_url.clone())),
        DetectClient::new(client_config)?,
        SessionConfig::from_env(),
    );

    controller.start(params).await?;
    info!("live session started, Ctrl-C to stop");

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let mut frames = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
            _ = &mut deadline => {
                info!("duration elapsed");
                break;
            }
            event = controller.next_event() => {
                match event {
                    Some(SessionEvent::StreamFrame(handle)) => {
                        frames += 1;
                        info!(frame = frames, bytes = handle.bytes().len(), "annotated frame");
                    }
                    Some(SessionEvent::Failed { message }) => {
                        warn!(message = %message, "session failed");
                        bail!("session failed: {message}");
                    }
                    None => break,
                }
            }
        }
    }

    controller.stop().await;
    info!(frames, "live session stopped");
    Ok(())
}

#[derive(Default)]
struct Options {
    positional: Vec<String>,
    conf: Option<f64>,
    iou: Option<f64>,
    imgsz: Option<u32>,
    out: Option<String>,
    duration: Option<Duration>,
}

impl Options {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut opts = Self::default();
        let mut it = args.iter();
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--conf" => opts.conf = Some(value(&mut it, "--conf")?),
                "--iou" => opts.iou = Some(value(&mut it, "--iou")?),
                "--imgsz" => opts.imgsz = Some(value(&mut it, "--imgsz")?),
                "--duration" => {
                    opts.duration = Some(Duration::from_secs(value(&mut it, "--duration")?))
                }
                "--out" => {
                    opts.out = Some(
                        it.next()
                            .context("--out requires a value")?
                            .clone(),
                    )
                }
                flag if flag.starts_with("--") => bail!("unknown flag `{flag}`\n{USAGE}"),
                positional => opts.positional.push(positional.to_string()),
            }
        }
        Ok(opts)
    }

    fn params(&self) -> anyhow::Result<DetectionParameters> {
        let defaults = DetectionParameters::default();
        Ok(DetectionParameters::new(
            self.conf.unwrap_or(defaults.confidence),
            self.iou.unwrap_or(defaults.iou),
            self.imgsz.unwrap_or(defaults.image_size),
        )?)
    }

    fn out_path(&self, input: &str) -> PathBuf {
        match &self.out {
            Some(out) => PathBuf::from(out),
            None => {
                let stem = Path::new(input)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "annotated".to_string());
                PathBuf::from(format!("{stem}.annotated.jpg"))
            }
        }
    }
}

fn value<'a, T: std::str::FromStr>(
    it: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> anyhow::Result<T> {
    it.next()
        .with_context(|| format!("{flag} requires a value"))?
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid value for {flag}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_positional() {
        let args: Vec<String> = ["photo.jpg", "--conf", "0.5", "--imgsz", "320"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let opts = Options::parse(&args).unwrap();
        assert_eq!(opts.positional, vec!["photo.jpg"]);
        let params = opts.params().unwrap();
        assert_eq!(params.confidence, 0.5);
        assert_eq!(params.iou, 0.45);
        assert_eq!(params.image_size, 320);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let args = vec!["--bogus".to_string()];
        assert!(Options::parse(&args).is_err());
    }

    #[test]
    fn test_default_output_path_uses_input_stem() {
        let opts = Options::default();
        assert_eq!(
            opts.out_path("shots/photo.jpg"),
            PathBuf::from("photo.annotated.jpg")
        );
    }
}
