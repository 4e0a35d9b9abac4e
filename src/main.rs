use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;

use vidgets::avatar::{Detectors, GestureAvatarController, IconSet};
use vidgets::board::StrokeBoardController;
use vidgets::config::Config;
use vidgets::detect::HueBlobDetector;
use vidgets::feed::{AvatarFeed, BoardFeed, FeedOutput};
use vidgets::store::Store;
use vidgets::vision::HsvBand;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Avatar,
    Board,
}

struct Args {
    config: PathBuf,
    mode: Mode,
    /// Stop after this many frames; 0 runs until the camera stops.
    frames: u64,
    /// Directory receiving live/panel JPEG snapshots, if requested.
    dump_dir: Option<PathBuf>,
    list_cameras: bool,
}

fn parse_args() -> Option<Args> {
    let mut args = Args {
        config: PathBuf::from("vidgets.toml"),
        mode: Mode::Board,
        frames: 0,
        dump_dir: None,
        list_cameras: false,
    };
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = PathBuf::from(it.next()?),
            "--mode" => match it.next()?.as_str() {
                "avatar" => args.mode = Mode::Avatar,
                "board" => args.mode = Mode::Board,
                _ => return None,
            },
            "--frames" => args.frames = it.next()?.parse().ok()?,
            "--dump" => args.dump_dir = Some(PathBuf::from(it.next()?)),
            "--list-cameras" => args.list_cameras = true,
            _ => return None,
        }
    }
    Some(args)
}

fn usage() {
    eprintln!(
        "usage: vidgets [--config FILE] [--mode avatar|board] [--frames N] [--dump DIR] [--list-cameras]"
    );
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(args) = parse_args() else {
        usage();
        return ExitCode::FAILURE;
    };
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "camera-nokhwa")]
fn run(args: Args) -> Result<()> {
    use anyhow::Context;
    use crossbeam_channel::bounded;
    use nokhwa::utils::CameraIndex;
    use vidgets::camera;

    if args.list_cameras {
        for device in camera::available_cameras()? {
            println!("{:?}\t{}", device.index, device.label);
        }
        return Ok(());
    }

    let config = Config::load_or_default(&args.config);
    let store = Store::open(&config.store.path)
        .with_context(|| format!("opening store at {}", config.store.path))?;

    let mut feed = match args.mode {
        Mode::Avatar => Feed::Avatar(AvatarFeed::new(
            avatar_controller(&config),
            config.output.jpeg_quality,
        )),
        Mode::Board => Feed::Board(BoardFeed::new(
            StrokeBoardController::new(config.board.pen_band),
            config.output.jpeg_quality,
        )),
    };

    // The whiteboard reads like a mirror; the avatar view stays as captured.
    let mirror = args.mode == Mode::Board && config.camera.mirror_board;
    let (frame_tx, frame_rx) = bounded(1);
    let stream = camera::start_camera_stream(
        CameraIndex::Index(config.camera.index),
        mirror,
        frame_tx,
    )
    .context("starting camera stream")?;

    // A local-only run still records its call under a fixed account.
    const LOCAL_ACCOUNT: &str = "local@vidgets";
    if store.verify_user(LOCAL_ACCOUNT)?.is_none() {
        store.create_user("local", LOCAL_ACCOUNT, "local", "local", b"")?;
    }
    let call_id = store.log_session_start(LOCAL_ACCOUNT)?;
    log::info!("call {call_id} started");

    let mut processed = 0u64;
    while let Ok(mut frame) = frame_rx.recv() {
        let out = feed.next(&mut frame)?;
        if let Some(dir) = &args.dump_dir {
            dump(dir, processed, &out)?;
        }
        processed += 1;
        if args.frames > 0 && processed >= args.frames {
            break;
        }
    }

    stream.stop();
    store.log_event(call_id, "ended")?;
    log::info!("processed {processed} frames");
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn run(_args: Args) -> Result<()> {
    anyhow::bail!("built without the camera-nokhwa feature")
}

enum Feed {
    Avatar(AvatarFeed),
    Board(BoardFeed),
}

impl Feed {
    fn next(&mut self, frame: &mut vidgets::types::Frame) -> Result<FeedOutput> {
        match self {
            Feed::Avatar(f) => Ok(f.next(frame)?),
            Feed::Board(f) => Ok(f.next(frame)?),
        }
    }
}

fn avatar_controller(config: &Config) -> GestureAvatarController {
    let icons = match IconSet::load(&config.avatar.icon_paths()) {
        Ok(icons) => icons,
        Err(err) => {
            log::warn!("icon assets not loaded ({err}), using solid panels");
            IconSet::solid()
        }
    };
    // Hue-blob stand-ins until a cascade detector is wired in: green face,
    // yellow smile, blue palm, red fist markers.
    let band = |lower, upper| HsvBand { lower, upper };
    let detectors = Detectors {
        face: Box::new(HueBlobDetector::new(band([40, 60, 60], [80, 255, 255]), 400)),
        smile: Box::new(HueBlobDetector::new(band([20, 60, 60], [35, 255, 255]), 100)),
        palm: Box::new(HueBlobDetector::new(HsvBand::BLUE, 400)),
        fist: Box::new(HueBlobDetector::new(band([0, 120, 60], [10, 255, 255]), 400)),
    };
    GestureAvatarController::with_thresholds(
        detectors,
        icons,
        config.avatar.gesture_frames,
        config.avatar.sleep_frames,
    )
}

fn dump(dir: &Path, frame_no: u64, out: &FeedOutput) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(format!("live-{frame_no:06}.jpg")), &out.live_jpeg)?;
    fs::write(dir.join(format!("panel-{frame_no:06}.jpg")), &out.panel_jpeg)?;
    Ok(())
}
