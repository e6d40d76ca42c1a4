//! End-to-end pipeline tests.
//!
//! External encoders are replaced by tiny shell scripts installed on PATH,
//! so the tests exercise the real read → detect → route → invoke → decide →
//! write flow without requiring any codec tool on the machine.

use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, Rgba, RgbaImage};

use batch_image_optimizer::paths::display_path;
use batch_image_optimizer::{
    convert, optimize, ConfigProvider, Mode, OutcomeKind, PathPair, PipelineContext, Reporter,
    Scheduler, TargetCodec, TaskOutcome,
};

// ---------------------------------------------------------------------------
// Fake encoder tools
// ---------------------------------------------------------------------------

/// Installs the fake tools once per test binary and prepends them to PATH.
fn fake_tools() -> &'static Path {
    static TOOLS: OnceLock<PathBuf> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap().into_path();

        // pngquant shrinks its input to 10 bytes.
        install(
            &dir,
            "pngquant",
            r#"#!/bin/sh
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift 2 ;;
    --*) shift ;;
    *) in="$1"; shift ;;
  esac
done
head -c 10 "$in" > "$out"
"#,
        );

        // jpegoptim is an in-place tool; doing nothing leaves the bytes
        // unchanged.
        install(&dir, "jpegoptim", "#!/bin/sh\nexit 0\n");

        // gifsicle doubles its input: the result is always larger.
        install(
            &dir,
            "gifsicle",
            r#"#!/bin/sh
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift 2 ;;
    --*) shift ;;
    *) in="$1"; shift ;;
  esac
done
cat "$in" "$in" > "$out"
"#,
        );

        // avifenc: positional input/output after the options, shrinks.
        install(
            &dir,
            "avifenc",
            r#"#!/bin/sh
while [ $# -gt 2 ]; do shift; done
head -c 20 "$1" > "$2"
"#,
        );

        // cwebp grows its input past the original size.
        install(
            &dir,
            "cwebp",
            r#"#!/bin/sh
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -alpha_q|-m|-q|-z) shift 2 ;;
    -*) shift ;;
    *) in="$1"; shift ;;
  esac
done
cat "$in" "$in" > "$out"
"#,
        );

        // gif2webp shrinks, preserving "animation" as far as the pipeline
        // is concerned.
        install(
            &dir,
            "gif2webp",
            r#"#!/bin/sh
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -m) shift 2 ;;
    -*) shift ;;
    *) in="$1"; shift ;;
  esac
done
head -c 10 "$in" > "$out"
"#,
        );

        let path = std::env::var("PATH").unwrap_or_default();
        std::env::set_var("PATH", format!("{}:{}", dir.display(), path));
        dir
    })
}

fn install(dir: &Path, name: &str, script: &str) {
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Reporter that records everything instead of rendering it.
#[derive(Default)]
struct CollectingReporter {
    outcomes: Mutex<Vec<(String, TaskOutcome)>>,
    totals: Mutex<Option<(u64, u64)>>,
}

impl CollectingReporter {
    fn outcomes(&self) -> Vec<(String, TaskOutcome)> {
        self.outcomes.lock().unwrap().clone()
    }

    fn totals(&self) -> (u64, u64) {
        self.totals.lock().unwrap().expect("finish was not called")
    }
}

impl Reporter for CollectingReporter {
    fn task_outcome(&self, display_path: &str, outcome: &TaskOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .push((display_path.to_string(), outcome.clone()));
    }

    fn finish(&self, total_before: u64, total_after: u64) {
        *self.totals.lock().unwrap() = Some((total_before, total_after));
    }
}

fn context(reporter: Arc<CollectingReporter>, forced: bool) -> PipelineContext {
    fake_tools();
    PipelineContext::new(
        ConfigProvider::default(),
        Mode::Lossy,
        forced,
        reporter,
        Scheduler::new(4),
    )
}

fn png_bytes() -> Vec<u8> {
    let mut buffer = Vec::new();
    let pixels = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
        .unwrap();
    buffer
}

fn jpeg_bytes() -> Vec<u8> {
    let mut buffer = Vec::new();
    let pixels = image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]));
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(
            &mut Cursor::new(&mut buffer),
            image::ImageOutputFormat::Jpeg(90),
        )
        .unwrap();
    buffer
}

fn animated_gif_bytes(frames: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        for index in 0..frames {
            let shade = (index * 60 % 256) as u8;
            let pixels = RgbaImage::from_pixel(4, 4, Rgba([shade, 0, 0, 255]));
            let frame = Frame::from_parts(pixels, 0, 0, Delay::from_numer_denom_ms(100, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }
    buffer
}

fn in_place_pair(path: &Path) -> PathPair {
    PathPair {
        input: path.to_path_buf(),
        output: path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Optimize pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optimize_writes_shrunk_png_and_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("photo.png");
    let original = png_bytes();
    std::fs::write(&file, &original).unwrap();

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), false);

    optimize(vec![in_place_pair(&file)], &ctx).await.unwrap();

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.kind, OutcomeKind::Success);

    // The fake pngquant produced 10 bytes and the pipeline persisted them.
    assert_eq!(std::fs::read(&file).unwrap().len(), 10);
    assert_eq!(reporter.totals(), (original.len() as u64, 10));
}

#[tokio::test]
async fn optimize_skip_is_idempotent_for_unchanged_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("photo.jpg");
    let original = jpeg_bytes();
    std::fs::write(&file, &original).unwrap();

    for _ in 0..2 {
        let reporter = Arc::new(CollectingReporter::default());
        let ctx = context(Arc::clone(&reporter), false);

        optimize(vec![in_place_pair(&file)], &ctx).await.unwrap();

        let outcomes = reporter.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].1.kind, OutcomeKind::Info);
        assert_eq!(outcomes[0].1.description, "Nothing changed. Skipped");
        assert!(outcomes[0].1.verbose_only);

        // Never a write: the bytes stay byte-identical across reruns.
        assert_eq!(std::fs::read(&file).unwrap(), original);
    }
}

#[tokio::test]
async fn optimize_clamps_aggregate_for_grown_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("anim.gif");
    let original = animated_gif_bytes(2);
    std::fs::write(&file, &original).unwrap();

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), false);

    optimize(vec![in_place_pair(&file)], &ctx).await.unwrap();

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.description, "File size increased. Skipped");

    // The doubled output was rejected: totals must not move in either
    // direction.
    let before = original.len() as u64;
    assert_eq!(reporter.totals(), (before, before));
    assert_eq!(std::fs::read(&file).unwrap(), original);
}

#[tokio::test]
async fn optimize_isolates_failing_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut pairs = Vec::new();

    for index in 0..3 {
        let file = dir.path().join(format!("ok-{index}.png"));
        std::fs::write(&file, png_bytes()).unwrap();
        pairs.push(in_place_pair(&file));
    }
    let corrupt = dir.path().join("corrupt.png");
    std::fs::write(&corrupt, b"not an image at all").unwrap();
    pairs.push(in_place_pair(&corrupt));

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), false);

    optimize(pairs, &ctx).await.unwrap();

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 4);

    let errors: Vec<_> = outcomes
        .iter()
        .filter(|(_, o)| o.kind == OutcomeKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1.description, "Unknown file format");

    let successes = outcomes
        .iter()
        .filter(|(_, o)| o.kind == OutcomeKind::Success)
        .count();
    assert_eq!(successes, 3);
}

// ---------------------------------------------------------------------------
// Convert pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn convert_collision_preflight_skips_before_transforming() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cat.png");
    std::fs::write(&input, png_bytes()).unwrap();

    let existing = dir.path().join("cat.avif");
    std::fs::write(&existing, b"already here").unwrap();

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), false);

    convert(vec![in_place_pair(&input)], &[TargetCodec::Avif], &ctx)
        .await
        .unwrap();

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.kind, OutcomeKind::Info);
    assert_eq!(
        outcomes[0].1.description,
        format!("File already exists, '{}'", display_path(&existing))
    );

    // Nothing was invoked and nothing was accounted.
    assert_eq!(std::fs::read(&existing).unwrap(), b"already here");
    assert_eq!(reporter.totals(), (0, 0));
}

#[tokio::test]
async fn convert_rejects_animated_avif_but_webp_preserves_frames() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("anim.gif");
    std::fs::write(&input, animated_gif_bytes(2)).unwrap();

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), false);

    convert(
        vec![in_place_pair(&input)],
        &[TargetCodec::Avif, TargetCodec::Webp],
        &ctx,
    )
    .await
    .unwrap();

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 2);

    let avif_error = outcomes
        .iter()
        .find(|(_, o)| o.kind == OutcomeKind::Error)
        .expect("AVIF task must fail");
    assert_eq!(avif_error.1.description, "Animated AVIF is not supported");
    assert!(!dir.path().join("anim.avif").exists());

    let webp_success = outcomes
        .iter()
        .find(|(_, o)| o.kind == OutcomeKind::Success)
        .expect("WebP task must succeed");
    assert!(webp_success.1.description.contains("→ WebP"));
    assert!(dir.path().join("anim.webp").exists());
}

#[tokio::test]
async fn convert_dual_codec_summary_reflects_only_written_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let original = png_bytes();
    std::fs::write(&input, &original).unwrap();

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), false);

    convert(
        vec![in_place_pair(&input)],
        &[TargetCodec::Avif, TargetCodec::Webp],
        &ctx,
    )
    .await
    .unwrap();

    // One PNG, two codecs: exactly two independent tasks.
    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 2);

    // The fake avifenc shrinks (written), the fake cwebp grows (skipped).
    assert!(dir.path().join("photo.avif").exists());
    assert!(!dir.path().join("photo.webp").exists());

    let skipped = outcomes
        .iter()
        .find(|(_, o)| o.kind == OutcomeKind::Info)
        .expect("grown WebP output must be skipped");
    assert_eq!(
        skipped.1.description,
        "File size increased. Conversion to WebP skipped"
    );

    let before = original.len() as u64;
    // AVIF counted at its written size, the rejected WebP clamped to before.
    assert_eq!(reporter.totals(), (before * 2, 20 + before));
}

#[tokio::test]
async fn convert_force_overwrites_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cat.png");
    std::fs::write(&input, png_bytes()).unwrap();

    let existing = dir.path().join("cat.avif");
    std::fs::write(&existing, b"stale").unwrap();

    let reporter = Arc::new(CollectingReporter::default());
    let ctx = context(Arc::clone(&reporter), true);

    convert(vec![in_place_pair(&input)], &[TargetCodec::Avif], &ctx)
        .await
        .unwrap();

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.kind, OutcomeKind::Success);
    assert_eq!(std::fs::read(&existing).unwrap().len(), 20);
}
