use std::path::PathBuf;
use std::process::Command;

use image::{Rgba, RgbaImage};

fn synthetic_png(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("pixelpress-cli-test-{name}-{}.png", std::process::id()));

    let mut image = RgbaImage::new(4, 4);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = Rgba([(x * 16) as u8, (y * 16) as u8, 255 - (x * 16) as u8, 255]);
    }
    image.save(&path).expect("failed to write synthetic test PNG");
    path
}

fn run_compare(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_compare"))
        .args(args)
        .output()
        .expect("failed to launch compare binary")
}

#[test]
fn compare_round_trips_a_synthetic_image_with_order0_arithmetic() {
    let path = synthetic_png("arithmetic0");
    let output = run_compare(&["--filename", path.to_str().unwrap(), "--compressor", "arithmetic0"]);
    std::fs::remove_file(&path).ok();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PNG baseline:"));
    assert!(stdout.contains("Compressed:"));
}

#[test]
fn compare_round_trips_with_separate_filter_stream_and_verbose_output() {
    let path = synthetic_png("separate");
    let output = run_compare(&[
        "--filename",
        path.to_str().unwrap(),
        "--compressor",
        "filtered_lz_arithmetic",
        "--separate",
        "--verbose",
    ]);
    std::fs::remove_file(&path).ok();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Compressor:"));
    assert!(stdout.contains("Ratio:"));
}

#[test]
fn compare_accepts_underscored_compressor_names() {
    let path = synthetic_png("zstd");
    let output = run_compare(&["--filename", path.to_str().unwrap(), "--compressor", "filtered_zstd"]);
    std::fs::remove_file(&path).ok();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn compare_rejects_an_unrecognized_compressor() {
    let path = synthetic_png("bogus");
    let output = run_compare(&["--filename", path.to_str().unwrap(), "--compressor", "bogus"]);
    std::fs::remove_file(&path).ok();

    assert!(!output.status.success());
}

#[test]
fn compare_rejects_a_missing_file() {
    let output = run_compare(&["--filename", "/nonexistent/path/to/image.png", "--compressor", "arithmetic0"]);
    assert!(!output.status.success());
}
