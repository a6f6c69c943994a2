use quadseek::{DetConfig, Frame, PixelFormat, ScreenReader};
use std::time::{Duration, Instant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== quadseek Performance Test ===\n");

    let reader = ScreenReader::new(DetConfig::default())?;

    let test_images = vec![
        ("Dialog", "demos/images/dialog.png"),
        ("Desktop", "demos/images/desktop.png"),
    ];

    for (name, path) in &test_images {
        if !std::path::Path::new(path).exists() {
            println!("Skipping {} - file not found: {}\n", name, path);
            continue;
        }

        println!("Testing {} ({}):", name, path);
        let img = image::open(path)?.to_rgb8();
        let mut pixels = Vec::with_capacity(img.width() as usize * img.height() as usize * 4);
        for p in img.pixels() {
            pixels.extend_from_slice(&[p[2], p[1], p[0], 0]);
        }
        let frame = Frame::new(&pixels, img.width(), img.height(), PixelFormat::Bgr888)?;

        // Warmup run
        let _ = reader.detect_regions(&frame);

        // Timed runs
        let num_runs = 5u32;
        let mut times = Vec::new();

        for i in 1..=num_runs {
            let start = Instant::now();
            let regions = reader.detect_regions(&frame);
            let elapsed = start.elapsed();
            times.push(elapsed);

            println!("  Run {}: {:?} - {} regions detected", i, elapsed, regions.len());
            if i == 1 {
                if let Some(first) = regions.first() {
                    println!("    First region: {:?}", first);
                }
            }
        }

        let total: Duration = times.iter().sum();
        let avg = total / num_runs;
        let min = times.iter().min().copied().unwrap_or_default();
        let max = times.iter().max().copied().unwrap_or_default();

        println!("\n  Statistics:");
        println!("    Average: {:?}", avg);
        println!("    Min: {:?}", min);
        println!("    Max: {:?}", max);
        println!("    Throughput: {:.2} frames/sec\n", 1.0 / avg.as_secs_f64());
    }

    Ok(())
}
