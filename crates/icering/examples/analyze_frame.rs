use icering::{AnalyzerConfig, DiffractionImage, IceRingAnalyzer};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <frame.png> [config.json] [out.json]", args[0]);
        std::process::exit(2);
    }

    let config = match args.get(2) {
        Some(path) => AnalyzerConfig::from_json_file(Path::new(path))?,
        None => AnalyzerConfig::default(),
    };
    let frame = DiffractionImage::open(Path::new(&args[1]))?;

    let analyzer = IceRingAnalyzer::with_config(config);
    let result = analyzer.analyze(&frame)?;

    println!(
        "{} ice rings, max contamination {:.2}%",
        result.ring_count, result.max_contamination
    );
    for ring in &result.detected_rings {
        println!(
            "  {:.1} Å  r={:.1}px  level={:.2}",
            ring.resolution, ring.radius_pixels, ring.contamination_level
        );
    }
    println!("{}: {}", result.status, result.recommendation);

    if let Some(out_path) = args.get(3) {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
