use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stegsift::analyzer::BatchEntry;
use stegsift::report::{Status, Summary};
use stegsift::{decode, AnalysisError, Analyzer, DetectorConfig, MediaKind, Method, ReportBatch};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "stegsift")]
#[command(
    author,
    version,
    about = "Detect and recover hidden payloads in images, audio and video frames"
)]
struct Args {
    /// File or directory to analyze
    path: Option<PathBuf>,

    /// Directory of extracted video frames to analyze as one video
    #[arg(long, value_name = "DIR")]
    video_frames: Option<PathBuf>,

    /// Frame rate of --video-frames
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "stegsift-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate CSV report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open report
    #[arg(long)]
    no_open: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Detector configuration (JSON); missing keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames sampled per video
    #[arg(long, value_name = "K")]
    frames: Option<usize>,

    /// Show raw bytes when no printable message is recovered
    #[arg(long)]
    binary_preview: bool,

    /// Extract from one interleaved channel only (0 = red / left)
    #[arg(long)]
    channel: Option<usize>,

    /// Show detailed analysis
    #[arg(short, long)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

/// One unit of work: a media file, or a frame directory standing in for a video
enum Input {
    File(PathBuf),
    Frames(PathBuf),
}

impl Input {
    fn label(&self) -> String {
        match self {
            Input::File(p) | Input::Frames(p) => p.display().to_string(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.path.is_none() && args.video_frames.is_none() {
        eprintln!("Usage: stegsift <PATH> [--video-frames <DIR>]");
        eprintln!("Run 'stegsift --help' for more options.");
        std::process::exit(1);
    }

    let analyzer = match build_analyzer(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let mut inputs: Vec<Input> = match args.path {
        Some(ref path) => collect_files(path).into_iter().map(Input::File).collect(),
        None => Vec::new(),
    };
    if let Some(ref dir) = args.video_frames {
        inputs.push(Input::Frames(dir.clone()));
    }

    if inputs.is_empty() {
        eprintln!(
            "No media files found (supported: png, jpg, bmp, tiff, gif, wav, mp3, flac, ogg, m4a)"
        );
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mStegsift - Steganalysis Scanner\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} input(s)\n", inputs.len());
    }

    // Set up progress bar
    let pb = if !args.quiet && inputs.len() > 1 {
        let pb = ProgressBar::new(inputs.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    // Analyze inputs in parallel; the batch keeps input order
    let batch: ReportBatch = inputs
        .par_iter()
        .map(|input| {
            let outcome = load(input, args.fps).and_then(|asset| analyzer.analyze(&asset));
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(file_name(input));
            }
            (input.label(), outcome)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    if !args.quiet {
        for entry in batch.iter() {
            print_entry(entry, args.verbose);
        }
    }

    let summary = Summary::from_batch(&batch);

    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Clean:\x1b[0m   {}", summary.clean);
        eprintln!("  \x1b[31m✗ Flagged:\x1b[0m {}", summary.flagged);
        if summary.failed > 0 {
            eprintln!("  \x1b[90mErrors:\x1b[0m    {}", summary.failed);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("stegsift_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        if let Err(e) = stegsift::report::generate(output_path, &batch) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        if !args.no_open && !args.quiet {
            eprint!("\nOpen report? [Y/n] ");
            io::stderr().flush().ok();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_ok() {
                let input = input.trim().to_lowercase();
                if input.is_empty() || input == "y" || input == "yes" {
                    if let Err(e) = open::that(output_path) {
                        eprintln!("Failed to open report: {}", e);
                    }
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mAnalysis complete.\x1b[0m");
    }

    std::process::exit(summary.exit_code());
}

fn build_analyzer(args: &Args) -> Result<Analyzer, AnalysisError> {
    let mut config = match args.config {
        Some(ref path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    if args.channel.is_some() {
        config.extraction.channel = args.channel;
    }

    let mut analyzer = Analyzer::new().with_config(config);
    if let Some(k) = args.frames {
        analyzer = analyzer.with_sample_frames(k);
    }
    if args.binary_preview {
        analyzer = analyzer.with_binary_preview(true);
    }
    Ok(analyzer)
}

fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                // Containers need extracted frames; --video-frames covers those
                matches!(
                    MediaKind::from_path(e.path()),
                    Ok(MediaKind::Image) | Ok(MediaKind::Audio)
                )
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    } else {
        vec![path.to_path_buf()]
    }
}

fn load(input: &Input, fps: f64) -> Result<stegsift::MediaAsset, AnalysisError> {
    match input {
        Input::File(path) => decode::load(path),
        Input::Frames(dir) => decode::load_frames(dir, fps),
    }
}

fn file_name(input: &Input) -> String {
    let path = match input {
        Input::File(p) | Input::Frames(p) => p,
    };
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_entry(entry: &BatchEntry, verbose: bool) {
    let status = Status::of(entry);
    let color = match status {
        Status::Clean => "\x1b[32m",   // Green
        Status::Flagged => "\x1b[31m", // Red
        Status::Failed => "\x1b[90m",  // Gray
    };
    let reset = "\x1b[0m";
    let tag = format!("[{}]", status);

    let report = match &entry.outcome {
        Ok(report) => report,
        Err(e) => {
            println!(
                "{}{:<10}{} {:>4}  {:<6}  {:<24}  {}",
                color,
                tag,
                reset,
                "-",
                "-",
                truncate(&e.to_string(), 24),
                entry.label
            );
            return;
        }
    };

    let fired: Vec<&str> = report
        .detections()
        .iter()
        .filter(|d| d.detected)
        .map(|d| short_name(d.method))
        .collect();
    let fired = if fired.is_empty() { "-".to_string() } else { fired.join(",") };

    println!(
        "{}{:<10}{} {:>3.0}%  {:<6}  {:<24}  {}",
        color,
        tag,
        reset,
        report.max_confidence(),
        report.media().kind().to_string(),
        truncate(&fired, 24),
        entry.label
    );

    if let Some(text) = report.extraction(Method::LsbExtraction).and_then(|e| e.text()) {
        println!("    Message: {}", truncate(text, 60));
    }

    if verbose {
        for d in report.detections() {
            let details: Vec<String> = d
                .details
                .iter()
                .map(|(k, v)| match v.as_f64() {
                    Some(n) if n.fract() == 0.0 => format!("{}={}", k, n),
                    Some(n) => format!("{}={:.4}", k, n),
                    None => format!("{}={}", k, v.as_str().unwrap_or("")),
                })
                .collect();
            eprintln!("    {}: conf={:.1}% {}", d.method, d.confidence, details.join(" "));
        }
        for f in report.frames() {
            let failure = match (&f.error, &f.dct_error) {
                (Some(e), _) => format!(" error: {}", e),
                (None, Some(e)) => format!(" dct error: {}", e),
                (None, None) => String::new(),
            };
            eprintln!(
                "    frame {:>6}: lsb={} ({:.1}%) dct={}{}",
                f.frame_index, f.lsb_detected, f.lsb_confidence, f.dct_detected, failure
            );
        }
    }
}

fn short_name(method: Method) -> &'static str {
    match method {
        Method::Lsb => "lsb",
        Method::Dct => "dct",
        Method::Phase => "phase",
        Method::Frames => "frames",
        Method::LsbExtraction => "extract",
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
