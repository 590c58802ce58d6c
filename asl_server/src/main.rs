//! ASL letter server binary.
//!
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use asl_server::{
    debounce::Session,
    endpoints::{router, AppState},
    hand::OnnxHandLandmarker,
    labels::Labels,
    nn::OnnxLetterClassifier,
    pipeline::FramePipeline,
    stats::spawn_stats_logger,
    utils::ensure_model,
};
use clap::Parser;
use env_logger::TimestampPrecision;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address to serve the HTTP API on
    #[clap(long, default_value = "127.0.0.1:5000")]
    server_address: String,

    /// Letter classifier in ONNX format
    #[clap(long, default_value = "asl_cnn.onnx")]
    classifier_model: PathBuf,

    /// URL to download the letter classifier from if it is not found locally
    #[clap(long)]
    classifier_url: Option<String>,

    /// File with the ordered class labels of the classifier
    #[clap(long)]
    labels: Option<PathBuf>,

    /// Hand landmark model in ONNX format
    #[clap(long, default_value = "hand_landmark.onnx")]
    landmark_model: PathBuf,

    /// URL to download the hand landmark model from if it is not found locally
    #[clap(long)]
    landmark_url: Option<String>,

    /// Side length of the square hand landmark model input
    #[clap(long, default_value_t = 224)]
    landmark_input_size: u32,

    /// Minimum hand presence score
    #[clap(long, default_value_t = 0.7)]
    min_hand_confidence: f32,

    /// Pixels added around the hand on every side before cropping
    #[clap(long, default_value_t = asl_server::pipeline::DEFAULT_MARGIN)]
    margin: u32,

    /// Milliseconds a letter has to be held before it is typed
    #[clap(long, default_value_t = 1500)]
    hold_ms: u64,

    /// Do not mirror frames before detection
    #[clap(long)]
    no_mirror: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logger
    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let labels = match &args.labels {
        Some(path) => Labels::from_file(path)?,
        None => Labels::default(),
    };

    // Load models, fetching them first if necessary
    let classifier_path =
        ensure_model(&args.classifier_model, args.classifier_url.as_deref()).await?;
    let landmark_path = ensure_model(&args.landmark_model, args.landmark_url.as_deref()).await?;
    log::info!(
        "Using classifier {} and hand landmark model {}",
        classifier_path.display(),
        landmark_path.display()
    );

    let classifier = OnnxLetterClassifier::new(&classifier_path)?;
    let detector = OnnxHandLandmarker::new(
        &landmark_path,
        args.landmark_input_size,
        args.min_hand_confidence,
    )?;
    let pipeline = FramePipeline::new(
        Box::new(detector),
        Box::new(classifier),
        labels,
        args.margin,
        !args.no_mirror,
    )
    .context("classifier does not match labels")?;

    let session = Session::new(Duration::from_millis(args.hold_ms));
    let state = Arc::new(AppState::new(pipeline, session));

    spawn_stats_logger();

    // Serve HTTP server
    let addr: SocketAddr = args.server_address.parse()?;
    log::info!("Serving on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(router(state).into_make_service())
        .await?;

    Ok(())
}
