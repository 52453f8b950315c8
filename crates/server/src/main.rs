use std::sync::Arc;

use airgauge_ocr::{MonitorPipeline, Recognizer};

mod config;
mod routes;
mod spa;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = ServerConfig::load()?;

    // The recognizer loads its model state once here; every request shares
    // it read-only through the pipeline.
    let pipeline = Arc::new(MonitorPipeline::new(build_recognizer(&cfg)));
    let state = routes::AppState {
        pipeline,
        frontend_dir: cfg.frontend_dir.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("Listening on {}", cfg.bind_addr);
    tracing::info!("Serving front-end from {}", cfg.frontend_dir.display());
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}

#[cfg(feature = "tesseract")]
fn build_recognizer(cfg: &ServerConfig) -> Box<dyn Recognizer> {
    use airgauge_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    tracing::info!(lang = %cfg.ocr.lang, "Using Tesseract recognizer");
    Box::new(TesseractRecognizer::new(cfg.ocr.data_path.clone(), &cfg.ocr.lang))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(cfg: &ServerConfig) -> Box<dyn Recognizer> {
    if cfg.ocr.data_path.is_some() || cfg.ocr.lang != "eng" {
        tracing::warn!(
            "OCR settings present but this build lacks the `tesseract` feature; \
             using the mock recognizer"
        );
    }
    // TODO: make the tesseract feature the default once tessdata ships in
    // the deployment image; the mock keeps dev builds free of the system
    // library.
    Box::new(airgauge_ocr::MockRecognizer::empty())
}
