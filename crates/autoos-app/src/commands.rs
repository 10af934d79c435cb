use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use autoos_config::Config;
use autoos_ocr::{
    CapturedImage, DependencyResolver, Highlighter, ImageFinder, TesseractCli, TextLocator,
    capture_primary_screen, capture_screen_region, capture_window_by_title, list_windows,
};
use autoos_types::MatchResult;
use tokio_util::sync::CancellationToken;

use crate::cli::{ImageSource, ScreenSource};

/// Exit code when the OCR engine cannot be made available
const UNAVAILABLE: u8 = 2;

/// Shared state for one command invocation
pub struct AppContext {
    pub config: Config,
    pub cancel: CancellationToken,
}

impl AppContext {
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    fn resolver(&self) -> DependencyResolver {
        DependencyResolver::new(self.config.acquisition.clone())
            .with_cancellation(self.cancel.clone())
    }

    fn locator(&self) -> TextLocator {
        let cli = TesseractCli::new(&self.config.ocr).with_cancellation(self.cancel.clone());
        TextLocator::new(std::sync::Arc::new(cli))
    }

    /// Resolver that is ready, or `None` after logging why not
    async fn ready_resolver(&self) -> Option<DependencyResolver> {
        let mut resolver = self.resolver();
        if resolver.ensure().await {
            return Some(resolver);
        }

        match resolver.last_error() {
            Some(e) => eprintln!("OCR engine unavailable: {e}"),
            None => eprintln!("OCR engine unavailable"),
        }
        None
    }

    /// Fall back to the configured region or window when the command line names neither
    fn screen_source(&self, source: &ScreenSource) -> ScreenSource {
        if source.region.is_some() || source.window.is_some() {
            return source.clone();
        }
        ScreenSource {
            region: self.config.ocr.capture_region,
            window: self.config.ocr.target_window.clone(),
        }
    }

    async fn capture(&self, source: &ScreenSource) -> Result<CapturedImage> {
        let source = self.screen_source(source);

        let image = tokio::task::spawn_blocking(move || match (source.region, source.window) {
            (Some(region), _) => {
                tracing::debug!("Capturing region {:?}", region);
                capture_screen_region(region)
            }
            (None, Some(title)) => {
                tracing::debug!("Capturing window '{}'", title);
                capture_window_by_title(&title)
            }
            (None, None) => {
                tracing::debug!("Capturing primary screen");
                capture_primary_screen()
            }
        })
        .await
        .context("Capture task failed")??;

        tracing::info!(
            "Captured {}x{} at ({}, {})",
            image.region.width,
            image.region.height,
            image.region.x,
            image.region.y
        );
        Ok(image)
    }

    async fn load(&self, source: &ImageSource) -> Result<CapturedImage> {
        match &source.image {
            Some(path) => Ok(CapturedImage::open(path)?),
            None => self.capture(&source.screen).await,
        }
    }
}

pub async fn ensure(ctx: &AppContext) -> Result<ExitCode> {
    let mut resolver = ctx.resolver();
    if resolver.ensure().await {
        let executable = resolver
            .executable()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("ready: {executable}");
        return Ok(ExitCode::SUCCESS);
    }

    match resolver.last_error() {
        Some(e) => println!("unavailable: {e}"),
        None => println!("unavailable"),
    }
    Ok(ExitCode::from(UNAVAILABLE))
}

pub async fn screenshot(ctx: &AppContext, output: &Path, source: &ScreenSource) -> Result<ExitCode> {
    let image = ctx.capture(source).await?;
    image.save(output)?;
    println!("{}", output.display());
    Ok(ExitCode::SUCCESS)
}

pub fn windows() -> Result<ExitCode> {
    for (id, title) in list_windows()? {
        println!("{id}\t{title}");
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn text(ctx: &AppContext, source: &ImageSource) -> Result<ExitCode> {
    let Some(resolver) = ctx.ready_resolver().await else {
        return Ok(ExitCode::from(UNAVAILABLE));
    };

    let image = ctx.load(source).await?;
    let text = ctx.locator().text(&resolver, &image).await?;
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}

pub async fn locate(ctx: &AppContext, query: &str, json: bool, source: &ImageSource) -> Result<ExitCode> {
    let Some(resolver) = ctx.ready_resolver().await else {
        return Ok(ExitCode::from(UNAVAILABLE));
    };

    let image = ctx.load(source).await?;
    let matches = ctx.locator().locate(&resolver, &image, query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        for found in &matches {
            println!("{}", format_match(found));
        }
    }

    Ok(if matches.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub async fn highlight(
    ctx: &AppContext,
    query: &str,
    output: &Path,
    source: &ImageSource,
) -> Result<ExitCode> {
    let Some(resolver) = ctx.ready_resolver().await else {
        return Ok(ExitCode::from(UNAVAILABLE));
    };

    let image = ctx.load(source).await?;
    let matches = ctx.locator().locate(&resolver, &image, query).await?;
    let first = matches.first();

    Highlighter::default().annotate(&image, first).save(output)?;

    match first {
        Some(found) => {
            println!("{}", format_match(found));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("no match for '{query}'");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn find_image(
    ctx: &AppContext,
    template: &Path,
    threshold: f32,
    source: &ImageSource,
) -> Result<ExitCode> {
    let template = CapturedImage::open(template)?;
    let image = ctx.load(source).await?;

    match ImageFinder::new(threshold).find(&image, &template.pixels) {
        Some(found) => {
            println!("{found}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("not found");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn format_match(found: &MatchResult) -> String {
    format!(
        "{}\t{}\t{}\t{:.1}",
        found.index,
        found.token.text,
        found.bbox(),
        found.token.confidence
    )
}
