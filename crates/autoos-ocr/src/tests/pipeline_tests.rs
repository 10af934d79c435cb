use std::sync::Arc;
use std::sync::atomic::Ordering;

use autoos_types::{BoundingBox, CaptureRegion, OcrToken};
use image::{Rgba, RgbaImage};

use super::{FakeRecognizer, Fixture, place_executable};
use crate::capture::CapturedImage;
use crate::error::Error;
use crate::highlight::Highlighter;
use crate::locator::TextLocator;
use crate::path_env::PathEnvironment;
use crate::resolver::DependencyResolver;

fn menu_tokens() -> Vec<OcrToken> {
    vec![
        OcrToken::new("Open", BoundingBox::new(10, 10, 40, 12), 96.0),
        OcrToken::new("File", BoundingBox::new(60, 10, 35, 12), 94.0),
        OcrToken::new("Settings", BoundingBox::new(10, 30, 70, 12), 91.0),
    ]
}

fn screen() -> CapturedImage {
    CapturedImage::new(
        RgbaImage::from_pixel(120, 50, Rgba([255, 255, 255, 255])),
        CaptureRegion::new(0, 0, 120, 50),
    )
}

async fn verified(fixture: &Fixture) -> DependencyResolver {
    let bin = fixture.dir("bin");
    place_executable(&bin);
    fixture.path.prepend(&bin).unwrap();

    let mut resolver = fixture.resolver();
    assert!(resolver.ensure().await);
    resolver
}

fn locator(recognizer: FakeRecognizer) -> (TextLocator, Arc<FakeRecognizer>) {
    let recognizer = Arc::new(recognizer);
    (TextLocator::new(recognizer.clone()), recognizer)
}

#[tokio::test]
async fn test_locate_and_highlight_file_menu() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let (locator, _) = locator(FakeRecognizer {
        tokens: menu_tokens(),
        ..FakeRecognizer::default()
    });
    let image = screen();

    let matches = locator.locate(&resolver, &image, "file").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].bbox(), BoundingBox::new(60, 10, 35, 12));
    assert_eq!(matches[0].index, 1);

    let highlighter = Highlighter::default();
    let annotated = highlighter.annotate(&image, matches.first());
    assert_ne!(annotated, image);
    // left edge of the outline, two pixels outside the token box
    assert_eq!(*annotated.pixels.get_pixel(58, 15), highlighter.color);
    assert_eq!(*image.pixels.get_pixel(58, 15), Rgba([255, 255, 255, 255]));

    assert_eq!(highlighter.annotate(&image, None), image);
}

#[tokio::test]
async fn test_uppercase_token_matches_lowercase_query() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let bbox = BoundingBox::new(5, 5, 30, 10);
    let (locator, _) = locator(FakeRecognizer {
        tokens: vec![OcrToken::new("HELLO", bbox, 99.0)],
        ..FakeRecognizer::default()
    });

    let matches = locator.locate(&resolver, &screen(), "hello").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].bbox(), bbox);
}

#[tokio::test]
async fn test_no_match_is_not_an_error() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let (locator, _) = locator(FakeRecognizer {
        tokens: menu_tokens(),
        ..FakeRecognizer::default()
    });

    let matches = locator.locate(&resolver, &screen(), "save").await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_matches_follow_token_order() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let tokens = vec![
        OcrToken::new("settings", BoundingBox::new(50, 0, 40, 10), 90.0),
        OcrToken::new("Setup", BoundingBox::new(45, 0, 30, 10), 90.0),
        OcrToken::new("SET", BoundingBox::new(0, 20, 20, 10), 90.0),
    ];
    let (locator, _) = locator(FakeRecognizer {
        tokens: tokens.clone(),
        ..FakeRecognizer::default()
    });

    let expected = locator.tokens(&resolver, &screen()).await.unwrap();
    assert_eq!(expected, tokens);

    let matches = locator.locate(&resolver, &screen(), "set").await.unwrap();
    let texts: Vec<&str> = matches.iter().map(|m| m.token.text.as_str()).collect();
    assert_eq!(texts, ["settings", "Setup", "SET"]);
}

#[tokio::test]
async fn test_unverified_engine_is_dependency_unavailable() {
    let fixture = Fixture::new();
    let resolver = fixture.resolver();
    let (locator, recognizer) = locator(FakeRecognizer {
        tokens: menu_tokens(),
        ..FakeRecognizer::default()
    });

    let result = locator.tokens(&resolver, &screen()).await;
    assert!(matches!(result, Err(Error::DependencyUnavailable)));
    let result = locator.locate(&resolver, &screen(), "file").await;
    assert!(matches!(result, Err(Error::DependencyUnavailable)));
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_capture_yields_no_tokens() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let (locator, recognizer) = locator(FakeRecognizer {
        tokens: menu_tokens(),
        ..FakeRecognizer::default()
    });

    let empty = CapturedImage::empty(CaptureRegion::new(10, 10, 0, 0));
    assert!(locator.tokens(&resolver, &empty).await.unwrap().is_empty());
    assert!(locator.locate(&resolver, &empty, "").await.unwrap().is_empty());
    assert_eq!(locator.text(&resolver, &empty).await.unwrap(), "");
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_engine_failure_is_reported() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let (locator, _) = locator(FakeRecognizer {
        fail: true,
        ..FakeRecognizer::default()
    });

    let result = locator.locate(&resolver, &screen(), "file").await;
    assert!(matches!(result, Err(Error::OcrInvocationFailed(_))));
}

#[tokio::test]
async fn test_plain_text_passes_through() {
    let fixture = Fixture::new();
    let resolver = verified(&fixture).await;
    let (locator, _) = locator(FakeRecognizer {
        text: "Open File\nSettings\n".to_string(),
        ..FakeRecognizer::default()
    });

    let text = locator.text(&resolver, &screen()).await.unwrap();
    assert_eq!(text, "Open File\nSettings\n");
}
