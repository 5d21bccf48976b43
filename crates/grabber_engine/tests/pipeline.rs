use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use grabber_core::{Fallback, NamingMode, RunConfig};
use grabber_engine::{
    BlockReason, FetchSettings, Pipeline, PipelineError, PipelineEvent, ProgressSink,
    ReqwestFetcher, Stage,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32">
  <rect width="64" height="32" fill="#00ff00"/>
</svg>"##;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(grabber_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([40, 40, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([10, 160, 60]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)
        .unwrap();
    bytes
}

async fn serve_page(server: &MockServer, html: &str) {
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn serve_bytes(server: &MockServer, route: &str, body: Vec<u8>, content_type: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .expect(hits)
        .mount(server)
        .await;
}

fn config(server: &MockServer, out: &Path, selector: &str, naming: NamingMode) -> RunConfig {
    let source = Url::parse(&format!("{}/page", server.uri())).unwrap();
    RunConfig::new(out, source, selector, naming)
}

async fn run(config: &RunConfig, sink: &TestSink) -> Result<grabber_core::RunReport, PipelineError> {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    Pipeline::new(&fetcher, sink).run(config).await
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn alt_text_names_and_squares_each_image() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(
        &server,
        r#"<html><body>
            <img class="item" src="/img/a.jpg" alt="Red Shoe">
            <img class="item" src="/img/b.png" alt="Blue  Boot's">
        </body></html>"#,
    )
    .await;
    // One hit each: the whitelisted extensions mean no content-type probe.
    serve_bytes(&server, "/img/a.jpg", jpeg_bytes(900, 300), "image/jpeg", 1).await;
    serve_bytes(&server, "/img/b.png", png_bytes(120, 80), "image/png", 1).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img.item", NamingMode::AltText);

    let report = run(&config, &sink).await.unwrap();

    assert_eq!(file_names(temp.path()), vec!["blue_boots.png", "red_shoe.png"]);
    assert_eq!(
        report.thumbnails,
        vec![temp.path().join("red_shoe.png"), temp.path().join("blue_boots.png")]
    );
    assert_eq!(image::open(temp.path().join("red_shoe.png")).unwrap().dimensions(), (500, 500));
    assert_eq!(image::open(temp.path().join("blue_boots.png")).unwrap().dimensions(), (120, 120));

    let stages: Vec<Stage> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::Stage(stage) => Some(stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![Stage::CollectingLinks, Stage::Downloading, Stage::Resizing, Stage::Finished]
    );
}

#[tokio::test]
async fn no_matches_aborts_without_creating_files() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, "<html><body><p>nothing here</p></body></html>").await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img.product", NamingMode::AltText);

    let err = run(&config, &sink).await.unwrap_err();

    assert!(matches!(err, PipelineError::NoImagesFound));
    assert!(err.is_expected());
    assert!(file_names(temp.path()).is_empty());
    assert!(!sink.take().contains(&PipelineEvent::Stage(Stage::Downloading)));
}

#[tokio::test]
async fn relative_src_resolves_against_base_tag() {
    init_logging();
    let server = MockServer::start().await;
    let html = format!(
        r#"<html><head><base href="{}/static/"></head>
           <body><img src="/img/a.jpg"><img src="thumbs/c.jpg"></body></html>"#,
        server.uri()
    );
    serve_page(&server, &html).await;
    serve_bytes(&server, "/img/a.jpg", jpeg_bytes(10, 10), "image/jpeg", 1).await;
    serve_bytes(&server, "/static/thumbs/c.jpg", jpeg_bytes(10, 10), "image/jpeg", 1).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::OriginalFilename);

    let report = run(&config, &sink).await.unwrap();

    assert_eq!(file_names(temp.path()), vec!["a.png", "c.png"]);
    assert!(report.fallbacks.is_empty());
}

#[tokio::test]
async fn missing_alt_falls_back_to_file_name_and_is_reported() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, r#"<img src="/img/Summer-Sale.jpg">"#).await;
    serve_bytes(&server, "/img/Summer-Sale.jpg", jpeg_bytes(20, 20), "image/jpeg", 1).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::AltText);

    let report = run(&config, &sink).await.unwrap();

    assert_eq!(file_names(temp.path()), vec!["summersale.png"]);
    let image_url = format!("{}/img/Summer-Sale.jpg", server.uri());
    assert_eq!(
        report.notable_fallbacks().cloned().collect::<Vec<_>>(),
        vec![Fallback::MissingAlt {
            image_url: image_url.clone()
        }]
    );
    assert!(report
        .fallbacks
        .iter()
        .any(|fallback| matches!(fallback, Fallback::MissingBase { .. })));
    assert!(sink
        .take()
        .contains(&PipelineEvent::Fallback(Fallback::MissingAlt { image_url })));
}

#[tokio::test]
async fn missing_src_is_treated_as_blocking() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, r#"<img alt="lazy" data-src="/img/a.jpg">"#).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::AltText);

    let err = run(&config, &sink).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::SourceBlocked(BlockReason::MissingSource { index: 0 })
    ));
    assert!(file_names(temp.path()).is_empty());
}

#[tokio::test]
async fn http_error_on_download_is_treated_as_blocking() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, r#"<img src="/img/ok.jpg"><img src="/img/denied.jpg">"#).await;
    serve_bytes(&server, "/img/ok.jpg", jpeg_bytes(10, 10), "image/jpeg", 1).await;
    Mock::given(method("GET"))
        .and(path("/img/denied.jpg"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::OriginalFilename);

    let err = run(&config, &sink).await.unwrap_err();

    match err {
        PipelineError::SourceBlocked(BlockReason::HttpStatus { url, status }) => {
            assert_eq!(status, 403);
            assert!(url.ends_with("/img/denied.jpg"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The run stops before resizing; the first download is left as fetched.
    assert_eq!(file_names(temp.path()), vec!["ok.jpg"]);
}

#[tokio::test]
async fn svg_is_probed_rasterized_and_cleaned_up() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, r#"<img src="/brand/logo" alt="Logo">"#).await;
    // Content-type lookup plus download.
    serve_bytes(&server, "/brand/logo", LOGO_SVG.as_bytes().to_vec(), "image/svg+xml", 2).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::AltText);

    let report = run(&config, &sink).await.unwrap();

    assert_eq!(report.rasterized_svgs, 1);
    assert_eq!(file_names(temp.path()), vec!["logo.png"]);
    let thumb = image::open(temp.path().join("logo.png")).unwrap().to_rgba8();
    assert_eq!(thumb.dimensions(), (64, 64));
    assert_eq!(thumb.get_pixel(32, 2)[3], 0);
    assert_eq!(thumb.get_pixel(32, 32)[3], 255);
}

#[tokio::test]
async fn unmapped_content_type_is_fatal() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, r#"<img src="/download?id=7" alt="x">"#).await;
    serve_bytes(&server, "/download", b"PK".to_vec(), "application/zip", 1).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::AltText);

    let err = run(&config, &sink).await.unwrap_err();

    assert!(!err.is_expected());
    match err {
        PipelineError::UnknownContentType { content_type, .. } => {
            assert_eq!(content_type.as_deref(), Some("application/zip"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(file_names(temp.path()).is_empty());
}

#[tokio::test]
async fn bmp_named_by_content_type_is_thumbnailed_and_removed() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(&server, r#"<img src="/pic" alt="Old Icon">"#).await;
    // Content-type lookup plus download.
    serve_bytes(&server, "/pic", bmp_bytes(48, 16), "image/bmp", 2).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::AltText);

    let report = run(&config, &sink).await.unwrap();

    assert_eq!(file_names(temp.path()), vec!["old_icon.png"]);
    assert_eq!(report.thumbnails, vec![temp.path().join("old_icon.png")]);
    assert_eq!(image::open(temp.path().join("old_icon.png")).unwrap().dimensions(), (48, 48));
}

#[tokio::test]
async fn duplicate_names_leave_one_thumbnail() {
    init_logging();
    let server = MockServer::start().await;
    serve_page(
        &server,
        r#"<img src="/a/shoe.jpg" alt="Shoe"><img src="/b/shoe.jpg" alt="Shoe">"#,
    )
    .await;
    serve_bytes(&server, "/a/shoe.jpg", jpeg_bytes(40, 20), "image/jpeg", 1).await;
    serve_bytes(&server, "/b/shoe.jpg", jpeg_bytes(30, 90), "image/jpeg", 1).await;

    let temp = TempDir::new().unwrap();
    let sink = TestSink::default();
    let config = config(&server, temp.path(), "img", NamingMode::AltText);

    let report = run(&config, &sink).await.unwrap();

    assert_eq!(file_names(temp.path()), vec!["shoe.png"]);
    assert_eq!(report.thumbnails, vec![temp.path().join("shoe.png")]);
    // The second download overwrote the first before resizing.
    assert_eq!(image::open(temp.path().join("shoe.png")).unwrap().dimensions(), (90, 90));
}
