//! Integration tests for single-document conversion.
//!
//! Uses the fake rasterizer from `common`; the TIFFs it produces are read
//! back with `tiff::decoder`.

mod common;

use common::*;
use pdf2tif::{
    convert, convert_blocking, convert_sync, Binarization, Compression, ConversionConfig,
    ConversionRequest, EngineLocation, OverwritePolicy, Pdf2TifError,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::path::Path;
use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tiff::ColorType;

// ── Helpers ──────────────────────────────────────────────────────────────────

struct PageInfo {
    width: u32,
    height: u32,
    compression: u32,
    color: ColorType,
    x_res: Value,
    y_res: Value,
    unit: u32,
}

fn read_pages(path: &Path) -> Vec<PageInfo> {
    let bytes = std::fs::read(path).unwrap();
    let mut dec = Decoder::new(Cursor::new(bytes)).unwrap();
    let mut pages = Vec::new();
    loop {
        let (width, height) = dec.dimensions().unwrap();
        pages.push(PageInfo {
            width,
            height,
            compression: dec.get_tag_u32(Tag::Compression).unwrap(),
            color: dec.colortype().unwrap(),
            x_res: dec.get_tag(Tag::XResolution).unwrap(),
            y_res: dec.get_tag(Tag::YResolution).unwrap(),
            unit: dec.get_tag_u32(Tag::ResolutionUnit).unwrap(),
        });
        if !dec.more_images() {
            break;
        }
        dec.next_image().unwrap();
    }
    pages
}

fn setup() -> (tempfile::TempDir, ConversionConfig, std::sync::Arc<FakeRasterizer>) {
    let root = tempfile::tempdir().unwrap();
    let fake = FakeRasterizer::new();
    let config = config_with(engine_dir(root.path()), fake.clone());
    (root, config, fake)
}

// ── Page layout ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_page_is_one_bit_fax_resolution() {
    let (root, config, _) = setup();
    let src = write_pdf(root.path(), "memo.pdf", 1);
    let out = root.path().join("out");

    let req = ConversionRequest::new(&src, &out, Compression::Lzw);
    let output = convert(&req, &config).await.unwrap();

    assert_eq!(output.page_count, 1);
    assert_eq!(output.output_path, out.join("memo.tif"));
    assert_eq!(output.source_path, src);

    let pages = read_pages(&output.output_path);
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!((page.width, page.height), (page_width(1), PAGE_HEIGHT));
    assert_eq!(page.color, ColorType::Gray(1));
    assert_eq!(page.x_res, Value::Rational(204, 1));
    assert_eq!(page.y_res, Value::Rational(196, 1));
    assert_eq!(page.unit, 2);
}

#[tokio::test]
async fn pages_keep_source_order() {
    let (root, config, _) = setup();
    let src = write_pdf(root.path(), "report.pdf", 4);

    let req = ConversionRequest::new(&src, root.path(), Compression::Group4);
    let output = convert(&req, &config).await.unwrap();
    assert_eq!(output.page_count, 4);

    let widths: Vec<u32> = read_pages(&output.output_path)
        .iter()
        .map(|p| p.width)
        .collect();
    assert_eq!(widths, (1..=4).map(page_width).collect::<Vec<_>>());
}

#[tokio::test]
async fn resolution_stamp_ignores_render_dpi() {
    let (root, config, _) = setup();
    let src = write_pdf(root.path(), "a.pdf", 2);

    let req = ConversionRequest::new(&src, root.path(), Compression::Lzw).with_dpi(150);
    let output = convert(&req, &config).await.unwrap();

    for page in read_pages(&output.output_path) {
        assert_eq!(page.x_res, Value::Rational(204, 1));
        assert_eq!(page.y_res, Value::Rational(196, 1));
    }
}

// ── Compression ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn compression_codes() {
    let (root, config, _) = setup();
    let src = write_pdf(root.path(), "c.pdf", 2);

    for (choice, code) in [("LZW", 5), ("CCITT T.6", 4), ("zip-please", 4)] {
        let out = root.path().join(choice.replace(' ', "_"));
        let req = ConversionRequest::new(&src, &out, Compression::from_choice(choice));
        let output = convert(&req, &config).await.unwrap();
        for page in read_pages(&output.output_path) {
            assert_eq!(page.compression, code, "choice {choice:?}");
        }
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_engine_stops_before_rasterising() {
    let root = tempfile::tempdir().unwrap();
    let fake = FakeRasterizer::new();
    let config = config_with(
        EngineLocation::explicit(root.path().join("no-such-engine")),
        fake.clone(),
    );
    let src = write_pdf(root.path(), "a.pdf", 1);
    let out = root.path().join("out");

    let err = convert(&ConversionRequest::new(&src, &out, Compression::Lzw), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2TifError::EngineNotFound { .. }), "{err}");
    assert_eq!(fake.calls(), 0);
    assert!(!out.exists());
}

#[tokio::test]
async fn zero_pages_writes_nothing() {
    let (root, config, _) = setup();
    let src = write_pdf(root.path(), "empty.pdf", 0);
    let out = root.path().join("out");

    let err = convert(&ConversionRequest::new(&src, &out, Compression::Lzw), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2TifError::NoPagesProduced { .. }));
    assert!(err.to_string().contains("empty.pdf"));
    assert!(!out.join("empty.tif").exists());
    assert_eq!(list_dir(&out), Vec::<String>::new());
}

#[tokio::test]
async fn rasteriser_error_names_the_file() {
    let (root, config, _) = setup();
    let src = write_broken_pdf(root.path(), "broken.pdf");

    let err = convert(&ConversionRequest::new(&src, root.path(), Compression::Lzw), &config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("broken.pdf"), "{err}");
    assert!(!root.path().join("broken.tif").exists());
    assert!(src.exists(), "input must never be deleted");
}

#[tokio::test]
async fn non_pdf_is_rejected_before_rasterising() {
    let (root, config, fake) = setup();
    let src = root.path().join("notes.pdf");
    std::fs::write(&src, "just text").unwrap();

    let err = convert(&ConversionRequest::new(&src, root.path(), Compression::Lzw), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2TifError::NotAPdf { .. }));
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn missing_source_is_reported() {
    let (root, config, _) = setup();
    let err = convert(
        &ConversionRequest::new(root.path().join("ghost.pdf"), root.path(), Compression::Lzw),
        &config,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Pdf2TifError::FileNotFound { .. }));
}

// ── Output naming ────────────────────────────────────────────────────────────

#[tokio::test]
async fn converting_twice_leaves_one_file() {
    let (root, config, _) = setup();
    let src = write_pdf(root.path(), "twice.pdf", 1);
    let out = root.path().join("out");
    let req = ConversionRequest::new(&src, &out, Compression::Lzw);

    convert(&req, &config).await.unwrap();
    let second = convert(&req, &config).await.unwrap();

    assert_eq!(second.output_path, out.join("twice.tif"));
    assert_eq!(list_dir(&out), vec!["twice.tif".to_string()]);
}

#[tokio::test]
async fn reject_policy_keeps_existing_file() {
    let root = tempfile::tempdir().unwrap();
    let fake = FakeRasterizer::new();
    let config = ConversionConfig::builder(engine_dir(root.path()))
        .rasterizer(fake.clone())
        .overwrite(OverwritePolicy::Reject)
        .build()
        .unwrap();
    let src = write_pdf(root.path(), "keep.pdf", 1);
    std::fs::write(root.path().join("keep.tif"), b"precious").unwrap();

    let err = convert(&ConversionRequest::new(&src, root.path(), Compression::Lzw), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2TifError::OutputExists { .. }));
    assert_eq!(fake.calls(), 0);
    assert_eq!(std::fs::read(root.path().join("keep.tif")).unwrap(), b"precious");
}

#[tokio::test]
async fn suffix_policy_picks_next_free_name() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("out");
    let config = ConversionConfig::builder(engine_dir(root.path()))
        .rasterizer(FakeRasterizer::new())
        .overwrite(OverwritePolicy::Suffix)
        .build()
        .unwrap();
    let src = write_pdf(root.path(), "scan.pdf", 1);
    let req = ConversionRequest::new(&src, &out, Compression::Group4);

    let first = convert(&req, &config).await.unwrap();
    let second = convert(&req, &config).await.unwrap();
    let third = convert(&req, &config).await.unwrap();

    assert_eq!(first.output_path, out.join("scan.tif"));
    assert_eq!(second.output_path, out.join("scan-1.tif"));
    assert_eq!(third.output_path, out.join("scan-2.tif"));
}

#[test]
fn blocking_entry_point_with_threshold() {
    let root = tempfile::tempdir().unwrap();
    let config = ConversionConfig::builder(engine_dir(root.path()))
        .rasterizer(FakeRasterizer::new())
        .binarization(Binarization::Threshold(100))
        .build()
        .unwrap();
    let src = write_pdf(root.path(), "sync.pdf", 3);

    let output =
        convert_blocking(&ConversionRequest::new(&src, root.path(), Compression::Lzw), &config)
            .unwrap();

    assert_eq!(output.page_count, 3);
    assert_eq!(output.bytes_written, std::fs::metadata(&output.output_path).unwrap().len());
    assert_eq!(
        list_dir(root.path()),
        vec!["pdfium".to_string(), "sync.pdf".into(), "sync.tif".into()]
    );
}

#[test]
fn sync_entry_point_runs_without_a_runtime() {
    let (root, config, fake) = setup();
    let src = write_pdf(root.path(), "plain.pdf", 2);
    let out = root.path().join("out");

    let output =
        convert_sync(&ConversionRequest::new(&src, &out, Compression::Group4), &config).unwrap();

    assert_eq!(output.page_count, 2);
    assert_eq!(output.output_path, out.join("plain.tif"));
    assert_eq!(fake.calls(), 1);
    assert_eq!(read_pages(&output.output_path).len(), 2);
}

#[test]
fn sync_entry_point_reports_errors() {
    let (root, config, _) = setup();
    let src = write_broken_pdf(root.path(), "bad.pdf");

    let err = convert_sync(&ConversionRequest::new(&src, root.path(), Compression::Lzw), &config)
        .unwrap_err();

    assert!(matches!(err, Pdf2TifError::RasterisationFailed { .. }), "{err}");
}
