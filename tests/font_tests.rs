use multiformat::font_registry::face_text_width;
use multiformat::{Document, ImageOptions};

const DEJAVU_SANS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSans.ttf");

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn decode(bytes: &[u8]) -> image::RgbImage {
    image::load_from_memory(bytes).unwrap().to_rgb8()
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

/// Advance width of `text` in pixels at `size` pixels per em
fn dejavu_width(text: &str, size: f64) -> f64 {
    let data = std::fs::read(DEJAVU_SANS).unwrap();
    let face = ttf_parser::Face::parse(&data, 0).unwrap();
    face_text_width(&face, text, size)
}

fn is_ink(pixel: &image::Rgb<u8>) -> bool {
    pixel.0.iter().all(|&c| c < 128)
}

/// Leftmost and rightmost columns holding dark pixels
fn ink_columns(image: &image::RgbImage) -> Option<(u32, u32)> {
    let columns: Vec<u32> = image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| is_ink(pixel))
        .map(|(x, _, _)| x)
        .collect();
    Some((*columns.iter().min()?, *columns.iter().max()?))
}

fn document_with_dejavu() -> (Document, String) {
    let mut doc = Document::new("letter", "portrait").unwrap();
    let name = doc.fonts_mut().register_font_file(DEJAVU_SANS).unwrap();
    (doc, name)
}

fn render_png(doc: &Document, options: &ImageOptions) -> image::RgbImage {
    let mut png = Vec::new();
    doc.write_image(&mut png, "png", options).unwrap();
    decode(&png)
}

#[test]
fn registered_font_resolves_case_insensitively() {
    init();
    let (mut doc, name) = document_with_dejavu();
    assert_eq!(name, "DejaVuSans");
    doc.draw_string("Hi", 100, 100, "left", "dejavusans", 100, (0, 0, 0))
        .unwrap();
    assert_eq!(doc.fonts().resolve("DEJAVUSANS").unwrap(), "DejaVuSans");
}

#[test]
fn truetype_font_embedded_as_type0() {
    init();
    let (mut doc, name) = document_with_dejavu();
    doc.draw_string("Zażółć gęślą jaźń", 200, 400, "middle", &name, 120, (0, 0, 0))
        .unwrap();
    doc.draw_string("Second use", 200, 800, "right", &name, 120, (0, 0, 0))
        .unwrap();
    let mut pdf = Vec::new();
    doc.write_pdf(&mut pdf).unwrap();

    assert!(contains(&pdf, "/Subtype /Type0"));
    assert!(contains(&pdf, "/Subtype /CIDFontType2"));
    assert!(contains(&pdf, "/Identity-H"));
    assert!(contains(&pdf, "/ToUnicode"));
    assert!(contains(&pdf, "/BaseFont /DejaVuSans"));

    let parsed = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
}

#[test]
fn truetype_text_drawn_inside_its_box() {
    init();
    let (mut doc, name) = document_with_dejavu();
    doc.draw_string("Hamburgefonstiv", 200, 600, "left", &name, 200, (0, 0, 0))
        .unwrap();
    let image = render_png(&doc, &ImageOptions::default());

    let width = dejavu_width("Hamburgefonstiv", 200.0) as u32;
    let mut inside = 0;
    for (x, y, pixel) in image.enumerate_pixels() {
        if !is_ink(pixel) {
            continue;
        }
        // y is the bottom of a box one text size tall
        assert!((190..=210 + width).contains(&x), "ink at ({}, {})", x, y);
        assert!((390..=610).contains(&y), "ink at ({}, {})", x, y);
        inside += 1;
    }
    assert!(inside > 1000, "only {} dark pixels", inside);
}

#[test]
fn alignment_shifts_ink_by_advance_width() {
    init();
    let text = "Hamburgefonstiv";
    let columns = |alignment: &str| {
        let (mut doc, name) = document_with_dejavu();
        doc.draw_string(text, 1080, 600, alignment, &name, 100, (0, 0, 0))
            .unwrap();
        ink_columns(&render_png(&doc, &ImageOptions::default())).unwrap()
    };
    let left = columns("left");
    let middle = columns("middle");
    let right = columns("right");

    let width = dejavu_width(text, 100.0);
    let shift = |from: (u32, u32), to: (u32, u32)| from.0 as f64 - to.0 as f64;
    assert!((shift(left, middle) - width / 2.0).abs() <= 2.0, "{:?} {:?}", left, middle);
    assert!((shift(left, right) - width).abs() <= 2.0, "{:?} {:?}", left, right);
    // Same string, same ink extent up to subpixel placement
    assert!(((left.1 - left.0) as i64 - (right.1 - right.0) as i64).abs() <= 1);
}

#[test]
fn scaled_text_size_truncated_to_whole_pixels() {
    init();
    let text = "M".repeat(60);
    let mut doc = Document::new("a4", "portrait").unwrap();
    let name = doc.fonts_mut().register_font_file(DEJAVU_SANS).unwrap();
    doc.draw_string(&text, 100, 400, "left", &name, 21, (0, 0, 0))
        .unwrap();
    // A4 at 2100x2970 units, drawn at scale 1.5
    let image = render_png(&doc, &ImageOptions::default().with_size(3150, 4455));
    assert_eq!(image.dimensions(), (3150, 4455));

    let (first, last) = ink_columns(&image).unwrap();
    let span = (last - first) as f64;
    // 21 units at 1.5x is 31 px, not 31.5
    let expected = dejavu_width(&text, 31.0);
    assert!((span - expected).abs() < 10.0, "span {} expected {}", span, expected);
    assert!(dejavu_width(&text, 31.5) - span > 15.0);
}
