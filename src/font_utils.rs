//! Font utilities for loading TrueType files and embedding them in PDFs

use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use ttf_parser::Face;

use crate::error::{Error, Result};
use crate::font_registry::StandardFont;

/// Map Unicode code point to CID (Character ID) for Type0 fonts
pub type CidMap = HashMap<u32, u16>;

/// Directories searched for stand-in outline fonts
const SYSTEM_FONT_DIRS: [&str; 12] = [
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation-mono",
    "/usr/share/fonts/liberation-serif",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "C:/Windows/Fonts",
    "/usr/local/share/fonts",
];

/// Load TTF/OTF font from file path
pub fn load_font_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::Font(format!("Font file not found: {}", path.display())));
    }
    let font_data = std::fs::read(path)?;

    // Validate font using ttf-parser
    Face::parse(&font_data, 0)
        .map_err(|e| Error::Font(format!("Invalid font file {}: {}", path.display(), e)))?;

    Ok(font_data)
}

/// Search `assets/fonts` from the working directory up to ten parents
fn find_font_in_assets(font_filename: &str) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .take(10)
        .map(|dir| dir.join("assets").join("fonts").join(font_filename))
        .find(|path| path.exists())
}

/// Locate a TrueType file whose outlines can render `font` on a raster
pub fn find_outline_font(font: StandardFont) -> Option<PathBuf> {
    for filename in font.outline_candidates() {
        if let Some(path) = find_font_in_assets(filename) {
            return Some(path);
        }
        if let Some(path) = SYSTEM_FONT_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(filename))
            .find(|path| path.exists())
        {
            return Some(path);
        }
    }
    None
}

/// Add TrueType font to PDF as Type0 font (CIDFontType2)
/// Returns the Unicode->CID mapping used to encode text for this font
///
/// Writes FontDescriptor, CIDFont, Type0 font, CIDToGIDMap and ToUnicode CMap.
/// CIDs equal glyph ids, so text is shown as big-endian glyph ids.
pub fn add_truetype_font(
    pdf: &mut Pdf,
    font_data: &[u8],
    font_id: Ref,
    next_ref_id: &mut i32,
) -> Result<CidMap> {
    let face = Face::parse(font_data, 0).map_err(|e| Error::Font(format!("Invalid font file: {}", e)))?;

    // Font metrics in PDF glyph space (1000 units per em)
    let scale = 1000.0 / face.units_per_em() as f32;
    let pdf_ascender = face.ascender() as f32 * scale;
    let pdf_descender = face.descender() as f32 * scale;
    let bbox = face.global_bounding_box();

    let base_font = face
        .names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .find_map(|name| name.to_string())
        .or_else(|| {
            face.names()
                .into_iter()
                .filter(|name| name.name_id == ttf_parser::name_id::FAMILY)
                .find_map(|name| name.to_string())
        })
        .unwrap_or_else(|| format!("Font{}", font_id.get()))
        .replace(' ', "");

    let default_width = 500_i32;
    let mut cid_map = CidMap::new();
    let mut max_cid = 0u16;
    let mut cid_widths: BTreeMap<u16, i32> = BTreeMap::new();

    // BMP covers Latin, punctuation and symbols
    for code_point in 0x0000u32..=0xFFFFu32 {
        let Some(ch) = char::from_u32(code_point) else {
            continue;
        };
        let Some(glyph_id) = face.glyph_index(ch) else {
            continue;
        };
        let cid = glyph_id.0;
        cid_map.entry(code_point).or_insert(cid);
        max_cid = max_cid.max(cid);
        cid_widths.entry(cid).or_insert_with(|| {
            face.glyph_hor_advance(glyph_id)
                .map(|adv| (adv as f32 * scale).round() as i32)
                .unwrap_or(default_width)
                .max(0)
        });
    }

    if cid_map.is_empty() {
        return Err(Error::Font(
            "Font does not provide any Unicode glyphs in BMP range".to_string(),
        ));
    }

    let mut alloc = || {
        let id = Ref::new(*next_ref_id);
        *next_ref_id += 1;
        id
    };
    let font_descriptor_id = alloc();
    let cid_font_id = alloc();
    let cid_to_gid_map_id = alloc();
    let font_file_id = alloc();
    let to_unicode_id = alloc();

    // Identity CIDToGIDMap as 2-byte big-endian GIDs
    let cid_to_gid_bytes: Vec<u8> = (0..=max_cid).flat_map(|gid| gid.to_be_bytes()).collect();
    pdf.stream(cid_to_gid_map_id, &cid_to_gid_bytes);

    pdf.stream(font_file_id, font_data)
        .pair(Name(b"Length1"), font_data.len() as i32);

    pdf.stream(to_unicode_id, to_unicode_cmap(&cid_map).as_bytes());

    let base_font_name = Name(base_font.as_bytes());
    pdf.font_descriptor(font_descriptor_id)
        .name(base_font_name)
        .flags(FontFlags::SYMBOLIC)
        .bbox(Rect::new(
            bbox.x_min as f32 * scale,
            bbox.y_min as f32 * scale,
            bbox.x_max as f32 * scale,
            bbox.y_max as f32 * scale,
        ))
        .italic_angle(face.italic_angle().unwrap_or(0.0))
        .ascent(pdf_ascender)
        .descent(pdf_descender)
        .cap_height(face.capital_height().map_or(pdf_ascender, |h| h as f32 * scale))
        .stem_v(80.0)
        .font_file2(font_file_id);

    {
        let mut cid_font = pdf.cid_font(cid_font_id);
        cid_font
            .subtype(CidFontType::Type2)
            .base_font(base_font_name)
            .system_info(SystemInfo {
                registry: Str(b"Adobe"),
                ordering: Str(b"Identity"),
                supplement: 0,
            })
            .font_descriptor(font_descriptor_id)
            .default_width(default_width as f32)
            .cid_to_gid_map_stream(cid_to_gid_map_id);

        // Consecutive CIDs share one widths entry
        let mut widths_writer = cid_font.widths();
        let mut cid_iter = cid_widths.into_iter().peekable();
        while let Some((start_cid, start_width)) = cid_iter.next() {
            let mut widths = vec![start_width as f32];
            let mut last_cid = start_cid;
            while let Some(&(next_cid, next_width)) = cid_iter.peek() {
                if next_cid != last_cid + 1 {
                    break;
                }
                widths.push(next_width as f32);
                last_cid = next_cid;
                cid_iter.next();
            }
            widths_writer.consecutive(start_cid, widths);
        }
    }

    pdf.type0_font(font_id)
        .base_font(base_font_name)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_id)
        .to_unicode(to_unicode_id);

    Ok(cid_map)
}

/// ToUnicode CMap mapping CIDs back to code points, in blocks of at most 100
fn to_unicode_cmap(cid_map: &CidMap) -> String {
    let mut pairs: Vec<(u16, u32)> = cid_map.iter().map(|(&unicode, &cid)| (cid, unicode)).collect();
    pairs.sort_unstable();
    pairs.dedup_by_key(|(cid, _)| *cid);

    let mut sections = String::new();
    for chunk in pairs.chunks(100) {
        sections.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (cid, unicode) in chunk {
            sections.push_str(&format!("<{:04X}> <{:04X}>\n", cid, unicode));
        }
        sections.push_str("endbfchar\n");
    }

    format!(
        "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
   /Ordering (Identity)
   /Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
{}endcmap
CMapName currentdict /CMap defineresource pop
end
end",
        sections
    )
}

/// Encode `text` as big-endian CIDs, substituting CID 0 for unmapped characters
pub fn encode_cids(text: &str, cid_map: &CidMap) -> Vec<u8> {
    text.chars()
        .flat_map(|ch| cid_map.get(&(ch as u32)).copied().unwrap_or(0).to_be_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_cids() {
        let mut cid_map = CidMap::new();
        cid_map.insert('A' as u32, 0x24);
        cid_map.insert('ł' as u32, 0x1F3);
        assert_eq!(encode_cids("Ał?", &cid_map), vec![0x00, 0x24, 0x01, 0xF3, 0x00, 0x00]);
    }

    #[test]
    fn test_to_unicode_cmap_blocks() {
        let cid_map: CidMap = (0..150u32).map(|i| (0x41 + i, i as u16 + 1)).collect();
        let cmap = to_unicode_cmap(&cid_map);
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("50 beginbfchar"));
        assert!(cmap.contains("<0001> <0041>"));
    }

    #[test]
    fn test_add_truetype_font() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSans.ttf");
        let data = load_font_file(&path).unwrap();
        let face = Face::parse(&data, 0).unwrap();

        let mut pdf = Pdf::new();
        let mut next_ref_id = 4;
        let cid_map = add_truetype_font(&mut pdf, &data, Ref::new(3), &mut next_ref_id).unwrap();
        assert_eq!(next_ref_id, 9);

        let glyph = face.glyph_index('ż').unwrap().0;
        assert_eq!(cid_map[&('ż' as u32)], glyph);
        let mut expected = face.glyph_index('A').unwrap().0.to_be_bytes().to_vec();
        expected.extend(glyph.to_be_bytes());
        assert_eq!(encode_cids("Aż", &cid_map), expected);

        let bytes = pdf.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Type0"));
        assert!(text.contains("/Encoding /Identity-H"));
        assert!(text.contains("/FontFile2"));
        assert!(text.contains(&format!("<{:04X}> <017C>", glyph)));
    }

    #[test]
    fn test_load_missing_font_file() {
        let err = load_font_file(Path::new("/nonexistent/Missing.ttf")).unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }
}
