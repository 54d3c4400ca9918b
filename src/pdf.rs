use image::RgbaImage;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::config::MM_PER_INCH;

const PAGE_IMAGE: &[u8] = b"Im1";

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / MM_PER_INCH as f32
}

/// Assemble page rasters into a PDF, one raster stretched over each page.
/// All pages share the same physical size.
pub fn write_document(pages: &[RgbaImage], page_width_mm: f32, page_height_mm: f32) -> Vec<u8> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let image_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let (width_pt, height_pt) = (mm_to_pt(page_width_mm), mm_to_pt(page_height_mm));

    for (i, raster) in pages.iter().enumerate() {
        // pages are opaque, so only the colour channels are embedded
        let rgb_data: Vec<u8> = raster
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);
        {
            let mut xobj = pdf.image_xobject(image_ids[i], &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(raster.width() as i32);
            xobj.height(raster.height() as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }

        let mut content = Content::new();
        content.save_state();
        content.transform([width_pt, 0.0, 0.0, height_pt, 0.0, 0.0]);
        content.x_object(Name(PAGE_IMAGE));
        content.restore_state();
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, width_pt, height_pt))
            .parent(pages_id)
            .contents(content_ids[i]);
        page.resources().x_objects().pair(Name(PAGE_IMAGE), image_ids[i]);
    }

    log::debug!(
        "Assembled {n} page(s) at {width_pt:.1}x{height_pt:.1}pt in {:.1}ms",
        t0.elapsed().as_secs_f64() * 1000.0
    );

    pdf.finish()
}
