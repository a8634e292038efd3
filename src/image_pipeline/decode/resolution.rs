//! Resolution metadata probing.
//!
//! Each container stores density differently; probing reads only headers and
//! never fails a conversion. Missing, zero or malformed metadata yields `None`
//! and the caller falls back to the default resolution.

use std::io::Cursor;

use exif::{In, Tag as ExifTag, Value as ExifValue};
use image::ImageFormat;
use tiff::decoder::ifd::Value as TiffValue;
use tiff::tags::Tag as TiffTag;
use tracing::debug;

use crate::image_pipeline::decode::types::Resolution;

/// Byte offset of `biXPelsPerMeter` in a BMP file (14-byte file header + 24).
pub(crate) const BMP_X_PELS_OFFSET: usize = 38;
pub(crate) const BMP_Y_PELS_OFFSET: usize = 42;
pub(crate) const BMP_INFO_HEADER_MIN: u32 = 40;

const CM_PER_INCH: f64 = 2.54;

// TIFF and EXIF ResolutionUnit values
const UNIT_INCH: u32 = 2;
const UNIT_CENTIMETER: u32 = 3;

pub fn probe(format: ImageFormat, data: &[u8]) -> Option<Resolution> {
    let resolution = match format {
        ImageFormat::Png => png_resolution(data),
        ImageFormat::Jpeg => jfif_resolution(data).or_else(|| exif_resolution(data)),
        ImageFormat::Tiff => tiff_resolution(data),
        ImageFormat::Bmp => bmp_resolution(data),
        _ => None,
    };
    debug!(?format, ?resolution, "Probed resolution metadata");
    resolution
}

fn from_unit(unit: u32, horizontal: f64, vertical: f64) -> Option<Resolution> {
    if !(horizontal > 0.0 && vertical > 0.0) {
        return None;
    }
    let scale = match unit {
        UNIT_INCH => 1.0,
        UNIT_CENTIMETER => CM_PER_INCH,
        _ => return None,
    };
    Some(Resolution::new(
        (horizontal * scale) as f32,
        (vertical * scale) as f32,
    ))
}

fn png_resolution(data: &[u8]) -> Option<Resolution> {
    let reader = png::Decoder::new(Cursor::new(data)).read_info().ok()?;
    let dims = reader.info().pixel_dims?;
    match dims.unit {
        png::Unit::Meter if dims.xppu > 0 && dims.yppu > 0 => Some(
            Resolution::from_pixels_per_meter(f64::from(dims.xppu), f64::from(dims.yppu)),
        ),
        _ => None,
    }
}

/// Reads the density fields of the JFIF APP0 segment.
fn jfif_resolution(data: &[u8]) -> Option<Resolution> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS or EOI: no more header segments
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }

        let length = usize::from(u16::from_be_bytes([data[pos + 2], data[pos + 3]]));
        if length < 2 {
            return None;
        }
        let segment = data.get(pos + 4..pos + 2 + length)?;

        if marker == 0xE0 && segment.len() >= 12 && segment.starts_with(b"JFIF\0") {
            let units = segment[7];
            let horizontal = f64::from(u16::from_be_bytes([segment[8], segment[9]]));
            let vertical = f64::from(u16::from_be_bytes([segment[10], segment[11]]));
            // JFIF units: 1 = dots per inch, 2 = dots per cm, 0 = aspect ratio only
            return match units {
                1 => from_unit(UNIT_INCH, horizontal, vertical),
                2 => from_unit(UNIT_CENTIMETER, horizontal, vertical),
                _ => None,
            };
        }

        pos += 2 + length;
    }

    None
}

fn exif_resolution(data: &[u8]) -> Option<Resolution> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;

    let rational = |tag: ExifTag| match &exif.get_field(tag, In::PRIMARY)?.value {
        ExifValue::Rational(values) => values.first().map(|r| r.to_f64()),
        _ => None,
    };

    let horizontal = rational(ExifTag::XResolution)?;
    let vertical = rational(ExifTag::YResolution)?;
    let unit = exif
        .get_field(ExifTag::ResolutionUnit, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(UNIT_INCH);

    from_unit(unit, horizontal, vertical)
}

fn tiff_resolution(data: &[u8]) -> Option<Resolution> {
    let mut decoder = tiff::decoder::Decoder::new(Cursor::new(data)).ok()?;

    let mut rational = |tag: TiffTag| match decoder.find_tag(tag).ok()?? {
        TiffValue::Rational(n, d) if d != 0 => Some(f64::from(n) / f64::from(d)),
        _ => None,
    };
    let horizontal = rational(TiffTag::XResolution)?;
    let vertical = rational(TiffTag::YResolution)?;

    let unit = decoder
        .find_tag(TiffTag::ResolutionUnit)
        .ok()
        .flatten()
        .and_then(|value| value.into_u16().ok())
        .map(u32::from)
        .unwrap_or(UNIT_INCH);

    from_unit(unit, horizontal, vertical)
}

fn bmp_resolution(data: &[u8]) -> Option<Resolution> {
    if !data.starts_with(b"BM") {
        return None;
    }
    let header_size = u32::from_le_bytes(data.get(14..18)?.try_into().ok()?);
    if header_size < BMP_INFO_HEADER_MIN {
        return None;
    }

    let read_i32 = |offset: usize| -> Option<i32> {
        Some(i32::from_le_bytes(data.get(offset..offset + 4)?.try_into().ok()?))
    };
    let horizontal = read_i32(BMP_X_PELS_OFFSET)?;
    let vertical = read_i32(BMP_Y_PELS_OFFSET)?;
    if horizontal <= 0 || vertical <= 0 {
        return None;
    }

    Some(Resolution::from_pixels_per_meter(
        f64::from(horizontal),
        f64::from(vertical),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jfif_header(units: u8, x: u16, y: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 2, units]);
        data.extend_from_slice(&x.to_be_bytes());
        data.extend_from_slice(&y.to_be_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_jfif_dots_per_inch() {
        let resolution = jfif_resolution(&jfif_header(1, 300, 150)).unwrap();
        assert_eq!(resolution, Resolution::new(300.0, 150.0));
    }

    #[test]
    fn test_jfif_dots_per_centimeter() {
        let resolution = jfif_resolution(&jfif_header(2, 100, 100)).unwrap();
        assert!((resolution.horizontal - 254.0).abs() < 0.01);
    }

    #[test]
    fn test_jfif_aspect_ratio_only() {
        assert!(jfif_resolution(&jfif_header(0, 1, 1)).is_none());
    }

    #[test]
    fn test_jfif_truncated() {
        let data = jfif_header(1, 72, 72);
        assert!(jfif_resolution(&data[..10]).is_none());
        assert!(jfif_resolution(b"not a jpeg").is_none());
    }

    #[test]
    fn test_bmp_pels_per_meter() {
        let mut data = vec![0u8; 54];
        data[..2].copy_from_slice(b"BM");
        data[14..18].copy_from_slice(&40u32.to_le_bytes());
        data[38..42].copy_from_slice(&11811i32.to_le_bytes());
        data[42..46].copy_from_slice(&3780i32.to_le_bytes());

        let resolution = bmp_resolution(&data).unwrap();
        assert!((resolution.horizontal - 300.0).abs() < 0.05);
        assert!((resolution.vertical - 96.0).abs() < 0.05);
    }

    #[test]
    fn test_bmp_without_density() {
        let mut data = vec![0u8; 54];
        data[..2].copy_from_slice(b"BM");
        data[14..18].copy_from_slice(&40u32.to_le_bytes());
        assert!(bmp_resolution(&data).is_none());
    }

    #[test]
    fn test_png_phys_chunk() {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, 1, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: 2835,
                yppu: 5669,
                unit: png::Unit::Meter,
            }));
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0]).unwrap();
        }

        let resolution = probe(ImageFormat::Png, &data).unwrap();
        assert!((resolution.horizontal - 72.0).abs() < 0.05);
        assert!((resolution.vertical - 144.0).abs() < 0.05);
    }

    /// JPEG with only an EXIF APP1 segment (no JFIF density): little-endian
    /// IFD0 holding XResolution, YResolution and ResolutionUnit.
    fn exif_jpeg(x: u32, y: u32, unit: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());

        // IFD0 at 8: count + 3 entries + next offset = 42 bytes, rationals follow at 50
        tiff.extend_from_slice(&3u16.to_le_bytes());
        for (tag, offset) in [(0x011Au16, 50u32), (0x011B, 58)] {
            tiff.extend_from_slice(&tag.to_le_bytes());
            tiff.extend_from_slice(&5u16.to_le_bytes());
            tiff.extend_from_slice(&1u32.to_le_bytes());
            tiff.extend_from_slice(&offset.to_le_bytes());
        }
        tiff.extend_from_slice(&0x0128u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&unit.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());
        for numerator in [x, y] {
            tiff.extend_from_slice(&numerator.to_le_bytes());
            tiff.extend_from_slice(&1u32.to_le_bytes());
        }

        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1];
        data.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        data.extend_from_slice(b"Exif\0\0");
        data.extend_from_slice(&tiff);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_exif_fallback_without_jfif() {
        let data = exif_jpeg(300, 200, 2);
        assert!(jfif_resolution(&data).is_none());

        let resolution = probe(ImageFormat::Jpeg, &data).unwrap();
        assert_eq!(resolution, Resolution::new(300.0, 200.0));
    }

    #[test]
    fn test_exif_centimeter_unit() {
        let resolution = probe(ImageFormat::Jpeg, &exif_jpeg(100, 50, 3)).unwrap();
        assert!((resolution.horizontal - 254.0).abs() < 0.01);
        assert!((resolution.vertical - 127.0).abs() < 0.01);
    }

    #[test]
    fn test_tiff_centimeter_unit() {
        use tiff::encoder::{colortype, Rational, TiffEncoder};
        use tiff::tags::ResolutionUnit;

        let mut data = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut data)).unwrap();
            let mut page = encoder.new_image::<colortype::Gray8>(2, 2).unwrap();
            page.resolution_unit(ResolutionUnit::Centimeter);
            page.x_resolution(Rational { n: 118, d: 1 });
            page.y_resolution(Rational { n: 4724, d: 100 });
            page.write_data(&[0u8, 64, 128, 255][..]).unwrap();
        }

        let resolution = probe(ImageFormat::Tiff, &data).unwrap();
        assert!((resolution.horizontal - 299.72).abs() < 0.01, "{:?}", resolution);
        assert!((resolution.vertical - 119.99).abs() < 0.01, "{:?}", resolution);
    }

    #[test]
    fn test_unknown_format_has_no_resolution() {
        assert!(probe(ImageFormat::Gif, b"GIF89a").is_none());
    }
}
