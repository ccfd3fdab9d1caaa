//! GeoTIFF decoding via the pure-Rust `tiff` crate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chip_common::{ChipError, ChipResult, GeoTransform};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::Raster;

/// Decode a GeoTIFF file into a raster.
///
/// Reads the affine transform from the ModelPixelScale + ModelTiepoint tags
/// and the nodata sentinel from the GDAL_NODATA tag. Pixels equal to the
/// sentinel become NaN. Supports 8/16/32-bit integer and 32/64-bit float
/// samples, grayscale or RGB(A); alpha is dropped.
pub fn decode_geotiff(path: &Path) -> ChipResult<Raster> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| ChipError::Decode(format!("{}: {}", path.display(), e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| ChipError::Decode(format!("{}: {}", path.display(), e)))?;
    let (width, height) = (width as usize, height as usize);

    let samples = match decoder.colortype() {
        Ok(ColorType::Gray(_)) => 1,
        Ok(ColorType::RGB(_)) => 3,
        Ok(ColorType::RGBA(_)) => 4,
        Ok(other) => {
            return Err(ChipError::Decode(format!(
                "{}: unsupported color type {:?}",
                path.display(),
                other
            )))
        }
        Err(e) => return Err(ChipError::Decode(format!("{}: {}", path.display(), e))),
    };

    let transform = read_transform(&mut decoder)
        .ok_or_else(|| ChipError::Decode(format!("{}: missing georeferencing tags", path.display())))?;

    let nodata = decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim().trim_end_matches('\0').parse::<f32>().ok());

    let decoded = decoder
        .read_image()
        .map_err(|e| ChipError::Decode(format!("{}: {}", path.display(), e)))?;
    let raw = to_f32(decoded);

    if raw.len() != width * height * samples {
        return Err(ChipError::Decode(format!(
            "{}: sample count {} does not match {}x{}x{}",
            path.display(),
            raw.len(),
            width,
            height,
            samples
        )));
    }

    // Drop alpha, map the declared nodata sentinel to NaN.
    let bands = samples.min(3);
    let mut data = Vec::with_capacity(width * height * bands);
    for px in raw.chunks(samples) {
        for &v in &px[..bands] {
            let v = match nodata {
                Some(nd) if v == nd => f32::NAN,
                _ => v,
            };
            data.push(v);
        }
    }

    Ok(Raster {
        width,
        height,
        bands,
        data,
        transform,
    })
}

/// Build the affine transform from ModelPixelScale + ModelTiepoint.
fn read_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;
    if scale.len() < 2 || tiepoint.len() < 5 {
        return None;
    }

    // Tiepoint maps raster point (i, j) to geographic (x, y); shift back to
    // the raster origin.
    let (i, j) = (tiepoint[0], tiepoint[1]);
    let (x, y) = (tiepoint[3], tiepoint[4]);
    let (sx, sy) = (scale[0], scale[1]);

    Some(GeoTransform::north_up(x - i * sx, y + j * sy, sx, sy))
}

fn to_f32(decoded: DecodingResult) -> Vec<f32> {
    match decoded {
        DecodingResult::U8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, Write};
    use tiff::encoder::{colortype, TiffEncoder};

    fn write_test_geotiff(
        path: &Path,
        width: u32,
        height: u32,
        data: &[u16],
        nodata: Option<&str>,
    ) {
        let mut file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(&mut file).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray16>(width, height)
            .unwrap();
        // 0.01-degree pixels anchored at (-41.65, -12.10)
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[0.01, 0.01, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ModelTiepointTag,
                &[0.0, 0.0, 0.0, -41.65, -12.10, 0.0][..],
            )
            .unwrap();
        if let Some(nd) = nodata {
            image
                .encoder()
                .write_tag(Tag::GdalNodata, nd)
                .unwrap();
        }
        image.write_data(data).unwrap();
        file.flush().unwrap();
        file.rewind().unwrap();
    }

    #[test]
    fn test_decode_gray16_geotiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.tif");
        let data: Vec<u16> = (0..64).collect();
        write_test_geotiff(&path, 8, 8, &data, None);

        let raster = decode_geotiff(&path).unwrap();
        assert_eq!((raster.width, raster.height, raster.bands), (8, 8, 1));
        assert_eq!(raster.sample(0, 0, 0), 0.0);
        assert_eq!(raster.sample(7, 7, 0), 63.0);
        assert!((raster.transform.origin_x - -41.65).abs() < 1e-9);
        assert!((raster.transform.origin_y - -12.10).abs() < 1e-9);
        assert!((raster.transform.pixel_width - 0.01).abs() < 1e-12);
        assert!((raster.transform.pixel_height - -0.01).abs() < 1e-12);
    }

    #[test]
    fn test_decode_maps_nodata_to_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodata.tif");
        let mut data: Vec<u16> = (0..64).collect();
        data[0] = 9999;
        write_test_geotiff(&path, 8, 8, &data, Some("9999"));

        let raster = decode_geotiff(&path).unwrap();
        assert!(raster.sample(0, 0, 0).is_nan());
        assert_eq!(raster.sample(1, 0, 0), 1.0);
    }

    #[test]
    fn test_missing_georeferencing_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        let mut file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(&mut file).unwrap();
        encoder
            .write_image::<colortype::Gray16>(4, 4, &(0..16).collect::<Vec<u16>>())
            .unwrap();
        drop(file);

        let err = decode_geotiff(&path).unwrap_err();
        assert!(matches!(err, ChipError::Decode(msg) if msg.contains("georeferencing")));
    }
}
