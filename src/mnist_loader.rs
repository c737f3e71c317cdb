use byteorder::BigEndian;
use byteorder::ReadBytesExt;
use flate2::read::GzDecoder;
use std::{
    fs::File,
    io::{BufReader, Cursor, Read},
    path::Path,
};
use tracing::info;

use crate::error::DatasetError;
use crate::network::Example;

const LABEL_MAGIC: i32 = 2049;
const IMAGE_MAGIC: i32 = 2051;

/// How raw pixel bytes are turned into features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PixelScale {
    /// Intensities as read, 0 to 255.
    #[default]
    Raw,
    /// Intensities divided by 255.
    Unit,
}

impl PixelScale {
    fn apply(self, pixel: u8) -> f64 {
        match self {
            PixelScale::Raw => pixel as f64,
            PixelScale::Unit => pixel as f64 / 255.,
        }
    }
}

#[derive(Debug)]
struct MNISTRawData {
    sizes: Vec<usize>,
    data: Vec<u8>,
}

impl MNISTRawData {
    /// Decompresses and decodes one IDX file whose magic must be `magic`.
    fn new<R: Read>(reader: R, magic: i32) -> Result<MNISTRawData, DatasetError> {
        let mut gz = GzDecoder::new(reader);
        let mut contents: Vec<u8> = Vec::new();
        gz.read_to_end(&mut contents)?;
        let mut r = Cursor::new(&contents);

        let magic_number = r.read_i32::<BigEndian>()?;
        if magic_number != magic {
            return Err(DatasetError::BadMagic {
                expected: magic,
                actual: magic_number,
            });
        }
        let dimensions = if magic == IMAGE_MAGIC { 3 } else { 1 };

        let mut sizes: Vec<usize> = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            let size = r.read_i32::<BigEndian>()?;
            let size =
                usize::try_from(size).map_err(|_| DatasetError::NegativeDimension(size))?;
            sizes.push(size);
        }

        let expected = sizes
            .iter()
            .try_fold(1usize, |total, &size| total.checked_mul(size))
            .ok_or_else(|| DatasetError::DimensionOverflow(sizes.clone()))?;
        let mut data: Vec<u8> = Vec::new();
        r.read_to_end(&mut data)?;
        if data.len() < expected {
            return Err(DatasetError::Truncated {
                expected,
                actual: data.len(),
            });
        }
        data.truncate(expected);

        Ok(MNISTRawData { sizes, data })
    }
}

/// Decodes a pair of gzip-compressed IDX streams into labelled examples.
/// Feature `i` of record `k` is pixel byte `k * rows * cols + i`.
pub fn decode<I: Read, L: Read>(
    images: I,
    labels: L,
    scale: PixelScale,
) -> Result<Vec<Example>, DatasetError> {
    let images_data = MNISTRawData::new(images, IMAGE_MAGIC)?;
    let label_data = MNISTRawData::new(labels, LABEL_MAGIC)?;
    if images_data.sizes[0] != label_data.sizes[0] {
        return Err(DatasetError::CountMismatch {
            images: images_data.sizes[0],
            labels: label_data.sizes[0],
        });
    }

    let image_shape = images_data.sizes[1]
        .checked_mul(images_data.sizes[2])
        .ok_or_else(|| DatasetError::DimensionOverflow(images_data.sizes.clone()))?;
    let examples = label_data
        .data
        .iter()
        .enumerate()
        .map(|(k, &label)| {
            let start = k * image_shape;
            let features = images_data.data[start..start + image_shape]
                .iter()
                .map(|&pixel| scale.apply(pixel))
                .collect();
            Example::new(features, label as i64)
        })
        .collect();
    Ok(examples)
}

/// Loads `{dataset_name}-images-idx3-ubyte.gz` and
/// `{dataset_name}-labels-idx1-ubyte.gz` from `dir`.
pub fn load_data(
    dir: &Path,
    dataset_name: &str,
    scale: PixelScale,
) -> Result<Vec<Example>, DatasetError> {
    let images = File::open(dir.join(format!("{}-images-idx3-ubyte.gz", dataset_name)))?;
    let labels = File::open(dir.join(format!("{}-labels-idx1-ubyte.gz", dataset_name)))?;
    let examples = decode(BufReader::new(images), BufReader::new(labels), scale)?;

    info!(
        name = dataset_name,
        records = examples.len(),
        features = examples.first().map_or(0, |e| e.features.len()),
        "loaded dataset"
    );
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(header: &[i32], body: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for value in header {
            encoder.write_i32::<BigEndian>(*value).unwrap();
        }
        encoder.write_all(body).unwrap();
        encoder.finish().unwrap()
    }

    fn images(count: i32, pixels: &[u8]) -> Vec<u8> {
        gzip(&[IMAGE_MAGIC, count, 2, 2], pixels)
    }

    #[test]
    fn decodes_images_and_labels() {
        let pixels = [0, 255, 10, 20, 1, 2, 3, 4];
        let examples = decode(
            Cursor::new(images(2, &pixels)),
            Cursor::new(gzip(&[LABEL_MAGIC, 2], &[7, 3])),
            PixelScale::Raw,
        )
        .unwrap();

        assert_eq!(
            examples,
            vec![
                Example::new(vec![0.0, 255.0, 10.0, 20.0], 7),
                Example::new(vec![1.0, 2.0, 3.0, 4.0], 3),
            ]
        );
    }

    #[test]
    fn unit_scale_divides_by_255() {
        let examples = decode(
            Cursor::new(images(1, &[0, 255, 51, 102])),
            Cursor::new(gzip(&[LABEL_MAGIC, 1], &[1])),
            PixelScale::Unit,
        )
        .unwrap();
        assert_eq!(examples[0].features, vec![0.0, 1.0, 0.2, 0.4]);
    }

    #[test]
    fn rejects_swapped_files() {
        let result = decode(
            Cursor::new(gzip(&[LABEL_MAGIC, 1], &[1])),
            Cursor::new(images(1, &[0, 0, 0, 0])),
            PixelScale::Raw,
        );
        assert!(matches!(
            result,
            Err(DatasetError::BadMagic {
                expected: IMAGE_MAGIC,
                actual: LABEL_MAGIC
            })
        ));
    }

    #[test]
    fn rejects_truncated_body() {
        let result = decode(
            Cursor::new(images(2, &[1, 2, 3])),
            Cursor::new(gzip(&[LABEL_MAGIC, 2], &[0, 1])),
            PixelScale::Raw,
        );
        assert!(matches!(
            result,
            Err(DatasetError::Truncated {
                expected: 8,
                actual: 3
            })
        ));
    }

    #[test]
    fn rejects_count_mismatch() {
        let result = decode(
            Cursor::new(images(1, &[1, 2, 3, 4])),
            Cursor::new(gzip(&[LABEL_MAGIC, 2], &[0, 1])),
            PixelScale::Raw,
        );
        assert!(matches!(
            result,
            Err(DatasetError::CountMismatch {
                images: 1,
                labels: 2
            })
        ));
    }

    #[test]
    fn huge_header_without_body_is_truncated() {
        let result = decode(
            Cursor::new(gzip(&[IMAGE_MAGIC, i32::MAX, i32::MAX, 1], &[])),
            Cursor::new(gzip(&[LABEL_MAGIC, 0], &[])),
            PixelScale::Raw,
        );
        assert!(matches!(
            result,
            Err(DatasetError::Truncated { actual: 0, .. })
        ));
    }

    #[test]
    fn overflowing_header_is_rejected() {
        let result = decode(
            Cursor::new(gzip(&[IMAGE_MAGIC, i32::MAX, i32::MAX, i32::MAX], &[])),
            Cursor::new(gzip(&[LABEL_MAGIC, 0], &[])),
            PixelScale::Raw,
        );
        assert!(matches!(result, Err(DatasetError::DimensionOverflow(_))));
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let result = load_data(Path::new("does/not/exist"), "train", PixelScale::Raw);
        assert!(matches!(result, Err(DatasetError::Io(_))));
    }
}
