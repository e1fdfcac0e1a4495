//! MNIST download, caching and IDX decoding.
//!
//! The four published IDX files are fetched gzip-compressed from a mirror the
//! first time they are needed and cached uncompressed under the loader's root
//! directory. Later runs read straight from the cache.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use ndarray::Array2;
use tracing::info;

use crate::error::DataError;

pub const DEFAULT_MIRROR: &str = "https://ossci-datasets.s3.amazonaws.com/mnist";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

/// Labelled images, one flattened image per row, pixels scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub images: Array2<f32>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn new(images: Array2<f32>, labels: Vec<usize>) -> Result<Self, DataError> {
        if images.nrows() != labels.len() {
            return Err(DataError::CountMismatch {
                images: images.nrows(),
                labels: labels.len(),
            });
        }
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn feature_size(&self) -> usize {
        self.images.ncols()
    }
}

#[derive(Debug, Clone)]
pub struct Mnist {
    pub train: Dataset,
    pub test: Dataset,
}

#[derive(Debug, Clone)]
pub struct MnistLoader {
    root: PathBuf,
    mirror: String,
}

impl MnistLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mirror: DEFAULT_MIRROR.to_string(),
        }
    }

    pub fn with_mirror(mut self, mirror: impl Into<String>) -> Self {
        self.mirror = mirror.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self) -> Result<Mnist, DataError> {
        info!("Loading MNIST from {}", self.root.display());
        let train = self.load_split(TRAIN_IMAGES, TRAIN_LABELS)?;
        let test = self.load_split(TEST_IMAGES, TEST_LABELS)?;
        info!("MNIST loaded: {} train, {} test", train.len(), test.len());
        Ok(Mnist { train, test })
    }

    fn load_split(&self, images: &str, labels: &str) -> Result<Dataset, DataError> {
        let images_path = self.ensure_file(images)?;
        let labels_path = self.ensure_file(labels)?;
        let images = parse_images(&images_path, &read_file(&images_path)?)?;
        let labels = parse_labels(&labels_path, &read_file(&labels_path)?)?;
        Dataset::new(images, labels)
    }

    /// Returns the cached path of `name`, downloading it first if missing.
    fn ensure_file(&self, name: &str) -> Result<PathBuf, DataError> {
        let path = self.root.join(name);
        if path.exists() {
            return Ok(path);
        }

        fs::create_dir_all(&self.root).map_err(|source| DataError::Io {
            path: self.root.clone(),
            source,
        })?;

        let url = format!("{}/{}.gz", self.mirror.trim_end_matches('/'), name);
        info!("Downloading {}", url);
        let response = ureq::get(&url).call().map_err(|source| DataError::Download {
            url: url.clone(),
            source: Box::new(source),
        })?;
        inflate_to(response.into_reader(), &path)?;
        Ok(path)
    }
}

/// Decompresses a gzip stream into `path` via a `.part` file renamed on completion.
pub fn inflate_to<R: Read>(reader: R, path: &Path) -> Result<(), DataError> {
    let io_err = |source: io::Error| DataError::Io {
        path: path.to_path_buf(),
        source,
    };
    let partial = path.with_extension("part");
    let mut decoder = GzDecoder::new(reader);
    let mut out = File::create(&partial).map_err(io_err)?;
    io::copy(&mut decoder, &mut out).map_err(io_err)?;
    fs::rename(&partial, path).map_err(io_err)
}

fn read_file(path: &Path) -> Result<Vec<u8>, DataError> {
    fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_u32(path: &Path, bytes: &[u8], offset: usize) -> Result<u32, DataError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| DataError::Truncated {
            path: path.to_path_buf(),
            expected: offset + 4,
            found: bytes.len(),
        })
}

fn check_magic(path: &Path, bytes: &[u8], expected: u32) -> Result<(), DataError> {
    let found = read_u32(path, bytes, 0)?;
    if found != expected {
        return Err(DataError::BadMagic {
            path: path.to_path_buf(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Slices `len` bytes after the header. A length that overflows `usize` can
/// never be satisfied and is reported as truncation.
fn payload<'a>(path: &Path, bytes: &'a [u8], header: usize, len: Option<usize>) -> Result<&'a [u8], DataError> {
    let end = len.and_then(|len| len.checked_add(header));
    end.and_then(|end| bytes.get(header..end)).ok_or_else(|| DataError::Truncated {
        path: path.to_path_buf(),
        expected: end.unwrap_or(usize::MAX),
        found: bytes.len(),
    })
}

/// Decodes an IDX3 image file into `(count × rows*cols)` pixels in `[0, 1]`.
pub fn parse_images(path: &Path, bytes: &[u8]) -> Result<Array2<f32>, DataError> {
    check_magic(path, bytes, IMAGES_MAGIC)?;
    let count = read_u32(path, bytes, 4)? as usize;
    let rows = read_u32(path, bytes, 8)? as usize;
    let cols = read_u32(path, bytes, 12)? as usize;
    let size = rows.checked_mul(cols);

    let pixels = payload(path, bytes, 16, size.and_then(|size| size.checked_mul(count)))?;
    // payload only succeeds when `size` did not overflow
    let size = size.unwrap_or(0);
    let scaled: Vec<f32> = pixels.iter().map(|&p| p as f32 / 255.0).collect();
    Array2::from_shape_vec((count, size), scaled).map_err(|_| DataError::Truncated {
        path: path.to_path_buf(),
        expected: 16 + pixels.len(),
        found: bytes.len(),
    })
}

/// Decodes an IDX1 label file.
pub fn parse_labels(path: &Path, bytes: &[u8]) -> Result<Vec<usize>, DataError> {
    check_magic(path, bytes, LABELS_MAGIC)?;
    let count = read_u32(path, bytes, 4)? as usize;
    let labels = payload(path, bytes, 8, Some(count))?;
    Ok(labels.iter().map(|&l| l as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_images(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [IMAGES_MAGIC, count, rows, cols] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(pixels);
        bytes
    }

    #[test]
    fn test_parse_images_scales_pixels() {
        let bytes = idx_images(2, 1, 2, &[0, 255, 51, 102]);
        let images = parse_images(Path::new("img"), &bytes).unwrap();
        assert_eq!(images.dim(), (2, 2));
        assert_eq!(images[[0, 1]], 1.0);
        assert!((images[[1, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_images_truncated() {
        let bytes = idx_images(2, 2, 2, &[0; 5]);
        match parse_images(Path::new("img"), &bytes) {
            Err(DataError::Truncated { expected, found, .. }) => {
                assert_eq!(expected, 16 + 8);
                assert_eq!(found, 16 + 5);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parse_images_oversized_header() {
        let bytes = idx_images(u32::MAX, u32::MAX, u32::MAX, &[7; 8]);
        match parse_images(Path::new("img"), &bytes) {
            Err(DataError::Truncated { found, .. }) => assert_eq!(found, 24),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parse_labels_oversized_count() {
        let mut bytes = LABELS_MAGIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            parse_labels(Path::new("lbl"), &bytes),
            Err(DataError::Truncated { found: 11, .. })
        ));
    }

    #[test]
    fn test_parse_images_empty_file_has_zero_rows() {
        let bytes = idx_images(0, 28, 28, &[]);
        let images = parse_images(Path::new("img"), &bytes).unwrap();
        assert_eq!(images.dim(), (0, 784));
    }

    #[test]
    fn test_parse_labels_bad_magic() {
        let mut bytes = IMAGES_MAGIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(3);
        assert!(matches!(
            parse_labels(Path::new("lbl"), &bytes),
            Err(DataError::BadMagic { expected: LABELS_MAGIC, found: IMAGES_MAGIC, .. })
        ));
    }

    #[test]
    fn test_dataset_count_mismatch() {
        let result = Dataset::new(Array2::zeros((3, 4)), vec![1, 2]);
        assert!(matches!(result, Err(DataError::CountMismatch { images: 3, labels: 2 })));
    }
}
