use std::fs;
use std::io::Write;
use std::path::Path;

use digit_sweep::mnist::{inflate_to, TEST_IMAGES, TEST_LABELS, TRAIN_IMAGES, TRAIN_LABELS};
use digit_sweep::MnistLoader;
use flate2::write::GzEncoder;
use flate2::Compression;

fn images_file(count: u32, pixels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in [2051u32, count, 2, 2] {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes.extend_from_slice(pixels);
    bytes
}

fn labels_file(labels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in [2049u32, labels.len() as u32] {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes.extend_from_slice(labels);
    bytes
}

fn write_cache(root: &Path) {
    fs::write(root.join(TRAIN_IMAGES), images_file(3, &[0, 255, 0, 255, 10, 20, 30, 40, 255, 255, 255, 255])).unwrap();
    fs::write(root.join(TRAIN_LABELS), labels_file(&[1, 0, 9])).unwrap();
    fs::write(root.join(TEST_IMAGES), images_file(1, &[1, 2, 3, 4])).unwrap();
    fs::write(root.join(TEST_LABELS), labels_file(&[8])).unwrap();
}

#[test]
fn test_load_from_cache_without_network() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path());

    // an unroutable mirror proves nothing is downloaded
    let mnist = MnistLoader::new(dir.path())
        .with_mirror("http://127.0.0.1:9")
        .load()
        .unwrap();

    assert_eq!(mnist.train.len(), 3);
    assert_eq!(mnist.train.feature_size(), 4);
    assert_eq!(mnist.train.labels, vec![1, 0, 9]);
    assert_eq!(mnist.train.images[[0, 1]], 1.0);
    assert_eq!(mnist.train.images[[2, 3]], 1.0);
    assert_eq!(mnist.test.labels, vec![8]);
}

#[test]
fn test_mismatched_counts_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path());
    fs::write(dir.path().join(TRAIN_LABELS), labels_file(&[1, 0])).unwrap();

    let err = MnistLoader::new(dir.path()).load().unwrap_err();
    assert_eq!(err.to_string(), "3 images but 2 labels");
}

#[test]
fn test_inflate_gzip_into_cache() {
    let dir = tempfile::tempdir().unwrap();
    let payload = labels_file(&[4, 2]);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload).unwrap();
    let compressed = encoder.finish().unwrap();

    let target = dir.path().join(TEST_LABELS);
    inflate_to(compressed.as_slice(), &target).unwrap();

    assert_eq!(fs::read(&target).unwrap(), payload);
    assert!(!target.with_extension("part").exists());
}
