use std::fs;

use quote_client::{ensure_output_dir, ArtifactWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("exports");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn rewriting_an_export_replaces_it() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path());

    let first = writer.write("BOM-J1.pdf", b"%PDF-1").unwrap();
    assert_eq!(first.file_name().unwrap(), "BOM-J1.pdf");
    assert_eq!(fs::read(&first).unwrap(), b"%PDF-1");

    let second = writer.write("BOM-J1.pdf", b"%PDF-2").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"%PDF-2");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn explicit_path_creates_its_parent() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("reports").join("q3.csv");

    let written = ArtifactWriter::write_to(&target, b"url,quantity\n").unwrap();
    assert_eq!(written, target);
    assert_eq!(fs::read_to_string(&target).unwrap(), "url,quantity\n");
}

#[test]
fn file_in_place_of_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let writer = ArtifactWriter::new(blocker.clone());
    let result = writer.write("bom-J1.csv", b"data");
    assert!(matches!(result, Err(PersistError::OutputDir(_))));
    assert!(!blocker.with_file_name("bom-J1.csv").exists());
}

#[test]
fn explicit_path_needs_a_file_name() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("reports").join("..");

    let result = ArtifactWriter::write_to(&target, b"data");
    assert!(matches!(result, Err(PersistError::OutputDir(_))));
    assert!(!temp.path().join("reports").exists());
}
