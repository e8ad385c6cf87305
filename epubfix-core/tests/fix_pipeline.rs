//! End-to-end fix and check runs over a fixture package on disk.

use camino::{Utf8Path, Utf8PathBuf};
use epubfix_core::adapters::{FsIssueSource, FsPackageSource, FsWritePort};
use epubfix_core::pipeline::{
    run_check, run_fix, write_check_artifacts, write_fix_artifacts, write_modified_documents,
};
use epubfix_core::settings::{CheckSettings, FixSettings};
use epubfix_core::NullSink;
use epubfix_types::report::ToolInfo;
use fs_err as fs;

const CONTAINER: &str = concat!(
    "<?xml version=\"1.0\"?>\n",
    "<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n",
    "<rootfiles><rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/></rootfiles>\n",
    "</container>\n"
);

const OPF: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\">\n",
    "<metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n",
    "<dc:title>Fixture Book</dc:title>\n",
    "<dc:language>fr</dc:language>\n",
    "</metadata>\n",
    "<manifest>\n",
    "<item id=\"c1\" href=\"ch1.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
    "<item id=\"c2\" href=\"ch2.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
    "</manifest>\n",
    "<spine><itemref idref=\"c1\"/><itemref idref=\"c2\"/></spine>\n",
    "</package>\n"
);

const CH1: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<html xmlns=\"http://www.w3.org/1999/xhtml\">\n",
    "<head><title>One</title></head>\n",
    "<body><img src=\"fig.png\"/></body>\n",
    "</html>\n"
);

const CH2: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"fr\" xml:lang=\"fr\">\n",
    "<head><title>Two</title></head>\n",
    "<body><p>ok</p></body>\n",
    "</html>\n"
);

const REPORT: &str = r#"{
  "validator": {"name": "fixture-checker", "version": "1.0"},
  "issues": [
    {"code": "html-has-lang", "message": "<html> element must have a lang attribute",
     "severity": "warning", "fixable": true, "location": {"file": "ch1.xhtml"}},
    {"code": "image-alt", "message": "images must have alternate text",
     "severity": "error", "fixable": true, "location": {"file": "ch1.xhtml"}},
    {"code": "image-alt", "message": "images must have alternate text",
     "severity": "error", "fixable": true, "location": {"file": "ch1.xhtml"}},
    {"code": "unknown-defect", "message": "nobody handles this",
     "severity": "warning", "fixable": true, "location": {"file": "ch2.xhtml"}}
  ]
}"#;

fn write_fixture(root: &Utf8Path) {
    fs::create_dir_all(root.join("package/META-INF").as_std_path()).expect("mkdir");
    fs::create_dir_all(root.join("package/OEBPS").as_std_path()).expect("mkdir");
    fs::create_dir_all(root.join("reports").as_std_path()).expect("mkdir");
    fs::write(
        root.join("package/mimetype").as_std_path(),
        "application/epub+zip",
    )
    .expect("write");
    fs::write(
        root.join("package/META-INF/container.xml").as_std_path(),
        CONTAINER,
    )
    .expect("write");
    fs::write(root.join("package/OEBPS/content.opf").as_std_path(), OPF).expect("write");
    fs::write(root.join("package/OEBPS/ch1.xhtml").as_std_path(), CH1).expect("write");
    fs::write(root.join("package/OEBPS/ch2.xhtml").as_std_path(), CH2).expect("write");
    fs::write(root.join("reports/checker.json").as_std_path(), REPORT).expect("write");
}

fn tempdir_utf8() -> (tempfile::TempDir, Utf8PathBuf) {
    let td = tempfile::tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf8 tempdir");
    (td, path)
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: "epubfix".to_string(),
        version: "test".to_string(),
    }
}

fn fix_settings(root: &Utf8Path) -> FixSettings {
    FixSettings {
        package_dir: root.join("package"),
        reports_dir: root.join("reports"),
        out_dir: root.join("out"),
        ..FixSettings::default()
    }
}

#[test]
fn fix_run_repairs_documents_and_writes_artifacts() {
    let (_td, root) = tempdir_utf8();
    write_fixture(&root);
    let settings = fix_settings(&root);

    let package = FsPackageSource::new(settings.package_dir.clone());
    let issues = FsIssueSource::new(settings.reports_dir.clone());
    let outcome = run_fix(&settings, &package, &issues, &NullSink, tool()).expect("run");

    // lang + first image-alt succeed, the duplicate image-alt propagates,
    // the unknown code fails to dispatch.
    assert_eq!(outcome.results.len(), 3);
    assert_eq!(outcome.results.iter().filter(|r| r.success).count(), 2);
    assert_eq!(outcome.report.summary.fixed, 3);
    assert_eq!(outcome.report.summary.unfixable, 1);
    assert_eq!(outcome.report.summary.files_modified, 1);
    assert!(
        !outcome.unresolved_errors,
        "both error-severity reports are fixed"
    );

    let post = outcome.report.post_validation.as_ref().expect("post");
    assert_eq!(post.validated_files, vec!["OEBPS/ch1.xhtml"]);
    assert!(post.errors.is_empty());

    assert!(outcome.patch.contains("diff --git a/OEBPS/ch1.xhtml b/OEBPS/ch1.xhtml"));
    assert!(outcome.patch.contains("+"));

    let writer = FsWritePort;
    write_fix_artifacts(&outcome, &settings.out_dir, &writer).expect("artifacts");
    let written =
        write_modified_documents(&outcome.context, &settings.package_dir, &writer).expect("persist");
    assert_eq!(written, 1);

    for artifact in ["fixes.json", "fixes.md", "patch.diff"] {
        assert!(settings.out_dir.join(artifact).exists(), "{artifact} missing");
    }

    let repaired =
        fs::read_to_string(settings.package_dir.join("OEBPS/ch1.xhtml").as_std_path())
            .expect("read repaired");
    assert!(repaired.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(repaired.contains("lang=\"fr\""));
    assert!(repaired.contains("alt=\"\""));
    // The untouched sibling keeps its bytes.
    let untouched =
        fs::read_to_string(settings.package_dir.join("OEBPS/ch2.xhtml").as_std_path())
            .expect("read untouched");
    assert_eq!(untouched, CH2);
}

#[test]
fn second_fix_run_is_idempotent_on_disk() {
    let (_td, root) = tempdir_utf8();
    write_fixture(&root);
    let settings = fix_settings(&root);
    let writer = FsWritePort;

    let package = FsPackageSource::new(settings.package_dir.clone());
    let issues = FsIssueSource::new(settings.reports_dir.clone());

    let first = run_fix(&settings, &package, &issues, &NullSink, tool()).expect("first");
    write_modified_documents(&first.context, &settings.package_dir, &writer).expect("persist");
    let repaired_once =
        fs::read_to_string(settings.package_dir.join("OEBPS/ch1.xhtml").as_std_path())
            .expect("read");

    // The reports still list the issues, but the documents are conformant
    // now: every attempt reports "nothing to change".
    let second = run_fix(&settings, &package, &issues, &NullSink, tool()).expect("second");
    assert_eq!(second.results.iter().filter(|r| r.success).count(), 0);
    assert_eq!(second.report.summary.files_modified, 0);
    assert_eq!(
        write_modified_documents(&second.context, &settings.package_dir, &writer).expect("persist"),
        0
    );

    let repaired_twice =
        fs::read_to_string(settings.package_dir.join("OEBPS/ch1.xhtml").as_std_path())
            .expect("read");
    assert_eq!(repaired_once, repaired_twice);
}

#[test]
fn deny_pattern_blocks_a_strategy() {
    let (_td, root) = tempdir_utf8();
    write_fixture(&root);
    let mut settings = fix_settings(&root);
    settings.deny = vec!["image-alt".to_string()];

    let package = FsPackageSource::new(settings.package_dir.clone());
    let issues = FsIssueSource::new(settings.reports_dir.clone());
    let outcome = run_fix(&settings, &package, &issues, &NullSink, tool()).expect("run");

    assert!(
        outcome
            .results
            .iter()
            .filter(|r| r.success)
            .all(|r| r.strategy != "image-alt")
    );
    assert!(
        outcome.unresolved_errors,
        "denied error-severity issues stay unresolved"
    );
}

#[test]
fn check_run_partitions_without_touching_the_package() {
    let (_td, root) = tempdir_utf8();
    write_fixture(&root);
    let settings = CheckSettings {
        package_dir: root.join("package"),
        reports_dir: root.join("reports"),
        out_dir: root.join("out"),
        ..CheckSettings::default()
    };

    let package = FsPackageSource::new(settings.package_dir.clone());
    let issues = FsIssueSource::new(settings.reports_dir.clone());
    let outcome = run_check(&settings, &package, &issues, tool()).expect("run");

    assert_eq!(outcome.partition.fixable.len(), 3);
    assert_eq!(outcome.partition.unfixable.len(), 1);
    assert_eq!(outcome.partition.unfixable[0].code, "unknown-defect");
    assert!(!outcome.unresolved_errors);

    let assigned: Vec<&str> = outcome
        .partition
        .fixable
        .iter()
        .map(|a| a.strategy.as_str())
        .collect();
    assert_eq!(assigned, vec!["document-language", "image-alt", "image-alt"]);

    write_check_artifacts(&outcome, &settings.out_dir, &FsWritePort).expect("artifacts");
    assert!(settings.out_dir.join("check.json").exists());
    assert!(settings.out_dir.join("check.md").exists());

    // Check never rewrites package members.
    let chapter =
        fs::read_to_string(settings.package_dir.join("OEBPS/ch1.xhtml").as_std_path())
            .expect("read");
    assert_eq!(chapter, CH1);
}
