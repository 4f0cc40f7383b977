mod common;

use common::{entry, listing, spawn_site, widget, Routes};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn ebookscrape(workdir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ebookscrape");
    cmd.current_dir(workdir)
        .env("XDG_CONFIG_HOME", workdir)
        .env("HOME", workdir)
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("collect").and(predicate::str::contains("topics")));
}

#[test]
fn missing_output_directory_is_input_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["collect", "fiction", "-o", "no/such/dir/out.csv"])
        .args(["--base-url", "http://127.0.0.1:9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("parent directory does not exist"));
}

#[test]
fn bad_slug_exits_with_input_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["subjects", "fic tion", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .code(1);
}

#[test]
fn subjects_print_label_and_slug() {
    let site = spawn_site(Routes::new().page(
        "/en-us/subjects/fiction/",
        widget("subject", &[("Mystery & Detective", "/en-us/subjects/fiction/mystery/")]),
    ));
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["subjects", "fiction", "--base-url", &site.base_url, "--delay", "0"])
        .assert()
        .success()
        .stdout("Mystery & Detective\tmystery\n");
}

#[test]
fn empty_topics_message_is_not_a_failure() {
    let site = spawn_site(
        Routes::new().page("/en-us/subjects/fiction/romance/", widget("topic", &[])),
    );
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["topics", "fiction", "romance", "--base-url", &site.base_url, "--delay", "0"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains(
            "No topics for romance; collect with the subject alone.",
        ));
}

#[test]
fn collect_writes_csv_to_default_path() {
    let base = "/en-us/subjects/fiction/mystery/";
    let site = spawn_site(
        Routes::new()
            .page(
                &format!("{base}?page=1"),
                listing(
                    &[entry("Murder, Mostly", "Ann Lee", "/en-us/book/1/murder/")],
                    Some("?page=2"),
                ),
            )
            .page(
                &format!("{base}?page=2"),
                listing(&[entry("Quiet Night", "Bo Park", "/en-us/book/2/quiet/")], None),
            ),
    );
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["collect", "fiction", "mystery", "--base-url", &site.base_url, "--delay", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 2 books"));

    let csv = fs::read_to_string(dir.path().join("fiction-mystery.csv")).expect("output written");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "title,author,format,price,rating,url");
    assert_eq!(
        lines[1],
        format!(
            "\"Murder, Mostly\",Ann Lee,EPUB,$9.99,4.5,{}/en-us/book/1/murder/",
            site.base_url
        )
    );
    assert!(lines[2].starts_with("Quiet Night,Bo Park,"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn keep_partial_writes_rows_and_exits_with_scrape_code() {
    let base = "/en-us/subjects/fiction/";
    let site = spawn_site(Routes::new().page(
        &format!("{base}?page=1"),
        listing(&[entry("Only One", "Cy Moss", "/en-us/book/3/one/")], Some("?page=2")),
    ));
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["collect", "fiction", "-o", "partial.json", "--format", "json"])
        .args(["--keep-partial", "--base-url", &site.base_url, "--delay", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stopped at page 2"));

    let json = fs::read_to_string(dir.path().join("partial.json")).expect("partial written");
    let rows: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["title"], "Only One");
}

#[test]
fn page_cap_is_reported_after_writing() {
    let base = "/en-us/subjects/fiction/";
    let site = spawn_site(
        Routes::new()
            .page(
                &format!("{base}?page=1"),
                listing(&[entry("First", "Di Ray", "/en-us/book/4/first/")], Some("?page=2")),
            )
            .page(
                &format!("{base}?page=2"),
                listing(&[entry("Second", "Ed Fox", "/en-us/book/5/second/")], None),
            ),
    );
    let dir = tempfile::tempdir().expect("tempdir");
    ebookscrape(dir.path())
        .args(["collect", "fiction", "--max-pages", "1"])
        .args(["--base-url", &site.base_url, "--delay", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Stopped at the 1-page cap"));

    let csv = fs::read_to_string(dir.path().join("fiction.csv")).expect("output written");
    assert_eq!(csv.lines().count(), 2);
    assert_eq!(site.requests().len(), 1);
}
