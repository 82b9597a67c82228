//! One bad archive never stops the others.

mod common;

use common::{tar_bytes, write_archive, zip_bytes, Member};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use unz::{
    Action, ArchiveState, Driver, Error, Extractor, Lister, MemoryReporter, Reporter, Scope,
};

/// Deletes `root` as soon as the first written path is reported.
struct RemoveRootAfterFirstFile {
    root: PathBuf,
    inner: MemoryReporter,
}

impl Reporter for RemoveRootAfterFirstFile {
    fn line(&mut self, text: &str) {
        self.inner.line(text);
        if text.ends_with("/a.txt") && self.root.exists() {
            fs::remove_dir_all(&self.root).unwrap();
        }
    }

    fn problem(&mut self, archive: &Path, error: &Error) {
        self.inner.problem(archive, error);
    }
}

#[test]
fn test_corrupt_first_archive_does_not_block_second() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let bad = write_archive(src.path(), "bad.zip", b"definitely not a zip");
    let tar = tar_bytes(&[Member::File("a.txt", b"a"), Member::File("b.txt", b"b")]);
    let good = write_archive(src.path(), "good.tar", &tar);

    let driver = Driver::new(Action::Extract(Extractor::new(dest.path()).unwrap()));
    let mut reporter = MemoryReporter::new();
    let summary = driver.run(&[bad.clone(), good], &mut reporter);

    assert_eq!(summary.states, vec![ArchiveState::FailedOpen, ArchiveState::Done]);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.success());
    assert_eq!(fs::read_to_string(dest.path().join("good/a.txt")).unwrap(), "a");
    assert_eq!(fs::read_to_string(dest.path().join("good/b.txt")).unwrap(), "b");

    assert_eq!(reporter.problems.len(), 1);
    assert_eq!(reporter.problems[0].archive, bad);
    assert_eq!(reporter.problems[0].scope, Scope::Archive);
}

#[test]
fn test_all_good_is_success() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let one = write_archive(src.path(), "one.zip", &zip_bytes(&[Member::File("1.txt", b"1")]));
    let empty = write_archive(src.path(), "empty.tar", &tar_bytes(&[]));

    let driver = Driver::new(Action::Extract(Extractor::new(dest.path()).unwrap()));
    let summary = driver.run(&[one, empty], &mut MemoryReporter::new());

    assert_eq!(summary.states, vec![ArchiveState::Done, ArchiveState::SkippedEmpty]);
    assert!(summary.success());
    assert!(dest.path().join("1.txt").is_file());
}

#[test]
fn test_collision_is_a_plan_failure() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let zip = zip_bytes(&[Member::File("a.txt", b"a"), Member::File("b.txt", b"b")]);
    let archive = write_archive(src.path(), "taken.zip", &zip);
    fs::create_dir(dest.path().join("taken")).unwrap();

    let driver = Driver::new(Action::Extract(Extractor::new(dest.path()).unwrap()));
    let mut reporter = MemoryReporter::new();
    let summary = driver.run(&[archive], &mut reporter);

    assert_eq!(summary.states, vec![ArchiveState::FailedPlan]);
    assert!(reporter.has_problem("already exists"));
}

#[test]
fn test_list_mode_isolates_failures() {
    let src = tempdir().unwrap();
    let missing = src.path().join("missing.tar");
    let good = write_archive(src.path(), "good.zip", &zip_bytes(&[Member::File("x", b"x")]));

    let driver = Driver::new(Action::List(Lister::new()));
    let mut reporter = MemoryReporter::new();
    let summary = driver.run(&[missing, good.clone()], &mut reporter);

    assert_eq!(summary.states, vec![ArchiveState::FailedOpen, ArchiveState::Done]);
    assert_eq!(reporter.lines, vec![good.display().to_string(), "x".to_string()]);
}

#[test]
fn test_unreadable_tar_is_not_empty() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let junk = write_archive(src.path(), "junk.tar", &[0x5a; 2048]);

    let extractor = Extractor::new(dest.path()).unwrap().verbose(true);
    let driver = Driver::new(Action::Extract(extractor));
    let mut reporter = MemoryReporter::new();
    let summary = driver.run(&[junk], &mut reporter);

    assert_eq!(summary.states, vec![ArchiveState::FailedOpen]);
    assert!(!summary.success());
    assert!(reporter.lines.iter().all(|l| !l.contains("no members")));
    assert!(reporter.has_problem("no member could be read"));
    assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
}

#[test]
fn test_vanished_destination_abandons_archive() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let tar = tar_bytes(&[
        Member::File("a.txt", b"a"),
        Member::File("b.txt", b"b"),
        Member::File("c.txt", b"c"),
    ]);
    let archive = write_archive(src.path(), "bundle.tar", &tar);
    let later = write_archive(
        src.path(),
        "later.zip",
        &zip_bytes(&[Member::File("later.txt", b"ok")]),
    );

    let extractor = Extractor::new(dest.path()).unwrap().verbose(true);
    let driver = Driver::new(Action::Extract(extractor));
    let mut reporter = RemoveRootAfterFirstFile {
        root: dest.path().join("bundle"),
        inner: MemoryReporter::new(),
    };
    let summary = driver.run(&[archive, later], &mut reporter);

    assert_eq!(summary.states, vec![ArchiveState::Abandoned, ArchiveState::Done]);
    assert!(!summary.success());
    assert!(!dest.path().join("bundle").exists());
    assert!(reporter.inner.has_problem("destination root is gone"));
    assert!(!reporter.inner.lines.iter().any(|l| l.ends_with("/b.txt")));
    assert!(dest.path().join("later.txt").is_file());
}
