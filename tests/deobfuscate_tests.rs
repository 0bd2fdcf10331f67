//! Deobfuscation through real filter processes. Unix only: the filters are
//! `sed` and `sh`.

#![cfg(unix)]

mod common;

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use common::session_with_filter;
use stacknav::{BufferContext, FilterError, NoPrompt, Prompter, SourceSelector, TraceError};

const OBFUSCATED: &str = "\
java.lang.NullPointerException
\tat a.a.b(SourceFile:10)
\tat a.c.d(SourceFile:20)
\tat a.e.f(SourceFile:30)
";

fn mapping_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create mapping file");
    file.write_all(contents.as_bytes()).expect("write mapping file");
    file
}

/// Hands out one fixed path for every file prompt.
struct FilePrompter(PathBuf);

#[async_trait]
impl Prompter for FilePrompter {
    async fn select(&self, _title: &str, _items: &[String]) -> Option<usize> {
        None
    }

    async fn input(&self, _prompt: &str) -> Option<String> {
        None
    }

    async fn pick_file(&self, _prompt: &str) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

#[tokio::test]
async fn test_sed_mapping_rewrites_frames_and_keeps_cursor() {
    let mapping = mapping_file(
        "s/a\\.a\\.b(SourceFile/com.example.Cache.lookup(Cache.java/\n\
         s/a\\.c\\.d(SourceFile/com.example.Store.get(Store.java/\n",
    );
    let mut session = session_with_filter("sed", &["-f", "{mapping}"]);
    let ctx = BufferContext::new(OBFUSCATED, 3);
    session.load(&SourceSelector::Cursor, &ctx).unwrap();
    assert_eq!(session.navigator().cursor().unwrap(), 2);

    let count = session
        .deobfuscate(Some(mapping.path()), &NoPrompt)
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(
        session.serialize().unwrap(),
        "at com.example.Cache.lookup(Cache.java:10)\n\
         at com.example.Store.get(Store.java:20)\n\
         at a.e.f(SourceFile:30)\n"
    );
    assert_eq!(session.navigator().cursor().unwrap(), 2);
}

#[tokio::test]
async fn test_changed_frame_count_resets_cursor() {
    let mut session = session_with_filter(
        "sh",
        &["-c", "cat; echo 'at x.Extra.run(Extra.java:1)'", "{mapping}"],
    );
    session
        .load(&SourceSelector::Cursor, &BufferContext::new(OBFUSCATED, 4))
        .unwrap();
    assert_eq!(session.navigator().cursor().unwrap(), 3);

    let count = session
        .deobfuscate(Some(mapping_file("").path()), &NoPrompt)
        .await
        .unwrap();
    assert_eq!(count, 4);
    assert_eq!(session.navigator().cursor().unwrap(), 1);
}

#[tokio::test]
async fn test_empty_output_keeps_obfuscated_trace() {
    let mut session = session_with_filter("sh", &["-c", "cat > /dev/null", "{mapping}"]);
    session.load_text(OBFUSCATED).unwrap();
    let before = session.serialize().unwrap();

    let err = session
        .deobfuscate(Some(mapping_file("").path()), &NoPrompt)
        .await
        .unwrap_err();
    assert!(matches!(err, TraceError::Filter(FilterError::EmptyOutput)));
    assert_eq!(session.serialize().unwrap(), before);
}

#[tokio::test]
async fn test_unparseable_output_is_rejected() {
    let mut session = session_with_filter("sh", &["-c", "echo 'mapping failed'", "{mapping}"]);
    session.load_text(OBFUSCATED).unwrap();
    let err = session
        .deobfuscate(Some(mapping_file("").path()), &NoPrompt)
        .await
        .unwrap_err();
    assert!(matches!(err, TraceError::Filter(FilterError::Unparseable)));
    assert_eq!(session.navigator().len(), 3);
}

#[tokio::test]
async fn test_mapping_is_prompted_for() {
    let mapping = mapping_file("s/a\\.e\\.f/com.example.Main.main/\n");
    let mut session = session_with_filter("sed", &["-f", "{mapping}"]);
    session.load_text(OBFUSCATED).unwrap();

    let err = session.deobfuscate(None, &NoPrompt).await.unwrap_err();
    assert!(matches!(err, TraceError::Cancelled));

    let prompter = FilePrompter(mapping.path().to_path_buf());
    session.deobfuscate(None, &prompter).await.unwrap();
    assert!(
        session
            .serialize()
            .unwrap()
            .ends_with("at com.example.Main.main(SourceFile:30)\n")
    );
}
