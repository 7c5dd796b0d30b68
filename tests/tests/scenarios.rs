use afcache_pack_common::http_date;
use afcache_pack_tests::{Fixture, PackageContents, entry_content};
use afcache_packer::{
    config::{PackageConfig, TimestampSource},
    packager::Packager,
    report::{Event, RecordingReporter, SkipReason},
};
use anyhow::Error;
use chrono::{DateTime, TimeZone, Utc};

fn new_year_2020() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

fn package(config: PackageConfig) -> Result<(PackageContents, RecordingReporter), Error> {
    let reporter = RecordingReporter::new();
    let output_path = config.output_path.clone().unwrap();

    Packager::new(config, &reporter)?.run()?;

    Ok((PackageContents::read(&output_path)?, reporter))
}

#[test]
fn single_file_with_modification_time() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("a.txt", b"hello", Some(new_year_2020()))?;

    let (contents, _) = package(PackageConfig {
        timestamp_source: TimestampSource::FileModified,
        ..fixture.config()
    })?;

    assert_eq!(contents.entry_names, ["example.com/a.txt"]);
    assert_eq!(
        contents.manifest_text,
        "http://example.com/a.txt ; Wed, 01 Jan 2020 00:00:00 GMT+00:00 ; Wed, 01 Jan 2020 01:00:00 GMT+00:00"
    );
    assert_eq!(
        entry_content(&fixture.output_path(), "example.com/a.txt")?,
        b"hello"
    );

    Ok(())
}

#[test]
fn hidden_file_follows_include_all() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("a.txt", b"a", Some(new_year_2020()))?;
    fixture.file_write(".secret", b"s", Some(new_year_2020()))?;

    let (contents, reporter) = package(fixture.config())?;
    assert_eq!(contents.entry_names, ["example.com/a.txt"]);
    assert_eq!(contents.urls(), ["http://example.com/a.txt"]);
    assert!(reporter.events().iter().any(|event| matches!(
        event,
        Event::Skipped {
            reason: SkipReason::Hidden,
            ..
        }
    )));

    let (contents, _) = package(PackageConfig {
        include_all: true,
        sort_entries: true,
        ..fixture.config()
    })?;
    assert_eq!(
        contents.entry_names,
        ["example.com/.secret", "example.com/a.txt"]
    );
    assert_eq!(
        contents.urls(),
        ["http://example.com/.secret", "http://example.com/a.txt"]
    );

    Ok(())
}

#[test]
fn files_over_max_item_file_size_are_left_out() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("big.bin", &[0; 20], None)?;
    fixture.file_write("small.bin", &[0; 5], None)?;

    let (contents, _) = package(PackageConfig {
        max_item_file_size: Some(10),
        ..fixture.config()
    })?;

    assert_eq!(contents.entry_names, ["example.com/small.bin"]);
    assert_eq!(contents.urls(), ["http://example.com/small.bin"]);

    Ok(())
}

#[test]
fn nested_directories_use_forward_slashes() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("assets/css/style.css", b"body {}", None)?;
    fixture.file_write("assets/js/script.js", b"", None)?;
    std::fs::create_dir_all(fixture.source.path().join("empty").join("nested"))?;

    let (contents, _) = package(PackageConfig {
        base_url: Some("https://static.example.com/app/".to_owned()),
        sort_entries: true,
        ..fixture.config()
    })?;

    assert_eq!(
        contents.entry_names,
        [
            "static.example.com/assets/css/style.css",
            "static.example.com/assets/js/script.js",
        ]
    );
    assert_eq!(
        contents.urls(),
        [
            "https://static.example.com/app/assets/css/style.css",
            "https://static.example.com/app/assets/js/script.js",
        ]
    );

    Ok(())
}

#[test]
fn empty_folder_produces_empty_manifest() -> Result<(), Error> {
    let fixture = Fixture::new()?;

    let (contents, reporter) = package(fixture.config())?;

    assert!(contents.entry_names.is_empty());
    assert_eq!(contents.manifest_text, "");
    assert_eq!(
        reporter.events(),
        [Event::ManifestAdded { records: 0 }]
    );

    Ok(())
}

#[test]
fn first_matching_exclude_pattern_wins() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("index.html", b"", None)?;
    fixture.file_write("logs/today.log", b"", None)?;
    fixture.file_write("notes.md", b"", None)?;

    let (contents, reporter) = package(PackageConfig {
        exclude_patterns: vec!["*.md".to_owned(), "logs/**".to_owned(), "*.log".to_owned()],
        sort_entries: true,
        ..fixture.config()
    })?;

    assert_eq!(contents.entry_names, ["example.com/index.html"]);

    let patterns = reporter
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Skipped {
                reason: SkipReason::Excluded { pattern },
                ..
            } => Some(pattern),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(patterns, ["logs/**", "*.md"]);

    Ok(())
}

#[test]
fn mime_types_are_annotated_when_requested() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("data.json", b"{}", None)?;
    fixture.file_write("index.html", b"", None)?;
    fixture.file_write("blob.unknownext", b"", None)?;

    let (contents, _) = package(PackageConfig {
        sort_entries: true,
        ..fixture.config()
    })?;
    assert!(
        contents
            .manifest
            .records
            .iter()
            .all(|record| record.mime_type.is_none())
    );
    assert!(contents.manifest_text.lines().all(|line| line.split(" ; ").count() == 3));

    let (contents, reporter) = package(PackageConfig {
        mime_types: true,
        sort_entries: true,
        ..fixture.config()
    })?;
    let mime_types = contents
        .manifest
        .records
        .iter()
        .map(|record| record.mime_type.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(
        mime_types,
        [None, Some("application/json"), Some("text/html")]
    );
    assert_eq!(
        reporter
            .events()
            .iter()
            .filter(|event| matches!(event, Event::MimeTypeUnknown { .. }))
            .count(),
        1
    );

    Ok(())
}

#[test]
fn packaging_time_is_shared_by_all_files() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("a.txt", b"", Some(new_year_2020()))?;
    fixture.file_write("b.txt", b"", Some(new_year_2020()))?;

    let reporter = RecordingReporter::new();
    let packaging_time = Utc.with_ymd_and_hms(2031, 3, 4, 5, 6, 7).unwrap();
    let summary = Packager::new(
        PackageConfig {
            last_modified_minus: Some(7),
            ..fixture.config()
        },
        &reporter,
    )?
    .run_at(packaging_time)?;

    assert_eq!(summary.files_added(), 2);
    for record in &summary.manifest.records {
        assert_eq!(
            http_date::format(&record.last_modified),
            "Tue, 04 Mar 2031 05:06:00 GMT+00:00"
        );
        assert_eq!(
            http_date::format(&record.expires),
            "Tue, 04 Mar 2031 06:06:00 GMT+00:00"
        );
    }

    Ok(())
}

#[test]
fn invalid_configuration_leaves_no_output() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("a.txt", b"", None)?;

    let reporter = RecordingReporter::new();
    let errors = Packager::new(
        PackageConfig {
            base_url: Some("no-scheme.example.com".to_owned()),
            last_modified_plus: Some(1),
            last_modified_minus: Some(1),
            ..fixture.config()
        },
        &reporter,
    )
    .err()
    .unwrap();

    assert_eq!(errors.errors().len(), 2);
    assert!(!fixture.output_path().exists());

    Ok(())
}

#[test]
fn unwritable_output_fails_before_reading() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    fixture.file_write("a.txt", b"", None)?;

    let reporter = RecordingReporter::new();
    let result = Packager::new(
        PackageConfig {
            output_path: Some(fixture.output.path().join("missing").join("out.zip")),
            ..fixture.config()
        },
        &reporter,
    )?
    .run();

    assert!(result.is_err());
    assert!(reporter.events().is_empty());
    assert_eq!(std::fs::read_dir(fixture.output.path())?.count(), 0);

    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinked_files_are_packaged_under_link_path() -> Result<(), Error> {
    let fixture = Fixture::new()?;
    let target = fixture.file_write("real/a.txt", b"a", None)?;
    std::os::unix::fs::symlink(&target, fixture.source.path().join("link.txt"))?;

    let (contents, _) = package(PackageConfig {
        sort_entries: true,
        ..fixture.config()
    })?;
    assert_eq!(
        contents.entry_names,
        ["example.com/link.txt", "example.com/real/a.txt"]
    );
    assert_eq!(
        entry_content(&fixture.output_path(), "example.com/link.txt")?,
        b"a"
    );

    let (contents, reporter) = package(PackageConfig {
        follow_links: false,
        ..fixture.config()
    })?;
    assert_eq!(contents.entry_names, ["example.com/real/a.txt"]);
    assert!(reporter.events().contains(&Event::Skipped {
        path: fixture.source.path().join("link.txt"),
        reason: SkipReason::Symlink,
    }));

    Ok(())
}
