use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::FixedOffset;
use serde_json::json;
use tempfile::TempDir;

use dayone_lib::config::{DuplicatePolicy, ImportConfiguration};
use dayone_lib::dayone::{read_export_archive, ImportDocument, Importer, IndexResolver, PathResolver};
use dayone_lib::store::{DocumentStore, FileStore};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn sample_export() -> serde_json::Value {
    json!({
        "metadata": { "version": "1.0" },
        "entries": [
            {
                "uuid": "E1",
                "creationDate": "2023-05-01T10:15:30Z",
                "text": "Morning walk",
                "tags": ["walk"],
                "location": { "placeName": "Park", "latitude": 1.5, "longitude": 2 },
                "weather": { "weatherCode": "clear", "temperatureCelsius": 0 },
                "photos": [{ "identifier": "P1", "type": "jpeg" }]
            },
            {
                "uuid": "E2",
                "creationDate": "2023-05-02T20:00:00Z",
                "richText": "{\"contents\":[{\"text\":\"Rich \"},{\"text\":\"evening\"}]}",
                "text": "plain evening",
                "audios": [{ "identifier": "A1", "format": "aac" }],
                "videos": [{ "identifier": "V1" }]
            },
            { "uuid": "E3", "creationDate": "whenever" },
            { "creationDate": "2023-05-04T00:00:00Z", "text": "no uuid" }
        ]
    })
}

fn write_media(dir: &Path) {
    fs::create_dir_all(dir.join("photos")).unwrap();
    fs::create_dir_all(dir.join("audios")).unwrap();
    fs::write(dir.join("photos").join("P1.jpeg"), [0xFF, 0xD8]).unwrap();
    fs::write(dir.join("audios").join("A1.aac"), [7, 7, 7]).unwrap();
}

#[tokio::test]
async fn test_import_with_export_folder() {
    let vault = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();
    write_media(export.path());

    let store = FileStore::new(vault.path().to_path_buf());
    let media = PathResolver::new(export.path().to_path_buf());
    let config = ImportConfiguration::default();
    let document = ImportDocument::from_value(&sample_export());

    let report = Importer::new(&store, &media, &config)
        .with_offset(utc())
        .run(&document)
        .await
        .unwrap();

    assert_eq!(report.summary(), "Imported 2 entries. 0 skipped. 2 failed.");
    assert_eq!(report.media_copied, 2);
    assert_eq!(report.media_missing, 1);

    let import_dir = vault.path().join("Day One Import");
    let first = fs::read_to_string(import_dir.join("2023-05-01_10-15-30.md")).unwrap();
    assert_eq!(
        first,
        "---\ndate: 2023-05-01T10:15:30Z\nmodified: 2023-05-01T10:15:30Z\ntags: [walk]\nlocation: \"Park\"\ncoordinates: [1.5, 2]\nweather: \"clear\"\ntemperature: 0\n---\n\nMorning walk\n\n## Photos\n![Photo 1](attachments/P1.jpeg)"
    );

    let second = fs::read_to_string(import_dir.join("2023-05-02_20-00-00.md")).unwrap();
    assert!(second.contains("\n\nRich evening\n\n## Audio\n![[attachments/A1.aac]]\n\n## Videos\n![[attachments/V1.mp4]]"));

    assert_eq!(fs::read(import_dir.join("attachments").join("P1.jpeg")).unwrap(), vec![0xFF, 0xD8]);
    assert_eq!(fs::read(import_dir.join("attachments").join("A1.aac")).unwrap(), vec![7, 7, 7]);
    assert!(!import_dir.join("attachments").join("V1.mp4").exists());

    let failures = fs::read_to_string(import_dir.join("Failed Imports.md")).unwrap();
    assert_eq!(
        failures,
        "# Failed Imports\n\n## Entry: E3\n- Date: whenever\n- Error: Invalid creation date: whenever\n\n## Entry: unknown\n- Date: 2023-05-04T00:00:00Z\n- Error: Entry is missing required field: uuid\n"
    );
}

#[tokio::test]
async fn test_reimport_skips_and_never_overwrites() {
    let vault = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();
    write_media(export.path());

    let store = FileStore::new(vault.path().to_path_buf());
    let media = PathResolver::new(export.path().to_path_buf());
    let config = ImportConfiguration {
        use_uuid_filenames: true,
        ..Default::default()
    };
    let document = ImportDocument::from_value(&sample_export());

    Importer::new(&store, &media, &config).run(&document).await.unwrap();

    let note_path = vault.path().join("Day One Import").join("E1.md");
    fs::write(&note_path, "edited by hand").unwrap();

    let second = Importer::new(&store, &media, &config).run(&document).await.unwrap();

    // UUID names do not depend on the date, so only the entry without a uuid fails
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.failed_count(), 1);
    assert_eq!(fs::read_to_string(&note_path).unwrap(), "edited by hand");
    assert_eq!(second.failure_report.as_deref(), Some("Day One Import/Failed Imports 1.md"));
    assert!(store.exists("Day One Import/Failed Imports.md").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_fail_policy() {
    let vault = TempDir::new().unwrap();
    let store = FileStore::new(vault.path().to_path_buf());
    store.create("Journal/E1.md", "existing").await.unwrap();

    let config = ImportConfiguration {
        import_folder: "Journal".to_string(),
        use_uuid_filenames: true,
        on_duplicate: DuplicatePolicy::Fail,
        ..Default::default()
    };
    let document = ImportDocument::from_value(&json!({ "entries": [
        { "uuid": "E1", "creationDate": "2023-01-01T00:00:00Z" }
    ]}));

    let report = Importer::new(&store, &IndexResolver::default(), &config)
        .run(&document)
        .await
        .unwrap();

    assert_eq!(report.failed[0].error, "File already exists: E1");
    assert_eq!(store.read("Journal/E1.md").await.unwrap(), "existing");
}

#[tokio::test]
async fn test_import_from_archive() {
    let work = TempDir::new().unwrap();
    let zip_path = work.path().join("Export.zip");
    {
        let file = fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        writer.start_file("Journal.json", options).unwrap();
        writer
            .write_all(serde_json::to_string(&sample_export()).unwrap().as_bytes())
            .unwrap();
        writer.start_file("photos/P1.jpeg", options).unwrap();
        writer.write_all(&[1, 2, 3]).unwrap();
        writer.finish().unwrap();
    }

    let export = read_export_archive(&zip_path).unwrap();
    let document = ImportDocument::parse(&export.journal_json).unwrap();

    let vault = TempDir::new().unwrap();
    let store = FileStore::new(vault.path().to_path_buf());
    let config = ImportConfiguration::default();

    let report = Importer::new(&store, &export.media, &config)
        .with_offset(utc())
        .run(&document)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.media_copied, 1);
    assert_eq!(report.media_missing, 2);
    assert_eq!(
        fs::read(vault.path().join("Day One Import/attachments/P1.jpeg")).unwrap(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_invalid_export_is_fatal() {
    assert!(ImportDocument::parse("this is not json").is_err());
}

#[tokio::test]
async fn test_media_names_cannot_reach_outside_export() {
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.key"), b"do not copy").unwrap();

    let export = TempDir::new().unwrap();
    write_media(export.path());

    let vault = TempDir::new().unwrap();
    let store = FileStore::new(vault.path().to_path_buf());
    let media = PathResolver::new(export.path().to_path_buf());
    let config = ImportConfiguration {
        use_uuid_filenames: true,
        ..Default::default()
    };
    let absolute = outside.path().join("secret").to_string_lossy().to_string();
    let document = ImportDocument::from_value(&json!({ "entries": [{
        "uuid": "E1",
        "creationDate": "2023-01-01T00:00:00Z",
        "photos": [
            { "identifier": absolute, "type": "key" },
            { "identifier": "../../secret", "type": "key" },
            { "identifier": "P1", "type": "jpeg" }
        ]
    }]}));

    let report = Importer::new(&store, &media, &config).run(&document).await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.media_copied, 1);
    assert_eq!(report.media_failed, 0);

    let copied: Vec<String> = store
        .list_files()
        .await
        .unwrap()
        .into_iter()
        .filter(|f| f.parent().starts_with("Day One Import/attachments"))
        .map(|f| f.path)
        .collect();
    assert_eq!(copied, vec!["Day One Import/attachments/P1.jpeg".to_string()]);

    let note = fs::read_to_string(vault.path().join("Day One Import/E1.md")).unwrap();
    assert!(!note.contains("secret"));
}
