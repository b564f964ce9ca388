use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use spliced_fasta::config::{ConfigLoader, DbConfig, DbSettings, DnaSource, Settings};
use spliced_fasta::error::ExportError;
use spliced_fasta::rest::DEFAULT_REST_URL;

fn write_config(dir: &tempfile::TempDir, json: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("connections.json")).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn file_settings_with_cli_override() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp,
        r#"{
            "core": {"host": "ensembldb.ensembl.org", "port": 5306, "user": "anonymous",
                     "dbname": "homo_sapiens_core_110_38"},
            "dna": {"host": "dna.internal", "port": 3306, "user": "ro", "pass": "secret",
                    "dbname": "homo_sapiens_core_110_38"}
        }"#,
    );
    let cli = Settings {
        core: DbSettings {
            dbname: Some("mus_musculus_core_110_39".to_string()),
            ..DbSettings::default()
        },
        ..Settings::default()
    };

    let resolved = ConfigLoader::resolve(Some(&path), cli).unwrap();
    assert_eq!(
        resolved.core,
        DbConfig {
            host: "ensembldb.ensembl.org".to_string(),
            port: 5306,
            user: "anonymous".to_string(),
            password: None,
            dbname: "mus_musculus_core_110_39".to_string(),
        }
    );
    assert_matches!(
        resolved.dna,
        DnaSource::Database(DbConfig { ref host, ref password, .. })
            if host == "dna.internal" && password.as_deref() == Some("secret")
    );
}

#[test]
fn dna_port_is_required_to_attach() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp,
        r#"{
            "core": {"host": "localhost", "user": "root", "dbname": "core"},
            "dna": {"host": "dna.internal", "user": "ro", "dbname": "dna"}
        }"#,
    );

    let resolved = ConfigLoader::resolve(Some(&path), Settings::default()).unwrap();
    assert_eq!(resolved.dna, DnaSource::Core);
}

#[test]
fn rest_backend_defaults_url() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp,
        r#"{
            "core": {"host": "localhost", "user": "root", "dbname": "core"},
            "rest": {"species": "homo_sapiens"}
        }"#,
    );

    let resolved = ConfigLoader::resolve(Some(&path), Settings::default()).unwrap();
    assert_eq!(
        resolved.dna,
        DnaSource::Rest {
            url: DEFAULT_REST_URL.to_string(),
            species: "homo_sapiens".to_string(),
        }
    );
}

#[test]
fn unreadable_and_malformed_files() {
    let temp = tempfile::tempdir().unwrap();
    let missing = Utf8PathBuf::from_path_buf(temp.path().join("absent.json")).unwrap();
    let err = ConfigLoader::resolve(Some(&missing), Settings::default()).unwrap_err();
    assert_matches!(err, ExportError::ConfigRead(_));

    let path = write_config(&temp, "{ not json");
    let err = ConfigLoader::resolve(Some(&path), Settings::default()).unwrap_err();
    assert_matches!(err, ExportError::ConfigParse(_));
    assert!(err.is_configuration());
}

#[test]
fn missing_dbname_without_file() {
    let cli = Settings {
        core: DbSettings {
            host: Some("localhost".to_string()),
            user: Some("root".to_string()),
            dbname: Some("   ".to_string()),
            ..DbSettings::default()
        },
        ..Settings::default()
    };
    let err = ConfigLoader::resolve(None, cli).unwrap_err();
    assert_matches!(err, ExportError::MissingParameter("dbname"));
}
