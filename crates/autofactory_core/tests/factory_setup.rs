use autofactory_core::{
    create_pool, entity, ColumnDescriptor, ConfigError, ConnectionSettings, EntityFactory,
    EntityRepository, EnvConfig, FactoryError, FileConfig, MappingError, Record, ReflectionError,
};
use rusqlite::types::{FromSql, FromSqlResult, ValueRef};
use rusqlite::{Connection, ToSql};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

entity! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        pub ID: i64,
        pub Name: String,
        pub Age: i64,
    }
}

/// Record whose first column is not an id column.
#[derive(Debug, Default)]
struct Nameless {
    name: String,
}

impl Record for Nameless {
    const TABLE_NAME: &'static str = "Nameless";
    const COLUMNS: &'static [ColumnDescriptor] = &[ColumnDescriptor::new("name", "String")];

    fn key(&self) -> i64 {
        0
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql]
    }

    fn assign(&mut self, _ordinal: usize, value: ValueRef<'_>) -> FromSqlResult<()> {
        self.name = FromSql::column_result(value)?;
        Ok(())
    }
}

#[test]
fn from_config_resolves_default_connection_string() {
    let (_dir, path) = person_database();
    let mut source = HashMap::new();
    source.insert(
        "default".to_string(),
        format!("Data Source={}", path.display()),
    );

    let factory = EntityFactory::<Person>::from_config(&source).unwrap();
    let id = factory
        .add(&Person {
            ID: 0,
            Name: "Ann".to_string(),
            Age: 20,
        })
        .unwrap();
    assert_eq!(factory.get(id).unwrap().Name, "Ann");
}

#[test]
fn missing_connection_string_fails_construction() {
    let source: HashMap<String, String> = HashMap::new();

    let err = EntityFactory::<Person>::from_config(&source).unwrap_err();
    assert!(matches!(
        err,
        FactoryError::Configuration(ConfigError::MissingConnectionString { ref name }) if name == "default"
    ));
}

#[test]
fn malformed_connection_string_fails_construction() {
    let err = EntityFactory::<Person>::from_connection_string("Data Source=a.db;Pool=yes")
        .unwrap_err();
    assert!(matches!(
        err,
        FactoryError::Configuration(ConfigError::MalformedConnectionString(_))
    ));
}

#[test]
fn file_config_loads_named_connection_strings() {
    let (dir, path) = person_database();
    let config_path = dir.path().join("autofactory.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{ "connection_strings": {{ "reporting": "Data Source={}" }} }}"#,
            path.display()
        ),
    )
    .unwrap();

    let config = FileConfig::load(&config_path).unwrap();
    let factory = EntityFactory::<Person>::from_named_config(&config, "reporting").unwrap();
    assert!(factory.get_all().unwrap().is_empty());

    let err = EntityFactory::<Person>::from_config(&config).unwrap_err();
    assert!(matches!(err, FactoryError::Configuration(_)));

    let err = FileConfig::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn env_config_reads_prefixed_variable() {
    let (_dir, path) = person_database();
    std::env::set_var(
        EnvConfig::variable_for("factory_setup_env"),
        format!("Data Source={}", path.display()),
    );

    let factory = EntityFactory::<Person>::from_named_config(&EnvConfig, "factory_setup_env")
        .unwrap();
    assert!(factory.get_all().unwrap().is_empty());

    let err =
        EntityFactory::<Person>::from_named_config(&EnvConfig, "factory_setup_unset").unwrap_err();
    assert!(matches!(err, FactoryError::Configuration(_)));
}

#[test]
fn record_without_id_key_fails_with_reflection_error() {
    let pool = create_pool(&ConnectionSettings::memory()).unwrap();

    let err = EntityFactory::<Nameless>::with_pool(pool).unwrap_err();
    assert!(matches!(
        err,
        FactoryError::Reflection(ReflectionError::KeyNotIdentifier {
            table: "Nameless",
            column: "name",
        })
    ));
}

#[test]
fn unreachable_database_fails_per_call_with_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("app.db");

    let factory = EntityFactory::<Person>::from_connection_string(&format!(
        "Data Source={};Connect Timeout=1",
        path.display()
    ))
    .unwrap();

    let started_at = Instant::now();
    let err = factory.get(1).unwrap_err();
    assert!(matches!(err, FactoryError::Connection(_)));
    assert_eq!(err.stage(), "connection");
    assert!(started_at.elapsed() < Duration::from_secs(30));
}

#[test]
fn verify_schema_accepts_matching_table_with_extra_trailing_columns() {
    let (_dir, path) = database_with(
        "CREATE TABLE Person (id INTEGER PRIMARY KEY, name TEXT, age INTEGER, notes TEXT);",
    );
    let factory = factory_for(&path);

    factory.verify_schema().unwrap();
}

#[test]
fn verify_schema_detects_reordered_columns() {
    let (_dir, path) =
        database_with("CREATE TABLE Person (ID INTEGER PRIMARY KEY, Age INTEGER, Name TEXT);");
    let factory = factory_for(&path);

    let err = factory.verify_schema().unwrap_err();
    match err {
        FactoryError::Mapping(MappingError::SchemaMismatch { table, detail }) => {
            assert_eq!(table, "Person");
            assert!(detail.contains("`Age`"), "unexpected detail: {detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn verify_schema_detects_missing_and_narrow_tables() {
    let (_dir, path) = database_with("CREATE TABLE Other (ID INTEGER PRIMARY KEY);");
    let factory = factory_for(&path);
    let err = factory.verify_schema().unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    let (_dir, path) = database_with("CREATE TABLE Person (ID INTEGER PRIMARY KEY, Name TEXT);");
    let factory = factory_for(&path);
    assert!(matches!(
        factory.verify_schema(),
        Err(FactoryError::Mapping(MappingError::SchemaMismatch { .. }))
    ));
}

#[test]
fn descriptor_exposes_declared_columns_in_order() {
    let pool = create_pool(&ConnectionSettings::memory()).unwrap();
    let factory = EntityFactory::<Person>::with_pool(pool).unwrap();

    let descriptor = factory.descriptor();
    assert_eq!(descriptor.table(), "Person");
    assert_eq!(descriptor.key().name, "ID");
    let columns: Vec<_> = descriptor
        .columns()
        .iter()
        .map(|column| (column.name, column.type_name))
        .collect();
    assert_eq!(
        columns,
        vec![("ID", "i64"), ("Name", "String"), ("Age", "i64")]
    );
}

fn person_database() -> (TempDir, PathBuf) {
    database_with(
        "CREATE TABLE Person (ID INTEGER PRIMARY KEY, Name TEXT NOT NULL, Age INTEGER NOT NULL);",
    )
}

fn database_with(schema: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("autofactory.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(schema).unwrap();
    (dir, path)
}

fn factory_for(path: &std::path::Path) -> EntityFactory<Person> {
    EntityFactory::<Person>::from_connection_string(&format!("Data Source={}", path.display()))
        .unwrap()
}
