//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire configuration, logging, pooling and one factory together.
//! - Run the person add/get/update/delete walkthrough and print each step.
//!
//! Usage: `autofactory_cli [config.json]`. Without a config file the
//! connection string is read from `AUTOFACTORY_CONNECTION_DEFAULT`. Logs go
//! to `AUTOFACTORY_LOG_DIR` when it is set.

use autofactory_core::{
    core_version, default_log_level, entity, init_logging, ConfigSource, EntityFactory,
    EntityRepository, EnvConfig, FactoryResult, FileConfig, DEFAULT_CONNECTION_NAME,
};
use log::info;
use std::error::Error;

const LOG_DIR_ENV: &str = "AUTOFACTORY_LOG_DIR";

entity! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        pub ID: i64,
        pub Name: String,
        pub Age: i64,
    }
}

const PERSON_TABLE: &str = "CREATE TABLE IF NOT EXISTS Person (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Age INTEGER NOT NULL
);";

fn main() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        init_logging(default_log_level(), &log_dir)?;
    }
    println!("autofactory_core version={}", core_version());

    let factory = match std::env::args().nth(1) {
        Some(path) => build_factory(&FileConfig::load(path)?)?,
        None => build_factory(&EnvConfig)?,
    };

    factory.pool().get()?.execute_batch(PERSON_TABLE)?;
    factory.verify_schema()?;
    walkthrough(&factory)?;
    Ok(())
}

fn build_factory(source: &impl ConfigSource) -> FactoryResult<EntityFactory<Person>> {
    let factory = EntityFactory::<Person>::from_config(source)?;
    info!(
        "event=cli_ready module=cli status=ok connection={}",
        DEFAULT_CONNECTION_NAME
    );
    Ok(factory)
}

fn walkthrough(factory: &EntityFactory<Person>) -> FactoryResult<()> {
    let id = factory.add(&Person {
        ID: 0,
        Name: "Alice".to_string(),
        Age: 30,
    })?;
    println!("add -> id={id}");

    let mut alice = factory.get(id)?;
    println!("get({id}) -> {alice:?}");

    alice.Age += 1;
    let changed = factory.update(&alice)?;
    println!("update -> rows={changed} now={:?}", factory.get(id)?);

    println!("get_all -> {} row(s)", factory.get_all()?.len());

    factory.delete(id)?;
    println!("delete({id}) -> get={:?}", factory.get(id)?);
    Ok(())
}
