use clap::{value_t, App, AppSettings, Arg};
use kvs::server::Server;
use kvs::sled::SledKvsEngine;
use kvs::{claim_data_dir, KvStore, KvsEngine, MemKvsEngine, StoreConfig};
use log::info;
use std::path::Path;

type Result<T> = std::result::Result<T, failure::Error>;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("engine")
                .takes_value(true)
                .long("engine")
                .help("specify database engine")
                .possible_values(&["kvs", "sled", "memory"])
                .default_value("kvs"),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .takes_value(true)
                .help("specify the address to listen on")
                .default_value("0.0.0.0"),
        )
        .arg(
            Arg::with_name("port")
                .long("port")
                .takes_value(true)
                .env("PORT")
                .help("specify the port to listen on")
                .default_value("10000"),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .takes_value(true)
                .help("directory holding the database")
                .default_value("./"),
        )
        .arg(
            Arg::with_name("shards")
                .long("shards")
                .takes_value(true)
                .help("number of lock shards of the in-memory map"),
        )
        .arg(
            Arg::with_name("sync")
                .long("sync")
                .help("sync every write to disk before answering"),
        )
        .get_matches();

    let port = value_t!(matches, "port", u16).unwrap_or_else(|e| e.exit());
    // clap provides defaults for these.
    let addr = format!("{}:{}", matches.value_of("host").unwrap(), port);
    let engine = matches.value_of("engine").unwrap();
    let data_dir = Path::new(matches.value_of("data-dir").unwrap());

    let mut config = StoreConfig::default();
    if matches.is_present("shards") {
        config.shards = value_t!(matches, "shards", usize).unwrap_or_else(|e| e.exit());
    }
    config.sync_writes = matches.is_present("sync");

    info!("kvs {}", env!("CARGO_PKG_VERSION"));
    info!("Using engine '{}'.", engine);

    match engine {
        "kvs" => {
            claim_data_dir(data_dir, engine)?;
            run(KvStore::open_with_config(data_dir, config)?, &addr).await
        }
        "sled" => {
            claim_data_dir(data_dir, engine)?;
            run(SledKvsEngine::open_with_config(data_dir, &config)?, &addr).await
        }
        "memory" => run(MemKvsEngine::with_config(&config), &addr).await,
        _ => unreachable!(),
    }
}

async fn run<E: KvsEngine>(engine: E, addr: &str) -> Result<()> {
    Server::new(engine).listen(addr).await?;

    Ok(())
}
