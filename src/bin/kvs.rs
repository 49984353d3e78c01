use clap::{App, AppSettings, Arg, SubCommand};
use kvs::{KvStore, KvStoreError, Result};
use std::path::Path;
use std::process::exit;

fn main() -> Result<()> {
    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .takes_value(true)
                .global(true)
                .help("directory holding the database")
                .default_value("./"),
        )
        .subcommand(
            SubCommand::with_name("get")
                .about("get value for given key")
                .arg(Arg::with_name("KEY").required(true)),
        )
        .subcommand(
            SubCommand::with_name("set")
                .about("set key with the given value")
                .arg(Arg::with_name("KEY").required(true))
                .arg(Arg::with_name("VALUE").required(true)),
        )
        .subcommand(
            SubCommand::with_name("rm")
                .about("remove value for the given key")
                .arg(Arg::with_name("KEY").required(true)),
        )
        .subcommand(SubCommand::with_name("ls").about("list all keys and values"))
        .get_matches();

    let (name, matches) = match matches.subcommand() {
        (name, Some(matches)) => (name, matches),
        _ => unreachable!(),
    };

    // Global, so every subcommand sees it, with a default.
    let data_dir = matches.value_of("data-dir").unwrap().to_owned();
    let open_store = || KvStore::open(Path::new(&data_dir));

    match name {
        "get" => {
            // clap enforces KEY argument.
            let key = matches.value_of("KEY").unwrap();

            match open_store()?.get(key.to_string()) {
                Ok(record) => println!("{}", record.value),
                Err(KvStoreError::KeyNotFound) => println!("Key not found"),
                Err(e) => return Err(e),
            };

            Ok(())
        }
        "set" => {
            // clap enforces KEY argument.
            let key = matches.value_of("KEY").unwrap();
            // clap enforces VALUE argument.
            let value = matches.value_of("VALUE").unwrap();

            open_store()?
                .upsert(key.to_string(), value.to_string())
                .map(|_| ())
        }
        "rm" => {
            // clap enforces KEY argument.
            let key = matches.value_of("KEY").unwrap();

            match open_store()?.delete(key.to_string()) {
                Ok(()) => Ok(()),
                Err(KvStoreError::KeyNotFound) => {
                    println!("Key not found");
                    exit(1);
                }
                Err(e) => Err(e),
            }
        }
        "ls" => {
            for record in open_store()?.list()? {
                let line = serde_json::to_string(&record)
                    .map_err(|c| KvStoreError::SerializationFailure { c })?;
                println!("{}", line);
            }

            Ok(())
        }
        _ => unreachable!(),
    }
}
