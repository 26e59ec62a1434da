use structopt::StructOpt;

use std::{ffi, path::Path, process};

use radikal::{config::Config, trie::Trie, vlog::ValueLog, Result};

#[derive(Clone, StructOpt)]
pub struct Opt {
    #[structopt(long = "db", help = "database path: <dir>/<name>")]
    db: ffi::OsString,

    #[structopt(subcommand)]
    subcmd: SubCommand,
}

#[derive(Clone, StructOpt)]
pub enum SubCommand {
    /// Insert or overwrite a key's value.
    Put { key: String, value: String },
    /// Look up a key. Exits non-zero if the key is absent.
    Get { key: String },
    /// Tombstone a key.
    Delete { key: String },
    /// Print the number of live keys.
    Stats,
    /// Print every live key/value pair, one per line.
    Dump {
        #[structopt(long = "sep", default_value = "\t")]
        sep: String,
    },
    /// Read key/value pairs from stdin, one per line, and insert them.
    Load {
        #[structopt(long = "sep", default_value = "\t")]
        sep: String,
    },
}

fn main() {
    let opts = Opt::from_iter(std::env::args_os());
    if let Err(err) = run(opts) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn split_db_path(db: &ffi::OsStr) -> (ffi::OsString, String) {
    let path = Path::new(db);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("radikal")
        .to_string();
    (dir.as_os_str().to_os_string(), name)
}

fn run(opts: Opt) -> Result<()> {
    let (dir, name) = split_db_path(&opts.db);
    let config = Config::new(&dir, &name);

    let mut trie = Trie::open(&config)?;
    let mut vlog = ValueLog::open(&config.to_vlog_location(), config.fsync)?;

    match opts.subcmd {
        SubCommand::Put { key, value } => {
            let doc = [("value".to_string(), value.into_bytes())].into_iter().collect();
            let offset = vlog.append(&doc)?;
            trie.put(key.as_bytes(), offset)?;
            trie.commit()?;
        }
        SubCommand::Get { key } => {
            let offset = trie.get(key.as_bytes())?;
            let doc = vlog.get(offset)?;
            let value = doc.get("value").cloned().unwrap_or_default();
            println!("{}", String::from_utf8_lossy(&value));
        }
        SubCommand::Delete { key } => {
            trie.delete(key.as_bytes())?;
            trie.commit()?;
        }
        SubCommand::Stats => {
            let mut count = 0_u64;
            trie.walk(|_key, _value| {
                count += 1;
                Ok(())
            })?;
            println!("keys: {}", count);
        }
        SubCommand::Dump { sep } => {
            trie.walk(|key, offset| {
                let doc = vlog.get(offset)?;
                let value = doc.get("value").cloned().unwrap_or_default();
                println!(
                    "{}{}{}",
                    String::from_utf8_lossy(key),
                    sep,
                    String::from_utf8_lossy(&value)
                );
                Ok(())
            })?;
        }
        SubCommand::Load { sep } => {
            use std::io::BufRead;

            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = radikal::err_at!(IoError, line)?;
                if line.is_empty() {
                    continue;
                }
                let mut parts = line.splitn(2, sep.as_str());
                let key = parts.next().unwrap_or_default();
                let value = parts.next().unwrap_or_default();

                let doc = [("value".to_string(), value.as_bytes().to_vec())]
                    .into_iter()
                    .collect();
                let offset = vlog.append(&doc)?;
                trie.put(key.as_bytes(), offset)?;
            }
            trie.commit()?;
        }
    }

    Ok(())
}
