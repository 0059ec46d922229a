use clap::Subcommand;
use pomobar_core::{SessionKind, Settings, TomlFileStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "durations.work", "auto_chain")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset durations to defaults
    Reset,
    /// Lengthen a session kind by whole minutes
    Inc {
        /// work, short_break or long_break
        kind: SessionKind,
        #[arg(default_value_t = 1)]
        minutes: u32,
    },
    /// Shorten a session kind by whole minutes
    Dec {
        /// work, short_break or long_break
        kind: SessionKind,
        #[arg(default_value_t = 1)]
        minutes: u32,
    },
    /// Print where the config file lives
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = TomlFileStore::open_default()?;

    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load(store);
            match settings.config().get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load(store);
            settings.apply_key(&key, &value)?;
            settings.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let settings = Settings::load(store);
            println!("{}", serde_json::to_string_pretty(settings.config())?);
        }
        ConfigAction::Reset => {
            let mut settings = Settings::load(store);
            settings.reset_to_defaults();
            settings.save()?;
            println!("durations reset to defaults");
        }
        ConfigAction::Inc { kind, minutes } => {
            let mut settings = Settings::load(store);
            for _ in 0..minutes {
                if !settings.increment(kind) {
                    break;
                }
            }
            settings.save()?;
            println!("{} {} min", kind.key(), settings.minutes(kind));
        }
        ConfigAction::Dec { kind, minutes } => {
            let mut settings = Settings::load(store);
            for _ in 0..minutes {
                if !settings.decrement(kind) {
                    break;
                }
            }
            settings.save()?;
            println!("{} {} min", kind.key(), settings.minutes(kind));
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}
