use pomobar_core::{SessionKind, Settings, TomlFileStore};
use serde::Serialize;

#[derive(Serialize)]
struct SessionRow {
    kind: SessionKind,
    label: &'static str,
    icon: &'static str,
    minutes: u32,
    min_minutes: u32,
    max_minutes: u32,
}

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(TomlFileStore::open_default()?);

    let rows: Vec<SessionRow> = SessionKind::ALL
        .iter()
        .map(|&kind| SessionRow {
            kind,
            label: kind.label(),
            icon: kind.icon(),
            minutes: settings.minutes(kind),
            min_minutes: *kind.bounds().start(),
            max_minutes: *kind.bounds().end(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in rows {
        println!(
            "{} {:<13} {:>2} min  ({}-{})",
            row.icon, row.label, row.minutes, row.min_minutes, row.max_minutes
        );
    }
    Ok(())
}
