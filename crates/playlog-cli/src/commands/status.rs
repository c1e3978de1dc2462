use anyhow::Result;
use playlog_core::schema::Database;
use std::path::Path;

pub fn show_status(db_path: &Path) -> Result<()> {
    let db = Database::open(db_path)?;
    let counts = db.table_counts()?;

    println!("\n📊 Playlog Status\n");
    println!("  Database: {}", db_path.display());
    println!("  songs:     {}", counts.songs);
    println!("  artists:   {}", counts.artists);
    println!("  users:     {}", counts.users);
    println!("  time:      {}", counts.time);
    println!("  songplays: {}", counts.songplays);

    if counts.songs == 0 {
        println!("\n  Run `playlog run` or `playlog songs <dir>` to load data");
    }

    Ok(())
}
