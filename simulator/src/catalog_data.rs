//! Built-in demo catalog, used when no catalog file is configured

use playstream_core::{Catalog, CatalogEntry, Result};

/// (track_id, title, album, duration_secs, weight, release_year)
const TRACKS: &[(&str, &str, &str, u32, f64, u16)] = &[
    ("jw-001", "In My Room", "In My Room (Single)", 183, 0.24, 2024),
    ("jw-002", "Last Summer", "Last Summer (Single)", 172, 0.10, 2024),
    ("jw-003", "Kill You Off", "PRESSURE", 148, 0.13, 2025),
    ("jw-004", "Pearl", "PRESSURE", 141, 0.11, 2025),
    ("jw-005", "Loser", "PRESSURE", 167, 0.12, 2025),
    ("jw-006", "Fingernails", "PRESSURE", 144, 0.09, 2025),
    ("jw-007", "Limewire", "PRESSURE", 158, 0.08, 2025),
    ("jw-008", "Jennifer's Body", "PRESSURE", 153, 0.06, 2025),
    ("jw-009", "Sunshine State", "PRESSURE", 176, 0.04, 2025),
    ("jw-010", "You've Lost A Lot of Blood", "PRESSURE", 182, 0.03, 2025),
];

pub fn builtin_catalog() -> Result<Catalog> {
    Catalog::from_entries(TRACKS.iter().map(|&(id, title, album, duration, weight, year)| {
        CatalogEntry::new(id, title, duration, weight)
            .with_album(album)
            .with_release_year(year)
    }))
}
