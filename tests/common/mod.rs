#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use attendance::api::router;
use attendance::config::AppConfig;
use attendance::db::connect_in_memory;
use attendance::state::AppState;
use axum::Router;
use sqlx::SqlitePool;

pub const COURSE_CSV: &str = "\
Id,Name,Ort,Trainer,Sparte,Wochentag,Start,Ende
101,Yoga,Halle 1,Anna,Fitness,Montag,18:00,19:30
102,Pilates,Halle 2,Ben,Fitness,Mittwoch,10:00,11:00
Gesamt,,,,,,,
";

pub const ROSTER_A_CSV: &str = "\
Datum,Kündigungsdatum,Mitgliedsnummer,Vorname,Nachname,Erreichbarkeit per Telefon,Mitteilung,Notizen Büro,Alter,E-Mail-Adresse,Kurs Id
01.01.2023,,1,Anna,Schmidt,0171,,,34,anna@example.org,101
01.01.2023,,2,Ben,Meyer,,,,41,,101
01.01.2023,,2,Ben,Meyer,,,,41,,102
";

pub const ROSTER_B_CSV: &str = "\
Datum,Kündigungsdatum,Mitgliedsnummer,Vorname,Nachname,Erreichbarkeit per Telefon,Mitteilung,Notizen Büro,Alter,E-Mail-Adresse,Kurs Id
01.01.2023,,1,Anna,Schmidt-Neu,0171,,,35,anna@example.org,102
01.01.2023,,1,Anna,Schmidt-Neu,0171,,,35,anna@example.org,102
15.03.2023 09:00:00,,3,Cem,Yilmaz,,Rücken,,29,,101
";

pub async fn test_pool() -> SqlitePool {
    connect_in_memory()
        .await
        .expect("Failed to create test db")
}

pub fn test_app(pool: SqlitePool, index_html: PathBuf) -> Router {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: [127, 0, 0, 1].into(),
        port: 0,
        index_html,
    };
    router(AppState {
        db: pool,
        config: Arc::new(config),
    })
}
