#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, Label, LabelKind};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn pay_method(engine: &Engine, name: &str) -> Label {
    engine
        .create_label(LabelKind::PayMethod, name, true)
        .await
        .unwrap()
}

pub async fn category(engine: &Engine, name: &str) -> Label {
    engine
        .create_label(LabelKind::Category, name, true)
        .await
        .unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}
