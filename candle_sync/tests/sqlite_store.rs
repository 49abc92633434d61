mod common;

use candle_sync::{
    candle::Candle,
    db::connection::connect_sqlite,
    schema::engine_kv::dsl as kv,
    series::CandleSeries,
    session::ChartSession,
    store::{CandleStore, sqlite::SqliteCandleStore, storage_key},
};
use diesel::prelude::*;
use tick_feed::models::timeframe::TimeFrame;

#[test]
fn sqlite_connection_applies_pragmas() {
    let (db, mut conn) = common::setup_db();
    common::assert_sqlite_pragmas(&mut conn);

    let mut second = connect_sqlite(&db.path).expect("connect second");
    common::assert_sqlite_pragmas(&mut second);
}

#[test]
fn set_upserts_a_single_row() {
    let db = common::temp_db();
    let mut store = SqliteCandleStore::open(&db.path).expect("open");

    let first = CandleSeries::from_candles(vec![Candle::new(0, 1.0, 1.0, 1.0, 1.0)]);
    let second = CandleSeries::from_candles(vec![
        Candle::new(0, 1.0, 1.0, 1.0, 1.0),
        Candle::new(60, 2.0, 2.0, 2.0, 2.0),
    ]);
    store.set("candles_HBL", &first).unwrap();
    store.set("candles_HBL", &second).unwrap();

    let mut conn = connect_sqlite(&db.path).unwrap();
    let rows: Vec<(String, String)> = kv::engine_kv
        .select((kv::k, kv::v))
        .load(&mut conn)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "candles_HBL");
    let stored: CandleSeries = serde_json::from_str(&rows[0].1).unwrap();
    assert_eq!(stored, second);
}

#[test]
fn history_survives_reopen() {
    let db = common::temp_db();
    {
        let store = SqliteCandleStore::open(&db.path).expect("open");
        let mut session = ChartSession::open("HUBC", TimeFrame::ONE_MINUTE, store);
        session.apply(&common::tick(1_000, 10.0, 11.0, 9.0, 10.0), 0);
        session.apply(&common::tick(61_000, 11.0, 11.0, 10.0, 10.5), 0);
        // the open bucket-60 candle is never persisted
    }

    let store = SqliteCandleStore::open(&db.path).expect("reopen");
    let session = ChartSession::open("HUBC", TimeFrame::ONE_MINUTE, store);
    assert_eq!(
        session.display(),
        vec![Candle::new(0, 10.0, 11.0, 9.0, 10.0)]
    );

    let mut store = session.into_store();
    assert_eq!(store.keys().unwrap(), vec![storage_key("HUBC")]);
    assert!(store.get(&storage_key("FFC")).unwrap().is_none());
}

#[test]
fn legacy_unsorted_payload_is_normalized_on_load() {
    let db = common::temp_db();
    let mut store = SqliteCandleStore::open(&db.path).expect("open");
    let mut conn = connect_sqlite(&db.path).unwrap();
    diesel::insert_into(kv::engine_kv)
        .values((
            kv::k.eq("candles_MCB"),
            kv::v.eq(r#"[{"time":120,"open":3,"high":3,"low":3,"close":3},
                         {"time":60,"open":2,"high":2,"low":2,"close":2},
                         {"time":120,"open":4,"high":4,"low":4,"close":4}]"#),
        ))
        .execute(&mut conn)
        .unwrap();

    let series = store.get("candles_MCB").unwrap().unwrap();
    let times: Vec<i64> = series.iter().map(|c| c.time).collect();
    assert_eq!(times, vec![60, 120]);
    assert_eq!(series.last().unwrap().close, 4.0);
}
