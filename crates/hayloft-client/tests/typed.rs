use std::str::FromStr;

use bigdecimal::BigDecimal;
use hayloft_client::{
    Client, ClientPool, ColumnKey, Error, SchemaDef, TypeTag, TypedValue, predicate,
};
use hayloft_store::MemoryStore;

const TABLE: &str = "metrics";

fn client() -> Client<MemoryStore> {
    let client = Client::new(MemoryStore::new());
    client.create_table(TABLE, &["cf1", "cf2"]).unwrap();
    client
}

fn schema() -> SchemaDef {
    SchemaDef::new()
        .column("cf1:age", TypeTag::Long)
        .column("cf1:name", TypeTag::String)
        .column("cf1:active", TypeTag::Boolean)
        .column("cf2:balance", TypeTag::Decimal)
        .pattern("cf1", "^d", TypeTag::Double)
}

// ── Schema-driven decode ────────────────────────────────────────

#[test]
fn get_decodes_through_the_registered_schema() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    table
        .put(
            "u1",
            &[
                ("cf1:age", TypedValue::Long(34)),
                ("cf1:name", TypedValue::String("lena".into())),
                ("cf1:active", TypedValue::Boolean(true)),
            ],
        )
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(row.get("cf1:age").unwrap(), Some(TypedValue::Long(34)));
    assert_eq!(
        row.get("cf1:name").unwrap(),
        Some(TypedValue::String("lena".into()))
    );
    // bare identifiers resolve through the schema
    assert_eq!(row.get("age").unwrap(), Some(TypedValue::Long(34)));
    assert_eq!(row.long("age").unwrap(), Some(34));
}

#[test]
fn pattern_entries_decode_matching_qualifiers() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    table
        .put("u1", &[("cf1:d9", TypedValue::Double(2.5))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(row.get("cf1:d9").unwrap(), Some(TypedValue::Double(2.5)));
}

#[test]
fn unregistered_columns_come_back_raw() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    table
        .put("u1", &[("cf1:blob", TypedValue::Raw(vec![1, 2, 3]))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(
        row.get("cf1:blob").unwrap(),
        Some(TypedValue::Raw(vec![1, 2, 3]))
    );
}

#[test]
fn explicit_accessor_works_without_schema() {
    let client = client();
    let table = client.table(TABLE);
    table
        .put("u1", &[("cf1:count", TypedValue::Long(7))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    // no schema registered at all: the typed accessor still decodes
    assert_eq!(row.long("cf1:count").unwrap(), Some(7));
    // but the generic accessor only has bytes to offer
    assert_eq!(
        row.get("cf1:count").unwrap(),
        Some(TypedValue::Raw(7i64.to_be_bytes().to_vec()))
    );
    // and a bare identifier cannot be located
    assert!(matches!(row.long("count"), Err(Error::Validation(_))));
}

#[test]
fn accessor_with_wrong_width_is_a_type_error() {
    let client = client();
    let table = client.table(TABLE);
    table
        .put("u1", &[("cf1:name", TypedValue::String("abc".into()))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    assert!(matches!(row.long("cf1:name"), Err(Error::Type(_))));
}

#[test]
fn decimal_round_trips_exactly() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    let exact = BigDecimal::from_str("12345.000000789").unwrap();
    table
        .put("u1", &[("cf2:balance", TypedValue::from(exact.clone()))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(row.decimal("cf2:balance").unwrap(), Some(exact));
}

#[test]
fn schema_coerces_written_values() {
    let client = client();
    client
        .set_schema(TABLE, &SchemaDef::new().column("cf1:rank", TypeTag::Short))
        .unwrap();
    let table = client.table(TABLE);
    // written as Long, stored as the schema's 2-byte short
    table
        .put("u1", &[("cf1:rank", TypedValue::Long(300))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(row.short("cf1:rank").unwrap(), Some(300));
    assert_eq!(row.raw("cf1:rank").unwrap().map(|b| b.len()), Some(2));

    // out-of-range narrowing fails instead of wrapping
    let err = table
        .put("u2", &[("cf1:rank", TypedValue::Long(70_000))])
        .unwrap_err();
    assert!(matches!(err, Error::Type(_)), "{err}");
}

#[test]
fn filters_coerce_through_the_schema_too() {
    let client = client();
    client
        .set_schema(TABLE, &SchemaDef::new().column("cf1:rank", TypeTag::Short))
        .unwrap();
    let table = client.table(TABLE);
    for (key, rank) in [("u1", 10i64), ("u2", 20), ("u3", 30)] {
        table
            .put(key, &[("cf1:rank", TypedValue::Long(rank))])
            .unwrap();
    }

    // the filter value is a Long literal but compares against 2-byte
    // shorts on the wire; bare identifier resolution applies as well
    let count = table.filter("rank", predicate::gte(20i64)).count().unwrap();
    assert_eq!(count, 2);
}

#[test]
fn clearing_a_schema_restores_raw_access() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    table.put("u1", &[("cf1:age", TypedValue::Long(5))]).unwrap();

    client.clear_schema(TABLE);
    let row = client.table(TABLE).get("u1").unwrap().unwrap();
    assert_eq!(
        row.get("cf1:age").unwrap(),
        Some(TypedValue::Raw(5i64.to_be_bytes().to_vec()))
    );
}

// ── Versions, maps, cells ───────────────────────────────────────

#[test]
fn plural_accessors_see_all_versions_newest_first() {
    let client = client();
    let table = client.table(TABLE);
    table
        .put("u1", &[("cf1:v", TypedValue::String("one".into()))])
        .unwrap();
    table
        .put("u1", &[("cf1:v", TypedValue::String("two".into()))])
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    let versions = row.strings("cf1:v").unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].1, "two");
    assert_eq!(versions[1].1, "one");
    assert_eq!(row.string("cf1:v").unwrap().as_deref(), Some("two"));
}

#[test]
fn versions_cap_limits_what_the_scan_returns() {
    let client = client();
    let table = client.table(TABLE);
    for value in ["a", "b", "c"] {
        table
            .put("u1", &[("cf1:v", TypedValue::String(value.into()))])
            .unwrap();
    }

    let row = table
        .versions(1)
        .rows()
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(row.strings("cf1:v").unwrap().len(), 1);

    let unscoped = client.table(TABLE).get("u1").unwrap().unwrap();
    assert_eq!(unscoped.strings("cf1:v").unwrap().len(), 3);
}

#[test]
fn to_map_decodes_registered_and_raw_columns() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    table
        .put(
            "u1",
            &[
                ("cf1:age", TypedValue::Long(41)),
                ("cf1:blob", TypedValue::Raw(vec![9])),
            ],
        )
        .unwrap();

    let map = table.get("u1").unwrap().unwrap().to_map().unwrap();
    assert_eq!(
        map.get(&ColumnKey::parse("cf1:age")),
        Some(&TypedValue::Long(41))
    );
    assert_eq!(
        map.get(&ColumnKey::parse("cf1:blob")),
        Some(&TypedValue::Raw(vec![9]))
    );
}

#[test]
fn versioned_map_orders_newest_first() {
    let client = client();
    client.set_schema(TABLE, &schema()).unwrap();
    let table = client.table(TABLE);
    table.put("u1", &[("cf1:age", TypedValue::Long(1))]).unwrap();
    table.put("u1", &[("cf1:age", TypedValue::Long(2))]).unwrap();

    let map = table
        .get("u1")
        .unwrap()
        .unwrap()
        .to_versioned_map()
        .unwrap();
    let versions = map.get(&ColumnKey::parse("cf1:age")).unwrap();
    assert_eq!(versions[0].1, TypedValue::Long(2));
    assert_eq!(versions[1].1, TypedValue::Long(1));
}

#[test]
fn cells_come_back_in_store_order() {
    let client = client();
    let table = client.table(TABLE);
    table
        .put(
            "u1",
            &[
                ("cf2:z", TypedValue::Long(1)),
                ("cf1:b", TypedValue::Long(2)),
                ("cf1:a", TypedValue::Long(3)),
            ],
        )
        .unwrap();

    let row = table.get("u1").unwrap().unwrap();
    let columns: Vec<String> = row
        .cells()
        .iter()
        .map(|cell| cell.column.to_string())
        .collect();
    assert_eq!(columns, vec!["cf1:a", "cf1:b", "cf2:z"]);
}

#[test]
fn rowkey_decodes_with_an_explicit_tag() {
    let client = client();
    let table = client.table(TABLE);
    table
        .put(TypedValue::Long(42), &[("cf1:x", TypedValue::Long(1))])
        .unwrap();

    let row = table
        .scan()
        .rows()
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(
        row.rowkey_as(TypeTag::Long).unwrap(),
        TypedValue::Long(42)
    );
}

// ── Mutations through the table handle ──────────────────────────

#[test]
fn get_missing_row_is_none_not_an_error() {
    let client = client();
    assert!(client.table(TABLE).get("nope").unwrap().is_none());
}

#[test]
fn get_many_aligns_with_input_order() {
    let client = client();
    let table = client.table(TABLE);
    table.put("u1", &[("cf1:x", TypedValue::Long(1))]).unwrap();
    table.put("u3", &[("cf1:x", TypedValue::Long(3))]).unwrap();

    let rows = table.get_many(["u1", "u2", "u3"]).unwrap();
    assert!(rows[0].is_some());
    assert!(rows[1].is_none());
    assert!(rows[2].is_some());
}

#[test]
fn delete_row_and_columns() {
    let client = client();
    let table = client.table(TABLE);
    table
        .put(
            "u1",
            &[
                ("cf1:a", TypedValue::Long(1)),
                ("cf2:b", TypedValue::Long(2)),
            ],
        )
        .unwrap();

    table.delete_columns("u1", &["cf1:a"]).unwrap();
    let row = table.get("u1").unwrap().unwrap();
    assert!(row.long("cf1:a").unwrap().is_none());
    assert_eq!(row.long("cf2:b").unwrap(), Some(2));

    table.delete("u1").unwrap();
    assert!(table.get("u1").unwrap().is_none());
}

#[test]
fn increment_and_append() {
    let client = client();
    let table = client.table(TABLE);

    assert_eq!(table.increment("u1", "cf1:hits", 2).unwrap(), 2);
    assert_eq!(table.increment("u1", "cf1:hits", 3).unwrap(), 5);
    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(row.long("cf1:hits").unwrap(), Some(5));

    table.append("u1", "cf1:log", b"ab").unwrap();
    table.append("u1", "cf1:log", b"cd").unwrap();
    let row = table.get("u1").unwrap().unwrap();
    assert_eq!(row.raw("cf1:log").unwrap().as_deref(), Some(b"abcd".as_slice()));
}

// ── Pooled handles ──────────────────────────────────────────────

#[test]
fn pooled_handles_share_one_schema_registry() {
    let pool: ClientPool<MemoryStore> = ClientPool::new(2, || Ok(MemoryStore::new())).unwrap();

    {
        let first = pool.get().unwrap();
        first.set_schema(TABLE, &schema()).unwrap();
    }
    let second = pool.get().unwrap();
    let third = pool.get().unwrap();
    assert!(second.schemas().get(TABLE).is_some());
    assert!(third.schemas().get(TABLE).is_some());
}

#[test]
fn pool_returns_handles_on_drop() {
    let pool: ClientPool<MemoryStore> = ClientPool::new(1, || Ok(MemoryStore::new())).unwrap();
    for _ in 0..3 {
        let handle = pool.get().unwrap();
        handle.create_table(TABLE, &["cf1"]).unwrap();
    }
}
