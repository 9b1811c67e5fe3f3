use super::*;
use expr::CompareOp;
use tempfile::tempdir;
use types::ColumnType;

fn orders_store() -> (MemoryStore, TableId) {
    let store = MemoryStore::new();
    let id = store
        .create_table(
            Some(TableId::new("orders")),
            "Orders",
            vec![
                Column::new("item", "Item", ColumnType::Text),
                Column::new("region", "Region", ColumnType::Text),
                Column::new("qty", "Qty", ColumnType::Integer),
            ],
            vec!["region".into()],
        )
        .unwrap();
    for (item, region, qty) in [("pen", "East", "3"), ("ink", "West", "12"), ("pad", "East", "7")] {
        store
            .insert_row(&id, vec![Some(item.into()), Some(region.into()), Some(qty.into())])
            .unwrap();
    }
    (store, id)
}

fn order(store: &MemoryStore) -> Vec<String> {
    store.tables().unwrap()[0].column_order()
}

#[test]
fn fetch_filters_and_keeps_insertion_order() {
    let (store, id) = orders_store();
    let rs = store
        .fetch(&id, &Predicate::eq("region", "East"), &order(&store))
        .unwrap();
    assert_eq!(rs.height(), 2);
    assert_eq!(rs.data(0, 0).unwrap(), Some("pen"));
    assert_eq!(rs.data(1, 0).unwrap(), Some("pad"));
    assert!(rs.rows.iter().all(|r| r.id().is_some()));
}

#[test]
fn fetch_projects_requested_columns() {
    let (store, id) = orders_store();
    let pred = Predicate::Compare {
        column: "qty".into(),
        op: CompareOp::Gt,
        value: "5".into(),
    };
    let rs = store
        .fetch(&id, &pred, &["qty".to_string(), "item".to_string()])
        .unwrap();
    assert_eq!(rs.columns, vec!["qty", "item"]);
    assert_eq!(rs.rows[0].cells, vec![Some("12".to_string()), Some("ink".to_string())]);
    assert_eq!(rs.height(), 2);

    let err = store
        .fetch(&id, &Predicate::All, &["nope".to_string()])
        .unwrap_err();
    assert!(format!("{err}").contains("unknown column 'nope'"));
}

#[test]
fn insert_rejects_wrong_width() {
    let (store, id) = orders_store();
    let err = store.insert_row(&id, vec![Some("x".into())]).unwrap_err();
    assert!(format!("{err}").contains("3 columns"));
}

#[test]
fn group_counts_cover_every_row() {
    let (store, id) = orders_store();
    store
        .insert_row(&id, vec![Some("cap".into()), None, Some("1".into())])
        .unwrap();
    let counts = store.group_counts(&id, "region").unwrap();
    assert_eq!(counts.get(&Some("East".to_string())), Some(&2));
    assert_eq!(counts.get(&Some("West".to_string())), Some(&1));
    assert_eq!(counts.get(&None), Some(&1));
    assert_eq!(counts.values().sum::<usize>(), 4);
}

#[test]
fn unavailable_store_fails_reads() {
    let (store, id) = orders_store();
    store.set_available(false);
    assert!(matches!(store.tables(), Err(BridgeError::BackendUnavailable(_))));
    assert!(matches!(
        store.fetch(&id, &Predicate::All, &[]),
        Err(BridgeError::BackendUnavailable(_))
    ));

    store.set_available(true);
    assert_eq!(store.tables().unwrap().len(), 1);
}

#[test]
fn default_column_lookups_go_through_metadata() {
    let (store, id) = orders_store();
    let col = store.column_by_display_name(&id, "Qty").unwrap().unwrap();
    assert_eq!(col.element_key, "qty");
    let col = store.column_by_element_key(&id, "region").unwrap().unwrap();
    assert_eq!(col.display_name, "Region");
    assert!(store.column_by_display_name(&id, "qty").unwrap().is_none());
}

#[test]
fn snapshot_round_trip() {
    let (store, id) = orders_store();
    let dir = tempdir().unwrap();
    store.save(dir.path()).unwrap();

    let loaded = MemoryStore::load(dir.path()).unwrap();
    let original = store.fetch(&id, &Predicate::All, &order(&store)).unwrap();
    let restored = loaded.fetch(&id, &Predicate::All, &order(&loaded)).unwrap();
    assert_eq!(original, restored);
    assert_eq!(loaded.tables().unwrap()[0].prime_columns, vec!["region".to_string()]);
}

#[test]
fn drop_table_forgets_rows() {
    let (store, _) = orders_store();
    store.drop_table("Orders").unwrap();
    assert!(store.tables().unwrap().is_empty());
}

#[test]
fn load_of_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::load(&dir.path().join("nothing")).unwrap();
    assert!(store.tables().unwrap().is_empty());
}
