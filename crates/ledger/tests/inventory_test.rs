use rusqlite::Connection;
use stockledger_core::{MaterialFields, NewInbound, NewOrder, NewOutbound, OrderStatus};
use stockledger_ledger::{Inventory, InventoryConfig};
use stockledger_storage::{engine, FileEngine, Schema, Storage, CURRENT_VERSION, SNAPSHOT_KEY};

fn fresh() -> Inventory {
    Inventory::open(Storage::open_temporary().unwrap(), InventoryConfig::default()).unwrap()
}

#[test]
fn test_bolt_scenario() {
    let mut inventory = fresh();

    let bolt = inventory
        .add_material(&MaterialFields::new("Bolt", "Hardware", "pcs").with_thresholds(10, 0))
        .unwrap();
    assert_eq!(inventory.get_material(bolt).unwrap().unwrap().current_stock, 0);

    inventory.record_inbound(&NewInbound::new(bolt, 50, "alice")).unwrap();
    assert_eq!(inventory.get_material(bolt).unwrap().unwrap().current_stock, 50);
    assert!(inventory.low_stock_materials().unwrap().is_empty());

    inventory
        .record_outbound(&NewOutbound::new(bolt, 45, "bob", "alice"))
        .unwrap();
    assert_eq!(inventory.get_material(bolt).unwrap().unwrap().current_stock, 5);

    let low = inventory.low_stock_materials().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, bolt);
    assert_eq!(inventory.statistics().unwrap().low_stock_count, 1);
}

#[test]
fn test_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let (bolt, order) = {
        let mut inventory =
            Inventory::open(Storage::open(dir.path()).unwrap(), InventoryConfig::default()).unwrap();
        let bolt = inventory
            .add_material(
                &MaterialFields::new("Bolt", "Hardware", "pcs")
                    .with_code("HW-1")
                    .with_unit_price(0.5),
            )
            .unwrap();
        inventory.record_inbound(&NewInbound::new(bolt, 30, "alice")).unwrap();
        inventory
            .record_outbound(&NewOutbound::new(bolt, 12, "bob", "alice"))
            .unwrap();
        let order = inventory
            .add_order(&NewOrder::new(
                "PO-7",
                "Acme",
                chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "alice",
            ))
            .unwrap();
        inventory
            .update_order_status(order, OrderStatus::Approved, None)
            .unwrap();
        (bolt, order)
    };

    let inventory =
        Inventory::open(Storage::open(dir.path()).unwrap(), InventoryConfig::default()).unwrap();

    let material = inventory.get_material_by_code("HW-1").unwrap().unwrap();
    assert_eq!(material.id, bolt);
    assert_eq!(material.current_stock, 18);
    assert_eq!(inventory.inbound_records(None).unwrap().len(), 1);
    assert_eq!(inventory.outbound_records(None).unwrap()[0].quantity, 12);
    assert_eq!(inventory.statistics().unwrap().total_value, 9.0);
    assert_eq!(
        inventory.get_order(order).unwrap().unwrap().status,
        OrderStatus::Approved
    );
}

#[test]
fn test_file_engine_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut inventory = Inventory::with_config(Storage::open_temporary().unwrap(), InventoryConfig::default())
        .with_sources(vec![Box::new(FileEngine::new(dir.path().join("work.sqlite")))]);
    inventory.init().unwrap();

    let id = inventory
        .add_material(&MaterialFields::new("Glue", "Chemicals", "L"))
        .unwrap();
    inventory.adjust_stock(id, 4).unwrap();
    assert_eq!(inventory.list_materials().unwrap()[0].current_stock, 4);
}

#[test]
fn test_legacy_image_is_migrated() {
    let legacy = Connection::open_in_memory().unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE materials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                specification TEXT,
                unit TEXT NOT NULL,
                current_stock INTEGER DEFAULT 0,
                min_stock INTEGER DEFAULT 0,
                max_stock INTEGER DEFAULT 0,
                unit_price REAL DEFAULT 0,
                remark TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO materials (name, category, unit, current_stock, min_stock, unit_price)
                VALUES ('Bolt', 'Hardware', 'pcs', 12, 10, 0.5);
            INSERT INTO materials (name, category, unit, current_stock)
                VALUES ('Glue', 'Chemicals', 'L', 3);
            INSERT INTO materials (name, category, unit, current_stock)
                VALUES ('Tape', 'Supplies', 'roll', 40);",
        )
        .unwrap();

    let store = Storage::open_temporary().unwrap();
    store
        .save_snapshot(SNAPSHOT_KEY, &engine::export_image(&legacy).unwrap())
        .unwrap();

    let mut inventory = Inventory::open(store, InventoryConfig::default()).unwrap();

    let materials = inventory.list_materials().unwrap();
    assert_eq!(materials.len(), 3);
    let bolt = &materials[0];
    assert_eq!(bolt.name, "Bolt");
    assert_eq!(bolt.category, "Hardware");
    assert_eq!(bolt.unit, "pcs");
    assert_eq!(bolt.current_stock, 12);
    assert_eq!(bolt.unit_price, 0.5);
    assert_eq!(bolt.code, None);
    assert_eq!(bolt.location, "");
    assert_eq!(bolt.supplier, "");
    assert_eq!(materials[1].current_stock, 3);
    assert_eq!(materials[2].current_stock, 40);

    // The migrated image is usable and was persisted at the current version
    inventory.record_inbound(&NewInbound::new(bolt.id, 8, "alice")).unwrap();
    assert_eq!(inventory.get_material(bolt.id).unwrap().unwrap().current_stock, 20);

    let mut reloaded = Connection::open_in_memory().unwrap();
    let image = inventory.store().load_snapshot(SNAPSHOT_KEY).unwrap().unwrap();
    engine::import_image(&mut reloaded, &image).unwrap();
    assert_eq!(Schema::new(&reloaded).version().unwrap(), CURRENT_VERSION);
    assert!(Schema::new(&reloaded).missing_material_columns().unwrap().is_empty());
}

#[test]
fn test_deleted_material_history_survives_reload() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut inventory =
            Inventory::open(Storage::open(dir.path()).unwrap(), InventoryConfig::default()).unwrap();
        let id = inventory
            .add_material(&MaterialFields::new("Bolt", "Hardware", "pcs"))
            .unwrap();
        inventory.record_inbound(&NewInbound::new(id, 10, "alice")).unwrap();
        inventory.delete_material(id).unwrap();
    }

    let inventory =
        Inventory::open(Storage::open(dir.path()).unwrap(), InventoryConfig::default()).unwrap();
    assert!(inventory.list_materials().unwrap().is_empty());

    let records = inventory.inbound_records(None).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quantity, 10);
    assert_eq!(records[0].material_name, None);
}
