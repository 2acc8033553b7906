// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证生产核算配置读取与覆写
// ==========================================


use food_production_ops::config::{config_keys, ConfigManager, ProductionConfig};
use test_helpers::{create_test_db, insert_test_config};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_load_production_config() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn).expect("Failed to insert test config");

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    let config = config_manager
        .load_production_config()
        .expect("Should load production config");

    assert_eq!(config, ProductionConfig::default());
    assert_eq!(config.yield_thresholds.good_pct, 40);
    assert_eq!(config.yield_thresholds.warning_pct, 30);
}

#[test]
fn test_set_global_config_value_is_visible_to_other_managers() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let writer = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    writer
        .set_global_config_value(config_keys::DEFAULT_COST_PER_LB, "6.75")
        .unwrap();
    writer
        .set_global_config_value(config_keys::DEFAULT_COST_PER_LB, "6.80")
        .unwrap();

    let reader = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(reader.get_default_cost_per_lb().unwrap(), 6.80);
    assert_eq!(
        reader
            .get_global_config_value(config_keys::DEFAULT_COST_PER_LB)
            .unwrap()
            .as_deref(),
        Some("6.80")
    );
    assert_eq!(
        reader.get_config_snapshot().unwrap(),
        r#"{"default_cost_per_lb":"6.80"}"#
    );
}
