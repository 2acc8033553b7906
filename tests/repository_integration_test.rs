// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 验证文件数据库上的持久化、批次号分配与重启后读取
// ==========================================


use chrono::{SubsecRound, Utc};
use food_production_ops::db::{init_schema, read_schema_version, CURRENT_SCHEMA_VERSION};
use food_production_ops::domain::types::BatchStatus;
use food_production_ops::domain::{BatchFilter, NewBatch, Supplier};
use food_production_ops::logging;
use food_production_ops::repository::{format_batch_number, RepositoryError};
use test_helpers::{build_env, create_test_db, open_test_connection};

fn supplier(id: &str) -> Supplier {
    Supplier {
        supplier_id: id.to_string(),
        name: "Sunrise Orchards".to_string(),
        phone: None,
        email: Some("hello@sunrise.example".to_string()),
        address: None,
        created_at: Utc::now().trunc_subsecs(6),
    }
}

fn new_batch(batch_id: &str, supplier_id: &str) -> NewBatch {
    NewBatch {
        batch_id: batch_id.to_string(),
        supplier_id: supplier_id.to_string(),
        raw_weight_lbs: 45.5,
        cost_per_lb: 8.50,
        status: BatchStatus::Pending,
        created_at: Utc::now().trunc_subsecs(6),
    }
}

#[test]
fn test_schema_initialization() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");

    assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    // 重复初始化不报错
    init_schema(&conn).unwrap();
    assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
}

#[test]
fn test_batch_persists_across_connections() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let created = {
        let env = build_env(&db_path);
        env.batch_repo
            .create(new_batch("b-1", "s-1"), Some(&supplier("s-1")))
            .unwrap()
    };

    // 新连接读取
    let env = build_env(&db_path);
    let loaded = env.batch_repo.find_by_id("b-1").unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        env.batch_repo.find_by_number("B-00001").unwrap().map(|b| b.batch_id),
        Some("b-1".to_string())
    );
    assert_eq!(
        env.supplier_repo.find_by_id("s-1").unwrap().map(|s| s.name),
        Some("Sunrise Orchards".to_string())
    );
}

#[test]
fn test_batch_numbers_continue_after_delete() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let env = build_env(&db_path);

    env.batch_repo
        .create(new_batch("b-1", "s-1"), Some(&supplier("s-1")))
        .unwrap();
    env.batch_repo.create(new_batch("b-2", "s-1"), None).unwrap();
    env.batch_repo.delete("b-1", None).unwrap();

    let third = env.batch_repo.create(new_batch("b-3", "s-1"), None).unwrap();
    assert_eq!(third.batch_number, format_batch_number(3));
    assert_eq!(env.batch_repo.count().unwrap(), 2);
}

#[test]
fn test_batch_numbers_never_reused_after_deleting_latest() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    {
        let env = build_env(&db_path);
        env.batch_repo
            .create(new_batch("b-1", "s-1"), Some(&supplier("s-1")))
            .unwrap();
        env.batch_repo.create(new_batch("b-2", "s-1"), None).unwrap();
        env.batch_repo.delete("b-2", None).unwrap();

        // 外键失败回滚，不消耗批次号
        assert!(env.batch_repo.create(new_batch("b-x", "ghost"), None).is_err());
    }

    // 新连接继续推进
    let env = build_env(&db_path);
    let next = env.batch_repo.create(new_batch("b-3", "s-1"), None).unwrap();
    assert_eq!(next.batch_number, format_batch_number(3));
    assert!(env.batch_repo.find_by_number(&format_batch_number(2)).unwrap().is_none());
}

#[test]
fn test_unknown_supplier_is_rejected_by_foreign_key() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let env = build_env(&db_path);

    let err = env
        .batch_repo
        .create(new_batch("b-1", "ghost"), None)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    assert!(env.batch_repo.list(&BatchFilter::default()).unwrap().is_empty());
}

#[test]
fn test_duplicate_inline_supplier_rolls_back_batch() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let env = build_env(&db_path);

    env.batch_repo
        .create(new_batch("b-1", "s-1"), Some(&supplier("s-1")))
        .unwrap();

    let err = env
        .batch_repo
        .create(new_batch("b-2", "s-1"), Some(&supplier("s-1")))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    assert!(env.batch_repo.find_by_id("b-2").unwrap().is_none());
    assert_eq!(env.batch_repo.count().unwrap(), 1);
}

#[test]
fn test_list_by_supplier() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let env = build_env(&db_path);

    env.batch_repo
        .create(new_batch("b-1", "s-1"), Some(&supplier("s-1")))
        .unwrap();
    env.batch_repo
        .create(new_batch("b-2", "s-2"), Some(&supplier("s-2")))
        .unwrap();
    env.batch_repo.create(new_batch("b-3", "s-1"), None).unwrap();

    let from_s1 = env
        .batch_repo
        .list(&BatchFilter {
            supplier_id: Some("s-1".to_string()),
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = from_s1.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(ids, vec!["b-3", "b-1"]);
}
